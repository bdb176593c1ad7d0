//! `COPY INTO` from a staged CSV file

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::fmt;
use std::fs;

use super::schema_gen::generate_insert;
use crate::parser::{parse_record, ParsedRow};
use crate::schema::TableSchema;
use crate::stage::{StageRef, StageStore};
use crate::ui::Ui;
use crate::warehouse::Warehouse;

const BATCH_SIZE: usize = 1000;

/// What to do with a row that cannot be loaded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OnError {
    /// Skip the row and keep loading
    Continue,
    /// Fail the whole load and commit nothing
    AbortStatement,
}

impl fmt::Display for OnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnError::Continue => write!(f, "CONTINUE"),
            OnError::AbortStatement => write!(f, "ABORT_STATEMENT"),
        }
    }
}

/// CSV file format options
#[derive(Debug, Clone)]
pub struct FileFormat {
    pub skip_header: usize,
    pub field_delimiter: u8,
    pub field_optionally_enclosed_by: Option<u8>,
}

impl Default for FileFormat {
    fn default() -> Self {
        Self {
            skip_header: 1,
            field_delimiter: b',',
            field_optionally_enclosed_by: Some(b'"'),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(TYPE = CSV SKIP_HEADER = {}", self.skip_header)?;
        if self.field_delimiter != b',' {
            write!(f, " FIELD_DELIMITER = '{}'", self.field_delimiter as char)?;
        }
        if let Some(q) = self.field_optionally_enclosed_by {
            write!(f, " FIELD_OPTIONALLY_ENCLOSED_BY = '{}'", q as char)?;
        }
        write!(f, ")")
    }
}

/// A bulk load of one staged file into one table
#[derive(Debug, Clone)]
pub struct CopyInto<'a> {
    pub table: &'a TableSchema,
    /// 1-based CSV columns, parallel to the table's columns
    pub source_columns: &'a [usize],
    pub location: StageRef,
    pub file_format: FileFormat,
    pub on_error: OnError,
}

impl<'a> CopyInto<'a> {
    /// Load statement using the table's declared stage location and mapping
    pub fn for_table(table: &'a TableSchema) -> Result<Self> {
        Ok(Self {
            table,
            source_columns: table.source.source_columns,
            location: StageRef::parse(table.source.location)?,
            file_format: FileFormat::default(),
            on_error: OnError::Continue,
        })
    }

    pub fn location(mut self, location: StageRef) -> Self {
        self.location = location;
        self
    }

    pub fn on_error(mut self, on_error: OnError) -> Self {
        self.on_error = on_error;
        self
    }

    /// The statement in warehouse SQL
    pub fn to_sql(&self) -> String {
        let columns: Vec<String> = self.table.columns.iter().map(|c| c.quoted()).collect();
        let sources: Vec<String> = self.source_columns.iter().map(|c| format!("${}", c)).collect();
        format!(
            "COPY INTO {} ({})\nFROM (SELECT {} FROM {})\nFILE_FORMAT = {}\nON_ERROR = '{}'",
            self.table.name,
            columns.join(", "),
            sources.join(", "),
            self.location,
            self.file_format,
            self.on_error
        )
    }
}

/// Outcome of a load, one line per file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CopyResult {
    pub file: String,
    pub rows_parsed: u64,
    pub rows_loaded: u64,
    pub errors_seen: u64,
    pub first_error: Option<String>,
    pub first_error_line: Option<u64>,
}

impl CopyResult {
    pub fn status(&self) -> &'static str {
        if self.rows_loaded == 0 && self.rows_parsed > 0 {
            "LOAD_FAILED"
        } else if self.errors_seen > 0 {
            "PARTIALLY_LOADED"
        } else {
            "LOADED"
        }
    }

    fn record_error(&mut self, line: u64, message: String) {
        self.errors_seen += 1;
        if self.first_error.is_none() {
            self.first_error = Some(message);
            self.first_error_line = Some(line);
        }
    }
}

impl fmt::Display for CopyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | parsed {} | loaded {} | errors {}",
            self.file,
            self.status(),
            self.rows_parsed,
            self.rows_loaded,
            self.errors_seen
        )?;
        if let (Some(msg), Some(line)) = (&self.first_error, self.first_error_line) {
            write!(f, " | first error (line {}): {}", line, msg)?;
        }
        Ok(())
    }
}

/// Insert a batch of rows into the database
fn insert_batch(tx: &rusqlite::Transaction, sql: &str, batch: &[ParsedRow]) -> Result<()> {
    let mut stmt = tx.prepare_cached(sql)?;

    for row in batch {
        for (idx, value) in row.values.iter().enumerate() {
            value.bind_to(idx + 1, &mut stmt)?;
        }
        stmt.raw_execute()?;
    }

    Ok(())
}

/// Run a `COPY INTO` against the session. The target table must exist.
pub fn copy_into(
    warehouse: &mut Warehouse,
    stages: &StageStore,
    copy: &CopyInto,
    ui: &mut impl Ui,
) -> Result<CopyResult> {
    if copy.source_columns.len() != copy.table.columns.len() {
        bail!(
            "COPY INTO {} maps {} source columns onto {} target columns",
            copy.table.name,
            copy.source_columns.len(),
            copy.table.columns.len()
        );
    }

    let info = warehouse.info().clone();
    let stage = copy.location.resolve(&info.database, &info.schema);
    let path = stages.file_path(&stage)?;
    let total_bytes = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(copy.file_format.field_delimiter)
        .quoting(copy.file_format.field_optionally_enclosed_by.is_some())
        .quote(copy.file_format.field_optionally_enclosed_by.unwrap_or(b'"'))
        .from_path(&path)
        .with_context(|| format!("Failed to open staged file {}", stage))?;

    let insert_sql = generate_insert(copy.table, &warehouse.qualify(copy.table.name));
    let label = format!("{}", stage);

    let mut result = CopyResult {
        file: stage.to_string(),
        ..CopyResult::default()
    };

    let tx = warehouse.transaction()?;
    let mut batch: Vec<ParsedRow> = Vec::with_capacity(BATCH_SIZE);
    let mut record = StringRecord::new();
    let mut skipped_header = 0;

    loop {
        let line = reader.position().line();
        let row = match reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                if skipped_header < copy.file_format.skip_header {
                    skipped_header += 1;
                    continue;
                }
                // Blank lines are not rows
                if record.len() == 1 && record.get(0).map_or(true, |f| f.is_empty()) {
                    continue;
                }
                result.rows_parsed += 1;
                parse_record(&record, copy.table, copy.source_columns)
                    .map_err(|e| format!("{:#}", e))
            }
            Err(e) => {
                if skipped_header < copy.file_format.skip_header {
                    skipped_header += 1;
                    continue;
                }
                result.rows_parsed += 1;
                Err(format!("Malformed CSV record: {}", e))
            }
        };

        match row {
            Ok(row) => batch.push(row),
            Err(message) => {
                if copy.on_error == OnError::AbortStatement {
                    bail!("COPY INTO {} aborted at line {}: {}", copy.table.name, line, message);
                }
                result.record_error(line, message);
            }
        }

        if batch.len() >= BATCH_SIZE {
            insert_batch(&tx, &insert_sql, &batch)?;
            result.rows_loaded += batch.len() as u64;
            batch.clear();
            ui.set_progress(reader.position().byte(), total_bytes, label.clone());
        }
    }

    // Insert remaining batch
    if !batch.is_empty() {
        insert_batch(&tx, &insert_sql, &batch)?;
        result.rows_loaded += batch.len() as u64;
    }

    tx.commit()?;
    ui.clear_progress();
    ui.log(result.to_string());

    Ok(result)
}
