//! Named stages: directories the warehouse bulk-loads files from

pub mod client;
pub mod store;

pub use client::*;
pub use store::*;

use anyhow::{bail, Result};
use std::fmt;
use std::path::{Component, Path};

/// A stage reference as written in SQL: `@[DB.][SCHEMA.]STAGE[/path]`
#[derive(Debug, Clone, PartialEq)]
pub struct StageRef {
    pub database: Option<String>,
    pub schema: Option<String>,
    pub name: String,
    pub path: Option<String>,
}

/// A stage reference with database and schema filled in from the session
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStage {
    pub database: String,
    pub schema: String,
    pub name: String,
    pub path: Option<String>,
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

impl StageRef {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let Some(body) = text.strip_prefix('@') else {
            bail!("Stage reference must start with '@': {}", text);
        };

        let (qualified, path) = match body.split_once('/') {
            Some((q, p)) => (q, Some(p.trim_matches('/'))),
            None => (body, None),
        };
        let path = path.filter(|p| !p.is_empty()).map(str::to_string);

        if let Some(p) = &path {
            let escapes = Path::new(p)
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
            if escapes {
                bail!("Stage path must be relative and stay inside the stage: {}", p);
            }
        }

        let parts: Vec<&str> = qualified.split('.').collect();
        if let Some(bad) = parts.iter().find(|p| !is_identifier(p)) {
            bail!("Invalid identifier '{}' in stage reference {}", bad, text);
        }

        let upper = |s: &str| s.to_ascii_uppercase();
        let (database, schema, name) = match parts.as_slice() {
            [name] => (None, None, upper(name)),
            [schema, name] => (None, Some(upper(schema)), upper(name)),
            [db, schema, name] => (Some(upper(db)), Some(upper(schema)), upper(name)),
            _ => bail!("Stage reference has too many parts: {}", text),
        };

        Ok(Self {
            database,
            schema,
            name,
            path,
        })
    }

    /// Fill in missing database and schema from the session
    pub fn resolve(&self, database: &str, schema: &str) -> ResolvedStage {
        ResolvedStage {
            database: self
                .database
                .clone()
                .unwrap_or_else(|| database.to_ascii_uppercase()),
            schema: self
                .schema
                .clone()
                .unwrap_or_else(|| schema.to_ascii_uppercase()),
            name: self.name.clone(),
            path: self.path.clone(),
        }
    }
}

impl fmt::Display for StageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@")?;
        if let Some(db) = &self.database {
            write!(f, "{}.", db)?;
        }
        if let Some(schema) = &self.schema {
            write!(f, "{}.", schema)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(path) = &self.path {
            write!(f, "/{}", path)?;
        }
        Ok(())
    }
}

impl fmt::Display for ResolvedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}.{}.{}", self.database, self.schema, self.name)?;
        if let Some(path) = &self.path {
            write!(f, "/{}", path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fully_qualified() {
        let r = StageRef::parse("@DEMO_DB.PUBLIC.HAPPINESS_STAGE/world_happiness_2021.csv").unwrap();
        assert_eq!(r.database.as_deref(), Some("DEMO_DB"));
        assert_eq!(r.schema.as_deref(), Some("PUBLIC"));
        assert_eq!(r.name, "HAPPINESS_STAGE");
        assert_eq!(r.path.as_deref(), Some("world_happiness_2021.csv"));
    }

    #[test]
    fn test_parse_resolves_defaults_case_insensitively() {
        let r = StageRef::parse("@sales_stage/2025/jan.csv").unwrap();
        assert_eq!(r.name, "SALES_STAGE");
        assert_eq!(r.path.as_deref(), Some("2025/jan.csv"));

        let resolved = r.resolve("retail_db", "sales");
        assert_eq!(resolved.to_string(), "@RETAIL_DB.SALES.SALES_STAGE/2025/jan.csv");

        let r = StageRef::parse("@Public.my_stage").unwrap();
        let resolved = r.resolve("demo_db", "other");
        assert_eq!(resolved.schema, "PUBLIC");
        assert_eq!(resolved.path, None);
    }

    #[test]
    fn test_parse_rejects_bad_references() {
        assert!(StageRef::parse("DEMO_DB.PUBLIC.S/file.csv").is_err());
        assert!(StageRef::parse("@a.b.c.d/file.csv").is_err());
        assert!(StageRef::parse("@stage/../secrets.json").is_err());
        assert!(StageRef::parse("@1stage/file.csv").is_err());
        assert!(StageRef::parse("@/file.csv").is_err());
    }

    #[test]
    fn test_display_round_trips_input() {
        let text = "@DEMO_DB.PUBLIC.HAPPINESS_STAGE/world_happiness_2021.csv";
        assert_eq!(StageRef::parse(text).unwrap().to_string(), text);
    }
}
