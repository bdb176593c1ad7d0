use anyhow::{Context, Result};
use sales_insights::{
    cli::{Cli, Commands, LoadArgs, StageCommands, ViewArgs},
    config::ConnectionConfig,
    dashboard::{DashboardData, QueryCache},
    filter::resolve_filters,
    loader::{load_table, summarize_happiness, summarize_sales, CopyInto, OnError},
    report::write_report,
    schema::{TableSchema, HAPPINESS, SALES_DATA},
    stage::{is_remote, url_file_name, StageClient, StageRef, StageStore},
    ui::{ConsoleUi, DashboardApp, DashboardState, Phase, Ui},
    warehouse::Warehouse,
    WarehouseError,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    run(cli).map_err(|err| {
        if let Some(warehouse_err) = err.downcast_ref::<WarehouseError>() {
            eprintln!("{}", warehouse_err.hint());
        }
        err
    })
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    let mut ui = ConsoleUi::new(cli.verbose);

    match cli.command {
        Commands::Init { database, schema } => {
            let config = ConnectionConfig::load(config_path.as_deref(), &database, &schema)?;
            let warehouse = Warehouse::create(&config)?;
            StageStore::new(warehouse.account_dir())?;
            println!(
                "Initialized database {}, schema {} in {:?}",
                database,
                schema,
                warehouse.account_dir()
            );
            warehouse.close()?;
        }

        Commands::Check { database, schema } => {
            let warehouse = connect(config_path.as_deref(), &database, &schema, &mut ui)?;
            let result = warehouse.query("SELECT CURRENT_DATABASE(), CURRENT_SCHEMA()")?;
            let cells = result.row(0).map(|r| r.cells()).unwrap_or_default();
            let (db, sc) = match cells {
                [db, sc, ..] => (db.to_string(), sc.to_string()),
                _ => ("NULL".to_string(), "NULL".to_string()),
            };
            println!("Connected to database: {}, schema: {}", db, sc);
            println!(
                "Warehouse: {}, user: {}",
                warehouse.info().warehouse,
                warehouse.info().user
            );
            warehouse.close()?;
        }

        Commands::Stage { command } => stage_command(config_path.as_deref(), command, &mut ui)?,

        Commands::LoadHappiness {
            database,
            schema,
            load,
        } => {
            let start = Instant::now();
            let mut warehouse = connect(config_path.as_deref(), &database, &schema, &mut ui)?;
            let report = run_load(&mut warehouse, &HAPPINESS, &load, &mut ui)?;

            println!("Number of rows in table: {}", report.row_count);
            if report.is_empty() {
                println!("No data loaded into the table. Check the COPY INTO step.");
            } else {
                ui.set_phase(Phase::Summarizing);
                let summary = summarize_happiness(&warehouse)?;
                println!("Top 5 happiest countries:");
                for (country, score) in &summary.top {
                    println!("  {}: {:.3}", country, score);
                }
                match summary.average_gdp {
                    Some(gdp) => println!("Average GDP per capita: {:.2}", gdp),
                    None => println!("Average GDP per capita: NULL"),
                }
            }

            warehouse.close()?;
            ui.set_phase(Phase::Complete);
            println!("\nFinished in {:.1}s", start.elapsed().as_secs_f64());
        }

        Commands::LoadSales {
            database,
            schema,
            load,
        } => {
            let start = Instant::now();
            let mut warehouse = connect(config_path.as_deref(), &database, &schema, &mut ui)?;
            let report = run_load(&mut warehouse, &SALES_DATA, &load, &mut ui)?;

            println!("Number of rows in table: {}", report.row_count);
            if report.is_empty() {
                println!("No data loaded into the table. Check the COPY INTO step.");
            } else {
                ui.set_phase(Phase::Summarizing);
                let summary = summarize_sales(&warehouse)?;
                println!("Distinct products: {}", summary.products);
                if let (Some(first), Some(last)) = (&summary.first_sale, &summary.last_sale) {
                    println!("Sales from {} to {}", first, last);
                }
            }

            warehouse.close()?;
            ui.set_phase(Phase::Complete);
            println!("\nFinished in {:.1}s", start.elapsed().as_secs_f64());
        }

        Commands::Report {
            database,
            schema,
            view,
        } => {
            let warehouse = connect(config_path.as_deref(), &database, &schema, &mut ui)?;
            let (data, filters) = fetch_views(&warehouse, &view, &mut ui)?;

            let stdout = io::stdout();
            let mut out = stdout.lock();
            writeln!(out, "{}", sales_insights::ui::dashboard::TITLE)?;
            write_report(&mut out, &data, &filters)?;
            warehouse.close()?;
        }

        Commands::Dashboard {
            database,
            schema,
            view,
        } => {
            let warehouse = connect(config_path.as_deref(), &database, &schema, &mut ui)?;
            let cache = QueryCache::new(Duration::from_secs(view.cache_ttl));
            ui.set_phase(Phase::Querying);
            let data = DashboardData::fetch(&warehouse, &cache, &mut ui)?;
            let filters = resolve_filters(view.product, view.from, view.to, &data)?;

            let state = DashboardState::new(data, filters, cache.ttl());
            let app = DashboardApp::new(state)?;
            app.run(&warehouse, &cache)?;
            warehouse.close()?;
        }
    }

    Ok(())
}

fn connect(
    config_path: Option<&Path>,
    database: &str,
    schema: &str,
    ui: &mut impl Ui,
) -> Result<Warehouse> {
    let config = ConnectionConfig::load(config_path, database, schema)?;
    ui.set_phase(Phase::Connecting);
    let warehouse = Warehouse::connect(&config)?;
    ui.log(format!(
        "Connected to {} as {} ({}.{})",
        config.account, config.user, config.database, config.schema
    ));
    Ok(warehouse)
}

fn run_load(
    warehouse: &mut Warehouse,
    table: &'static TableSchema,
    load: &LoadArgs,
    ui: &mut impl Ui,
) -> Result<sales_insights::loader::LoadReport> {
    let stages = StageStore::new(warehouse.account_dir())?;

    let mut copy = CopyInto::for_table(table)?;
    if let Some(location) = &load.location {
        copy = copy.location(StageRef::parse(location)?);
    }
    if load.abort_on_error {
        copy = copy.on_error(OnError::AbortStatement);
    }

    load_table(warehouse, &stages, &copy, ui)
}

fn fetch_views(
    warehouse: &Warehouse,
    view: &ViewArgs,
    ui: &mut impl Ui,
) -> Result<(DashboardData, sales_insights::filter::Filters)> {
    let cache = QueryCache::new(Duration::from_secs(view.cache_ttl));
    ui.set_phase(Phase::Querying);
    let data = DashboardData::fetch(warehouse, &cache, ui)?;
    let filters = resolve_filters(view.product.clone(), view.from, view.to, &data)?;
    Ok((data, filters))
}

fn stage_command(config_path: Option<&Path>, command: StageCommands, ui: &mut ConsoleUi) -> Result<()> {
    match command {
        StageCommands::Put {
            stage,
            source,
            database,
            schema,
        } => {
            let warehouse = connect(config_path, &database, &schema, ui)?;
            let stages = StageStore::new(warehouse.account_dir())?;
            let stage = StageRef::parse(&stage)?.resolve(&database, &schema);

            let dest = if is_remote(&source) {
                let file_name = url_file_name(&source)
                    .with_context(|| format!("Cannot derive a file name from {}", source))?;
                let dest = stages.destination(&stage, file_name)?;
                StageClient::new()?.download(&source, &dest, ui)?;
                dest
            } else {
                stages.put_file(&stage, &PathBuf::from(&source))?
            };
            println!("Staged {} as {:?}", source, dest);
        }

        StageCommands::List {
            stage,
            database,
            schema,
        } => {
            let warehouse = connect(config_path, &database, &schema, ui)?;
            let stages = StageStore::new(warehouse.account_dir())?;
            let stage = StageRef::parse(&stage)?.resolve(&database, &schema);

            let files = stages.list(&stage)?;
            if files.is_empty() {
                println!("No files in {}", stage);
            }
            for file in files {
                println!("  {:<40} {:>12}", file.name, file.size);
            }
        }

        StageCommands::Remove {
            stage,
            database,
            schema,
        } => {
            let warehouse = connect(config_path, &database, &schema, ui)?;
            let stages = StageStore::new(warehouse.account_dir())?;
            let stage = StageRef::parse(&stage)?.resolve(&database, &schema);

            let removed = stages.remove(&stage)?;
            println!("Removed {} file(s) from {}", removed, stage);
        }
    }

    Ok(())
}
