use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEMO_DATABASE: &str = "DEMO_DB";
pub const DEMO_SCHEMA: &str = "PUBLIC";
pub const RETAIL_DATABASE: &str = "RETAIL_DB";
pub const RETAIL_SCHEMA: &str = "SALES";

#[derive(Parser, Debug)]
#[command(name = "sales-insights")]
#[command(version, about = "Load staged CSV data into the warehouse and explore sales insights")]
pub struct Cli {
    /// Secrets file with warehouse credentials
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print each phase as it starts
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the account directory, database and schema
    Init {
        #[arg(long, default_value = RETAIL_DATABASE)]
        database: String,

        #[arg(long, default_value = RETAIL_SCHEMA)]
        schema: String,
    },

    /// Connect and report the current database and schema
    Check {
        #[arg(long, default_value = DEMO_DATABASE)]
        database: String,

        #[arg(long, default_value = DEMO_SCHEMA)]
        schema: String,
    },

    /// Manage files in named stages
    Stage {
        #[command(subcommand)]
        command: StageCommands,
    },

    /// Create the happiness table and load it from its stage
    LoadHappiness {
        #[arg(long, default_value = DEMO_DATABASE)]
        database: String,

        #[arg(long, default_value = DEMO_SCHEMA)]
        schema: String,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Create the sales table and load it from its stage
    LoadSales {
        #[arg(long, default_value = RETAIL_DATABASE)]
        database: String,

        #[arg(long, default_value = RETAIL_SCHEMA)]
        schema: String,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Print every sales view as text
    Report {
        #[arg(long, default_value = RETAIL_DATABASE)]
        database: String,

        #[arg(long, default_value = RETAIL_SCHEMA)]
        schema: String,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Interactive sales dashboard
    Dashboard {
        #[arg(long, default_value = RETAIL_DATABASE)]
        database: String,

        #[arg(long, default_value = RETAIL_SCHEMA)]
        schema: String,

        #[command(flatten)]
        view: ViewArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum StageCommands {
    /// Copy a local file or download a URL into a stage
    Put {
        /// Stage reference, e.g. @DEMO_DB.PUBLIC.HAPPINESS_STAGE
        stage: String,

        /// Local path or http(s) URL
        source: String,

        #[arg(long, default_value = DEMO_DATABASE)]
        database: String,

        #[arg(long, default_value = DEMO_SCHEMA)]
        schema: String,
    },

    /// List files in a stage
    List {
        stage: String,

        #[arg(long, default_value = DEMO_DATABASE)]
        database: String,

        #[arg(long, default_value = DEMO_SCHEMA)]
        schema: String,
    },

    /// Remove files from a stage
    Remove {
        stage: String,

        #[arg(long, default_value = DEMO_DATABASE)]
        database: String,

        #[arg(long, default_value = DEMO_SCHEMA)]
        schema: String,
    },
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Load from this stage file instead of the table's default
    #[arg(short, long)]
    pub location: Option<String>,

    /// Fail the whole load on the first bad row (ON_ERROR = ABORT_STATEMENT)
    #[arg(long)]
    pub abort_on_error: bool,
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Only show this product ("All" for every product)
    #[arg(short, long)]
    pub product: Option<String>,

    /// First month to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub from: Option<NaiveDate>,

    /// Last month to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub to: Option<NaiveDate>,

    /// Seconds to keep query results cached
    #[arg(long, default_value_t = 3600)]
    pub cache_ttl: u64,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{}': {}", s, e))
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
