pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod loader;
pub mod parser;
pub mod report;
pub mod schema;
pub mod stage;
pub mod ui;
pub mod warehouse;

pub use cli::{Cli, Commands};
pub use error::WarehouseError;
pub use ui::{ConsoleUi, DashboardApp, Phase, SilentUi, Ui};
pub use warehouse::Warehouse;
