//! CLI command implementations

pub mod config;
pub mod devices;
pub mod history;
pub mod run;

pub use config::ConfigAction;
pub use history::HistoryCommand;
pub use run::RunCommand;
