pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod report;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::toml_config::TomlConfig;

pub use adapters::{CsvRecordSource, InMemoryStorage, LocalStorage};
pub use app::{produce_report, run_scheduler, ReportOutput};
pub use core::{RunSummary, SchedulePipeline, SchedulerEngine};
pub use domain::model::{DemandEntry, Schedule, ScheduleBucket};
pub use utils::error::{Result, SchedulerError};
