#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_positive_number, validate_utilization};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_INPUT_PATH: &str = "test.csv";
pub const DEFAULT_OUTPUT_DIR: &str = ".";
pub const DEFAULT_REPORT_PATH: &str = "scheduler_report.html";
pub const DEFAULT_BATCH_SIZE: usize = 10_000;
pub const DEFAULT_INGEST_WORKERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Memory,
    Filesystem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Html,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Filesystem => write!(f, "filesystem"),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Html => write!(f, "html"),
        }
    }
}

/// 所有設定來源共用的檢查，於管線啟動前執行
pub fn validate_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_utilization("utilization", config.utilization())?;
    validate_positive_number("batch_size", config.batch_size(), 1)?;
    validate_positive_number("ingest_workers", config.ingest_workers(), 1)?;
    validate_path("input", config.input_path())?;
    validate_path("output_dir", config.output_dir())?;
    if config.report_format() == ReportFormat::Html {
        validate_path("report_path", config.report_path())?;
    }
    Ok(())
}
