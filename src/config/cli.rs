use crate::config::{validate_provider, ReportFormat, StorageKind};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "agent-scheduler")]
#[command(about = "Builds an hourly agent staffing plan from call-volume forecasts")]
pub struct CliConfig {
    /// Input CSV with the call-volume forecast
    #[arg(long, default_value = "test.csv")]
    pub input: String,

    /// Target agent utilization, in (0, 1]
    #[arg(long, default_value = "1.0")]
    pub utilization: f64,

    /// Agents available per hour; zero or negative means unlimited
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub capacity: i64,

    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,

    #[arg(long, value_enum, default_value = "memory")]
    pub storage: StorageKind,

    /// Directory for intermediate files and the persisted schedule
    #[arg(long, default_value = ".")]
    pub output_dir: String,

    /// Where the HTML dashboard is written
    #[arg(long, default_value = "scheduler_report.html")]
    pub report_path: String,

    #[arg(long, default_value = "10000")]
    pub batch_size: usize,

    /// Ingestion worker count
    #[arg(long, default_value = "4")]
    pub workers: usize,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Skip printing the schedule")]
    pub skip_output: bool,
}

impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn utilization(&self) -> f64 {
        self.utilization
    }

    fn capacity(&self) -> i64 {
        self.capacity
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn ingest_workers(&self) -> usize {
        self.workers
    }

    fn storage_kind(&self) -> StorageKind {
        self.storage
    }

    fn output_dir(&self) -> &str {
        &self.output_dir
    }

    fn report_format(&self) -> ReportFormat {
        self.format
    }

    fn report_path(&self) -> &str {
        &self.report_path
    }

    fn skip_output(&self) -> bool {
        self.skip_output
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::parse_from(["agent-scheduler"]);

        assert_eq!(config.input, "test.csv");
        assert_eq!(config.utilization, 1.0);
        assert_eq!(config.capacity, 0);
        assert_eq!(config.format, ReportFormat::Text);
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.batch_size, 10_000);
        assert_eq!(config.ingest_workers(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_and_negative_capacity() {
        let config = CliConfig::parse_from([
            "agent-scheduler",
            "--input",
            "calls.csv",
            "--utilization",
            "0.8",
            "--capacity",
            "-1",
            "--format",
            "html",
            "--storage",
            "filesystem",
            "--workers",
            "2",
        ]);

        assert_eq!(config.input_path(), "calls.csv");
        assert_eq!(config.capacity(), -1);
        assert_eq!(config.report_format(), ReportFormat::Html);
        assert_eq!(config.storage_kind(), StorageKind::Filesystem);
        assert_eq!(config.ingest_workers(), 2);
    }

    #[test]
    fn test_invalid_utilization_fails_validation() {
        let config = CliConfig::parse_from(["agent-scheduler", "--utilization", "1.5"]);
        assert!(config.validate().is_err());

        let config = CliConfig::parse_from(["agent-scheduler", "--workers", "0"]);
        assert!(config.validate().is_err());
    }
}
