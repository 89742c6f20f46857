use crate::config::{
    validate_provider, ReportFormat, StorageKind, DEFAULT_BATCH_SIZE, DEFAULT_INGEST_WORKERS,
    DEFAULT_OUTPUT_DIR, DEFAULT_REPORT_PATH,
};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, SchedulerError};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub scheduler: SchedulerInfo,
    pub input: InputConfig,
    pub allocation: AllocationConfig,
    pub ingest: Option<IngestConfig>,
    pub storage: Option<StorageConfig>,
    pub report: Option<ReportConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerInfo {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationConfig {
    pub utilization: Option<f64>,
    pub capacity: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub batch_size: Option<usize>,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub kind: Option<StorageKind>,
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub format: Option<ReportFormat>,
    pub path: Option<String>,
    pub skip_output: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub verbose: Option<bool>,
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| SchedulerError::ConfigParse {
            message: format!("{}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SchedulerError::ConfigParse {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SCHEDULER_INPUT})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SchedulerError::ConfigParse {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn name(&self) -> &str {
        &self.scheduler.name
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn verbose(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.verbose)
            .unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn utilization(&self) -> f64 {
        self.allocation.utilization.unwrap_or(1.0)
    }

    fn capacity(&self) -> i64 {
        self.allocation.capacity.unwrap_or(0)
    }

    fn batch_size(&self) -> usize {
        self.ingest
            .as_ref()
            .and_then(|i| i.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE)
    }

    fn ingest_workers(&self) -> usize {
        self.ingest
            .as_ref()
            .and_then(|i| i.workers)
            .unwrap_or(DEFAULT_INGEST_WORKERS)
    }

    fn storage_kind(&self) -> StorageKind {
        self.storage
            .as_ref()
            .and_then(|s| s.kind)
            .unwrap_or_default()
    }

    fn output_dir(&self) -> &str {
        self.storage
            .as_ref()
            .and_then(|s| s.output_dir.as_deref())
            .unwrap_or(DEFAULT_OUTPUT_DIR)
    }

    fn report_format(&self) -> ReportFormat {
        self.report
            .as_ref()
            .and_then(|r| r.format)
            .unwrap_or_default()
    }

    fn report_path(&self) -> &str {
        self.report
            .as_ref()
            .and_then(|r| r.path.as_deref())
            .unwrap_or(DEFAULT_REPORT_PATH)
    }

    fn skip_output(&self) -> bool {
        self.report
            .as_ref()
            .and_then(|r| r.skip_output)
            .unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
