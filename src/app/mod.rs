//! 組裝儲存、管線與引擎，並依設定輸出報表。

use crate::adapters::storage::{CacheKey, InMemoryStorage, LocalStorage};
use crate::config::{validate_provider, ReportFormat, StorageKind};
use crate::core::{RunSummary, SchedulePipeline, SchedulerEngine};
use crate::domain::ports::{ConfigProvider, Storage};
use crate::report::renderer_for;
use crate::utils::error::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// 報表輸出結果，由呼叫端決定如何呈現
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutput {
    /// 文字或 JSON，直接印出
    Printed(String),
    /// HTML 寫入的檔案位置
    Written(PathBuf),
    Skipped,
}

/// 驗證設定後依 `storage_kind` 建立儲存並執行一次排程
pub async fn run_scheduler<C: ConfigProvider>(config: C, monitor: bool) -> Result<RunSummary> {
    validate_provider(&config)?;

    match config.storage_kind() {
        StorageKind::Memory => execute(Arc::new(InMemoryStorage::new()), config, monitor).await,
        StorageKind::Filesystem => {
            let storage = LocalStorage::new(config.output_dir())
                .with_cache_key(CacheKey::from_config(&config));
            execute(Arc::new(storage), config, monitor).await
        }
    }
}

/// 使用呼叫端提供的儲存執行，可讓多次執行共用同一份快取
pub async fn execute<S: Storage + 'static, C: ConfigProvider>(
    storage: Arc<S>,
    config: C,
    monitor: bool,
) -> Result<RunSummary> {
    tracing::debug!(
        storage = %config.storage_kind(),
        capacity = config.capacity(),
        utilization = config.utilization(),
        "Building scheduler pipeline"
    );
    let pipeline = SchedulePipeline::new(storage, config);
    SchedulerEngine::new_with_monitoring(pipeline, monitor)
        .run()
        .await
}

/// 依設定的格式產生報表；HTML 寫到 `report_path`
pub fn produce_report<C: ConfigProvider + ?Sized>(
    summary: &RunSummary,
    config: &C,
) -> Result<ReportOutput> {
    if config.skip_output() {
        return Ok(ReportOutput::Skipped);
    }

    let format = config.report_format();
    let rendered = renderer_for(format).render(&summary.schedule, summary.capacity)?;

    match format {
        ReportFormat::Html => {
            let path = PathBuf::from(config.report_path());
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, rendered)?;
            tracing::info!("📊 Dashboard written to {}", path.display());
            Ok(ReportOutput::Written(path))
        }
        ReportFormat::Text | ReportFormat::Json => Ok(ReportOutput::Printed(rendered)),
    }
}
