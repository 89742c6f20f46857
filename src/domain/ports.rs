use crate::config::{ReportFormat, StorageKind};
use crate::domain::model::{DemandEntry, IngestSummary, Schedule};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 中繼資料與最終排程的存放區。
///
/// `append_demand` 必須允許多個 worker 同時寫入同一小時；
/// 讀取只會在 ingestion barrier 之後發生，實作不需處理讀寫並行。
pub trait Storage: Send + Sync {
    fn append_demand(
        &self,
        hour: u8,
        entries: Vec<DemandEntry>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// 失敗時回傳空集合（並記錄日誌），不向上拋出
    fn fetch_demand(&self, hour: u8) -> impl std::future::Future<Output = Vec<DemandEntry>> + Send;

    fn store_schedule(
        &self,
        schedule: &Schedule,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// 空排程代表沒有先前的執行結果
    fn fetch_schedule(&self) -> impl std::future::Future<Output = Schedule> + Send;

    fn clear_intermediate(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn utilization(&self) -> f64;
    /// `<= 0` 代表容量無上限
    fn capacity(&self) -> i64;
    fn batch_size(&self) -> usize;
    fn ingest_workers(&self) -> usize;
    fn storage_kind(&self) -> StorageKind;
    fn output_dir(&self) -> &str;
    fn report_format(&self) -> ReportFormat;
    fn report_path(&self) -> &str;
    fn skip_output(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn cached_schedule(&self) -> Option<Schedule>;
    async fn ingest(&self) -> Result<IngestSummary>;
    async fn aggregate(&self) -> Result<Schedule>;
    async fn persist(&self, schedule: &Schedule);
    fn capacity(&self) -> i64;
}
