use crate::adapters::source::CsvRecordSource;
use crate::domain::model::{IngestSummary, RawCallRecord, Schedule, HOURS_PER_DAY};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::domain::services::{allocate, normalize_batch};
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// 未完成的批次數超過 worker 數的這個倍數時，暫停讀取
const IN_FLIGHT_FACTOR: usize = 2;

#[derive(Debug, Default)]
struct BatchOutcome {
    entries_stored: usize,
    skipped: usize,
    dropped: usize,
    failed_appends: usize,
}

/// 排程管線：CSV → 正規化（map）→ 依小時存放 → 24 個小時平行分配（reduce）
pub struct SchedulePipeline<S: Storage, C: ConfigProvider> {
    storage: Arc<S>,
    config: C,
    aggregation_width: usize,
}

impl<S: Storage + 'static, C: ConfigProvider> SchedulePipeline<S, C> {
    pub fn new(storage: Arc<S>, config: C) -> Self {
        Self {
            storage,
            config,
            aggregation_width: available_parallelism(),
        }
    }

    /// 聚合階段同時執行的小時數上限（預設為 CPU 數）
    pub fn with_aggregation_width(mut self, width: usize) -> Self {
        self.aggregation_width = width.max(1);
        self
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn submit_batch(
        &self,
        tasks: &mut JoinSet<BatchOutcome>,
        permits: &Arc<Semaphore>,
        records: Vec<RawCallRecord>,
    ) {
        let storage = Arc::clone(&self.storage);
        let permits = Arc::clone(permits);
        let utilization = self.config.utilization();

        tasks.spawn(async move {
            // semaphore 從不關閉，permit 一定取得到
            let _permit = permits.acquire_owned().await;
            process_batch(storage.as_ref(), &records, utilization).await
        });
    }
}

async fn process_batch<S: Storage>(
    storage: &S,
    records: &[RawCallRecord],
    utilization: f64,
) -> BatchOutcome {
    let batch = normalize_batch(records, utilization);
    let mut outcome = BatchOutcome {
        skipped: batch.skipped,
        dropped: batch.dropped,
        ..Default::default()
    };

    for (hour, entries) in batch.by_hour {
        let count = entries.len();
        match storage.append_demand(hour, entries).await {
            Ok(()) => outcome.entries_stored += count,
            Err(e) => {
                tracing::warn!(
                    hour,
                    "⚠️ Dropped {} demand entries, hour will be understated: {}",
                    count,
                    e
                );
                outcome.failed_appends += 1;
            }
        }
    }

    outcome
}

fn settle(joined: std::result::Result<BatchOutcome, JoinError>, summary: &mut IngestSummary) {
    match joined {
        Ok(outcome) => {
            summary.entries_stored += outcome.entries_stored;
            summary.rows_skipped += outcome.skipped;
            summary.rows_dropped += outcome.dropped;
            summary.failed_appends += outcome.failed_appends;
        }
        Err(e) => {
            tracing::error!("❌ Ingestion batch task failed: {}", e);
            summary.failed_batches += 1;
        }
    }
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}

#[async_trait::async_trait]
impl<S: Storage + 'static, C: ConfigProvider> Pipeline for SchedulePipeline<S, C> {
    async fn cached_schedule(&self) -> Option<Schedule> {
        let schedule = self.storage.fetch_schedule().await;
        if schedule.is_empty() {
            None
        } else {
            Some(schedule)
        }
    }

    async fn ingest(&self) -> Result<IngestSummary> {
        let source = CsvRecordSource::open(self.config.input_path())?;

        let started = Instant::now();
        let batch_size = self.config.batch_size().max(1);
        let workers = self.config.ingest_workers().max(1);
        let max_in_flight = workers * IN_FLIGHT_FACTOR;
        let permits = Arc::new(Semaphore::new(workers));

        tracing::info!(
            "📥 Ingesting {} (batch size {}, {} workers)",
            self.config.input_path(),
            batch_size,
            workers
        );

        let mut tasks = JoinSet::new();
        let mut summary = IngestSummary::default();
        let mut batch = Vec::with_capacity(batch_size);

        for row in source {
            summary.rows_read += 1;
            match row {
                Ok(record) => batch.push(record),
                Err(e) => {
                    tracing::warn!("Skipping unreadable row {}: {}", summary.rows_read, e);
                    summary.rows_rejected += 1;
                    continue;
                }
            }

            if batch.len() >= batch_size {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
                self.submit_batch(&mut tasks, &permits, full);
                summary.batches += 1;

                // 限制記憶體：等任一批次完成後再繼續讀
                if tasks.len() > max_in_flight {
                    if let Some(joined) = tasks.join_next().await {
                        settle(joined, &mut summary);
                    }
                }
            }
        }

        if !batch.is_empty() {
            self.submit_batch(&mut tasks, &permits, batch);
            summary.batches += 1;
        }

        // barrier：所有批次寫入完成前不得開始聚合
        while let Some(joined) = tasks.join_next().await {
            settle(joined, &mut summary);
        }

        tracing::info!(
            "✅ Ingestion complete in {} ms: {} rows, {} batches, {} entries stored ({} skipped, {} dropped)",
            started.elapsed().as_millis(),
            summary.rows_read,
            summary.batches,
            summary.entries_stored,
            summary.rows_skipped + summary.rows_rejected,
            summary.rows_dropped
        );
        Ok(summary)
    }

    async fn aggregate(&self) -> Result<Schedule> {
        let started = Instant::now();
        let capacity = self.config.capacity();
        let permits = Arc::new(Semaphore::new(self.aggregation_width));

        tracing::info!(
            "🔧 Aggregating {} hours (capacity {}, width {})",
            HOURS_PER_DAY,
            if capacity > 0 {
                capacity.to_string()
            } else {
                "unlimited".to_string()
            },
            self.aggregation_width
        );

        let mut tasks = JoinSet::new();
        for hour in 0..HOURS_PER_DAY {
            let storage = Arc::clone(&self.storage);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let entries = storage.fetch_demand(hour).await;
                allocate(hour, &entries, capacity)
            });
        }

        // barrier：完成順序不固定，組裝時再依小時排序
        let mut buckets = Vec::with_capacity(usize::from(HOURS_PER_DAY));
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(bucket) => buckets.push(bucket),
                Err(e) => {
                    tracing::error!("❌ Aggregation task failed, its hour is reported empty: {}", e)
                }
            }
        }

        let schedule = Schedule::assemble(buckets);
        tracing::info!(
            "✅ Aggregation complete in {} ms: {} agents allocated",
            started.elapsed().as_millis(),
            schedule.total_allocated()
        );
        Ok(schedule)
    }

    async fn persist(&self, schedule: &Schedule) {
        if let Err(e) = self.storage.store_schedule(schedule).await {
            tracing::error!(
                "⚠️ Schedule was not persisted, continuing with the in-memory result: {}",
                e
            );
        }

        if let Err(e) = self.storage.clear_intermediate().await {
            tracing::warn!("Intermediate demand data was not fully cleared: {}", e);
        }
    }

    fn capacity(&self) -> i64 {
        self.config.capacity()
    }
}
