use crate::core::Pipeline;
use crate::domain::model::{IngestSummary, Schedule};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use serde::Serialize;
use std::fmt;

/// 一次執行經過的階段；任何致命錯誤都會直接結束執行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    CacheCheck,
    Ingesting,
    Aggregating,
    Persisting,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CacheCheck => "cache check",
            Self::Ingesting => "ingestion",
            Self::Aggregating => "aggregation",
            Self::Persisting => "persistence",
            Self::Done => "done",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub schedule: Schedule,
    pub capacity: i64,
    pub from_cache: bool,
    /// 使用快取時為 `None`
    pub ingest: Option<IngestSummary>,
}

pub struct SchedulerEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> SchedulerEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("🚀 Starting scheduler run");
        self.monitor.log_stats("Start");

        // Cache
        self.enter(RunPhase::CacheCheck);
        if let Some(schedule) = self.pipeline.cached_schedule().await {
            tracing::info!("♻️ Reusing previously computed schedule");
            self.enter(RunPhase::Done);
            return Ok(RunSummary {
                schedule,
                capacity: self.pipeline.capacity(),
                from_cache: true,
                ingest: None,
            });
        }

        // Ingest
        self.enter(RunPhase::Ingesting);
        let ingest = self.pipeline.ingest().await?;
        if ingest.is_degraded() {
            tracing::warn!(
                "⚠️ Ingestion lost data ({} failed appends, {} failed batches); affected hours are understated",
                ingest.failed_appends,
                ingest.failed_batches
            );
        }
        self.monitor.log_stats("Ingestion");

        // Aggregate
        self.enter(RunPhase::Aggregating);
        let schedule = self.pipeline.aggregate().await?;
        self.monitor.log_stats("Aggregation");

        // Persist
        self.enter(RunPhase::Persisting);
        self.pipeline.persist(&schedule).await;

        self.enter(RunPhase::Done);
        self.monitor.log_final_stats();
        tracing::info!(
            "🎉 Scheduler run finished: {} agents across {} hours",
            schedule.total_allocated(),
            schedule.iter().filter(|b| !b.is_empty()).count()
        );

        Ok(RunSummary {
            schedule,
            capacity: self.pipeline.capacity(),
            from_cache: false,
            ingest: Some(ingest),
        })
    }

    fn enter(&self, phase: RunPhase) {
        tracing::debug!(%phase, "Entering phase");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ScheduleBucket;
    use crate::utils::error::SchedulerError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockPipeline {
        cached: Option<Schedule>,
        fail_ingest: bool,
        ingest_calls: AtomicUsize,
        aggregate_calls: AtomicUsize,
        persist_calls: AtomicUsize,
    }

    fn one_hour_schedule() -> Schedule {
        let mut bucket = ScheduleBucket::empty(10);
        bucket.total_allocated = 3;
        bucket.allocations.insert("A".to_string(), 3);
        bucket.demands.insert("A".to_string(), 3);
        bucket.priority_of_customer.insert("A".to_string(), 1);
        Schedule::assemble(vec![bucket])
    }

    #[async_trait]
    impl Pipeline for MockPipeline {
        async fn cached_schedule(&self) -> Option<Schedule> {
            self.cached.clone()
        }

        async fn ingest(&self) -> Result<IngestSummary> {
            self.ingest_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_ingest {
                return Err(SchedulerError::InputUnavailable {
                    path: "missing.csv".to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                });
            }
            Ok(IngestSummary {
                rows_read: 1,
                batches: 1,
                entries_stored: 1,
                ..Default::default()
            })
        }

        async fn aggregate(&self) -> Result<Schedule> {
            self.aggregate_calls.fetch_add(1, Ordering::SeqCst);
            Ok(one_hour_schedule())
        }

        async fn persist(&self, _schedule: &Schedule) {
            self.persist_calls.fetch_add(1, Ordering::SeqCst);
        }

        fn capacity(&self) -> i64 {
            5
        }
    }

    #[tokio::test]
    async fn test_full_run_visits_every_phase() {
        let engine = SchedulerEngine::new(MockPipeline::default());

        let summary = engine.run().await.unwrap();

        assert!(!summary.from_cache);
        assert_eq!(summary.capacity, 5);
        assert_eq!(summary.schedule, one_hour_schedule());
        assert_eq!(summary.ingest.unwrap().rows_read, 1);

        let pipeline = engine.pipeline();
        assert_eq!(pipeline.ingest_calls.load(Ordering::SeqCst), 1);
        assert_eq!(pipeline.aggregate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(pipeline.persist_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_schedule_short_circuits() {
        let engine = SchedulerEngine::new(MockPipeline {
            cached: Some(one_hour_schedule()),
            ..Default::default()
        });

        let summary = engine.run().await.unwrap();

        assert!(summary.from_cache);
        assert!(summary.ingest.is_none());
        assert_eq!(engine.pipeline().ingest_calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.pipeline().aggregate_calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.pipeline().persist_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fatal_ingest_error_aborts_run() {
        let engine = SchedulerEngine::new_with_monitoring(
            MockPipeline {
                fail_ingest: true,
                ..Default::default()
            },
            false,
        );

        let result = engine.run().await;

        assert!(matches!(result, Err(SchedulerError::InputUnavailable { .. })));
        assert_eq!(engine.pipeline().aggregate_calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.pipeline().persist_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(RunPhase::CacheCheck.to_string(), "cache check");
        assert_eq!(RunPhase::Done.to_string(), "done");
    }
}
