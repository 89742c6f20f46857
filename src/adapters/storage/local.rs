use crate::domain::model::{DemandEntry, Schedule};
use crate::domain::ports::{ConfigProvider, Storage};
use crate::utils::error::{Result, SchedulerError};
use chrono::{DateTime, Local, NaiveDate, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

const SCHEDULE_FILE_PREFIX: &str = "schedule";
const INTERMEDIATE_FILE_PREFIX: &str = "intermediate";

/// 產生排程所用的設定；快取只在設定完全相同時才有效
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheKey {
    pub input_path: String,
    pub utilization: f64,
    /// 無上限一律記為 0
    pub capacity: i64,
}

impl CacheKey {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            input_path: config.input_path().to_string(),
            utilization: config.utilization(),
            capacity: config.capacity().max(0),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSchedule {
    generated_at: DateTime<Utc>,
    run_date: NaiveDate,
    cache_key: CacheKey,
    buckets: Schedule,
}

/// 檔案系統儲存：每次 append 寫成一個中繼 CSV，排程以日期命名的 JSON 保存
#[derive(Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
    run_date: NaiveDate,
    cache_key: CacheKey,
    next_file_index: AtomicUsize,
    intermediate_files: DashMap<u8, Vec<PathBuf>>,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self::with_date(base_path, Local::now().date_naive())
    }

    pub fn with_date(base_path: impl Into<PathBuf>, run_date: NaiveDate) -> Self {
        Self {
            base_path: base_path.into(),
            run_date,
            cache_key: CacheKey::default(),
            next_file_index: AtomicUsize::new(0),
            intermediate_files: DashMap::new(),
        }
    }

    /// 設定本次執行的快取鍵，與既有排程檔不符時視為沒有快取
    pub fn with_cache_key(mut self, cache_key: CacheKey) -> Self {
        self.cache_key = cache_key;
        self
    }

    pub fn schedule_path(&self) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.json", SCHEDULE_FILE_PREFIX, self.run_date))
    }

    fn next_intermediate_path(&self, hour: u8) -> PathBuf {
        let index = self.next_file_index.fetch_add(1, Ordering::Relaxed);
        self.base_path.join(format!(
            "{}_{}_{}_h{:02}.csv",
            INTERMEDIATE_FILE_PREFIX, self.run_date, index, hour
        ))
    }

    fn write_entries(path: &Path, entries: &[DemandEntry]) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for entry in entries {
            writer.serialize(entry)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn read_entries(path: &Path) -> Result<Vec<DemandEntry>> {
        let mut reader = csv::Reader::from_path(path)?;
        let entries = reader
            .deserialize()
            .collect::<std::result::Result<Vec<DemandEntry>, csv::Error>>()?;
        Ok(entries)
    }

    fn read_schedule(path: &Path) -> Result<PersistedSchedule> {
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }
}

impl Storage for LocalStorage {
    async fn append_demand(&self, hour: u8, entries: Vec<DemandEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        fs::create_dir_all(&self.base_path)
            .map_err(|e| SchedulerError::storage("append_demand", e))?;

        let path = self.next_intermediate_path(hour);
        Self::write_entries(&path, &entries).map_err(|e| {
            SchedulerError::storage("append_demand", format!("{}: {}", path.display(), e))
        })?;

        tracing::debug!(hour, entries = entries.len(), "Wrote {}", path.display());
        self.intermediate_files.entry(hour).or_default().push(path);
        Ok(())
    }

    async fn fetch_demand(&self, hour: u8) -> Vec<DemandEntry> {
        let files = match self.intermediate_files.get(&hour) {
            Some(files) => files.clone(),
            None => return Vec::new(),
        };

        let mut entries = Vec::new();
        for path in files {
            match Self::read_entries(&path) {
                Ok(mut read) => entries.append(&mut read),
                Err(e) => {
                    // 單一檔案失敗只影響該小時的一部分資料
                    tracing::error!(
                        hour,
                        "⚠️ Could not read intermediate file {}: {}; hour will be understated",
                        path.display(),
                        e
                    );
                }
            }
        }
        entries
    }

    async fn store_schedule(&self, schedule: &Schedule) -> Result<()> {
        fs::create_dir_all(&self.base_path)
            .map_err(|e| SchedulerError::storage("store_schedule", e))?;

        let persisted = PersistedSchedule {
            generated_at: Utc::now(),
            run_date: self.run_date,
            cache_key: self.cache_key.clone(),
            buckets: schedule.clone(),
        };
        let data = serde_json::to_vec_pretty(&persisted)?;

        // 先寫暫存檔再改名，避免留下半個排程檔
        let path = self.schedule_path();
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, data).map_err(|e| SchedulerError::storage("store_schedule", e))?;
        fs::rename(&tmp_path, &path).map_err(|e| SchedulerError::storage("store_schedule", e))?;

        tracing::debug!("Schedule written to {}", path.display());
        Ok(())
    }

    async fn fetch_schedule(&self) -> Schedule {
        let path = self.schedule_path();
        if !path.exists() {
            return Schedule::default();
        }

        match Self::read_schedule(&path) {
            Ok(persisted) if persisted.cache_key == self.cache_key => persisted.buckets,
            Ok(persisted) => {
                tracing::info!(
                    "Schedule {} was built with different settings ({:?}), recomputing",
                    path.display(),
                    persisted.cache_key
                );
                Schedule::default()
            }
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable schedule {}: {}",
                    path.display(),
                    e
                );
                Schedule::default()
            }
        }
    }

    async fn clear_intermediate(&self) -> Result<()> {
        let hours: Vec<u8> = self.intermediate_files.iter().map(|e| *e.key()).collect();

        let mut failures = Vec::new();
        for hour in hours {
            let Some((_, files)) = self.intermediate_files.remove(&hour) else {
                continue;
            };
            for path in files {
                if let Err(e) = fs::remove_file(&path) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        failures.push(format!("{}: {}", path.display(), e));
                    }
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SchedulerError::storage(
                "clear_intermediate",
                failures.join("; "),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ScheduleBucket;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn sample_schedule() -> Schedule {
        let mut bucket = ScheduleBucket::empty(10);
        bucket.total_allocated = 15;
        bucket.allocations.insert("CustomerA".to_string(), 9);
        bucket.allocations.insert("CustomerB".to_string(), 6);
        bucket.demands.insert("CustomerA".to_string(), 9);
        bucket.demands.insert("CustomerB".to_string(), 17);
        bucket.priority_of_customer.insert("CustomerA".to_string(), 1);
        bucket.priority_of_customer.insert("CustomerB".to_string(), 2);
        Schedule::assemble(vec![bucket])
    }

    #[tokio::test]
    async fn test_append_and_fetch_across_files() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::with_date(dir.path(), run_date());

        storage
            .append_demand(10, vec![DemandEntry::new("A", 3, 1)])
            .await
            .unwrap();
        storage
            .append_demand(10, vec![DemandEntry::new("B", 4, 2), DemandEntry::new("A", 1, 1)])
            .await
            .unwrap();
        storage
            .append_demand(11, vec![DemandEntry::new("C", 5, 1)])
            .await
            .unwrap();

        let ten = storage.fetch_demand(10).await;
        assert_eq!(ten.len(), 3);
        assert!(ten.contains(&DemandEntry::new("B", 4, 2)));
        assert_eq!(storage.fetch_demand(11).await, vec![DemandEntry::new("C", 5, 1)]);
        assert!(storage.fetch_demand(12).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_use_distinct_files() {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::with_date(dir.path(), run_date()));

        let mut handles = Vec::new();
        for worker in 0..8 {
            let storage = Arc::clone(&storage);
            handles.push(tokio::spawn(async move {
                let entry = DemandEntry::new(format!("W{}", worker), 1, 1);
                storage.append_demand(7, vec![entry]).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(storage.fetch_demand(7).await.len(), 8);
    }

    #[tokio::test]
    async fn test_schedule_round_trip() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::with_date(dir.path(), run_date());
        let schedule = sample_schedule();

        assert!(storage.fetch_schedule().await.is_empty());
        storage.store_schedule(&schedule).await.unwrap();

        let fetched = storage.fetch_schedule().await;
        assert_eq!(fetched, schedule);
        assert_eq!(fetched.len(), 24);
        let bucket = fetched.bucket(10).unwrap();
        assert_eq!(bucket.priority_of_customer["CustomerB"], 2);
        assert_eq!(bucket.demands["CustomerB"], 17);
    }

    #[tokio::test]
    async fn test_schedule_visible_to_new_instance_same_day() {
        let dir = TempDir::new().unwrap();
        LocalStorage::with_date(dir.path(), run_date())
            .store_schedule(&sample_schedule())
            .await
            .unwrap();

        let same_day = LocalStorage::with_date(dir.path(), run_date());
        assert_eq!(same_day.fetch_schedule().await, sample_schedule());

        let next_day =
            LocalStorage::with_date(dir.path(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert!(next_day.fetch_schedule().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_schedule_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::with_date(dir.path(), run_date());
        fs::write(storage.schedule_path(), b"{ not json").unwrap();

        assert!(storage.fetch_schedule().await.is_empty());
    }

    #[tokio::test]
    async fn test_schedule_from_other_settings_is_not_reused() {
        let dir = TempDir::new().unwrap();
        let key = |capacity: i64| CacheKey {
            input_path: "forecast.csv".to_string(),
            utilization: 1.0,
            capacity,
        };

        LocalStorage::with_date(dir.path(), run_date())
            .with_cache_key(key(15))
            .store_schedule(&sample_schedule())
            .await
            .unwrap();

        let tighter = LocalStorage::with_date(dir.path(), run_date()).with_cache_key(key(5));
        assert!(tighter.fetch_schedule().await.is_empty());

        let same = LocalStorage::with_date(dir.path(), run_date()).with_cache_key(key(15));
        assert_eq!(same.fetch_schedule().await, sample_schedule());
    }

    #[tokio::test]
    async fn test_fetch_demand_skips_unreadable_files() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::with_date(dir.path(), run_date());
        for customer in ["Deleted", "Corrupt", "Survivor"] {
            storage
                .append_demand(4, vec![DemandEntry::new(customer, 2, 1)])
                .await
                .unwrap();
        }

        let files = storage.intermediate_files.get(&4).unwrap().clone();
        assert_eq!(files.len(), 3);
        fs::remove_file(&files[0]).unwrap();
        fs::write(&files[1], b"not,a,demand\nfile").unwrap();

        assert_eq!(
            storage.fetch_demand(4).await,
            vec![DemandEntry::new("Survivor", 2, 1)]
        );

        fs::remove_file(&files[2]).unwrap();
        assert!(storage.fetch_demand(4).await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_intermediate_removes_files() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::with_date(dir.path(), run_date());
        storage
            .append_demand(1, vec![DemandEntry::new("A", 1, 1)])
            .await
            .unwrap();
        storage
            .append_demand(2, vec![DemandEntry::new("B", 1, 1)])
            .await
            .unwrap();

        storage.clear_intermediate().await.unwrap();

        assert!(storage.fetch_demand(1).await.is_empty());
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(INTERMEDIATE_FILE_PREFIX))
            .count();
        assert_eq!(leftovers, 0);
    }
}
