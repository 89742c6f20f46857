use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 一天的小時數，亦即聚合階段的任務數
pub const HOURS_PER_DAY: u8 = 24;

/// 輸入 CSV 的一列原始資料，數值欄位保留為字串，交由正規化階段解析
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCallRecord {
    #[serde(rename = "CustomerName")]
    pub customer: String,
    #[serde(rename = "NumberOfCalls")]
    pub total_calls: String,
    #[serde(rename = "AverageCallDurationSeconds")]
    pub avg_call_duration_seconds: String,
    #[serde(rename = "Priority")]
    pub priority: String,
    #[serde(rename = "StartTimePT")]
    pub start_time: String,
    #[serde(rename = "EndTimePT")]
    pub end_time: String,
}

/// 單一客戶在某一小時所需的客服人數
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandEntry {
    pub customer: String,
    pub agents: u64,
    pub priority: i32,
}

impl DemandEntry {
    pub fn new(customer: impl Into<String>, agents: u64, priority: i32) -> Self {
        Self {
            customer: customer.into(),
            agents,
            priority,
        }
    }
}

/// 某一小時的最終分配結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleBucket {
    pub hour: u8,
    pub total_allocated: u64,
    pub allocations: BTreeMap<String, u64>,
    pub demands: BTreeMap<String, u64>,
    pub priority_of_customer: BTreeMap<String, i32>,
}

impl ScheduleBucket {
    pub fn empty(hour: u8) -> Self {
        Self {
            hour,
            total_allocated: 0,
            allocations: BTreeMap::new(),
            demands: BTreeMap::new(),
            priority_of_customer: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_allocated == 0
    }

    pub fn hour_label(&self) -> String {
        format!("{:02}:00", self.hour)
    }

    pub fn allocation_for(&self, customer: &str) -> u64 {
        self.allocations.get(customer).copied().unwrap_or(0)
    }

    pub fn demand_for(&self, customer: &str) -> u64 {
        self.demands.get(customer).copied().unwrap_or(0)
    }

    /// 需求大於分配即視為被限流
    pub fn is_throttled(&self, customer: &str) -> bool {
        self.demand_for(customer) > self.allocation_for(customer)
    }

    pub fn throttled_customers(&self) -> Vec<&str> {
        self.demands
            .keys()
            .filter(|customer| self.is_throttled(customer))
            .map(String::as_str)
            .collect()
    }

    pub fn is_any_throttled(&self) -> bool {
        self.demands.keys().any(|customer| self.is_throttled(customer))
    }
}

/// 依小時遞增排序的 24 個 bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    buckets: Vec<ScheduleBucket>,
}

impl Schedule {
    /// 由聚合結果組出完整排程：依小時排序，缺少的小時補上空 bucket
    pub fn assemble(buckets: Vec<ScheduleBucket>) -> Self {
        let mut by_hour: BTreeMap<u8, ScheduleBucket> = BTreeMap::new();
        for bucket in buckets {
            if bucket.hour < HOURS_PER_DAY {
                by_hour.insert(bucket.hour, bucket);
            }
        }

        let buckets = (0..HOURS_PER_DAY)
            .map(|hour| {
                by_hour
                    .remove(&hour)
                    .unwrap_or_else(|| ScheduleBucket::empty(hour))
            })
            .collect();

        Self { buckets }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn buckets(&self) -> &[ScheduleBucket] {
        &self.buckets
    }

    pub fn bucket(&self, hour: u8) -> Option<&ScheduleBucket> {
        self.buckets.iter().find(|b| b.hour == hour)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScheduleBucket> {
        self.buckets.iter()
    }

    pub fn total_allocated(&self) -> u64 {
        self.buckets.iter().map(|b| b.total_allocated).sum()
    }
}

/// ingestion 階段的統計
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub rows_read: usize,
    pub rows_rejected: usize,
    pub batches: usize,
    pub entries_stored: usize,
    pub rows_skipped: usize,
    pub rows_dropped: usize,
    pub failed_appends: usize,
    pub failed_batches: usize,
}

impl IngestSummary {
    /// 有任何寫入失敗時排程可能被低估
    pub fn is_degraded(&self) -> bool {
        self.failed_appends > 0 || self.failed_batches > 0
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a ScheduleBucket;
    type IntoIter = std::slice::Iter<'a, ScheduleBucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_fills_and_sorts_hours() {
        let mut late = ScheduleBucket::empty(22);
        late.total_allocated = 5;
        late.allocations.insert("A".to_string(), 5);
        late.demands.insert("A".to_string(), 5);

        let schedule = Schedule::assemble(vec![late, ScheduleBucket::empty(3)]);

        assert_eq!(schedule.len(), 24);
        let hours: Vec<u8> = schedule.iter().map(|b| b.hour).collect();
        assert_eq!(hours, (0..24).collect::<Vec<u8>>());
        assert_eq!(schedule.bucket(22).unwrap().total_allocated, 5);
        assert!(schedule.bucket(0).unwrap().is_empty());
    }

    #[test]
    fn test_throttled_customers() {
        let mut bucket = ScheduleBucket::empty(10);
        bucket.allocations.insert("High".to_string(), 10);
        bucket.allocations.insert("Low".to_string(), 10);
        bucket.demands.insert("High".to_string(), 10);
        bucket.demands.insert("Low".to_string(), 20);
        bucket.total_allocated = 20;

        assert!(!bucket.is_throttled("High"));
        assert!(bucket.is_throttled("Low"));
        assert!(bucket.is_any_throttled());
        assert_eq!(bucket.throttled_customers(), vec!["Low"]);
        assert_eq!(bucket.hour_label(), "10:00");
    }

    #[test]
    fn test_bucket_serializes_camel_case() {
        let bucket = ScheduleBucket::empty(7);
        let json = serde_json::to_value(&bucket).unwrap();
        assert_eq!(json["hour"], 7);
        assert_eq!(json["totalAllocated"], 0);
        assert!(json["priorityOfCustomer"].as_object().unwrap().is_empty());
    }
}
