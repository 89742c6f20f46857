//! 將原始通話預測轉為每小時的客服需求。
//!
//! 一列資料涵蓋 `[start, end)` 之間的每個整點，每個小時產生一筆 [`DemandEntry`]；
//! 跨午夜或長度為零的區間不支援，直接捨棄。

use crate::domain::model::{DemandEntry, RawCallRecord, HOURS_PER_DAY};
use crate::utils::error::{Result, SchedulerError};
use std::collections::BTreeMap;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// 單列單一小時可要求的客服人數上限，超過即視為資料錯誤
pub const MAX_AGENTS_PER_HOUR: u64 = u32::MAX as u64;

/// 一個批次正規化後的結果，依小時分組
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub by_hour: BTreeMap<u8, Vec<DemandEntry>>,
    pub accepted: usize,
    pub skipped: usize,
    pub dropped: usize,
}

impl NormalizedBatch {
    pub fn entry_count(&self) -> usize {
        self.by_hour.values().map(Vec::len).sum()
    }
}

/// 解析時間字串的小時部分，例如 `10:00 AM`、`1 PM`、`13:30`
pub fn parse_hour(time: &str) -> Result<u32> {
    let time = time.trim().to_uppercase();
    let prefix = time.split(':').next().unwrap_or_default();
    let digits: String = prefix.chars().filter(char::is_ascii_digit).collect();

    let mut hour: u32 = digits
        .parse()
        .map_err(|_| SchedulerError::malformed(format!("invalid time '{}'", time)))?;

    if time.contains("PM") && hour < 12 {
        hour += 12;
    }
    if time.contains("AM") && hour == 12 {
        hour = 0;
    }
    Ok(hour)
}

fn parse_field<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SchedulerError::malformed(format!("field {} has invalid value '{}'", name, value)))
}

/// 正規化單一列資料，回傳 (小時, 需求) 清單
pub fn normalize(record: &RawCallRecord, utilization: f64) -> Result<Vec<(u8, DemandEntry)>> {
    let total_calls: u64 = parse_field("NumberOfCalls", &record.total_calls)?;
    let avg_duration: u64 =
        parse_field("AverageCallDurationSeconds", &record.avg_call_duration_seconds)?;
    let priority: i32 = parse_field("Priority", &record.priority)?;
    let start_hour = parse_hour(&record.start_time)?;
    let end_hour = parse_hour(&record.end_time)?;

    if end_hour <= start_hour {
        return Err(SchedulerError::ZeroOrNegativeSpan {
            customer: record.customer.clone(),
            start_hour,
            end_hour,
        });
    }

    let active_hours = f64::from(end_hour - start_hour);
    let calls_per_hour = total_calls as f64 / active_hours;
    let agents = (calls_per_hour * avg_duration as f64 / SECONDS_PER_HOUR * utilization).ceil();
    if !agents.is_finite() || agents > MAX_AGENTS_PER_HOUR as f64 {
        return Err(SchedulerError::malformed(format!(
            "customer '{}' needs {} agents per hour, above the limit of {}",
            record.customer, agents, MAX_AGENTS_PER_HOUR
        )));
    }
    let agents = agents as u64;

    // 只展開當天的小時，超過 23:00 的部分不建立需求
    let last_hour = end_hour.min(u32::from(HOURS_PER_DAY));
    if last_hour < end_hour {
        tracing::debug!(
            customer = %record.customer,
            end_hour,
            "Discarding hours past 23:00"
        );
    }

    let entries = (start_hour..last_hour)
        .filter_map(|hour| u8::try_from(hour).ok())
        .map(|hour| (hour, DemandEntry::new(record.customer.clone(), agents, priority)))
        .collect();

    Ok(entries)
}

/// 正規化一個批次；無效的列會被略過，不影響同批次其他列
pub fn normalize_batch(records: &[RawCallRecord], utilization: f64) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for record in records {
        match normalize(record, utilization) {
            Ok(entries) => {
                batch.accepted += 1;
                for (hour, entry) in entries {
                    batch.by_hour.entry(hour).or_default().push(entry);
                }
            }
            Err(e @ SchedulerError::ZeroOrNegativeSpan { .. }) => {
                tracing::debug!("Dropping row: {}", e);
                batch.dropped += 1;
            }
            Err(e) => {
                tracing::warn!(customer = %record.customer, "Skipping row: {}", e);
                batch.skipped += 1;
            }
        }
    }

    batch
}
