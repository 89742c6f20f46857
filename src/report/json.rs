use super::ScheduleRenderer;
use crate::domain::model::Schedule;
use crate::utils::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;

pub struct JsonRenderer;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BucketView<'a> {
    hour: u8,
    total_allocated: u64,
    allocations: &'a BTreeMap<String, u64>,
    demands: &'a BTreeMap<String, u64>,
    throttled: Vec<&'a str>,
}

impl ScheduleRenderer for JsonRenderer {
    fn render(&self, schedule: &Schedule, _capacity: i64) -> Result<String> {
        let view: Vec<BucketView<'_>> = schedule
            .iter()
            .map(|bucket| BucketView {
                hour: bucket.hour,
                total_allocated: bucket.total_allocated,
                allocations: &bucket.allocations,
                demands: &bucket.demands,
                throttled: bucket.throttled_customers(),
            })
            .collect();

        Ok(serde_json::to_string_pretty(&view)?)
    }
}
