//! 單一小時的容量分配。
//!
//! 優先序數字越小越先服務；無法完整滿足的那一層以比例分配，
//! 取 floor 後的差額依 largest-remainder 規則逐一補給，之後的層級一律為零。

use crate::domain::model::{DemandEntry, ScheduleBucket};
use std::collections::BTreeMap;

/// 計算某一小時的分配結果。`capacity <= 0` 代表無上限。
pub fn allocate(hour: u8, entries: &[DemandEntry], capacity: i64) -> ScheduleBucket {
    let mut bucket = ScheduleBucket::empty(hour);
    if entries.is_empty() {
        return bucket;
    }

    // 需求彙總僅供報表使用；同一客戶出現多個優先序時以最後一筆為準
    for entry in entries {
        let demand = bucket.demands.entry(entry.customer.clone()).or_insert(0);
        *demand = demand.saturating_add(entry.agents);
        bucket
            .priority_of_customer
            .insert(entry.customer.clone(), entry.priority);
    }

    if capacity <= 0 {
        bucket.allocations = bucket.demands.clone();
        bucket.total_allocated = saturating_sum(bucket.demands.values().copied());
        return bucket;
    }

    let mut tiers: BTreeMap<i32, Vec<&DemandEntry>> = BTreeMap::new();
    for entry in entries {
        tiers.entry(entry.priority).or_default().push(entry);
    }

    let capacity = capacity as u64;
    let mut remaining = capacity;

    for (priority, tier) in &tiers {
        if remaining == 0 {
            break;
        }

        let tier_demand = saturating_sum(tier.iter().map(|e| e.agents));
        if tier_demand <= remaining {
            for entry in tier {
                grant(&mut bucket.allocations, &entry.customer, entry.agents);
            }
            remaining -= tier_demand;
        } else {
            tracing::debug!(
                hour,
                priority,
                tier_demand,
                remaining,
                "Tier exceeds remaining capacity, splitting fairly"
            );
            fair_share(&mut bucket.allocations, tier, tier_demand, remaining);
            remaining = 0;
            break;
        }
    }

    bucket.total_allocated = capacity - remaining;
    bucket
}

fn grant(allocations: &mut BTreeMap<String, u64>, customer: &str, agents: u64) {
    let allocated = allocations.entry(customer.to_string()).or_insert(0);
    *allocated = allocated.saturating_add(agents);
}

/// 異常大的需求在加總時停在 `u64::MAX`，不會溢位
fn saturating_sum(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

/// 比例分配 `remaining`，floor 之後的餘數依捨去量由大到小補給
fn fair_share(
    allocations: &mut BTreeMap<String, u64>,
    tier: &[&DemandEntry],
    tier_demand: u64,
    remaining: u64,
) {
    let ratio = remaining as f64 / tier_demand as f64;

    let mut floored_total = 0u64;
    let mut rounding_losses = Vec::with_capacity(tier.len());
    for entry in tier {
        let exact_share = entry.agents as f64 * ratio;
        let floored_share = exact_share.floor();
        grant(allocations, &entry.customer, floored_share as u64);
        floored_total = floored_total.saturating_add(floored_share as u64);
        rounding_losses.push(exact_share - floored_share);
    }

    let leftover = remaining.saturating_sub(floored_total);
    for index in leftover_recipients(&rounding_losses, leftover) {
        grant(allocations, &tier[index].customer, 1);
    }
}

/// 依捨去量遞減（同值保持原順序）排出補給順序，超過筆數時循環
fn leftover_recipients(rounding_losses: &[f64], leftover: u64) -> Vec<usize> {
    if rounding_losses.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..rounding_losses.len()).collect();
    order.sort_by(|a, b| rounding_losses[*b].total_cmp(&rounding_losses[*a]));

    (0..leftover as usize)
        .map(|unit| order[unit % order.len()])
        .collect()
}
