use crate::domain::model::{DemandEntry, Schedule};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use dashmap::DashMap;
use tokio::sync::RwLock;

/// In-memory storage: one append buffer per hour plus a slot for the last schedule
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    demand: DashMap<u8, Vec<DemandEntry>>,
    schedule: RwLock<Schedule>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_hours(&self) -> usize {
        self.demand.len()
    }
}

impl Storage for InMemoryStorage {
    async fn append_demand(&self, hour: u8, entries: Vec<DemandEntry>) -> Result<()> {
        // entry() 只鎖住該小時所在的 shard
        self.demand.entry(hour).or_default().extend(entries);
        Ok(())
    }

    async fn fetch_demand(&self, hour: u8) -> Vec<DemandEntry> {
        self.demand
            .get(&hour)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    async fn store_schedule(&self, schedule: &Schedule) -> Result<()> {
        *self.schedule.write().await = schedule.clone();
        Ok(())
    }

    async fn fetch_schedule(&self) -> Schedule {
        self.schedule.read().await.clone()
    }

    async fn clear_intermediate(&self) -> Result<()> {
        self.demand.clear();
        Ok(())
    }
}
