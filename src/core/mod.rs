pub mod engine;
pub mod pipeline;

pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
pub use engine::{RunPhase, RunSummary, SchedulerEngine};
pub use pipeline::SchedulePipeline;
