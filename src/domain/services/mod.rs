pub mod allocation;
pub mod normalizer;

pub use allocation::allocate;
pub use normalizer::{normalize, normalize_batch, parse_hour, NormalizedBatch};
