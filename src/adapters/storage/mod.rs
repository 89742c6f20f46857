pub mod local;
pub mod memory;

pub use local::{CacheKey, LocalStorage};
pub use memory::InMemoryStorage;
