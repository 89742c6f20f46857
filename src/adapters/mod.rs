// Adapters layer: concrete implementations of the domain ports for external systems
// (record source, storage backends).

pub mod source;
pub mod storage;

pub use source::CsvRecordSource;
pub use storage::{InMemoryStorage, LocalStorage};
