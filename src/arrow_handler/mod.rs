/// Arrow IPC export of scored feature tables
pub mod builder;

// Re-export commonly used functions
pub use builder::{build_scored_batch, serialize_to_ipc, write_scored_ipc, LABEL_COLUMN};
