//! Message types exchanged between the pipeline and its host
//!
//! - `progress`: run phases and progress events streamed to the host
//! - `scan`: the scan result and the JSON artifact records persisted from it

pub mod progress;
pub mod scan;

pub use progress::{ProgressEvent, RunPhase};
pub use scan::{ScanItem, ScanRecord, ScanResult};
