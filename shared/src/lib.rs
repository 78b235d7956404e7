//! Shared types for the page scanning pipeline
//!
//! Contains the records that cross crate boundaries (references, catalog
//! matches, scan artifacts, progress events) together with the plumbing every
//! outbound call goes through: the sliding-window limiter, the TTL cache and
//! the retry policy.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod rate_limit;
pub mod retry;
pub mod types;

pub use errors::*;
pub use types::*;

pub use messages::{ProgressEvent, RunPhase, ScanItem, ScanRecord, ScanResult};
pub use rate_limit::{RateLimitedCache, SlidingWindowLimiter, TtlCache};
pub use retry::{RetryPolicy, Retryable};
