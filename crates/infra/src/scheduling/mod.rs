//! Background workers for the cache pool
//!
//! - Expiry sweeper (periodic `clean_expired`)
//! - Refresh-ahead worker (periodic `refresh_ahead`)
//!
//! Both follow the same lifecycle rules:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support, also triggered on drop
//! - Bounded wait when stopping

pub mod error;
pub mod expiry_sweeper;
pub mod refresh_worker;

pub use error::{SchedulerError, SchedulerResult};
pub use expiry_sweeper::ExpirySweeper;
pub use refresh_worker::RefreshAheadWorker;
