//! # Engine Module
//!
//! Run-time plumbing shared by every workflow: typed run configuration, the error
//! taxonomy workflows return, and progress reporting.
//!
//! - **Configuration** ([`config`]) - Builders that validate a run's parameters once,
//!   including the batch [`FailurePolicy`](config::FailurePolicy).
//! - **Error Handling** ([`error`]) - [`EngineError`](error::EngineError), which wraps
//!   the per-layer errors of [`crate::core`] with the item or file they concern.
//! - **Progress Monitoring** ([`progress`]) - A callback-based event stream that front
//!   ends turn into progress bars or log lines.

pub mod config;
pub mod error;
pub mod progress;
