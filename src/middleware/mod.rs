//! Middleware layer.
//!
//! Middleware is an [`Endpoint`](crate::Endpoint) that owns another endpoint
//! and decides what happens around the call. The only built-in one is the
//! access log:
//!
//! - [`AccessLog`] — start/end record per request with method, URL, proxy
//!   headers, status, size and latency
//!
//! Records go to a [`LogSink`]: a long-lived [`FileSink`], [`StderrSink`],
//! or [`MemorySink`] for tests.

mod access_log;
mod sink;

pub use access_log::AccessLog;
pub use sink::{FileSink, LogSink, MemorySink, StderrSink};
