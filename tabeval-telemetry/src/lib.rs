//! # tabeval telemetry
//!
//! Structured logging for tabeval using `tracing`.
//!
//! ## Usage
//!
//! ```rust
//! use tabeval_telemetry::{eval_run_span, info, init_telemetry};
//!
//! init_telemetry("tabeval").expect("telemetry");
//! let span = eval_run_span("Metric 1", 3);
//! let _enter = span.enter();
//! info!("evaluating");
//! ```

pub mod init;
pub mod spans;

// Re-export tracing macros for convenience
pub use tracing::{Span, debug, error, info, instrument, trace, warn};

pub use init::{init_json_telemetry, init_telemetry};
pub use spans::*;
