//! # tabeval-session
//!
//! Ownership of the combined report for the lifetime of one evaluation session.
//!
//! A session pins the schema of the table it was opened for and accumulates the
//! results of every metric run, in run order. Results are only ever appended.

pub mod inmemory;
pub mod service;
pub mod session;

pub use inmemory::InMemorySessionService;
pub use service::{CreateRequest, GetRequest, SessionService};
pub use session::EvalSession;
