//! # tabeval-core
//!
//! Core traits and types shared by the tabeval crates.
//!
//! ## Overview
//!
//! - [`Llm`] - The model capability every judge model implements
//! - [`LlmRequest`] / [`LlmResponse`] - What goes to and comes back from a model
//! - [`Content`] / [`Part`] - Role-tagged message content
//! - [`TabevalError`] / [`Result`] - Unified error handling
//!
//! ## The model capability
//!
//! ```rust,ignore
//! #[async_trait]
//! pub trait Llm: Send + Sync {
//!     fn name(&self) -> &str;
//!     async fn generate_content(&self, req: LlmRequest, stream: bool) -> Result<LlmResponseStream>;
//! }
//! ```
//!
//! A request carries the grading instruction as its system instruction and the
//! record under evaluation as a single user content. Replies arrive as a stream
//! of [`LlmResponse`] chunks whose text parts are concatenated by the caller.

pub mod error;
pub mod model;
pub mod types;

pub use error::{Result, TabevalError};
pub use model::{
    FinishReason, GenerateContentConfig, Llm, LlmRequest, LlmResponse, LlmResponseStream,
    UsageMetadata,
};
pub use types::{Content, Part};
