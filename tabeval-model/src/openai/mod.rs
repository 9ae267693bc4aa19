//! OpenAI provider implementation.
//!
//! Talks to the chat completions endpoint of OpenAI or any API that speaks the
//! same wire format (vLLM, Ollama's OpenAI shim, Azure-style gateways).
//!
//! # Example
//!
//! ```rust,ignore
//! use tabeval_model::openai::{OpenAIClient, OpenAIConfig};
//!
//! let client = OpenAIClient::new(OpenAIConfig {
//!     api_key: std::env::var("OPENAI_API_KEY").unwrap(),
//!     model: "gpt-4".to_string(),
//!     ..Default::default()
//! })?;
//! ```

mod client;
mod config;
pub(crate) mod convert;

pub use client::OpenAIClient;
pub use config::{OPENAI_API_BASE, OpenAIConfig};
