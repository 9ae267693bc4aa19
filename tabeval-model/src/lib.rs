//! # tabeval-model
//!
//! Judge model integrations for tabeval.
//!
//! ## Overview
//!
//! - [`OpenAIClient`] - OpenAI chat completions and any OpenAI-compatible endpoint
//! - [`MockLlm`] - Scripted model for tests and dry runs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tabeval_model::openai::{OpenAIClient, OpenAIConfig};
//!
//! let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
//! let model = OpenAIClient::new(OpenAIConfig::new(api_key, "gpt-4")).unwrap();
//! ```
//!
//! Clients never retry. A failed call surfaces as a model error so that the
//! evaluation runner can record it against the row that triggered it.

pub mod mock;
pub mod openai;

pub use mock::MockLlm;
pub use openai::{OpenAIClient, OpenAIConfig};
