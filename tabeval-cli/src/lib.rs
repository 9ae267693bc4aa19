//! # tabeval-cli
//!
//! Command-line front end for tabeval.
//!
//! ## Commands
//!
//! - `tabeval inspect <file>` - detected schema and a preview of the first rows
//! - `tabeval validate <file> --config eval.toml` - instruction checks per metric
//! - `tabeval run <file> --config eval.toml` - evaluate every metric, print and export results
//! - `tabeval console <file>` - define and run metrics interactively
//!
//! The judge API key is read from the environment (default `OPENAI_API_KEY`);
//! a `.env` file in the working directory is loaded first.

pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
