//! Fixit - explanations for failed shell commands
//!
//! This library provides the core functionality for the `fixit` CLI tool:
//! turning a failed command into a structured explanation with fix
//! suggestions, backed by an OpenAI-compatible chat API and a TTL cache.

pub mod cache;
pub mod capture;
pub mod cli;
pub mod client;
pub mod config;
pub mod explanation;
pub mod failure;
pub mod logging;
pub mod output;
pub mod parser;
pub mod prompt;
pub mod providers;
pub mod service;

// Re-export commonly used types
pub use cache::{CacheKey, CacheStats, CacheStore, MemoryCache, NullCache};
pub use cli::Cli;
pub use client::{ExplainError, ExplainerClient};
pub use config::Config;
pub use explanation::{Explanation, FixSuggestion};
pub use failure::FailureRecord;
pub use parser::ParseError;
pub use providers::{Provider, ProviderError};
pub use service::ExplanationService;
