//! # TaskScout Core
//!
//! Domain types, capability traits, and error definitions for the TaskScout
//! task-execution agent. This crate has **no HTTP dependencies**; it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (language model, web search, page fetching) is
//! defined as a trait here. Implementations live in their respective crates.
//! This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;
pub mod task;
pub mod web;

// Re-export key types at crate root for ergonomics
pub use error::{Error, PipelineError, ProviderError, Result, WebError};
pub use message::{Message, Role};
pub use provider::{EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse};
pub use task::{Task, TaskId, TaskStatus};
pub use web::{PageFetcher, SearchEngine, NOT_HTML_PLACEHOLDER};
