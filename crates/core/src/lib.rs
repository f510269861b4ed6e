//! Core types, errors, and configuration for LexQA
//!
//! This crate provides the foundational types and error handling used
//! throughout the LexQA legal question-answering backend: the domain error
//! taxonomy, the process-wide configuration tree, and the shared question/
//! entity types exchanged between the repositories, the LLM gateway, and the
//! HTTP layer.

pub mod config;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use config::LexConfig;
pub use error::{Error, Result};
pub use types::*;
