//! HTTP API server for LexQA.
//!
//! This crate wires the legal question-answering pipeline together: axum
//! routers for auth and QA endpoints, sqlx/SQLite repositories over the
//! knowledge tables, the outbound LLM gateway, and the orchestrator that
//! runs a question through classification, retrieval, answering, and
//! persistence.

#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod llm;
pub mod qa;
pub mod response;
pub mod router;
pub mod server;
pub mod state;

pub use config::*;
pub use error::*;
pub use response::ApiResponse;
pub use state::AppState;
