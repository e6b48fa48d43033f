//! Shared domain types for HRDesk.
//!
//! This crate holds the plain data shapes used across the workspace:
//! sessions and turns, retrieved corpus fragments, assembled prompts,
//! calculation requests, answers, LLM request/response types, error
//! enums, and engine configuration. No I/O lives here.

pub mod answer;
pub mod calc;
pub mod config;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod retrieval;
pub mod session;
