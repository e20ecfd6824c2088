//! LLM-backed QA agents.
//!
//! A provider-agnostic chat client ([`llm`]), tolerant reply parsing
//! ([`response`]) and two single-shot agents ([`agents`]) that turn a
//! requirements document into test cases or a log file into a report.

pub mod agents;
pub mod commands;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod response;

pub use error::{Error, Result};
