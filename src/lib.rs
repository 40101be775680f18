//! Bulletin: learn a reference document's format, synthesize a fresh
//! document in that format, and publish it once it passes structural checks.
//!
//! The pipeline runs Probe → Learn → Synthesize → Validate under a bounded
//! retry budget; see [`orchestrator::RetryOrchestrator`].

pub mod cli;
pub mod config;
pub mod credential;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod persist;
pub mod pipeline;
pub mod probe;
pub mod profile;
pub mod prompts;
pub mod provider;
pub mod validation;
