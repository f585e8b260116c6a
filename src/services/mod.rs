//! # Service Layer
//!
//! Orchestration between the web handlers and the domain modules.

pub mod generator;

pub use generator::{GenerationOutcome, GenerationRequest, GenerationService};
