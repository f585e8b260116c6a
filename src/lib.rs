#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Stackforge
//!
//! AI-assisted project scaffold generation service.
//!
//! ## Overview
//!
//! Stackforge turns a tech-stack selection and a free-form prompt into a
//! downloadable starter project: a technology-rule dictionary augments the
//! LLM system prompt, the model synthesizes a JSON file tree, the tree is
//! packaged into a zip archive and uploaded to object storage, and the
//! result is cached by normalized prompt so identical requests are served
//! instantly.
//!
//! ## Module Organization
//!
//! - [`rules`] - prompt normalization, cache keys, and the technology rule catalog
//! - [`llm`] - LLM provider client and file-tree validation
//! - [`archive`] - zip assembly
//! - [`storage`] - artifact store backends
//! - [`models`] - data layer (generation records)
//! - [`services`] - the generation pipeline
//! - [`web`] - Axum REST API
//! - [`config`] - configuration management
//! - [`logging`] - structured logging setup
//! - [`error`] - structured error handling

pub mod archive;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod models;
pub mod rules;
pub mod services;
pub mod storage;
pub mod web;

pub use config::{ConfigLoader, StackforgeConfig};
pub use error::{StackforgeError, StackforgeResult};
