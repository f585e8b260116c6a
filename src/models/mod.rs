//! # Data Layer
//!
//! sqlx-backed models for the persisted entities. The only table is the
//! generation record: a flat row per synthesized scaffold with a download
//! counter, as befits a cache-plus-ledger.

pub mod generation;

pub use generation::{
    Generation, GenerationListQuery, GenerationStats, NewGeneration, PaginatedGenerationList,
    PaginationInfo,
};
