//! Normalization pipeline: raw upstream records → canonical flat records.
//!
//! The stages are pure and independently testable: geometry resolution,
//! locale flattening, area denormalization, search-blob composition, and
//! the assembler that orchestrates them. [`completeness`] analyzes the
//! resulting corpus.

pub mod areas;
pub mod assembler;
pub mod completeness;
pub mod geometry;
pub mod locale;
pub mod schema;
pub mod search;

pub use assembler::{assemble, assemble_batch, assemble_tagged};
pub use completeness::analyze;
pub use schema::PipelineConfig;
