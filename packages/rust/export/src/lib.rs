//! Output writers for collection runs.

pub mod writer;

pub use writer::{collect_stats, CollectionReport, Exporter};
