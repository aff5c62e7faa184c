//! Shared types, error model, and configuration for cairn.
//!
//! This crate is the foundation depended on by all other cairn crates.
//! It provides:
//! - [`CairnError`] — the unified error type
//! - Domain types ([`ContentType`], [`CanonicalRecord`], [`CompletenessReport`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiConfig, AppConfig, BoundingBox, DefaultsConfig, FetchConfig, PipelinePolicyConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, validate_config,
};
pub use error::{CairnError, Result};
pub use types::{
    CURRENT_SCHEMA_VERSION, CanonicalRecord, CollectionStats, CompletenessReport, ContentType,
    CoordinatePrecision, FieldCompleteness, QualityTier, value_is_present,
};
