//! Collection pipeline orchestration.

pub mod pipeline;

pub use cairn_normalize::PipelineConfig;
pub use pipeline::{
    collect_corpus, normalize_snapshot, read_records, report_corpus, CollectConfig, CollectResult,
    ProgressReporter, SilentProgress,
};
