//! negcase-core: negative test-case synthesis for API contracts
//!
//! Walks a resolved request schema and a baseline request to produce
//! mutated variants (missing fields, invalid types, boundary violations,
//! header/parameter/security negatives, multi-field combinations), merges
//! them into a duplicate-free suite, and classifies executed responses.
//!
//! Everything here is pure: no I/O besides reading configuration.

pub mod classify;
pub mod config;
pub mod dedup;
pub mod dryrun;
pub mod http;
pub mod mutate;
pub mod operation;
pub mod path;
pub mod report;
pub mod schema;
pub mod suite;
pub mod summary;
pub mod synth;

pub use classify::{
    Classification, ErrorCodeMapping, ErrorText, ExpectationPolicy, KeywordPolicy, classify,
    expected_error_text, extract_error_text, outcome,
};
pub use config::{Config, ConfigError, KnowledgeConfig, LlmConfig};
pub use dedup::{canonical_key, merge, merge_all};
pub use dryrun::DryRunPlan;
pub use http::to_http_file;
pub use operation::{
    Operation, ParamLocation, Parameter, Variant, VariantKind, expected_status_for,
};
pub use path::{FieldPath, Segment};
pub use report::{LlmVerdict, ReportRow, TestStatus};
pub use schema::{Schema, SchemaKind, TypeTag};
pub use suite::{GenerationOptions, GeneratorCounts, Suite, build_suite};
pub use summary::RunSummary;
pub use synth::synthesize;
