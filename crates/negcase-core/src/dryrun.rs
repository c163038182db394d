//! Dry run plan types and config validation
//!
//! Describes the suite each operation *would* get without sending any
//! requests. Used for pre-flight validation and CI previews.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Config;
use crate::operation::{Operation, ParamLocation};
use crate::suite::{GeneratorCounts, build_suite};

// ── Plan types ──

/// Complete dry run plan: operations, variant counts, and config warnings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DryRunPlan {
    /// Per-operation plan
    pub operations: Vec<OperationPlan>,
    /// Deduplicated variants across all operations
    pub total_variants: u64,
    /// Config/contract validation results
    pub validations: Vec<Validation>,
}

/// Plan for a single operation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OperationPlan {
    /// Operation label, e.g. "POST /api/users"
    pub operation: String,
    pub method: String,
    pub path: String,
    /// Variants left after deduplication
    pub total: u32,
    /// Raw per-generator counts
    pub counts: GeneratorCounts,
    /// Parameter names (path, query, header)
    pub parameters: Vec<String>,
    /// Top-level request body property names
    pub body_properties: Vec<String>,
}

/// A validation check result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub check: String,
    pub status: ValidationStatus,
    pub message: String,
}

impl Validation {
    fn new(check: &str, status: ValidationStatus, message: String) -> Self {
        Self {
            check: check.into(),
            status,
            message,
        }
    }
}

/// Status of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

// ── Config validation ──

/// Patterns that suggest a placeholder value rather than a real credential.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-token",
    "your_token",
    "YOUR_TOKEN",
    "your-api-key",
    "YOUR_API_KEY",
    "CHANGEME",
    "changeme",
    "placeholder",
    "replace-me",
    "REPLACE_ME",
];

/// Validate config and produce validation results.
#[must_use]
pub fn validate_config(config: &Config) -> Vec<Validation> {
    let mut checks = Vec::new();

    if config.spec.exists() {
        checks.push(Validation::new(
            "spec",
            ValidationStatus::Ok,
            format!("spec: {} (exists)", config.spec.display()),
        ));
    } else {
        checks.push(Validation::new(
            "spec",
            ValidationStatus::Error,
            format!("spec: {} (not found)", config.spec.display()),
        ));
    }

    match &config.base_url {
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            checks.push(Validation::new(
                "base_url",
                ValidationStatus::Ok,
                format!("base_url: {url}"),
            ));
        }
        Some(url) => checks.push(Validation::new(
            "base_url",
            ValidationStatus::Warning,
            format!("base_url: {url} (missing http:// or https:// prefix)"),
        )),
        None => checks.push(Validation::new(
            "base_url",
            ValidationStatus::Ok,
            "base_url: from contract servers".into(),
        )),
    }

    let header_issues: Vec<String> = config
        .headers
        .iter()
        .filter_map(|(key, value)| {
            if value.contains('<') && value.contains('>') {
                return Some(format!("{key}: contains '<...>' placeholder"));
            }
            PLACEHOLDER_PATTERNS
                .iter()
                .find(|p| value.contains(*p))
                .map(|p| format!("{key}: contains '{p}', may be a placeholder"))
        })
        .collect();
    if header_issues.is_empty() {
        checks.push(Validation::new(
            "headers",
            ValidationStatus::Ok,
            format!("headers: {} configured", config.headers.len()),
        ));
    } else {
        checks.extend(
            header_issues
                .into_iter()
                .map(|issue| Validation::new("headers", ValidationStatus::Warning, issue)),
        );
    }

    if config.concurrency == 0 {
        checks.push(Validation::new(
            "concurrency",
            ValidationStatus::Warning,
            "concurrency: 0, one worker will be used".into(),
        ));
    }

    if config.llm.enabled {
        let status = if std::env::var_os(&config.llm.api_key_env).is_some() {
            ValidationStatus::Ok
        } else {
            ValidationStatus::Warning
        };
        let suffix = if status == ValidationStatus::Ok { "set" } else { "not set, verdicts will be UNSURE" };
        checks.push(Validation::new(
            "llm",
            status,
            format!("llm: {} via {} ({} {suffix})", config.llm.model, config.llm.endpoint, config.llm.api_key_env),
        ));
    }

    if let Some(folder) = &config.knowledge.folder {
        let status = if folder.is_dir() {
            ValidationStatus::Ok
        } else {
            ValidationStatus::Warning
        };
        checks.push(Validation::new(
            "knowledge",
            status,
            format!(
                "knowledge: {} ({})",
                folder.display(),
                if folder.is_dir() { "exists" } else { "not found" }
            ),
        ));
    }

    checks
}

/// Cross-check the loaded operations against configuration.
#[must_use]
pub fn validate_operations(
    operations: &[Operation],
    config: &Config,
    filter: Option<&[String]>,
) -> Vec<Validation> {
    let mut checks = Vec::new();

    let status = if operations.is_empty() {
        ValidationStatus::Warning
    } else {
        ValidationStatus::Ok
    };
    checks.push(Validation::new(
        "operations",
        status,
        format!("operations: {} selected", operations.len()),
    ));

    for mandatory in &config.mandatory_headers {
        let seen = operations
            .iter()
            .any(|op| op.headers.keys().any(|h| h.eq_ignore_ascii_case(mandatory)));
        if !seen {
            checks.push(Validation::new(
                "mandatory_headers",
                ValidationStatus::Warning,
                format!("mandatory header '{mandatory}' never appears on a request"),
            ));
        }
    }

    for entry in filter.unwrap_or_default() {
        if !operations.iter().any(|op| &op.path == entry) {
            checks.push(Validation::new(
                "filter",
                ValidationStatus::Warning,
                format!("filter entry '{entry}' matches no operation"),
            ));
        }
    }

    checks
}

impl DryRunPlan {
    /// Generate every suite and collect counts.
    #[must_use]
    pub fn build(operations: &[Operation], config: &Config, validations: Vec<Validation>) -> Self {
        let options = config.generation_options();
        let plans: Vec<OperationPlan> = operations
            .iter()
            .map(|op| {
                let suite = build_suite(op, &options);
                OperationPlan {
                    operation: suite.operation.clone(),
                    method: op.method.clone(),
                    path: op.path.clone(),
                    total: u32::try_from(suite.len()).unwrap_or(u32::MAX),
                    counts: suite.counts,
                    parameters: op
                        .parameters
                        .iter()
                        .map(|p| {
                            let loc = match p.location {
                                ParamLocation::Path => "path",
                                ParamLocation::Query => "query",
                                ParamLocation::Header => "header",
                            };
                            format!("{} ({loc})", p.name)
                        })
                        .collect(),
                    body_properties: op
                        .request_body_schema
                        .as_ref()
                        .map(|s| s.properties().iter().map(|(n, _)| n.clone()).collect())
                        .unwrap_or_default(),
                }
            })
            .collect();

        Self {
            total_variants: plans.iter().map(|p| u64::from(p.total)).sum(),
            operations: plans,
            validations,
        }
    }

    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Dry run: {} operations, {} variants planned\n",
            self.operations.len(),
            self.total_variants,
        ));

        for op in &self.operations {
            let c = &op.counts;
            lines.push(format!("{} ({} variants):", op.operation, op.total));
            lines.push(format!(
                "  Generators: {} body, {} boundary, {} header, {} parameter, {} security, {} combinatorial",
                c.body, c.boundary, c.header, c.parameter, c.security, c.combinatorial,
            ));
            let dropped = c.raw_total().saturating_sub(op.total as usize);
            if dropped > 0 {
                lines.push(format!("  Duplicates dropped: {dropped}"));
            }
            if !op.parameters.is_empty() {
                lines.push(format!("  Parameters: {}", op.parameters.join(", ")));
            }
            if !op.body_properties.is_empty() {
                lines.push(format!("  Body properties: {}", op.body_properties.join(", ")));
            }
            lines.push(String::new());
        }

        lines.push("Validation:".into());
        for v in &self.validations {
            lines.push(format!("  [{}] {}", v.status, v.message));
        }

        lines.join("\n")
    }

    /// Returns true if any validation has Error status.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Error)
    }

    /// Returns true if any validation has Warning status.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Warning)
    }
}
