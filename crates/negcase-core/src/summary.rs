//! Run summary: outcome counts, status distribution and pattern warnings
//!
//! Computed from report rows after a run. A run where nearly every response
//! is 401/403, 404 or a transport error usually means the configuration is
//! wrong rather than the service, so those patterns are called out.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::report::{ReportRow, TestStatus};

/// Per-operation outcome counts.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OperationSummary {
    /// Operation label, e.g. "POST /api/users"
    pub operation: String,
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    /// Actual status → count (`-1` = transport error)
    pub status_distribution: BTreeMap<i32, u64>,
}

/// Kind of issue detected from status code patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PatternWarningKind {
    /// All (or nearly all) responses are 401/403
    AuthenticationIssue,
    /// All (or nearly all) responses are 404
    EndpointNotFound,
    /// All (or nearly all) requests failed to reach the service
    Unreachable,
}

impl std::fmt::Display for PatternWarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationIssue => write!(f, "authentication may be invalid"),
            Self::EndpointNotFound => {
                write!(f, "endpoint not found, check base_url or contract paths")
            }
            Self::Unreachable => write!(f, "service unreachable"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PatternWarning {
    pub operation: String,
    pub kind: PatternWarningKind,
    pub message: String,
}

/// Summary of a complete run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunSummary {
    pub operations: Vec<OperationSummary>,
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub warnings: Vec<PatternWarning>,
}

impl RunSummary {
    /// Aggregate `rows`, grouping by `METHOD endpoint`.
    #[must_use]
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        let mut groups: BTreeMap<String, OperationSummary> = BTreeMap::new();
        for row in rows {
            let label = format!("{} {}", row.method, row.endpoint);
            let entry = groups.entry(label.clone()).or_insert_with(|| OperationSummary {
                operation: label,
                total: 0,
                passed: 0,
                failed: 0,
                status_distribution: BTreeMap::new(),
            });
            entry.total += 1;
            match row.test_status {
                TestStatus::Pass => entry.passed += 1,
                TestStatus::Fail => entry.failed += 1,
            }
            *entry.status_distribution.entry(row.actual_status).or_default() += 1;
        }

        let operations: Vec<OperationSummary> = groups.into_values().collect();
        let warnings = operations
            .iter()
            .filter_map(|op| {
                detect_pattern(op).map(|kind| PatternWarning {
                    operation: op.operation.clone(),
                    kind,
                    message: format!(
                        "{}: {} ({})",
                        op.operation,
                        kind,
                        format_distribution(&op.status_distribution)
                    ),
                })
            })
            .collect();

        Self {
            total: operations.iter().map(|o| o.total).sum(),
            passed: operations.iter().map(|o| o.passed).sum(),
            failed: operations.iter().map(|o| o.failed).sum(),
            operations,
            warnings,
        }
    }

    /// 0 when every row passed, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.failed > 0 {
            TestStatus::Fail.exit_code()
        } else {
            TestStatus::Pass.exit_code()
        }
    }

    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();
        for op in &self.operations {
            lines.push(format!(
                "{}: {} passed, {} failed [{}]",
                op.operation,
                op.passed,
                op.failed,
                format_distribution(&op.status_distribution)
            ));
        }
        for w in &self.warnings {
            lines.push(format!("WARNING {}", w.message));
        }
        let verdict = if self.failed == 0 { "PASS" } else { "FAIL" };
        lines.push(format!(
            "{verdict}: {} variants, {} passed, {} failed",
            self.total, self.passed, self.failed
        ));
        lines.join("\n")
    }
}

/// Returns `Some(kind)` if at least 90% of responses share a recognizable pattern.
fn detect_pattern(op: &OperationSummary) -> Option<PatternWarningKind> {
    if op.total == 0 {
        return None;
    }
    let threshold = (op.total as f64 * 0.9).ceil() as u64;
    let count = |pred: fn(i32) -> bool| -> u64 {
        op.status_distribution
            .iter()
            .filter(|&(&code, _)| pred(code))
            .map(|(_, &c)| c)
            .sum()
    };

    if count(|c| c < 0) >= threshold {
        Some(PatternWarningKind::Unreachable)
    } else if count(|c| c == 401 || c == 403) >= threshold {
        Some(PatternWarningKind::AuthenticationIssue)
    } else if count(|c| c == 404) >= threshold {
        Some(PatternWarningKind::EndpointNotFound)
    } else {
        None
    }
}

/// Compact distribution: "200x50, 401x10, 500x2"
#[must_use]
pub fn format_distribution(dist: &BTreeMap<i32, u64>) -> String {
    dist.iter()
        .map(|(code, count)| format!("{code}x{count}"))
        .collect::<Vec<_>>()
        .join(", ")
}
