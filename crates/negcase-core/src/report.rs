//! Report row and outcome types
//!
//! One [`ReportRow`] per executed variant. Field names serialize to the
//! column headers of the CSV report.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum response snippet kept in a row, in bytes.
pub const MAX_SNIPPET_BYTES: usize = 4096;

/// Oracle outcome: actual status equals expected status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Pass,
    Fail,
}

impl TestStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }

    /// Process exit code contribution (0 pass, 1 fail).
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Pass => 0,
            Self::Fail => 1,
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validator opinion on a response. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LlmVerdict {
    Pass,
    Fail,
    Unsure,
}

impl LlmVerdict {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Unsure => "UNSURE",
        }
    }

    /// Parse a verdict word, case-insensitively. Anything else is `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PASS" => Some(Self::Pass),
            "FAIL" => Some(Self::Fail),
            "UNSURE" => Some(Self::Unsure),
            _ => None,
        }
    }
}

impl std::fmt::Display for LlmVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executed variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ReportRow {
    pub description: String,
    pub endpoint: String,
    pub method: String,
    #[serde(rename = "URL")]
    pub url: String,
    /// JSON object text
    pub request_headers: String,
    /// JSON text, empty when the variant has no body
    pub request_body: String,
    /// `-1` on transport failure
    pub actual_status: i32,
    pub actual_response_snippet: String,
    pub expected_status: Option<u16>,
    pub expected_response_example: String,
    pub test_status: TestStatus,
    #[serde(rename = "LLMVerdict")]
    pub llm_verdict: LlmVerdict,
    #[serde(rename = "LLMNotes")]
    pub llm_notes: String,
    pub elapsed_secs: f64,
}

/// Column headers in report order.
pub const COLUMNS: [&str; 14] = [
    "Description",
    "Endpoint",
    "Method",
    "URL",
    "RequestHeaders",
    "RequestBody",
    "ActualStatus",
    "ActualResponseSnippet",
    "ExpectedStatus",
    "ExpectedResponseExample",
    "TestStatus",
    "LLMVerdict",
    "LLMNotes",
    "ElapsedSecs",
];

/// Truncate `text` to at most `max` bytes without splitting a character.
#[must_use]
pub fn truncate_snippet(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// JSON Schema of [`ReportRow`], pretty-printed.
///
/// # Errors
///
/// Returns error if the schema cannot be serialized
pub fn generate_schema() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&schemars::schema_for!(ReportRow))
}
