//! Post-execution classification
//!
//! Extracts the error text from a response body, decides the final expected
//! status for a variant and compares it with the actual status.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::operation::Variant;
use crate::report::TestStatus;

/// `errorCd` → `errorMsg` pairs collected from the contract's response examples.
pub type ErrorCodeMapping = BTreeMap<String, String>;

/// Error fields found in a response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorText {
    /// `errorMsg`/`message`, or the raw body when it is not JSON
    pub message: String,
    pub code: Option<String>,
}

/// Pull `errorMsg` (or `message`) and `errorCd` out of `body_text`.
///
/// Objects are read directly; for lists the first element is read when it
/// is an object. Unparseable bodies yield the raw text as the message.
#[must_use]
pub fn extract_error_text(body_text: &str) -> ErrorText {
    let Ok(parsed) = serde_json::from_str::<Value>(body_text) else {
        return ErrorText {
            message: body_text.to_string(),
            code: None,
        };
    };

    let carrier = match &parsed {
        Value::Object(_) => Some(&parsed),
        Value::Array(items) => items.first().filter(|v| v.is_object()),
        _ => None,
    };
    let Some(carrier) = carrier else {
        return ErrorText::default();
    };

    ErrorText {
        message: field_text(carrier, "errorMsg")
            .or_else(|| field_text(carrier, "message"))
            .unwrap_or_default(),
        code: field_text(carrier, "errorCd"),
    }
}

fn field_text(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Decides the expected status of a variant once its response is known.
pub trait ExpectationPolicy: Send + Sync {
    fn expected_status(&self, variant: &Variant, error: &ErrorText) -> Option<u16>;
}

/// Expect `400` when the response reads like an error or the variant
/// describes an invalid request. Pinned statuses are never changed.
#[derive(Debug, Clone)]
pub struct KeywordPolicy {
    pub keywords: Vec<String>,
    pub description_markers: Vec<String>,
    pub status: u16,
}

impl Default for KeywordPolicy {
    fn default() -> Self {
        Self {
            keywords: ["failed", "error", "validation error", "missing", "empty", "errorCd"]
                .map(String::from)
                .to_vec(),
            description_markers: ["missing", "blank", "invalid"].map(String::from).to_vec(),
            status: 400,
        }
    }
}

impl KeywordPolicy {
    fn reads_as_error(&self, error: &ErrorText) -> bool {
        let text = error.message.to_lowercase();
        self.keywords
            .iter()
            .any(|kw| text.contains(&kw.to_lowercase()))
    }

    fn describes_invalid(&self, variant: &Variant) -> bool {
        let desc = variant.description.to_lowercase();
        self.description_markers
            .iter()
            .any(|m| desc.contains(&m.to_lowercase()))
    }
}

impl ExpectationPolicy for KeywordPolicy {
    fn expected_status(&self, variant: &Variant, error: &ErrorText) -> Option<u16> {
        if variant.status_pinned {
            return variant.expected_status;
        }
        if self.reads_as_error(error) || self.describes_invalid(variant) {
            return Some(self.status);
        }
        variant.expected_status
    }
}

/// PASS iff `actual` equals `expected`.
#[must_use]
pub fn outcome(actual: i32, expected: Option<u16>) -> TestStatus {
    if expected.is_some_and(|e| i32::from(e) == actual) {
        TestStatus::Pass
    } else {
        TestStatus::Fail
    }
}

/// The error message the service should have produced, for the validator.
///
/// Prefers the contract's message for the returned `errorCd`, then the
/// expected example's `errorMsg`/`message` (or its JSON text), then the
/// variant description.
#[must_use]
pub fn expected_error_text(variant: &Variant, error: &ErrorText, mapping: &ErrorCodeMapping) -> String {
    if let Some(msg) = error.code.as_ref().and_then(|cd| mapping.get(cd)) {
        return msg.clone();
    }

    let from_example = match &variant.expected_example {
        Some(example @ Value::Object(_)) => field_text(example, "errorMsg")
            .or_else(|| field_text(example, "message"))
            .or_else(|| Some(example.to_string())),
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    };

    from_example
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| variant.description.clone())
}

/// Final expected status, error text and outcome of one executed variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub expected_status: Option<u16>,
    pub error: ErrorText,
    pub outcome: TestStatus,
}

/// Classify one response.
#[must_use]
pub fn classify(
    policy: &dyn ExpectationPolicy,
    variant: &Variant,
    actual_status: i32,
    body_text: &str,
) -> Classification {
    let error = extract_error_text(body_text);
    let expected_status = policy.expected_status(variant, &error);
    Classification {
        expected_status,
        outcome: outcome(actual_status, expected_status),
        error,
    }
}
