//! `.http` reproduction file for failed rows

use std::collections::BTreeMap;

use crate::report::{ReportRow, TestStatus};

/// Render every failed row as a request block.
#[must_use]
pub fn to_http_file(rows: &[ReportRow]) -> String {
    let failed: Vec<&ReportRow> = rows
        .iter()
        .filter(|r| r.test_status == TestStatus::Fail)
        .collect();

    let mut lines = Vec::new();
    lines.push(format!(
        "# Auto-generated reproduction cases ({} failures)",
        failed.len()
    ));
    lines.push(String::new());

    for (idx, row) in failed.iter().enumerate() {
        let expected = row
            .expected_status
            .map_or_else(|| "-".to_string(), |s| s.to_string());
        lines.push(format!(
            "### [{idx}] {} (expected {expected}, got {})",
            row.description, row.actual_status
        ));
        lines.push(format!("{} {}", row.method, row.url));

        let headers: BTreeMap<String, String> =
            serde_json::from_str(&row.request_headers).unwrap_or_default();
        for (key, value) in &headers {
            if !matches!(key.to_lowercase().as_str(), "host" | "content-length") {
                lines.push(format!("{key}: {value}"));
            }
        }

        // GET bodies went out as query parameters, already in the URL.
        let is_get = row.method.eq_ignore_ascii_case("GET");
        if !is_get && !row.request_body.is_empty() {
            if !headers.keys().any(|k| k.eq_ignore_ascii_case("content-type")) {
                lines.push("Content-Type: application/json".to_string());
            }
            lines.push(String::new());
            lines.push(row.request_body.clone());
        }

        lines.push(String::new());
    }

    lines.join("\n")
}
