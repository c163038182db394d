//! Report files: CSV rows plus a `.http` reproduction file for failures

use std::path::{Path, PathBuf};

use negcase_core::{ReportRow, TestStatus, to_http_file};

/// Write `rows` as CSV. No rows means an empty file, without a header.
///
/// # Errors
///
/// Returns error if the file cannot be created or written
pub fn write_csv(path: &Path, rows: &[ReportRow]) -> Result<(), ReportError> {
    if rows.is_empty() {
        return std::fs::write(path, "").map_err(|e| ReportError::Io(path.to_path_buf(), e.to_string()));
    }

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .map_err(|e| ReportError::Io(path.to_path_buf(), e.to_string()))
}

/// Write the CSV report and, when any row failed, a `.http` file next to it.
///
/// Returns the path of the `.http` file if one was written.
///
/// # Errors
///
/// Returns error if either file cannot be written
pub fn write_reports(csv_path: &Path, rows: &[ReportRow]) -> Result<Option<PathBuf>, ReportError> {
    write_csv(csv_path, rows)?;

    if !rows.iter().any(|r| r.test_status == TestStatus::Fail) {
        return Ok(None);
    }
    let http_path = csv_path.with_extension("http");
    std::fs::write(&http_path, to_http_file(rows))
        .map_err(|e| ReportError::Io(http_path.clone(), e.to_string()))?;
    Ok(Some(http_path))
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Cannot write {0}: {1}")]
    Io(PathBuf, String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use negcase_core::LlmVerdict;

    fn row(description: &str, status: TestStatus) -> ReportRow {
        ReportRow {
            description: description.into(),
            endpoint: "/users".into(),
            method: "POST".into(),
            url: "http://localhost/users".into(),
            request_headers: r#"{"Content-Type":"application/json"}"#.into(),
            request_body: r#"{"name":"x"}"#.into(),
            actual_status: 201,
            actual_response_snippet: "{}".into(),
            expected_status: Some(400),
            expected_response_example: "{}".into(),
            test_status: status,
            llm_verdict: LlmVerdict::Unsure,
            llm_notes: "LLM validation disabled".into(),
            elapsed_secs: 0.25,
        }
    }

    #[test]
    fn empty_rows_write_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        assert_eq!(write_reports(&path, &[]).unwrap(), None);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
        assert!(!dir.path().join("report.http").exists());
    }

    #[test]
    fn header_matches_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_csv(&path, &[row("Missing required body field 'id'", TestStatus::Pass)]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(header, negcase_core::report::COLUMNS.join(","));
    }

    #[test]
    fn failures_get_http_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let rows = [row("ok", TestStatus::Pass), row("broken", TestStatus::Fail)];

        let http = write_reports(&path, &rows).unwrap().unwrap();
        assert_eq!(http, dir.path().join("report.http"));
        let text = std::fs::read_to_string(http).unwrap();
        assert!(text.contains("### [0] broken (expected 400, got 201)"));
    }
}
