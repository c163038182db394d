//! Advisory response validation through a chat-completions model
//!
//! The verdict is recorded next to the status oracle and never changes the
//! PASS/FAIL outcome. Every failure degrades to `UNSURE`.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{Value, json};

use negcase_core::{LlmConfig, LlmVerdict};

/// Response bytes included in the prompt.
const PROMPT_RESPONSE_BYTES: usize = 4000;

/// Contract bytes included in the prompt.
const PROMPT_CONTRACT_BYTES: usize = 8000;

/// Everything the validator sees about one exchange.
#[derive(Debug, Clone, Copy)]
pub struct Judgement<'a> {
    pub method: &'a str,
    pub url: &'a str,
    pub headers: &'a BTreeMap<String, String>,
    pub body: Option<&'a Value>,
    pub status: i32,
    pub response: &'a str,
    pub expected_error: &'a str,
    pub context: &'a [String],
    /// Raw contract document; empty when it was built in memory
    pub contract_text: &'a str,
}

pub trait Validator: Send + Sync {
    fn judge(&self, judgement: &Judgement<'_>) -> (LlmVerdict, String);
}

/// Used when validation is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledValidator;

impl Validator for DisabledValidator {
    fn judge(&self, _judgement: &Judgement<'_>) -> (LlmVerdict, String) {
        (LlmVerdict::Unsure, "LLM validation disabled".to_string())
    }
}

/// OpenAI-compatible chat-completions client.
pub struct ChatValidator {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl ChatValidator {
    #[must_use]
    pub fn new(client: reqwest::blocking::Client, config: &LlmConfig, api_key: String) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        }
    }

    fn complete(&self, prompt: &str) -> Result<String, String> {
        let request = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| e.to_string())?;

        let status = response.status();
        let payload: Value = response.json().map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(format!("endpoint returned {status}"));
        }

        payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| "response carries no message content".to_string())
    }
}

impl Validator for ChatValidator {
    fn judge(&self, judgement: &Judgement<'_>) -> (LlmVerdict, String) {
        match self.complete(&prompt(judgement)) {
            Ok(raw) => parse_reply(&raw),
            Err(e) => {
                tracing::warn!(error = %e, "validator request failed");
                (LlmVerdict::Unsure, format!("LLM error: {e}"))
            }
        }
    }
}

/// Pick the validator described by `config`.
///
/// Falls back to [`DisabledValidator`] when validation is enabled but the
/// API key variable is unset or the client cannot be built.
#[must_use]
pub fn from_config(config: &LlmConfig, timeout: Duration) -> Box<dyn Validator> {
    if !config.enabled {
        return Box::new(DisabledValidator);
    }
    let api_key = match std::env::var(&config.api_key_env) {
        Ok(key) if !key.is_empty() => key,
        _ => {
            tracing::warn!(var = %config.api_key_env, "LLM API key not set; validation disabled");
            return Box::new(DisabledValidator);
        }
    };
    match reqwest::blocking::Client::builder().timeout(timeout).build() {
        Ok(client) => Box::new(ChatValidator::new(client, config, api_key)),
        Err(e) => {
            tracing::warn!(error = %e, "cannot build LLM client; validation disabled");
            Box::new(DisabledValidator)
        }
    }
}

pub(crate) fn prompt(j: &Judgement<'_>) -> String {
    let headers = serde_json::to_string(j.headers).unwrap_or_default();
    let body = j.body.map_or_else(|| "null".to_string(), Value::to_string);
    let response = negcase_core::report::truncate_snippet(j.response, PROMPT_RESPONSE_BYTES);
    let context = if j.context.is_empty() {
        String::new()
    } else {
        format!("\n\nKnowledge Base Context:\n{}", j.context.join("\n---\n"))
    };
    let contract = if j.contract_text.is_empty() {
        String::new()
    } else {
        let text = negcase_core::report::truncate_snippet(j.contract_text, PROMPT_CONTRACT_BYTES);
        format!("\n\nAPI Contract:\n{text}")
    };

    format!(
        "You are an API testing assistant. Using the observed API response, the expected \
error message, and related domain knowledge, decide if the response is logically correct.

Request:
- Method: {method}
- URL: {url}
- Headers: {headers}
- Body: {body}

Observed Response:
- Status: {status}
- Body: {response}

Expected error message or validation rule:
{expected}
{context}{contract}

Instructions:
1) If the status and response body conform to the contract and domain knowledge, answer PASS.
2) If they are inconsistent or erroneous given domain knowledge, answer FAIL.
3) Otherwise answer UNSURE.
Provide a short rationale.

Return JSON: {{\"verdict\": \"PASS|FAIL|UNSURE\", \"notes\": \"explanation\"}}",
        method = j.method,
        url = j.url,
        status = j.status,
        expected = j.expected_error,
    )
}

/// Extract the verdict from the first `{` to the last `}` of a reply.
pub(crate) fn parse_reply(raw: &str) -> (LlmVerdict, String) {
    let block = raw
        .find('{')
        .zip(raw.rfind('}'))
        .filter(|(start, end)| start < end)
        .map(|(start, end)| &raw[start..=end]);

    let Some(data) = block.and_then(|b| serde_json::from_str::<Value>(b).ok()) else {
        return (LlmVerdict::Unsure, "Unparsed LLM output.".to_string());
    };

    let verdict = data
        .get("verdict")
        .and_then(Value::as_str)
        .and_then(LlmVerdict::parse)
        .unwrap_or(LlmVerdict::Unsure);
    let notes = match data.get("notes") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    (verdict, notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn judgement<'a>(headers: &'a BTreeMap<String, String>, context: &'a [String]) -> Judgement<'a> {
        Judgement {
            method: "POST",
            url: "http://localhost/users",
            headers,
            body: None,
            status: 400,
            response: r#"{"errorMsg":"name missing"}"#,
            expected_error: "Name is required",
            context,
            contract_text: "",
        }
    }

    #[test]
    fn disabled_is_unsure() {
        let headers = BTreeMap::new();
        let (verdict, notes) = DisabledValidator.judge(&judgement(&headers, &[]));
        assert_eq!(verdict, LlmVerdict::Unsure);
        assert_eq!(notes, "LLM validation disabled");
    }

    #[test]
    fn reply_parsing() {
        assert_eq!(
            parse_reply("Sure.\n{\"verdict\": \"fail\", \"notes\": \"wrong code\"} done"),
            (LlmVerdict::Fail, "wrong code".to_string())
        );
        assert_eq!(
            parse_reply(r#"{"verdict": "MAYBE", "notes": "hmm"}"#),
            (LlmVerdict::Unsure, "hmm".to_string())
        );
        assert_eq!(parse_reply("no json here").0, LlmVerdict::Unsure);
        assert_eq!(parse_reply("} backwards {").1, "Unparsed LLM output.");
    }

    #[test]
    fn prompt_carries_request_and_context() {
        let mut headers = BTreeMap::new();
        headers.insert("x-session-token".to_string(), "abc".to_string());
        let context = vec!["Names are mandatory.".to_string()];
        let text = prompt(&judgement(&headers, &context));

        assert!(text.contains("- Method: POST"));
        assert!(text.contains("- Body: null"));
        assert!(text.contains(r#"{"x-session-token":"abc"}"#));
        assert!(text.contains("Knowledge Base Context:\nNames are mandatory."));
        assert!(text.contains("Name is required"));
        assert!(!text.contains("API Contract:"));
    }

    #[test]
    fn prompt_carries_contract_text() {
        let headers = BTreeMap::new();
        let contract = format!("openapi: 3.0.0\npaths: {{}}\n{}", "#".repeat(20_000));
        let j = Judgement {
            contract_text: &contract,
            ..judgement(&headers, &[])
        };
        let text = prompt(&j);

        assert!(text.contains("API Contract:\nopenapi: 3.0.0\npaths: {}"));
        assert!(text.len() < contract.len());
    }

    #[test]
    fn disabled_config_yields_disabled_validator() {
        let config = LlmConfig::default();
        let validator = from_config(&config, Duration::from_secs(1));
        let headers = BTreeMap::new();
        assert_eq!(validator.judge(&judgement(&headers, &[])).0, LlmVerdict::Unsure);
    }
}
