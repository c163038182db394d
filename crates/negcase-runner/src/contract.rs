//! OpenAPI contract loading: operations, base URL, error codes, filter

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use negcase_core::{
    Config, ErrorCodeMapping, Operation, ParamLocation, Parameter, Schema, expected_status_for,
    synthesize,
};

const METHODS: [&str; 7] = ["get", "post", "put", "delete", "patch", "head", "options"];

/// A loaded contract, ready for generation.
#[derive(Debug, Clone)]
pub struct Contract {
    pub base_url: String,
    pub operations: Vec<Operation>,
    /// `errorCd` → `errorMsg` taken from every response example
    pub error_codes: ErrorCodeMapping,
    /// Raw contract text, handed to the validator
    pub source: String,
}

/// Read and parse `config.spec`, then build every operation.
///
/// # Errors
///
/// Returns error if the contract cannot be read or parsed, or no base URL
/// is available
pub fn load_contract(config: &Config) -> Result<Contract, ContractError> {
    let content = std::fs::read_to_string(&config.spec)
        .map_err(|e| ContractError::Io(config.spec.clone(), e.to_string()))?;
    let document = parse_document(&config.spec, &content)?;
    let mut contract = Contract::from_document(&document, config)?;
    contract.source = content;
    Ok(contract)
}

impl Contract {
    /// Build from an already-parsed document.
    ///
    /// # Errors
    ///
    /// Returns error if no base URL is available
    pub fn from_document(document: &Value, config: &Config) -> Result<Self, ContractError> {
        let base_url = pick_base_url(document, config.base_url.as_deref())?;
        Ok(Self {
            operations: collect_operations(document, &base_url, config),
            error_codes: error_code_mapping(document),
            base_url,
            source: String::new(),
        })
    }

    /// Keep only operations whose path appears in `paths`.
    #[must_use]
    pub fn filtered(mut self, paths: &[String]) -> Self {
        self.operations.retain(|op| paths.iter().any(|p| p == &op.path));
        self
    }
}

/// Parse a contract from JSON or YAML.
///
/// Extension first (`.yaml`/`.yml`/`.json`), then content sniffing: a
/// leading `{` means JSON, anything else YAML.
///
/// # Errors
///
/// Returns error if the content is not valid in the detected format
pub fn parse_document(path: &Path, content: &str) -> Result<Value, ContractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let as_json = match ext.as_str() {
        "json" => true,
        "yaml" | "yml" => false,
        _ => content.trim_start().starts_with('{'),
    };

    if as_json {
        serde_json::from_str(content).map_err(|e| ContractError::Parse(format!("Invalid JSON: {e}")))
    } else {
        serde_yml::from_str(content).map_err(|e| ContractError::Parse(format!("Invalid YAML: {e}")))
    }
}

/// The override when given, else `servers[0].url`. Trailing slashes are
/// dropped.
///
/// # Errors
///
/// Returns [`ContractError::NoBaseUrl`] when neither is available
pub fn pick_base_url(document: &Value, override_url: Option<&str>) -> Result<String, ContractError> {
    let candidate = override_url
        .filter(|u| !u.is_empty())
        .or_else(|| document.pointer("/servers/0/url").and_then(Value::as_str))
        .map(|u| u.trim_end_matches('/'))
        .filter(|u| !u.is_empty());

    candidate.map(str::to_string).ok_or(ContractError::NoBaseUrl)
}

/// Strip `*` and backticks left over from documentation markup.
#[must_use]
pub fn clean_path(path: &str) -> String {
    path.chars()
        .filter(|c| !matches!(c, '*' | '`'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn collect_operations(document: &Value, base_url: &str, config: &Config) -> Vec<Operation> {
    let components = document
        .pointer("/components/schemas")
        .cloned()
        .unwrap_or_else(|| json!({}));
    let global_security = has_security(document.get("security"));

    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut operations = Vec::new();
    for (raw_path, path_item) in paths {
        let Some(methods) = path_item.as_object() else {
            continue;
        };
        let path = clean_path(raw_path);

        for (method, details) in methods {
            if !METHODS.contains(&method.to_ascii_lowercase().as_str()) {
                continue;
            }
            let secured = details
                .get("security")
                .map_or(global_security, |s| has_security(Some(s)));
            operations.push(build_operation(
                method,
                &path,
                base_url,
                path_item,
                details,
                &components,
                secured,
                config,
            ));
        }
    }

    operations
}

#[allow(clippy::too_many_arguments)]
fn build_operation(
    method: &str,
    path: &str,
    base_url: &str,
    path_item: &Value,
    details: &Value,
    components: &Value,
    secured: bool,
    config: &Config,
) -> Operation {
    let mut op = Operation::new(method, path, &format!("{base_url}{path}"));
    op.secured = secured;

    // path-level parameters first, then operation-level
    for source in [path_item.get("parameters"), details.get("parameters")]
        .into_iter()
        .flatten()
    {
        for raw in source.as_array().into_iter().flatten() {
            if let Some(param) = parse_parameter(raw, components) {
                op.parameters.push(param);
            }
        }
    }

    for param in &op.parameters {
        match param.location {
            ParamLocation::Header => {
                let value = param
                    .schema
                    .example
                    .as_ref()
                    .map_or_else(|| "string".to_string(), value_to_param_string);
                op.headers.insert(param.name.clone(), value);
            }
            ParamLocation::Query | ParamLocation::Path => {
                let value = config
                    .path_params
                    .get(&param.name)
                    .map(|v| Value::String(v.clone()))
                    .or_else(|| param.schema.example.clone())
                    .unwrap_or_else(|| synthesize(&param.schema));
                op.params.insert(param.name.clone(), value);
            }
        }
    }

    if let Some(body) = details.get("requestBody") {
        op.headers
            .entry("Content-Type".to_string())
            .or_insert_with(|| "application/json".to_string());
        let raw_schema = body
            .pointer("/content/application~1json/schema")
            .cloned()
            .unwrap_or_else(|| json!({}));
        let schema = Schema::resolve(&raw_schema, components);
        op.body = Some(synthesize(&schema));
        op.request_body_schema = Some(schema);
    }

    for (name, value) in &config.headers {
        op.headers.insert(name.clone(), value.clone());
    }

    op.responses = details
        .get("responses")
        .and_then(Value::as_object)
        .map(|r| r.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();
    op.expected_status = expected_status_for(&op.responses);
    op.expected_example = op.expected_status.and_then(|status| {
        let code = status.to_string();
        op.responses
            .iter()
            .find(|(k, _)| *k == code)
            .and_then(|(_, response)| response.pointer("/content/application~1json"))
            .and_then(first_example_from_media)
    });

    op
}

fn parse_parameter(raw: &Value, components: &Value) -> Option<Parameter> {
    let name = raw.get("name")?.as_str()?.to_string();
    let location = match raw.get("in")?.as_str()? {
        "path" => ParamLocation::Path,
        "query" => ParamLocation::Query,
        "header" => ParamLocation::Header,
        _ => return None,
    };
    let schema = raw
        .get("schema")
        .cloned()
        .unwrap_or_else(|| json!({"type": "string"}));
    let required = raw.get("required").and_then(Value::as_bool).unwrap_or(false);

    Some(Parameter {
        name,
        location,
        required,
        schema: Schema::resolve(&schema, components),
    })
}

fn has_security(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_array)
        .is_some_and(|reqs| !reqs.is_empty())
}

/// Media `example`, then the first `examples.*.value`, then the schema's
/// `example`.
fn first_example_from_media(media: &Value) -> Option<Value> {
    if let Some(example) = media.get("example") {
        return Some(example.clone());
    }
    let from_examples = media
        .get("examples")
        .and_then(Value::as_object)
        .and_then(|examples| examples.values().find_map(|e| e.get("value")));
    if let Some(value) = from_examples {
        return Some(value.clone());
    }
    media.pointer("/schema/example").cloned()
}

/// Collect `errorCd` → `errorMsg` pairs from every JSON response example
/// in the contract. Later declarations win.
#[must_use]
pub fn error_code_mapping(document: &Value) -> ErrorCodeMapping {
    let mut mapping = BTreeMap::new();

    let responses = document
        .get("paths")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|paths| paths.values())
        .filter_map(Value::as_object)
        .flat_map(|methods| methods.values())
        .filter_map(|details| details.get("responses").and_then(Value::as_object))
        .flat_map(|responses| responses.values());

    for response in responses {
        let Some(media) = response.pointer("/content/application~1json") else {
            continue;
        };
        let direct = media.get("example").into_iter();
        let named = media
            .get("examples")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|examples| examples.values())
            .filter_map(|e| e.get("value"));

        for example in direct.chain(named) {
            let code = example.get("errorCd").and_then(Value::as_str);
            let message = example.get("errorMsg").and_then(Value::as_str);
            if let (Some(code), Some(message)) = (code, message) {
                if !code.is_empty() && !message.is_empty() {
                    mapping.insert(code.to_string(), message.to_string());
                }
            }
        }
    }

    mapping
}

/// Read a filter file: a JSON array of operation paths.
///
/// # Errors
///
/// Returns error if the file cannot be read or is not a string array
pub fn load_filter(path: &Path) -> Result<Vec<String>, ContractError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ContractError::Io(path.to_path_buf(), e.to_string()))?;
    serde_json::from_str(&content)
        .map_err(|e| ContractError::Parse(format!("Invalid filter file {}: {e}", path.display())))
}

pub(crate) fn value_to_param_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("No base URL found in contract servers or configuration")]
    NoBaseUrl,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> Value {
        json!({
            "openapi": "3.0.0",
            "servers": [{"url": "http://localhost:8080/"}],
            "components": {"schemas": {
                "User": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": {"type": "string", "example": "ann"},
                        "age": {"type": "integer"}
                    }
                }
            }},
            "paths": {
                "/users/{id}`": {
                    "parameters": [
                        {"name": "id", "in": "path", "required": true, "schema": {"type": "integer"}}
                    ],
                    "get": {
                        "security": [{"token": []}],
                        "parameters": [
                            {"name": "x-tenant", "in": "header", "schema": {"type": "string", "example": "t1"}},
                            {"name": "verbose", "in": "query", "schema": {"type": "boolean", "example": true}}
                        ],
                        "responses": {
                            "404": {"content": {"application/json": {
                                "example": {"errorCd": "E404", "errorMsg": "User not found"}
                            }}},
                            "200": {"content": {"application/json": {
                                "examples": {"one": {"value": {"name": "ann"}}}
                            }}}
                        }
                    },
                    "summary": "not an operation"
                },
                "/users": {
                    "post": {
                        "requestBody": {"content": {"application/json": {
                            "schema": {"$ref": "#/components/schemas/User"}
                        }}},
                        "responses": {
                            "400": {"content": {"application/json": {
                                "examples": {
                                    "bad": {"value": {"errorCd": "E001", "errorMsg": "Name is required"}}
                                }
                            }}},
                            "201": {"description": "created"}
                        }
                    }
                }
            }
        })
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.headers.insert("x-session-token".into(), "Bearer abc".into());
        config.path_params.insert("id".into(), "42".into());
        config
    }

    #[test]
    fn collects_operations_in_document_order() {
        let contract = Contract::from_document(&document(), &config()).unwrap();
        assert_eq!(contract.base_url, "http://localhost:8080");
        let labels: Vec<String> = contract.operations.iter().map(Operation::label).collect();
        assert_eq!(labels, ["GET /users/{id}", "POST /users"]);
    }

    #[test]
    fn lookup_operation_baseline() {
        let contract = Contract::from_document(&document(), &config()).unwrap();
        let op = &contract.operations[0];

        assert_eq!(op.url, "http://localhost:8080/users/{id}");
        assert!(op.secured);
        assert_eq!(op.parameters.len(), 3);
        assert_eq!(op.params.get("id"), Some(&json!("42")));
        assert_eq!(op.params.get("verbose"), Some(&json!(true)));
        assert_eq!(op.headers.get("x-tenant").map(String::as_str), Some("t1"));
        assert_eq!(
            op.headers.get("x-session-token").map(String::as_str),
            Some("Bearer abc")
        );
        assert!(!op.headers.contains_key("Content-Type"));
        assert_eq!(op.expected_status, Some(200));
        assert_eq!(op.expected_example, Some(json!({"name": "ann"})));
    }

    #[test]
    fn body_operation_baseline() {
        let contract = Contract::from_document(&document(), &config()).unwrap();
        let op = &contract.operations[1];

        assert!(!op.secured);
        assert_eq!(
            op.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(op.body, Some(json!({"name": "ann", "age": 0})));
        assert!(op.request_body_schema.is_some());
        assert_eq!(op.expected_status, Some(201));
        assert_eq!(op.expected_example, None);
    }

    #[test]
    fn error_codes_from_direct_and_named_examples() {
        let mapping = error_code_mapping(&document());
        assert_eq!(mapping.get("E404").map(String::as_str), Some("User not found"));
        assert_eq!(mapping.get("E001").map(String::as_str), Some("Name is required"));
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn base_url_override_and_missing() {
        let doc = document();
        assert_eq!(
            pick_base_url(&doc, Some("https://staging.example/")).unwrap(),
            "https://staging.example"
        );
        assert!(matches!(
            pick_base_url(&json!({"paths": {}}), None),
            Err(ContractError::NoBaseUrl)
        ));
        assert!(matches!(
            Contract::from_document(&json!({"paths": {}}), &Config::default()),
            Err(ContractError::NoBaseUrl)
        ));
    }

    #[test]
    fn clean_path_strips_markup() {
        assert_eq!(clean_path(" **/users/{id}`** "), "/users/{id}");
        assert_eq!(clean_path(""), "");
    }

    #[test]
    fn parse_by_extension_and_sniffing() {
        let yaml = "openapi: 3.0.0\npaths: {}\n";
        let doc = parse_document(Path::new("api.yaml"), yaml).unwrap();
        assert_eq!(doc["openapi"], "3.0.0");

        let sniffed = parse_document(Path::new("api.spec"), r#"{"openapi":"3.1.0"}"#).unwrap();
        assert_eq!(sniffed["openapi"], "3.1.0");

        let err = parse_document(Path::new("api.json"), "openapi: 3").unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn filter_keeps_listed_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paths.json");
        std::fs::write(&path, r#"["/users"]"#).unwrap();

        let filter = load_filter(&path).unwrap();
        let contract = Contract::from_document(&document(), &config())
            .unwrap()
            .filtered(&filter);
        assert_eq!(contract.operations.len(), 1);
        assert_eq!(contract.operations[0].path, "/users");

        assert!(load_filter(&dir.path().join("missing.json")).is_err());
    }
}
