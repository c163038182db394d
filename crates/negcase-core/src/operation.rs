//! Operation templates and the variants derived from them

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::Schema;

/// One (method, path) pair from the contract with its baseline request.
///
/// Immutable template: generators read it and produce owned [`Variant`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub method: String,
    pub path: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    /// Serialized query/path parameter set (name → value)
    pub params: BTreeMap<String, Value>,
    /// Declared query/path/header parameters
    pub parameters: Vec<Parameter>,
    pub body: Option<Value>,
    pub request_body_schema: Option<Schema>,
    /// Raw response objects keyed by status string, declaration order
    pub responses: Vec<(String, Value)>,
    /// Operation declares a non-empty `security` requirement
    pub secured: bool,
    pub expected_status: Option<u16>,
    pub expected_example: Option<Value>,
}

impl Operation {
    /// Bare operation with no parameters, headers or body.
    #[must_use]
    pub fn new(method: &str, path: &str, url: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            path: path.to_string(),
            url: url.to_string(),
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            parameters: Vec::new(),
            body: None,
            request_body_schema: None,
            responses: Vec::new(),
            secured: false,
            expected_status: None,
            expected_example: None,
        }
    }

    /// `"POST /users"`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Declared parameters at `location`.
    pub fn parameters_in(&self, location: ParamLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub schema: Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
}

/// Which generator produced a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    Baseline,
    MissingField,
    BlankField,
    InvalidType,
    InvalidEnum,
    Boundary,
    Combinatorial,
    Header,
    Parameter,
    Security,
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Baseline => "baseline",
            Self::MissingField => "missing_field",
            Self::BlankField => "blank_field",
            Self::InvalidType => "invalid_type",
            Self::InvalidEnum => "invalid_enum",
            Self::Boundary => "boundary",
            Self::Combinatorial => "combinatorial",
            Self::Header => "header",
            Self::Parameter => "parameter",
            Self::Security => "security",
        };
        f.write_str(s)
    }
}

/// A generated request derived from an [`Operation`].
///
/// Owns all of its data: nothing is shared with the baseline or with other
/// variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub description: String,
    pub kind: VariantKind,
    pub method: String,
    pub path: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, Value>,
    pub body: Option<Value>,
    pub expected_status: Option<u16>,
    /// Expected status fixed by the generator; classification must not
    /// override it.
    pub status_pinned: bool,
    pub expected_example: Option<Value>,
}

impl Variant {
    /// Fresh copy of `op`'s request with the given label.
    #[must_use]
    pub fn from_operation(op: &Operation, kind: VariantKind, description: String) -> Self {
        Self {
            description,
            kind,
            method: op.method.clone(),
            path: op.path.clone(),
            url: op.url.clone(),
            headers: op.headers.clone(),
            params: op.params.clone(),
            body: op.body.clone(),
            expected_status: op.expected_status,
            status_pinned: false,
            expected_example: op.expected_example.clone(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: BTreeMap<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Pin the expected status so later classification leaves it alone.
    #[must_use]
    pub fn pinned_status(mut self, status: u16) -> Self {
        self.expected_status = Some(status);
        self.status_pinned = true;
        self
    }
}

/// Pick the operation's baseline expected status from its declared responses.
///
/// Priority: 200, 201, 204, any other 2xx (declaration order), then 400,
/// 401, 404, then the first declared status.
#[must_use]
pub fn expected_status_for(responses: &[(String, Value)]) -> Option<u16> {
    let declared = |code: &str| responses.iter().any(|(k, _)| k == code);

    ["200", "201", "204"]
        .into_iter()
        .find(|code| declared(*code))
        .or_else(|| {
            responses
                .iter()
                .map(|(k, _)| k.as_str())
                .find(|k| k.len() == 3 && k.starts_with('2'))
        })
        .or_else(|| ["400", "401", "404"].into_iter().find(|code| declared(*code)))
        .or_else(|| responses.first().map(|(k, _)| k.as_str()))
        .and_then(|code| code.parse().ok())
}
