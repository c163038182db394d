//! HTTP transport
//!
//! [`Transport::execute`] never fails: a request that cannot be completed
//! comes back as status `-1` with a `REQUEST_ERROR:` body, and the variant
//! is classified like any other response.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

use negcase_core::Variant;

use crate::contract::value_to_param_string;
use crate::runner::RunError;

/// Status reported when no response was received.
pub const TRANSPORT_FAILURE: i32 = -1;

/// A fully resolved request: path template substituted, query split out.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    /// URL with path parameters substituted, without the query string
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    /// JSON body; never set for GET
    pub body: Option<Value>,
}

/// Status and raw body text of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub status: i32,
    pub body: String,
}

impl Exchange {
    #[must_use]
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            status: TRANSPORT_FAILURE,
            body: format!("REQUEST_ERROR: {reason}"),
        }
    }
}

impl HttpRequest {
    /// Resolve a variant into a request.
    ///
    /// Parameters named by a `{name}` placeholder in the URL are
    /// substituted; the rest become query parameters. `null` parameters
    /// are omitted. GET requests send an object body as query parameters.
    #[must_use]
    pub fn from_variant(variant: &Variant) -> Self {
        let mut url = variant.url.clone();
        let mut query = Vec::new();

        for (name, value) in &variant.params {
            if value.is_null() {
                continue;
            }
            let placeholder = format!("{{{name}}}");
            if url.contains(&placeholder) {
                url = url.replace(&placeholder, &value_to_param_string(value));
            } else {
                query.push((name.clone(), value_to_param_string(value)));
            }
        }

        let is_get = variant.method.eq_ignore_ascii_case("GET");
        let body = match &variant.body {
            Some(Value::Object(fields)) if is_get => {
                query.extend(
                    fields
                        .iter()
                        .filter(|(_, v)| !v.is_null())
                        .map(|(k, v)| (k.clone(), value_to_param_string(v))),
                );
                None
            }
            Some(_) if is_get => None,
            other => other.clone(),
        };

        Self {
            method: variant.method.clone(),
            url,
            query,
            headers: variant.headers.clone(),
            body,
        }
    }

    /// URL including the encoded query string.
    #[must_use]
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        reqwest::Url::parse_with_params(&self.url, &self.query)
            .map_or_else(|_| self.url.clone(), String::from)
    }
}

/// Sends one request and reports what came back.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Exchange;
}

/// Blocking `reqwest` transport.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(timeout: Duration, verify_tls: bool) -> Result<Self, RunError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|e| RunError::Http(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &HttpRequest) -> Exchange {
        let method = match reqwest::Method::from_bytes(request.method.as_bytes()) {
            Ok(m) => m,
            Err(_) => return Exchange::failed(format!("invalid HTTP method '{}'", request.method)),
        };

        let mut req = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            // values like "\r\n" cannot be sent at all
            if reqwest::header::HeaderValue::from_str(value).is_ok() {
                req = req.header(name, value);
            }
        }
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        match req.send() {
            Ok(resp) => {
                let status = i32::from(resp.status().as_u16());
                Exchange {
                    status,
                    body: resp.text().unwrap_or_default(),
                }
            }
            Err(e) => Exchange::failed(e),
        }
    }
}
