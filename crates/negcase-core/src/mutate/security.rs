//! Negative authentication battery

use crate::operation::{Operation, ParamLocation, Variant, VariantKind};

/// Rejected token values paired with their label template. `{h}` is
/// replaced by the auth header name.
const BATTERY: &[(&str, &str)] = &[
    ("", "Invalid {h} header value ''"),
    ("Bearer invalidtoken", "Invalid {h} header value 'Bearer invalidtoken'"),
    ("invalid", "Invalid {h} header value 'invalid'"),
    ("Bearer expired.token.value", "Expired token in {h} header"),
    ("thisisnotvalidtoken", "Malformed token without Bearer prefix"),
    ("Basic dXNlcjpwYXNzd29yZA==", "Wrong token scheme (Basic instead of Bearer)"),
    ("Bearer <script>alert('xss')</script>", "Injection attempt in {h} token"),
    ("Bearer    ", "{h} token with whitespace only"),
    ("Bearer !@#$%^&*()_+", "{h} token with special characters"),
    ("Bearer ' OR '1'='1", "{h} token with SQL injection attempt"),
    ("", "Empty {h} header value"),
];

/// Whether `op` requires authentication through `auth_header` or a
/// declared security requirement.
#[must_use]
pub fn requires_auth(op: &Operation, auth_header: &str) -> bool {
    op.secured
        || op
            .parameters_in(ParamLocation::Header)
            .any(|p| p.name.eq_ignore_ascii_case(auth_header))
}

/// Every variant is pinned to a status the baseline cannot expect: `401`,
/// or `403` when the baseline itself expects `401`.
#[must_use]
pub fn security_variants(op: &Operation, auth_header: &str) -> Vec<Variant> {
    if !requires_auth(op, auth_header) {
        return Vec::new();
    }

    let rejected = if op.expected_status == Some(401) { 403 } else { 401 };

    // reuse the baseline's spelling of the header when present
    let present = op
        .headers
        .keys()
        .find(|k| k.eq_ignore_ascii_case(auth_header))
        .cloned();
    let header = present.clone().unwrap_or_else(|| auth_header.to_string());

    let mut variants = Vec::with_capacity(BATTERY.len() + 1);

    if let Some(key) = present {
        let mut headers = op.headers.clone();
        headers.remove(&key);
        variants.push(
            Variant::from_operation(op, VariantKind::Security, format!("Missing {key} header"))
                .with_headers(headers)
                .pinned_status(rejected),
        );
    }

    for (value, label) in BATTERY {
        let mut headers = op.headers.clone();
        headers.insert(header.clone(), (*value).to_string());
        variants.push(
            Variant::from_operation(op, VariantKind::Security, label.replace("{h}", &header))
                .with_headers(headers)
                .pinned_status(rejected),
        );
    }

    variants
}
