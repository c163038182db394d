//! Missing/invalid variants for every baseline header

use crate::operation::{Operation, Variant, VariantKind};

pub const INVALID_HEADER_VALUE: &str = "InvalidValue!@#";

/// Two variants per baseline header. `mandatory` is matched case-insensitively
/// and only affects the label: every other header is always retained.
#[must_use]
pub fn header_variants(op: &Operation, mandatory: &[String]) -> Vec<Variant> {
    let mut variants = Vec::with_capacity(op.headers.len() * 2);

    for name in op.headers.keys() {
        let class = if mandatory.iter().any(|m| m.eq_ignore_ascii_case(name)) {
            "mandatory"
        } else {
            "optional"
        };

        let mut without = op.headers.clone();
        without.remove(name);
        variants.push(
            Variant::from_operation(
                op,
                VariantKind::Header,
                format!("Missing {class} header '{name}'"),
            )
            .with_headers(without),
        );

        let mut invalid = op.headers.clone();
        invalid.insert(name.clone(), INVALID_HEADER_VALUE.to_string());
        variants.push(
            Variant::from_operation(
                op,
                VariantKind::Header,
                format!("Invalid {class} header '{name}'"),
            )
            .with_headers(invalid),
        );
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op() -> Operation {
        let mut op = Operation::new("GET", "/items", "http://localhost/items");
        op.headers.insert("Content-Type".into(), "application/json".into());
        op.headers.insert("X-Tenant".into(), "acme".into());
        op
    }

    #[test]
    fn classifies_case_insensitively() {
        let v = header_variants(&op(), &["x-tenant".to_string()]);
        let labels: Vec<_> = v.iter().map(|c| c.description.as_str()).collect();
        assert_eq!(
            labels,
            [
                "Missing optional header 'Content-Type'",
                "Invalid optional header 'Content-Type'",
                "Missing mandatory header 'X-Tenant'",
                "Invalid mandatory header 'X-Tenant'",
            ]
        );
    }

    #[test]
    fn missing_keeps_other_headers() {
        let v = header_variants(&op(), &["X-Tenant".to_string()]);
        let missing = &v[2];
        assert!(!missing.headers.contains_key("X-Tenant"));
        assert_eq!(missing.headers["Content-Type"], "application/json");

        let invalid = &v[3];
        assert_eq!(invalid.headers["X-Tenant"], INVALID_HEADER_VALUE);
        assert_eq!(invalid.headers.len(), 2);
    }

    #[test]
    fn no_headers_no_variants() {
        let bare = Operation::new("GET", "/", "http://localhost/");
        assert!(header_variants(&bare, &[]).is_empty());
    }
}
