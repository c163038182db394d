//! Per-operation orchestration: run every generator and merge their streams

use std::borrow::Cow;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dedup::merge_all;
use crate::mutate;
use crate::operation::{Operation, Variant};
use crate::path::FieldPath;
use crate::synth::synthesize;

pub const DEFAULT_MAX_COMBINATION: usize = 2;
pub const DEFAULT_AUTH_HEADER: &str = "x-session-token";

/// Generation knobs. Passed explicitly; nothing is read from globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub max_combination: usize,
    pub mandatory_headers: Vec<String>,
    pub auth_header: String,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_combination: DEFAULT_MAX_COMBINATION,
            mandatory_headers: Vec::new(),
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
        }
    }
}

/// Raw (pre-dedup) variant count per generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratorCounts {
    pub body: usize,
    pub boundary: usize,
    pub header: usize,
    pub parameter: usize,
    pub security: usize,
    pub combinatorial: usize,
}

impl GeneratorCounts {
    #[must_use]
    pub fn raw_total(&self) -> usize {
        self.body + self.boundary + self.header + self.parameter + self.security + self.combinatorial
    }
}

/// Deduplicated variants for one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suite {
    pub operation: String,
    pub variants: Vec<Variant>,
    pub counts: GeneratorCounts,
}

impl Suite {
    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Variants removed as duplicates.
    #[must_use]
    pub fn duplicates(&self) -> usize {
        self.counts.raw_total().saturating_sub(self.len())
    }
}

/// Build the suite for `op`.
///
/// A missing baseline body is synthesized from the request body schema.
/// Streams merge in a fixed order: recursive body, boundary, header,
/// parameter, security, combinatorial.
#[must_use]
pub fn build_suite(op: &Operation, options: &GenerationOptions) -> Suite {
    let op: Cow<'_, Operation> = match (&op.body, &op.request_body_schema) {
        (None, Some(schema)) => {
            let mut filled = op.clone();
            filled.body = Some(synthesize(schema));
            Cow::Owned(filled)
        }
        _ => Cow::Borrowed(op),
    };

    let (body, boundary, combinatorial) = match &op.body {
        Some(base) => {
            let schema = op.request_body_schema.as_ref();
            let body = schema.map_or_else(Vec::new, |s| {
                mutate::recursive_body_variants(&op, base, &FieldPath::root(), s)
            });
            let boundary =
                schema.map_or_else(Vec::new, |s| mutate::boundary_variants(&op, base, s));
            let combinatorial =
                mutate::combinatorial_variants(&op, base, schema, options.max_combination);
            (body, boundary, combinatorial)
        }
        None => (Vec::new(), Vec::new(), Vec::new()),
    };
    let header = mutate::header_variants(&op, &options.mandatory_headers);
    let parameter = mutate::parameter_variants(&op);
    let security = mutate::security_variants(&op, &options.auth_header);

    let counts = GeneratorCounts {
        body: body.len(),
        boundary: boundary.len(),
        header: header.len(),
        parameter: parameter.len(),
        security: security.len(),
        combinatorial: combinatorial.len(),
    };

    Suite {
        operation: op.label(),
        variants: merge_all([body, boundary, header, parameter, security, combinatorial]),
        counts,
    }
}
