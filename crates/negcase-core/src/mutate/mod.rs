//! Variant generators
//!
//! Every generator is a pure function of an [`Operation`](crate::Operation)
//! and returns owned variants.

pub mod body;
pub mod boundary;
pub mod combinatorial;
pub mod field;
pub mod header;
pub mod parameter;
pub mod security;

pub use body::recursive_body_variants;
pub use boundary::boundary_variants;
pub use combinatorial::combinatorial_variants;
pub use field::{INVALID_ENUM_SENTINEL, field_variants, invalid_type_sentinel};
pub use header::{INVALID_HEADER_VALUE, header_variants};
pub use parameter::parameter_variants;
pub use security::{requires_auth, security_variants};
