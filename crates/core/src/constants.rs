//! Constants used throughout the form core crate.
//!
//! Concept ids here are the ones shipped with the reference concept dictionary. Deployments
//! with a different dictionary override them through [`crate::ValidatorConfig`].

/// Canonical concept for a boolean "true" answer.
pub const BOOLEAN_TRUE_CONCEPT: &str = "cf82933b-3f3f-45e7-a5ab-5d31aaee3da3";

/// Canonical concept for a boolean "false" answer.
pub const BOOLEAN_FALSE_CONCEPT: &str = "488b58ff-64f5-4f8a-8979-fa79940b1594";

/// Datatype name of boolean concepts.
pub const DATATYPE_BOOLEAN: &str = "Boolean";

/// Datatype name of coded concepts.
pub const DATATYPE_CODED: &str = "Coded";

/// Renderings that display content and never reference a concept.
pub const CONCEPT_EXEMPT_RENDERINGS: &[&str] = &["markdown"];

/// Datatype → renderings table used when no configuration is supplied.
pub const DEFAULT_DATATYPE_RENDERINGS: &[(&str, &[&str])] = &[
    (
        "Coded",
        &["select", "checkbox", "radio", "toggle", "content-switcher", "fixed-value"],
    ),
    ("Text", &["text", "textarea"]),
    ("Date", &["date"]),
    ("Datetime", &["datetime"]),
    ("Numeric", &["number", "fixed-value"]),
    (
        "Boolean",
        &["toggle", "select", "radio", "content-switcher", "fixed-value"],
    ),
    ("Rule", &["repeating", "group"]),
    ("N/A", &[]),
    ("Complex", &["file"]),
];

/// Environment variable holding the per-lookup timeout in milliseconds.
pub const LOOKUP_TIMEOUT_ENV: &str = "FORM_LOOKUP_TIMEOUT_MS";
