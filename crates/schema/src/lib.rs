//! Form schema wire/boundary support.
//!
//! This crate defines the JSON shape of an authored form schema (pages → sections →
//! questions, with nested questions for `obsGroup`) and the helpers that read and write it.
//! The JSON is the interchange format with the form-storage service and the form renderer,
//! so field names and nesting are kept exactly as stored, including fields this crate does
//! not model.
//!
//! Behaviour over the tree (addressing, editing, relocation, validation) lives in
//! `form-core`. This crate handles the data model and serialisation only.

pub mod address;
pub mod document;
pub mod question;

pub use address::QuestionAddress;
pub use document::{Page, SchemaDocument, Section};
pub use question::{Answer, ConceptMapping, Question, QuestionOptions, QuestionType, ToggleOptions};

/// Errors returned by the `form-schema` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`SchemaError`].
pub type SchemaResult<T> = Result<T, SchemaError>;
