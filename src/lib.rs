//! # Form Builder
//!
//! Facade over the form engine crates:
//! - [`schema`]: the schema document tree and its JSON wire format
//! - [`engine`]: editing, relocation and validation
//! - [`types`]: validated text primitives shared by both

pub use form_core as engine;
pub use form_schema as schema;
pub use form_types as types;

pub use form_core::{
    relocate, relocate_or_ignore, DragDescriptor, DragKind, EditError, EngineError,
    RelocationError, SchemaValidator, ValidationReport, ValidatorConfig,
};
pub use form_schema::{Page, Question, QuestionAddress, QuestionType, SchemaDocument, Section};
