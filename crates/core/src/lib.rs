//! # Form Core
//!
//! Editing, relocation and validation of form schema documents.
//!
//! This crate contains the operations a form builder performs on a [`SchemaDocument`]:
//! - Structural edits of pages, sections and questions ([`editing`])
//! - Drag-and-drop relocation of questions and sub-questions ([`relocation`])
//! - Concurrent validation against concept and identifier-type directories ([`validation`])
//!
//! Every operation takes the current document by reference and returns a new one; nothing is
//! mutated in place.
//!
//! **No transport concerns**: how directories are reached (HTTP, a dictionary dump, a cache)
//! is decided by the caller through the traits in [`directory`].

pub mod addressing;
pub mod config;
pub mod constants;
pub mod directory;
pub mod editing;
pub mod error;
pub mod relocation;
pub mod validation;

pub use config::ValidatorConfig;
pub use directory::{
    Concept, ConceptDirectory, DirectorySnapshot, IdentifierType, IdentifierTypeDirectory,
    InMemoryDirectory, LookupError, LookupResult,
};
pub use error::{EditError, EditResult, EngineError, EngineResult, RelocationError};
pub use relocation::{relocate, relocate_or_ignore, DragDescriptor, DragKind};
pub use validation::findings::{FieldRef, Finding, FindingKind, Severity};
pub use validation::{SchemaValidator, ValidationReport};

pub use form_schema::{QuestionAddress, SchemaDocument};
