//! Schema document, page and section wire models.
//!
//! Responsibilities:
//! - Define the tree the editor works on (document → pages → sections → questions)
//! - Parse a stored schema with path-aware error reporting
//! - Render the tree back to JSON for the form-storage service and the renderer
//!
//! Notes:
//! - Field names are camelCase on the wire and must not change; the renderer owns that contract.
//! - Unknown keys are preserved in `extra` maps instead of being rejected.

use crate::address::QuestionAddress;
use crate::question::Question;
use crate::{SchemaError, SchemaResult};
use form_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version assigned to newly created schemas.
pub const DEFAULT_SCHEMA_VERSION: &str = "1.0";

/// Processor assigned to newly created schemas.
pub const DEFAULT_PROCESSOR: &str = "EncounterFormProcessor";

/// Root of the schema tree.
///
/// Documents are treated as values: every edit produces a new document and the previous one
/// is left as it was, which gives callers undo history and change detection for free.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter_type: Option<String>,

    #[serde(default)]
    pub pages: Vec<Page>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_forms: Option<Vec<Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub sections: Vec<Section>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Page {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub label: String,

    /// UI hint only. Stored schemas use both `true` and `"true"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_expanded: Option<Value>,

    #[serde(default)]
    pub questions: Vec<Question>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Section {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn is_expanded(&self) -> bool {
        match &self.is_expanded {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(text)) => text.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

impl SchemaDocument {
    /// Empty document used when an author starts a new form.
    pub fn skeleton(name: NonEmptyText) -> Self {
        let mut extra = Map::new();
        extra.insert(
            "processor".to_owned(),
            Value::String(DEFAULT_PROCESSOR.to_owned()),
        );

        Self {
            name: name.into_string(),
            uuid: None,
            version: Some(DEFAULT_SCHEMA_VERSION.to_owned()),
            encounter_type: None,
            pages: Vec::new(),
            referenced_forms: Some(Vec::new()),
            extra,
        }
    }

    /// Parse a schema document from JSON text.
    ///
    /// This uses `serde_path_to_error` to surface the path (e.g. `pages[0].sections[1].label`)
    /// of the failing field when the JSON does not match the wire model.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidJson`] for malformed JSON or trailing content and
    /// [`SchemaError::Translation`] when a field has an unexpected type.
    pub fn parse(json_text: &str) -> SchemaResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        let parsed = serde_path_to_error::deserialize::<_, SchemaDocument>(&mut deserializer);
        let document = match parsed {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                if source.is_syntax() || source.is_eof() {
                    return Err(SchemaError::InvalidJson(source));
                }
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(SchemaError::Translation(format!(
                    "form schema mismatch at {path}: {source}"
                )));
            }
        };

        deserializer.end()?;
        Ok(document)
    }

    /// Render the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidJson`] if serialisation fails.
    pub fn render(&self) -> SchemaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn section(&self, page_index: usize, section_index: usize) -> Option<&Section> {
        self.pages.get(page_index)?.sections.get(section_index)
    }

    pub fn section_mut(&mut self, page_index: usize, section_index: usize) -> Option<&mut Section> {
        self.pages.get_mut(page_index)?.sections.get_mut(section_index)
    }

    /// Every question in document order with its address. Sub-questions of a group follow
    /// their parent immediately.
    pub fn questions(&self) -> impl Iterator<Item = (QuestionAddress, &Question)> + '_ {
        self.pages.iter().enumerate().flat_map(|(p, page)| {
            page.sections.iter().enumerate().flat_map(move |(s, section)| {
                section.questions.iter().enumerate().flat_map(move |(q, question)| {
                    let address = QuestionAddress::top_level(p, s, q);
                    std::iter::once((address, question)).chain(
                        question
                            .sub_questions()
                            .iter()
                            .enumerate()
                            .map(move |(sub, nested)| (address.nested(sub), nested)),
                    )
                })
            })
        })
    }

    pub fn question_count(&self) -> usize {
        self.questions().count()
    }
}
