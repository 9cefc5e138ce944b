//! Question wire models.
//!
//! A question is the leaf of the schema tree, except for `obsGroup` questions which carry a
//! nested, ordered list of sub-questions. Only the fields the engine reads are modelled as
//! typed fields; everything else a schema carries (behaviours, hide expressions, custom
//! rendering hints) lands in the flattened `extra` map and is written back unchanged.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Question type as declared by the schema author.
///
/// Unknown type strings are kept verbatim in [`QuestionType::Other`] so that schemas written
/// for newer renderers survive a load/render cycle.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QuestionType {
    Obs,
    ObsGroup,
    Control,
    EncounterDatetime,
    EncounterLocation,
    EncounterProvider,
    EncounterRole,
    PersonAttribute,
    PatientIdentifier,
    TestOrder,
    ProgramState,
    Other(String),
}

impl QuestionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Obs => "obs",
            Self::ObsGroup => "obsGroup",
            Self::Control => "control",
            Self::EncounterDatetime => "encounterDatetime",
            Self::EncounterLocation => "encounterLocation",
            Self::EncounterProvider => "encounterProvider",
            Self::EncounterRole => "encounterRole",
            Self::PersonAttribute => "personAttribute",
            Self::PatientIdentifier => "patientIdentifier",
            Self::TestOrder => "testOrder",
            Self::ProgramState => "programState",
            Self::Other(other) => other,
        }
    }
}

impl From<&str> for QuestionType {
    fn from(value: &str) -> Self {
        match value {
            "obs" => Self::Obs,
            "obsGroup" => Self::ObsGroup,
            "control" => Self::Control,
            "encounterDatetime" => Self::EncounterDatetime,
            "encounterLocation" => Self::EncounterLocation,
            "encounterProvider" => Self::EncounterProvider,
            "encounterRole" => Self::EncounterRole,
            "personAttribute" => Self::PersonAttribute,
            "patientIdentifier" => Self::PatientIdentifier,
            "testOrder" => Self::TestOrder,
            "programState" => Self::ProgramState,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for QuestionType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for QuestionType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(QuestionType::from(s.as_str()))
    }
}

/// A `source:code` mapping to a concept in an external terminology.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMapping {
    /// Terminology source, for example `CIEL` or `SNOMED CT`.
    #[serde(rename = "type")]
    pub source: String,

    /// Code within the source.
    #[serde(rename = "value")]
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A declared answer of a coded or boolean question.
///
/// Answers are snapshots captured at authoring time; the concept behind them may have
/// changed since.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_mappings: Option<Vec<ConceptMapping>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Answer {
    pub fn new(concept: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            concept: Some(concept.into()),
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn label_or_empty(&self) -> &str {
        self.label.as_deref().unwrap_or_default()
    }
}

/// Labels shown by a `toggle` rendering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOptions {
    pub label_true: String,
    pub label_false: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Rendering kind plus the type-specific options of a question.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOptions {
    /// Widget requested from the renderer (`text`, `number`, `select`, `toggle`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendering: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_mappings: Option<Vec<ConceptMapping>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<Answer>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggle_options: Option<ToggleOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectable_orders: Option<Vec<Answer>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_searchable: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_picker_format: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single question of a section, or a sub-question of an `obsGroup`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique across the whole document. Uniqueness is enforced by editing operations, not
    /// by the tree.
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// Either a flag or an expression object, depending on the renderer version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Value>,

    #[serde(default)]
    pub question_options: QuestionOptions,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validators: Option<Vec<Value>>,

    /// Nested sub-questions; only meaningful for `obsGroup`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<Question>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Question {
    pub fn new(id: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            id: id.into(),
            label: None,
            question_type,
            required: None,
            question_options: QuestionOptions::default(),
            validators: None,
            questions: None,
            extra: Map::new(),
        }
    }

    pub fn is_obs_group(&self) -> bool {
        self.question_type == QuestionType::ObsGroup
    }

    /// Nested sub-questions, or an empty slice when there are none.
    pub fn sub_questions(&self) -> &[Question] {
        self.questions.as_deref().unwrap_or_default()
    }

    pub fn rendering(&self) -> Option<&str> {
        self.question_options.rendering.as_deref()
    }

    pub fn answers(&self) -> &[Answer] {
        self.question_options.answers.as_deref().unwrap_or_default()
    }

    /// Interprets `required` the way the renderer does: `true` and `"true"` are required.
    pub fn is_required(&self) -> bool {
        match &self.required {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(text)) => text.eq_ignore_ascii_case("true"),
            Some(Value::Object(rule)) => rule.get("type").and_then(Value::as_str) == Some("yes"),
            _ => false,
        }
    }
}
