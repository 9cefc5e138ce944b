//! Findings produced by the validator.

use form_schema::{Question, QuestionAddress};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must be fixed before the form is published.
    Error,
    /// Drift between the form and live concept data; informational.
    Warning,
}

/// The question a finding is attached to, with enough context for the editor to jump to it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRef {
    pub question_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub address: QuestionAddress,
    /// Set when the finding is about one of the question's answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_concept: Option<String>,
}

impl FieldRef {
    pub fn question(address: QuestionAddress, question: &Question) -> Self {
        Self {
            question_id: question.id.clone(),
            label: question.label.clone(),
            address,
            answer_concept: None,
        }
    }

    pub fn answer(self, concept: Option<&str>) -> Self {
        Self {
            answer_concept: concept.map(str::to_owned),
            ..self
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FindingKind {
    NoConceptReference,
    InvalidConceptMapping {
        reason: String,
    },
    ConceptNotFound {
        reference: String,
    },
    NonBooleanAnswer {
        concept: String,
        answer_label: String,
    },
    AnswerNotInConcept {
        answer_label: String,
        answer_concept: String,
    },
    RenderingMismatch {
        concept: String,
        datatype: String,
        rendering: String,
    },
    UntrackedDatatype {
        datatype: String,
    },
    AnswerWithoutReference {
        answer_label: String,
    },
    AnswerNotFound {
        reference: String,
    },
    MissingIdentifierType,
    IdentifierTypeNotFound {
        identifier_type: String,
    },
}

impl FindingKind {
    pub fn severity(&self) -> Severity {
        match self {
            Self::AnswerNotInConcept { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Stable machine-readable code for the finding.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoConceptReference => "no-concept-reference",
            Self::InvalidConceptMapping { .. } => "invalid-concept-mapping",
            Self::ConceptNotFound { .. } => "concept-not-found",
            Self::NonBooleanAnswer { .. } => "non-boolean-answer",
            Self::AnswerNotInConcept { .. } => "answer-not-in-concept",
            Self::RenderingMismatch { .. } => "rendering-mismatch",
            Self::UntrackedDatatype { .. } => "untracked-datatype",
            Self::AnswerWithoutReference { .. } => "answer-without-reference",
            Self::AnswerNotFound { .. } => "answer-not-found",
            Self::MissingIdentifierType => "missing-identifier-type",
            Self::IdentifierTypeNotFound { .. } => "identifier-type-not-found",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoConceptReference => {
                f.write_str("no reference: question has neither a concept nor concept mappings")
            }
            Self::InvalidConceptMapping { reason } => {
                write!(f, "invalid concept mapping: {reason}")
            }
            Self::ConceptNotFound { reference } => write!(f, "concept \"{reference}\" not found"),
            Self::NonBooleanAnswer {
                concept,
                answer_label,
            } => write!(
                f,
                "concept \"{concept}\" of type \"Boolean\" has a non-boolean answer \"{answer_label}\""
            ),
            Self::AnswerNotInConcept {
                answer_label,
                answer_concept,
            } => write!(
                f,
                "answer \"{answer_label}\" ({answer_concept}) is not an answer of the concept but exists in the form"
            ),
            Self::RenderingMismatch {
                concept,
                datatype,
                rendering,
            } => write!(
                f,
                "{concept}: datatype \"{datatype}\" doesn't match rendering \"{rendering}\""
            ),
            Self::UntrackedDatatype { datatype } => write!(f, "untracked datatype \"{datatype}\""),
            Self::AnswerWithoutReference { answer_label } => write!(
                f,
                "answer \"{answer_label}\" has neither a concept nor concept mappings"
            ),
            Self::AnswerNotFound { reference } => {
                write!(f, "answer concept \"{reference}\" not found")
            }
            Self::MissingIdentifierType => f.write_str("no identifier type specified"),
            Self::IdentifierTypeNotFound { identifier_type } => {
                write!(f, "identifier type \"{identifier_type}\" does not exist")
            }
        }
    }
}

/// An error or warning about one question.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Finding {
    pub field: FieldRef,
    pub kind: FindingKind,
}

impl Finding {
    pub fn new(field: FieldRef, kind: FindingKind) -> Self {
        Self { field, kind }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl Serialize for Finding {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Finding", 3)?;
        state.serialize_field("field", &self.field)?;
        state.serialize_field("code", self.kind.code())?;
        state.serialize_field("message", &self.message())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_schema::QuestionType;

    #[test]
    fn only_answer_drift_is_a_warning() {
        let drift = FindingKind::AnswerNotInConcept {
            answer_label: "Maybe".into(),
            answer_concept: "1067AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".into(),
        };
        assert_eq!(drift.severity(), Severity::Warning);
        assert_eq!(FindingKind::MissingIdentifierType.severity(), Severity::Error);
        assert_eq!(
            FindingKind::UntrackedDatatype {
                datatype: "Structured-Numeric".into()
            }
            .severity(),
            Severity::Error
        );
    }

    #[test]
    fn serializes_field_code_and_message() {
        let mut question = Question::new("hivStatus", QuestionType::Obs);
        question.label = Some("HIV status".into());
        let field = FieldRef::question(QuestionAddress::top_level(0, 1, 2), &question);
        let finding = Finding::new(
            field,
            FindingKind::UntrackedDatatype {
                datatype: "Structured-Numeric".into(),
            },
        );

        let json = serde_json::to_value(&finding).expect("serialize finding");
        assert_eq!(json["field"]["questionId"], "hivStatus");
        assert_eq!(json["field"]["address"]["sectionIndex"], 1);
        assert_eq!(json["code"], "untracked-datatype");
        assert_eq!(json["message"], "untracked datatype \"Structured-Numeric\"");
        assert!(json["field"].get("answerConcept").is_none());
    }

    #[test]
    fn answer_field_carries_answer_concept() {
        let question = Question::new("q", QuestionType::Obs);
        let field = FieldRef::question(QuestionAddress::top_level(0, 0, 0), &question)
            .answer(Some("1066AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"));
        assert_eq!(
            field.answer_concept.as_deref(),
            Some("1066AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA")
        );
    }
}
