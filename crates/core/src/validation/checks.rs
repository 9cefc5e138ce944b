//! Per-question checks.
//!
//! Each check is an independent future producing a [`CheckOutcome`]. A check never fails: a
//! lookup error is logged, counted, and produces no finding.

use super::findings::{FieldRef, Finding, FindingKind};
use crate::config::ValidatorConfig;
use crate::constants::{DATATYPE_BOOLEAN, DATATYPE_CODED};
use crate::directory::{ConceptDirectory, IdentifierTypeDirectory, LookupError, LookupResult};
use form_schema::{Answer, ConceptMapping, Question, QuestionAddress, QuestionType};
use form_types::{ConceptReference, TextError};
use std::future::Future;

/// Findings and lookup counts of one check.
#[derive(Debug, Default)]
pub(crate) struct CheckOutcome {
    pub findings: Vec<Finding>,
    pub lookups_attempted: usize,
    pub lookups_failed: usize,
}

impl CheckOutcome {
    fn finding(field: FieldRef, kind: FindingKind) -> Self {
        Self {
            findings: vec![Finding::new(field, kind)],
            ..Self::default()
        }
    }
}

pub(crate) struct CheckContext<'a> {
    pub config: &'a ValidatorConfig,
    pub concepts: &'a dyn ConceptDirectory,
    pub identifier_types: &'a dyn IdentifierTypeDirectory,
}

impl CheckContext<'_> {
    async fn with_timeout<T>(
        &self,
        lookup: impl Future<Output = LookupResult<T>>,
    ) -> LookupResult<T> {
        match self.config.lookup_timeout() {
            Some(limit) => tokio::time::timeout(limit, lookup)
                .await
                .unwrap_or(Err(LookupError::Timeout(limit))),
            None => lookup.await,
        }
    }
}

/// Reference for a concept id, falling back to `source:code` mappings.
fn search_reference(
    concept: Option<&str>,
    mappings: Option<&[ConceptMapping]>,
) -> Result<Option<ConceptReference>, TextError> {
    if let Some(concept) = concept.filter(|c| !c.trim().is_empty()) {
        return ConceptReference::from_concept(concept).map(Some);
    }

    ConceptReference::from_mappings(
        mappings
            .unwrap_or_default()
            .iter()
            .map(|mapping| (mapping.source.as_str(), mapping.code.as_str())),
    )
}

/// Resolve the question's concept and check its answers and rendering against it.
pub(crate) async fn check_question(
    ctx: &CheckContext<'_>,
    address: QuestionAddress,
    question: &Question,
) -> CheckOutcome {
    let field = FieldRef::question(address, question);
    let options = &question.question_options;

    let reference = match search_reference(
        options.concept.as_deref(),
        options.concept_mappings.as_deref(),
    ) {
        Ok(Some(reference)) => reference,
        Ok(None) if ctx.config.is_concept_exempt(question.rendering()) => {
            return CheckOutcome::default()
        }
        Ok(None) => return CheckOutcome::finding(field, FindingKind::NoConceptReference),
        Err(err) => {
            return CheckOutcome::finding(
                field,
                FindingKind::InvalidConceptMapping {
                    reason: err.to_string(),
                },
            )
        }
    };

    let mut outcome = CheckOutcome {
        lookups_attempted: 1,
        ..CheckOutcome::default()
    };

    let concepts = match ctx
        .with_timeout(ctx.concepts.lookup_concepts_by_reference(&reference))
        .await
    {
        Ok(concepts) => concepts,
        Err(err) => {
            tracing::warn!(
                question_id = %question.id,
                reference = %reference,
                error = %err,
                "concept lookup failed; skipping question checks"
            );
            outcome.lookups_failed = 1;
            return outcome;
        }
    };

    let Some(concept) = concepts.first() else {
        outcome.findings.push(Finding::new(
            field,
            FindingKind::ConceptNotFound {
                reference: reference.to_string(),
            },
        ));
        return outcome;
    };

    let datatype = concept.datatype.name.as_str();

    if datatype == DATATYPE_BOOLEAN {
        for answer in question.answers() {
            let canonical = answer
                .concept
                .as_deref()
                .is_some_and(|c| ctx.config.is_boolean_answer(c));
            if !canonical {
                outcome.findings.push(Finding::new(
                    field.clone().answer(answer.concept.as_deref()),
                    FindingKind::NonBooleanAnswer {
                        concept: reference.to_string(),
                        answer_label: answer.label_or_empty().to_owned(),
                    },
                ));
            }
        }
    }

    if datatype == DATATYPE_CODED {
        for answer in question.answers() {
            let known = answer
                .concept
                .as_deref()
                .is_some_and(|c| concept.has_answer(c));
            if !known {
                outcome.findings.push(Finding::new(
                    field.clone().answer(answer.concept.as_deref()),
                    FindingKind::AnswerNotInConcept {
                        answer_label: answer.label_or_empty().to_owned(),
                        answer_concept: answer.concept.clone().unwrap_or_default(),
                    },
                ));
            }
        }
    }

    let rendering = question.rendering().unwrap_or_default();
    match ctx.config.allowed_renderings(datatype) {
        Some(allowed) if !allowed.iter().any(|r| r == rendering) => {
            outcome.findings.push(Finding::new(
                field,
                FindingKind::RenderingMismatch {
                    concept: reference.to_string(),
                    datatype: datatype.to_owned(),
                    rendering: rendering.to_owned(),
                },
            ));
        }
        Some(_) => {}
        None => outcome.findings.push(Finding::new(
            field,
            FindingKind::UntrackedDatatype {
                datatype: datatype.to_owned(),
            },
        )),
    }

    outcome
}

/// Check that a declared answer still resolves to a concept.
pub(crate) async fn check_answer(
    ctx: &CheckContext<'_>,
    address: QuestionAddress,
    question: &Question,
    answer: &Answer,
) -> CheckOutcome {
    let field = FieldRef::question(address, question).answer(answer.concept.as_deref());

    let reference = match search_reference(
        answer.concept.as_deref(),
        answer.concept_mappings.as_deref(),
    ) {
        Ok(Some(reference)) => reference,
        Ok(None) => {
            return CheckOutcome::finding(
                field,
                FindingKind::AnswerWithoutReference {
                    answer_label: answer.label_or_empty().to_owned(),
                },
            )
        }
        Err(err) => {
            return CheckOutcome::finding(
                field,
                FindingKind::InvalidConceptMapping {
                    reason: err.to_string(),
                },
            )
        }
    };

    let mut outcome = CheckOutcome {
        lookups_attempted: 1,
        ..CheckOutcome::default()
    };

    match ctx
        .with_timeout(ctx.concepts.lookup_concepts_by_reference(&reference))
        .await
    {
        Ok(concepts) if concepts.is_empty() => outcome.findings.push(Finding::new(
            field,
            FindingKind::AnswerNotFound {
                reference: reference.to_string(),
            },
        )),
        Ok(_) => {}
        Err(err) => {
            tracing::warn!(
                question_id = %question.id,
                reference = %reference,
                error = %err,
                "answer lookup failed; skipping answer check"
            );
            outcome.lookups_failed = 1;
        }
    }

    outcome
}

/// Check that a `patientIdentifier` question names an existing identifier type.
pub(crate) async fn check_identifier_type(
    ctx: &CheckContext<'_>,
    address: QuestionAddress,
    question: &Question,
) -> CheckOutcome {
    if question.question_type != QuestionType::PatientIdentifier {
        return CheckOutcome::default();
    }

    let field = FieldRef::question(address, question);
    let Some(identifier_type) = question
        .question_options
        .identifier_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    else {
        return CheckOutcome::finding(field, FindingKind::MissingIdentifierType);
    };

    let mut outcome = CheckOutcome {
        lookups_attempted: 1,
        ..CheckOutcome::default()
    };

    match ctx
        .with_timeout(ctx.identifier_types.lookup_identifier_type(identifier_type))
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => outcome.findings.push(Finding::new(
            field,
            FindingKind::IdentifierTypeNotFound {
                identifier_type: identifier_type.to_owned(),
            },
        )),
        Err(err) => {
            tracing::warn!(
                question_id = %question.id,
                identifier_type,
                error = %err,
                "identifier type lookup failed; skipping check"
            );
            outcome.lookups_failed = 1;
        }
    }

    outcome
}
