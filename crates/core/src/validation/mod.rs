//! Schema validation against concept and identifier-type metadata.
//!
//! [`SchemaValidator::validate`] walks every question of every section (and every sub-question
//! of an `obsGroup`) and launches, all at once:
//! - one concept check per question (reference resolution, boolean answers, coded answers,
//!   datatype/rendering compatibility),
//! - one existence check per declared answer,
//! - one identifier-type check per `patientIdentifier` question.
//!
//! The checks are joined as a batch. A lookup that fails only removes the findings that lookup
//! would have produced; every other check still runs to completion. Findings are best-effort
//! linting, not a guarantee that the form is correct.
//!
//! Finding order follows document order, but callers should compare reports as sets of
//! `(field, message)` since directories may answer in any order.

mod checks;
pub mod findings;

use crate::config::ValidatorConfig;
use crate::directory::{ConceptDirectory, IdentifierTypeDirectory};
use checks::{CheckContext, CheckOutcome};
use findings::{Finding, Severity};
use form_schema::{QuestionAddress, SchemaDocument};
use futures::future::{join_all, BoxFuture, FutureExt};
use serde::Serialize;
use std::sync::Arc;

/// Errors and warnings for a document, plus how many lookups were attempted and failed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub lookups_attempted: usize,
    pub lookups_failed: usize,
}

impl ValidationReport {
    /// No errors and no warnings.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// False when lookups were needed and every one of them failed, in which case an empty
    /// report says nothing about the document.
    pub fn is_conclusive(&self) -> bool {
        self.lookups_attempted == 0 || self.lookups_failed < self.lookups_attempted
    }

    /// Every finding, errors first.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.errors.iter().chain(self.warnings.iter())
    }

    pub fn findings_for<'a>(&'a self, question_id: &'a str) -> impl Iterator<Item = &'a Finding> {
        self.findings()
            .filter(move |finding| finding.field.question_id == question_id)
    }

    fn absorb(&mut self, outcome: CheckOutcome) {
        self.lookups_attempted += outcome.lookups_attempted;
        self.lookups_failed += outcome.lookups_failed;
        for finding in outcome.findings {
            match finding.severity() {
                Severity::Error => self.errors.push(finding),
                Severity::Warning => self.warnings.push(finding),
            }
        }
    }
}

/// Validates schema documents against a concept directory and an identifier-type directory.
#[derive(Clone)]
pub struct SchemaValidator {
    config: Arc<ValidatorConfig>,
    concepts: Arc<dyn ConceptDirectory>,
    identifier_types: Arc<dyn IdentifierTypeDirectory>,
}

impl SchemaValidator {
    pub fn new(
        config: Arc<ValidatorConfig>,
        concepts: Arc<dyn ConceptDirectory>,
        identifier_types: Arc<dyn IdentifierTypeDirectory>,
    ) -> Self {
        Self {
            config,
            concepts,
            identifier_types,
        }
    }

    /// Validate `document`.
    ///
    /// Never fails: lookup errors are logged and counted in the report instead.
    pub async fn validate(&self, document: &SchemaDocument) -> ValidationReport {
        let ctx = CheckContext {
            config: &self.config,
            concepts: self.concepts.as_ref(),
            identifier_types: self.identifier_types.as_ref(),
        };

        let mut tasks: Vec<BoxFuture<'_, CheckOutcome>> = Vec::new();
        for (p, page) in document.pages.iter().enumerate() {
            for (s, section) in page.sections.iter().enumerate() {
                for (q, question) in section.questions.iter().enumerate() {
                    let address = QuestionAddress::top_level(p, s, q);
                    let nested = if question.is_obs_group() {
                        question.sub_questions()
                    } else {
                        &[][..]
                    };

                    let targets = std::iter::once((address, question)).chain(
                        nested
                            .iter()
                            .enumerate()
                            .map(|(sub, child)| (address.nested(sub), child)),
                    );

                    for (address, target) in targets {
                        let ctx = &ctx;
                        tasks.push(checks::check_question(ctx, address, target).boxed());
                        tasks.push(checks::check_identifier_type(ctx, address, target).boxed());
                        for answer in target.answers() {
                            tasks.push(checks::check_answer(ctx, address, target, answer).boxed());
                        }
                    }
                }
            }
        }

        let checks = tasks.len();
        let mut report = ValidationReport::default();
        for outcome in join_all(tasks).await {
            report.absorb(outcome);
        }

        tracing::info!(
            form = %document.name,
            checks,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            lookups_attempted = report.lookups_attempted,
            lookups_failed = report.lookups_failed,
            "validated form schema"
        );
        if !report.is_conclusive() {
            tracing::warn!(
                form = %document.name,
                lookups_failed = report.lookups_failed,
                "every lookup failed; validation result is inconclusive"
            );
        }

        report
    }
}
