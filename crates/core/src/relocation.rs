//! Drag-and-drop relocation of questions.
//!
//! A drag is described by two [`DragDescriptor`]s (where the dragged question was, and what it
//! was dropped on) plus the id of the question under the drop point. [`relocate`] applies the
//! move to a clone of the document and returns the clone; the input is never touched.
//!
//! Supported moves:
//!
//! | source       | destination  | result                                                   |
//! |--------------|--------------|----------------------------------------------------------|
//! | question     | question     | placed next to the target (see [`relocate`])             |
//! | sub-question | question     | prepended to the target's nested questions               |
//! | sub-question | sub-question | same group: at the drop index; other group: prepended    |
//! | question     | sub-question | rejected                                                 |
//!
//! Any address that no longer resolves rejects the whole move, and so does dropping a question
//! onto itself. Rejection is a normal outcome (the UI was looking at an older document) and
//! callers ignore the gesture.

use crate::error::RelocationError;
use form_schema::{Question, QuestionAddress, SchemaDocument, Section};
use serde::{Deserialize, Serialize};

/// Which level of the tree a drag descriptor points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DragKind {
    /// A top-level question of a section.
    Question,
    /// A nested question of an `obsGroup`.
    SubQuestion,
}

/// Address and snapshot of either the dragged question or the drop target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragDescriptor {
    pub kind: DragKind,
    pub page_index: usize,
    pub section_index: usize,
    pub question_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_question_index: Option<usize>,
    /// The question as the UI saw it when the drag started.
    pub question: Question,
}

impl DragDescriptor {
    /// Capture a descriptor for the question currently at `address`.
    ///
    /// Returns `None` if nothing lives at that address.
    pub fn capture(document: &SchemaDocument, address: QuestionAddress) -> Option<Self> {
        let question = crate::addressing::question_at(document, address)?.clone();
        let kind = if address.is_nested() {
            DragKind::SubQuestion
        } else {
            DragKind::Question
        };

        Some(Self {
            kind,
            page_index: address.page_index,
            section_index: address.section_index,
            question_index: address.question_index,
            sub_question_index: address.sub_question_index,
            question,
        })
    }

    pub fn address(&self) -> QuestionAddress {
        QuestionAddress {
            page_index: self.page_index,
            section_index: self.section_index,
            question_index: self.question_index,
            sub_question_index: match self.kind {
                DragKind::Question => None,
                DragKind::SubQuestion => self.sub_question_index,
            },
        }
    }
}

/// Move the question described by `source` to the drop position described by `destination`.
///
/// `target_id` is the id of the question under the drop point.
///
/// For a top-level move within one section the question lands *after* the target when it was
/// dragged downwards and *before* it when dragged upwards, so it always ends up adjacent to the
/// target. Across sections it takes the target's position.
///
/// # Errors
///
/// Returns a [`RelocationError`] if either descriptor no longer resolves against `document`,
/// the source snapshot does not match the question at its address, the target cannot be found,
/// or the combination of kinds is not supported. The input document is unchanged in every case.
pub fn relocate(
    document: &SchemaDocument,
    source: &DragDescriptor,
    destination: &DragDescriptor,
    target_id: &str,
) -> Result<SchemaDocument, RelocationError> {
    try_relocate(document, source, destination, target_id).inspect_err(|err| {
        tracing::debug!(
            source = %source.address(),
            destination = %destination.address(),
            target_id,
            "ignoring drag: {err}"
        );
    })
}

/// Like [`relocate`], but folds every rejection into `None`.
pub fn relocate_or_ignore(
    document: &SchemaDocument,
    source: &DragDescriptor,
    destination: &DragDescriptor,
    target_id: &str,
) -> Option<SchemaDocument> {
    relocate(document, source, destination, target_id).ok()
}

fn try_relocate(
    document: &SchemaDocument,
    source: &DragDescriptor,
    destination: &DragDescriptor,
    target_id: &str,
) -> Result<SchemaDocument, RelocationError> {
    if (source.kind, destination.kind) == (DragKind::Question, DragKind::SubQuestion) {
        return Err(RelocationError::UnsupportedMove);
    }
    if source.kind == destination.kind && source.address() == destination.address() {
        return Err(RelocationError::DroppedOnItself(source.address()));
    }

    // Both addresses are checked against the input before the clone is touched.
    let found = resolve(document, source)?;
    if found.id != source.question.id {
        return Err(RelocationError::StaleSnapshot {
            address: source.address(),
            expected: source.question.id.clone(),
            found: found.id.clone(),
        });
    }
    let dropped_on = resolve(document, destination)?;
    if destination.kind == DragKind::SubQuestion && dropped_on.id != target_id {
        return Err(RelocationError::TargetNotFound(target_id.to_owned()));
    }

    let mut next = document.clone();
    let moved = remove_source(&mut next, source)?;

    match (source.kind, destination.kind) {
        (DragKind::Question, DragKind::Question) => {
            let questions = &mut section_mut(&mut next, destination)?.questions;
            let target = position_of(questions, target_id)?;
            let index = if source.address().same_section(&destination.address())
                && source.question_index <= destination.question_index
            {
                target + 1
            } else {
                target
            };
            questions.insert(index, moved);
        }
        (DragKind::SubQuestion, DragKind::Question) => {
            let section = section_mut(&mut next, destination)?;
            let target = position_of(&section.questions, target_id)?;
            let address = QuestionAddress::top_level(
                destination.page_index,
                destination.section_index,
                target,
            );
            nested_mut(section, address)?.insert(0, moved);
        }
        (DragKind::SubQuestion, DragKind::SubQuestion) => {
            let same_parent = source.address().same_section(&destination.address())
                && source.question_index == destination.question_index;
            let parent = destination.address().parent();
            let nested = nested_mut(section_mut(&mut next, destination)?, parent)?;

            let index = if same_parent {
                destination.sub_question_index.unwrap_or_default()
            } else {
                0
            };
            if index > nested.len() {
                return Err(RelocationError::QuestionNotFound(destination.address()));
            }
            nested.insert(index, moved);
        }
        (DragKind::Question, DragKind::SubQuestion) => {
            return Err(RelocationError::UnsupportedMove);
        }
    }

    Ok(next)
}

/// Check that a descriptor points at an existing question of the right kind.
fn resolve<'a>(
    document: &'a SchemaDocument,
    descriptor: &DragDescriptor,
) -> Result<&'a Question, RelocationError> {
    let section = document
        .section(descriptor.page_index, descriptor.section_index)
        .ok_or(RelocationError::SectionNotFound {
            page_index: descriptor.page_index,
            section_index: descriptor.section_index,
        })?;

    let address = descriptor.address();
    let question = section
        .questions
        .get(descriptor.question_index)
        .ok_or(RelocationError::QuestionNotFound(address))?;

    match descriptor.kind {
        DragKind::Question => Ok(question),
        DragKind::SubQuestion => {
            let sub_index = descriptor
                .sub_question_index
                .ok_or(RelocationError::QuestionNotFound(address))?;
            question
                .questions
                .as_ref()
                .ok_or(RelocationError::NotAGroup(address.parent()))?
                .get(sub_index)
                .ok_or(RelocationError::QuestionNotFound(address))
        }
    }
}

fn remove_source(
    document: &mut SchemaDocument,
    source: &DragDescriptor,
) -> Result<Question, RelocationError> {
    let address = source.address();
    let section = section_mut(document, source)?;

    match address.sub_question_index {
        None => {
            if address.question_index >= section.questions.len() {
                return Err(RelocationError::QuestionNotFound(address));
            }
            Ok(section.questions.remove(address.question_index))
        }
        Some(sub_index) => {
            let nested = nested_mut(section, address.parent())?;
            if sub_index >= nested.len() {
                return Err(RelocationError::QuestionNotFound(address));
            }
            Ok(nested.remove(sub_index))
        }
    }
}

fn section_mut<'a>(
    document: &'a mut SchemaDocument,
    descriptor: &DragDescriptor,
) -> Result<&'a mut Section, RelocationError> {
    document
        .section_mut(descriptor.page_index, descriptor.section_index)
        .ok_or(RelocationError::SectionNotFound {
            page_index: descriptor.page_index,
            section_index: descriptor.section_index,
        })
}

fn nested_mut(
    section: &mut Section,
    parent: QuestionAddress,
) -> Result<&mut Vec<Question>, RelocationError> {
    section
        .questions
        .get_mut(parent.question_index)
        .ok_or(RelocationError::QuestionNotFound(parent))?
        .questions
        .as_mut()
        .ok_or(RelocationError::NotAGroup(parent))
}

fn position_of(questions: &[Question], id: &str) -> Result<usize, RelocationError> {
    questions
        .iter()
        .position(|question| question.id == id)
        .ok_or_else(|| RelocationError::TargetNotFound(id.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::fixtures::{document, ids, obs, sub_ids};

    fn at(document: &SchemaDocument, address: QuestionAddress) -> DragDescriptor {
        DragDescriptor::capture(document, address).expect("address exists in fixture")
    }

    fn top(p: usize, s: usize, q: usize) -> QuestionAddress {
        QuestionAddress::top_level(p, s, q)
    }

    fn drag(
        document: &SchemaDocument,
        from: QuestionAddress,
        onto: QuestionAddress,
        target_id: &str,
    ) -> Result<SchemaDocument, RelocationError> {
        relocate(document, &at(document, from), &at(document, onto), target_id)
    }

    #[test]
    fn dragging_down_places_after_target() {
        let input = document();
        let output = drag(&input, top(0, 0, 0), top(0, 0, 2), "q3")
            .expect("move q1 onto q3");
        assert_eq!(ids(&output.pages[0].sections[0]), vec!["q2", "q3", "q1"]);
    }

    #[test]
    fn dragging_up_places_before_target() {
        let input = document();
        let output = drag(&input, top(0, 0, 2), top(0, 0, 0), "q1")
            .expect("move q3 onto q1");
        assert_eq!(ids(&output.pages[0].sections[0]), vec!["q3", "q1", "q2"]);
    }

    #[test]
    fn moving_to_neighbour_swaps() {
        let input = document();
        let output = drag(&input, top(0, 0, 0), top(0, 0, 1), "q2")
            .expect("move q1 onto q2");
        assert_eq!(ids(&output.pages[0].sections[0]), vec!["q2", "q1", "q3"]);
    }

    #[test]
    fn moving_there_and_back_restores_order() {
        let input = document();
        let moved = drag(&input, top(0, 0, 0), top(0, 0, 2), "q3")
            .expect("first move");
        let restored = drag(&moved, top(0, 0, 2), top(0, 0, 0), "q2")
            .expect("move back");
        assert_eq!(
            ids(&restored.pages[0].sections[0]),
            ids(&input.pages[0].sections[0])
        );
        assert_eq!(restored, input);
    }

    #[test]
    fn input_document_is_not_mutated() {
        let input = document();
        let before = input.clone();
        let output = drag(&input, top(0, 1, 0), top(0, 1, 2), "temp")
            .expect("move bp onto temp");

        assert_eq!(input, before);
        assert_ne!(output, input);
        assert!(!std::ptr::eq(
            &input.pages[0].sections[1].questions[0],
            &output.pages[0].sections[1].questions[0]
        ));
    }

    #[test]
    fn cross_section_move_takes_target_position() {
        let input = document();
        let output = drag(&input, top(0, 0, 0), top(0, 1, 1), "pulse")
            .expect("move q1 into Vitals");
        assert_eq!(ids(&output.pages[0].sections[0]), vec!["q2", "q3"]);
        assert_eq!(ids(&output.pages[0].sections[1]), vec!["bp", "q1", "pulse", "temp"]);
    }

    #[test]
    fn cross_page_move_takes_target_position() {
        let input = document();
        let output = drag(&input, top(1, 0, 0), top(0, 0, 0), "q1")
            .expect("move order onto q1");
        assert_eq!(ids(&output.pages[0].sections[0]), vec!["order", "q1", "q2", "q3"]);
        assert!(output.pages[1].sections[0].questions.is_empty());
    }

    #[test]
    fn sub_question_onto_question_is_prepended() {
        let input = document();
        let output = drag(&input, top(0, 1, 2).nested(1), top(0, 1, 0), "bp")
            .expect("move skin onto bp");
        let vitals = &output.pages[0].sections[1];
        assert_eq!(sub_ids(&vitals.questions[0]), vec!["skin", "sys", "dia"]);
        assert_eq!(sub_ids(&vitals.questions[2]), vec!["core"]);
    }

    #[test]
    fn sub_question_within_group_uses_drop_index() {
        let input = document();
        let output = drag(&input, top(0, 1, 0).nested(0), top(0, 1, 0).nested(1), "dia")
            .expect("move sys onto dia");
        assert_eq!(sub_ids(&output.pages[0].sections[1].questions[0]), vec!["dia", "sys"]);

        let back = drag(&output, top(0, 1, 0).nested(1), top(0, 1, 0).nested(0), "dia")
            .expect("move sys back onto dia");
        assert_eq!(sub_ids(&back.pages[0].sections[1].questions[0]), vec!["sys", "dia"]);
    }

    #[test]
    fn sub_question_into_other_group_is_prepended_regardless_of_drop_index() {
        let input = document();
        let output = drag(&input, top(0, 1, 0).nested(0), top(0, 1, 2).nested(1), "skin")
            .expect("move sys onto skin");
        let vitals = &output.pages[0].sections[1];
        assert_eq!(sub_ids(&vitals.questions[0]), vec!["dia"]);
        assert_eq!(sub_ids(&vitals.questions[2]), vec!["sys", "core", "skin"]);
    }

    #[test]
    fn question_onto_sub_question_is_rejected() {
        let input = document();
        let err = drag(&input, top(0, 0, 0), top(0, 1, 0).nested(0), "sys")
            .expect_err("unsupported");
        assert_eq!(err, RelocationError::UnsupportedMove);
    }

    #[test]
    fn stale_source_index_is_rejected() {
        let input = document();
        let before = input.clone();
        let mut source = at(&input, top(0, 0, 0));
        source.question_index = 7;
        let err = relocate(&input, &source, &at(&input, top(0, 0, 1)), "q2")
            .expect_err("out of bounds source");
        assert!(matches!(err, RelocationError::QuestionNotFound(_)));
        assert_eq!(input, before);
    }

    #[test]
    fn stale_sub_question_index_is_rejected() {
        let input = document();
        let mut source = at(&input, top(0, 1, 0).nested(0));
        source.sub_question_index = Some(5);
        assert!(relocate_or_ignore(&input, &source, &at(&input, top(0, 1, 1)), "pulse").is_none());

        let mut destination = at(&input, top(0, 1, 2).nested(0));
        destination.sub_question_index = Some(9);
        assert!(relocate_or_ignore(
            &input,
            &at(&input, top(0, 1, 0).nested(0)),
            &destination,
            "core"
        )
        .is_none());
    }

    #[test]
    fn stale_destination_index_is_rejected() {
        let input = document();
        let mut destination = at(&input, top(0, 0, 2));
        destination.question_index = 3;
        let err = relocate(&input, &at(&input, top(0, 0, 0)), &destination, "q3")
            .expect_err("out of bounds destination");
        assert!(matches!(err, RelocationError::QuestionNotFound(_)));

        destination.section_index = 4;
        let err = relocate(&input, &at(&input, top(0, 0, 0)), &destination, "q3")
            .expect_err("missing section");
        assert!(matches!(err, RelocationError::SectionNotFound { .. }));
    }

    #[test]
    fn snapshot_mismatch_is_rejected() {
        let input = document();
        let mut source = at(&input, top(0, 0, 0));
        source.question = obs("q2");
        let err = relocate(&input, &source, &at(&input, top(0, 0, 2)), "q3")
            .expect_err("stale snapshot");
        assert!(matches!(err, RelocationError::StaleSnapshot { .. }));
    }

    #[test]
    fn missing_target_is_rejected() {
        let input = document();
        let err = drag(&input, top(0, 0, 0), top(0, 0, 2), "ghost")
            .expect_err("unknown target");
        assert_eq!(err, RelocationError::TargetNotFound("ghost".into()));
    }

    #[test]
    fn dropping_on_itself_is_rejected() {
        let input = document();
        let err =
            drag(&input, top(0, 0, 1), top(0, 0, 1), "q2").expect_err("top-level self drop");
        assert_eq!(err, RelocationError::DroppedOnItself(top(0, 0, 1)));

        let sub = top(0, 1, 0).nested(0);
        let err = drag(&input, sub, sub, "sys")
            .expect_err("sub-question self drop");
        assert_eq!(err, RelocationError::DroppedOnItself(sub));
    }

    #[test]
    fn sub_question_onto_plain_question_is_rejected() {
        let input = document();
        let err = drag(&input, top(0, 1, 0).nested(0), top(0, 1, 1), "pulse")
            .expect_err("pulse has no nested questions");
        assert!(matches!(err, RelocationError::NotAGroup(_)));
    }

    #[test]
    fn sub_question_target_must_match_drop_address() {
        let input = document();
        let err = drag(&input, top(0, 1, 0).nested(0), top(0, 1, 2).nested(1), "core")
            .expect_err("skin is at the drop address, not core");
        assert_eq!(err, RelocationError::TargetNotFound("core".into()));
    }

    #[test]
    fn sub_question_descriptor_without_index_is_rejected() {
        let input = document();
        let mut source = at(&input, top(0, 1, 0).nested(0));
        source.sub_question_index = None;
        assert!(relocate_or_ignore(&input, &source, &at(&input, top(0, 1, 2)), "temp").is_none());
    }

    #[test]
    fn descriptor_round_trips_as_camel_case_json() {
        let input = document();
        let descriptor = at(&input, top(0, 1, 2).nested(1));
        let json = serde_json::to_value(&descriptor).expect("serialize descriptor");
        assert_eq!(json["kind"], "subQuestion");
        assert_eq!(json["subQuestionIndex"], 1);
        assert_eq!(json["question"]["id"], "skin");
    }
}
