//! Structural edits to a schema document.
//!
//! Every operation takes the current document by reference and returns a new one, leaving
//! the input as it was. Pages and sections are addressed by label and questions by id; each
//! operation resolves them against the document it is given, never against earlier indices.

use crate::addressing::{find_indexes, find_section_on_page, locate_question, Lookup};
use crate::error::{EditError, EditResult};
use form_schema::{Page, Question, SchemaDocument, Section};
use form_types::NonEmptyText;
use std::collections::HashSet;

/// Append a new, empty page.
pub fn add_page(document: &SchemaDocument, label: &str) -> EditResult<SchemaDocument> {
    let label = NonEmptyText::new(label)?;
    if find_indexes(document, Lookup::Page(label.as_str()))
        .page_index
        .is_some()
    {
        return Err(EditError::InvalidInput(format!(
            "a page labelled {:?} already exists",
            label.as_str()
        )));
    }

    let mut next = document.clone();
    next.pages.push(Page::new(label.into_string()));
    Ok(next)
}

pub fn rename_page(
    document: &SchemaDocument,
    current: &str,
    new_label: &str,
) -> EditResult<SchemaDocument> {
    let new_label = NonEmptyText::new(new_label)?;
    let page_index = page_index(document, current)?;
    if new_label.as_str() != current
        && find_indexes(document, Lookup::Page(new_label.as_str()))
            .page_index
            .is_some()
    {
        return Err(EditError::InvalidInput(format!(
            "a page labelled {:?} already exists",
            new_label.as_str()
        )));
    }

    let mut next = document.clone();
    next.pages[page_index].label = new_label.into_string();
    Ok(next)
}

/// Remove a page and everything on it.
pub fn delete_page(document: &SchemaDocument, label: &str) -> EditResult<SchemaDocument> {
    let page_index = page_index(document, label)?;
    let mut next = document.clone();
    next.pages.remove(page_index);
    Ok(next)
}

/// Append a new, empty section to a page.
pub fn add_section(
    document: &SchemaDocument,
    page_label: &str,
    section_label: &str,
) -> EditResult<SchemaDocument> {
    let section_label = NonEmptyText::new(section_label)?;
    let page_index = page_index(document, page_label)?;
    if find_section_on_page(document, page_index, section_label.as_str()).is_some() {
        return Err(EditError::InvalidInput(format!(
            "page {page_label:?} already has a section labelled {:?}",
            section_label.as_str()
        )));
    }

    let mut next = document.clone();
    next.pages[page_index]
        .sections
        .push(Section::new(section_label.into_string()));
    Ok(next)
}

pub fn rename_section(
    document: &SchemaDocument,
    page_label: &str,
    current: &str,
    new_label: &str,
) -> EditResult<SchemaDocument> {
    let new_label = NonEmptyText::new(new_label)?;
    let (page_index, section_index) = section_indexes(document, page_label, current)?;
    if new_label.as_str() != current
        && find_section_on_page(document, page_index, new_label.as_str()).is_some()
    {
        return Err(EditError::InvalidInput(format!(
            "page {page_label:?} already has a section labelled {:?}",
            new_label.as_str()
        )));
    }

    let mut next = document.clone();
    next.pages[page_index].sections[section_index].label = new_label.into_string();
    Ok(next)
}

/// Remove a section and its questions.
pub fn delete_section(
    document: &SchemaDocument,
    page_label: &str,
    section_label: &str,
) -> EditResult<SchemaDocument> {
    let (page_index, section_index) = section_indexes(document, page_label, section_label)?;
    let mut next = document.clone();
    next.pages[page_index].sections.remove(section_index);
    Ok(next)
}

/// Append a question to a section, or to the nested questions of `parent_id` when given.
///
/// The new question's id, and the ids of any questions nested inside it, must not already be
/// used anywhere in the document.
pub fn add_question(
    document: &SchemaDocument,
    page_label: &str,
    section_label: &str,
    question: Question,
    parent_id: Option<&str>,
) -> EditResult<SchemaDocument> {
    NonEmptyText::new(&question.id)?;
    let (page_index, section_index) = section_indexes(document, page_label, section_label)?;
    ensure_ids_available(document, &question)?;

    let mut next = document.clone();
    let section = &mut next.pages[page_index].sections[section_index];

    match parent_id {
        None => section.questions.push(question),
        Some(parent_id) => {
            let parent = section
                .questions
                .iter_mut()
                .find(|candidate| candidate.id == parent_id)
                .ok_or_else(|| EditError::QuestionNotFound(parent_id.to_owned()))?;
            if !parent.is_obs_group() {
                return Err(EditError::NotAGroup(parent_id.to_owned()));
            }
            parent.questions.get_or_insert_with(Vec::new).push(question);
        }
    }

    Ok(next)
}

/// Replace the question with id `id` (top-level or nested) by `replacement`.
///
/// The replacement may carry a different id, as long as it is not used elsewhere.
pub fn update_question(
    document: &SchemaDocument,
    id: &str,
    replacement: Question,
) -> EditResult<SchemaDocument> {
    NonEmptyText::new(&replacement.id)?;
    let address =
        locate_question(document, id).ok_or_else(|| EditError::QuestionNotFound(id.to_owned()))?;

    // Ids are checked against the document without the question being replaced, so the
    // replacement may keep its own id and those of its nested questions.
    let mut next = delete_question(document, id)?;
    ensure_ids_available(&next, &replacement)?;

    let section = &mut next.pages[address.page_index].sections[address.section_index];
    match address.sub_question_index {
        None => section.questions.insert(address.question_index, replacement),
        Some(sub) => section.questions[address.question_index]
            .questions
            .get_or_insert_with(Vec::new)
            .insert(sub, replacement),
    }

    Ok(next)
}

/// Remove the question with id `id`, wherever it is. Removing a group removes its
/// sub-questions too.
pub fn delete_question(document: &SchemaDocument, id: &str) -> EditResult<SchemaDocument> {
    let address =
        locate_question(document, id).ok_or_else(|| EditError::QuestionNotFound(id.to_owned()))?;

    let mut next = document.clone();
    let questions = &mut next.pages[address.page_index].sections[address.section_index].questions;
    match address.sub_question_index {
        None => {
            questions.remove(address.question_index);
        }
        Some(sub) => {
            if let Some(nested) = questions[address.question_index].questions.as_mut() {
                nested.remove(sub);
            }
        }
    }

    Ok(next)
}

fn page_index(document: &SchemaDocument, label: &str) -> EditResult<usize> {
    find_indexes(document, Lookup::Page(label))
        .page_index
        .ok_or_else(|| EditError::PageNotFound(label.to_owned()))
}

fn section_indexes(
    document: &SchemaDocument,
    page_label: &str,
    section_label: &str,
) -> EditResult<(usize, usize)> {
    let page_index = page_index(document, page_label)?;
    let section_index = find_section_on_page(document, page_index, section_label).ok_or_else(
        || EditError::SectionNotFound {
            page: page_label.to_owned(),
            section: section_label.to_owned(),
        },
    )?;
    Ok((page_index, section_index))
}

/// Reject `question` if its id or any nested id is already in `document`, or repeats within
/// the question itself.
fn ensure_ids_available(document: &SchemaDocument, question: &Question) -> EditResult<()> {
    let mut taken: HashSet<&str> = document
        .questions()
        .map(|(_, existing)| existing.id.as_str())
        .collect();

    let incoming = std::iter::once(question).chain(question.sub_questions().iter());
    for candidate in incoming {
        if !taken.insert(candidate.id.as_str()) {
            return Err(EditError::DuplicateId(candidate.id.clone()));
        }
    }
    Ok(())
}
