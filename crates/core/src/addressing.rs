//! Read-only lookups over the schema tree.
//!
//! UI-held addresses go stale after every structural edit, so each mutating operation in this
//! crate resolves the address it needs against the document it is about to change, using the
//! helpers here. None of these functions fail: an unresolved lookup is reported as `None`.

use form_schema::{Question, QuestionAddress, SchemaDocument};
use std::collections::HashSet;

/// What to look for with [`find_indexes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// A page, by label.
    Page(&'a str),
    /// A section, by label.
    Section(&'a str),
    /// A top-level question, by id.
    Field(&'a str),
}

/// Result of [`find_indexes`]. Each component is `None` when it was not resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Indexes {
    pub page_index: Option<usize>,
    pub section_index: Option<usize>,
    pub question_index: Option<usize>,
}

/// Resolve a page, section or field to its `(page, section, question)` indices.
///
/// A page lookup fills only `page_index`; a section lookup fills page and section; a field
/// lookup fills all three. When several elements match, the last one in document order wins.
pub fn find_indexes(document: &SchemaDocument, lookup: Lookup<'_>) -> Indexes {
    let mut found = Indexes::default();

    for (p, page) in document.pages.iter().enumerate() {
        if matches!(lookup, Lookup::Page(label) if label == page.label) {
            found.page_index = Some(p);
        }

        for (s, section) in page.sections.iter().enumerate() {
            if matches!(lookup, Lookup::Section(label) if label == section.label) {
                found.page_index = Some(p);
                found.section_index = Some(s);
            }

            if let Lookup::Field(id) = lookup {
                if let Some(q) = section.questions.iter().position(|question| question.id == id) {
                    found = Indexes {
                        page_index: Some(p),
                        section_index: Some(s),
                        question_index: Some(q),
                    };
                }
            }
        }
    }

    found
}

/// Resolve a section label on a specific page.
pub fn find_section_on_page(
    document: &SchemaDocument,
    page_index: usize,
    section_label: &str,
) -> Option<usize> {
    document
        .pages
        .get(page_index)?
        .sections
        .iter()
        .position(|section| section.label == section_label)
}

/// Find the address of a question by id, searching nested sub-questions as well.
pub fn locate_question(document: &SchemaDocument, id: &str) -> Option<QuestionAddress> {
    document
        .questions()
        .find(|(_, question)| question.id == id)
        .map(|(address, _)| address)
}

/// Borrow the question at `address`, if it still exists.
pub fn question_at(document: &SchemaDocument, address: QuestionAddress) -> Option<&Question> {
    let question = document
        .section(address.page_index, address.section_index)?
        .questions
        .get(address.question_index)?;

    match address.sub_question_index {
        Some(sub) => question.questions.as_ref()?.get(sub),
        None => Some(question),
    }
}

/// Every question id in the document, including nested sub-question ids, in document order.
pub fn all_question_ids(document: &SchemaDocument) -> Vec<&str> {
    document
        .questions()
        .map(|(_, question)| question.id.as_str())
        .collect()
}

/// True when no question in the document already uses `id`.
pub fn is_question_id_unique(document: &SchemaDocument, id: &str) -> bool {
    document.questions().all(|(_, question)| question.id != id)
}

/// Ids used by more than one question, each reported once.
pub fn duplicate_question_ids(document: &SchemaDocument) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for id in all_question_ids(document) {
        if !seen.insert(id) && !duplicates.iter().any(|d: &String| d == id) {
            duplicates.push(id.to_owned());
        }
    }
    duplicates
}

#[cfg(test)]
pub(crate) mod fixtures {
    use form_schema::{Page, Question, QuestionType, SchemaDocument, Section};

    pub fn obs(id: &str) -> Question {
        let mut question = Question::new(id, QuestionType::Obs);
        question.label = Some(id.to_uppercase());
        question
    }

    pub fn group(id: &str, children: &[&str]) -> Question {
        let mut question = Question::new(id, QuestionType::ObsGroup);
        question.questions = Some(children.iter().map(|child| obs(child)).collect());
        question
    }

    pub fn section(label: &str, questions: Vec<Question>) -> Section {
        let mut section = Section::new(label);
        section.questions = questions;
        section
    }

    pub fn page(label: &str, sections: Vec<Section>) -> Page {
        let mut page = Page::new(label);
        page.sections = sections;
        page
    }

    /// Two pages:
    /// - `Intake` / `History`: q1, q2, q3
    /// - `Intake` / `Vitals`: bp(sys, dia), pulse, temp(core, skin)
    /// - `Plan` / `Orders`: order
    pub fn document() -> SchemaDocument {
        let mut document: SchemaDocument =
            serde_json::from_str(r#"{ "name": "Test form", "pages": [] }"#)
                .expect("parse empty document");
        document.pages = vec![
            page(
                "Intake",
                vec![
                    section("History", vec![obs("q1"), obs("q2"), obs("q3")]),
                    section(
                        "Vitals",
                        vec![
                            group("bp", &["sys", "dia"]),
                            obs("pulse"),
                            group("temp", &["core", "skin"]),
                        ],
                    ),
                ],
            ),
            page("Plan", vec![section("Orders", vec![obs("order")])]),
        ];
        document
    }

    pub fn ids(section: &Section) -> Vec<&str> {
        section.questions.iter().map(|q| q.id.as_str()).collect()
    }

    pub fn sub_ids(question: &Question) -> Vec<&str> {
        question.sub_questions().iter().map(|q| q.id.as_str()).collect()
    }
}
