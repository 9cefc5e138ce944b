//! Positional addresses into the schema tree.
//!
//! Addresses are indices, not identifiers: any structural edit (insert, delete, move) can
//! invalidate an address captured earlier. Callers re-resolve an address against the document
//! they are about to change.

use serde::{Deserialize, Serialize};

/// Location of a question: `(page, section, question[, sub-question])`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAddress {
    pub page_index: usize,
    pub section_index: usize,
    pub question_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_question_index: Option<usize>,
}

impl QuestionAddress {
    /// Address of a top-level question of a section.
    pub fn top_level(page_index: usize, section_index: usize, question_index: usize) -> Self {
        Self {
            page_index,
            section_index,
            question_index,
            sub_question_index: None,
        }
    }

    /// Address of the `sub_question_index`-th sub-question of the question at `self`.
    pub fn nested(self, sub_question_index: usize) -> Self {
        Self {
            sub_question_index: Some(sub_question_index),
            ..self
        }
    }

    /// The top-level question containing this address (itself when not nested).
    pub fn parent(self) -> Self {
        Self {
            sub_question_index: None,
            ..self
        }
    }

    pub fn is_nested(&self) -> bool {
        self.sub_question_index.is_some()
    }

    pub fn same_section(&self, other: &Self) -> bool {
        self.page_index == other.page_index && self.section_index == other.section_index
    }
}

impl std::fmt::Display for QuestionAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pages[{}].sections[{}].questions[{}]",
            self.page_index, self.section_index, self.question_index
        )?;
        if let Some(sub) = self.sub_question_index {
            write!(f, ".questions[{sub}]")?;
        }
        Ok(())
    }
}
