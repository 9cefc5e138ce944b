use form_schema::QuestionAddress;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read configuration file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Why a drag gesture was rejected.
///
/// Every variant means the same thing to the caller: nothing changed and the gesture should
/// be ignored. The variants exist so the rejection can be logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelocationError {
    #[error("no section at page {page_index}, section {section_index}")]
    SectionNotFound {
        page_index: usize,
        section_index: usize,
    },
    #[error("no question at {0}")]
    QuestionNotFound(QuestionAddress),
    #[error("question at {address} is {found:?}, expected {expected:?}")]
    StaleSnapshot {
        address: QuestionAddress,
        expected: String,
        found: String,
    },
    #[error("question at {0} has no nested questions")]
    NotAGroup(QuestionAddress),
    #[error("drop target {0:?} not found")]
    TargetNotFound(String),
    #[error("a top-level question cannot be dropped onto a sub-question")]
    UnsupportedMove,
    #[error("question at {0} was dropped onto itself")]
    DroppedOnItself(QuestionAddress),
}

/// Errors returned by editing operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("question id {0:?} is already used in this form")]
    DuplicateId(String),
    #[error("page {0:?} not found")]
    PageNotFound(String),
    #[error("section {section:?} not found on page {page:?}")]
    SectionNotFound { page: String, section: String },
    #[error("question {0:?} not found")]
    QuestionNotFound(String),
    #[error("question {0:?} is not an obsGroup")]
    NotAGroup(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<form_types::TextError> for EditError {
    fn from(err: form_types::TextError) -> Self {
        EditError::InvalidInput(err.to_string())
    }
}

pub type EditResult<T> = std::result::Result<T, EditError>;
