//! Small validated primitives shared by the form schema crates.
//!
//! - [`NonEmptyText`]: trimmed text guaranteed to contain at least one character, used for
//!   question ids, page labels and section labels supplied by editing operations.
//! - [`ConceptReference`]: the search reference sent to the concept directory, built either
//!   from an explicit concept id or from `source:code` mapping pairs.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// A concept mapping pair was missing its source or code
    #[error("concept mapping must have both a source and a code (got {system:?}:{code:?})")]
    IncompleteMapping { system: String, code: String },
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction. If the
/// trimmed result is empty, construction fails with [`TextError::Empty`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the input is empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Reference string understood by the concept directory.
///
/// A reference is either a single concept id (`"a8a666ba-..."`) or a comma-separated list of
/// `source:code` mapping pairs (`"CIEL:1065,SNOMED CT:373066001"`). The directory treats the
/// pairs as alternatives and returns every concept matching any of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConceptReference(String);

impl ConceptReference {
    /// Reference a concept directly by its id.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if `concept` is blank.
    pub fn from_concept(concept: impl AsRef<str>) -> Result<Self, TextError> {
        NonEmptyText::new(concept).map(|text| Self(text.into_string()))
    }

    /// Build a reference from `(source, code)` mapping pairs.
    ///
    /// Returns `Ok(None)` when there are no pairs at all.
    ///
    /// # Errors
    ///
    /// Returns `TextError::IncompleteMapping` if any pair has a blank source or code.
    pub fn from_mappings<I, S, C>(pairs: I) -> Result<Option<Self>, TextError>
    where
        I: IntoIterator<Item = (S, C)>,
        S: AsRef<str>,
        C: AsRef<str>,
    {
        let mut parts = Vec::new();
        for (source, code) in pairs {
            let (source, code) = (source.as_ref().trim(), code.as_ref().trim());
            if source.is_empty() || code.is_empty() {
                return Err(TextError::IncompleteMapping {
                    system: source.to_owned(),
                    code: code.to_owned(),
                });
            }
            parts.push(format!("{source}:{code}"));
        }

        if parts.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self(parts.join(","))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConceptReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConceptReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
