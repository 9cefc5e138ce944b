//! Concept and identifier-type directories.
//!
//! The validator cross-checks questions against two backend services. How those services are
//! reached (REST, a local dictionary dump, a cache) is up to the caller; this module defines
//! the request/response contract as async traits and ships an in-memory implementation used
//! for offline linting and tests.

use async_trait::async_trait;
use form_types::ConceptReference;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Datatype of a concept, e.g. `Coded`, `Numeric`, `Boolean`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptDatatype {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptAnswer {
    pub uuid: String,
    #[serde(default)]
    pub display: String,
}

/// A `source:code` term the concept is mapped to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptMappingTerm {
    pub source: String,
    pub code: String,
}

impl ConceptMappingTerm {
    pub fn reference_key(&self) -> String {
        format!("{}:{}", self.source, self.code)
    }
}

/// A concept as returned by the concept directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub uuid: String,
    #[serde(default)]
    pub display: String,
    pub datatype: ConceptDatatype,
    #[serde(default)]
    pub answers: Vec<ConceptAnswer>,
    #[serde(default)]
    pub mappings: Vec<ConceptMappingTerm>,
}

impl Concept {
    pub fn new(uuid: impl Into<String>, display: impl Into<String>, datatype: &str) -> Self {
        Self {
            uuid: uuid.into(),
            display: display.into(),
            datatype: ConceptDatatype {
                name: datatype.to_owned(),
            },
            answers: Vec::new(),
            mappings: Vec::new(),
        }
    }

    pub fn with_answer(mut self, uuid: impl Into<String>, display: impl Into<String>) -> Self {
        self.answers.push(ConceptAnswer {
            uuid: uuid.into(),
            display: display.into(),
        });
        self
    }

    pub fn with_mapping(mut self, source: impl Into<String>, code: impl Into<String>) -> Self {
        self.mappings.push(ConceptMappingTerm {
            source: source.into(),
            code: code.into(),
        });
        self
    }

    pub fn has_answer(&self, uuid: &str) -> bool {
        self.answers.iter().any(|answer| answer.uuid == uuid)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierType {
    pub uuid: String,
    #[serde(default)]
    pub display: String,
}

/// Failure to obtain an answer from a directory.
///
/// A lookup error means "we could not ask", never "the thing does not exist"; absence is
/// reported as an empty or `None` result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("lookup transport failed: {0}")]
    Transport(String),
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("lookup returned an invalid response: {0}")]
    InvalidResponse(String),
}

pub type LookupResult<T> = Result<T, LookupError>;

#[async_trait]
pub trait ConceptDirectory: Send + Sync {
    /// Every concept matching `reference`. An empty list means nothing matched.
    async fn lookup_concepts_by_reference(
        &self,
        reference: &ConceptReference,
    ) -> LookupResult<Vec<Concept>>;
}

#[async_trait]
pub trait IdentifierTypeDirectory: Send + Sync {
    /// The identifier type with this uuid, or `None` if there is none.
    async fn lookup_identifier_type(&self, uuid: &str) -> LookupResult<Option<IdentifierType>>;
}

/// Serialised contents of an [`InMemoryDirectory`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub concepts: Vec<Concept>,
    #[serde(default)]
    pub identifier_types: Vec<IdentifierType>,
}

/// Directory backed by maps held in memory.
///
/// Concepts resolve by uuid and by any of their `source:code` mappings.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDirectory {
    concepts: HashMap<String, Concept>,
    mapping_index: HashMap<String, String>,
    identifier_types: HashMap<String, IdentifierType>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concept(mut self, concept: Concept) -> Self {
        self.insert_concept(concept);
        self
    }

    pub fn with_identifier_type(mut self, identifier_type: IdentifierType) -> Self {
        self.identifier_types
            .insert(identifier_type.uuid.clone(), identifier_type);
        self
    }

    pub fn insert_concept(&mut self, concept: Concept) {
        for mapping in &concept.mappings {
            self.mapping_index
                .insert(mapping.reference_key(), concept.uuid.clone());
        }
        self.concepts.insert(concept.uuid.clone(), concept);
    }

    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        let mut directory = Self::new();
        for concept in snapshot.concepts {
            directory.insert_concept(concept);
        }
        for identifier_type in snapshot.identifier_types {
            directory = directory.with_identifier_type(identifier_type);
        }
        directory
    }

    /// Load a directory from a YAML snapshot (`concepts:` and `identifierTypes:` lists).
    pub fn from_yaml_str(yaml_text: &str) -> crate::EngineResult<Self> {
        let snapshot: DirectorySnapshot =
            serde_yaml::from_str(yaml_text).map_err(crate::EngineError::YamlDeserialization)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    fn resolve(&self, reference: &ConceptReference) -> Vec<Concept> {
        let mut matched: Vec<Concept> = Vec::new();
        for part in reference.as_str().split(',').map(str::trim) {
            let uuid = if self.concepts.contains_key(part) {
                Some(part)
            } else {
                self.mapping_index.get(part).map(String::as_str)
            };

            if let Some(concept) = uuid.and_then(|uuid| self.concepts.get(uuid)) {
                if !matched.iter().any(|m| m.uuid == concept.uuid) {
                    matched.push(concept.clone());
                }
            }
        }
        matched
    }
}

#[async_trait]
impl ConceptDirectory for InMemoryDirectory {
    async fn lookup_concepts_by_reference(
        &self,
        reference: &ConceptReference,
    ) -> LookupResult<Vec<Concept>> {
        Ok(self.resolve(reference))
    }
}

#[async_trait]
impl IdentifierTypeDirectory for InMemoryDirectory {
    async fn lookup_identifier_type(&self, uuid: &str) -> LookupResult<Option<IdentifierType>> {
        Ok(self.identifier_types.get(uuid).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(text: &str) -> ConceptReference {
        ConceptReference::from_concept(text).expect("valid reference")
    }

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::new()
            .with_concept(
                Concept::new("1065AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", "Yes", "N/A")
                    .with_mapping("CIEL", "1065"),
            )
            .with_concept(
                Concept::new("5089AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", "Weight (kg)", "Numeric")
                    .with_mapping("CIEL", "5089")
                    .with_mapping("LOINC", "3141-9"),
            )
            .with_identifier_type(IdentifierType {
                uuid: "05a29f94-c0ed-11e2-94be-8c13b969e334".into(),
                display: "OpenMRS ID".into(),
            })
    }

    #[tokio::test]
    async fn resolves_by_uuid_and_mapping() {
        let directory = directory();
        let by_uuid = directory
            .lookup_concepts_by_reference(&reference("5089AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"))
            .await
            .expect("lookup");
        assert_eq!(by_uuid.len(), 1);
        assert_eq!(by_uuid[0].datatype.name, "Numeric");

        let by_mapping = directory
            .lookup_concepts_by_reference(&reference("LOINC:3141-9"))
            .await
            .expect("lookup");
        assert_eq!(by_mapping[0].uuid, "5089AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
    }

    #[tokio::test]
    async fn joined_reference_matches_each_concept_once() {
        let directory = directory();
        let reference = ConceptReference::from_mappings([
            ("CIEL", "5089"),
            ("LOINC", "3141-9"),
            ("CIEL", "1065"),
            ("CIEL", "99999"),
        ])
        .expect("valid mappings")
        .expect("non-empty");

        let found = directory
            .lookup_concepts_by_reference(&reference)
            .await
            .expect("lookup");
        let uuids: Vec<&str> = found.iter().map(|c| c.uuid.as_str()).collect();
        assert_eq!(
            uuids,
            vec![
                "5089AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
                "1065AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
            ]
        );
    }

    #[tokio::test]
    async fn unknown_reference_is_empty_not_an_error() {
        let found = directory()
            .lookup_concepts_by_reference(&reference("CIEL:1"))
            .await
            .expect("lookup");
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn identifier_type_lookup() {
        let directory = directory();
        let found = directory
            .lookup_identifier_type("05a29f94-c0ed-11e2-94be-8c13b969e334")
            .await
            .expect("lookup");
        assert_eq!(found.map(|t| t.display), Some("OpenMRS ID".to_string()));
        assert_eq!(
            directory.lookup_identifier_type("missing").await.expect("lookup"),
            None
        );
    }

    #[test]
    fn loads_yaml_snapshot() {
        let yaml = r#"
concepts:
  - uuid: 1065AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA
    display: "Yes"
    datatype: { name: N/A }
  - uuid: 1066AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA
    display: "No"
    datatype: { name: N/A }
    mappings:
      - { source: CIEL, code: "1066" }
identifierTypes:
  - uuid: 05a29f94-c0ed-11e2-94be-8c13b969e334
    display: OpenMRS ID
"#;
        let directory = InMemoryDirectory::from_yaml_str(yaml).expect("load snapshot");
        assert_eq!(directory.concept_count(), 2);
        assert_eq!(
            directory.resolve(&reference("CIEL:1066"))[0].display,
            "No"
        );
    }

    #[test]
    fn rejects_unknown_snapshot_keys() {
        let err = InMemoryDirectory::from_yaml_str("locations: []\n").expect_err("unknown key");
        assert!(matches!(err, crate::EngineError::YamlDeserialization(_)));
    }
}
