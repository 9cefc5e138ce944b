//! Validator configuration.
//!
//! Configuration is resolved once by the caller (from defaults, a YAML file, and optionally a
//! process-level timeout override) and then passed into [`crate::SchemaValidator`] behind an
//! `Arc`. Nothing in this crate reads environment variables while validating.

use crate::constants::{
    BOOLEAN_FALSE_CONCEPT, BOOLEAN_TRUE_CONCEPT, CONCEPT_EXEMPT_RENDERINGS,
    DEFAULT_DATATYPE_RENDERINGS, LOOKUP_TIMEOUT_ENV,
};
use crate::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Validator configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorConfig {
    datatype_renderings: BTreeMap<String, Vec<String>>,
    boolean_true_concept: String,
    boolean_false_concept: String,
    concept_exempt_renderings: Vec<String>,
    lookup_timeout: Option<Duration>,
}

/// On-disk form of [`ValidatorConfig`]. Every key is optional and falls back to the default.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ValidatorConfigFile {
    #[serde(default)]
    data_type_to_rendering_map: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    boolean_true_concept: Option<String>,
    #[serde(default)]
    boolean_false_concept: Option<String>,
    #[serde(default)]
    concept_exempt_renderings: Option<Vec<String>>,
    #[serde(default)]
    lookup_timeout_ms: Option<u64>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            datatype_renderings: default_datatype_renderings(),
            boolean_true_concept: BOOLEAN_TRUE_CONCEPT.to_owned(),
            boolean_false_concept: BOOLEAN_FALSE_CONCEPT.to_owned(),
            concept_exempt_renderings: CONCEPT_EXEMPT_RENDERINGS
                .iter()
                .map(|r| (*r).to_owned())
                .collect(),
            lookup_timeout: None,
        }
    }
}

impl ValidatorConfig {
    /// Create a new `ValidatorConfig`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` if either boolean concept id is blank or both ids
    /// are the same. A zero `lookup_timeout` means no timeout.
    pub fn new(
        datatype_renderings: BTreeMap<String, Vec<String>>,
        boolean_true_concept: String,
        boolean_false_concept: String,
        concept_exempt_renderings: Vec<String>,
        lookup_timeout: Option<Duration>,
    ) -> EngineResult<Self> {
        let boolean_true_concept = boolean_true_concept.trim().to_owned();
        let boolean_false_concept = boolean_false_concept.trim().to_owned();

        if boolean_true_concept.is_empty() || boolean_false_concept.is_empty() {
            return Err(EngineError::InvalidInput(
                "boolean concept ids cannot be empty".into(),
            ));
        }
        if boolean_true_concept == boolean_false_concept {
            return Err(EngineError::InvalidInput(
                "boolean true and false concepts must differ".into(),
            ));
        }

        Ok(Self {
            datatype_renderings,
            boolean_true_concept,
            boolean_false_concept,
            concept_exempt_renderings,
            lookup_timeout: lookup_timeout.filter(|t| !t.is_zero()),
        })
    }

    /// Parse a configuration from YAML. Missing keys take their default values.
    pub fn from_yaml_str(yaml_text: &str) -> EngineResult<Self> {
        let file: ValidatorConfigFile =
            serde_yaml::from_str(yaml_text).map_err(EngineError::YamlDeserialization)?;
        let defaults = Self::default();

        Self::new(
            file.data_type_to_rendering_map
                .unwrap_or(defaults.datatype_renderings),
            file.boolean_true_concept
                .unwrap_or(defaults.boolean_true_concept),
            file.boolean_false_concept
                .unwrap_or(defaults.boolean_false_concept),
            file.concept_exempt_renderings
                .unwrap_or(defaults.concept_exempt_renderings),
            file.lookup_timeout_ms.map(Duration::from_millis),
        )
    }

    pub fn from_yaml_file(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(EngineError::FileRead)?;
        Self::from_yaml_str(&text)
    }

    /// Render the configuration as YAML, in the same shape [`Self::from_yaml_str`] reads.
    pub fn to_yaml(&self) -> EngineResult<String> {
        let file = ValidatorConfigFile {
            data_type_to_rendering_map: Some(self.datatype_renderings.clone()),
            boolean_true_concept: Some(self.boolean_true_concept.clone()),
            boolean_false_concept: Some(self.boolean_false_concept.clone()),
            concept_exempt_renderings: Some(self.concept_exempt_renderings.clone()),
            lookup_timeout_ms: self
                .lookup_timeout
                .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
        };
        serde_yaml::to_string(&file).map_err(EngineError::YamlSerialization)
    }

    /// Replace the lookup timeout, typically with a value from
    /// [`lookup_timeout_from_env_value`].
    pub fn with_lookup_timeout(mut self, lookup_timeout: Option<Duration>) -> Self {
        self.lookup_timeout = lookup_timeout.filter(|t| !t.is_zero());
        self
    }

    /// Apply the `FORM_LOOKUP_TIMEOUT_MS` override, if the variable is set.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` if the variable is not a whole number.
    pub fn with_env_overrides(self) -> EngineResult<Self> {
        match std::env::var(LOOKUP_TIMEOUT_ENV).ok() {
            Some(value) => {
                let lookup_timeout = lookup_timeout_from_env_value(Some(value))?;
                Ok(self.with_lookup_timeout(lookup_timeout))
            }
            None => Ok(self),
        }
    }

    /// Renderings allowed for a datatype, or `None` if the datatype is not tracked at all.
    pub fn allowed_renderings(&self, datatype: &str) -> Option<&[String]> {
        self.datatype_renderings.get(datatype).map(Vec::as_slice)
    }

    pub fn datatype_renderings(&self) -> &BTreeMap<String, Vec<String>> {
        &self.datatype_renderings
    }

    pub fn is_boolean_answer(&self, concept: &str) -> bool {
        concept == self.boolean_true_concept || concept == self.boolean_false_concept
    }

    pub fn boolean_concepts(&self) -> (&str, &str) {
        (&self.boolean_true_concept, &self.boolean_false_concept)
    }

    pub fn is_concept_exempt(&self, rendering: Option<&str>) -> bool {
        rendering.is_some_and(|r| self.concept_exempt_renderings.iter().any(|e| e == r))
    }

    pub fn lookup_timeout(&self) -> Option<Duration> {
        self.lookup_timeout
    }
}

fn default_datatype_renderings() -> BTreeMap<String, Vec<String>> {
    DEFAULT_DATATYPE_RENDERINGS
        .iter()
        .map(|(datatype, renderings)| {
            (
                (*datatype).to_owned(),
                renderings.iter().map(|r| (*r).to_owned()).collect(),
            )
        })
        .collect()
}

/// Parse the per-lookup timeout from an optional millisecond value.
///
/// `None`, empty/whitespace and `0` all mean "no timeout".
pub fn lookup_timeout_from_env_value(value: Option<String>) -> EngineResult<Option<Duration>> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let millis = value
        .map(|v| {
            v.parse::<u64>().map_err(|_| {
                EngineError::InvalidInput(format!(
                    "lookup timeout must be a whole number of milliseconds, got {v:?}"
                ))
            })
        })
        .transpose()?;

    Ok(millis.filter(|ms| *ms > 0).map(Duration::from_millis))
}
