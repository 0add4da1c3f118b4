use crate::error::{CorpusError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub const STATES_SCHEMA_VERSION: u32 = 1;

/// State the scorer falls back to when nothing else scores.
pub const FALLBACK_STATE_KEY: &str = "confusion";

const BUILTIN_STATES: &str = include_str!("../../../content/states.json");

/// Per-state signal weights consumed by the intent scorer.
///
/// `BTreeMap` keeps iteration deterministic across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateIndicators {
    #[serde(default)]
    pub verb_classes: BTreeMap<String, f32>,
    #[serde(default)]
    pub themes: BTreeMap<String, f32>,
    #[serde(default)]
    pub emotions: BTreeMap<String, f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Practice {
    pub title: String,
    pub steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodGuidance {
    #[serde(rename = "do")]
    pub recommended: Vec<String>,
    pub avoid: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContemplativeQuestion {
    pub text: String,
}

/// One remedy bundle plus its diagnosis associations and scoring indicators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemedyState {
    pub key: String,
    pub klesha: String,
    pub guna: String,
    #[serde(default)]
    pub qualities: Vec<String>,
    #[serde(default)]
    pub indicators: StateIndicators,
    pub practice: Practice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food: Option<FoodGuidance>,
    pub question: ContemplativeQuestion,
}

impl RemedyState {
    /// Tag filters for sacred-text selection: the state's klesha plus its
    /// quality associations.
    #[must_use]
    pub fn selection_filters(&self) -> (Vec<String>, Vec<String>) {
        (vec![self.klesha.clone()], self.qualities.clone())
    }
}

#[derive(Debug, Deserialize)]
struct PersistedStates {
    schema_version: u32,
    states: Vec<RemedyState>,
}

/// The remedy-state library, in declaration order.
///
/// Declaration order is load-bearing: it is the documented tie-break for
/// equally-scored states.
#[derive(Debug, Clone)]
pub struct StateLibrary {
    states: Vec<RemedyState>,
}

impl StateLibrary {
    /// Loads the compiled-in state pack.
    pub fn builtin() -> Result<Self> {
        Self::from_bytes(BUILTIN_STATES.as_bytes())
    }

    /// Loads a state pack from raw JSON bytes (runtime override).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let persisted: PersistedStates = serde_json::from_slice(bytes)?;
        if persisted.schema_version != STATES_SCHEMA_VERSION {
            return Err(CorpusError::SchemaVersion {
                found: persisted.schema_version,
                expected: STATES_SCHEMA_VERSION,
            });
        }
        if persisted.states.is_empty() {
            return Err(CorpusError::Empty);
        }

        let mut seen = HashSet::with_capacity(persisted.states.len());
        for state in &persisted.states {
            if !seen.insert(state.key.clone()) {
                return Err(CorpusError::DuplicateState(state.key.clone()));
            }
        }
        if !seen.contains(FALLBACK_STATE_KEY) {
            return Err(CorpusError::MissingFallbackState(FALLBACK_STATE_KEY));
        }

        log::debug!("Loaded state library: {} states", persisted.states.len());
        Ok(Self {
            states: persisted.states,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// States in declaration order.
    #[must_use]
    pub fn states(&self) -> &[RemedyState] {
        &self.states
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RemedyState> {
        self.states.iter().find(|s| s.key == key)
    }

    /// Declaration-order index of a state key (tie-break rank).
    #[must_use]
    pub fn declaration_index(&self, key: &str) -> Option<usize> {
        self.states.iter().position(|s| s.key == key)
    }
}
