use darshan_corpus::{ContemplativeQuestion, ContextVerse, FoodGuidance, Practice, SourceCorpus};
use darshan_intent::Theme;
use serde::{Deserialize, Serialize};

/// Caller-supplied birth data. Everything is optional; an empty profile in
/// personal mode simply produces no insight.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
}

impl Profile {
    /// A profile is usable for insight when it names the person or dates
    /// their birth.
    #[must_use]
    pub fn has_insight_material(&self) -> bool {
        self.full_name.as_deref().is_some_and(|s| !s.trim().is_empty())
            || self.birth_date.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Universal,
    Personal,
}

/// Composition inputs beyond the profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposeOptions {
    /// Deterministic selection seed; `None` draws at random.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Free-text question driving state resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Composite sacred keys to rotate away from.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_sacred_ids: Vec<String>,
    /// State keys to rotate away from.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_state_keys: Vec<String>,
    /// Pins `meta.generated_at_ms`; without it the wall clock is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    pub klesha: String,
    pub samkhya_guna: String,
    pub qualities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SacredSection {
    pub id: String,
    pub corpus: SourceCorpus,
    pub text: String,
    /// Neighboring verses attached when the primary verse opens mid-argument.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supporting: Option<Vec<ContextVerse>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageMeta {
    pub generated_at_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_sacred_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_state_keys: Option<Vec<String>>,
}

/// The canonical output bundle: one sacred text, one diagnosed state, and
/// the state's prescribed practice/food/question content.
#[derive(Debug, Clone, Serialize)]
pub struct TruthPackage {
    pub mode: Mode,
    pub theme: Theme,
    pub state_key: String,
    pub diagnosis: Diagnosis,
    pub sacred: SacredSection,
    pub practice: Practice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food: Option<FoodGuidance>,
    pub contemplative_question: ContemplativeQuestion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight: Option<String>,
    pub meta: PackageMeta,
    /// Flat mirror of `sacred.text` kept for older clients.
    pub sacred_text: String,
    /// Flat mirror of the composite sacred key kept for older clients.
    pub sacred_id: String,
}
