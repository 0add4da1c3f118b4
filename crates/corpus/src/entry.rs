use serde::{Deserialize, Serialize};
use std::fmt;

/// Source collection a sacred entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCorpus {
    YogaSutras,
    Upanishads,
    Puranas,
    Legacy,
}

impl SourceCorpus {
    pub const fn as_str(self) -> &'static str {
        match self {
            SourceCorpus::YogaSutras => "yoga_sutras",
            SourceCorpus::Upanishads => "upanishads",
            SourceCorpus::Puranas => "puranas",
            SourceCorpus::Legacy => "legacy",
        }
    }
}

impl fmt::Display for SourceCorpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable verse/aphorism of the corpus.
///
/// The id is unique within the whole pack (e.g. `YS.1.1`); the externally
/// visible identity is the composite key `{corpus}.{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SacredEntry {
    pub id: String,
    pub corpus: SourceCorpus,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SacredEntry {
    #[must_use]
    pub fn composite_key(&self) -> String {
        format!("{}.{}", self.corpus, self.id)
    }

    /// True when any of `wanted` appears in this entry's tags.
    #[must_use]
    pub fn has_any_tag<S: AsRef<str>>(&self, wanted: &[S]) -> bool {
        wanted
            .iter()
            .any(|w| self.tags.iter().any(|t| t == w.as_ref()))
    }
}
