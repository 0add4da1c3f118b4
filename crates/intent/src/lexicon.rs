use crate::error::{IntentError, Result};
use crate::parser::Theme;
use serde::Deserialize;

pub const LEXICON_SCHEMA_VERSION: u32 = 1;

const BUILTIN_LEXICON: &str = include_str!("../../../content/lexicon.json");

/// One verb class and the keywords/phrases that trigger it.
#[derive(Debug, Clone, Deserialize)]
pub struct VerbClassRule {
    pub class: String,
    pub keywords: Vec<String>,
}

/// First- vs second/third-person marker tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectMarkers {
    #[serde(rename = "self")]
    pub self_markers: Vec<String>,
    #[serde(rename = "other")]
    pub other_markers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThemeRule {
    pub theme: Theme,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmotionRule {
    pub label: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PersistedLexicon {
    schema_version: u32,
    verb_classes: Vec<VerbClassRule>,
    subjects: SubjectMarkers,
    themes: Vec<ThemeRule>,
    emotions: Vec<EmotionRule>,
}

/// The keyword lexicon, declaration order preserved.
///
/// Rule order is the tie-break: the first verb class / theme whose keyword
/// matches wins, and emotion labels come out in scan order.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub(crate) verb_classes: Vec<VerbClassRule>,
    pub(crate) subjects: SubjectMarkers,
    pub(crate) themes: Vec<ThemeRule>,
    pub(crate) emotions: Vec<EmotionRule>,
}

impl Lexicon {
    /// Loads the compiled-in lexicon pack.
    pub fn builtin() -> Result<Self> {
        Self::from_bytes(BUILTIN_LEXICON.as_bytes())
    }

    /// Loads a lexicon pack from raw JSON bytes (runtime override).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let persisted: PersistedLexicon = serde_json::from_slice(bytes)?;
        if persisted.schema_version != LEXICON_SCHEMA_VERSION {
            return Err(IntentError::SchemaVersion {
                found: persisted.schema_version,
                expected: LEXICON_SCHEMA_VERSION,
            });
        }
        if persisted.verb_classes.is_empty() {
            return Err(IntentError::EmptySection("verb_classes"));
        }
        if persisted.themes.is_empty() {
            return Err(IntentError::EmptySection("themes"));
        }
        if persisted.emotions.is_empty() {
            return Err(IntentError::EmptySection("emotions"));
        }

        log::debug!(
            "Loaded lexicon: {} verb classes, {} themes, {} emotions",
            persisted.verb_classes.len(),
            persisted.themes.len(),
            persisted.emotions.len()
        );
        Ok(Self {
            verb_classes: persisted.verb_classes,
            subjects: persisted.subjects,
            themes: persisted.themes,
            emotions: persisted.emotions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lexicon_loads() {
        let lexicon = Lexicon::builtin().unwrap();
        assert!(lexicon.verb_classes.iter().any(|r| r.class == "fear"));
        assert!(!lexicon.subjects.self_markers.is_empty());
    }

    #[test]
    fn rejects_unknown_schema_version() {
        let raw = br#"{"schema_version": 2, "verb_classes": [], "subjects": {"self": [], "other": []}, "themes": [], "emotions": []}"#;
        assert!(matches!(
            Lexicon::from_bytes(raw).unwrap_err(),
            IntentError::SchemaVersion { found: 2, .. }
        ));
    }

    #[test]
    fn rejects_empty_sections() {
        let raw = br#"{"schema_version": 1, "verb_classes": [], "subjects": {"self": [], "other": []}, "themes": [], "emotions": []}"#;
        assert!(matches!(
            Lexicon::from_bytes(raw).unwrap_err(),
            IntentError::EmptySection("verb_classes")
        ));
    }
}
