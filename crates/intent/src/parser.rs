use crate::lexicon::Lexicon;
use darshan_corpus::StateLibrary;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Who the text is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    #[serde(rename = "self")]
    Oneself,
    Other,
    General,
}

/// Coarse topic of the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    General,
    Love,
    Career,
    Year,
    Health,
    Spirituality,
}

impl Theme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Theme::General => "general",
            Theme::Love => "love",
            Theme::Career => "career",
            Theme::Year => "year",
            Theme::Health => "health",
            Theme::Spirituality => "spirituality",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateCandidate {
    pub state_key: String,
    pub score: f32,
}

/// Signals extracted from one free-text input. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedIntent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verb_class: Option<String>,
    pub subject: Subject,
    pub theme: Theme,
    pub emotion_labels: Vec<String>,
    pub state_candidates: Vec<StateCandidate>,
}

/// Rule-based intent parser over a lexicon and a state library.
pub struct IntentParser {
    lexicon: Lexicon,
    states: StateLibrary,
}

impl IntentParser {
    pub fn new(lexicon: Lexicon, states: StateLibrary) -> Self {
        Self { lexicon, states }
    }

    #[must_use]
    pub fn states(&self) -> &StateLibrary {
        &self.states
    }

    /// Extracts intent signals from free text.
    ///
    /// `None` input, empty input, and whitespace-only input all yield `None`
    /// rather than an error.
    #[must_use]
    pub fn parse(&self, text: Option<&str>) -> Option<ParsedIntent> {
        let text = text?.trim();
        if text.is_empty() {
            return None;
        }

        let normalized = text.to_lowercase();
        let tokens: Vec<String> = normalized
            .unicode_words()
            .map(|w| w.to_string())
            .collect();
        let token_set: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        let matches =
            |keyword: &str| -> bool { keyword_matches(keyword, &normalized, &token_set) };

        // First matching rule wins, in lexicon declaration order.
        let verb_class = self
            .lexicon
            .verb_classes
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| matches(k)))
            .map(|rule| rule.class.clone());

        let theme = self
            .lexicon
            .themes
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| matches(k)))
            .map(|rule| rule.theme)
            .unwrap_or(Theme::General);

        let emotion_labels: Vec<String> = self
            .lexicon
            .emotions
            .iter()
            .filter(|rule| rule.keywords.iter().any(|k| matches(k)))
            .map(|rule| rule.label.clone())
            .collect();

        let subject = self.detect_subject(&tokens);
        let state_candidates =
            score_candidates(&self.states, verb_class.as_deref(), theme, &emotion_labels);

        Some(ParsedIntent {
            verb_class,
            subject,
            theme,
            emotion_labels,
            state_candidates,
        })
    }

    fn detect_subject(&self, tokens: &[String]) -> Subject {
        let count = |markers: &[String]| {
            tokens
                .iter()
                .filter(|t| markers.iter().any(|m| m == *t))
                .count()
        };
        let self_count = count(&self.lexicon.subjects.self_markers);
        let other_count = count(&self.lexicon.subjects.other_markers);

        if self_count > 0 && self_count >= other_count {
            Subject::Oneself
        } else if other_count > 0 {
            Subject::Other
        } else {
            Subject::General
        }
    }
}

/// Multi-word phrases match as substrings of the normalized text; single
/// keywords require a whole-token match so that e.g. "ano" does not fire
/// inside "americano".
fn keyword_matches(keyword: &str, normalized: &str, token_set: &HashSet<&str>) -> bool {
    if keyword.contains(char::is_whitespace) {
        normalized.contains(keyword)
    } else {
        token_set.contains(keyword)
    }
}

/// Scores every state against the extracted signals.
///
/// Score = declared verb-class weight + theme weight + sum of matched
/// emotion weights. Only positive scores survive; the sort is stable, so
/// equal scores keep state declaration order.
fn score_candidates(
    states: &StateLibrary,
    verb_class: Option<&str>,
    theme: Theme,
    emotion_labels: &[String],
) -> Vec<StateCandidate> {
    let mut candidates: Vec<StateCandidate> = states
        .states()
        .iter()
        .filter_map(|state| {
            let mut score = 0.0f32;
            if let Some(class) = verb_class {
                score += state.indicators.verb_classes.get(class).copied().unwrap_or(0.0);
            }
            score += state
                .indicators
                .themes
                .get(theme.as_str())
                .copied()
                .unwrap_or(0.0);
            for label in emotion_labels {
                score += state
                    .indicators
                    .emotions
                    .get(label.as_str())
                    .copied()
                    .unwrap_or(0.0);
            }
            (score > 0.0).then(|| StateCandidate {
                state_key: state.key.clone(),
                score,
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use darshan_corpus::StateLibrary;
    use pretty_assertions::assert_eq;

    fn parser() -> IntentParser {
        IntentParser::new(
            Lexicon::builtin().unwrap(),
            StateLibrary::builtin().unwrap(),
        )
    }

    #[test]
    fn empty_and_blank_input_parse_to_none() {
        let p = parser();
        assert!(p.parse(None).is_none());
        assert!(p.parse(Some("")).is_none());
        assert!(p.parse(Some("   \n\t ")).is_none());
    }

    #[test]
    fn fear_of_losing_a_relationship() {
        let p = parser();
        let intent = p
            .parse(Some("Tenho medo de perder meu relacionamento"))
            .unwrap();

        assert_eq!(intent.verb_class.as_deref(), Some("fear"));
        assert_eq!(intent.subject, Subject::Oneself);
        assert_eq!(intent.theme, Theme::Love);
        assert!(intent.emotion_labels.contains(&"fear".to_string()));
        assert!(!intent.state_candidates.is_empty());

        let top = &intent.state_candidates[0].state_key;
        assert!(
            ["anxiety", "relational_insecurity", "avoidance"].contains(&top.as_str()),
            "unexpected top state: {top}"
        );
    }

    #[test]
    fn verb_class_priority_is_declaration_order() {
        // "medo" (fear) and "perder" (loss) both match; fear is declared
        // first and must win.
        let p = parser();
        let intent = p.parse(Some("medo de perder tudo")).unwrap();
        assert_eq!(intent.verb_class.as_deref(), Some("fear"));
    }

    #[test]
    fn theme_defaults_to_general() {
        let p = parser();
        let intent = p.parse(Some("medo de tudo")).unwrap();
        assert_eq!(intent.theme, Theme::General);
    }

    #[test]
    fn third_person_text_is_subject_other() {
        let p = parser();
        let intent = p.parse(Some("ela sente medo do futuro")).unwrap();
        assert_eq!(intent.subject, Subject::Other);
    }

    #[test]
    fn neutral_text_is_subject_general() {
        let p = parser();
        let intent = p.parse(Some("medo do futuro")).unwrap();
        assert_eq!(intent.subject, Subject::General);
    }

    #[test]
    fn single_word_keywords_do_not_match_inside_words() {
        let p = parser();
        // "americano" contains "ano" but must not trigger the year theme.
        let intent = p.parse(Some("medo do sonho americano")).unwrap();
        assert_eq!(intent.theme, Theme::General);
    }

    #[test]
    fn candidates_are_sorted_descending() {
        let p = parser();
        let intent = p
            .parse(Some("Tenho medo de perder meu relacionamento"))
            .unwrap();
        let scores: Vec<f32> = intent.state_candidates.iter().map(|c| c.score).collect();
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert_eq!(scores, sorted);
    }

    #[test]
    fn english_input_is_understood() {
        let p = parser();
        let intent = p.parse(Some("I am afraid of losing my job")).unwrap();
        assert_eq!(intent.verb_class.as_deref(), Some("fear"));
        assert_eq!(intent.theme, Theme::Career);
        assert_eq!(intent.subject, Subject::Oneself);
    }
}
