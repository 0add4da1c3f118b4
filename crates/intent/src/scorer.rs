use crate::parser::ParsedIntent;
use darshan_corpus::FALLBACK_STATE_KEY;

/// Picks the best-matching state key from a parsed intent.
///
/// `None` intent stays `None` (nothing to score). An intent whose candidate
/// list is empty falls back to `confusion` — unreadable input still deserves
/// an answer.
#[must_use]
pub fn score_state(intent: Option<&ParsedIntent>) -> Option<&str> {
    let intent = intent?;
    match intent.state_candidates.first() {
        Some(top) => Some(top.state_key.as_str()),
        None => Some(FALLBACK_STATE_KEY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParsedIntent, Subject, Theme};

    fn intent_without_candidates() -> ParsedIntent {
        ParsedIntent {
            verb_class: None,
            subject: Subject::General,
            theme: Theme::General,
            emotion_labels: Vec::new(),
            state_candidates: Vec::new(),
        }
    }

    #[test]
    fn none_intent_scores_none() {
        assert_eq!(score_state(None), None);
    }

    #[test]
    fn empty_candidates_fall_back_to_confusion() {
        let intent = intent_without_candidates();
        assert_eq!(score_state(Some(&intent)), Some("confusion"));
    }

    #[test]
    fn top_candidate_wins() {
        use crate::parser::StateCandidate;
        let mut intent = intent_without_candidates();
        intent.state_candidates = vec![
            StateCandidate {
                state_key: "anxiety".to_string(),
                score: 5.0,
            },
            StateCandidate {
                state_key: "avoidance".to_string(),
                score: 1.0,
            },
        ];
        assert_eq!(score_state(Some(&intent)), Some("anxiety"));
    }
}
