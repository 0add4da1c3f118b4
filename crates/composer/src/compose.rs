use crate::insight::personal_insight;
use crate::model::{
    ComposeOptions, Diagnosis, Mode, PackageMeta, Profile, SacredSection, TruthPackage,
};
use darshan_corpus::{CorpusError, SacredCorpus, StateLibrary, FALLBACK_STATE_KEY};
use darshan_intent::{IntentError, IntentParser, Lexicon, Theme};
use darshan_selection::{select_sacred_text, SelectOptions, SelectionError};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ComposeError>;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Content error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Lexicon error: {0}")]
    Lexicon(#[from] IntentError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// A scored state key without a library entry is a content-pack bug,
    /// surfaced loudly instead of silently swallowed.
    #[error("State '{0}' has no remedy entry in the state library")]
    UnknownState(String),
}

/// Orchestrates corpus, intent, and selection into Truth Packages.
pub struct Composer {
    corpus: SacredCorpus,
    parser: IntentParser,
}

impl Composer {
    pub fn new(corpus: SacredCorpus, states: StateLibrary, lexicon: Lexicon) -> Self {
        Self {
            corpus,
            parser: IntentParser::new(lexicon, states),
        }
    }

    /// Builds a composer over the compiled-in content packs.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(
            SacredCorpus::builtin()?,
            StateLibrary::builtin()?,
            Lexicon::builtin()?,
        ))
    }

    #[must_use]
    pub fn corpus(&self) -> &SacredCorpus {
        &self.corpus
    }

    #[must_use]
    pub fn parser(&self) -> &IntentParser {
        &self.parser
    }

    #[must_use]
    pub fn states(&self) -> &StateLibrary {
        self.parser.states()
    }

    /// Composes one Truth Package.
    ///
    /// Fixing `profile` and `options` (seed, question, avoid lists, `now_ms`)
    /// fixes every field of the output.
    pub fn compose(
        &self,
        profile: Option<&Profile>,
        options: &ComposeOptions,
    ) -> Result<TruthPackage> {
        let recent_states: HashSet<&str> = options
            .recent_state_keys
            .iter()
            .map(String::as_str)
            .collect();

        let intent = options
            .question
            .as_deref()
            .and_then(|q| self.parser.parse(Some(q)));

        let (state_key, confidence, theme) = match &intent {
            Some(intent) if !intent.state_candidates.is_empty() => {
                let candidates = &intent.state_candidates;
                // Skip recently used states while an alternative still
                // scores; if everything is recent, repetition wins.
                let pick = candidates
                    .iter()
                    .find(|c| !recent_states.contains(c.state_key.as_str()))
                    .unwrap_or(&candidates[0]);
                let total: f32 = candidates.iter().map(|c| c.score).sum();
                let confidence = (total > 0.0).then(|| pick.score / total);
                (pick.state_key.clone(), confidence, intent.theme)
            }
            Some(intent) => (FALLBACK_STATE_KEY.to_string(), None, intent.theme),
            None => {
                let key = self.default_state_key(&recent_states, options.seed);
                (key, None, Theme::General)
            }
        };

        let state = self
            .states()
            .get(&state_key)
            .ok_or_else(|| ComposeError::UnknownState(state_key.clone()))?;

        let (klesha_targets, qualities) = state.selection_filters();
        let entry = select_sacred_text(
            &self.corpus,
            &SelectOptions {
                klesha_targets,
                qualities,
                avoid_ids: options.recent_sacred_ids.clone(),
                seed: options.seed,
            },
        )?;

        let supporting = self
            .corpus
            .should_include_prev_context(&entry.id)
            .then(|| self.corpus.resolve_sutra_context(&entry.id))
            .flatten()
            .map(|ctx| {
                let mut verses = Vec::new();
                verses.extend(ctx.prev);
                verses.extend(ctx.next);
                verses
            })
            .filter(|verses| !verses.is_empty());

        let mode = if profile.is_some() {
            Mode::Personal
        } else {
            Mode::Universal
        };
        let insight = profile
            .filter(|p| p.has_insight_material())
            .and_then(personal_insight);

        log::debug!(
            "Composed package: state={state_key} sacred={} mode={mode:?}",
            entry.composite_key()
        );

        Ok(TruthPackage {
            mode,
            theme,
            state_key,
            diagnosis: Diagnosis {
                klesha: state.klesha.clone(),
                samkhya_guna: state.guna.clone(),
                qualities: state.qualities.clone(),
                confidence,
            },
            sacred: SacredSection {
                id: entry.id.clone(),
                corpus: entry.corpus,
                text: entry.text.clone(),
                supporting,
            },
            practice: state.practice.clone(),
            food: state.food.clone(),
            contemplative_question: state.question.clone(),
            insight,
            meta: PackageMeta {
                generated_at_ms: options.now_ms.unwrap_or_else(unix_ms_now),
                used_sacred_ids: (!options.recent_sacred_ids.is_empty())
                    .then(|| options.recent_sacred_ids.clone()),
                used_state_keys: (!options.recent_state_keys.is_empty())
                    .then(|| options.recent_state_keys.clone()),
            },
            sacred_text: entry.text.clone(),
            sacred_id: entry.composite_key(),
        })
    }

    /// Seed-driven state choice for questionless draws, skipping recent
    /// states while any other remains.
    fn default_state_key(&self, recent: &HashSet<&str>, seed: Option<u64>) -> String {
        let states = self.states().states();
        let eligible: Vec<&str> = states
            .iter()
            .map(|s| s.key.as_str())
            .filter(|k| !recent.contains(k))
            .collect();
        let pool: Vec<&str> = if eligible.is_empty() {
            states.iter().map(|s| s.key.as_str()).collect()
        } else {
            eligible
        };
        let index = (seed.unwrap_or(0) % pool.len() as u64) as usize;
        pool[index].to_string()
    }
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
