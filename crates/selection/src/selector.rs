use darshan_corpus::{SacredCorpus, SacredEntry};
use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SelectionError>;

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Corpus is empty")]
    EmptyCorpus,
}

/// Selection constraints. All fields are optional narrowing, never hard
/// requirements — see [`select_sacred_text`].
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    /// Klesha tags to bias toward (e.g. `abhinivesha`).
    pub klesha_targets: Vec<String>,
    /// Quality tags to bias toward (e.g. `steadiness`).
    pub qualities: Vec<String>,
    /// Composite keys (`corpus.id`) to avoid repeating.
    pub avoid_ids: Vec<String>,
    /// Deterministic index seed; `None` selects uniformly at random.
    pub seed: Option<u64>,
}

/// Picks one entry from the corpus.
///
/// Constraint relaxation order: tag filters that match nothing are dropped,
/// then an avoid list that excludes every candidate is ignored — availability
/// beats novelty. With a seed the pick is `seed % pool_len`, a deliberate,
/// reproducible contract callers rely on for daily rotation.
pub fn select_sacred_text<'a>(
    corpus: &'a SacredCorpus,
    options: &SelectOptions,
) -> Result<&'a SacredEntry> {
    let mut pool: Vec<&SacredEntry> = corpus.entries().iter().collect();
    if pool.is_empty() {
        return Err(SelectionError::EmptyCorpus);
    }

    if !options.klesha_targets.is_empty() || !options.qualities.is_empty() {
        let filtered: Vec<&SacredEntry> = pool
            .iter()
            .copied()
            .filter(|e| e.has_any_tag(&options.klesha_targets) || e.has_any_tag(&options.qualities))
            .collect();
        if filtered.is_empty() {
            log::debug!(
                "Tag filters {:?}/{:?} matched nothing; using the full corpus",
                options.klesha_targets,
                options.qualities
            );
        } else {
            pool = filtered;
        }
    }

    if !options.avoid_ids.is_empty() {
        let avoid: HashSet<&str> = options.avoid_ids.iter().map(String::as_str).collect();
        let remaining: Vec<&SacredEntry> = pool
            .iter()
            .copied()
            .filter(|e| !avoid.contains(e.composite_key().as_str()))
            .collect();
        if remaining.is_empty() {
            log::debug!("Avoid list excludes every candidate; ignoring it for this call");
        } else {
            pool = remaining;
        }
    }

    let index = match options.seed {
        Some(seed) => (seed % pool.len() as u64) as usize,
        None => rand::thread_rng().gen_range(0..pool.len()),
    };
    Ok(pool[index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn corpus() -> SacredCorpus {
        SacredCorpus::builtin().unwrap()
    }

    #[test]
    fn same_seed_same_entry() {
        let corpus = corpus();
        let options = SelectOptions {
            seed: Some(12345),
            ..Default::default()
        };
        let first = select_sacred_text(&corpus, &options).unwrap();
        let second = select_sacred_text(&corpus, &options).unwrap();
        assert_eq!(first.composite_key(), second.composite_key());
    }

    #[test]
    fn avoid_list_changes_the_pick() {
        let corpus = corpus();
        let base = SelectOptions {
            seed: Some(1),
            ..Default::default()
        };
        let first = select_sacred_text(&corpus, &base).unwrap();

        let avoiding = SelectOptions {
            seed: Some(1),
            avoid_ids: vec![first.composite_key()],
            ..Default::default()
        };
        let second = select_sacred_text(&corpus, &avoiding).unwrap();
        assert_ne!(first.composite_key(), second.composite_key());
    }

    #[test]
    fn never_empty_no_matter_how_restrictive() {
        let corpus = corpus();
        let everything: Vec<String> = corpus
            .entries()
            .iter()
            .map(|e| e.composite_key())
            .collect();
        let options = SelectOptions {
            klesha_targets: vec!["no-such-tag".to_string()],
            qualities: vec!["also-missing".to_string()],
            avoid_ids: everything,
            seed: Some(7),
        };
        // Filters match nothing and the avoid list covers the whole corpus;
        // both must be relaxed rather than failing.
        assert!(select_sacred_text(&corpus, &options).is_ok());
    }

    #[test]
    fn filters_bias_toward_matching_tags() {
        let corpus = corpus();
        let options = SelectOptions {
            klesha_targets: vec!["abhinivesha".to_string()],
            seed: Some(0),
            ..Default::default()
        };
        let entry = select_sacred_text(&corpus, &options).unwrap();
        assert!(entry.has_any_tag(&["abhinivesha"]));
    }

    #[test]
    fn seed_wraps_modulo_pool_size() {
        let corpus = corpus();
        let len = corpus.len() as u64;
        let small = SelectOptions {
            seed: Some(3),
            ..Default::default()
        };
        let wrapped = SelectOptions {
            seed: Some(3 + len),
            ..Default::default()
        };
        let a = select_sacred_text(&corpus, &small).unwrap();
        let b = select_sacred_text(&corpus, &wrapped).unwrap();
        assert_eq!(a.composite_key(), b.composite_key());
    }

    #[test]
    fn unseeded_selection_still_returns_an_entry() {
        let corpus = corpus();
        assert!(select_sacred_text(&corpus, &SelectOptions::default()).is_ok());
    }
}
