use anyhow::{Context, Result};
use darshan_corpus::{SacredCorpus, StateLibrary};
use darshan_intent::Lexicon;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct PackReport {
    pub name: &'static str,
    pub source: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub packs: Vec<PackReport>,
    /// State qualities that match no corpus tag; selection silently falls
    /// back to the full corpus for these, which is usually a content typo.
    pub orphan_qualities: Vec<String>,
}

impl DoctorReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.packs.iter().all(|p| p.ok)
    }
}

fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn pack_bytes(name: &'static str, builtin: &str, path: Option<&Path>) -> Result<(String, Vec<u8>)> {
    match path {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Cannot read {name} pack {}", path.display()))?;
            Ok((path.display().to_string(), bytes))
        }
        None => Ok(("builtin".to_string(), builtin.as_bytes().to_vec())),
    }
}

fn pack_report(
    name: &'static str,
    source: String,
    bytes: &[u8],
    loaded: std::result::Result<usize, String>,
) -> PackReport {
    let sha256 = fingerprint(bytes);
    match loaded {
        Ok(entries) => PackReport {
            name,
            source,
            ok: true,
            entries: Some(entries),
            sha256,
            error: None,
        },
        Err(error) => PackReport {
            name,
            source,
            ok: false,
            entries: None,
            sha256,
            error: Some(error),
        },
    }
}

/// Validates the three content packs (builtin or override files) and
/// cross-checks state qualities against corpus tags.
pub fn run(
    corpus_path: Option<&PathBuf>,
    states_path: Option<&PathBuf>,
    lexicon_path: Option<&PathBuf>,
) -> Result<DoctorReport> {
    const BUILTIN_CORPUS: &str = include_str!("../../../content/corpus.json");
    const BUILTIN_STATES: &str = include_str!("../../../content/states.json");
    const BUILTIN_LEXICON: &str = include_str!("../../../content/lexicon.json");

    let (corpus_source, corpus_bytes) =
        pack_bytes("corpus", BUILTIN_CORPUS, corpus_path.map(PathBuf::as_path))?;
    let (states_source, states_bytes) =
        pack_bytes("states", BUILTIN_STATES, states_path.map(PathBuf::as_path))?;
    let (lexicon_source, lexicon_bytes) = pack_bytes(
        "lexicon",
        BUILTIN_LEXICON,
        lexicon_path.map(PathBuf::as_path),
    )?;

    let corpus = SacredCorpus::from_bytes(&corpus_bytes);
    let states = StateLibrary::from_bytes(&states_bytes);
    let lexicon = Lexicon::from_bytes(&lexicon_bytes);

    let orphan_qualities = match (&corpus, &states) {
        (Ok(corpus), Ok(states)) => {
            let known_tags: HashSet<&str> = corpus
                .entries()
                .iter()
                .flat_map(|e| e.tags.iter().map(String::as_str))
                .collect();
            let mut orphans: Vec<String> = states
                .states()
                .iter()
                .flat_map(|s| s.qualities.iter())
                .filter(|q| !known_tags.contains(q.as_str()))
                .cloned()
                .collect();
            orphans.sort();
            orphans.dedup();
            orphans
        }
        _ => Vec::new(),
    };

    let packs = vec![
        pack_report(
            "corpus",
            corpus_source,
            &corpus_bytes,
            corpus.map(|c| c.len()).map_err(|e| e.to_string()),
        ),
        pack_report(
            "states",
            states_source,
            &states_bytes,
            states.map(|s| s.len()).map_err(|e| e.to_string()),
        ),
        pack_report(
            "lexicon",
            lexicon_source,
            &lexicon_bytes,
            lexicon.map(|_| 1).map_err(|e| e.to_string()),
        ),
    ];

    Ok(DoctorReport {
        packs,
        orphan_qualities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_packs_are_healthy() {
        let report = run(None, None, None).unwrap();
        assert!(report.is_healthy());
        assert!(
            report.orphan_qualities.is_empty(),
            "{:?}",
            report.orphan_qualities
        );
        assert_eq!(report.packs.len(), 3);
        assert!(report.packs.iter().all(|p| p.sha256.len() == 64));
    }

    #[test]
    fn broken_override_pack_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("states.json");
        std::fs::write(&bad, br#"{"schema_version": 1, "states": []}"#).unwrap();

        let report = run(None, Some(&bad), None).unwrap();
        assert!(!report.is_healthy());
        let states = report.packs.iter().find(|p| p.name == "states").unwrap();
        assert!(!states.ok);
        assert!(states.error.as_deref().unwrap().contains("empty"));
    }
}
