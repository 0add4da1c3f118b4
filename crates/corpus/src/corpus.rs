use crate::entry::{SacredEntry, SourceCorpus};
use crate::error::{CorpusError, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

pub const CORPUS_SCHEMA_VERSION: u32 = 1;

const BUILTIN_CORPUS: &str = include_str!("../../../content/corpus.json");

#[derive(Debug, Deserialize)]
struct PersistedCorpus {
    schema_version: u32,
    entries: Vec<SacredEntry>,
}

/// The full sacred-text collection, in pack sequence order.
///
/// Sequence order is load order; `prev`/`next` context is defined by position
/// within an entry's own source corpus, never by content similarity.
#[derive(Debug, Clone)]
pub struct SacredCorpus {
    entries: Vec<SacredEntry>,
    by_id: HashMap<String, usize>,
}

impl SacredCorpus {
    /// Loads the compiled-in content pack.
    pub fn builtin() -> Result<Self> {
        Self::from_bytes(BUILTIN_CORPUS.as_bytes())
    }

    /// Loads a corpus pack from raw JSON bytes (runtime override).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let persisted: PersistedCorpus = serde_json::from_slice(bytes)?;
        if persisted.schema_version != CORPUS_SCHEMA_VERSION {
            return Err(CorpusError::SchemaVersion {
                found: persisted.schema_version,
                expected: CORPUS_SCHEMA_VERSION,
            });
        }
        if persisted.entries.is_empty() {
            return Err(CorpusError::Empty);
        }

        let mut by_id = HashMap::with_capacity(persisted.entries.len());
        let mut composite_keys = HashSet::with_capacity(persisted.entries.len());
        for (idx, entry) in persisted.entries.iter().enumerate() {
            let key = entry.composite_key();
            if !composite_keys.insert(key.clone()) {
                return Err(CorpusError::DuplicateKey(key));
            }
            if by_id.insert(entry.id.clone(), idx).is_some() {
                return Err(CorpusError::DuplicateKey(entry.id.clone()));
            }
        }

        log::debug!("Loaded sacred corpus: {} entries", persisted.entries.len());
        Ok(Self {
            entries: persisted.entries,
            by_id,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[SacredEntry] {
        &self.entries
    }

    /// Looks an entry up by its pack id (e.g. `YS.1.1`).
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SacredEntry> {
        self.by_id.get(id).map(|&idx| &self.entries[idx])
    }

    /// Looks an entry up by its composite key (e.g. `yoga_sutras.YS.1.1`).
    #[must_use]
    pub fn get_by_composite(&self, key: &str) -> Option<&SacredEntry> {
        self.entries.iter().find(|e| e.composite_key() == key)
    }

    /// Position of an entry within the sequence of its own source corpus.
    ///
    /// Returns `(position, total)` or `None` for an unknown id.
    #[must_use]
    pub fn corpus_position(&self, id: &str) -> Option<(usize, usize)> {
        let target = self.get(id)?;
        let siblings: Vec<&SacredEntry> = self.of_corpus(target.corpus).collect();
        let position = siblings.iter().position(|e| e.id == id)?;
        Some((position, siblings.len()))
    }

    /// Entries of one source corpus, in sequence order.
    pub fn of_corpus(&self, corpus: SourceCorpus) -> impl Iterator<Item = &SacredEntry> {
        self.entries.iter().filter(move |e| e.corpus == corpus)
    }

    /// Neighbors of an entry inside its own corpus sequence.
    #[must_use]
    pub fn neighbors(&self, id: &str) -> Option<(Option<&SacredEntry>, &SacredEntry, Option<&SacredEntry>)> {
        let target = self.get(id)?;
        let siblings: Vec<&SacredEntry> = self.of_corpus(target.corpus).collect();
        let position = siblings.iter().position(|e| e.id == id)?;
        let prev = position.checked_sub(1).map(|p| siblings[p]);
        let next = siblings.get(position + 1).copied();
        Some((prev, siblings[position], next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_pack_loads() {
        let corpus = SacredCorpus::builtin().unwrap();
        assert!(corpus.len() > 10);
        assert!(corpus.get("YS.1.1").is_some());
    }

    #[test]
    fn composite_lookup_round_trips() {
        let corpus = SacredCorpus::builtin().unwrap();
        let entry = corpus.get("YS.2.16").unwrap();
        let found = corpus.get_by_composite(&entry.composite_key()).unwrap();
        assert_eq!(found.id, "YS.2.16");
    }

    #[test]
    fn rejects_unsupported_schema_version() {
        let raw = br#"{"schema_version": 99, "entries": [
            {"id": "X.1", "corpus": "legacy", "text": "t", "tags": []}
        ]}"#;
        let err = SacredCorpus::from_bytes(raw).unwrap_err();
        assert!(matches!(err, CorpusError::SchemaVersion { found: 99, .. }));
    }

    #[test]
    fn rejects_empty_pack() {
        let raw = br#"{"schema_version": 1, "entries": []}"#;
        assert!(matches!(
            SacredCorpus::from_bytes(raw).unwrap_err(),
            CorpusError::Empty
        ));
    }

    #[test]
    fn rejects_duplicate_composite_keys() {
        let raw = br#"{"schema_version": 1, "entries": [
            {"id": "X.1", "corpus": "legacy", "text": "a", "tags": []},
            {"id": "X.1", "corpus": "legacy", "text": "b", "tags": []}
        ]}"#;
        assert!(matches!(
            SacredCorpus::from_bytes(raw).unwrap_err(),
            CorpusError::DuplicateKey(_)
        ));
    }

    #[test]
    fn corpus_position_is_scoped_to_source() {
        let corpus = SacredCorpus::builtin().unwrap();
        // First upanishad entry is position 0 of its own corpus even though
        // the yoga sutras precede it in the pack.
        let (position, total) = corpus.corpus_position("UP.ISA.1").unwrap();
        assert_eq!(position, 0);
        assert!(total > 1);
    }
}
