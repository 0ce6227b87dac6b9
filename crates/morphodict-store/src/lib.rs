//! Read-only access to a prebuilt morphodict dictionary.
//!
//! The search core never talks to a database directly. It depends on the
//! narrow [`WordformStore`] contract: lookups by id, by exact analysis, by
//! English keyword, definitions for a lemma, and a bulk listing used once to
//! build the affix index. [`MemoryStore`] implements that contract over the
//! JSON file an import pipeline produces, validated on load so that every
//! wordform resolves to a real lemma.
//!
//! Callers choose between memory-mapping the file or reading it into an owned
//! buffer via [`LoadMode`]; either way the parsed store owns its records and
//! the backing bytes are dropped after load.
//!
//! # File layout
//! ```json
//! {
//!   "wordforms": [
//!     {"id": 1, "text": "tłích'ā", "pos": "N", "category": "NI",
//!      "analysis": "tłích'ā+N", "is_lemma": true, "lemma": 1}
//!   ],
//!   "definitions": [{"id": 1, "text": "dog", "lemma": 1, "sources": ["OS"]}],
//!   "english_keywords": [{"id": 1, "text": "dog", "lemma": 1}]
//! }
//! ```
//!
//! # Example
//! ```no_run
//! use morphodict_store::{LoadMode, MemoryStore, WordformStore};
//! use morphodict_types::{Disambiguators, WordformId};
//!
//! # fn main() -> anyhow::Result<()> {
//! let store = MemoryStore::load_with_mode("/path/to/dictionary.json", LoadMode::Mmap)?;
//! for lemma in store.lemma_ids_by_english_keyword("dog", &Disambiguators::none())? {
//!     for def in store.definitions(lemma)? {
//!         println!("{lemma}: {}", def.text);
//!     }
//! }
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p morphodict-store --example stats -- <dictionary.json>`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use memmap2::Mmap;
use morphodict_types::{
    Definition, Disambiguators, EnglishKeyword, IndexScope, Wordform, WordformId,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failure of a store lookup. The search core propagates these unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("wordform store unavailable: {0}")]
    Unavailable(String),
    #[error("wordform store lookup failed: {0}")]
    Lookup(String),
}

/// Lookups the search core needs from the dictionary data.
///
/// Implementations are read-only from the core's point of view and must be
/// safe to share across concurrent searches.
pub trait WordformStore: Send + Sync {
    /// Fetch one wordform by id.
    fn wordform(&self, id: WordformId) -> Result<Option<Wordform>, StoreError>;

    /// Fetch every wordform whose id is in `ids`, ordered by id. Unknown ids
    /// are skipped.
    fn wordforms(&self, ids: &[WordformId]) -> Result<Vec<Wordform>, StoreError>;

    /// Wordforms whose analysis equals `analysis` exactly, with the given
    /// `as_is` flag, narrowed by `filter`.
    fn wordforms_by_analysis(
        &self,
        analysis: &str,
        as_is: bool,
        filter: &Disambiguators,
    ) -> Result<Vec<Wordform>, StoreError>;

    /// Lemma ids owning a keyword equal to `text` (case-insensitive), narrowed
    /// by `filter` applied to the owning lemma.
    fn lemma_ids_by_english_keyword(
        &self,
        text: &str,
        filter: &Disambiguators,
    ) -> Result<Vec<WordformId>, StoreError>;

    /// Definitions belonging to `lemma`, ordered by id.
    fn definitions(&self, lemma: WordformId) -> Result<Vec<Definition>, StoreError>;

    /// `(id, display text)` of every wordform covered by `scope`, ordered by id.
    fn index_entries(&self, scope: IndexScope) -> Result<Vec<(WordformId, String)>, StoreError>;
}

/// Strategy for reading the dictionary file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map the file (fast for large dictionaries).
    Mmap,
    /// Read the file into an owned buffer (portable fallback).
    Owned,
}

impl LoadMode {
    pub fn from_name(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mmap" => Some(LoadMode::Mmap),
            "owned" => Some(LoadMode::Owned),
            _ => None,
        }
    }
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

#[derive(Deserialize)]
struct RawDictionary {
    #[serde(default)]
    wordforms: Vec<RawWordform>,
    #[serde(default)]
    definitions: Vec<RawDefinition>,
    #[serde(default)]
    english_keywords: Vec<RawKeyword>,
}

#[derive(Deserialize)]
struct RawWordform {
    id: u32,
    text: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    pos: Option<String>,
    #[serde(default)]
    analysis: Option<String>,
    #[serde(default)]
    is_lemma: bool,
    #[serde(default)]
    as_is: bool,
    #[serde(default)]
    lemma: Option<u32>,
}

#[derive(Deserialize)]
struct RawDefinition {
    id: u32,
    text: String,
    lemma: u32,
    #[serde(default)]
    sources: Vec<String>,
}

#[derive(Deserialize)]
struct RawKeyword {
    id: u32,
    text: String,
    lemma: u32,
}

/// In-memory [`WordformStore`] with precomputed lookup tables.
pub struct MemoryStore {
    wordforms: BTreeMap<WordformId, Wordform>,
    by_analysis: HashMap<String, Vec<WordformId>>,
    keywords: HashMap<String, Vec<WordformId>>,
    definitions: HashMap<WordformId, Vec<Definition>>,
    definition_count: usize,
    keyword_count: usize,
}

impl MemoryStore {
    /// Load a dictionary file, memory-mapping it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_mode(path, LoadMode::Mmap)
    }

    /// Load a dictionary file choosing between mmap and an owned buffer.
    pub fn load_with_mode(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("missing dictionary file: {}", path.display());
        }
        let buffer = load_file(path, mode)?;
        Self::from_json_slice(buffer.as_slice())
            .with_context(|| format!("parse dictionary {}", path.display()))
    }

    /// Parse a dictionary from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let raw: RawDictionary = serde_json::from_slice(bytes).context("decode dictionary json")?;

        let mut wordforms = Vec::with_capacity(raw.wordforms.len());
        for wf in raw.wordforms {
            let lemma = match (wf.lemma, wf.is_lemma) {
                (Some(lemma), _) => WordformId(lemma),
                (None, true) => WordformId(wf.id),
                (None, false) => anyhow::bail!("wordform {} has no lemma", wf.id),
            };
            wordforms.push(Wordform {
                id: WordformId(wf.id),
                text: wf.text,
                category: wf.category.unwrap_or_default(),
                pos: wf.pos.unwrap_or_default(),
                analysis: wf.analysis.unwrap_or_default(),
                is_lemma: wf.is_lemma,
                as_is: wf.as_is,
                lemma,
            });
        }
        let definitions = raw
            .definitions
            .into_iter()
            .map(|d| Definition {
                id: d.id,
                text: d.text,
                lemma: WordformId(d.lemma),
                sources: d.sources,
            })
            .collect();
        let keywords = raw
            .english_keywords
            .into_iter()
            .map(|k| EnglishKeyword {
                id: k.id,
                text: k.text,
                lemma: WordformId(k.lemma),
            })
            .collect();

        Self::from_records(wordforms, definitions, keywords)
    }

    /// Build a store from already-decoded records, validating lemma links.
    pub fn from_records(
        wordforms: Vec<Wordform>,
        definitions: Vec<Definition>,
        keywords: Vec<EnglishKeyword>,
    ) -> Result<Self> {
        let mut by_id = BTreeMap::new();
        for wf in wordforms {
            if wf.as_is && (wf.pos.is_empty() || wf.category.is_empty()) {
                debug!("as-is wordform {} ({}) has under-specified pos/category", wf.id, wf.text);
            }
            let id = wf.id;
            if by_id.insert(id, wf).is_some() {
                anyhow::bail!("duplicate wordform id {id}");
            }
        }

        for wf in by_id.values() {
            if wf.is_lemma && wf.lemma != wf.id {
                anyhow::bail!(
                    "lemma {} points at {} instead of itself",
                    wf.id,
                    wf.lemma
                );
            }
            match by_id.get(&wf.lemma) {
                Some(lemma) if lemma.is_lemma => {}
                Some(_) => anyhow::bail!(
                    "wordform {} points at {} which is not a lemma",
                    wf.id,
                    wf.lemma
                ),
                None => anyhow::bail!("wordform {} points at missing lemma {}", wf.id, wf.lemma),
            }
        }

        let mut by_analysis: HashMap<String, Vec<WordformId>> = HashMap::new();
        for wf in by_id.values() {
            if !wf.analysis.is_empty() {
                by_analysis.entry(wf.analysis.clone()).or_default().push(wf.id);
            }
        }

        let mut seen_definitions = HashSet::new();
        let mut by_lemma: HashMap<WordformId, Vec<Definition>> = HashMap::new();
        for mut def in definitions {
            if !seen_definitions.insert(def.id) {
                anyhow::bail!("duplicate definition id {}", def.id);
            }
            if !by_id.get(&def.lemma).is_some_and(|wf| wf.is_lemma) {
                anyhow::bail!("definition {} points at unknown lemma {}", def.id, def.lemma);
            }
            def.sources.sort();
            def.sources.dedup();
            by_lemma.entry(def.lemma).or_default().push(def);
        }
        for defs in by_lemma.values_mut() {
            defs.sort_by_key(|d| d.id);
        }

        let mut keyword_count = 0usize;
        let mut keyword_map: HashMap<String, Vec<WordformId>> = HashMap::new();
        for keyword in keywords {
            let key = keyword.text.trim().to_lowercase();
            if key.is_empty() {
                warn!("skipping empty english keyword {}", keyword.id);
                continue;
            }
            if !by_id.contains_key(&keyword.lemma) {
                anyhow::bail!(
                    "english keyword {} points at unknown lemma {}",
                    keyword.id,
                    keyword.lemma
                );
            }
            keyword_map.entry(key).or_default().push(keyword.lemma);
            keyword_count += 1;
        }
        for lemmas in keyword_map.values_mut() {
            lemmas.sort();
            lemmas.dedup();
        }

        let store = Self {
            wordforms: by_id,
            by_analysis,
            keywords: keyword_map,
            definition_count: seen_definitions.len(),
            definitions: by_lemma,
            keyword_count,
        };
        info!(
            "loaded {} wordforms ({} lemmas), {} definitions, {} english keywords",
            store.wordform_count(),
            store.lemma_count(),
            store.definition_count,
            store.keyword_count
        );
        Ok(store)
    }

    /// Iterate over all wordforms in id order.
    pub fn iter_wordforms(&self) -> impl Iterator<Item = &Wordform> + '_ {
        self.wordforms.values()
    }

    /// Number of wordforms.
    pub fn wordform_count(&self) -> usize {
        self.wordforms.len()
    }

    /// Number of wordforms flagged as lemmas.
    pub fn lemma_count(&self) -> usize {
        self.wordforms.values().filter(|wf| wf.is_lemma).count()
    }

    /// Number of wordforms whose analysis could not be machine-derived.
    pub fn as_is_count(&self) -> usize {
        self.wordforms.values().filter(|wf| wf.as_is).count()
    }

    /// Number of definitions.
    pub fn definition_count(&self) -> usize {
        self.definition_count
    }

    /// Number of English keywords.
    pub fn keyword_count(&self) -> usize {
        self.keyword_count
    }
}

impl WordformStore for MemoryStore {
    fn wordform(&self, id: WordformId) -> Result<Option<Wordform>, StoreError> {
        Ok(self.wordforms.get(&id).cloned())
    }

    fn wordforms(&self, ids: &[WordformId]) -> Result<Vec<Wordform>, StoreError> {
        let mut sorted = ids.to_vec();
        sorted.sort();
        sorted.dedup();
        Ok(sorted
            .into_iter()
            .filter_map(|id| self.wordforms.get(&id).cloned())
            .collect())
    }

    fn wordforms_by_analysis(
        &self,
        analysis: &str,
        as_is: bool,
        filter: &Disambiguators,
    ) -> Result<Vec<Wordform>, StoreError> {
        if analysis.is_empty() {
            return Ok(Vec::new());
        }
        let Some(ids) = self.by_analysis.get(analysis) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| self.wordforms.get(id))
            .filter(|wf| wf.as_is == as_is && filter.matches(wf))
            .cloned()
            .collect())
    }

    fn lemma_ids_by_english_keyword(
        &self,
        text: &str,
        filter: &Disambiguators,
    ) -> Result<Vec<WordformId>, StoreError> {
        let key = text.trim().to_lowercase();
        let Some(lemmas) = self.keywords.get(&key) else {
            return Ok(Vec::new());
        };
        Ok(lemmas
            .iter()
            .copied()
            .filter(|id| self.wordforms.get(id).is_some_and(|wf| filter.matches(wf)))
            .collect())
    }

    fn definitions(&self, lemma: WordformId) -> Result<Vec<Definition>, StoreError> {
        Ok(self.definitions.get(&lemma).cloned().unwrap_or_default())
    }

    fn index_entries(&self, scope: IndexScope) -> Result<Vec<(WordformId, String)>, StoreError> {
        Ok(self
            .wordforms
            .values()
            .filter(|wf| scope.includes(wf) && !wf.text.trim().is_empty())
            .map(|wf| (wf.id, wf.text.clone()))
            .collect())
    }
}

fn load_file(path: &Path, mode: LoadMode) -> Result<Buffer> {
    match mode {
        LoadMode::Mmap => {
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            unsafe { Mmap::map(&file) }
                .map(Buffer::Mmap)
                .with_context(|| format!("mmap {}", path.display()))
        }
        LoadMode::Owned => {
            let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(Buffer::Owned(buf))
        }
    }
}
