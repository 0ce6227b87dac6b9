use std::collections::BTreeSet;

use morphodict_morph::Orthography;
use morphodict_store::{StoreError, WordformStore};
use morphodict_types::{IndexScope, WordformId};
use tracing::info;

/// Prefix/suffix index over search keys, immutable once built.
///
/// Keys live in two sorted tables: one over the keys themselves and one over
/// the keys reversed. Entries sharing a prefix are contiguous in a sorted
/// table, so a lookup is a binary search to the first candidate followed by a
/// scan of the matches only.
#[derive(Debug, Clone)]
pub struct AffixIndex {
    scope: IndexScope,
    forward: Vec<(String, WordformId)>,
    reversed: Vec<(String, WordformId)>,
}

impl AffixIndex {
    pub fn empty(scope: IndexScope) -> Self {
        Self {
            scope,
            forward: Vec::new(),
            reversed: Vec::new(),
        }
    }

    /// Build from `(search key, id)` pairs. Empty keys are skipped.
    pub fn build<I>(entries: I, scope: IndexScope) -> Self
    where
        I: IntoIterator<Item = (String, WordformId)>,
    {
        let mut forward: Vec<(String, WordformId)> = entries
            .into_iter()
            .filter(|(key, _)| !key.is_empty())
            .collect();
        forward.sort();
        forward.dedup();

        let mut reversed: Vec<(String, WordformId)> = forward
            .iter()
            .map(|(key, id)| (key.chars().rev().collect(), *id))
            .collect();
        reversed.sort();

        Self {
            scope,
            forward,
            reversed,
        }
    }

    /// Build over the store's wordforms in `scope`, keyed by search key.
    pub fn from_store(
        store: &dyn WordformStore,
        orthography: &dyn Orthography,
        scope: IndexScope,
    ) -> Result<Self, StoreError> {
        let entries = store.index_entries(scope)?;
        let index = Self::build(
            entries
                .into_iter()
                .map(|(id, text)| (orthography.search_key(&text), id)),
            scope,
        );
        info!("affix index covers {} entries ({})", index.len(), scope);
        Ok(index)
    }

    /// Ids of every entry whose key starts with `query`. An empty query
    /// matches everything; callers enforce a minimum length.
    pub fn search_by_prefix(&self, query: &str) -> BTreeSet<WordformId> {
        with_prefix(&self.forward, query).collect()
    }

    /// Ids of every entry whose key ends with `query`.
    pub fn search_by_suffix(&self, query: &str) -> BTreeSet<WordformId> {
        let reversed: String = query.chars().rev().collect();
        with_prefix(&self.reversed, &reversed).collect()
    }

    pub fn scope(&self) -> IndexScope {
        self.scope
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

fn with_prefix<'a>(
    table: &'a [(String, WordformId)],
    prefix: &'a str,
) -> impl Iterator<Item = WordformId> + 'a {
    let start = table.partition_point(|(key, _)| key.as_str() < prefix);
    table[start..]
        .iter()
        .take_while(move |(key, _)| key.starts_with(prefix))
        .map(|(_, id)| *id)
}
