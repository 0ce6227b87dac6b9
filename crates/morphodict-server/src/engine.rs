use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use morphodict_morph::{Analyzer, Orthography};
use morphodict_store::{StoreError, WordformStore};
use morphodict_types::{Disambiguators, IndexScope};
use tracing::{debug, info};

use crate::affix::AffixIndex;
use crate::ranker::{SearchResult, rank};
use crate::resolver::{AFFIX_SEARCH_THRESHOLD, LexicalResolver, SearchError};

#[derive(Clone, Copy, Debug)]
pub struct SearchConfig {
    /// Affix search runs only for search keys strictly longer than this.
    pub affix_threshold: usize,
    pub index_scope: IndexScope,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            affix_threshold: AFFIX_SEARCH_THRESHOLD,
            index_scope: IndexScope::Lemmas,
        }
    }
}

/// Process-wide search context.
///
/// Owns the collaborators and the current affix index. Searches take a
/// snapshot of the index reference, so a rebuild swaps in a complete new
/// index without readers ever seeing a partial one.
pub struct SearchEngine {
    store: Arc<dyn WordformStore>,
    analyzer: Arc<dyn Analyzer>,
    orthography: Arc<dyn Orthography>,
    index: RwLock<Arc<AffixIndex>>,
    config: SearchConfig,
}

impl SearchEngine {
    /// Build the affix index from `store`; the engine is ready on return.
    pub fn build(
        store: Arc<dyn WordformStore>,
        analyzer: Arc<dyn Analyzer>,
        orthography: Arc<dyn Orthography>,
        config: SearchConfig,
    ) -> Result<Self, StoreError> {
        let index = build_index(store.as_ref(), orthography.as_ref(), config.index_scope)?;
        Ok(Self {
            store,
            analyzer,
            orthography,
            index: RwLock::new(Arc::new(index)),
            config,
        })
    }

    /// Resolve and rank `query`. No matches is an empty vector, not an error.
    pub fn search(
        &self,
        query: &str,
        filter: &Disambiguators,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let index = self.current_index();
        let resolver = LexicalResolver::new(
            self.store.as_ref(),
            self.analyzer.as_ref(),
            self.orthography.as_ref(),
            &index,
        )
        .with_affix_threshold(self.config.affix_threshold);

        let resolution = resolver.resolve(query, filter)?;
        if resolution.is_empty() {
            debug!("no results for {query:?}");
            return Ok(Vec::new());
        }
        rank(
            self.store.as_ref(),
            resolution.cree,
            resolution.english,
            query,
            self.orthography.as_ref(),
        )
    }

    /// Rebuild the affix index from the store and swap it in.
    ///
    /// Searches already running keep the index they started with.
    pub fn rebuild_index(&self) -> Result<Arc<AffixIndex>, StoreError> {
        let fresh = Arc::new(build_index(
            self.store.as_ref(),
            self.orthography.as_ref(),
            self.config.index_scope,
        )?);
        let mut slot = self.index.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Arc::clone(&fresh);
        Ok(fresh)
    }

    pub fn current_index(&self) -> Arc<AffixIndex> {
        let slot = self.index.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&slot)
    }

    pub fn orthography(&self) -> &dyn Orthography {
        self.orthography.as_ref()
    }

    pub fn config(&self) -> SearchConfig {
        self.config
    }
}

fn build_index(
    store: &dyn WordformStore,
    orthography: &dyn Orthography,
    scope: IndexScope,
) -> Result<AffixIndex, StoreError> {
    let start = Instant::now();
    let index = AffixIndex::from_store(store, orthography, scope)?;
    info!("affix index built in {} ms", start.elapsed().as_millis());
    Ok(index)
}
