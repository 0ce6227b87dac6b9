use std::collections::HashSet;

use morphodict_morph::{Analysis, Analyzer, Orthography};
use morphodict_store::{StoreError, WordformStore};
use morphodict_types::{Disambiguators, Wordform, WordformId};
use thiserror::Error;
use tracing::debug;

use crate::affix::AffixIndex;

/// Queries whose search key is at most this many characters skip affix search.
pub const AFFIX_SEARCH_THRESHOLD: usize = 4;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("wordform {wordform} points at missing lemma {lemma}")]
    DanglingLemma {
        wordform: WordformId,
        lemma: WordformId,
    },
}

/// The surface form a target-language match was made against.
///
/// `Generated` covers forms produced on the fly by a morphological generator
/// that are not present in the store.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum MatchedForm {
    Stored(Wordform),
    Generated(String),
}

impl MatchedForm {
    pub fn text(&self) -> &str {
        match self {
            MatchedForm::Stored(wf) => &wf.text,
            MatchedForm::Generated(text) => text,
        }
    }

    pub fn wordform(&self) -> Option<&Wordform> {
        match self {
            MatchedForm::Stored(wf) => Some(wf),
            MatchedForm::Generated(_) => None,
        }
    }
}

/// A target-language candidate: `(analysis, matched form, lemma)`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CreeResult {
    pub analysis: String,
    pub matched: MatchedForm,
    pub lemma: Wordform,
}

/// An English-side candidate: `(matched English text, matched wordform, lemma)`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct EnglishResult {
    pub matched_text: String,
    pub matched: Wordform,
    pub lemma: Wordform,
}

/// Deduplicated candidates from both match strategies.
#[derive(Debug, Default)]
pub struct Resolution {
    pub cree: HashSet<CreeResult>,
    pub english: HashSet<EnglishResult>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.cree.is_empty() && self.english.is_empty()
    }
}

/// Turns a raw query into lemma-resolved candidates.
pub struct LexicalResolver<'a> {
    store: &'a dyn WordformStore,
    analyzer: &'a dyn Analyzer,
    orthography: &'a dyn Orthography,
    index: &'a AffixIndex,
    affix_threshold: usize,
}

impl<'a> LexicalResolver<'a> {
    pub fn new(
        store: &'a dyn WordformStore,
        analyzer: &'a dyn Analyzer,
        orthography: &'a dyn Orthography,
        index: &'a AffixIndex,
    ) -> Self {
        Self {
            store,
            analyzer,
            orthography,
            index,
            affix_threshold: AFFIX_SEARCH_THRESHOLD,
        }
    }

    pub fn with_affix_threshold(mut self, threshold: usize) -> Self {
        self.affix_threshold = threshold;
        self
    }

    /// Collect candidates from affix search, exact analyses and English
    /// keywords. Store failures propagate; unresolvable analyses are skipped.
    pub fn resolve(&self, query: &str, filter: &Disambiguators) -> Result<Resolution, SearchError> {
        let mut resolution = Resolution::default();

        let key = self.orthography.search_key(query);
        if key.chars().count() > self.affix_threshold {
            self.affix_matches(&key, filter, &mut resolution.cree)?;
        }

        self.analysis_matches(query, filter, &mut resolution.cree)?;

        if is_single_token(query) {
            self.english_matches(query, filter, &mut resolution.english)?;
        }

        debug!(
            "resolved {query:?}: {} target-language and {} english candidates",
            resolution.cree.len(),
            resolution.english.len()
        );
        Ok(resolution)
    }

    fn affix_matches(
        &self,
        key: &str,
        filter: &Disambiguators,
        out: &mut HashSet<CreeResult>,
    ) -> Result<(), SearchError> {
        let mut ids = self.index.search_by_prefix(key);
        ids.extend(self.index.search_by_suffix(key));
        if ids.is_empty() {
            return Ok(());
        }

        let ids: Vec<WordformId> = ids.into_iter().collect();
        for wf in self.store.wordforms(&ids)? {
            if !filter.matches(&wf) {
                continue;
            }
            let lemma = self.lemma_of(&wf)?;
            out.insert(CreeResult {
                analysis: wf.analysis.clone(),
                matched: MatchedForm::Stored(wf),
                lemma,
            });
        }
        Ok(())
    }

    fn analysis_matches(
        &self,
        query: &str,
        filter: &Disambiguators,
        out: &mut HashSet<CreeResult>,
    ) -> Result<(), SearchError> {
        let normalized = self.orthography.normalize(query);
        for raw in self.analyzer.analyze(&normalized) {
            let analysis = match Analysis::parse(&raw) {
                Ok(analysis) => analysis,
                Err(err) => {
                    debug!("skipping analysis {raw:?}: {err}");
                    continue;
                }
            };
            let canonical = analysis.concatenate();
            let found = self.store.wordforms_by_analysis(&canonical, false, filter)?;
            if found.is_empty() {
                debug!("no stored wordform for analysis {canonical:?}");
                continue;
            }
            for wf in found {
                let lemma = self.lemma_of(&wf)?;
                out.insert(CreeResult {
                    analysis: wf.analysis.clone(),
                    matched: MatchedForm::Stored(wf),
                    lemma,
                });
            }
        }
        Ok(())
    }

    fn english_matches(
        &self,
        query: &str,
        filter: &Disambiguators,
        out: &mut HashSet<EnglishResult>,
    ) -> Result<(), SearchError> {
        let text = query.trim();
        let lemma_ids = self.store.lemma_ids_by_english_keyword(text, filter)?;
        if lemma_ids.is_empty() {
            return Ok(());
        }

        for wf in self.store.wordforms(&lemma_ids)? {
            if wf.as_is && !wf.is_closed_class() {
                debug!("skipping unanalyzable {} for english {text:?}", wf.text);
                continue;
            }
            let lemma = self.lemma_of(&wf)?;
            out.insert(EnglishResult {
                matched_text: text.to_string(),
                matched: wf,
                lemma,
            });
        }
        Ok(())
    }

    fn lemma_of(&self, wf: &Wordform) -> Result<Wordform, SearchError> {
        if wf.is_lemma {
            return Ok(wf.clone());
        }
        let lemma = self.store.wordform(wf.lemma)?;
        debug_assert!(
            lemma.is_some(),
            "wordform {} points at missing lemma {}",
            wf.id,
            wf.lemma
        );
        lemma.ok_or(SearchError::DanglingLemma {
            wordform: wf.id,
            lemma: wf.lemma,
        })
    }
}

/// English lookup only applies to a single token.
fn is_single_token(query: &str) -> bool {
    let trimmed = query.trim();
    !trimmed.is_empty() && !trimmed.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use super::*;
    use morphodict_morph::{NoAnalyzer, TableAnalyzer, Tsuutina};
    use morphodict_store::MemoryStore;
    use morphodict_types::{Definition, EnglishKeyword, IndexScope};

    fn wordform(id: u32, text: &str, analysis: &str, lemma: u32) -> Wordform {
        Wordform {
            id: WordformId(id),
            text: text.into(),
            category: "NI".into(),
            pos: "N".into(),
            analysis: analysis.into(),
            is_lemma: id == lemma,
            as_is: false,
            lemma: WordformId(lemma),
        }
    }

    fn keyword(id: u32, text: &str, lemma: u32) -> EnglishKeyword {
        EnglishKeyword {
            id,
            text: text.into(),
            lemma: WordformId(lemma),
        }
    }

    fn store() -> MemoryStore {
        let mut particle = wordform(4, "ìsą̀", "", 4);
        particle.as_is = true;
        particle.pos = String::new();
        particle.category = "IPC".into();
        let mut unanalyzable = wordform(5, "gùdìsà", "", 5);
        unanalyzable.as_is = true;
        MemoryStore::from_records(
            vec![
                wordform(1, "tłích'ā", "tłích'ā+N", 1),
                wordform(2, "dóghà", "dóghà+N", 2),
                wordform(3, "tłích'ā-ì", "tłích'ā+N+Poss", 1),
                particle,
                unanalyzable,
            ],
            vec![Definition {
                id: 1,
                text: "dog".into(),
                lemma: WordformId(1),
                sources: Vec::new(),
            }],
            vec![
                keyword(1, "dog", 1),
                keyword(2, "whiskers", 2),
                keyword(3, "only", 4),
                keyword(4, "only", 5),
            ],
        )
        .unwrap()
    }

    fn index(store: &MemoryStore) -> AffixIndex {
        AffixIndex::from_store(store, &Tsuutina, IndexScope::Lemmas).unwrap()
    }

    #[test]
    fn affix_match_resolves_to_lemma() {
        let store = store();
        let index = index(&store);
        let resolver = LexicalResolver::new(&store, &NoAnalyzer, &Tsuutina, &index);
        let res = resolver.resolve("tlicha", &Disambiguators::none()).unwrap();
        assert_eq!(res.cree.len(), 1);
        let hit = res.cree.iter().next().unwrap();
        assert_eq!(hit.matched.text(), "tłích'ā");
        assert_eq!(hit.lemma.id, WordformId(1));
        assert!(res.english.is_empty());
    }

    #[test]
    fn short_queries_skip_affix_search() {
        let store = store();
        let index = index(&store);
        let resolver = LexicalResolver::new(&store, &NoAnalyzer, &Tsuutina, &index);
        assert!(resolver.resolve("tli", &Disambiguators::none()).unwrap().is_empty());

        let eager = LexicalResolver::new(&store, &NoAnalyzer, &Tsuutina, &index)
            .with_affix_threshold(2);
        assert_eq!(eager.resolve("tli", &Disambiguators::none()).unwrap().cree.len(), 1);
    }

    #[test]
    fn analysis_match_resolves_inflected_form() {
        let store = store();
        let index = AffixIndex::empty(IndexScope::Lemmas);
        let analyzer = TableAnalyzer::from_entries(
            [
                ("tłích'ā-ì", "tłích'ā+N+Poss"),
                ("tłích'ā-ì", "tłích'ā+N+Voc"),
                ("tłích'ā-ì", "++"),
            ],
            &Tsuutina,
        );
        let resolver = LexicalResolver::new(&store, &analyzer, &Tsuutina, &index);
        let res = resolver.resolve("tɫích'ā-ì", &Disambiguators::none()).unwrap();
        assert_eq!(res.cree.len(), 1);
        let hit = res.cree.iter().next().unwrap();
        assert_eq!(hit.analysis, "tłích'ā+N+Poss");
        assert_eq!(hit.matched.wordform().map(|wf| wf.id), Some(WordformId(3)));
        assert_eq!(hit.lemma.text, "tłích'ā");
    }

    #[test]
    fn affix_and_analysis_hits_collapse() {
        let store = store();
        let index = index(&store);
        let analyzer = TableAnalyzer::from_entries([("tłích'ā", "tłích'ā+N")], &Tsuutina);
        let resolver = LexicalResolver::new(&store, &analyzer, &Tsuutina, &index);
        let res = resolver.resolve("tłích'ā", &Disambiguators::none()).unwrap();
        assert_eq!(res.cree.len(), 1);
    }

    #[test]
    fn english_lookup_requires_single_token() {
        let store = store();
        let index = index(&store);
        let resolver = LexicalResolver::new(&store, &NoAnalyzer, &Tsuutina, &index);

        let res = resolver.resolve("dog", &Disambiguators::none()).unwrap();
        assert_eq!(res.english.len(), 1);
        let hit = res.english.iter().next().unwrap();
        assert_eq!(hit.matched.text, "tłích'ā");
        assert_eq!(hit.matched_text, "dog");

        let res = resolver.resolve("dog cat", &Disambiguators::none()).unwrap();
        assert!(res.english.is_empty());
    }

    #[test]
    fn english_lookup_keeps_closed_class_as_is_forms() {
        let store = store();
        let index = index(&store);
        let resolver = LexicalResolver::new(&store, &NoAnalyzer, &Tsuutina, &index);
        let res = resolver.resolve("Only", &Disambiguators::none()).unwrap();
        let matched: Vec<u32> = res.english.iter().map(|r| r.matched.id.0).collect();
        assert_eq!(matched, vec![4]);
    }

    #[test]
    fn english_lookup_keeps_every_particle_category() {
        let categories = ["IPC", "IPJ", "IPH", "IPN", "IPC ;; IPJ", "IPJ  Exclamation"];
        let mut wordforms = Vec::new();
        let mut keywords = Vec::new();
        for (n, category) in categories.iter().enumerate() {
            let id = n as u32 + 1;
            let mut particle = wordform(id, &format!("particle{id}"), "", id);
            particle.as_is = true;
            particle.pos = String::new();
            particle.category = category.to_string();
            wordforms.push(particle);
            keywords.push(keyword(id, &format!("gloss{id}"), id));
        }
        let store = MemoryStore::from_records(wordforms, Vec::new(), keywords).unwrap();
        let index = AffixIndex::empty(IndexScope::Lemmas);
        let resolver = LexicalResolver::new(&store, &NoAnalyzer, &Tsuutina, &index);

        for (n, category) in categories.iter().enumerate() {
            let query = format!("gloss{}", n + 1);
            let res = resolver.resolve(&query, &Disambiguators::none()).unwrap();
            assert_eq!(res.english.len(), 1, "{category}");
        }
    }

    #[test]
    fn disambiguators_narrow_candidates() {
        let store = store();
        let index = index(&store);
        let resolver = LexicalResolver::new(&store, &NoAnalyzer, &Tsuutina, &index);
        let verbs = Disambiguators::from_pairs([("pos", "V")]).unwrap();
        assert!(resolver.resolve("tlicha", &verbs).unwrap().is_empty());
        assert!(resolver.resolve("dog", &verbs).unwrap().is_empty());
    }

    /// Store double that maps every analysis to the same wordform and counts
    /// keyword lookups.
    struct RecordingStore {
        inner: MemoryStore,
        keyword_lookups: Mutex<Vec<String>>,
        fail: bool,
    }

    impl WordformStore for RecordingStore {
        fn wordform(&self, id: WordformId) -> Result<Option<Wordform>, StoreError> {
            self.inner.wordform(id)
        }

        fn wordforms(&self, ids: &[WordformId]) -> Result<Vec<Wordform>, StoreError> {
            self.inner.wordforms(ids)
        }

        fn wordforms_by_analysis(
            &self,
            _analysis: &str,
            _as_is: bool,
            _filter: &Disambiguators,
        ) -> Result<Vec<Wordform>, StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("disk gone".into()));
            }
            Ok(self.inner.wordform(WordformId(1))?.into_iter().collect())
        }

        fn lemma_ids_by_english_keyword(
            &self,
            text: &str,
            filter: &Disambiguators,
        ) -> Result<Vec<WordformId>, StoreError> {
            self.keyword_lookups
                .lock()
                .unwrap()
                .push(text.to_string());
            self.inner.lemma_ids_by_english_keyword(text, filter)
        }

        fn definitions(&self, lemma: WordformId) -> Result<Vec<Definition>, StoreError> {
            self.inner.definitions(lemma)
        }

        fn index_entries(
            &self,
            scope: IndexScope,
        ) -> Result<Vec<(WordformId, String)>, StoreError> {
            self.inner.index_entries(scope)
        }
    }

    struct FixedAnalyzer(BTreeSet<String>);

    impl Analyzer for FixedAnalyzer {
        fn analyze(&self, _normalized_query: &str) -> BTreeSet<String> {
            self.0.clone()
        }
    }

    fn recording(fail: bool) -> RecordingStore {
        RecordingStore {
            inner: store(),
            keyword_lookups: Mutex::new(Vec::new()),
            fail,
        }
    }

    #[test]
    fn distinct_analyses_of_one_wordform_collapse() {
        let store = recording(false);
        let index = AffixIndex::empty(IndexScope::Lemmas);
        let analyzer = FixedAnalyzer(BTreeSet::from([
            "tłích'ā+N".to_string(),
            "tłích'ā+N+Sg".to_string(),
        ]));
        let resolver = LexicalResolver::new(&store, &analyzer, &Tsuutina, &index);
        let res = resolver.resolve("tłích'ā", &Disambiguators::none()).unwrap();
        assert_eq!(res.cree.len(), 1);
    }

    #[test]
    fn keyword_lookup_only_for_single_tokens() {
        let store = recording(false);
        let index = AffixIndex::empty(IndexScope::Lemmas);
        let resolver = LexicalResolver::new(&store, &NoAnalyzer, &Tsuutina, &index);
        resolver.resolve("dog cat", &Disambiguators::none()).unwrap();
        assert!(store.keyword_lookups.lock().unwrap().is_empty());
        resolver.resolve(" dog ", &Disambiguators::none()).unwrap();
        assert_eq!(*store.keyword_lookups.lock().unwrap(), vec!["dog".to_string()]);
    }

    #[test]
    fn store_failures_propagate() {
        let store = recording(true);
        let index = AffixIndex::empty(IndexScope::Lemmas);
        let analyzer = FixedAnalyzer(BTreeSet::from(["tłích'ā+N".to_string()]));
        let resolver = LexicalResolver::new(&store, &analyzer, &Tsuutina, &index);
        let err = resolver
            .resolve("tłích'ā", &Disambiguators::none())
            .unwrap_err();
        assert!(matches!(err, SearchError::Store(StoreError::Unavailable(_))));
    }
}
