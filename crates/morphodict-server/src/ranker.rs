use std::cmp::Reverse;
use std::collections::HashSet;

use morphodict_morph::{Analysis, Orthography, as_is_analysis};
use morphodict_store::WordformStore;
use morphodict_types::{Definition, Language, Wordform};

use crate::resolver::{CreeResult, EnglishResult, SearchError};

/// Affix labels around the lemma of a matched analysis.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Breakdown {
    pub head: Vec<String>,
    pub tail: Vec<String>,
}

impl Breakdown {
    /// Labels for `analysis`, synthesizing one from `wordform` when the stored
    /// analysis is empty. Unparseable analyses yield an empty breakdown.
    fn describe(analysis: &str, wordform: &Wordform) -> Self {
        let synthesized;
        let raw = if analysis.is_empty() {
            synthesized = as_is_analysis(&wordform.text, &wordform.pos, &wordform.category);
            synthesized.as_str()
        } else {
            analysis
        };
        match Analysis::parse(raw) {
            Ok(parsed) => Self {
                head: parsed.head_labels().to_vec(),
                tail: parsed.tail_labels().to_vec(),
            },
            Err(_) => Self::default(),
        }
    }
}

/// A display-ready search hit.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SearchResult {
    pub matched_text: String,
    pub matched_by: Language,
    pub is_head: bool,
    pub lemma: Wordform,
    pub breakdown: Breakdown,
    pub definitions: Vec<Definition>,
}

/// Merge both candidate sets into one ordered, duplicate-free sequence.
///
/// Results are ordered by edit distance between search keys of the matched
/// text and the query, then target-language before English, heads first,
/// then matched search key, and finally the full structural order of the
/// result. Equal inputs always produce the same order.
pub fn rank(
    store: &dyn WordformStore,
    cree: HashSet<CreeResult>,
    english: HashSet<EnglishResult>,
    query: &str,
    orthography: &dyn Orthography,
) -> Result<Vec<SearchResult>, SearchError> {
    let mut results = Vec::with_capacity(cree.len() + english.len());

    for candidate in cree {
        let breakdown = match candidate.matched.wordform() {
            Some(wf) => Breakdown::describe(&candidate.analysis, wf),
            None => Breakdown::describe(&candidate.analysis, &candidate.lemma),
        };
        results.push(SearchResult {
            matched_text: candidate.matched.text().to_string(),
            matched_by: Language::Target,
            is_head: true,
            definitions: store.definitions(candidate.lemma.id)?,
            lemma: candidate.lemma,
            breakdown,
        });
    }

    for candidate in english {
        results.push(SearchResult {
            matched_text: candidate.matched.text.clone(),
            matched_by: Language::English,
            is_head: false,
            definitions: store.definitions(candidate.lemma.id)?,
            breakdown: Breakdown::describe(&candidate.matched.analysis, &candidate.matched),
            lemma: candidate.lemma,
        });
    }

    let query_key = orthography.search_key(query);
    let mut keyed: Vec<(usize, Language, Reverse<bool>, String, SearchResult)> = results
        .into_iter()
        .map(|result| {
            let key = orthography.search_key(&result.matched_text);
            (
                levenshtein(&key, &query_key),
                result.matched_by,
                Reverse(result.is_head),
                key,
                result,
            )
        })
        .collect();
    keyed.sort();
    keyed.dedup_by(|a, b| a.4 == b.4);

    Ok(keyed.into_iter().map(|(.., result)| result).collect())
}

/// Levenshtein distance over chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
