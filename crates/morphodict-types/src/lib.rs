//! Shared types for the morphodict dictionary search engine.
//!
//! These mirror the records an import pipeline writes for a bilingual
//! dictionary: every [`Wordform`] points at exactly one lemma (itself when
//! `is_lemma` is set), [`Definition`]s and [`EnglishKeyword`]s hang off
//! lemmas. All types derive structural equality, hashing and ordering so that
//! transient result tuples built from them can live in sets and sort
//! deterministically.
//!
//! ```rust
//! use morphodict_types::{Disambiguators, IndexScope, WordformId};
//!
//! let filter = Disambiguators::from_pairs([("pos", "N")]).unwrap();
//! assert_eq!(filter.pos(), Some("N"));
//! assert_eq!(IndexScope::from_name("all"), Some(IndexScope::AllWordforms));
//! assert_eq!(WordformId(7).to_string(), "7");
//! ```

use std::error::Error;
use std::fmt;

/// Primary key of a stored wordform.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct WordformId(pub u32);

impl fmt::Display for WordformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A surface form of the dictionary language, inflected or not.
///
/// `pos` and `category` are never absent, but may be empty strings when the
/// form is `as_is` (its analysis could not be machine-derived).
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Wordform {
    pub id: WordformId,
    pub text: String,
    /// Fine-grained, source-specific lexical category such as `NI-3`.
    pub category: String,
    /// Coarse part of speech; may be empty.
    pub pos: String,
    /// Canonical decomposition such as `tłích'ā+N`; empty when unanalyzable.
    pub analysis: String,
    pub is_lemma: bool,
    pub as_is: bool,
    pub lemma: WordformId,
}

/// Parts of speech and category prefixes treated as closed-class items.
const CLOSED_CLASS_POS: [&str; 4] = ["IPV", "IPC", "PRON", "PART"];
const CLOSED_CLASS_CATEGORIES: [&str; 11] = [
    "IPV", "IPC", "IPJ", "IPH", "IPN", "IPP", "PRON", "PART", "PRA", "PRI", "PR",
];

impl Wordform {
    /// Whether this form is a closed-class item (preverb, particle, pronoun).
    ///
    /// Closed-class items are surfaced by English lookup even when `as_is`.
    pub fn is_closed_class(&self) -> bool {
        let pos = self.pos.trim().to_ascii_uppercase();
        if CLOSED_CLASS_POS.contains(&pos.as_str()) {
            return true;
        }
        let base = category_base(&self.category).to_ascii_uppercase();
        CLOSED_CLASS_CATEGORIES.contains(&base.as_str())
    }
}

/// Leading category code, e.g. `NI-3` → `NI`, `IPC ;; IPJ` → `IPC`,
/// `IPJ  Exclamation` → `IPJ`.
pub fn category_base(category: &str) -> &str {
    let trimmed = category.trim();
    trimmed
        .split(|c: char| c == '-' || c == ';' || c.is_whitespace())
        .next()
        .unwrap_or(trimmed)
}

/// One gloss of a lemma's meaning, with its citation sources.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Definition {
    pub id: u32,
    pub text: String,
    pub lemma: WordformId,
    /// Source identifiers, sorted and deduplicated.
    pub sources: Vec<String>,
}

/// English token pointing at a lemma, used for English → dictionary lookup.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct EnglishKeyword {
    pub id: u32,
    pub text: String,
    pub lemma: WordformId,
}

/// Language a search match occurred in. Target-language matches sort first.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Language {
    /// The dictionary's own language.
    Target,
    English,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Target => "target",
            Language::English => "english",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which wordforms the affix index covers.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum IndexScope {
    #[default]
    Lemmas,
    AllWordforms,
}

impl IndexScope {
    /// Parse `lemmas` or `all` (case-insensitive).
    pub fn from_name(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lemmas" | "lemma" => Some(IndexScope::Lemmas),
            "all" | "wordforms" => Some(IndexScope::AllWordforms),
            _ => None,
        }
    }

    pub fn includes(self, wordform: &Wordform) -> bool {
        match self {
            IndexScope::Lemmas => wordform.is_lemma,
            IndexScope::AllWordforms => true,
        }
    }
}

impl fmt::Display for IndexScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndexScope::Lemmas => "lemmas",
            IndexScope::AllWordforms => "all",
        })
    }
}

/// Field names accepted as disambiguators.
pub const DISAMBIGUATOR_FIELDS: [&str; 2] = ["pos", "lexical_category"];

/// Validated field → value filters narrowing a lookup.
///
/// Built from untyped pairs once per request; unknown field names are a
/// configuration error and are rejected rather than ignored.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Disambiguators {
    pos: Option<String>,
    lexical_category: Option<String>,
}

impl Disambiguators {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, DisambiguatorError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut out = Self::default();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.as_ref().trim();
            if value.is_empty() {
                return Err(DisambiguatorError::EmptyValue(key.to_string()));
            }
            match key {
                "pos" => out.pos = Some(value.to_string()),
                "lexical_category" => out.lexical_category = Some(value.to_string()),
                other => return Err(DisambiguatorError::UnknownField(other.to_string())),
            }
        }
        Ok(out)
    }

    pub fn pos(&self) -> Option<&str> {
        self.pos.as_deref()
    }

    pub fn lexical_category(&self) -> Option<&str> {
        self.lexical_category.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_none() && self.lexical_category.is_none()
    }

    /// Case-insensitive equality on every supplied field.
    pub fn matches(&self, wordform: &Wordform) -> bool {
        let pos_ok = self
            .pos
            .as_deref()
            .is_none_or(|p| p.eq_ignore_ascii_case(wordform.pos.trim()));
        let category_ok = self
            .lexical_category
            .as_deref()
            .is_none_or(|c| c.eq_ignore_ascii_case(wordform.category.trim()));
        pos_ok && category_ok
    }
}

/// Rejected disambiguator input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DisambiguatorError {
    UnknownField(String),
    EmptyValue(String),
}

impl fmt::Display for DisambiguatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisambiguatorError::UnknownField(name) => write!(
                f,
                "invalid disambiguator field {name:?} (expected one of: {})",
                DISAMBIGUATOR_FIELDS.join(", ")
            ),
            DisambiguatorError::EmptyValue(name) => {
                write!(f, "disambiguator {name:?} must not be empty")
            }
        }
    }
}

impl Error for DisambiguatorError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn wordform(pos: &str, category: &str) -> Wordform {
        Wordform {
            id: WordformId(1),
            text: "ayi".into(),
            category: category.into(),
            pos: pos.into(),
            analysis: String::new(),
            is_lemma: true,
            as_is: true,
            lemma: WordformId(1),
        }
    }

    #[test]
    fn closed_class_by_pos_or_category() {
        assert!(wordform("IPV", "").is_closed_class());
        assert!(wordform("Pron", "").is_closed_class());
        assert!(wordform("", "IPC").is_closed_class());
        assert!(wordform("", "PrA").is_closed_class());
        for category in ["IPJ", "IPH", "IPN", "IPP", "IPC ;; IPJ", "IPJ  Exclamation", "Pron"] {
            assert!(wordform("", category).is_closed_class(), "{category}");
        }
        assert!(!wordform("N", "NI-3").is_closed_class());
        assert!(!wordform("", "").is_closed_class());
    }

    #[test]
    fn category_base_strips_variant() {
        assert_eq!(category_base("NI-3"), "NI");
        assert_eq!(category_base("VTA"), "VTA");
        assert_eq!(category_base(" NDA-x "), "NDA");
        assert_eq!(category_base(""), "");
        assert_eq!(category_base("IPC ;; IPJ"), "IPC");
        assert_eq!(category_base("IPJ  Exclamation"), "IPJ");
    }

    #[test]
    fn disambiguators_reject_unknown_fields() {
        let err = Disambiguators::from_pairs([("colour", "red")]).unwrap_err();
        assert_eq!(err, DisambiguatorError::UnknownField("colour".into()));
        assert!(err.to_string().contains("invalid disambiguator"));

        let err = Disambiguators::from_pairs([("pos", "  ")]).unwrap_err();
        assert_eq!(err, DisambiguatorError::EmptyValue("pos".into()));
    }

    #[test]
    fn disambiguators_match_case_insensitively() {
        let filter = Disambiguators::from_pairs([("pos", "n"), ("lexical_category", "ni-3")])
            .unwrap();
        assert!(filter.matches(&wordform("N", "NI-3")));
        assert!(!filter.matches(&wordform("N", "NA-1")));
        assert!(Disambiguators::none().matches(&wordform("", "")));
    }

    #[test]
    fn languages_order_target_first() {
        assert!(Language::Target < Language::English);
        assert_eq!(Language::English.to_string(), "english");
    }
}
