//! Analysis strings: `[prefix+]*lemma(+tag)+`.
//!
//! Prefix tokens mark preverbs and reduplication (`PV/e`, `RdplW`); the first
//! token that is not a prefix is the lemma and every token after it is a tag.

use std::fmt;
use std::str::FromStr;

use morphodict_types::category_base;
use thiserror::Error;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum AnalysisError {
    #[error("empty analysis")]
    Empty,
    #[error("analysis {0:?} has an empty segment")]
    EmptySegment(String),
    #[error("analysis {0:?} has no lemma")]
    MissingLemma(String),
    #[error("analysis {0:?} has no tags")]
    MissingTags(String),
}

/// A parsed analysis.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Analysis {
    pub prefixes: Vec<String>,
    pub lemma: String,
    pub suffixes: Vec<String>,
}

impl Analysis {
    pub fn parse(raw: &str) -> Result<Self, AnalysisError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AnalysisError::Empty);
        }

        let mut prefixes = Vec::new();
        let mut lemma: Option<String> = None;
        let mut suffixes = Vec::new();
        for token in trimmed.split('+') {
            let token = token.trim();
            if token.is_empty() {
                return Err(AnalysisError::EmptySegment(trimmed.to_string()));
            }
            match lemma {
                None if is_prefix_tag(token) => prefixes.push(token.to_string()),
                None => lemma = Some(token.to_string()),
                Some(_) => suffixes.push(token.to_string()),
            }
        }

        let Some(lemma) = lemma else {
            return Err(AnalysisError::MissingLemma(trimmed.to_string()));
        };
        if suffixes.is_empty() {
            return Err(AnalysisError::MissingTags(trimmed.to_string()));
        }
        Ok(Self {
            prefixes,
            lemma,
            suffixes,
        })
    }

    /// Canonical string form; `parse(a.concatenate()) == a`.
    pub fn concatenate(&self) -> String {
        let mut out = String::new();
        for prefix in &self.prefixes {
            out.push_str(prefix);
            out.push('+');
        }
        out.push_str(&self.lemma);
        for tag in &self.suffixes {
            out.push('+');
            out.push_str(tag);
        }
        out
    }

    /// Labels shown before the lemma in a linguistic breakdown.
    pub fn head_labels(&self) -> &[String] {
        &self.prefixes
    }

    /// Labels shown after the lemma in a linguistic breakdown.
    pub fn tail_labels(&self) -> &[String] {
        &self.suffixes
    }
}

impl FromStr for Analysis {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Analysis::parse(s)
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.concatenate())
    }
}

fn is_prefix_tag(token: &str) -> bool {
    token.contains('/') || token.starts_with("Rdpl")
}

/// Lexical categories with a known tag rendering.
const CATEGORY_TAGS: [(&str, &str); 11] = [
    ("NA", "+N+A"),
    ("NI", "+N+I"),
    ("NDA", "+N+A+D"),
    ("NDI", "+N+I+D"),
    ("VAI", "+V+AI"),
    ("VII", "+V+II"),
    ("VTA", "+V+TA"),
    ("VTI", "+V+TI"),
    ("IPC", "+Ipc"),
    ("IPV", "+Ipv"),
    ("PRON", "+Pron"),
];

/// Synthesize an analysis for an entry whose analysis could not be derived.
///
/// Prefers the lexical category's tags, falls back to the part of speech, and
/// yields an empty string when neither is usable.
pub fn as_is_analysis(lemma: &str, pos: &str, category: &str) -> String {
    let base = category_base(category).to_ascii_uppercase();
    if let Some((_, tags)) = CATEGORY_TAGS.iter().find(|(name, _)| *name == base) {
        return format!("{lemma}{tags}");
    }
    let pos = pos.trim();
    if pos.is_empty() || pos == "-" {
        String::new()
    } else {
        format!("{lemma}+{pos}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixes_lemma_and_tags() {
        let a = Analysis::parse("PV/e+RdplW+nipâw+V+AI+Cnj+3Sg").unwrap();
        assert_eq!(a.prefixes, vec!["PV/e", "RdplW"]);
        assert_eq!(a.lemma, "nipâw");
        assert_eq!(a.tail_labels(), ["V", "AI", "Cnj", "3Sg"]);
        assert_eq!(a.concatenate(), "PV/e+RdplW+nipâw+V+AI+Cnj+3Sg");
    }

    #[test]
    fn parses_bare_lemma_with_tag() {
        let a: Analysis = "tłích'ā+N".parse().unwrap();
        assert!(a.head_labels().is_empty());
        assert_eq!(a.lemma, "tłích'ā");
        assert_eq!(a.to_string(), "tłích'ā+N");
    }

    #[test]
    fn rejects_malformed_analyses() {
        assert_eq!(Analysis::parse("  "), Err(AnalysisError::Empty));
        assert!(matches!(
            Analysis::parse("atim++N"),
            Err(AnalysisError::EmptySegment(_))
        ));
        assert!(matches!(
            Analysis::parse("PV/e"),
            Err(AnalysisError::MissingLemma(_))
        ));
        assert!(matches!(
            Analysis::parse("atim"),
            Err(AnalysisError::MissingTags(_))
        ));
    }

    #[test]
    fn synthesizes_as_is_analyses() {
        assert_eq!(
            as_is_analysis("ihtatwêwitam", "V", "VTI"),
            "ihtatwêwitam+V+TI"
        );
        assert_eq!(as_is_analysis("wayawîwin", "N", "NI-2"), "wayawîwin+N+I");
        assert_eq!(as_is_analysis("wayawîwin", "", "NI"), "wayawîwin+N+I");
        assert_eq!(as_is_analysis("wayawîwin", "N", "IPP"), "wayawîwin+N");
        assert_eq!(as_is_analysis("wayawîwin", "N", ""), "wayawîwin+N");
        assert_eq!(as_is_analysis("wayawîwin", "", ""), "");
        assert_eq!(as_is_analysis("wayawîwin", "-", "IPP"), "");
    }
}
