//! Morphological analyzer adapters.
//!
//! The search core treats the analyzer as an external collaborator. It only
//! needs the set of analyses for a normalized query; an empty set means the
//! core falls back to affix and English-keyword matches.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::orthography::Orthography;

pub trait Analyzer: Send + Sync {
    /// Analyses for a display-normalized query.
    fn analyze(&self, normalized_query: &str) -> BTreeSet<String>;
}

/// Analyzer that never recognises anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAnalyzer;

impl Analyzer for NoAnalyzer {
    fn analyze(&self, _normalized_query: &str) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// Analyzer backed by a precomputed `surface<TAB>analysis[<TAB>analysis…]`
/// table, typically dumped from a finite-state analyzer.
///
/// Surfaces are keyed by their lowercased display normalization, so lookups
/// are insensitive to case and to the orthography's letter variants.
pub struct TableAnalyzer {
    table: HashMap<String, BTreeSet<String>>,
}

impl TableAnalyzer {
    /// Load a table file. Blank lines and `#` comments are skipped.
    pub fn load(path: impl AsRef<Path>, orthography: &dyn Orthography) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("missing analyzer table: {}", path.display());
        }
        let file = File::open(path).with_context(|| format!("open analyzer table {}", path.display()))?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line =
                line.with_context(|| format!("read line {} in {}", lineno + 1, path.display()))?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split('\t');
            let surface = parts.next().unwrap_or_default();
            let analyses: Vec<&str> = parts.map(str::trim).filter(|a| !a.is_empty()).collect();
            if surface.trim().is_empty() || analyses.is_empty() {
                anyhow::bail!(
                    "{}:{} expected surface<TAB>analysis",
                    path.display(),
                    lineno + 1
                );
            }
            for analysis in analyses {
                entries.push((surface.to_string(), analysis.to_string()));
            }
        }
        let analyzer = Self::from_entries(entries, orthography);
        info!(
            "loaded {} analyzable surfaces from {}",
            analyzer.len(),
            path.display()
        );
        Ok(analyzer)
    }

    pub fn from_entries<I, S, A>(entries: I, orthography: &dyn Orthography) -> Self
    where
        I: IntoIterator<Item = (S, A)>,
        S: AsRef<str>,
        A: Into<String>,
    {
        let mut table: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (surface, analysis) in entries {
            let key = surface_key(surface.as_ref(), orthography);
            table.entry(key).or_default().insert(analysis.into());
        }
        Self { table }
    }

    /// Number of distinct surfaces.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Analyzer for TableAnalyzer {
    fn analyze(&self, normalized_query: &str) -> BTreeSet<String> {
        self.table
            .get(&normalized_query.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }
}

fn surface_key(surface: &str, orthography: &dyn Orthography) -> String {
    orthography.normalize(surface).to_lowercase()
}
