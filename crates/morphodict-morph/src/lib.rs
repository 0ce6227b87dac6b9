//! Orthography and morphology helpers for morphodict.
//!
//! - [`orthography`]: the [`Orthography`] strategy with display
//!   ([`Orthography::normalize`]) and search-key ([`Orthography::search_key`])
//!   transforms, plus the Tsuut'ina and Plains Cree rules.
//! - [`analysis`]: parsing and rendering of analysis strings, and synthesis of
//!   analyses for unanalyzable (`as_is`) entries.
//! - [`analyzer`]: the [`Analyzer`] seam the search core calls for exact
//!   analyses, with a table-backed implementation.
//!
//! # Example
//! ```
//! use morphodict_morph::{Analysis, Orthography, Tsuutina};
//!
//! assert_eq!(Tsuutina.search_key("Gúnā-hà"), "gunaha");
//! let analysis = Analysis::parse("tłích'ā+N").unwrap();
//! assert_eq!(analysis.lemma, "tłích'ā");
//! ```
//!
//! For a runnable demo, see `cargo run -p morphodict-morph --example lookup -- <word> [table.tsv]`.

pub mod analysis;
pub mod analyzer;
pub mod orthography;

pub use analysis::{Analysis, AnalysisError, as_is_analysis};
pub use analyzer::{Analyzer, NoAnalyzer, TableAnalyzer};
pub use orthography::{Orthography, OrthographyError, PlainsCree, Tsuutina, orthography_by_name};
