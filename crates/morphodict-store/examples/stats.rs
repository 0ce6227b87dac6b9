use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use morphodict_store::{LoadMode, MemoryStore};

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: cargo run -p morphodict-store --example stats -- <dictionary.json>")?;

    let store = MemoryStore::load_with_mode(&path, LoadMode::Mmap)
        .with_context(|| format!("loading dictionary from {}", path.display()))?;

    let mut by_pos: BTreeMap<String, usize> = BTreeMap::new();
    let mut closed_class = 0usize;
    for wf in store.iter_wordforms().filter(|wf| wf.is_lemma) {
        let pos = if wf.pos.is_empty() { "-" } else { wf.pos.as_str() };
        *by_pos.entry(pos.to_string()).or_default() += 1;
        if wf.is_closed_class() {
            closed_class += 1;
        }
    }

    println!("Dictionary   : {}", path.display());
    println!("Wordforms    : {}", store.wordform_count());
    println!("Lemmas       : {}", store.lemma_count());
    println!("As-is forms  : {}", store.as_is_count());
    println!("Closed-class lemmas: {}", closed_class);
    println!("Definitions  : {}", store.definition_count());
    println!("Keywords     : {}", store.keyword_count());
    for (pos, count) in by_pos {
        println!("  lemmas with pos {pos:>5}: {count}");
    }

    Ok(())
}
