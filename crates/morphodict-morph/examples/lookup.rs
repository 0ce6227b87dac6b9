use std::env;

use anyhow::{Context, Result};
use morphodict_morph::{Analysis, Analyzer, NoAnalyzer, TableAnalyzer, orthography_by_name};

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let word = args
        .next()
        .context("usage: cargo run -p morphodict-morph --example lookup -- <word> [table.tsv]")?;
    let table = args.next();

    let orthography = orthography_by_name(
        &env::var("ORTHOGRAPHY").unwrap_or_else(|_| "tsuutina".to_string()),
    )?;
    let analyzer: Box<dyn Analyzer> = match table {
        Some(path) => Box::new(TableAnalyzer::load(&path, orthography.as_ref())?),
        None => Box::new(NoAnalyzer),
    };

    let normalized = orthography.normalize(&word);
    println!("orthography : {}", orthography.name());
    println!("display     : {normalized}");
    println!("search key  : {}", orthography.search_key(&word));

    let analyses = analyzer.analyze(&normalized);
    if analyses.is_empty() {
        println!("no analyses");
    }
    for raw in analyses {
        match Analysis::parse(&raw) {
            Ok(a) => println!(
                "{raw}: head={:?} lemma={} tail={:?}",
                a.head_labels(),
                a.lemma,
                a.tail_labels()
            ),
            Err(err) => println!("{raw}: {err}"),
        }
    }

    Ok(())
}
