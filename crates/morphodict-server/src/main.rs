use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, bail};
use morphodict_morph::{Analyzer, NoAnalyzer, Orthography, TableAnalyzer, orthography_by_name};
use morphodict_store::{LoadMode, MemoryStore};
use morphodict_types::IndexScope;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use morphodict_server::{AFFIX_SEARCH_THRESHOLD, AppState, SearchConfig, SearchEngine, router};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_DICTIONARY: &str = "dictionary.json";
const DEFAULT_ORTHOGRAPHY: &str = "tsuutina";
const MAX_PAGE_SIZE: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config()?;
    info!("binding to {}:{}", config.host, config.port);
    info!(
        "using dictionary at {} (mode: {:?})",
        config.dictionary_path.display(),
        config.load_mode
    );
    info!(
        "orthography {}, affix index over {} (threshold {})",
        config.orthography, config.search.index_scope, config.search.affix_threshold
    );
    if config.disable_cache {
        info!("cache headers disabled");
    }

    let orthography = orthography_by_name(&config.orthography)?;
    let analyzer = load_analyzer(&config.analyzer, orthography.as_ref())?;

    let start = Instant::now();
    let store = MemoryStore::load_with_mode(&config.dictionary_path, config.load_mode)?;
    info!("dictionary loaded in {} ms", start.elapsed().as_millis());

    let engine = SearchEngine::build(Arc::new(store), analyzer, orthography, config.search)?;

    let state = AppState {
        engine: Arc::new(engine),
        max_page_size: MAX_PAGE_SIZE,
        disable_cache: config.disable_cache,
    };

    let app = router(state).layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Clone)]
enum AnalyzerSetting {
    Disabled,
    Table(PathBuf),
}

#[derive(Debug, Clone)]
struct Config {
    host: String,
    port: u16,
    dictionary_path: PathBuf,
    load_mode: LoadMode,
    analyzer: AnalyzerSetting,
    orthography: String,
    search: SearchConfig,
    disable_cache: bool,
}

fn load_config() -> anyhow::Result<Config> {
    load_config_from(env::args().skip(1), |name| env::var(name).ok())
}

/// Flags that take a value, as `--flag=value` or `--flag value`.
const VALUE_FLAGS: [&str; 5] = [
    "--dictionary",
    "--load-mode",
    "--analyzer",
    "--orthography",
    "--index-scope",
];

fn load_config_from<I, F>(args: I, var: F) -> anyhow::Result<Config>
where
    I: IntoIterator<Item = String>,
    F: Fn(&str) -> Option<String>,
{
    let mut disable_cache = false;
    let mut flags: HashMap<&'static str, String> = HashMap::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--no-cache" {
            disable_cache = true;
            continue;
        }
        let (name, inline) = match arg.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (arg.as_str(), None),
        };
        let Some(flag) = VALUE_FLAGS.iter().copied().find(|f| *f == name) else {
            warn!("ignoring unknown argument {arg}");
            continue;
        };
        let value = match inline {
            Some(value) => value,
            None => args
                .next()
                .with_context(|| format!("{flag} expects a value"))?,
        };
        flags.insert(flag, value);
    }
    let setting = |flag: &str, env_name: &str| flags.get(flag).cloned().or_else(|| var(env_name));

    let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = match var("PORT") {
        Some(raw) => raw
            .trim()
            .parse::<u16>()
            .with_context(|| format!("invalid PORT {raw:?}"))?,
        None => DEFAULT_PORT,
    };
    let dictionary_path = setting("--dictionary", "DICTIONARY_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DICTIONARY));

    let load_mode = match setting("--load-mode", "DICTIONARY_LOAD_MODE") {
        Some(raw) => LoadMode::from_name(&raw)
            .with_context(|| format!("unknown load mode {raw:?} (expected mmap or owned)"))?,
        None => LoadMode::Mmap,
    };

    let analyzer = match setting("--analyzer", "ANALYZER") {
        Some(raw) if raw.trim().eq_ignore_ascii_case("none") => AnalyzerSetting::Disabled,
        Some(raw) if !raw.trim().is_empty() => AnalyzerSetting::Table(PathBuf::from(raw.trim())),
        _ => bail!("no morphological analyzer configured: set ANALYZER to a table path or \"none\""),
    };

    let orthography = setting("--orthography", "ORTHOGRAPHY")
        .unwrap_or_else(|| DEFAULT_ORTHOGRAPHY.to_string());

    let index_scope = match setting("--index-scope", "AFFIX_INDEX_SCOPE") {
        Some(raw) => IndexScope::from_name(&raw)
            .with_context(|| format!("unknown affix index scope {raw:?} (expected lemmas or all)"))?,
        None => IndexScope::Lemmas,
    };
    let affix_threshold = match var("AFFIX_SEARCH_THRESHOLD") {
        Some(raw) => raw.trim().parse::<usize>().with_context(|| {
            format!("invalid AFFIX_SEARCH_THRESHOLD {raw:?} (expected a non-negative integer)")
        })?,
        None => AFFIX_SEARCH_THRESHOLD,
    };

    Ok(Config {
        host,
        port,
        dictionary_path,
        load_mode,
        analyzer,
        orthography,
        search: SearchConfig {
            affix_threshold,
            index_scope,
        },
        disable_cache,
    })
}

fn load_analyzer(
    setting: &AnalyzerSetting,
    orthography: &dyn Orthography,
) -> anyhow::Result<Arc<dyn Analyzer>> {
    match setting {
        AnalyzerSetting::Disabled => {
            info!("morphological analysis disabled");
            Ok(Arc::new(NoAnalyzer))
        }
        AnalyzerSetting::Table(path) => {
            let table = TableAnalyzer::load(path, orthography)?;
            Ok(Arc::new(table))
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
