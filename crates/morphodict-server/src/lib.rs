pub mod affix;
pub mod engine;
pub mod handlers;
pub mod ranker;
pub mod resolver;

pub use affix::AffixIndex;
pub use engine::{SearchConfig, SearchEngine};
pub use handlers::{AppState, router};
pub use ranker::{Breakdown, SearchResult, rank};
pub use resolver::{
    AFFIX_SEARCH_THRESHOLD, CreeResult, EnglishResult, LexicalResolver, MatchedForm, Resolution,
    SearchError,
};
