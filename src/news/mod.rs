//! Company news: the provider seam, the NewsAPI client and keyword signals

mod article;
pub mod keywords;
mod newsapi;
mod pacer;
mod provider;
mod signals;

pub use article::NewsArticle;
pub use keywords::{is_controversial, EsgTheme, CONTROVERSY_KEYWORDS};
pub use newsapi::{
    build_query, parse_everything_response, NewsApiClient, DEFAULT_ESG_TERMS, SECTOR_ESG_TERMS,
};
pub use pacer::RequestPacer;
pub use provider::{NewsProvider, StaticNewsProvider};
pub use signals::{extract_esg_signals, EsgSignals};
