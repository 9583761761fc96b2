//! Release finder library for locating torrent releases of anime.
//!
//! This library resolves AniList ids into AniDB ids through a chain of
//! mapping services, then chains those ids through the animetosho feed and
//! the Nyaa index to produce releases ranked by seeder count.

pub mod aggregator;
pub mod api;
pub mod extractor;
pub mod mapper;
pub mod search;
pub mod seadex;
pub mod selector;

pub use aggregator::{AggregateOutcome, AggregateReport, FeedQuery, ReleaseAggregator};
pub use api::HttpClient;
pub use extractor::extract;
pub use mapper::{
    extract_catalogue_id, parse_catalogue_ref, FindMyAnimeProvider, IdentifierMapper,
    MappingProvider, MappingServiceProvider, ProviderOutcome,
};
pub use search::SearchProvider;
pub use seadex::SeadexClient;
pub use selector::ReleaseSelector;
