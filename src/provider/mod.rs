//! Patent-search provider access.

pub mod enrich;
pub mod serpapi;

pub use enrich::PageEnricher;
pub use serpapi::{ProviderSettings, SerpApiClient};
