//! Catalog Adapter - 音色来源

mod http_voice_fetcher;
mod static_voice_fetcher;

pub use http_voice_fetcher::{HttpVoiceFetcher, HttpVoiceFetcherConfig};
pub use static_voice_fetcher::StaticVoiceFetcher;
