//! `ChannelScraper` — the C3 collaborator. Concrete scraper backends (the
//! actual Telegram-channel HTTP scraping) are an external collaborator; this
//! module owns only the contract (`async_trait`, `Send + Sync`, one `search`
//! entry point).

use async_trait::async_trait;

use crate::domain::SearchResult;
use crate::error::Result;

#[async_trait]
pub trait ChannelScraper: Send + Sync {
    /// Search a single named channel for `keyword`.
    async fn search(&self, keyword: &str, channel: &str) -> Result<Vec<SearchResult>>;
}
