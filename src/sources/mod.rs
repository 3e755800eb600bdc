pub mod channel;
pub mod plugin;

pub use channel::ChannelScraper;
pub use plugin::{InMemoryPluginRegistry, PluginRegistry, SearchPlugin};
