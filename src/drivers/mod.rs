pub mod channel_driver;
pub mod plugin_driver;

pub use channel_driver::ChannelSearchDriver;
pub use plugin_driver::PluginSearchDriver;
