use renderer::PaintConfig;
use tiles::TileGridConfig;

pub const DEFAULT_EVENT_CAPACITY: usize = 1024;
pub const DEFAULT_VIEW_LANGUAGE: &str = "en-US";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginConfig {
    pub tiles: TileGridConfig,
    pub paint: PaintConfig,
    /// Engine callbacks buffered between pumps before the sink overflows.
    pub event_capacity: usize,
    pub view_language: &'static str,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            tiles: TileGridConfig::default(),
            paint: PaintConfig::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            view_language: DEFAULT_VIEW_LANGUAGE,
        }
    }
}
