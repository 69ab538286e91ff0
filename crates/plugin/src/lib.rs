//! A document view embedded in a host page.
//!
//! `OfficePlugin` mounts an engine view, keeps the tile cache in step with the
//! viewport and turns engine callbacks into cache invalidations. The host drives it
//! from its UI thread: report geometry, pump callbacks, paint, blit what is ready.

mod config;
mod plugin;
mod sink;
mod tile_renderer;

pub use config::{DEFAULT_EVENT_CAPACITY, DEFAULT_VIEW_LANGUAGE, PluginConfig};
pub use plugin::{HostEvent, OfficePlugin, PluginError, PluginState};
pub use sink::CallbackSink;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;
