//! Development server for the vitrine story gallery.
//!
//! Serves the gallery from an in-memory catalog, rebuilds it when story
//! files change and pushes reloads and in-page navigation over a WebSocket.

pub mod server;
pub mod watcher;
pub mod websocket;

pub use server::{rebuild, router, DevServer, DevServerConfig, ServerError, ServerState};
pub use watcher::{FileWatcher, WatchEvent};
pub use websocket::{ClientMessage, HmrHub, HmrMessage, NavigationQueue};
