//! WebSocket live reload and in-page story navigation.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use vitrine_stories::{Supersede, Ticket};

/// Messages sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HmrMessage {
    /// Connection established
    Connected,

    /// Full page reload
    Reload,

    /// A story was resolved and rendered
    Render {
        slug: String,
        title: String,
        /// Content pane HTML
        html: String,
    },

    /// No story is registered under the requested slug
    NotFound {
        slug: String,
        /// Content pane HTML for the not-found state
        html: String,
    },

    /// The story tree could not be rebuilt or a pane failed to render
    Error { message: String },
}

/// Messages sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Show the story with this slug
    Navigate { slug: String },
}

/// Hub for broadcasting messages to all connected clients.
#[derive(Debug, Clone)]
pub struct HmrHub {
    sender: broadcast::Sender<HmrMessage>,
}

impl HmrHub {
    /// Create a new HMR hub.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: HmrMessage) {
        // No receivers is fine
        let _ = self.sender.send(msg);
    }

    /// Subscribe to HMR messages.
    pub fn subscribe(&self) -> broadcast::Receiver<HmrMessage> {
        self.sender.subscribe()
    }
}

impl Default for HmrHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Pending navigations for one connection.
///
/// Every navigation takes a ticket; only the result for the latest ticket
/// is ever handed out, so a slow load finishing after a newer request is
/// dropped instead of replacing what the user asked for last.
pub struct NavigationQueue {
    supersede: Supersede,
    tx: mpsc::UnboundedSender<(Ticket, HmrMessage)>,
    rx: mpsc::UnboundedReceiver<(Ticket, HmrMessage)>,
}

impl NavigationQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            supersede: Supersede::new(),
            tx,
            rx,
        }
    }

    /// Start a navigation, superseding any still pending.
    pub fn start<F>(&self, load: F) -> Ticket
    where
        F: Future<Output = HmrMessage> + Send + 'static,
    {
        let ticket = self.supersede.begin();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let msg = load.await;
            let _ = tx.send((ticket, msg));
        });

        ticket
    }

    /// Next result of a navigation that is still current.
    ///
    /// Cancel safe: stale results are discarded as they arrive.
    pub async fn next(&mut self) -> Option<HmrMessage> {
        while let Some((ticket, msg)) = self.rx.recv().await {
            if self.supersede.is_current(ticket) {
                return Some(msg);
            }
            tracing::debug!("Dropping superseded navigation #{}", ticket.id());
        }
        None
    }
}

impl Default for NavigationQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate the client-side live reload and navigation script.
pub fn hmr_client_script() -> String {
    HMR_CLIENT.to_string()
}

const HMR_CLIENT: &str = r#"
(function() {
  'use strict';

  const pane = document.getElementById('story-pane');
  const sidebar = document.querySelector('.sidebar');
  const prefix = ((sidebar && sidebar.dataset.prefix) || '').replace(/\/+$/, '');
  const protocol = location.protocol === 'https:' ? 'wss:' : 'ws:';
  let ws = null;
  let reconnectAttempts = 0;
  const maxReconnectAttempts = 10;

  function slugFromPath(path) {
    const base = prefix + '/';
    if (!path.startsWith(base)) return null;
    const slug = path.slice(base.length).replace(/\/+$/, '');
    return slug.length ? decodeURIComponent(slug) : null;
  }

  function routeFor(slug) {
    return prefix + '/' + slug.split('/').map(encodeURIComponent).join('/');
  }

  function navigate(slug) {
    if (!ws || ws.readyState !== WebSocket.OPEN) return false;
    ws.send(JSON.stringify({ type: 'navigate', slug: slug }));
    return true;
  }

  function show(msg) {
    if (!pane) {
      location.reload();
      return;
    }
    pane.innerHTML = msg.html;
    const path = routeFor(msg.slug);
    if (location.pathname !== path) {
      history.pushState({ slug: msg.slug }, '', path);
    }
    if (window.__vitrineMarkActive) {
      window.__vitrineMarkActive(msg.type === 'render' ? path : null);
    }
  }

  document.addEventListener('click', function(event) {
    const link = event.target.closest && event.target.closest('a[data-slug]');
    if (!link || event.metaKey || event.ctrlKey || event.shiftKey || event.button !== 0) return;
    if (navigate(link.dataset.slug)) {
      event.preventDefault();
    }
  });

  window.addEventListener('popstate', function() {
    const slug = slugFromPath(location.pathname);
    if (slug === null || !navigate(slug)) {
      location.reload();
    }
  });

  function connect() {
    ws = new WebSocket(protocol + '//' + location.host + '/__hmr');

    ws.onopen = function() {
      console.log('[vitrine] Connected');
      reconnectAttempts = 0;
    };

    ws.onmessage = function(event) {
      const msg = JSON.parse(event.data);

      switch (msg.type) {
        case 'reload':
          location.reload();
          break;

        case 'render':
          document.title = msg.title + ' - ' + document.title.split(' - ').pop();
          show(msg);
          break;

        case 'not_found':
          show(msg);
          break;

        case 'error':
          console.error('[vitrine]', msg.message);
          break;

        case 'connected':
          console.log('[vitrine] Server acknowledged connection');
          break;
      }
    };

    ws.onclose = function() {
      console.log('[vitrine] Disconnected');
      if (reconnectAttempts < maxReconnectAttempts) {
        reconnectAttempts++;
        setTimeout(connect, 1000 * reconnectAttempts);
      }
    };

    ws.onerror = function(e) {
      console.error('[vitrine] WebSocket error:', e);
    };
  }

  connect();
})();
"#;
