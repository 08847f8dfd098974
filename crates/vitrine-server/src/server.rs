//! Development server implementation.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

use vitrine_adapters::{RenderContext, StoryRegistry};
use vitrine_static::{AssetPipeline, Gallery};
use vitrine_stories::{
    enumerate_routes, slug_from_param, Catalog, RouteParam, ScanOptions, Slug,
    StoryDescriptor, StoryError, Supersede, Ticket,
};

use crate::watcher::{FileWatcher, WatchEvent};
use crate::websocket::{hmr_client_script, ClientMessage, HmrHub, HmrMessage, NavigationQueue};

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Root of the story tree
    pub stories_dir: PathBuf,

    /// Story file extensions to scan for
    pub extensions: Vec<String>,

    /// URL prefix for story pages
    pub prefix: String,

    /// Gallery title
    pub title: String,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            stories_dir: PathBuf::from("components"),
            extensions: ["tsx", "jsx", "ts", "js"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            prefix: "/_/dev".to_string(),
            title: "Stories".to_string(),
            port: 7777,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

impl DevServerConfig {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::with_extensions(&self.extensions)
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address {0}")]
    AddressError(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),

    #[error(transparent)]
    Stories(#[from] StoryError),
}

/// The catalog and registry currently served.
struct Stories {
    catalog: Catalog,
    registry: StoryRegistry,
}

impl Stories {
    fn scan(config: &DevServerConfig) -> Result<Self, StoryError> {
        let (catalog, registry) = StoryRegistry::scan(
            &config.stories_dir,
            &config.scan_options(),
            &RenderContext::default(),
        )?;
        Ok(Self { catalog, registry })
    }
}

/// Shared server state.
pub struct ServerState {
    config: DevServerConfig,
    gallery: Gallery,
    hmr: HmrHub,
    rebuilds: Supersede,
    stories: RwLock<Stories>,
}

impl ServerState {
    /// Scan the story tree and set up state for serving it.
    pub fn load(config: DevServerConfig) -> Result<Arc<Self>, ServerError> {
        let stories = Stories::scan(&config)?;
        let gallery =
            Gallery::new(config.title.clone(), config.prefix.clone()).with_live_reload(true);

        Ok(Arc::new(Self {
            config,
            gallery,
            hmr: HmrHub::new(),
            rebuilds: Supersede::new(),
            stories: RwLock::new(stories),
        }))
    }

    pub fn hmr(&self) -> &HmrHub {
        &self.hmr
    }

    /// Number of stories currently served.
    pub async fn story_count(&self) -> usize {
        self.stories.read().await.catalog.len()
    }
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Start the development server.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                ServerError::AddressError(format!("{}:{}", self.config.host, self.config.port))
            })?;

        let state = ServerState::load(self.config.clone())?;
        tracing::info!(
            "Serving {} stories from {}",
            state.story_count().await,
            self.config.stories_dir.display()
        );

        let scan = self.config.scan_options();
        let (watcher, mut rx) = FileWatcher::new(&[self.config.stories_dir.clone()], scan.kinds)
            .map_err(|e| ServerError::WatchError(e.to_string()))?;

        let watch_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                handle_watch_event(&watch_state, event);
            }
            // Keep watcher alive
            drop(watcher);
        });

        let app = router(state);

        tracing::info!("Starting dev server at http://{}", addr);

        if self.config.open {
            let url = format!("http://{}", addr);
            let _ = open::that(&url);
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}

/// Build the dev server router.
pub fn router(state: Arc<ServerState>) -> Router {
    let prefix = state.config.prefix.trim_matches('/');
    let story_route = if prefix.is_empty() {
        "/{*story}".to_string()
    } else {
        format!("/{}/{{*story}}", prefix)
    };

    Router::new()
        .route("/", get(index_handler))
        .route(&story_route, get(story_handler))
        .route("/__vitrine/catalog.json", get(catalog_handler))
        .route("/__hmr", get(ws_handler))
        .route("/__hmr.js", get(hmr_script_handler))
        .route("/assets/main.css", get(css_handler))
        .route("/assets/main.js", get(js_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

/// Handle file watch events.
fn handle_watch_event(state: &Arc<ServerState>, event: WatchEvent) {
    if event.needs_rebuild() {
        tracing::info!("Story tree changed: {}", event.path().display());
        tokio::spawn(rebuild(Arc::clone(state)));
    } else {
        tracing::debug!("Source modified: {}", event.path().display());
        state.hmr.send(HmrMessage::Reload);
    }
}

/// Rescan the story tree and publish it unless a newer rebuild started.
pub async fn rebuild(state: Arc<ServerState>) {
    let ticket = state.rebuilds.begin();
    rebuild_for(state, ticket).await;
}

async fn rebuild_for(state: Arc<ServerState>, ticket: Ticket) {
    let config = state.config.clone();
    let scanned = tokio::task::spawn_blocking(move || Stories::scan(&config)).await;

    match scanned {
        Ok(Ok(stories)) => {
            let count = stories.catalog.len();
            if publish(&state, ticket, stories).await {
                tracing::info!("Rebuilt catalog: {} stories", count);
                state.hmr.send(HmrMessage::Reload);
            } else {
                tracing::debug!("Discarding superseded rebuild #{}", ticket.id());
            }
        }
        Ok(Err(e)) if state.rebuilds.is_current(ticket) => {
            tracing::warn!("Keeping previous catalog: {}", e);
            state.hmr.send(HmrMessage::Error {
                message: e.to_string(),
            });
        }
        Ok(Err(e)) => {
            tracing::debug!("Discarding superseded rebuild #{}: {}", ticket.id(), e);
        }
        Err(e) => tracing::warn!("Rebuild task failed: {}", e),
    }
}

/// Replace the served stories if `ticket` is still the latest rebuild.
async fn publish(state: &ServerState, ticket: Ticket, stories: Stories) -> bool {
    let mut current = state.stories.write().await;
    if !state.rebuilds.is_current(ticket) {
        return false;
    }
    *current = stories;
    true
}

fn page_response(status: StatusCode, page: Result<String, minijinja::Error>) -> Response {
    match page {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::warn!("Failed to render page: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render page: {}", e),
            )
                .into_response()
        }
    }
}

/// Handler for the gallery index.
async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    let stories = state.stories.read().await;
    page_response(StatusCode::OK, state.gallery.index(&stories.catalog))
}

/// Handler for a story page.
async fn story_handler(
    State(state): State<Arc<ServerState>>,
    Path(story): Path<String>,
) -> Response {
    let stories = state.stories.read().await;

    let Some(slug) = slug_from_param(&story) else {
        return page_response(StatusCode::NOT_FOUND, state.gallery.not_found(&stories.catalog));
    };

    let resolution = stories.registry.resolve(slug.as_str());
    let status = if resolution.is_found() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };

    page_response(status, state.gallery.story(&stories.catalog, resolution))
}

async fn not_found_handler(State(state): State<Arc<ServerState>>) -> Response {
    let stories = state.stories.read().await;
    page_response(StatusCode::NOT_FOUND, state.gallery.not_found(&stories.catalog))
}

#[derive(Serialize)]
struct CatalogJson<'a> {
    stories: &'a [StoryDescriptor],
    routes: Vec<RouteParam>,
}

/// Handler for the catalog as JSON.
async fn catalog_handler(State(state): State<Arc<ServerState>>) -> Response {
    let stories = state.stories.read().await;

    Json(CatalogJson {
        stories: stories.catalog.stories(),
        routes: enumerate_routes(&stories.catalog),
    })
    .into_response()
}

async fn css_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css")],
        AssetPipeline::css(false),
    )
}

async fn js_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        AssetPipeline::generate_js(),
    )
}

/// Handler for the live reload client script.
async fn hmr_script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        hmr_client_script(),
    )
}

/// Handler for the live reload WebSocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_ws(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut updates = state.hmr.subscribe();
    let mut navigation = NavigationQueue::new();

    if send(&mut socket, &HmrMessage::Connected).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ClientMessage>(text.as_str()) {
                        Ok(ClientMessage::Navigate { slug }) => {
                            let state = Arc::clone(&state);
                            navigation.start(async move { navigate(&state, &slug).await });
                        }
                        Err(e) => tracing::debug!("Ignoring client message: {}", e),
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            Some(msg) = navigation.next() => {
                if send(&mut socket, &msg).await.is_err() {
                    break;
                }
            }
            update = updates.recv() => match update {
                Ok(msg) => {
                    if send(&mut socket, &msg).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Client missed {} updates", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}

async fn send(socket: &mut WebSocket, msg: &HmrMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}

/// Resolve a navigation request against the current stories.
pub async fn navigate(state: &ServerState, requested: &str) -> HmrMessage {
    let stories = state.stories.read().await;
    let slug = slug_from_param(requested).unwrap_or_else(|| Slug::new(requested));

    let resolution = stories.registry.resolve(slug.as_str());
    let title = resolution.found().map(|story| story.title.clone());

    match (state.gallery.pane(resolution), title) {
        (Ok(html), Some(title)) => HmrMessage::Render {
            slug: slug.to_string(),
            title,
            html,
        },
        (Ok(html), None) => HmrMessage::NotFound {
            slug: slug.to_string(),
            html,
        },
        (Err(e), _) => HmrMessage::Error {
            message: e.to_string(),
        },
    }
}
