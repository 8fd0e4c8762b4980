//! File server implementation

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::HeaderMap,
    middleware,
    routing::get,
    Router,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use super::auth::{auth_middleware, session_token};
use super::live::live_updates;
use super::pages::{browse, index, login_page, login_submit, logout};
use super::routes::{api_files, api_random_media, serve_file};
use crate::broadcast::BroadcastHub;
use crate::browse::ServedRoot;
use crate::core::error::TreecastError;
use crate::session::{PasswordVerifier, SessionStore};

/// Upper bound on the interval between expired-session sweeps
pub const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Shared state for the request handlers
#[derive(Clone)]
pub struct ServerState {
    /// Directory being served
    pub root: Arc<ServedRoot>,
    /// Issued session tokens
    pub sessions: Arc<SessionStore>,
    /// Live client registry
    pub hub: BroadcastHub,
    /// Password check; `None` disables the gate
    pub verifier: Option<Arc<dyn PasswordVerifier>>,
    /// Show the random-media button in the shell
    pub random_button: bool,
}

impl ServerState {
    /// State with no password gate and no session expiry
    pub fn new(root: ServedRoot, hub: BroadcastHub) -> Self {
        Self {
            root: Arc::new(root),
            sessions: Arc::new(SessionStore::default()),
            hub,
            verifier: None,
            random_button: false,
        }
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn PasswordVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn with_session_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.sessions = Arc::new(SessionStore::new(ttl));
        self
    }

    pub fn with_random_button(mut self, enabled: bool) -> Self {
        self.random_button = enabled;
        self
    }

    /// Whether a password is required
    pub fn auth_enabled(&self) -> bool {
        self.verifier.is_some()
    }

    /// Whether the request's cookie names a live session
    pub fn has_valid_session(&self, headers: &HeaderMap) -> bool {
        session_token(headers).is_some_and(|token| self.sessions.is_valid(token))
    }
}

/// HTTP file server
pub struct FileServer {
    addr: SocketAddr,
    state: ServerState,
}

impl FileServer {
    pub fn new(addr: SocketAddr, state: ServerState) -> Self {
        Self { addr, state }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Build the router with all routes and middleware
    pub fn build_router(&self) -> Router {
        let state = self.state.clone();

        Router::new()
            .route("/", get(index))
            .route("/browse", get(index))
            .route("/browse/", get(index))
            .route("/browse/*path", get(browse))
            .route("/files/*path", get(serve_file))
            .route("/api/files", get(api_files))
            .route("/api/random-media", get(api_random_media))
            .route("/login", get(login_page).post(login_submit))
            .route("/logout", get(logout).post(logout))
            .route("/ws", get(live_updates))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind the configured address and serve until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), TreecastError> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| TreecastError::BindFailed {
                addr: self.addr.to_string(),
                reason: e.to_string(),
            })?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` is cancelled
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), TreecastError> {
        let router = self.build_router();
        let local = listener.local_addr().unwrap_or(self.addr);

        tracing::info!(
            "Serving {} on http://{} (password {})",
            self.state.root.path().display(),
            local,
            if self.state.auth_enabled() { "required" } else { "disabled" }
        );

        let purge = spawn_session_purge(Arc::clone(&self.state.sessions), shutdown.clone());

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .await
            .map_err(|e| TreecastError::Internal(e.to_string()));

        shutdown.cancel();
        if let Some(purge) = purge {
            let _ = purge.await;
        }
        tracing::info!("HTTP server stopped");

        result
    }
}

/// Periodically drop expired sessions; nothing to do without a TTL
fn spawn_session_purge(
    sessions: Arc<SessionStore>,
    shutdown: CancellationToken,
) -> Option<JoinHandle<()>> {
    let ttl = sessions.ttl()?;
    let period = ttl.min(SESSION_PURGE_INTERVAL);

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let purged = sessions.purge_expired();
                    if purged > 0 {
                        tracing::debug!("Purged {} expired sessions", purged);
                    }
                }
            }
        }
    }))
}
