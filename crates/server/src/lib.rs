//! Server runtime: dataset cache, query engine, and the JSON-over-HTTP surface.

use std::future::IntoFuture;
use std::net::SocketAddr;

use axum::Router;
use meigen_core::{QuoteServiceError, QuoteSource};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub mod cache;
pub mod http;
pub mod pagination;
pub mod query;

pub use crate::cache::{parse_dataset, CacheStatus, DatasetCache};
pub use crate::http::{data_access_status, ApiError};
pub use crate::pagination::{PageRequest, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use crate::query::{filter_quotes, pick_random, QuoteService};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io: {0}")]
    Io(String),
    #[error("parse: {0}")]
    Parse(String),
}

pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:3000";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allowed_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub expose_headers: Vec<String>,
    pub max_age_secs: u64,
    pub allow_credentials: bool,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allowed_origins: owned(&[
                "http://localhost:3000",
                "http://localhost:5173",
                "http://localhost:8080",
            ]),
            allow_methods: owned(&["GET", "POST", "PUT", "DELETE", "OPTIONS"]),
            allow_headers: owned(&["X-Custom-Header", "Upgrade-Insecure-Requests", "Content-Type"]),
            expose_headers: owned(&["Content-Length", "X-Kuma-Revision"]),
            max_age_secs: 600,
            allow_credentials: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub cors: CorsPolicy,
    /// Page size used by `GET /quotes` when `limit` is omitted.
    pub default_page_size: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            cors: CorsPolicy::default(),
            default_page_size: DEFAULT_PAGE_LIMIT,
        }
    }
}

pub struct Server<S> {
    service: QuoteService<S>,
    options: ServerOptions,
}

impl<S> Clone for Server<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            options: self.options.clone(),
        }
    }
}

impl<S> Server<S>
where
    S: QuoteSource + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::new_with_options(source, ServerOptions::default())
    }

    #[must_use]
    pub fn new_with_options(source: S, options: ServerOptions) -> Self {
        Self::from_service(QuoteService::new(source), options)
    }

    #[must_use]
    pub fn from_service(service: QuoteService<S>, mut options: ServerOptions) -> Self {
        options.default_page_size = options.default_page_size.clamp(1, MAX_PAGE_LIMIT);
        Self { service, options }
    }

    pub fn service(&self) -> &QuoteService<S> {
        &self.service
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    pub fn router(&self) -> Router {
        http::router(self.service.clone(), self.options.clone())
    }

    /// Load the dataset ahead of the first request.
    pub async fn preload(&self) -> Result<usize, QuoteServiceError> {
        self.service.initialize().await
    }

    /// Serve on an already-bound listener until `shutdown` fires.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), ServerError> {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
            })
            .await
            .map_err(|e| ServerError::Io(e.to_string()))
    }

    pub async fn run_http(&self, addr: &str) -> Result<(), ServerError> {
        let bind_addr: SocketAddr = addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ServerError::Parse(e.to_string()))?;
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| ServerError::Io(e.to_string()))?;
        let local = listener
            .local_addr()
            .map_err(|e| ServerError::Io(e.to_string()))?;
        info!(addr = %local, "http server listening");

        let shutdown_token = CancellationToken::new();
        let server_shutdown = shutdown_token.child_token();
        let server = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                server_shutdown.cancelled().await;
            })
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            res = &mut server => {
                res.map_err(|e| ServerError::Io(e.to_string()))
            }
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl_c received; shutting down http server");
                shutdown_token.cancel();
                server.as_mut().await.map_err(|e| ServerError::Io(e.to_string()))
            }
        }
    }
}
