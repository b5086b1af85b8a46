//! HTTP server module
//!
//! Binds the listener and serves each connection on its own task. Requests
//! are dispatched by [`handlers::handle_request`].

pub mod cors;
pub mod form;
mod handlers;

pub use cors::CorsPolicy;
pub use form::{parse_upload_form, FormLimits};

use crate::config::Config;
use crate::s3::ObjectStore;
use crate::songs::SongRepository;
use crate::upload::{ExtensionValidator, UploadService};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(String),

    #[error("Server error: {0}")]
    RuntimeError(String),
}

/// Everything a request handler needs, shared across connections
pub struct AppState {
    pub uploads: UploadService,
    pub songs: Arc<dyn SongRepository>,
    pub cors: CorsPolicy,
    pub limits: FormLimits,
}

impl AppState {
    /// Wire the upload pipeline and listing endpoint to their backends
    pub fn new(
        config: &Config,
        store: Arc<dyn ObjectStore>,
        songs: Arc<dyn SongRepository>,
    ) -> Self {
        let validator = ExtensionValidator::new(&config.upload.allowed_extensions);
        Self {
            uploads: UploadService::new(store, Arc::clone(&songs), validator),
            songs,
            cors: CorsPolicy::new(&config.cors.allowed_origins),
            limits: FormLimits {
                max_file_size: config.upload.max_file_size,
            },
        }
    }
}

/// HTTP server for the song API
pub struct Server {
    state: Arc<AppState>,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Bind to `address`
    ///
    /// Port 0 asks the OS for a free port; see [`Server::local_addr`].
    pub async fn bind(address: &str, state: AppState) -> Result<Self, ServerError> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| ServerError::BindError(format!("Invalid address '{}': {}", address, e)))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(format!("Failed to bind to {}: {}", addr, e)))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::BindError(format!("Failed to get local address: {}", e)))?;

        info!("Server bound to {}", local_addr);

        Ok(Self {
            state: Arc::new(state),
            listener,
            local_addr,
        })
    }

    /// The address the server is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until Ctrl-C
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
    }

    /// Serve until `shutdown` resolves
    ///
    /// Accept errors are logged and the loop keeps going. Connections already
    /// in flight when shutdown fires run to completion on their own tasks.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        info!("Starting server on {}", self.local_addr);
        tokio::pin!(shutdown);

        loop {
            let (stream, peer_addr) = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down server");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                },
            };

            let state = Arc::clone(&self.state);

            tokio::spawn(async move {
                let io = TokioIo::new(stream);

                let service = service_fn(move |req| {
                    let state = Arc::clone(&state);
                    async move { handlers::handle_request(req, state).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection from {}: {}", peer_addr, e);
                }
            });
        }
    }
}
