//! HTTP front end: accept loop, routing, and the render pipeline glue.

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::http::{self, HttpError, Request, Response};
use crate::multipart;
use crate::resolve::{resolve, FetchLimits, MeshSource};
use preview::{PreviewError, PreviewImage};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

/// File name offered in the Content-Disposition header of successful renders.
const DOWNLOAD_NAME: &str = "preview.png";

/// JSON request body pointing at a remote mesh file.
#[derive(Debug, Deserialize)]
struct RenderRequest {
    #[serde(rename = "fileUrl")]
    file_url: String,
}

/// Preview rendering service over plain HTTP/1.1.
///
/// Holds the shared pieces every request needs: configuration, the HTTP
/// client for remote fetches, and the permits bounding concurrent renders.
#[derive(Clone)]
pub struct PreviewServer {
    config: Arc<ServiceConfig>,
    render_permits: Arc<Semaphore>,
    http: reqwest::Client,
}

impl PreviewServer {
    pub fn new(config: ServiceConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;
        let render_permits = Arc::new(Semaphore::new(config.render_concurrency));
        Ok(Self {
            config: Arc::new(config),
            render_permits,
            http,
        })
    }

    /// Bind the configured address and serve until interrupted.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.config.bind_address).await?;
        self.run_on(listener).await
    }

    /// Serve connections from an already-bound listener.
    pub async fn run_on(self, listener: TcpListener) -> anyhow::Result<()> {
        tracing::info!("Preview server listening on {}", listener.local_addr()?);
        let server = Arc::new(self);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            tracing::warn!("Failed to accept connection: {}", e);
                            continue;
                        }
                    };
                    let server = Arc::clone(&server);
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(server, stream).await {
                            tracing::warn!("Connection error from {}: {}", peer, e);
                        }
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Serve a single request and close the connection.
    async fn handle_connection(server: Arc<Self>, stream: TcpStream) -> std::io::Result<()> {
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let response = match http::read_request(&mut reader, server.config.max_body_bytes).await {
            Ok(request) => server.handle_request(&request).await,
            Err(HttpError::Io(e)) => return Err(e),
            Err(e) => {
                let status = match e {
                    HttpError::BodyTooLarge { .. } => 413,
                    _ => 400,
                };
                Response::json(status, &serde_json::json!({ "error": e.to_string() }))
            }
        };

        http::write_response(&mut write_half, &response).await?;
        write_half.shutdown().await
    }

    async fn handle_request(&self, request: &Request) -> Response {
        let started = Instant::now();
        let response = match (request.method.as_str(), request.path()) {
            ("POST", "/render-stl") => self.handle_render(request).await,
            ("GET", "/health") => Response::json(200, &serde_json::json!({ "status": "ok" })),
            (_, "/render-stl") | (_, "/health") => {
                Response::json(405, &serde_json::json!({ "error": "method not allowed" }))
            }
            _ => Response::json(404, &serde_json::json!({ "error": "not found" })),
        };
        tracing::info!(
            "{} {} -> {} in {}ms",
            request.method,
            request.path(),
            response.status,
            started.elapsed().as_millis()
        );
        response
    }

    async fn handle_render(&self, request: &Request) -> Response {
        let source = match extract_source(request) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("Rejected render request: {}", e);
                return error_response(&e);
            }
        };

        match self.render_from_source(source).await {
            Ok(image) => Response::png(image.into_bytes(), DOWNLOAD_NAME),
            Err(e) => {
                if e.is_client_error() {
                    tracing::warn!("Render request failed: {}", e);
                } else {
                    tracing::error!("Render request failed: {}", e);
                }
                error_response(&e)
            }
        }
    }

    /// Resolve the source, then rasterize on the blocking pool.
    ///
    /// A permit is held for the whole render so at most
    /// `render_concurrency` rasterizations run at once; waiting requests
    /// queue on the semaphore instead of piling onto the pool.
    async fn render_from_source(&self, source: MeshSource) -> Result<PreviewImage> {
        let limits = FetchLimits {
            timeout: self.config.fetch_timeout,
            max_bytes: self.config.max_fetch_bytes,
        };
        let resolved = resolve(source, &self.http, &limits).await?;
        tracing::debug!(
            "Resolved {} bytes of {} input",
            resolved.bytes.len(),
            resolved.format
        );

        let permit = self
            .render_permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PreviewError::RenderFailed("render pool is closed".into()))?;
        let render_config = self.config.render.clone();

        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let mut reader = resolved
                .bytes
                .reader()
                .map_err(|e| PreviewError::RenderFailed(format!("staging read: {e}")))?;
            preview::render_preview(&mut reader, resolved.format, &render_config)
        });

        let image = task
            .await
            .map_err(|e| PreviewError::RenderFailed(format!("render task failed: {e}")))??;
        Ok(image)
    }
}

/// Pull a mesh source out of the request, dispatching on Content-Type.
fn extract_source(request: &Request) -> Result<MeshSource> {
    let content_type = request.header("content-type").unwrap_or("");

    if content_type.starts_with("multipart/form-data") {
        let boundary = multipart::boundary(content_type).ok_or_else(|| {
            ServiceError::InvalidInput("multipart body without boundary".into())
        })?;
        let part = multipart::extract_file_part(&request.body, &boundary)?;
        return Ok(MeshSource::Upload {
            filename: part.filename,
            bytes: part.bytes,
        });
    }

    if content_type.starts_with("application/json") {
        let parsed: RenderRequest = serde_json::from_slice(&request.body)
            .map_err(|e| ServiceError::InvalidInput(format!("invalid json body: {e}")))?;
        return Ok(MeshSource::RemoteUrl(parsed.file_url));
    }

    Err(ServiceError::InvalidInput(
        "expected a multipart/form-data upload or an application/json body".into(),
    ))
}

fn error_response(err: &ServiceError) -> Response {
    Response::json(err.status(), &serde_json::json!({ "error": err.to_string() }))
}
