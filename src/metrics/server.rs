//! Status HTTP server.
//!
//! Serves Prometheus metrics, a health probe, and an instance selection
//! endpoint.

use crate::state::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus_client::encoding::text::encode;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Status HTTP server.
pub struct StatusServer {
    listener: TcpListener,
    /// Path for the metrics endpoint.
    path: String,
    state: AppState,
}

impl StatusServer {
    /// Bind the status server.
    pub async fn bind(address: SocketAddr, path: String, state: AppState) -> std::io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self {
            listener,
            path,
            state,
        })
    }

    /// Address the server is listening on.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the status server until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let Self {
            listener,
            path,
            state,
        } = self;

        info!(address = ?listener.local_addr().ok(), path = %path, "status server started");

        let state = Arc::new(state);
        let path = Arc::new(path);

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, _addr)) => {
                            let state = Arc::clone(&state);
                            let path = Arc::clone(&path);

                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                                    let state = Arc::clone(&state);
                                    let path = Arc::clone(&path);
                                    async move {
                                        Ok::<_, Infallible>(route(req.method(), req.uri().path(), &state, &path))
                                    }
                                });

                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(io, service)
                                    .await
                                {
                                    debug!(error = %e, "status connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept status connection");
                        }
                    }
                }

                _ = shutdown.recv() => {
                    info!("status server shutting down");
                    break;
                }
            }
        }
    }
}

/// Route a status request.
fn route(method: &Method, path: &str, state: &AppState, metrics_path: &str) -> Response<Full<Bytes>> {
    debug!(path = %path, method = %method, "status request");

    if method != Method::GET {
        return text(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed\n".to_string());
    }

    if path == metrics_path {
        let mut buffer = String::new();
        if let Err(e) = encode(&mut buffer, state.selector().metrics().registry()) {
            error!(error = %e, "failed to encode metrics");
            return text(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics\n".to_string(),
            );
        }
        let mut response = text(StatusCode::OK, buffer);
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(METRICS_CONTENT_TYPE));
        return response;
    }

    if path == "/health" || path == "/healthz" {
        return text(StatusCode::OK, "OK\n".to_string());
    }

    if path == "/" {
        let body = format!(
            "{} status server\n\nEndpoints:\n  {} - Prometheus metrics\n  /health - Health check\n  /select/<service> - Choose an instance\n",
            state.config().global.application_name,
            metrics_path
        );
        return text(StatusCode::OK, body);
    }

    if let Some(service) = path.strip_prefix("/select/") {
        if service.is_empty() || service.contains('/') {
            return text(StatusCode::NOT_FOUND, "Not found\n".to_string());
        }
        return match state.selector().select_instance(service) {
            Some(instance) => text(StatusCode::OK, format!("{}\n", instance.address)),
            None => text(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("no instance available for {}\n", service),
            ),
        };
    }

    text(StatusCode::NOT_FOUND, "Not found\n".to_string())
}

fn text(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}
