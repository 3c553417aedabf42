//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: route matching, CORS annotation
//! and access logging.

use crate::config::AppState;
use crate::handler::error::HandlerError;
use crate::handler::{list, message};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Known endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Submit,
    List,
    Other,
}

impl Route {
    fn from_path(path: &str) -> Self {
        match path {
            "/msg" => Self::Submit,
            "/list" => Self::List,
            _ => Self::Other,
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let logging = &state.config.logging;
    let entry = logging.access_log.then(|| {
        AccessLogEntry::from_request(
            peer_addr.to_string(),
            req.method(),
            req.uri(),
            req.version(),
            req.headers(),
        )
    });

    let mut response = dispatch(req, peer_addr, &state)
        .await
        .unwrap_or_else(HandlerError::into_response);
    http::apply_cors_headers(response.headers_mut());

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = body_len(&response);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: &AppState,
) -> Result<Response<Full<Bytes>>, HandlerError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Route::from_path(req.uri().path()) {
        Route::Submit => {
            message::handle_submit(req, peer_addr, state.config.http.max_body_size).await
        }
        Route::List => list::handle_list(&req),
        // Preflight for any other path
        Route::Other if *req.method() == Method::OPTIONS => {
            Ok(http::build_empty_response(StatusCode::OK))
        }
        Route::Other => Err(HandlerError::NotFound),
    }
}

fn body_len(response: &Response<Full<Bytes>>) -> usize {
    response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}
