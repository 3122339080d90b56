//! # Transport Module
//!
//! Carries JSON-RPC envelopes between MCP clients and an [`RpcService`].
//!
//! - [`streamable`]: the modern streamable HTTP transport on `/mcp`
//! - [`sse`]: the legacy HTTP+SSE transport on `/sse` and `/message`
//! - [`stdio`]: newline-delimited JSON-RPC on stdin/stdout
//!
//! Sessions for both HTTP generations live in a [`session::SessionRegistry`].

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response as HttpResponse},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::mcp::protocol::{error_codes, Request, Response};

pub mod session;
pub mod sse;
pub mod stdio;
pub mod streamable;

/// Session header of the streamable HTTP transport.
pub const MCP_SESSION_HEADER: &str = "mcp-session-id";
/// Session header of the legacy SSE transport.
pub const LEGACY_SESSION_HEADER: &str = "x-session-id";

/// Who is calling the RPC service.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub session_id: Option<String>,
    pub transport: &'static str,
}

impl CallContext {
    pub fn new(transport: &'static str, session_id: Option<String>) -> Self {
        Self { session_id, transport }
    }
}

/// Handles one decoded JSON-RPC request. Returns `None` for notifications.
#[async_trait]
pub trait RpcService: Send + Sync {
    async fn call(&self, request: Request, ctx: &CallContext) -> Option<Response>;
}

/// Protocol-level failures answered synchronously on the HTTP response.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Parse error")]
    ParseError,

    #[error("Invalid Request: Missing or invalid session ID")]
    InvalidRequest(Value),

    #[error("Invalid Request")]
    MalformedEnvelope(Value),

    #[error("Missing or invalid session ID")]
    MissingSession,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Invalid or missing session ID")]
    LegacySession,

    #[error("Invalid message")]
    InvalidMessage,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Not found")]
    NotFound,
}

impl TransportError {
    pub fn status(&self) -> StatusCode {
        match self {
            TransportError::ParseError
            | TransportError::InvalidRequest(_)
            | TransportError::MalformedEnvelope(_)
            | TransportError::MissingSession
            | TransportError::LegacySession
            | TransportError::InvalidMessage => StatusCode::BAD_REQUEST,
            TransportError::SessionNotFound | TransportError::NotFound => StatusCode::NOT_FOUND,
            TransportError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            TransportError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl IntoResponse for TransportError {
    fn into_response(self) -> HttpResponse {
        let status = self.status();
        let body = match &self {
            // Errors raised while reading a JSON-RPC payload keep the JSON-RPC shape.
            TransportError::ParseError => {
                json!(Response::error(Value::Null, error_codes::PARSE_ERROR, self.to_string()))
            }
            TransportError::InvalidRequest(id) | TransportError::MalformedEnvelope(id) => json!(Response::error(
                id.clone(),
                error_codes::INVALID_REQUEST,
                self.to_string()
            )),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Buffers a request body, refusing anything over `limit` bytes.
pub(crate) async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, TransportError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(TransportError::PayloadTooLarge);
    }
    // A chunked body can still overrun; any read failure ends the request the same way.
    axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| TransportError::PayloadTooLarge)
}

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

pub(crate) fn with_header(mut res: HttpResponse, name: &'static str, value: &str) -> HttpResponse {
    if let Ok(value) = HeaderValue::from_str(value) {
        res.headers_mut().insert(name, value);
    }
    res
}
