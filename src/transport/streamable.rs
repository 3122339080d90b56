//! Streamable HTTP transport (`/mcp`).
//!
//! A session is minted by an `initialize` POST and identified afterwards by the
//! `Mcp-Session-Id` header. POST carries requests, GET opens an optional push
//! channel, DELETE ends the session.

use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response as HttpResponse,
    },
    Json,
};
use futures::{stream, StreamExt};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{
    header_str, read_body,
    session::{ModernHandle, Session},
    with_header, CallContext, TransportError, MCP_SESSION_HEADER,
};
use crate::{mcp::protocol::Request, AppState};

const TRANSPORT: &str = "streamable-http";

fn resolve(state: &AppState, headers: &HeaderMap) -> Option<Arc<Session<ModernHandle>>> {
    header_str(headers, MCP_SESSION_HEADER).and_then(|id| state.sessions.modern.get(id))
}

/// Only an explicit preference for SSE gets a streamed reply; JSON is the default.
fn prefers_event_stream(headers: &HeaderMap) -> bool {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    accept.contains("text/event-stream") && !accept.contains("application/json")
}

/// POST `/mcp`: initialize a session or continue one.
pub async fn handle_post(
    state: AppState,
    headers: HeaderMap,
    body: Body,
) -> Result<HttpResponse, TransportError> {
    let bytes = read_body(&headers, body, state.config.max_body_bytes).await?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
        debug!("[modern] unparsable body: {}", e);
        TransportError::ParseError
    })?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let is_initialize = value.get("method").and_then(Value::as_str) == Some("initialize");

    let existing = if is_initialize {
        // Only an initialize call, never a notification, may open a session.
        if id.is_null() {
            return Err(TransportError::MalformedEnvelope(Value::Null));
        }
        None
    } else {
        Some(resolve(&state, &headers).ok_or_else(|| TransportError::InvalidRequest(id.clone()))?)
    };

    let request: Request =
        serde_json::from_value(value).map_err(|_| TransportError::MalformedEnvelope(id))?;

    let session = match existing {
        Some(session) => session,
        None => {
            let session = state.sessions.modern.create(|_| ModernHandle::default());
            info!(session_id = %session.id, "[modern] session initialized");
            session
        }
    };

    // Held for the whole dispatch; DELETE takes it too, so it waits for us.
    let _in_flight = session.handle.dispatch.lock().await;
    if session.is_closed() {
        return Err(TransportError::SessionNotFound);
    }

    let ctx = CallContext::new(TRANSPORT, Some(session.id.clone()));
    let response = tokio::select! {
        response = state.rpc.call(request, &ctx) => response,
        _ = session.cancel.cancelled() => {
            debug!(session_id = %session.id, "[modern] session closed during dispatch, dropping reply");
            return Err(TransportError::SessionNotFound);
        }
    };

    let res = match response {
        None => StatusCode::ACCEPTED.into_response(),
        Some(response) if prefers_event_stream(&headers) => {
            let events = stream::once(async move { Event::default().event("message").json_data(response) });
            Sse::new(events).into_response()
        }
        Some(response) => Json(response).into_response(),
    };

    Ok(with_header(res, MCP_SESSION_HEADER, &session.id))
}

/// GET `/mcp`: push channel for an existing session. Ends when the session closes.
pub async fn handle_get(state: AppState, headers: HeaderMap) -> Result<HttpResponse, TransportError> {
    let session = resolve(&state, &headers).ok_or(TransportError::MissingSession)?;
    debug!(session_id = %session.id, "[modern] push channel opened");

    let cancel = session.cancel.clone();
    let events = stream::pending::<Result<Event, Infallible>>()
        .take_until(async move { cancel.cancelled().await });

    let res = Sse::new(events)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response();
    Ok(with_header(res, MCP_SESSION_HEADER, &session.id))
}

/// DELETE `/mcp`: waits for in-flight work, then closes the session.
pub async fn handle_delete(state: AppState, headers: HeaderMap) -> Result<HttpResponse, TransportError> {
    let id = header_str(&headers, MCP_SESSION_HEADER).ok_or(TransportError::MissingSession)?;
    let session = state.sessions.modern.get(id).ok_or(TransportError::SessionNotFound)?;

    {
        let _in_flight = session.handle.dispatch.lock().await;
        if state.sessions.modern.remove(&session.id).is_none() {
            // Lost a race with another DELETE.
            return Err(TransportError::SessionNotFound);
        }
    }
    info!(session_id = %session.id, "[modern] session closed");

    Ok(Json(json!({ "status": "closed", "sessionId": session.id })).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn json_wins_when_both_are_acceptable() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/event-stream"),
        );
        assert!(!prefers_event_stream(&headers));

        headers.insert(header::ACCEPT, HeaderValue::from_static("text/event-stream"));
        assert!(prefers_event_stream(&headers));

        assert!(!prefers_event_stream(&HeaderMap::new()));
    }
}
