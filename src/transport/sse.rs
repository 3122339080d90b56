//! Legacy HTTP+SSE transport.
//!
//! `GET /sse` opens the push stream and mints the session; `POST /message`
//! only enqueues an envelope and acknowledges it. The RPC reply is written
//! later, as a `message` event on the stream.

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response as HttpResponse,
    },
    Json,
};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{
    header_str, read_body,
    session::{LegacyHandle, Session, SessionRegistry},
    with_header, CallContext, TransportError, LEGACY_SESSION_HEADER,
};
use crate::{
    mcp::protocol::{Request, Response},
    AppState,
};

const TRANSPORT: &str = "sse";

/// Path clients are told to POST to, announced in the `endpoint` event.
pub const MESSAGE_PATH: &str = "/message";

/// Removes the session when the SSE body is dropped, which is how axum
/// reports a client disconnect.
struct CloseOnDrop {
    sessions: Arc<SessionRegistry>,
    session: Arc<Session<LegacyHandle>>,
}

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        if self.sessions.legacy.remove(&self.session.id).is_some() {
            info!(session_id = %self.session.id, "[legacy] SSE connection closed");
        }
    }
}

/// GET `/sse`: mint a session and stream its replies.
pub async fn handle_connect(state: AppState) -> HttpResponse {
    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel::<Request>();
    let session = state
        .sessions
        .legacy
        .create(|_| LegacyHandle { inbox: inbox_tx });
    info!(session_id = %session.id, "[legacy] SSE connection established");

    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel::<Response>();
    tokio::spawn(run_worker(state.clone(), session.clone(), inbox_rx, outbox_tx));

    let guard = CloseOnDrop {
        sessions: state.sessions.clone(),
        session: session.clone(),
    };
    let endpoint = format!("{MESSAGE_PATH}?sessionId={}", session.id);
    let cancel = session.cancel.clone();

    let stream = async_stream::stream! {
        let _guard = guard;
        yield Ok::<_, axum::Error>(Event::default().event("endpoint").data(endpoint));

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => None,
                next = outbox_rx.recv() => next,
            };
            match next {
                Some(response) => yield Event::default().event("message").json_data(response),
                None => break,
            }
        }
    };

    let mut res = Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response();
    res.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    res.headers_mut()
        .insert("x-accel-buffering", HeaderValue::from_static("no"));
    with_header(res, LEGACY_SESSION_HEADER, &session.id)
}

/// Drains one session's inbox in arrival order.
async fn run_worker(
    state: AppState,
    session: Arc<Session<LegacyHandle>>,
    mut inbox: mpsc::UnboundedReceiver<Request>,
    outbox: mpsc::UnboundedSender<Response>,
) {
    let ctx = CallContext::new(TRANSPORT, Some(session.id.clone()));
    loop {
        let request = tokio::select! {
            _ = session.cancel.cancelled() => break,
            next = inbox.recv() => match next {
                Some(request) => request,
                None => break,
            },
        };

        let method = request.method.clone();
        let response = tokio::select! {
            _ = session.cancel.cancelled() => break,
            response = state.rpc.call(request, &ctx) => response,
        };

        if let Some(response) = response {
            if outbox.send(response).is_err() {
                warn!(session_id = %session.id, %method, "[legacy] stream gone, dropping reply");
                break;
            }
        }
    }
    debug!(session_id = %session.id, "[legacy] worker stopped");
}

/// POST `/message`: enqueue one envelope for an open stream.
pub async fn handle_message(
    state: AppState,
    headers: HeaderMap,
    query: Option<&str>,
    body: Body,
) -> Result<HttpResponse, TransportError> {
    let session_id = header_str(&headers, LEGACY_SESSION_HEADER)
        .map(str::to_string)
        .or_else(|| session_id_from_query(query))
        .ok_or(TransportError::LegacySession)?;

    if state.sessions.legacy.get(&session_id).is_none() {
        return Err(TransportError::LegacySession);
    }

    let bytes = read_body(&headers, body, state.config.max_body_bytes).await?;

    // The stream may have closed while the body was arriving.
    let session = state
        .sessions
        .legacy
        .get(&session_id)
        .filter(|s| !s.is_closed())
        .ok_or(TransportError::LegacySession)?;

    let request: Request = serde_json::from_slice(&bytes).map_err(|e| {
        debug!(session_id = %session_id, "[legacy] undecodable message: {}", e);
        TransportError::InvalidMessage
    })?;

    session
        .handle
        .inbox
        .send(request)
        .map_err(|_| TransportError::LegacySession)?;

    let res = Json(json!({ "status": "ok", "sessionId": session_id })).into_response();
    Ok(with_header(res, LEGACY_SESSION_HEADER, &session_id))
}

fn session_id_from_query(query: Option<&str>) -> Option<String> {
    let pairs: HashMap<String, String> = url::form_urlencoded::parse(query?.as_bytes())
        .into_owned()
        .collect();
    pairs.get("sessionId").filter(|id| !id.is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_read_from_query() {
        assert_eq!(
            session_id_from_query(Some("sessionId=abc-123")).as_deref(),
            Some("abc-123")
        );
        assert_eq!(session_id_from_query(Some("other=1")), None);
        assert_eq!(session_id_from_query(Some("sessionId=")), None);
        assert_eq!(session_id_from_query(None), None);
    }
}
