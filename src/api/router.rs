//! The HTTP front door.
//!
//! Every request passes through [`front_door`] in a fixed order: CORS preflight,
//! health check, authentication, then routing by `(method, path)`.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response as HttpResponse},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::debug;

use super::health::health_handler;
use crate::{
    config::TransportMode,
    transport::{sse, streamable, TransportError, LEGACY_SESSION_HEADER, MCP_SESSION_HEADER},
    AppState,
};

pub const HEALTH_PATH: &str = "/health";
pub const MCP_PATH: &str = "/mcp";
pub const SSE_PATH: &str = "/sse";

/// Every destination a request can be dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Preflight,
    Health,
    ModernPost,
    ModernGet,
    ModernDelete,
    ModernMethodNotAllowed,
    LegacyConnect,
    LegacyMessage,
    NotFound,
}

impl Route {
    /// Routes of a transport generation the process does not serve resolve to `NotFound`.
    pub fn classify(method: &Method, path: &str, mode: TransportMode) -> Route {
        if *method == Method::OPTIONS {
            return Route::Preflight;
        }

        match (method, path) {
            (&Method::GET, HEALTH_PATH) => Route::Health,

            (&Method::POST, MCP_PATH) if mode.serves_modern() => Route::ModernPost,
            (&Method::GET, MCP_PATH) if mode.serves_modern() => Route::ModernGet,
            (&Method::DELETE, MCP_PATH) if mode.serves_modern() => Route::ModernDelete,
            (_, MCP_PATH) if mode.serves_modern() => Route::ModernMethodNotAllowed,

            (&Method::GET, SSE_PATH) if mode.serves_legacy() => Route::LegacyConnect,
            (&Method::POST, sse::MESSAGE_PATH) if mode.serves_legacy() => Route::LegacyMessage,

            _ => Route::NotFound,
        }
    }

    /// Whether the route is reachable without credentials.
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Preflight | Route::Health)
    }
}

/// Single entry point for every inbound HTTP request.
pub async fn front_door(State(state): State<AppState>, req: Request) -> HttpResponse {
    let route = Route::classify(req.method(), req.uri().path(), state.config.transport);
    debug!(?route, method = %req.method(), path = %req.uri().path(), "dispatch");

    if !route.is_public() && !state.config.auth.validate(req.headers()) {
        debug!(path = %req.uri().path(), "rejected unauthenticated request");
        return state.config.auth.challenge();
    }

    let (parts, body) = req.into_parts();
    let result = match route {
        Route::Preflight => Ok(StatusCode::OK.into_response()),
        Route::Health => Ok(health_handler(state).await.into_response()),
        Route::ModernPost => streamable::handle_post(state, parts.headers, body).await,
        Route::ModernGet => streamable::handle_get(state, parts.headers).await,
        Route::ModernDelete => streamable::handle_delete(state, parts.headers).await,
        Route::ModernMethodNotAllowed => Err(TransportError::MethodNotAllowed),
        Route::LegacyConnect => Ok(sse::handle_connect(state).await),
        Route::LegacyMessage => {
            sse::handle_message(state, parts.headers, parts.uri.query(), body).await
        }
        Route::NotFound => Err(TransportError::NotFound),
    };

    result.unwrap_or_else(IntoResponse::into_response)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(LEGACY_SESSION_HEADER),
            HeaderName::from_static(MCP_SESSION_HEADER),
            HeaderName::from_static("mcp-protocol-version"),
            HeaderName::from_static(super::auth::API_KEY_HEADER),
        ])
        .expose_headers([
            HeaderName::from_static(LEGACY_SESSION_HEADER),
            HeaderName::from_static(MCP_SESSION_HEADER),
        ])
        .max_age(Duration::from_secs(86_400))
}

/// Builds the application: the front door plus tracing and CORS.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .fallback(front_door)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hybrid_routes_both_generations() {
        let mode = TransportMode::Hybrid;
        assert_eq!(Route::classify(&Method::POST, "/mcp", mode), Route::ModernPost);
        assert_eq!(Route::classify(&Method::GET, "/mcp", mode), Route::ModernGet);
        assert_eq!(Route::classify(&Method::DELETE, "/mcp", mode), Route::ModernDelete);
        assert_eq!(Route::classify(&Method::PUT, "/mcp", mode), Route::ModernMethodNotAllowed);
        assert_eq!(Route::classify(&Method::GET, "/sse", mode), Route::LegacyConnect);
        assert_eq!(Route::classify(&Method::POST, "/message", mode), Route::LegacyMessage);
        assert_eq!(Route::classify(&Method::GET, "/message", mode), Route::NotFound);
        assert_eq!(Route::classify(&Method::OPTIONS, "/anything", mode), Route::Preflight);
        assert_eq!(Route::classify(&Method::GET, "/health", mode), Route::Health);
    }

    #[test]
    fn disabled_generation_is_not_found() {
        assert_eq!(Route::classify(&Method::GET, "/sse", TransportMode::Http), Route::NotFound);
        assert_eq!(Route::classify(&Method::POST, "/mcp", TransportMode::Sse), Route::NotFound);
        assert_eq!(Route::classify(&Method::PUT, "/mcp", TransportMode::Sse), Route::NotFound);
    }

    #[test]
    fn only_preflight_and_health_are_public() {
        assert!(Route::Health.is_public());
        assert!(Route::Preflight.is_public());
        assert!(!Route::ModernPost.is_public());
        assert!(!Route::NotFound.is_public());
    }
}
