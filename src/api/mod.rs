//! # API Module
//!
//! The HTTP surface of the server. All requests enter through
//! [`router::front_door`]; there is no per-path axum routing.
//!
//! ## Endpoints
//! - `GET /health` - liveness and session counts (never authenticated)
//! - `POST|GET|DELETE /mcp` - streamable HTTP transport
//! - `GET /sse`, `POST /message` - legacy HTTP+SSE transport
//! - `OPTIONS *` - CORS preflight

pub mod auth;
pub mod health;
pub mod router;

pub use router::build_app;
