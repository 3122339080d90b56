//! Static allow-list authentication for the HTTP front door.
//!
//! This is a gate, not an identity system: keys never expire and there is no
//! rate limiting. `/health` is exempted by the router, not here.

use std::{collections::HashSet, fmt, sync::Arc};

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response as HttpResponse},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{distributions::Alphanumeric, Rng};
use serde_json::{json, Value};

use crate::mcp::protocol::{error_codes, Response};

pub const API_KEY_HEADER: &str = "x-api-key";

const REALM: &str = "MCP Server";

/// Caller-supplied predicate that replaces every built-in check when set.
pub type CustomAuth = Arc<dyn Fn(&HeaderMap) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeScheme {
    Bearer,
    Basic,
}

#[derive(Clone, Default)]
pub struct AuthConfig {
    pub enabled: bool,
    pub api_keys: HashSet<String>,
    pub basic_credentials: Vec<(String, String)>,
    pub custom: Option<CustomAuth>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.enabled)
            .field("api_keys", &self.api_keys.len())
            .field("basic_credentials", &self.basic_credentials.len())
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl AuthConfig {
    /// Reads `MCP_AUTH_ENABLED`, `MCP_API_KEYS` and `MCP_BASIC_AUTH` through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = lookup("MCP_AUTH_ENABLED").as_deref() == Some("true");

        let api_keys = lookup("MCP_API_KEYS")
            .map(|keys| {
                keys.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let basic_credentials = lookup("MCP_BASIC_AUTH")
            .map(|creds| {
                creds
                    .split(',')
                    .filter_map(|pair| pair.trim().split_once(':'))
                    .map(|(user, pass)| (user.to_string(), pass.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            enabled,
            api_keys,
            basic_credentials,
            custom: None,
        }
    }

    pub fn with_custom(mut self, custom: CustomAuth) -> Self {
        self.custom = Some(custom);
        self
    }

    /// Checks, in order: custom predicate, bearer token, API-key header, basic credentials.
    pub fn validate(&self, headers: &HeaderMap) -> bool {
        if !self.enabled {
            return true;
        }
        if let Some(custom) = &self.custom {
            return custom(headers);
        }

        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        if let Some(token) = authorization.and_then(|v| v.strip_prefix("Bearer ")) {
            if self.api_keys.contains(token) {
                return true;
            }
        }

        if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
            if self.api_keys.contains(key) {
                return true;
            }
        }

        if let Some(encoded) = authorization.and_then(|v| v.strip_prefix("Basic ")) {
            if let Some((user, pass)) = decode_basic(encoded) {
                return self
                    .basic_credentials
                    .iter()
                    .any(|(u, p)| *u == user && *p == pass);
            }
        }

        false
    }

    /// Basic is only advertised when it is the sole configured method.
    pub fn challenge_scheme(&self) -> ChallengeScheme {
        if self.api_keys.is_empty() && !self.basic_credentials.is_empty() {
            ChallengeScheme::Basic
        } else {
            ChallengeScheme::Bearer
        }
    }

    /// The 401 sent when [`validate`](Self::validate) fails.
    pub fn challenge(&self) -> HttpResponse {
        let (scheme, hint) = match self.challenge_scheme() {
            ChallengeScheme::Bearer => (
                "Bearer",
                "Provide API key via Authorization: Bearer <token> or X-API-Key header",
            ),
            ChallengeScheme::Basic => (
                "Basic",
                "Provide credentials via Authorization: Basic <base64(username:password)>",
            ),
        };

        let body = Response::error_with_data(
            Value::Null,
            error_codes::SERVER_ERROR,
            "Authentication required".to_string(),
            json!({ "hint": hint }),
        );
        let mut res = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        if let Ok(value) = HeaderValue::from_str(&format!("{scheme} realm=\"{REALM}\"")) {
            res.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }
        res
    }
}

/// The password may itself contain `:`; only the first one separates.
fn decode_basic(encoded: &str) -> Option<(String, String)> {
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// A fresh `mcp_`-prefixed key with 32 random alphanumeric characters.
pub fn generate_api_key() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    format!("mcp_{suffix}")
}
