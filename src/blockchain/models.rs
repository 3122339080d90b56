// src/blockchain/models.rs
use std::fmt;

use thiserror::Error;

/// The upstream services the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Dune,
    Blockscout,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Dune => f.write_str("Dune"),
            Service::Blockscout => f.write_str("Blockscout"),
        }
    }
}

// --- Error types for upstream calls ---

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Unsupported chain ID: {chain_id}. Supported chains: {supported}")]
    UnsupportedChain { chain_id: String, supported: String },

    #[error("{} API Error{}: {status} {reason}. Details: {body}", .service, network_suffix(.network))]
    Status {
        service: Service,
        network: Option<&'static str>,
        status: u16,
        reason: String,
        body: String,
    },

    #[error("{service} API request failed: {source}")]
    Transport {
        service: Service,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} API returned invalid JSON: {source}")]
    Decode {
        service: Service,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid upstream URL: {0}")]
    Url(#[from] url::ParseError),
}

fn network_suffix(network: &Option<&'static str>) -> String {
    match network {
        Some(name) => format!(" ({name})"),
        None => String::new(),
    }
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_service_and_network() {
        let err = UpstreamError::Status {
            service: Service::Blockscout,
            network: Some("Polygon"),
            status: 502,
            reason: "Bad Gateway".into(),
            body: "upstream down".into(),
        };
        assert_eq!(
            err.to_string(),
            "Blockscout API Error (Polygon): 502 Bad Gateway. Details: upstream down"
        );

        let err = UpstreamError::Status {
            service: Service::Dune,
            network: None,
            status: 401,
            reason: "Unauthorized".into(),
            body: "{}".into(),
        };
        assert_eq!(err.to_string(), "Dune API Error: 401 Unauthorized. Details: {}");
    }
}
