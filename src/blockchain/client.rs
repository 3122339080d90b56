//! HTTP client for the two upstream data providers.
//!
//! Dune Sim is authenticated with a single API key sent as `X-Sim-Api-Key`.
//! Blockscout instances are public and selected per call by chain id.

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::models::{Service, UpstreamError, UpstreamResult};
use super::networks::{find_network, supported_chain_ids};

pub const DEFAULT_DUNE_BASE_URL: &str = "https://api.sim.dune.com";

const DUNE_API_KEY_HEADER: &str = "X-Sim-Api-Key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    dune_api_key: SecretString,
    dune_base_url: String,
    /// Replaces every network's explorer URL. Only set in tests.
    blockscout_base_override: Option<String>,
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("dune_base_url", &self.dune_base_url)
            .field("dune_api_key", &"[REDACTED]")
            .finish()
    }
}

impl UpstreamClient {
    pub fn new(dune_api_key: SecretString, dune_base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("web3-stats-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            dune_api_key,
            dune_base_url: dune_base_url.into().trim_end_matches('/').to_string(),
            blockscout_base_override: None,
        }
    }

    pub fn with_blockscout_base(mut self, base: impl Into<String>) -> Self {
        self.blockscout_base_override = Some(base.into().trim_end_matches('/').to_string());
        self
    }

    /// GET `{dune_base}{path}` where `path` already carries the `/v1` or `/beta` prefix.
    pub async fn dune_get(&self, path: &str, query: &[(String, String)]) -> UpstreamResult<Value> {
        let url = build_url(&self.dune_base_url, path, query)?;
        debug!(%url, "dune request");

        let res = self
            .http
            .get(url)
            .header(DUNE_API_KEY_HEADER, self.dune_api_key.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { service: Service::Dune, source })?;

        read_json(res, Service::Dune, None).await
    }

    /// GET `{explorer}/api/v2{path}` on the explorer serving `chain_id`.
    pub async fn blockscout_get(
        &self,
        chain_id: &str,
        path: &str,
        query: &[(String, String)],
    ) -> UpstreamResult<Value> {
        let network = find_network(chain_id).ok_or_else(|| UpstreamError::UnsupportedChain {
            chain_id: chain_id.to_string(),
            supported: supported_chain_ids(),
        })?;

        let base = match &self.blockscout_base_override {
            Some(base) => format!("{base}/api/v2"),
            None => format!("{}/api/v2", network.url),
        };
        let url = build_url(&base, path, query)?;
        debug!(%url, network = network.name, "blockscout request");

        let res = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { service: Service::Blockscout, source })?;

        read_json(res, Service::Blockscout, Some(network.name)).await
    }
}

fn build_url(base: &str, path: &str, query: &[(String, String)]) -> UpstreamResult<Url> {
    let mut url = Url::parse(&format!("{base}{path}"))?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

async fn read_json(
    res: reqwest::Response,
    service: Service,
    network: Option<&'static str>,
) -> UpstreamResult<Value> {
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| UpstreamError::Transport { service, source })?;

    if !status.is_success() {
        return Err(UpstreamError::Status {
            service,
            network,
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|source| UpstreamError::Decode { service, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_pairs_are_encoded() {
        let url = build_url(
            "https://api.sim.dune.com",
            "/v1/evm/balances/0xabc",
            &[("chain_ids".into(), "1,137".into()), ("limit".into(), "5".into())],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.sim.dune.com/v1/evm/balances/0xabc?chain_ids=1%2C137&limit=5"
        );
    }

    #[tokio::test]
    async fn unsupported_chain_is_rejected_before_any_request() {
        let client = UpstreamClient::new(SecretString::new("k".into()), DEFAULT_DUNE_BASE_URL);
        let err = client.blockscout_get("31337", "/stats", &[]).await.unwrap_err();
        assert!(err.to_string().starts_with("Unsupported chain ID: 31337. Supported chains: 1, 10"));
    }
}
