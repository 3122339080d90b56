// src/mcp/resources.rs

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::{
    blockchain::{networks::BLOCKSCOUT_NETWORKS, UpstreamClient},
    mcp::protocol::{error_codes, Response},
};

pub const DUNE_SUPPORTED_CHAINS_URI: &str = "dune://evm/supported-chains";
pub const SUPPORTED_NETWORKS_URI: &str = "web3-stats://supported-networks";

const DUNE_SUPPORTED_CHAINS_PATH: &str = "/v1/evm/supported-chains";

/// A resource served from a document compiled into the binary.
struct ReferenceDoc {
    uri: &'static str,
    name: &'static str,
    description: &'static str,
    document: &'static str,
}

static REFERENCE_DOCS: &[ReferenceDoc] = &[
    ReferenceDoc {
        uri: "web3-stats://contracts/dex-routers",
        name: "DEX Router Contracts",
        description: "Major decentralized exchange router contracts across different chains",
        document: include_str!("reference/dex_routers.json"),
    },
    ReferenceDoc {
        uri: "web3-stats://tokens/stablecoins",
        name: "Stablecoin Addresses",
        description: "Known stablecoin contract addresses across different chains",
        document: include_str!("reference/stablecoins.json"),
    },
    ReferenceDoc {
        uri: "web3-stats://contracts/bridges",
        name: "Bridge Contracts",
        description: "Known bridge contracts for cross-chain transfers",
        document: include_str!("reference/bridges.json"),
    },
    ReferenceDoc {
        uri: "web3-stats://security/patterns",
        name: "Security Patterns",
        description: "Known spam addresses, vulnerability patterns, and suspicious behaviors",
        document: include_str!("reference/security_patterns.json"),
    },
    ReferenceDoc {
        uri: "web3-stats://tokens/categories",
        name: "Token Categories",
        description: "Categorized lists of tokens for analysis",
        document: include_str!("reference/token_categories.json"),
    },
];

fn descriptor(uri: &str, name: &str, description: &str) -> Value {
    json!({ "uri": uri, "name": name, "description": description, "mimeType": "application/json" })
}

pub fn list() -> Value {
    let mut resources = vec![
        descriptor(
            SUPPORTED_NETWORKS_URI,
            "Supported Networks",
            "Unified list of networks supported by both Dune and Blockscout APIs with their capabilities.",
        ),
        descriptor(
            DUNE_SUPPORTED_CHAINS_URI,
            "Dune EVM Supported Chains",
            "Provides a list of EVM chains supported by the Dune API and their capabilities per endpoint.",
        ),
    ];
    resources.extend(REFERENCE_DOCS.iter().map(|d| descriptor(d.uri, d.name, d.description)));
    json!({ "resources": resources })
}

pub fn templates() -> Value {
    json!({ "resourceTemplates": [] })
}

fn contents(uri: &str, mime_type: &str, text: String) -> Value {
    json!({ "contents": [{ "uri": uri, "mimeType": mime_type, "text": text }] })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Handles `resources/read`. Upstream failures are returned as `text/plain` contents.
pub async fn read(client: &UpstreamClient, uri: &str, req_id: &Value) -> Result<Value, Response> {
    match uri {
        DUNE_SUPPORTED_CHAINS_URI => Ok(match client.dune_get(DUNE_SUPPORTED_CHAINS_PATH, &[]).await {
            Ok(data) => contents(uri, "application/json", pretty(&data)),
            Err(e) => {
                warn!("supported-chains resource failed: {}", e);
                contents(uri, "text/plain", e.to_string())
            }
        }),
        SUPPORTED_NETWORKS_URI => {
            let dune = client.dune_get(DUNE_SUPPORTED_CHAINS_PATH, &[]).await;
            if let Err(e) = &dune {
                warn!("Dune chain list unavailable, listing Blockscout networks only: {}", e);
            }
            let merged = merge_networks(dune.ok().as_ref());
            Ok(contents(uri, "application/json", pretty(&merged)))
        }
        _ => match REFERENCE_DOCS.iter().find(|d| d.uri == uri) {
            Some(doc) => Ok(contents(uri, "application/json", doc.document.to_string())),
            None => Err(Response::error(
                req_id.clone(),
                error_codes::INVALID_PARAMS,
                format!("Resource not found: {}", uri),
            )),
        },
    }
}

/// Joins the static Blockscout table with Dune's `chains` list by chain id.
pub fn merge_networks(dune: Option<&Value>) -> Value {
    let mut networks: Vec<(String, Value)> = BLOCKSCOUT_NETWORKS
        .iter()
        .map(|n| {
            (
                n.chain_id.to_string(),
                json!({
                    "chainId": n.chain_id,
                    "name": n.name,
                    "blockscout": { "available": true, "url": n.url, "apiVersion": "v2" },
                    "dune": { "available": false, "capabilities": {} }
                }),
            )
        })
        .collect();

    let chains = dune
        .and_then(|d| d.get("chains"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    for chain in &chains {
        let chain_id = match chain.get("chain_id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => continue,
        };

        let capabilities: Map<String, Value> = chain
            .get("endpoints")
            .and_then(Value::as_object)
            .map(|endpoints| {
                endpoints
                    .iter()
                    .filter(|(_, supported)| is_truthy(supported))
                    .map(|(name, _)| (name.clone(), Value::Bool(true)))
                    .collect()
            })
            .unwrap_or_default();
        let dune_entry = json!({ "available": true, "capabilities": capabilities });

        match networks.iter_mut().find(|(id, _)| *id == chain_id) {
            Some((_, entry)) => entry["dune"] = dune_entry,
            None => networks.push((
                chain_id.clone(),
                json!({
                    "chainId": chain_id,
                    "name": chain.get("name").cloned().unwrap_or(Value::Null),
                    "blockscout": { "available": false },
                    "dune": dune_entry
                }),
            )),
        }
    }

    networks.sort_by_key(|(id, _)| id.parse::<u64>().unwrap_or(u64::MAX));

    let available = |n: &Value, api: &str| n[api]["available"].as_bool().unwrap_or(false);
    let count = |pred: &dyn Fn(&Value) -> bool| networks.iter().filter(|(_, n)| pred(n)).count();
    let summary = json!({
        "totalNetworks": networks.len(),
        "blockscoutOnly": count(&|n| available(n, "blockscout") && !available(n, "dune")),
        "duneOnly": count(&|n| !available(n, "blockscout") && available(n, "dune")),
        "bothApis": count(&|n| available(n, "blockscout") && available(n, "dune")),
    });

    let networks: Map<String, Value> = networks.into_iter().collect();
    json!({ "networks": networks, "summary": summary })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blockscout_only_without_dune() {
        let merged = merge_networks(None);
        assert_eq!(merged["summary"]["totalNetworks"], BLOCKSCOUT_NETWORKS.len());
        assert_eq!(merged["summary"]["bothApis"], 0);
        assert_eq!(merged["networks"]["137"]["blockscout"]["url"], "https://polygon.blockscout.com");
    }

    #[test]
    fn dune_chains_are_merged_by_id() {
        let dune = json!({
            "chains": [
                { "chain_id": 1, "name": "ethereum", "endpoints": { "balances": true, "activity": false } },
                { "chain_id": 7777777, "name": "zora", "endpoints": { "balances": true } }
            ]
        });
        let merged = merge_networks(Some(&dune));
        assert_eq!(merged["networks"]["1"]["dune"]["capabilities"], json!({ "balances": true }));
        assert_eq!(merged["networks"]["1"]["name"], "Ethereum");
        assert_eq!(merged["networks"]["7777777"]["blockscout"]["available"], false);
        assert_eq!(merged["summary"]["bothApis"], 1);
        assert_eq!(merged["summary"]["duneOnly"], 1);
        assert_eq!(merged["summary"]["blockscoutOnly"], BLOCKSCOUT_NETWORKS.len() - 1);
    }

    #[test]
    fn lists_every_resource_once() {
        let listed = list();
        let uris: Vec<&str> = listed["resources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["uri"].as_str().unwrap())
            .collect();
        assert_eq!(uris.len(), 7);
        let unique: std::collections::HashSet<&str> = uris.iter().copied().collect();
        assert_eq!(unique.len(), uris.len());
    }

    #[test]
    fn reference_documents_are_valid_json() {
        for doc in REFERENCE_DOCS {
            let parsed: Value = serde_json::from_str(doc.document)
                .unwrap_or_else(|e| panic!("{} is not valid JSON: {}", doc.uri, e));
            assert!(parsed["description"].is_string(), "{} has no description", doc.uri);
            assert_eq!(parsed["lastUpdated"], "2024-01-31");
        }
    }
}
