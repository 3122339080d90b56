//! Tool catalog.
//!
//! Every tool is a row in [`TOOLS`]: an upstream, a path template and a list of
//! parameters saying where each argument goes. `tools/list` schemas and
//! `tools/call` request building are both derived from the same rows.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::{
    blockchain::{
        networks::{find_network, supported_chain_ids},
        UpstreamClient, UpstreamError,
    },
    mcp::protocol::{error_codes, Response},
    utils,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    /// Positive integer; numeric strings are accepted.
    Integer,
    Boolean,
    StringOrNumber,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Substituted for `{name}` in the path template.
    Path,
    /// Sent as `key=value`.
    Query(&'static str),
    /// Selects the Blockscout network; not forwarded.
    Chain,
    /// Each array element is sent as `key[i]=value`.
    IndexedQuery(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
    pub placement: Placement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Dune,
    Blockscout,
}

#[derive(Debug, Clone, Copy)]
pub enum Action {
    /// One GET against the path template; the JSON is returned verbatim.
    Fetch(&'static str),
    /// Fixed text, no upstream call.
    Pong(&'static str),
    /// `/stats` on the selected explorer, summarized.
    PingBlockscout,
    /// Read and write method lists of a verified contract.
    ContractMethods,
}

#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub upstream: Upstream,
    pub action: Action,
    pub params: &'static [ParamSpec],
}

const fn param(
    name: &'static str,
    kind: ParamKind,
    required: bool,
    description: &'static str,
    placement: Placement,
) -> ParamSpec {
    ParamSpec { name, kind, required, description, placement }
}

const fn path(name: &'static str, description: &'static str) -> ParamSpec {
    param(name, ParamKind::String, true, description, Placement::Path)
}

const fn query(name: &'static str, key: &'static str, description: &'static str) -> ParamSpec {
    param(name, ParamKind::String, false, description, Placement::Query(key))
}

const fn limit(key: &'static str, description: &'static str) -> ParamSpec {
    param("limit", ParamKind::Integer, false, description, Placement::Query(key))
}

// Shared parameters
const EVM_WALLET: ParamSpec = path(
    "walletAddress",
    "The EVM wallet address (e.g., 0xd8da6bf26964af9d7eed9e03e53415d37aa96045)",
);
const DUNE_OFFSET: ParamSpec = query("offset", "offset", "Optional. The offset (cursor) for pagination.");
const CHAIN_ID: ParamSpec = param(
    "chainId",
    ParamKind::String,
    true,
    "The chain ID (e.g., '1' for Ethereum, '137' for Polygon)",
    Placement::Chain,
);
const NEXT_PAGE: ParamSpec = query(
    "next_page_params",
    "next_page_params",
    "Optional. Pagination cursor from previous response",
);
const CONTRACT: ParamSpec = path("address", "The contract address");
const TX_HASH: ParamSpec = path("txHash", "The transaction hash");
const BLOCK: ParamSpec = path("blockNumber", "The block number or hash");

pub static TOOLS: &[ToolSpec] = &[
    // --- Dune Sim ---
    ToolSpec {
        name: "ping_dune_server",
        description: "A simple tool to check if the Dune MCP server is responsive.",
        upstream: Upstream::Dune,
        action: Action::Pong("Pong! Dune MCP server is active."),
        params: &[],
    },
    ToolSpec {
        name: "get_evm_balances",
        description: "Fetches EVM token balances for a given wallet address from the Dune API. Supports chain filtering, metadata inclusion, spam filtering, and pagination.",
        upstream: Upstream::Dune,
        action: Action::Fetch("/v1/evm/balances/{walletAddress}"),
        params: &[
            EVM_WALLET,
            query("chainIds", "chain_ids", "Optional. Comma-separated list of chain IDs (e.g., '1,56') or 'all'."),
            query("metadata", "metadata", "Optional. Comma-separated list of metadata to include (e.g., 'url,logo')."),
            param("excludeSpamTokens", ParamKind::Boolean, false, "Optional. Set to true to exclude spam tokens.", Placement::Query("exclude_spam_tokens")),
            limit("limit", "Optional. Maximum number of balance items to return for pagination."),
            DUNE_OFFSET,
        ],
    },
    ToolSpec {
        name: "get_evm_activity",
        description: "Fetches EVM account activity for a given wallet address from the Dune API. Supports spam filtering and pagination.",
        upstream: Upstream::Dune,
        action: Action::Fetch("/v1/evm/activity/{walletAddress}"),
        params: &[
            EVM_WALLET,
            limit("limit", "Optional. Maximum number of activity items to return."),
            DUNE_OFFSET,
            param("excludeSpamTokens", ParamKind::Boolean, false, "Optional. Set to true to exclude activities related to spam tokens.", Placement::Query("exclude_spam_tokens")),
        ],
    },
    ToolSpec {
        name: "get_evm_collectibles",
        description: "Fetches EVM NFT collectibles (ERC721 and ERC1155) for a given wallet address. Supports pagination.",
        upstream: Upstream::Dune,
        action: Action::Fetch("/v1/evm/collectibles/{walletAddress}"),
        params: &[
            EVM_WALLET,
            limit("limit", "Optional. Number of collectible items to return. Defaults to 50 if not specified by API."),
            DUNE_OFFSET,
        ],
    },
    ToolSpec {
        name: "get_evm_transactions",
        description: "Retrieves granular EVM transaction details for a given wallet address from the Dune API.",
        upstream: Upstream::Dune,
        action: Action::Fetch("/v1/evm/transactions/{walletAddress}"),
        params: &[
            EVM_WALLET,
            limit("limit", "Optional. Maximum number of transactions to return."),
            DUNE_OFFSET,
        ],
    },
    ToolSpec {
        name: "get_evm_token_info",
        description: "Fetches detailed metadata and real-time price information for a native asset or ERC20 token on EVM chains from the Dune API.",
        upstream: Upstream::Dune,
        action: Action::Fetch("/v1/evm/token-info/{chainAndTokenUri}"),
        params: &[
            path("chainAndTokenUri", "The URI path segment for the token, e.g., '1/0xTOKEN_ADDRESS' for an ERC20 token on Ethereum, or '1/native' for Ethereum's native token."),
            param("chainIds", ParamKind::String, true, "Mandatory. Comma-separated list of chain IDs (e.g., '1,56') or 'all'.", Placement::Query("chain_ids")),
            limit("limit", "Optional. Maximum number of items to return."),
            DUNE_OFFSET,
        ],
    },
    ToolSpec {
        name: "get_evm_token_holders",
        description: "Discovers token distribution across ERC20 or ERC721 holders for a given token on a specific EVM chain, ranked by wallet value.",
        upstream: Upstream::Dune,
        action: Action::Fetch("/v1/evm/token-holders/{chainId}/{tokenAddress}"),
        params: &[
            param("chainId", ParamKind::StringOrNumber, true, "The chain ID (e.g., 1 or '1' for Ethereum).", Placement::Path),
            path("tokenAddress", "The ERC20 or ERC721 token contract address (e.g., 0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2)."),
            limit("limit", "Optional. Maximum number of token holders to return."),
            DUNE_OFFSET,
        ],
    },
    ToolSpec {
        name: "get_svm_balances",
        description: "Fetches token balances for a given SVM wallet address (Solana, Eclipse) from the Dune API.",
        upstream: Upstream::Dune,
        action: Action::Fetch("/beta/svm/balances/{walletAddress}"),
        params: &[
            path("walletAddress", "The SVM wallet address (e.g., a Solana or Eclipse address)"),
            query("chains", "chains", "Optional. Comma-separated list of chains (e.g., 'solana,eclipse') or 'all'."),
            limit("limit", "Optional. Maximum number of balance items to return."),
            DUNE_OFFSET,
        ],
    },
    ToolSpec {
        name: "get_svm_transactions",
        description: "Fetches transactions for a given SVM wallet address (currently Solana only) from the Dune API.",
        upstream: Upstream::Dune,
        action: Action::Fetch("/beta/svm/transactions/{walletAddress}"),
        params: &[
            path("walletAddress", "The SVM wallet address (e.g., a Solana address)"),
            limit("limit", "Optional. Maximum number of transactions to return."),
            DUNE_OFFSET,
        ],
    },
    // --- Blockscout ---
    ToolSpec {
        name: "ping_blockscout",
        description: "Test connectivity to a Blockscout instance for a specific chain.",
        upstream: Upstream::Blockscout,
        action: Action::PingBlockscout,
        params: &[CHAIN_ID],
    },
    ToolSpec {
        name: "blockscout_search",
        description: "Search across addresses, tokens, blocks, and transactions on a specific blockchain using Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/search"),
        params: &[
            param("query", ParamKind::String, true, "The search query (address, tx hash, block number, token name, etc.)", Placement::Query("q")),
            CHAIN_ID,
        ],
    },
    ToolSpec {
        name: "blockscout_address_info",
        description: "Get detailed information about an address including balance, type (EOA/contract), and basic stats from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/addresses/{address}"),
        params: &[path("address", "The address to get information for"), CHAIN_ID],
    },
    ToolSpec {
        name: "blockscout_address_transactions",
        description: "Get all transactions for an address from Blockscout with filtering and pagination support.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/addresses/{address}/transactions"),
        params: &[
            path("address", "The address to get transactions for"),
            CHAIN_ID,
            query("filter", "filter", "Optional. Filter by transaction type: 'from' | 'to' | 'contract_creation'"),
            limit("items_count", "Optional. Number of transactions to return (default: 50)"),
            NEXT_PAGE,
        ],
    },
    ToolSpec {
        name: "blockscout_address_internal_txs",
        description: "Get internal transactions (contract interactions) for an address from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/addresses/{address}/internal-transactions"),
        params: &[
            path("address", "The address to get internal transactions for"),
            CHAIN_ID,
            query("filter", "filter", "Optional. Filter by direction: 'from' | 'to'"),
            limit("items_count", "Optional. Number of internal transactions to return (default: 50)"),
            NEXT_PAGE,
        ],
    },
    ToolSpec {
        name: "blockscout_address_logs",
        description: "Get event logs emitted by or to an address from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/addresses/{address}/logs"),
        params: &[
            path("address", "The address to get logs for"),
            CHAIN_ID,
            limit("items_count", "Optional. Number of logs to return (default: 50)"),
            NEXT_PAGE,
        ],
    },
    ToolSpec {
        name: "blockscout_address_token_balances",
        description: "Get all token balances (ERC-20, ERC-721, ERC-1155) held by an address from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/addresses/{address}/tokens"),
        params: &[
            path("address", "The address to get token balances for"),
            CHAIN_ID,
            query("type", "type", "Optional. Filter by token type: 'ERC-20' | 'ERC-721' | 'ERC-1155'"),
        ],
    },
    ToolSpec {
        name: "blockscout_token_info",
        description: "Get detailed information about a token including supply, decimals, and metadata from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/tokens/{address}"),
        params: &[path("address", "The token contract address"), CHAIN_ID],
    },
    ToolSpec {
        name: "blockscout_token_transfers",
        description: "Get token transfer history for a specific token from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/tokens/{address}/transfers"),
        params: &[
            path("address", "The token contract address"),
            CHAIN_ID,
            limit("items_count", "Optional. Number of transfers to return (default: 50)"),
            NEXT_PAGE,
        ],
    },
    ToolSpec {
        name: "blockscout_nft_instances",
        description: "Get individual NFT instances for an NFT collection from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/tokens/{address}/instances"),
        params: &[
            path("address", "The NFT collection contract address"),
            CHAIN_ID,
            limit("items_count", "Optional. Number of NFT instances to return (default: 50)"),
            NEXT_PAGE,
        ],
    },
    ToolSpec {
        name: "blockscout_nft_metadata",
        description: "Get metadata for a specific NFT token ID from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/tokens/{address}/instances/{tokenId}"),
        params: &[
            path("address", "The NFT collection contract address"),
            path("tokenId", "The specific NFT token ID"),
            CHAIN_ID,
        ],
    },
    ToolSpec {
        name: "blockscout_contract_info",
        description: "Get verified smart contract details including source code, ABI, and metadata from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/smart-contracts/{address}"),
        params: &[CONTRACT, CHAIN_ID],
    },
    ToolSpec {
        name: "blockscout_contract_methods",
        description: "Get readable and writable methods of a verified smart contract from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::ContractMethods,
        params: &[CONTRACT, CHAIN_ID],
    },
    ToolSpec {
        name: "blockscout_read_contract",
        description: "Call a read method on a verified smart contract and get the result from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/smart-contracts/{address}/query-read-method"),
        params: &[
            CONTRACT,
            CHAIN_ID,
            param("method", ParamKind::String, true, "The method name to call", Placement::Query("method_id")),
            param("args", ParamKind::Array, false, "Optional. Array of arguments to pass to the method", Placement::IndexedQuery("args")),
        ],
    },
    ToolSpec {
        name: "blockscout_block_details",
        description: "Get comprehensive information about a specific block from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/blocks/{blockNumber}"),
        params: &[BLOCK, CHAIN_ID],
    },
    ToolSpec {
        name: "blockscout_block_transactions",
        description: "Get all transactions included in a specific block from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/blocks/{blockNumber}/transactions"),
        params: &[
            BLOCK,
            CHAIN_ID,
            limit("items_count", "Optional. Number of transactions to return (default: 50)"),
        ],
    },
    ToolSpec {
        name: "blockscout_latest_blocks",
        description: "Get the most recent blocks from the blockchain via Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/blocks"),
        params: &[CHAIN_ID, limit("items_count", "Optional. Number of blocks to return (default: 50)")],
    },
    ToolSpec {
        name: "blockscout_transaction_raw_trace",
        description: "Get the raw execution trace of a transaction from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/transactions/{txHash}/raw-trace"),
        params: &[TX_HASH, CHAIN_ID],
    },
    ToolSpec {
        name: "blockscout_transaction_state_changes",
        description: "Get state changes (storage slot updates) caused by a transaction from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/transactions/{txHash}/state-changes"),
        params: &[TX_HASH, CHAIN_ID],
    },
    ToolSpec {
        name: "blockscout_verified_contracts",
        description: "Get a list of recently verified smart contracts from Blockscout.",
        upstream: Upstream::Blockscout,
        action: Action::Fetch("/smart-contracts"),
        params: &[
            CHAIN_ID,
            query("filter", "filter", "Optional. Filter by verification type: 'solidity' | 'vyper' | 'yul'"),
            limit("items_count", "Optional. Number of contracts to return (default: 50)"),
        ],
    },
];

pub fn find_tool(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|t| t.name == name)
}

impl ParamSpec {
    fn schema(&self) -> Value {
        let mut schema = match self.kind {
            ParamKind::String => json!({ "type": "string" }),
            ParamKind::Integer => json!({ "type": "integer", "minimum": 1 }),
            ParamKind::Boolean => json!({ "type": "boolean" }),
            ParamKind::StringOrNumber => json!({ "type": ["string", "number"] }),
            ParamKind::Array => json!({ "type": "array", "items": {} }),
        };
        schema["description"] = json!(self.description);
        schema
    }
}

impl ToolSpec {
    /// JSON Schema of the tool's arguments, as advertised by `tools/list`.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for p in self.params {
            properties.insert(p.name.to_string(), p.schema());
        }
        let required: Vec<&str> = self.params.iter().filter(|p| p.required).map(|p| p.name).collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn definition(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}

/// An upstream request built from validated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    pub chain_id: Option<String>,
    pub path: String,
    pub query: Vec<(String, String)>,
}

/// Left as-is in a path segment: the RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// The one path parameter that spans several segments (`1/0xTOKEN`).
const MULTI_SEGMENT_PARAM: &str = "chainAndTokenUri";

/// Percent-encodes an argument for its path slot. Dot segments are refused
/// because URL parsing would resolve them against the template.
fn encode_path_value(name: &str, text: &str, req_id: &Value) -> Result<String, Response> {
    let segments: Vec<&str> = if name == MULTI_SEGMENT_PARAM {
        text.split('/').collect()
    } else {
        vec![text]
    };
    if segments.iter().any(|s| s.is_empty() || *s == "." || *s == "..") {
        return Err(Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Invalid path value for argument '{}'", name),
        ));
    }
    Ok(segments
        .iter()
        .map(|s| utf8_percent_encode(s, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/"))
}

/// Validates `args` against the tool's parameters and fills in the path template.
pub fn prepare(
    tool: &ToolSpec,
    template: &str,
    args: &Value,
    req_id: &Value,
) -> Result<PreparedCall, Response> {
    let mut call = PreparedCall {
        chain_id: None,
        path: template.to_string(),
        query: Vec::new(),
    };

    for p in tool.params {
        let value = match args.get(p.name) {
            None | Some(Value::Null) if p.required => {
                return Err(Response::error(
                    req_id.clone(),
                    error_codes::INVALID_PARAMS,
                    format!("Missing or invalid required argument: '{}'", p.name),
                ))
            }
            None | Some(Value::Null) => continue,
            Some(v) => v,
        };

        let rendered: Vec<String> = match p.kind {
            ParamKind::String => vec![utils::get_required_arg::<String>(args, p.name, req_id)?],
            ParamKind::Integer => vec![utils::positive_int(value, p.name, req_id)?.to_string()],
            ParamKind::Boolean => vec![utils::get_required_arg::<bool>(args, p.name, req_id)?.to_string()],
            ParamKind::StringOrNumber => vec![utils::string_or_number(value, p.name, req_id)?],
            ParamKind::Array => utils::get_required_arg::<Vec<Value>>(args, p.name, req_id)?
                .iter()
                .map(utils::query_text)
                .collect(),
        };

        match p.placement {
            Placement::Path => {
                let text = encode_path_value(p.name, rendered.concat().trim(), req_id)?;
                call.path = call.path.replace(&format!("{{{}}}", p.name), &text);
            }
            Placement::Query(key) => {
                call.query.extend(rendered.into_iter().map(|v| (key.to_string(), v)));
            }
            Placement::Chain => call.chain_id = rendered.into_iter().next(),
            Placement::IndexedQuery(key) => {
                for (i, v) in rendered.into_iter().enumerate() {
                    call.query.push((format!("{key}[{i}]"), v));
                }
            }
        }
    }

    Ok(call)
}

pub fn text_result(text: impl Into<String>) -> Value {
    json!({ "content": [{ "type": "text", "text": text.into() }] })
}

pub fn error_result(text: impl Into<String>) -> Value {
    json!({ "isError": true, "content": [{ "type": "text", "text": text.into() }] })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Runs a tool. `Err` is a protocol error; upstream failures are `Ok` with `isError`.
pub async fn call_tool(
    client: &UpstreamClient,
    name: &str,
    args: &Value,
    req_id: &Value,
) -> Result<Value, Response> {
    let tool = find_tool(name).ok_or_else(|| {
        Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Unknown tool: {}", name),
        )
    })?;
    debug!(tool = tool.name, "calling tool");

    let outcome: Result<String, UpstreamError> = match tool.action {
        Action::Pong(text) => Ok(text.to_string()),
        Action::Fetch(template) => {
            let call = prepare(tool, template, args, req_id)?;
            fetch(client, tool.upstream, &call).await.map(|data| pretty(&data))
        }
        Action::PingBlockscout => {
            let call = prepare(tool, "/stats", args, req_id)?;
            let chain_id = call.chain_id.clone().unwrap_or_default();
            let Some(network) = find_network(&chain_id) else {
                // Reported as ordinary text, not a tool error.
                return Ok(text_result(format!(
                    "Unsupported chain ID: {}. Supported chains: {}",
                    chain_id,
                    supported_chain_ids()
                )));
            };
            fetch(client, tool.upstream, &call).await.map(|stats| {
                format!(
                    "✓ Blockscout {} (chain {}) is active. Network stats: {}",
                    network.name,
                    chain_id,
                    pretty(&stats)
                )
            })
        }
        Action::ContractMethods => {
            let read = prepare(tool, "/smart-contracts/{address}/methods-read", args, req_id)?;
            let write = prepare(tool, "/smart-contracts/{address}/methods-write", args, req_id)?;
            match fetch(client, tool.upstream, &read).await {
                Ok(read_methods) => fetch(client, tool.upstream, &write).await.map(|write_methods| {
                    pretty(&json!({ "readMethods": read_methods, "writeMethods": write_methods }))
                }),
                Err(e) => Err(e),
            }
        }
    };

    Ok(match outcome {
        Ok(text) => text_result(text),
        Err(e) => {
            warn!(tool = tool.name, "upstream call failed: {}", e);
            error_result(e.to_string())
        }
    })
}

async fn fetch(
    client: &UpstreamClient,
    upstream: Upstream,
    call: &PreparedCall,
) -> Result<Value, UpstreamError> {
    match upstream {
        Upstream::Dune => client.dune_get(&call.path, &call.query).await,
        Upstream::Blockscout => {
            let chain_id = call.chain_id.as_deref().unwrap_or_default();
            client.blockscout_get(chain_id, &call.path, &call.query).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tool_names_are_unique() {
        let names: HashSet<&str> = TOOLS.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), TOOLS.len());
        assert_eq!(TOOLS.len(), 29);
    }

    #[test]
    fn every_path_placeholder_has_a_parameter() {
        for tool in TOOLS {
            if let Action::Fetch(template) = tool.action {
                for p in tool.params.iter().filter(|p| p.placement == Placement::Path) {
                    assert!(
                        template.contains(&format!("{{{}}}", p.name)),
                        "{} has no slot for {}",
                        tool.name,
                        p.name
                    );
                }
            }
        }
    }

    #[test]
    fn schema_lists_required_params() {
        let schema = find_tool("get_evm_token_info").unwrap().input_schema();
        assert_eq!(schema["required"], json!(["chainAndTokenUri", "chainIds"]));
        assert_eq!(schema["properties"]["limit"]["type"], "integer");
    }

    #[test]
    fn prepare_fills_path_and_query() {
        let tool = find_tool("get_evm_balances").unwrap();
        let Action::Fetch(template) = tool.action else { panic!("not a fetch tool") };
        let call = prepare(
            tool,
            template,
            &json!({
                "walletAddress": "0xabc",
                "chainIds": "1,137",
                "excludeSpamTokens": true,
                "limit": "20"
            }),
            &json!(1),
        )
        .unwrap();
        assert_eq!(call.path, "/v1/evm/balances/0xabc");
        assert_eq!(
            call.query,
            vec![
                ("chain_ids".to_string(), "1,137".to_string()),
                ("exclude_spam_tokens".to_string(), "true".to_string()),
                ("limit".to_string(), "20".to_string()),
            ]
        );
    }

    #[test]
    fn blockscout_limit_maps_to_items_count_and_args_are_indexed() {
        let tool = find_tool("blockscout_read_contract").unwrap();
        let Action::Fetch(template) = tool.action else { panic!("not a fetch tool") };
        let call = prepare(
            tool,
            template,
            &json!({"address": "0xc0", "chainId": "137", "method": "balanceOf", "args": ["0xdead", 7]}),
            &json!(1),
        )
        .unwrap();
        assert_eq!(call.chain_id.as_deref(), Some("137"));
        assert_eq!(call.path, "/smart-contracts/0xc0/query-read-method");
        assert_eq!(
            call.query,
            vec![
                ("method_id".to_string(), "balanceOf".to_string()),
                ("args[0]".to_string(), "0xdead".to_string()),
                ("args[1]".to_string(), "7".to_string()),
            ]
        );

        let tool = find_tool("blockscout_latest_blocks").unwrap();
        let call = prepare(tool, "/blocks", &json!({"chainId": "1", "limit": 5}), &json!(1)).unwrap();
        assert_eq!(call.query, vec![("items_count".to_string(), "5".to_string())]);
    }

    #[test]
    fn numeric_chain_id_in_path() {
        let tool = find_tool("get_evm_token_holders").unwrap();
        let Action::Fetch(template) = tool.action else { panic!("not a fetch tool") };
        let call = prepare(tool, template, &json!({"chainId": 8453, "tokenAddress": "0xtok"}), &json!(1)).unwrap();
        assert_eq!(call.path, "/v1/evm/token-holders/8453/0xtok");
    }

    #[test]
    fn bad_arguments_are_invalid_params() {
        let tool = find_tool("get_evm_activity").unwrap();
        let err = prepare(tool, "/x/{walletAddress}", &json!({"walletAddress": "0x1", "limit": 0}), &json!(4))
            .unwrap_err();
        assert_eq!(err.error.unwrap().code, error_codes::INVALID_PARAMS);

        let err = prepare(tool, "/x/{walletAddress}", &json!({}), &json!(4)).unwrap_err();
        assert!(err.error.unwrap().message.contains("walletAddress"));
    }

    #[test]
    fn path_arguments_cannot_climb_out_of_their_segment() {
        let tool = find_tool("get_svm_balances").unwrap();
        let Action::Fetch(template) = tool.action else { panic!("not a fetch tool") };

        let call = prepare(tool, template, &json!({"walletAddress": "../../v1/evm/x?y=1#z"}), &json!(1)).unwrap();
        assert!(call.path.starts_with("/beta/svm/balances/"));
        assert!(call.path.ends_with("..%2F..%2Fv1%2Fevm%2Fx%3Fy%3D1%23z"));

        let call = prepare(tool, template, &json!({"walletAddress": "%2e%2e"}), &json!(1)).unwrap();
        assert!(call.path.ends_with("%252e%252e"));

        for bad in ["..", ".", ""] {
            let err = prepare(tool, template, &json!({"walletAddress": bad}), &json!(2)).unwrap_err();
            assert_eq!(err.error.unwrap().code, error_codes::INVALID_PARAMS);
        }
    }

    #[test]
    fn token_uri_keeps_its_separator_but_not_dot_segments() {
        let tool = find_tool("get_evm_token_info").unwrap();
        let Action::Fetch(template) = tool.action else { panic!("not a fetch tool") };

        let call = prepare(tool, template, &json!({"chainAndTokenUri": "1/native", "chainIds": "1"}), &json!(1)).unwrap();
        assert_eq!(call.path, "/v1/evm/token-info/1/native");

        let err = prepare(
            tool,
            template,
            &json!({"chainAndTokenUri": "1/../../balances/0xabc", "chainIds": "1"}),
            &json!(1),
        )
        .unwrap_err();
        assert_eq!(err.error.unwrap().code, error_codes::INVALID_PARAMS);
    }
}
