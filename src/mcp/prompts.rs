// src/mcp/prompts.rs

use serde_json::{json, Map, Value};

use crate::{
    mcp::protocol::{error_codes, Response},
    utils,
};

struct PromptArg {
    name: &'static str,
    description: &'static str,
    required: bool,
}

const fn required(name: &'static str, description: &'static str) -> PromptArg {
    PromptArg { name, description, required: true }
}

const fn optional(name: &'static str, description: &'static str) -> PromptArg {
    PromptArg { name, description, required: false }
}

struct PromptSpec {
    name: &'static str,
    description: &'static str,
    arguments: &'static [PromptArg],
    /// Builds the user + assistant message texts from resolved arguments.
    render: fn(&Map<String, Value>) -> (String, String),
}

fn arg<'a>(args: &'a Map<String, Value>, key: &str) -> &'a str {
    args.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// An optional argument that was supplied and is not blank.
fn opt<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str).filter(|v| !v.trim().is_empty())
}

fn clause(args: &Map<String, Value>, key: &str, render: impl Fn(&str) -> String) -> String {
    opt(args, key).map(render).unwrap_or_default()
}

const CHAIN_ID: PromptArg = required("chainId", "The chain ID (e.g., '1' for Ethereum, '137' for Polygon)");
const CHAIN: PromptArg = required("chainId", "The chain ID");

static PROMPTS: &[PromptSpec] = &[
    PromptSpec {
        name: "comprehensive_wallet_analysis",
        description: "Perform a deep analysis of a wallet using both Blockscout and Dune APIs for comprehensive insights.",
        arguments: &[required("walletAddress", "The wallet address to analyze"), CHAIN_ID],
        render: |args| {
            let wallet = arg(args, "walletAddress");
            let chain = arg(args, "chainId");
            (
                format!("Please perform a comprehensive analysis of wallet {wallet} on chain {chain}. I need:\n1. A behavioral profile of the wallet\n2. Current portfolio composition\n3. Recent transaction patterns\n4. Risk assessment"),
                format!("I'll analyze wallet {wallet} on chain {chain} by combining 'blockscout_address_info', 'blockscout_address_transactions' and 'blockscout_address_token_balances' from Blockscout with 'get_evm_balances' and 'get_evm_activity' from Dune."),
            )
        },
    },
    PromptSpec {
        name: "smart_contract_deep_dive",
        description: "Investigate a smart contract thoroughly using combined Blockscout and Dune data.",
        arguments: &[required("contractAddress", "The smart contract address to investigate"), CHAIN_ID],
        render: |args| {
            let contract = arg(args, "contractAddress");
            let chain = arg(args, "chainId");
            (
                format!("I need a thorough investigation of smart contract {contract} on chain {chain}. Please provide:\n1. Contract verification status and source code availability\n2. Available read/write methods\n3. Token metrics if applicable\n4. Recent usage patterns"),
                format!("I'll investigate smart contract {contract} on chain {chain} with 'blockscout_contract_info' and 'blockscout_contract_methods', check token metrics with 'blockscout_token_info', and review recent usage with 'blockscout_address_transactions'."),
            )
        },
    },
    PromptSpec {
        name: "token_risk_assessment",
        description: "Perform a detailed risk assessment of a token using multi-source analysis.",
        arguments: &[required("tokenAddress", "The token contract address"), CHAIN_ID],
        render: |args| {
            let token = arg(args, "tokenAddress");
            let chain = arg(args, "chainId");
            (
                format!("Please perform a comprehensive risk assessment of token {token} on chain {chain}. I need to understand:\n1. Holder concentration and distribution\n2. Recent transfer activity\n3. Liquidity and trading volume\n4. Any red flags or warnings"),
                format!("I'll assess token {token} on chain {chain} by combining real-time transfers from 'blockscout_token_transfers' and 'blockscout_token_info' with holder analytics from 'get_evm_token_holders' and 'get_evm_token_info'."),
            )
        },
    },
    PromptSpec {
        name: "transaction_post_mortem",
        description: "Analyze a transaction's full impact and context using advanced tools.",
        arguments: &[required("txHash", "The transaction hash to analyze"), CHAIN_ID],
        render: |args| {
            let tx = arg(args, "txHash");
            let chain = arg(args, "chainId");
            (
                format!("Please analyze transaction {tx} on chain {chain}. I want to understand:\n1. What exactly happened in this transaction\n2. All internal transactions and state changes\n3. Context about the sender and receiver\n4. Overall impact and complexity"),
                format!("I'll analyze transaction {tx} on chain {chain} using 'blockscout_transaction_raw_trace' and 'blockscout_transaction_state_changes', then add context on the sender and receiver with 'blockscout_address_info' and 'get_evm_activity'."),
            )
        },
    },
    PromptSpec {
        name: "compare_networks",
        description: "Compare supported networks and their API capabilities.",
        arguments: &[],
        render: |_| {
            (
                "Show me all supported blockchain networks and compare which APIs (Dune vs Blockscout) are available for each chain.".to_string(),
                "I'll fetch the unified network support information that shows all supported chains and their API availability across both Dune and Blockscout.".to_string(),
            )
        },
    },
    PromptSpec {
        name: "defi_protocol_investigation",
        description: "Investigate a DeFi protocol by analyzing its core contracts, TVL, and user activity patterns.",
        arguments: &[
            required("protocolName", "The name of the DeFi protocol (e.g., 'Uniswap', 'Aave')"),
            required("mainContract", "The main protocol contract address"),
            required("chainId", "The chain ID where the protocol operates"),
        ],
        render: |args| {
            let protocol = arg(args, "protocolName");
            (
                format!(
                    "Investigate the {protocol} DeFi protocol on chain {}. Main contract: {}. I need:\n1. Contract verification and security analysis\n2. Top users and their activity patterns\n3. Token flows and liquidity analysis\n4. Recent significant transactions\n5. Risk assessment and red flags",
                    arg(args, "chainId"),
                    arg(args, "mainContract"),
                ),
                format!("I'll conduct a comprehensive investigation of {protocol} using multiple analysis tools to examine the contract, user patterns, and transaction flows."),
            )
        },
    },
    PromptSpec {
        name: "token_launch_investigation",
        description: "Perform forensic analysis on a newly launched token to identify potential risks or scams.",
        arguments: &[
            required("tokenAddress", "The token contract address"),
            CHAIN,
            optional("launchDate", "Optional: The token launch date (YYYY-MM-DD)"),
        ],
        render: |args| {
            (
                format!(
                    "Perform a forensic investigation of token {} on chain {}{}. Check for:\n1. Contract code red flags (minting, pause, blacklist functions)\n2. Initial distribution and holder concentration\n3. Liquidity pool analysis and locks\n4. Developer wallet activity\n5. Similar contract deployments by same deployer\n6. Social engineering indicators",
                    arg(args, "tokenAddress"),
                    arg(args, "chainId"),
                    clause(args, "launchDate", |d| format!(" launched on {d}")),
                ),
                "I'll perform a comprehensive forensic analysis to identify any potential risks or scam indicators for this token launch.".to_string(),
            )
        },
    },
    PromptSpec {
        name: "whale_movement_analysis",
        description: "Track and analyze large holder (whale) movements for a specific token or protocol.",
        arguments: &[
            required("tokenAddress", "The token contract address to monitor"),
            CHAIN,
            optional("threshold", "Optional: Minimum USD value to consider as whale activity (default: $100,000)"),
        ],
        render: |args| {
            (
                format!(
                    "Track whale movements for token {} on chain {}{}. Analyze:\n1. Large holder list and concentration changes\n2. Recent significant transfers (in/out)\n3. Accumulation or distribution patterns\n4. Correlation with price movements\n5. Cross-protocol activity by whales",
                    arg(args, "tokenAddress"),
                    arg(args, "chainId"),
                    clause(args, "threshold", |t| format!(" with threshold {t}")),
                ),
                "I'll analyze whale activity and large holder movements to identify accumulation/distribution patterns and their market impact.".to_string(),
            )
        },
    },
    PromptSpec {
        name: "nft_collection_forensics",
        description: "Comprehensive analysis of an NFT collection including rarity, trading patterns, and holder behavior.",
        arguments: &[
            required("collectionAddress", "The NFT collection contract address"),
            CHAIN,
            optional("includeRarity", "Optional: Include rarity analysis - 'true' or 'false' (default: true)"),
        ],
        render: |args| {
            let rarity = if opt(args, "includeRarity") == Some("false") {
                ""
            } else {
                "6. Rarity distribution analysis"
            };
            (
                format!(
                    "Analyze NFT collection {} on chain {}. Include:\n1. Collection metadata and verified status\n2. Holder distribution and concentration\n3. Trading volume and floor price trends\n4. Wash trading detection\n5. Blue chip holder overlap\n{rarity}",
                    arg(args, "collectionAddress"),
                    arg(args, "chainId"),
                ),
                "I'll perform a comprehensive NFT collection analysis including holder patterns, trading activity, and market dynamics.".to_string(),
            )
        },
    },
    PromptSpec {
        name: "bridge_transaction_verification",
        description: "Verify and analyze cross-chain bridge transactions for security and completion status.",
        arguments: &[
            required("bridgeContract", "The bridge contract address"),
            optional("txHash", "Optional: Specific transaction to verify"),
            required("sourceChain", "Source chain ID"),
            optional("targetChain", "Optional: Target chain ID"),
        ],
        render: |args| {
            let last = if opt(args, "txHash").is_some() {
                "6. Specific transaction status and verification"
            } else {
                "6. Pending/stuck transactions"
            };
            (
                format!(
                    "Analyze bridge {} on chain {}{}{}. Check:\n1. Bridge contract verification and security\n2. Recent bridge transactions and success rate\n3. Liquidity on both sides\n4. Fee structure analysis\n5. Known security incidents\n{last}",
                    arg(args, "bridgeContract"),
                    arg(args, "sourceChain"),
                    clause(args, "targetChain", |c| format!(" bridging to chain {c}")),
                    clause(args, "txHash", |t| format!(" for transaction {t}")),
                ),
                "I'll analyze the bridge contract and transactions to verify security and operational status.".to_string(),
            )
        },
    },
    PromptSpec {
        name: "mev_activity_detection",
        description: "Detect and analyze MEV (Maximum Extractable Value) activity including sandwich attacks and arbitrage.",
        arguments: &[
            optional("targetAddress", "Optional: Specific address or contract to monitor"),
            CHAIN,
            optional("blockRange", "Optional: Block range to analyze (e.g., 'latest-100')"),
        ],
        render: |args| {
            let blocks = opt(args, "blockRange")
                .map(|r| format!(" in blocks {r}"))
                .unwrap_or_else(|| " in recent blocks".to_string());
            (
                format!(
                    "Detect MEV activity on chain {}{}{blocks}. Identify:\n1. Sandwich attacks (front-run + back-run patterns)\n2. Arbitrage transactions across DEXes\n3. Liquidation races\n4. NFT MEV (trait sniping, floor sweeping)\n5. MEV bot identification and profit analysis",
                    arg(args, "chainId"),
                    clause(args, "targetAddress", |a| format!(" involving {a}")),
                ),
                "I'll scan for MEV patterns including sandwich attacks, arbitrage, and other extractable value activities.".to_string(),
            )
        },
    },
    PromptSpec {
        name: "gas_optimization_audit",
        description: "Analyze gas usage patterns and identify optimization opportunities for contracts or users.",
        arguments: &[
            required("address", "Contract or wallet address to analyze"),
            CHAIN,
            optional("timeframe", "Optional: Analysis timeframe (e.g., '7d', '30d')"),
        ],
        render: |args| {
            (
                format!(
                    "Perform gas optimization analysis for {} on chain {}{}. Analyze:\n1. Gas consumption by function/transaction type\n2. Comparison with similar contracts/users\n3. Peak vs off-peak usage patterns\n4. Failed transaction gas waste\n5. Specific optimization recommendations\n6. Estimated savings potential",
                    arg(args, "address"),
                    arg(args, "chainId"),
                    clause(args, "timeframe", |t| format!(" over {t}")),
                ),
                "I'll analyze gas usage patterns and identify specific optimization opportunities to reduce transaction costs.".to_string(),
            )
        },
    },
    PromptSpec {
        name: "dao_treasury_audit",
        description: "Comprehensive audit of a DAO treasury including assets, spending, and governance.",
        arguments: &[
            required("treasuryAddress", "The DAO treasury address"),
            CHAIN,
            optional("governanceContract", "Optional: Governance contract address"),
        ],
        render: |args| {
            (
                format!(
                    "Audit DAO treasury {} on chain {}{}. Analyze:\n1. Current asset composition and diversification\n2. Inflow/outflow patterns and burn rate\n3. Large transactions and approval process\n4. Yield generation strategies\n5. Risk assessment (concentration, liquidity)\n6. Governance participation and proposal history",
                    arg(args, "treasuryAddress"),
                    arg(args, "chainId"),
                    clause(args, "governanceContract", |g| format!(" with governance {g}")),
                ),
                "I'll conduct a comprehensive treasury audit analyzing assets, spending patterns, and governance effectiveness.".to_string(),
            )
        },
    },
    PromptSpec {
        name: "security_vulnerability_scan",
        description: "Scan smart contracts for common vulnerabilities and security best practices.",
        arguments: &[
            required("contractAddress", "The contract address to scan"),
            CHAIN,
            optional("checkUpgradeable", "Optional: Check for upgradeable proxy patterns - 'true' or 'false'"),
        ],
        render: |args| {
            let proxy = if opt(args, "checkUpgradeable") == Some("true") {
                "5. Upgradeable proxy implementation security"
            } else {
                "5. Immutability verification"
            };
            (
                format!(
                    "Perform security scan on contract {} on chain {}. Check for:\n1. Contract verification status and source code\n2. Common vulnerabilities (reentrancy, overflow, access control)\n3. Centralization risks (owner privileges, pause functions)\n4. External dependencies and composability risks\n{proxy}\n6. Historical security incidents",
                    arg(args, "contractAddress"),
                    arg(args, "chainId"),
                ),
                "I'll scan the contract for security vulnerabilities and analyze potential risks in the implementation.".to_string(),
            )
        },
    },
    PromptSpec {
        name: "yield_strategy_comparison",
        description: "Compare and analyze DeFi yield strategies across protocols.",
        arguments: &[
            required("asset", "The asset to analyze (e.g., 'USDC', 'ETH')"),
            CHAIN,
            optional("minTvl", "Optional: Minimum TVL for protocols to consider"),
        ],
        render: |args| {
            let asset = arg(args, "asset");
            (
                format!(
                    "Compare yield strategies for {asset} on chain {}{}. Analyze:\n1. Current yield rates across protocols\n2. Risk assessment (smart contract, liquidity, impermanent loss)\n3. Gas costs and minimum viable amounts\n4. Historical yield stability\n5. Composability opportunities\n6. Optimal strategy recommendations",
                    arg(args, "chainId"),
                    clause(args, "minTvl", |t| format!(" with minimum TVL {t}")),
                ),
                format!("I'll analyze and compare yield opportunities across DeFi protocols to identify optimal strategies for {asset}."),
            )
        },
    },
    PromptSpec {
        name: "evm_wallet_overview",
        description: "Overview of an EVM wallet: current token balances and its 5 most recent activities.",
        arguments: &[required("walletAddress", "The EVM wallet address to get an overview for.")],
        render: |args| {
            let wallet = arg(args, "walletAddress");
            (
                format!("Please provide an overview for EVM wallet {wallet}. I'm interested in its current token balances and a summary of its 5 most recent activities. Present the balances first, then the activity summary."),
                format!("Okay, I will use the 'get_evm_balances' tool to fetch token balances and the 'get_evm_activity' tool (with a limit of 5) to get recent activity for {wallet}. Then I will summarize the findings."),
            )
        },
    },
    PromptSpec {
        name: "analyze_erc20_token",
        description: "Analyze a specific ERC20 token, showing its information and top 10 holders.",
        arguments: &[
            required("chainId", "The chain ID where the token resides (e.g., '1' for Ethereum). Input as a string."),
            required("tokenAddress", "The ERC20 token contract address."),
        ],
        render: |args| {
            let chain = arg(args, "chainId");
            let token = arg(args, "tokenAddress");
            (
                format!("I need a detailed analysis of the ERC20 token {token} on chain {chain}. Please fetch its token information and list its top 10 holders."),
                format!("Understood. I will use 'get_evm_token_info' for chain {chain} and token {token} (using chainId {chain} for the chain_ids parameter), and then 'get_evm_token_holders' for the same chain and token with a limit of 10. I will then present this information."),
            )
        },
    },
    PromptSpec {
        name: "svm_address_check",
        description: "Check basic information for an SVM address, including balances and its 3 most recent transactions.",
        arguments: &[required("walletAddress", "The SVM wallet address to check.")],
        render: |args| {
            let wallet = arg(args, "walletAddress");
            (
                format!("Please provide a quick check for the SVM address {wallet}. Show me its token balances (for Solana by default) and its 3 most recent transactions."),
                format!("Okay, I will use 'get_svm_balances' (defaulting to Solana chain) and 'get_svm_transactions' (with a limit of 3) for the address {wallet} and summarize the results."),
            )
        },
    },
];

pub fn list() -> Value {
    let prompts: Vec<Value> = PROMPTS
        .iter()
        .map(|p| {
            let arguments: Vec<Value> = p
                .arguments
                .iter()
                .map(|a| json!({ "name": a.name, "description": a.description, "required": a.required }))
                .collect();
            json!({ "name": p.name, "description": p.description, "arguments": arguments })
        })
        .collect();
    json!({ "prompts": prompts })
}

/// Handles `prompts/get`. Arguments must be strings; required ones must be present.
pub fn get(name: &str, args: &Value, req_id: &Value) -> Result<Value, Response> {
    let prompt = PROMPTS.iter().find(|p| p.name == name).ok_or_else(|| {
        Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Prompt not found: {}", name),
        )
    })?;

    let mut resolved = Map::new();
    for a in prompt.arguments {
        let value: Option<String> = if a.required {
            Some(utils::get_required_arg(args, a.name, req_id)?)
        } else {
            utils::get_optional_arg(args, a.name, req_id)?
        };
        if let Some(value) = value {
            resolved.insert(a.name.to_string(), Value::String(value));
        }
    }

    let (user, assistant) = (prompt.render)(&resolved);
    Ok(json!({
        "description": prompt.description,
        "messages": [
            { "role": "user", "content": { "type": "text", "text": user } },
            { "role": "assistant", "content": { "type": "text", "text": assistant } }
        ]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn user_text(out: &Value) -> &str {
        out["messages"][0]["content"]["text"].as_str().unwrap()
    }

    #[test]
    fn lists_every_prompt_once() {
        let listed = list();
        let names: Vec<&str> = listed["prompts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names.len(), 18);
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), names.len());
        assert_eq!(names[..2], ["comprehensive_wallet_analysis", "smart_contract_deep_dive"]);
        assert!(names.ends_with(&["evm_wallet_overview", "analyze_erc20_token", "svm_address_check"]));
    }

    #[test]
    fn optional_arguments_are_advertised() {
        let listed = list();
        let whale = listed["prompts"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["name"] == "whale_movement_analysis")
            .unwrap();
        let required: Vec<bool> = whale["arguments"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["required"].as_bool().unwrap())
            .collect();
        assert_eq!(required, [true, true, false]);
    }

    #[test]
    fn renders_arguments_into_messages() {
        let out = get(
            "analyze_erc20_token",
            &json!({"chainId": "1", "tokenAddress": "0xA0b8"}),
            &json!(3),
        )
        .unwrap();
        assert!(user_text(&out).contains("0xA0b8 on chain 1"));
        assert_eq!(out["messages"][1]["role"], "assistant");
    }

    #[test]
    fn optional_clauses_follow_their_arguments() {
        let args = json!({"tokenAddress": "0xT", "chainId": "1"});
        let plain = get("whale_movement_analysis", &args, &json!(1)).unwrap();
        assert!(user_text(&plain).starts_with("Track whale movements for token 0xT on chain 1. Analyze:"));

        let args = json!({"tokenAddress": "0xT", "chainId": "1", "threshold": "$1M"});
        let with = get("whale_movement_analysis", &args, &json!(1)).unwrap();
        assert!(user_text(&with).contains("on chain 1 with threshold $1M. Analyze:"));

        let scan = get(
            "security_vulnerability_scan",
            &json!({"contractAddress": "0xC", "chainId": "1", "checkUpgradeable": "true"}),
            &json!(1),
        )
        .unwrap();
        assert!(user_text(&scan).contains("5. Upgradeable proxy implementation security"));

        let bridge = get(
            "bridge_transaction_verification",
            &json!({"bridgeContract": "0xB", "sourceChain": "1", "txHash": "0xH"}),
            &json!(1),
        )
        .unwrap();
        assert!(user_text(&bridge).starts_with("Analyze bridge 0xB on chain 1 for transaction 0xH."));
        assert!(user_text(&bridge).ends_with("6. Specific transaction status and verification"));
    }

    #[test]
    fn prompt_without_arguments_renders() {
        let out = get("compare_networks", &json!({}), &json!(1)).unwrap();
        assert!(user_text(&out).contains("Dune vs Blockscout"));
    }

    #[test]
    fn missing_argument_is_invalid_params() {
        let err = get("svm_address_check", &json!({}), &json!(3)).unwrap_err();
        assert_eq!(err.error.unwrap().code, error_codes::INVALID_PARAMS);

        let err = get("gas_optimization_audit", &json!({"address": "0x1", "chainId": "1", "timeframe": 7}), &json!(3))
            .unwrap_err();
        assert_eq!(err.error.unwrap().code, error_codes::INVALID_PARAMS);
    }
}
