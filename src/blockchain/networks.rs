// src/blockchain/networks.rs

use serde::Serialize;

/// A Blockscout explorer instance serving one EVM chain.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockscoutNetwork {
    pub chain_id: &'static str,
    pub name: &'static str,
    pub url: &'static str,
}

/// Explorer instances reachable through the `blockscout_*` tools.
/// Not every entry runs Blockscout proper; the ones that don't still expose the v2 API shape.
pub const BLOCKSCOUT_NETWORKS: &[BlockscoutNetwork] = &[
    BlockscoutNetwork { chain_id: "1", name: "Ethereum", url: "https://eth.blockscout.com" },
    BlockscoutNetwork { chain_id: "10", name: "Optimism", url: "https://optimism.blockscout.com" },
    BlockscoutNetwork { chain_id: "56", name: "BNB Smart Chain", url: "https://bscxplorer.com" },
    BlockscoutNetwork { chain_id: "100", name: "Gnosis", url: "https://gnosis.blockscout.com" },
    BlockscoutNetwork { chain_id: "137", name: "Polygon", url: "https://polygon.blockscout.com" },
    BlockscoutNetwork { chain_id: "250", name: "Fantom", url: "https://ftmscan.com" },
    BlockscoutNetwork { chain_id: "8453", name: "Base", url: "https://base.blockscout.com" },
    BlockscoutNetwork { chain_id: "42161", name: "Arbitrum", url: "https://arbitrum.blockscout.com" },
    BlockscoutNetwork { chain_id: "43114", name: "Avalanche", url: "https://snowtrace.io" },
];

/// Looks up a network by its decimal chain id.
pub fn find_network(chain_id: &str) -> Option<&'static BlockscoutNetwork> {
    let chain_id = chain_id.trim();
    BLOCKSCOUT_NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

/// Comma separated list of supported chain ids, for error messages.
pub fn supported_chain_ids() -> String {
    BLOCKSCOUT_NETWORKS
        .iter()
        .map(|n| n.chain_id)
        .collect::<Vec<_>>()
        .join(", ")
}
