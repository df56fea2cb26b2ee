//! Client configuration and JSON (de)serialization helpers.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Public Base Sepolia JSON-RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "https://sepolia.base.org";

/// USDC (6 decimals) on Base Sepolia.
pub const DEFAULT_TOKEN_CONTRACT: &str = "0x036CbD53842c5426634e7929541eC2318f3dCF7e";

/// Network configuration, fixed at construction.
///
/// The signing key is deliberately not part of it so a config can be
/// logged or written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscrowConfig {
    /// JSON-RPC endpoint URL
    pub rpc_url: String,
    /// Escrow smart contract address; has no default and must be set
    pub escrow_contract: Option<String>,
    /// ERC-20 token escrowed by the contract
    pub token_contract: String,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            escrow_contract: None,
            token_contract: DEFAULT_TOKEN_CONTRACT.to_string(),
        }
    }
}

/// Reads a JSON-encoded config from the given `path`.
pub fn load_config<P>(path: P) -> anyhow::Result<EscrowConfig>
where
    P: AsRef<Path>,
{
    load_json(path)
}

/// Reads JSON-encoded data from the given `path` into `T`.
pub fn load_json<P, T>(path: P) -> anyhow::Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            anyhow::bail!("Config file {:?} not found", path);
        }
        Err(e) => return Err(e).context(format!("opening file {:?}", path)),
    };
    serde_json::from_reader(file).with_context(|| format!("parsing JSON from {:?}", path))
}
