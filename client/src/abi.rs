//! Contract schemas used for encoding calls and decoding logs and reverts.

use ethers::abi::{Abi, Token};
use serde_json::Value;

use crate::error::ClientError;

// Escrow ABI for encoding/decoding calls, events and custom errors
const ESCROW_ABI_JSON: &str = include_str!("../abi/Escrow.json");
// Token ABI, only the allowance surface is used
const ERC20_ABI_JSON: &str = include_str!("../abi/ERC20.json");

// On-chain escrow operations.
pub const CREATE_ESCROW: &str = "createEscrow";
pub const COMPLETE_ESCROW: &str = "completeEscrow";
pub const RAISE_DISPUTE: &str = "raiseDispute";
pub const GET_ESCROW: &str = "getEscrow";
pub const GET_REPUTATION: &str = "getReputation";

// Token operations.
pub const APPROVE: &str = "approve";
pub const ALLOWANCE: &str = "allowance";

// Events and their identifier fields.
pub const ESCROW_CREATED: &str = "EscrowCreated";
pub const ESCROW_ID: &str = "escrowId";

/// Which deployed contract an [`Action`] is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Escrow,
    Token,
}

/// A deferred contract call: method name plus ABI-encoded arguments,
/// awaiting submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub target: Target,
    pub method: &'static str,
    pub args: Vec<Token>,
}

impl Action {
    pub fn escrow(method: &'static str, args: Vec<Token>) -> Self {
        Self {
            target: Target::Escrow,
            method,
            args,
        }
    }

    pub fn token(method: &'static str, args: Vec<Token>) -> Self {
        Self {
            target: Target::Token,
            method,
            args,
        }
    }
}

/// The escrow and token schemas, parsed from the bundled artifacts.
#[derive(Debug, Clone)]
pub struct Schemas {
    pub escrow: Abi,
    pub token: Abi,
}

impl Schemas {
    pub fn load() -> Result<Self, ClientError> {
        Ok(Self {
            escrow: parse_artifact(ESCROW_ABI_JSON)?,
            token: parse_artifact(ERC20_ABI_JSON)?,
        })
    }

    /// ABI for `target`.
    pub fn for_target(&self, target: Target) -> &Abi {
        match target {
            Target::Escrow => &self.escrow,
            Target::Token => &self.token,
        }
    }
}

/// Extracts and parses the `abi` section of a compiled contract artifact.
pub fn parse_artifact(json: &str) -> Result<Abi, ClientError> {
    let artifact: Value =
        serde_json::from_str(json).map_err(|e| ClientError::Serialization(e.to_string()))?;
    let abi_json = artifact
        .get("abi")
        .ok_or_else(|| ClientError::Serialization("Missing ABI section".into()))?
        .to_string();
    serde_json::from_str::<Abi>(&abi_json).map_err(|e| ClientError::Serialization(e.to_string()))
}
