//! Normalized transaction confirmations and the results built from them.

use ethers::abi::RawLog;
use ethers::types::{Address, Bytes, TransactionReceipt, H256, U256, U64};
use serde::{Deserialize, Serialize};

/// Handle for a submitted, not yet confirmed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTx {
    pub tx_hash: H256,
}

/// A log entry as emitted by the transaction, not yet matched to any schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Contract that emitted the log
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
}

impl From<&LogEntry> for RawLog {
    fn from(entry: &LogEntry) -> Self {
        RawLog {
            topics: entry.topics.clone(),
            data: entry.data.to_vec(),
        }
    }
}

/// Record of a transaction acknowledged by the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
    pub gas_used: U256,
    /// Whether execution succeeded (receipt status 1)
    pub success: bool,
    /// Logs in the order the node returned them
    pub logs: Vec<LogEntry>,
}

impl From<TransactionReceipt> for Confirmation {
    fn from(receipt: TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
            gas_used: receipt.gas_used.unwrap_or_default(),
            success: receipt.status == Some(U64::one()),
            logs: receipt
                .logs
                .into_iter()
                .map(|log| LogEntry {
                    address: log.address,
                    topics: log.topics,
                    data: log.data,
                })
                .collect(),
        }
    }
}

/// Result of every state-changing escrow operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxResult {
    pub transaction_id: H256,
    /// Gas consumed by the transaction
    pub cost: U256,
    #[serde(skip)]
    pub confirmation: Confirmation,
}

impl TxResult {
    pub fn from_confirmation(confirmation: Confirmation) -> Self {
        Self {
            transaction_id: confirmation.tx_hash,
            cost: confirmation.gas_used,
            confirmation,
        }
    }
}

/// Result of `createEscrow`: the transaction plus the generated escrow id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEscrow {
    pub escrow_id: U256,
    #[serde(flatten)]
    pub tx: TxResult,
}

/// On-chain state of a single escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowDetails {
    pub client: Address,
    pub provider: Address,
    /// Locked amount in base units
    pub amount: U256,
    /// UNIX timestamp, seconds
    pub deadline: U256,
    pub completed: bool,
    pub disputed: bool,
}
