use ethers::abi::Token;
use ethers::types::Address;

use crate::abi::{Action, Target};
use crate::error::RawFailure;
use crate::receipt::{Confirmation, PendingTx};

pub mod ethereum;

/// Network connection the escrow client drives.
///
/// Implementors own signing, broadcasting and contract reads. They report
/// failures in whatever shape they surfaced; classification happens above
/// this layer.
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Address of the account that signs submitted actions.
    fn signer(&self) -> Address;

    /// Deployed address of the `target` contract.
    fn contract_address(&self, target: Target) -> Address;

    /// Signs and broadcasts `action` once.
    async fn submit(&self, action: &Action) -> Result<PendingTx, RawFailure>;

    /// Waits until `pending` is included in a block.
    ///
    /// No timeout is applied; wrap the call if one is needed.
    async fn await_confirmation(&self, pending: PendingTx) -> Result<Confirmation, RawFailure>;

    /// Executes a read-only call and returns its decoded outputs.
    async fn read_state(&self, action: &Action) -> Result<Vec<Token>, RawFailure>;
}
