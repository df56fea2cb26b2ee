//! Submission, confirmation and result decoding for a single contract call.

use std::sync::Arc;

use ethers::types::U256;
use paylock_core::EscrowError;
use tracing::{debug, info};

use crate::abi::{Action, Schemas};
use crate::classify::ErrorClassifier;
use crate::error::{RawFailure, Result};
use crate::events::EventDecoder;
use crate::ledger::Ledger;
use crate::receipt::TxResult;

/// Runs state-changing actions against a [`Ledger`].
///
/// Each call submits exactly once and never retries. Failures from any
/// stage are classified exactly once, on the way out.
pub struct Orchestrator<L> {
    ledger: Arc<L>,
    events: EventDecoder,
    classifier: ErrorClassifier,
}

impl<L: Ledger> Orchestrator<L> {
    pub fn new(ledger: Arc<L>, schemas: &Schemas) -> Self {
        Self {
            ledger,
            events: EventDecoder::new(&schemas.escrow),
            classifier: ErrorClassifier::new(&schemas.escrow),
        }
    }

    /// Submits `action` and waits for its confirmation.
    pub async fn execute(&self, action: Action) -> Result<TxResult> {
        self.run(&action).await.map_err(|e| self.classify(e))
    }

    /// Like [`execute`](Self::execute), then extracts the integer `field` of
    /// the first `event` found in the confirmation logs.
    pub async fn execute_and_extract(
        &self,
        action: Action,
        event: &str,
        field: &str,
    ) -> Result<(TxResult, U256)> {
        self.run_and_extract(&action, event, field)
            .await
            .map_err(|e| self.classify(e))
    }

    pub fn classify(&self, failure: RawFailure) -> EscrowError {
        self.classifier.classify(failure)
    }

    async fn run(&self, action: &Action) -> std::result::Result<TxResult, RawFailure> {
        let pending = self.ledger.submit(action).await?;
        debug!(tx_hash = ?pending.tx_hash, "Awaiting confirmation");

        let confirmation = self.ledger.await_confirmation(pending).await?;
        if !confirmation.success {
            return Err(RawFailure::node(format!(
                "transaction {:#x} reverted",
                confirmation.tx_hash
            )));
        }
        info!(
            tx_hash = ?confirmation.tx_hash,
            gas_used = %confirmation.gas_used,
            "{} transaction confirmed",
            action.method
        );
        Ok(TxResult::from_confirmation(confirmation))
    }

    async fn run_and_extract(
        &self,
        action: &Action,
        event: &str,
        field: &str,
    ) -> std::result::Result<(TxResult, U256), RawFailure> {
        let result = self.run(action).await?;
        let id = self
            .events
            .extract_identifier(&result.confirmation, event, field)?;
        debug!(%id, "Extracted {event}.{field}");
        Ok((result, id))
    }
}
