use std::str::FromStr;
use std::sync::Arc;

use ethers::abi::{Function, Token};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, MiddlewareError, PendingTransaction, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, BlockId, BlockNumber, Bytes, Eip1559TransactionRequest, TransactionReceipt,
    TransactionRequest, U64,
};
use paylock_core::PrivateKey;
use tracing::{debug, info, trace};

use super::Ledger;
use crate::abi::{Action, Schemas, Target};
use crate::error::{ClientError, RawFailure};
use crate::interface::EscrowConfig;
use crate::receipt::{Confirmation, PendingTx};

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// [`Ledger`] backed by an Ethereum JSON-RPC node.
pub struct EthersLedger {
    // Ethereum JSON-RPC provider
    provider: Provider<Http>,
    // Provider with the signing wallet attached
    client: Arc<SignerClient>,
    schemas: Schemas,
    escrow_contract: Address,
    token_contract: Address,
}

impl EthersLedger {
    /// Validates the credential and contract addresses, then connects to the
    /// node to learn its chain id.
    ///
    /// The private key is checked before any network activity.
    pub async fn connect(config: &EscrowConfig, private_key: &str) -> Result<Self, ClientError> {
        let key = PrivateKey::from_str(private_key)?;
        let escrow_contract = config
            .escrow_contract
            .as_deref()
            .ok_or(ClientError::MissingEscrowContract)?;
        let escrow_contract = Address::from_str(escrow_contract)?;
        let token_contract = Address::from_str(&config.token_contract)?;
        let schemas = Schemas::load()?;

        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())?;
        let chain_id = provider.get_chainid().await?.as_u64();
        debug!(%chain_id, rpc_url = %config.rpc_url, "Connected to Ethereum");

        let wallet = LocalWallet::from_bytes(key.as_bytes())?.with_chain_id(chain_id);
        debug!(signer = ?wallet.address(), "Wallet configured");
        let client = Arc::new(SignerMiddleware::new(provider.clone(), wallet));

        Ok(Self {
            provider,
            client,
            schemas,
            escrow_contract,
            token_contract,
        })
    }

    fn function(&self, action: &Action) -> Result<&Function, RawFailure> {
        self.schemas
            .for_target(action.target)
            .function(action.method)
            .map_err(RawFailure::from_error)
    }

    fn request(&self, action: &Action) -> Result<TypedTransaction, RawFailure> {
        let data = self
            .function(action)?
            .encode_input(&action.args)
            .map_err(RawFailure::from_error)?;
        Ok(Eip1559TransactionRequest::new()
            .from(self.signer())
            .to(self.contract_address(action.target))
            .data(data)
            .into())
    }

    /// Re-executes a reverted transaction at its block to recover the revert
    /// payload the receipt does not carry.
    async fn replay_revert(&self, receipt: &TransactionReceipt) -> RawFailure {
        let reverted = format!("transaction {:#x} reverted", receipt.transaction_hash);
        let tx = match self.provider.get_transaction(receipt.transaction_hash).await {
            Ok(Some(tx)) => tx,
            _ => return RawFailure::node(reverted),
        };
        let mut call = TransactionRequest::new()
            .from(tx.from)
            .data(tx.input)
            .value(tx.value);
        if let Some(to) = tx.to {
            call = call.to(to);
        }
        let block = receipt
            .block_number
            .map(|n| BlockId::Number(BlockNumber::Number(n)));

        match self.provider.call(&call.into(), block).await {
            Err(err) => to_failure(err),
            Ok(_) => RawFailure::node(reverted),
        }
    }
}

#[async_trait::async_trait]
impl Ledger for EthersLedger {
    fn signer(&self) -> Address {
        self.client.address()
    }

    fn contract_address(&self, target: Target) -> Address {
        match target {
            Target::Escrow => self.escrow_contract,
            Target::Token => self.token_contract,
        }
    }

    async fn submit(&self, action: &Action) -> Result<PendingTx, RawFailure> {
        let tx = self.request(action)?;
        info!("Sending {} transaction", action.method);
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(to_failure)?;
        let tx_hash = pending.tx_hash();
        debug!(?tx_hash, "Transaction broadcast");
        Ok(PendingTx { tx_hash })
    }

    async fn await_confirmation(&self, pending: PendingTx) -> Result<Confirmation, RawFailure> {
        let receipt = PendingTransaction::new(pending.tx_hash, &self.provider)
            .await
            .map_err(to_failure)?
            .ok_or_else(|| {
                RawFailure::node(format!(
                    "transaction {:#x} was dropped from the mempool",
                    pending.tx_hash
                ))
            })?;
        info!(tx_hash = ?receipt.transaction_hash, "Transaction mined");

        if receipt.status == Some(U64::zero()) {
            return Err(self.replay_revert(&receipt).await);
        }
        Ok(receipt.into())
    }

    async fn read_state(&self, action: &Action) -> Result<Vec<Token>, RawFailure> {
        let tx = self.request(action)?;
        trace!(method = action.method, "Reading contract state");
        let output: Bytes = self.client.call(&tx, None).await.map_err(to_failure)?;
        self.function(action)?
            .decode_output(&output)
            .map_err(RawFailure::from_error)
    }
}

/// Sorts a node error into the revert shape it carries, if any.
fn to_failure<E: MiddlewareError + 'static>(err: E) -> RawFailure {
    if let Some(resp) = err.as_error_response() {
        if let Some(data) = resp.as_revert_data() {
            return RawFailure::EncodedRevert {
                data,
                message: resp.message.clone(),
            };
        }
        if let Some(name) = custom_error_name(&resp.message) {
            return RawFailure::DecodedRevert {
                name,
                message: resp.message.clone(),
            };
        }
    }
    RawFailure::from_error(err)
}

/// Extracts `Name` from node messages such as
/// `reverted with custom error 'Name()'`.
fn custom_error_name(message: &str) -> Option<String> {
    const MARKER: &str = "custom error '";
    let start = message.find(MARKER)? + MARKER.len();
    let name: String = message[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    (!name.is_empty()).then_some(name)
}
