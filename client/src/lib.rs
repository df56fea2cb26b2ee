use std::str::FromStr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use abi::{
    Action, Schemas, Target, ALLOWANCE, APPROVE, COMPLETE_ESCROW, CREATE_ESCROW, ESCROW_CREATED,
    ESCROW_ID, GET_ESCROW, GET_REPUTATION, RAISE_DISPUTE,
};
use error::{ClientError, RawFailure, Result};
use ethers::abi::Token;
use ethers::types::{Address, I256, U256};
pub use interface::EscrowConfig;
pub use ledger::ethereum::EthersLedger;
pub use ledger::Ledger;
use orchestrator::Orchestrator;
use paylock_core::{Amount, ErrorKind, EscrowError};
pub use receipt::{Confirmation, CreatedEscrow, EscrowDetails, TxResult};
use tracing::{info, instrument};

pub mod abi;
pub mod classify;
pub mod error;
pub mod events;
pub mod interface;
pub mod ledger;
pub mod orchestrator;
pub mod receipt;

/// Typed client for the escrow contract lifecycle.
///
/// Every write goes through the [`Orchestrator`]; reads go straight to the
/// ledger. All operations fail with a classified [`EscrowError`].
///
/// The client holds no mutable state, so concurrent calls are independent.
/// Ordering between them (e.g. approval before creation) is up to the caller.
pub struct EscrowClient<L: Ledger = EthersLedger> {
    ledger: Arc<L>,
    orchestrator: Orchestrator<L>,
}

impl EscrowClient<EthersLedger> {
    /// Validates `private_key` and connects to the node described by `config`.
    pub async fn connect(
        config: &EscrowConfig,
        private_key: &str,
    ) -> std::result::Result<Self, ClientError> {
        let ledger = EthersLedger::connect(config, private_key).await?;
        Self::new(ledger)
    }
}

impl<L: Ledger> EscrowClient<L> {
    pub fn new(ledger: L) -> std::result::Result<Self, ClientError> {
        let schemas = Schemas::load()?;
        let ledger = Arc::new(ledger);
        let orchestrator = Orchestrator::new(Arc::clone(&ledger), &schemas);
        Ok(Self {
            ledger,
            orchestrator,
        })
    }

    /// Address derived from the signing key.
    pub fn address(&self) -> Address {
        self.ledger.signer()
    }

    /// Converts a decimal amount such as `"12.5"` into token base units
    /// (six decimals).
    pub fn parse_amount(amount: &str) -> Result<U256> {
        Amount::parse(amount).map(|a| U256::from(a.base_units()))
    }

    /// Allows the escrow contract to pull `amount` tokens from the signer.
    #[instrument(skip(self))]
    pub async fn approve_spend(&self, amount: &str) -> Result<TxResult> {
        let amount = Self::parse_amount(amount)?;
        let spender = self.ledger.contract_address(Target::Escrow);
        let action = Action::token(
            APPROVE,
            vec![Token::Address(spender), Token::Uint(amount)],
        );
        self.orchestrator.execute(action).await
    }

    /// Locks `amount` for `provider` until `duration_secs` from now and
    /// returns the id the contract assigned.
    ///
    /// The deadline is taken from the local clock, not from block time.
    #[instrument(skip(self))]
    pub async fn create_escrow(
        &self,
        provider: &str,
        amount: &str,
        duration_secs: u64,
    ) -> Result<CreatedEscrow> {
        let provider = parse_address(provider)?;
        let amount = Self::parse_amount(amount)?;
        let deadline = deadline_after(duration_secs)?;
        info!(?provider, %amount, %deadline, "Creating escrow");

        let action = Action::escrow(
            CREATE_ESCROW,
            vec![
                Token::Address(provider),
                Token::Uint(amount),
                Token::Uint(deadline),
            ],
        );
        let (tx, escrow_id) = self
            .orchestrator
            .execute_and_extract(action, ESCROW_CREATED, ESCROW_ID)
            .await?;
        info!(%escrow_id, "Escrow created");
        Ok(CreatedEscrow { escrow_id, tx })
    }

    /// Releases the escrowed funds to the provider.
    #[instrument(skip(self))]
    pub async fn complete_escrow(&self, escrow_id: U256) -> Result<TxResult> {
        let action = Action::escrow(COMPLETE_ESCROW, vec![Token::Uint(escrow_id)]);
        self.orchestrator.execute(action).await
    }

    #[instrument(skip(self))]
    pub async fn raise_dispute(&self, escrow_id: U256) -> Result<TxResult> {
        let action = Action::escrow(RAISE_DISPUTE, vec![Token::Uint(escrow_id)]);
        self.orchestrator.execute(action).await
    }

    pub async fn get_escrow(&self, escrow_id: U256) -> Result<EscrowDetails> {
        let action = Action::escrow(GET_ESCROW, vec![Token::Uint(escrow_id)]);
        let tokens = self.read(&action).await?;
        let details = decode_escrow(tokens).ok_or_else(|| {
            self.orchestrator
                .classify(RawFailure::node("unexpected getEscrow output"))
        })?;
        // Unknown ids read back as an empty struct.
        if details.client.is_zero() {
            return Err(EscrowError::new(ErrorKind::EscrowNotFound));
        }
        Ok(details)
    }

    /// Signed reputation score the contract keeps for `address`.
    pub async fn get_reputation(&self, address: &str) -> Result<I256> {
        let account = parse_address(address)?;
        let action = Action::escrow(GET_REPUTATION, vec![Token::Address(account)]);
        match self.read(&action).await?.as_slice() {
            [Token::Int(raw)] => Ok(I256::from_raw(*raw)),
            _ => Err(self
                .orchestrator
                .classify(RawFailure::node("unexpected getReputation output"))),
        }
    }

    /// Tokens the escrow contract may currently pull from the signer.
    pub async fn allowance(&self) -> Result<U256> {
        let action = Action::token(
            ALLOWANCE,
            vec![
                Token::Address(self.address()),
                Token::Address(self.ledger.contract_address(Target::Escrow)),
            ],
        );
        match self.read(&action).await?.as_slice() {
            [Token::Uint(value)] => Ok(*value),
            _ => Err(self
                .orchestrator
                .classify(RawFailure::node("unexpected allowance output"))),
        }
    }

    async fn read(&self, action: &Action) -> Result<Vec<Token>> {
        self.ledger
            .read_state(action)
            .await
            .map_err(|e| self.orchestrator.classify(e))
    }
}

fn parse_address(s: &str) -> Result<Address> {
    Address::from_str(s.trim()).map_err(|e| {
        EscrowError::new(ErrorKind::InvalidAddress)
            .with_message(format!("Invalid address: {s:?} is not a 20-byte hex address"))
            .with_cause(e)
    })
}

/// Current UNIX time plus `duration_secs`.
fn deadline_after(duration_secs: u64) -> Result<U256> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).map_err(|e| {
        EscrowError::new(ErrorKind::InvalidDeadline)
            .with_message("Invalid deadline: system clock is before the UNIX epoch")
            .with_cause(e)
    })?;
    Ok(U256::from(now.as_secs()) + U256::from(duration_secs))
}

/// Accepts both a single tuple output and its flattened fields.
fn decode_escrow(mut tokens: Vec<Token>) -> Option<EscrowDetails> {
    if let [Token::Tuple(_)] = tokens.as_slice() {
        if let Some(Token::Tuple(inner)) = tokens.pop() {
            tokens = inner;
        }
    }
    match tokens.as_slice() {
        [Token::Address(client), Token::Address(provider), Token::Uint(amount), Token::Uint(deadline), Token::Bool(completed), Token::Bool(disputed)] => {
            Some(EscrowDetails {
                client: *client,
                provider: *provider,
                amount: *amount,
                deadline: *deadline,
                completed: *completed,
                disputed: *disputed,
            })
        }
        _ => None,
    }
}
