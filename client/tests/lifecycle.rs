use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use ethers::abi::{encode, Token};
use ethers::types::{Address, Bytes, H256, I256, U256};
use ethers::utils::{id, keccak256};
use paylock_client::abi::{Action, Target};
use paylock_client::error::{ClientError, RawFailure};
use paylock_client::interface::EscrowConfig;
use paylock_client::ledger::Ledger;
use paylock_client::receipt::{Confirmation, LogEntry, PendingTx};
use paylock_client::EscrowClient;
use paylock_core::{CredentialError, ErrorKind};

const ESCROW: Address = Address::repeat_byte(0xee);
const TOKEN: Address = Address::repeat_byte(0xcc);
const SIGNER: Address = Address::repeat_byte(0x01);
const TX_HASH: H256 = H256::repeat_byte(0x7a);
const GAS_USED: u64 = 143_211;

/// In-memory ledger that records what it is asked to do.
#[derive(Default)]
struct MockLedger {
    submitted: Arc<Mutex<Vec<Action>>>,
    submit_failure: Mutex<Option<RawFailure>>,
    confirm_failure: Mutex<Option<RawFailure>>,
    reverted: bool,
    logs: Vec<LogEntry>,
    read_result: Mutex<Option<Result<Vec<Token>, RawFailure>>>,
}

impl MockLedger {
    fn with_logs(logs: Vec<LogEntry>) -> Self {
        Self {
            logs,
            ..Default::default()
        }
    }

    fn failing_submit(failure: RawFailure) -> Self {
        Self {
            submit_failure: Mutex::new(Some(failure)),
            ..Default::default()
        }
    }

    fn reading(result: Result<Vec<Token>, RawFailure>) -> Self {
        Self {
            read_result: Mutex::new(Some(result)),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl Ledger for MockLedger {
    fn signer(&self) -> Address {
        SIGNER
    }

    fn contract_address(&self, target: Target) -> Address {
        match target {
            Target::Escrow => ESCROW,
            Target::Token => TOKEN,
        }
    }

    async fn submit(&self, action: &Action) -> Result<PendingTx, RawFailure> {
        self.submitted.lock().unwrap().push(action.clone());
        match self.submit_failure.lock().unwrap().take() {
            Some(failure) => Err(failure),
            None => Ok(PendingTx { tx_hash: TX_HASH }),
        }
    }

    async fn await_confirmation(&self, pending: PendingTx) -> Result<Confirmation, RawFailure> {
        if let Some(failure) = self.confirm_failure.lock().unwrap().take() {
            return Err(failure);
        }
        Ok(Confirmation {
            tx_hash: pending.tx_hash,
            block_number: Some(8_000_000),
            gas_used: U256::from(GAS_USED),
            success: !self.reverted,
            logs: self.logs.clone(),
        })
    }

    async fn read_state(&self, _action: &Action) -> Result<Vec<Token>, RawFailure> {
        self.read_result
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(RawFailure::node("no read scripted")))
    }
}

fn escrow_created(escrow_id: u64, provider: Address) -> LogEntry {
    LogEntry {
        address: ESCROW,
        topics: vec![
            H256::from(keccak256(
                "EscrowCreated(uint256,address,address,uint256,uint256)",
            )),
            H256::from_low_u64_be(escrow_id),
            H256::from(SIGNER),
            H256::from(provider),
        ],
        data: Bytes::from(encode(&[
            Token::Uint(U256::from(1_000)),
            Token::Uint(U256::from(1_700_000_600u64)),
        ])),
    }
}

fn token_transfer() -> LogEntry {
    LogEntry {
        address: TOKEN,
        topics: vec![
            H256::from(keccak256("Transfer(address,address,uint256)")),
            H256::from(SIGNER),
            H256::from(ESCROW),
        ],
        data: Bytes::from(encode(&[Token::Uint(U256::from(1_000))])),
    }
}

fn revert_data(signature: &str) -> RawFailure {
    RawFailure::EncodedRevert {
        data: Bytes::from(id(signature).to_vec()),
        message: "execution reverted".into(),
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[tokio::test]
async fn create_escrow_returns_generated_id() {
    let provider = Address::repeat_byte(0xaa);
    let ledger = MockLedger::with_logs(vec![token_transfer(), escrow_created(7, provider)]);
    let submitted = Arc::clone(&ledger.submitted);
    let client = EscrowClient::new(ledger).unwrap();

    let before = now();
    let created = client
        .create_escrow("0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", "0.001", 600)
        .await
        .unwrap();

    assert_eq!(created.escrow_id, U256::from(7));
    assert_eq!(created.tx.transaction_id, TX_HASH);
    assert_eq!(created.tx.cost, U256::from(GAS_USED));

    let submitted = submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    let action = &submitted[0];
    assert_eq!(action.target, Target::Escrow);
    assert_eq!(action.method, "createEscrow");
    assert_eq!(action.args[0], Token::Address(provider));
    assert_eq!(action.args[1], Token::Uint(U256::from(1_000)));
    let Token::Uint(deadline) = action.args[2] else {
        panic!("deadline must be a uint");
    };
    let deadline = deadline.as_u64();
    assert!(deadline >= before + 600 && deadline <= now() + 600);
}

#[tokio::test]
async fn create_escrow_without_event_is_event_not_found() {
    let client = EscrowClient::new(MockLedger::with_logs(vec![token_transfer()])).unwrap();
    let err = client
        .create_escrow("0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", "5", 60)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EventNotFound);
    assert!(!err.kind().is_retriable());
}

#[tokio::test]
async fn completing_a_completed_escrow_is_rejected() {
    let ledger = MockLedger::failing_submit(revert_data("EscrowAlreadyCompleted()"));
    let client = EscrowClient::new(ledger).unwrap();

    let err = client.complete_escrow(U256::from(3)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EscrowAlreadyCompleted);
    assert_eq!(
        err.to_string(),
        "Escrow already completed: cannot modify a completed escrow"
    );
    assert!(err.cause().is_some());
}

#[tokio::test]
async fn revert_shapes_classify_the_same() {
    let shapes = [
        revert_data("EscrowAlreadyDisputed()"),
        RawFailure::DecodedRevert {
            name: "EscrowAlreadyDisputed".into(),
            message: "reverted with custom error 'EscrowAlreadyDisputed()'".into(),
        },
    ];
    for failure in shapes {
        let client = EscrowClient::new(MockLedger::failing_submit(failure)).unwrap();
        let err = client.raise_dispute(U256::from(9)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EscrowAlreadyDisputed);
    }
}

#[tokio::test]
async fn confirmation_failures_are_classified() {
    let ledger = MockLedger {
        confirm_failure: Mutex::new(Some(revert_data("UnauthorizedCaller()"))),
        ..Default::default()
    };
    let client = EscrowClient::new(ledger).unwrap();
    let err = client.complete_escrow(U256::one()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnauthorizedCaller);
}

#[tokio::test]
async fn reverted_receipt_is_unknown_with_hash() {
    let ledger = MockLedger {
        reverted: true,
        ..Default::default()
    };
    let client = EscrowClient::new(ledger).unwrap();
    let err = client.raise_dispute(U256::one()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert!(err.message().contains(&format!("{TX_HASH:#x}")));
}

#[tokio::test]
async fn infra_failures_are_classified() {
    let ledger = MockLedger::failing_submit(RawFailure::node(
        "nonce too low: next nonce 12, tx nonce 11",
    ));
    let submitted = Arc::clone(&ledger.submitted);
    let client = EscrowClient::new(ledger).unwrap();
    let err = client.approve_spend("1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NonceConflict);
    assert!(err.kind().is_retriable());
    // One attempt, no retry.
    assert_eq!(submitted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn approve_targets_token_with_base_units() {
    let ledger = MockLedger::default();
    let submitted = Arc::clone(&ledger.submitted);
    let client = EscrowClient::new(ledger).unwrap();

    let result = client.approve_spend("1.5").await.unwrap();
    assert_eq!(result.transaction_id, TX_HASH);

    let submitted = submitted.lock().unwrap();
    assert_eq!(
        *submitted,
        vec![Action::token(
            "approve",
            vec![Token::Address(ESCROW), Token::Uint(U256::from(1_500_000))],
        )]
    );
}

#[tokio::test]
async fn invalid_input_fails_before_submission() {
    let ledger = MockLedger::default();
    let submitted = Arc::clone(&ledger.submitted);
    let client = EscrowClient::new(ledger).unwrap();

    for amount in ["-1", "abc", ""] {
        let err = client.approve_spend(amount).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAmount);
    }
    let err = client.create_escrow("0x1234", "1", 60).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAddress);

    assert!(submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn reads_escrow_details() {
    let fields = vec![
        Token::Address(SIGNER),
        Token::Address(Address::repeat_byte(0xaa)),
        Token::Uint(U256::from(1_000)),
        Token::Uint(U256::from(1_700_000_600u64)),
        Token::Bool(true),
        Token::Bool(false),
    ];
    let client = EscrowClient::new(MockLedger::reading(Ok(vec![Token::Tuple(fields)]))).unwrap();

    let escrow = client.get_escrow(U256::from(7)).await.unwrap();
    assert_eq!(escrow.client, SIGNER);
    assert_eq!(escrow.amount, U256::from(1_000));
    assert!(escrow.completed);
    assert!(!escrow.disputed);
}

#[tokio::test]
async fn empty_escrow_is_not_found() {
    let fields = vec![
        Token::Address(Address::zero()),
        Token::Address(Address::zero()),
        Token::Uint(U256::zero()),
        Token::Uint(U256::zero()),
        Token::Bool(false),
        Token::Bool(false),
    ];
    let client = EscrowClient::new(MockLedger::reading(Ok(fields))).unwrap();
    let err = client.get_escrow(U256::from(99)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EscrowNotFound);
}

#[tokio::test]
async fn read_failures_are_classified() {
    let client =
        EscrowClient::new(MockLedger::reading(Err(revert_data("EscrowNotFound()")))).unwrap();
    let err = client.get_escrow(U256::from(99)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EscrowNotFound);
}

#[tokio::test]
async fn reads_negative_reputation() {
    let score = I256::from(-3i64);
    let client =
        EscrowClient::new(MockLedger::reading(Ok(vec![Token::Int(score.into_raw())]))).unwrap();
    let got = client
        .get_reputation("0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA")
        .await
        .unwrap();
    assert_eq!(got, score);
}

#[tokio::test]
async fn malformed_read_output_is_unknown() {
    let client = EscrowClient::new(MockLedger::reading(Ok(vec![Token::Bool(true)]))).unwrap();
    let err = client.allowance().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
}

#[tokio::test]
async fn short_private_key_fails_before_network() {
    let config = EscrowConfig {
        rpc_url: "http://127.0.0.1:1".into(),
        ..Default::default()
    };
    let key = format!("0x{}", "1".repeat(63));
    let err = EscrowClient::connect(&config, &key).await.err().unwrap();
    assert!(matches!(
        err,
        ClientError::Credential(CredentialError::InvalidLength(63))
    ));
    assert!(!err.to_string().contains(&"1".repeat(10)));
}
