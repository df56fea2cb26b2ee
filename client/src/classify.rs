//! Mapping raw call failures onto the domain error taxonomy.
//!
//! Strategies run in order and the first one that recognizes the failure
//! decides its kind. Anything left over becomes [`ErrorKind::Unknown`].

use std::collections::HashMap;

use ethers::abi::ethabi::AbiError;
use ethers::abi::{self, Abi, ParamType, Token};
use paylock_core::{ErrorKind, EscrowError};
use tracing::warn;

use crate::error::RawFailure;

/// Selector of the Solidity `Error(string)` revert.
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// One way of recognizing a failure shape.
pub trait ClassifyStrategy: Send + Sync {
    /// Returns `None` when the failure is not of a shape this strategy handles
    /// or does not map to a known kind.
    fn classify(&self, failure: &RawFailure) -> Option<ErrorKind>;
}

/// Reverts already decoded to a custom error name.
#[derive(Debug, Default)]
pub struct DecodedRevertStrategy;

impl ClassifyStrategy for DecodedRevertStrategy {
    fn classify(&self, failure: &RawFailure) -> Option<ErrorKind> {
        match failure {
            RawFailure::DecodedRevert { name, .. } => ErrorKind::from_revert_name(name),
            _ => None,
        }
    }
}

/// ABI-encoded revert payloads, decoded against the contract's custom errors.
#[derive(Debug, Default)]
pub struct RevertDataStrategy {
    errors: HashMap<[u8; 4], AbiError>,
}

impl RevertDataStrategy {
    pub fn new(abi: &Abi) -> Self {
        let errors = abi
            .errors()
            .map(|err| (selector(err), err.clone()))
            .collect();
        Self { errors }
    }

    fn decode(&self, data: &[u8]) -> Option<String> {
        if data.len() < 4 {
            return None;
        }
        let (head, body) = data.split_at(4);
        let sel: [u8; 4] = head.try_into().ok()?;

        if sel == ERROR_STRING_SELECTOR {
            return match abi::decode(&[ParamType::String], body).ok()?.pop()? {
                Token::String(reason) => Some(reason),
                _ => None,
            };
        }
        let err = self.errors.get(&sel)?;
        err.decode(body).ok()?;
        Some(err.name.clone())
    }
}

impl ClassifyStrategy for RevertDataStrategy {
    fn classify(&self, failure: &RawFailure) -> Option<ErrorKind> {
        match failure {
            RawFailure::EncodedRevert { data, .. } => {
                ErrorKind::from_revert_name(&self.decode(data)?)
            }
            _ => None,
        }
    }
}

/// Known node and signer phrases, matched case-insensitively.
#[derive(Debug)]
pub struct MessagePatternStrategy {
    patterns: Vec<(&'static str, ErrorKind)>,
}

impl Default for MessagePatternStrategy {
    fn default() -> Self {
        Self {
            patterns: vec![
                ("insufficient funds for gas", ErrorKind::InsufficientGasFunds),
                ("insufficient funds for transfer", ErrorKind::InsufficientGasFunds),
                ("nonce too low", ErrorKind::NonceConflict),
                ("nonce already used", ErrorKind::NonceConflict),
                ("nonce has already been used", ErrorKind::NonceConflict),
                ("already known", ErrorKind::NonceConflict),
                ("replacement transaction underpriced", ErrorKind::NonceConflict),
            ],
        }
    }
}

impl ClassifyStrategy for MessagePatternStrategy {
    fn classify(&self, failure: &RawFailure) -> Option<ErrorKind> {
        let message = failure.message().to_lowercase();
        self.patterns
            .iter()
            .find(|(pattern, _)| message.contains(pattern))
            .map(|(_, kind)| *kind)
    }
}

/// Turns any [`RawFailure`] into exactly one [`EscrowError`].
pub struct ErrorClassifier {
    strategies: Vec<Box<dyn ClassifyStrategy>>,
}

impl ErrorClassifier {
    /// Standard chain for the escrow contract: decoded revert, revert data,
    /// then message patterns.
    pub fn new(abi: &Abi) -> Self {
        Self::with_strategies(vec![
            Box::new(DecodedRevertStrategy),
            Box::new(RevertDataStrategy::new(abi)),
            Box::new(MessagePatternStrategy::default()),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ClassifyStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn classify(&self, failure: RawFailure) -> EscrowError {
        let failure = match failure {
            RawFailure::Classified(err) => return err,
            other => other,
        };

        let err = match self.strategies.iter().find_map(|s| s.classify(&failure)) {
            Some(kind) => EscrowError::new(kind),
            None => EscrowError::unknown(failure.message()),
        };
        warn!(kind = %err.kind(), cause = %failure, "Contract call failed");
        err.with_cause(failure)
    }
}

impl std::fmt::Debug for ErrorClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorClassifier")
            .field("strategies", &self.strategies.len())
            .finish()
    }
}

fn selector(err: &AbiError) -> [u8; 4] {
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&err.signature().as_bytes()[..4]);
    sel
}
