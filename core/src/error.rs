use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Shared, type-erased cause attached to an [`EscrowError`].
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Closed set of failure kinds a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// Provider address is zero, equal to the client, or unparsable.
    InvalidAddress,
    /// Amount is zero, negative or malformed.
    InvalidAmount,
    /// Deadline is not in the future.
    InvalidDeadline,
    /// Token allowance granted to the escrow contract is too small.
    InsufficientAllowance,
    /// No escrow exists under the requested id.
    EscrowNotFound,
    /// Escrow was already completed.
    EscrowAlreadyCompleted,
    /// Escrow is under dispute.
    EscrowAlreadyDisputed,
    /// Caller is not allowed to act on the escrow.
    UnauthorizedCaller,
    /// The call succeeded but its confirmation carried no matching event.
    EventNotFound,
    /// Signer cannot pay for gas.
    InsufficientGasFunds,
    /// Nonce already consumed or a replacement is pending.
    NonceConflict,
    /// Anything that could not be classified.
    Unknown,
}

impl ErrorKind {
    /// Kinds reported by the escrow contract as custom errors.
    pub const CONTRACT_KINDS: [ErrorKind; 8] = [
        Self::InvalidAddress,
        Self::InvalidAmount,
        Self::InvalidDeadline,
        Self::InsufficientAllowance,
        Self::EscrowNotFound,
        Self::EscrowAlreadyCompleted,
        Self::EscrowAlreadyDisputed,
        Self::UnauthorizedCaller,
    ];

    /// Name of the contract custom error backing this kind, if any.
    pub fn revert_name(&self) -> Option<&'static str> {
        let name = match self {
            Self::InvalidAddress => "InvalidAddress",
            Self::InvalidAmount => "InvalidAmount",
            Self::InvalidDeadline => "InvalidDeadline",
            Self::InsufficientAllowance => "InsufficientAllowance",
            Self::EscrowNotFound => "EscrowNotFound",
            Self::EscrowAlreadyCompleted => "EscrowAlreadyCompleted",
            Self::EscrowAlreadyDisputed => "EscrowAlreadyDisputed",
            Self::UnauthorizedCaller => "UnauthorizedCaller",
            _ => return None,
        };
        Some(name)
    }

    /// Looks up a contract custom error by name. Accepts `Name` as well as
    /// the signature form `Name()`.
    pub fn from_revert_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let name = name.split_once('(').map_or(name, |(n, _)| n);
        Self::CONTRACT_KINDS
            .into_iter()
            .find(|kind| kind.revert_name() == Some(name))
    }

    /// Stable message for this kind. `Unknown` carries the original message
    /// instead, so it has none.
    pub fn message(&self) -> Option<&'static str> {
        let msg = match self {
            Self::InvalidAddress => {
                "Invalid address: provider must be a non-zero address different from the client"
            }
            Self::InvalidAmount => "Invalid amount: amount must be a positive decimal value",
            Self::InvalidDeadline => "Invalid deadline: deadline must be in the future",
            Self::InsufficientAllowance => {
                "Insufficient allowance: approve the escrow contract to spend at least the escrow amount"
            }
            Self::EscrowNotFound => "Escrow not found: no escrow exists with the given id",
            Self::EscrowAlreadyCompleted => {
                "Escrow already completed: cannot modify a completed escrow"
            }
            Self::EscrowAlreadyDisputed => {
                "Escrow already disputed: cannot modify a disputed escrow"
            }
            Self::UnauthorizedCaller => {
                "Unauthorized caller: only a party to the escrow can perform this action"
            }
            Self::EventNotFound => {
                "Event not found: transaction succeeded but emitted no matching event"
            }
            Self::InsufficientGasFunds => {
                "Insufficient funds for gas: the signer account cannot pay for this transaction"
            }
            Self::NonceConflict => {
                "Nonce conflict: a transaction with this nonce was already submitted"
            }
            Self::Unknown => return None,
        };
        Some(msg)
    }

    /// Whether repeating the same call may succeed without caller changes.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::InsufficientGasFunds | Self::NonceConflict)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The single error type crossing the public boundary of every escrow
/// operation.
///
/// The original failure, when there is one, is kept as [`source`] and is
/// never replaced by re-classification.
///
/// [`source`]: std::error::Error::source
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EscrowError {
    kind: ErrorKind,
    message: String,
    #[source]
    cause: Option<Cause>,
}

impl EscrowError {
    /// Builds an error of `kind` with its fixed message. For `Unknown` the
    /// message is empty; use [`EscrowError::unknown`] instead.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: kind.message().unwrap_or_default().to_string(),
            cause: None,
        }
    }

    /// Builds an `Unknown` error carrying `message` verbatim.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            message: message.into(),
            cause: None,
        }
    }

    /// Overrides the message while keeping the kind.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attaches the underlying failure.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The original failure this error was classified from.
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }
}

impl From<ErrorKind> for EscrowError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl PartialEq for EscrowError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

/// Errors raised while validating a signing credential.
///
/// Messages never echo the credential.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("private key must be 64 hex digits (got {0} digits)")]
    InvalidLength(usize),

    #[error("private key contains non-hex characters")]
    InvalidHex,
}
