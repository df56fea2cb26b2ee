use ethers::types::Bytes;
use paylock_core::{CredentialError, EscrowError};

pub type Result<T> = std::result::Result<T, EscrowError>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while constructing a client, before any transaction is sent.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("Invalid private key: {0}")]
    Credential(#[from] CredentialError),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("URL parse error")]
    UrlParse(#[from] url::ParseError),
    #[error("No escrow contract address configured")]
    MissingEscrowContract,
    #[error("Address parse error")]
    AddressParse(#[from] rustc_hex::FromHexError),
    #[error("Blockchain error: {0}")]
    BlockchainError(String),
}

impl From<ethers::providers::ProviderError> for ClientError {
    fn from(value: ethers::providers::ProviderError) -> Self {
        Self::BlockchainError(value.to_string())
    }
}

impl From<ethers::signers::WalletError> for ClientError {
    fn from(value: ethers::signers::WalletError) -> Self {
        Self::BlockchainError(value.to_string())
    }
}

/// An unclassified failure captured at any stage of a contract call.
///
/// Reverts reach the client in different shapes depending on where in the
/// call path they surfaced; each variant is one of those shapes.
#[derive(thiserror::Error, Debug)]
pub enum RawFailure {
    /// A revert already decoded to a custom error name.
    #[error("{message}")]
    DecodedRevert { name: String, message: String },

    /// A revert whose payload is still ABI-encoded.
    #[error("{message}")]
    EncodedRevert { data: Bytes, message: String },

    /// Node, signer or transport failure described only by a message.
    #[error("{message}")]
    Node {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A failure that has already been mapped to a domain error.
    #[error(transparent)]
    Classified(#[from] EscrowError),
}

impl RawFailure {
    pub fn node(message: impl Into<String>) -> Self {
        Self::Node {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an arbitrary error, keeping it as the source.
    pub fn from_error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Node {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Human-readable description of the failure as reported.
    pub fn message(&self) -> &str {
        match self {
            Self::DecodedRevert { message, .. }
            | Self::EncodedRevert { message, .. }
            | Self::Node { message, .. } => message,
            Self::Classified(err) => err.message(),
        }
    }
}
