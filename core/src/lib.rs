//! Chain-agnostic building blocks for driving the Paylock escrow contract.

/// Fixed-point amounts of the escrowed asset
pub mod amount;
/// Signing credential validation
pub mod credential;

pub mod error;

pub use amount::{Amount, DECIMALS};
pub use credential::PrivateKey;
pub use error::{CredentialError, ErrorKind, EscrowError};

pub type Result<T> = std::result::Result<T, EscrowError>;
