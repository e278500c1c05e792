//! Error types for the swap workspace

use thiserror::Error;

use crate::Blockchain;

/// Core errors that can occur while orchestrating transfers and stakes
#[derive(Debug, Error)]
pub enum Error {
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Chain adapter faults: node access, reverted calls, rejected signatures
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Node unreachable at {url}")]
    Unreachable { url: String },

    #[error("Node returned error: {message}")]
    Rpc { message: String },

    #[error("Call to {method} reverted: {reason}")]
    Reverted { method: String, reason: String },

    #[error("User rejected the signature request")]
    UserRejected,

    #[error("Transaction {tx_hash} failed on-chain")]
    TransactionFailed { tx_hash: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("No adapter configured for {chain}")]
    UnsupportedChain { chain: Blockchain },

    #[error("No wallet connected for {chain}")]
    WalletNotConnected { chain: Blockchain },
}

/// Ledger backend faults
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Failed to decode {endpoint} response: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },
}

/// Orchestration-level errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Amount {amount} is below the minimum of {min}")]
    BelowMinimum { amount: String, min: String },

    #[error("Amount {amount} exceeds the maximum of {max}")]
    AboveMaximum { amount: String, max: String },

    #[error("Route {from} -> {to} is not served by this bridge")]
    UnsupportedRoute { from: Blockchain, to: Blockchain },

    #[error("Invalid destination address: {reason}")]
    InvalidAddress { reason: String },

    #[error("Action not allowed: {reason}")]
    ActionNotAllowed { reason: String },

    #[error("No route found for {from} -> {to}")]
    NoRoute { from: String, to: String },

    #[error("Protocol state unavailable: {reason}")]
    StateUnavailable { reason: String },
}

/// Result type alias for workspace operations
pub type Result<T> = std::result::Result<T, Error>;

impl ProtocolError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::BelowMinimum { .. } => "below_minimum",
            Self::AboveMaximum { .. } => "above_maximum",
            Self::UnsupportedRoute { .. } => "unsupported_route",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::ActionNotAllowed { .. } => "action_not_allowed",
            Self::NoRoute { .. } => "no_route",
            Self::StateUnavailable { .. } => "state_unavailable",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount { .. } | Self::InvalidAddress { .. } => 400,
            Self::BelowMinimum { .. } | Self::AboveMaximum { .. } => 422,
            Self::UnsupportedRoute { .. } | Self::ActionNotAllowed { .. } => 422,
            Self::NoRoute { .. } => 404,
            Self::StateUnavailable { .. } => 503,
        }
    }
}

impl Error {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Protocol(e) => e.error_code(),
            Self::Chain(ChainError::UserRejected) => "user_rejected",
            Self::Chain(ChainError::UnsupportedChain { .. }) => "unsupported_chain",
            Self::Chain(ChainError::WalletNotConnected { .. }) => "wallet_not_connected",
            Self::Chain(_) => "chain_error",
            Self::Ledger(_) => "ledger_error",
            Self::Config(_) => "config_error",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Protocol(e) => e.status_code(),
            Self::Chain(ChainError::UnsupportedChain { .. }) => 422,
            Self::Chain(ChainError::WalletNotConnected { .. }) => 409,
            Self::Chain(_) | Self::Ledger(_) => 502,
            Self::Config(_) => 500,
        }
    }
}
