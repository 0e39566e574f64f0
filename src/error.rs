//! Error types for the launch pipeline

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the launch pipeline
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    #[error("Insecure keypair permissions: {0}")]
    InsecureKeypair(String),

    // RPC errors
    #[error("RPC error: {0}")]
    Rpc(String),

    // Pump.fun protocol errors
    #[error("Pump.fun account decode failed: {0}")]
    PumpDecode(String),

    #[error("Metadata upload failed: {0}")]
    MetadataUpload(String),

    #[error("Price calculation overflow")]
    PriceOverflow,

    // Solana transaction errors
    #[error("Transaction build failed: {0}")]
    TransactionBuild(String),

    #[error("Transaction simulation failed: {0}")]
    TransactionSimulation(String),

    #[error("Transaction send failed: {0}")]
    TransactionSend(String),

    // Wormhole errors
    #[error("VAA decode failed: {0}")]
    VaaDecode(String),

    #[error("VAA not found for {0} after {1}s")]
    VaaTimeout(String, u64),

    #[error("VAA not yet available: {0}")]
    VaaPending(String),

    #[error("Wormholescan request failed: {0}")]
    Wormholescan(String),

    #[error("Wormhole message not found in transaction {0}")]
    MessageNotFound(String),

    // Base / EVM errors
    #[error("EVM error: {0}")]
    Evm(String),

    #[error("Insufficient balance: {available} available, {required} required")]
    InsufficientBalance { available: String, required: String },

    // Liquidity planning errors
    #[error("CLMM planning error: {0}")]
    Clmm(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Rpc(_)
                | Error::VaaPending(_)
                | Error::Wormholescan(_)
        )
    }
}

// Conversion from solana_client errors
impl From<solana_client::client_error::ClientError> for Error {
    fn from(e: solana_client::client_error::ClientError) -> Self {
        Error::Rpc(e.to_string())
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
