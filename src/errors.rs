use thiserror::Error;
use solana_client::client_error::ClientError;
use solana_sdk::pubkey::ParsePubkeyError;
use solana_sdk::program_error::ProgramError;

#[derive(Error, Debug)]
pub enum BundlerError {
    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Solana client error: {0}")]
    SolanaClient(#[from] ClientError),

    #[error("API error: {0}")]
    Api(String),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Pubkey parse error: {0}")]
    PubkeyParseError(#[from] ParsePubkeyError),

    #[error("BS58 decode error: {0}")]
    Bs58DecodeError(#[from] bs58::decode::Error),

    #[error("Hex decode error: {0}")]
    HexDecodeError(#[from] hex::FromHexError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Solana program error: {0}")]
    SolanaProgram(#[from] ProgramError),

    #[error("Pool not found: {0}")]
    PoolNotFound(String),

    #[error("Jito error: {0}")]
    Jito(String),

    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

pub type Result<T> = std::result::Result<T, BundlerError>;
