// Raffle client - Errors
use thiserror::Error;

/// Errors that may be returned by the raffle client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Account data shorter than the 8-byte discriminator
    #[error("Account data too short")]
    AccountTooShort,

    /// Account discriminator does not match the expected account kind
    #[error("Unexpected account discriminator")]
    UnexpectedDiscriminator,

    /// Account data did not deserialize cleanly
    #[error("Malformed account data: {0}")]
    MalformedAccount(#[from] std::io::Error),

    /// No raffler account carries the requested slug
    #[error("No raffler found for slug '{0}'")]
    UnknownRaffler(String),

    /// Raffle is not open for entries
    #[error("Raffle is not open for entries")]
    RaffleNotOpen,

    /// Ticket quantity must be at least one
    #[error("Ticket quantity must be at least one")]
    InvalidTicketCount,

    /// Not enough tickets available
    #[error("Not enough tickets left")]
    NotEnoughTicketsLeft,

    /// NFT-entry raffles take exactly one ticket per entry
    #[error("NFT raffles take a single ticket per entry")]
    SingleTicketOnly,

    /// An RPC-backed accessor failed
    #[error("RPC request failed: {0}")]
    Rpc(String),

    /// Transaction submission was rejected
    #[error("Transaction failed: {0}")]
    Transaction(String),
}
