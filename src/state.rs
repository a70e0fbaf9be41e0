// Raffle client - Account state
//
// Read-only snapshots of the program's accounts, decoded client-side.
// Layout is the Anchor convention: an 8-byte discriminator derived from the
// account name, followed by borsh-encoded fields.
use arrayref::array_ref;
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, hash::hash, pubkey::Pubkey};

use crate::error::ClientError;

/// Sentinel `max` value on an entrants account meaning the raffle has no
/// ticket cap.
pub const ENTRANTS_UNCAPPED: u32 = u32::MAX;

/// First 8 bytes of sha256("account:<name>"), as written by the program.
pub fn account_discriminator(name: &str) -> [u8; 8] {
    let digest = hash(format!("account:{}", name).as_bytes());
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&digest.to_bytes()[..8]);
    disc
}

/// Validate the discriminator for `name` and return the field bytes.
fn strip_discriminator<'a>(name: &str, data: &'a [u8]) -> Result<&'a [u8], ClientError> {
    if data.len() < 8 {
        return Err(ClientError::AccountTooShort);
    }
    let disc = array_ref![data, 0, 8];
    if *disc != account_discriminator(name) {
        return Err(ClientError::UnexpectedDiscriminator);
    }
    Ok(&data[8..])
}

/// How a raffle charges for entries
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum PaymentType {
    /// Each entry costs one NFT
    Nft,
    /// Each entry costs `ticket_price` of `token_mint`
    Token {
        token_mint: Pubkey,
        ticket_price: u64,
    },
}

impl PaymentType {
    /// Whether entries are paid in native SOL (the wrapped-SOL mint)
    pub fn is_sol(&self) -> bool {
        matches!(self, PaymentType::Token { token_mint, .. } if *token_mint == spl_token::native_mint::ID)
    }

    /// Price of one ticket in raw token units, None for NFT entries
    pub fn ticket_price(&self) -> Option<u64> {
        match self {
            PaymentType::Nft => None,
            PaymentType::Token { ticket_price, .. } => Some(*ticket_price),
        }
    }
}

/// A raffle host account
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug)]
pub struct Raffler {
    /// Wallet allowed to manage this raffler
    pub authority: Pubkey,
    /// URL path segment identifying the raffler
    pub slug: String,
    /// Display name
    pub name: String,
    /// Optional staker account carrying the raffler theme
    pub staker: Option<Pubkey>,
    pub bump: u8,
}

impl Raffler {
    pub fn try_deserialize(data: &[u8]) -> Result<Self, ClientError> {
        let mut rest = strip_discriminator("Raffler", data)?;
        Ok(Raffler::deserialize(&mut rest)?)
    }

    pub fn discriminator() -> [u8; 8] {
        account_discriminator("Raffler")
    }

    /// Whether `wallet` may manage this raffler
    pub fn is_authority(&self, wallet: &Pubkey) -> bool {
        self.authority == *wallet
    }
}

/// A single raffle account
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug)]
pub struct Raffle {
    /// Hosting raffler. First field, so program-account scans can match it
    /// with a memcmp at offset 8.
    pub raffler: Pubkey,
    /// Entrants account tracking ticket sales, None until created
    pub entrants: Option<Pubkey>,
    /// Asset being raffled
    pub prize: Option<Pubkey>,
    /// What an entry costs
    pub payment_type: PaymentType,
    /// Entry window opens (unix seconds)
    pub start_time: UnixTimestamp,
    /// Entry window closes (unix seconds)
    pub end_time: UnixTimestamp,
    /// Administratively cancelled
    pub cancelled: bool,
    /// Drawn winner, None until the draw
    pub winner: Option<Pubkey>,
    /// Prize and proceeds have been claimed
    pub claimed: bool,
    /// Off-chain copy of the entrants list, uploaded when the account closes
    pub uri: Option<String>,
    pub bump: u8,
}

impl Raffle {
    pub fn try_deserialize(data: &[u8]) -> Result<Self, ClientError> {
        let mut rest = strip_discriminator("Raffle", data)?;
        Ok(Raffle::deserialize(&mut rest)?)
    }

    pub fn discriminator() -> [u8; 8] {
        account_discriminator("Raffle")
    }
}

/// Ticket-sale counters for a raffle
///
/// The on-chain account stores the entrant pubkeys after the two counters;
/// the board never needs them, so only the header is decoded.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entrants {
    /// Tickets sold so far
    pub total: u32,
    /// Capacity, `ENTRANTS_UNCAPPED` when there is no limit
    pub max: u32,
}

impl Entrants {
    pub fn try_deserialize(data: &[u8]) -> Result<Self, ClientError> {
        let mut rest = strip_discriminator("Entrants", data)?;
        let total = u32::deserialize(&mut rest)?;
        let max = u32::deserialize(&mut rest)?;
        Ok(Entrants { total, max })
    }

    pub fn discriminator() -> [u8; 8] {
        account_discriminator("Entrants")
    }

    pub fn is_uncapped(&self) -> bool {
        self.max == ENTRANTS_UNCAPPED
    }

    /// Tickets still available, None when uncapped
    pub fn remaining(&self) -> Option<u64> {
        if self.is_uncapped() {
            None
        } else {
            // Widened to u64 so the sentinel never wraps into a comparison.
            Some((self.max as u64).saturating_sub(self.total as u64))
        }
    }

    /// Whether ticket sales have reached capacity
    pub fn is_sold_out(&self) -> bool {
        !self.is_uncapped() && self.total as u64 >= self.max as u64
    }
}

/// A decoded raffler together with its account address
#[derive(Clone, Debug)]
pub struct RafflerWithKey {
    pub pubkey: Pubkey,
    pub raffler: Raffler,
}

/// A decoded raffle together with its account address
#[derive(Clone, Debug)]
pub struct RaffleWithKey {
    pub pubkey: Pubkey,
    pub raffle: Raffle,
}

/// Latest known view of a raffle and its ticket counters
///
/// Subscription deliveries replace the whole snapshot; nothing is merged.
#[derive(Clone, Debug)]
pub struct RaffleSnapshot {
    pub raffle: Raffle,
    pub entrants: Option<Entrants>,
}
