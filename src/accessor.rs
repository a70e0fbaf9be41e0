// Raffle client - External collaborator interfaces
//
// The frontend's RPC layer implements these; the core only consumes them.
// Passing them in explicitly (rather than reading ambient singletons) keeps
// every consumer testable against in-memory implementations.
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use tokio::sync::watch;

use crate::error::ClientError;
use crate::state::{Entrants, RaffleWithKey, RafflerWithKey};

/// Read access to raffler and raffle accounts
#[allow(async_fn_in_trait)]
pub trait RaffleSource {
    /// All raffler accounts owned by the program
    async fn rafflers(&self) -> Result<Vec<RafflerWithKey>, ClientError>;

    /// The raffler carrying the given vanity slug, if any
    async fn raffler_by_slug(&self, slug: &str) -> Result<Option<RafflerWithKey>, ClientError>;

    /// All raffles hosted by the given raffler
    async fn raffles_for(&self, raffler: &Pubkey) -> Result<Vec<RaffleWithKey>, ClientError>;
}

/// Batched read access to entrants counters
#[allow(async_fn_in_trait)]
pub trait EntrantsSource {
    /// Fetch the entrants accounts at `keys`. The result is index-aligned
    /// with the input; accounts that do not exist come back as None.
    async fn entrants(&self, keys: &[Pubkey]) -> Result<Vec<Option<Entrants>>, ClientError>;
}

/// Push subscription for entrants account changes
#[allow(async_fn_in_trait)]
pub trait EntrantsSubscription {
    /// Keeps the subscription registered; dropping it unsubscribes.
    type Guard: Send + 'static;

    /// Subscribe to one entrants account. The receiver always holds the
    /// latest decoded counters.
    async fn subscribe(
        &self,
        key: &Pubkey,
    ) -> Result<(watch::Receiver<Option<Entrants>>, Self::Guard), ClientError>;
}

/// Submits ticket-purchase transactions through the program client
#[allow(async_fn_in_trait)]
pub trait TicketPurchaser {
    /// Buy `count` tickets for `raffle`, returning the transaction signature
    async fn buy_tickets(&self, raffle: &Pubkey, count: u64) -> Result<Signature, ClientError>;
}
