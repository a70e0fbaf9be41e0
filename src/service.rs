// Raffle client - Raffler board and purchase flow
use solana_program::{clock::UnixTimestamp, pubkey::Pubkey};
use solana_sdk::signature::Signature;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::accessor::{EntrantsSource, EntrantsSubscription, RaffleSource, TicketPurchaser};
use crate::error::ClientError;
use crate::lifecycle::{raffle_state, RaffleState, Section};
use crate::state::{Entrants, PaymentType, RaffleSnapshot, RaffleWithKey, RafflerWithKey};
use crate::ticker::{Clock, CountdownTicker};

/// One raffle on the board, with its counters and computed state
#[derive(Clone, Debug)]
pub struct BoardEntry {
    pub raffle: RaffleWithKey,
    pub entrants: Option<Entrants>,
    pub state: RaffleState,
}

/// A raffler's page: every raffle it hosts, grouped by lifecycle state
#[derive(Clone, Debug)]
pub struct RafflerBoard {
    pub raffler: RafflerWithKey,
    pub entries: Vec<BoardEntry>,
}

impl RafflerBoard {
    /// Entries under one tab, in fetch order
    pub fn section(&self, section: Section) -> Vec<&BoardEntry> {
        self.entries
            .iter()
            .filter(|e| section.states().contains(&e.state))
            .collect()
    }

    /// Tabs visible to `viewer`; admin-only tabs need board management rights
    pub fn sections_for(&self, viewer: Option<&Pubkey>, admin: Option<&Pubkey>) -> Vec<Section> {
        let is_admin = self.is_admin(viewer, admin);
        Section::ALL
            .into_iter()
            .filter(|s| is_admin || !s.admin_only())
            .collect()
    }

    /// Whether `viewer` is the raffler authority or the site admin
    pub fn is_admin(&self, viewer: Option<&Pubkey>, admin: Option<&Pubkey>) -> bool {
        match viewer {
            Some(wallet) => {
                self.raffler.raffler.is_authority(wallet) || admin == Some(wallet)
            }
            None => false,
        }
    }
}

/// Handle for one watched raffle: a countdown ticker fed by the entrants
/// subscription. Dropping it cancels the ticker, the feed task and the
/// subscription.
pub struct RaffleWatch<G> {
    ticker: CountdownTicker,
    feed: Option<JoinHandle<()>>,
    _guard: Option<G>,
}

impl<G> RaffleWatch<G> {
    /// Latest published state
    pub fn state(&self) -> RaffleState {
        self.ticker.state()
    }

    /// Receiver observing state transitions
    pub fn states(&self) -> watch::Receiver<RaffleState> {
        self.ticker.subscribe()
    }

    /// Whether the countdown has stopped on its own
    pub fn is_finished(&self) -> bool {
        self.ticker.is_finished()
    }
}

impl<G> Drop for RaffleWatch<G> {
    fn drop(&mut self) {
        if let Some(feed) = self.feed.take() {
            feed.abort();
        }
    }
}

/// Drives the board and purchase flow over injected collaborators
pub struct RaffleService<R, E, S, P> {
    raffles: R,
    entrants: E,
    subscription: S,
    purchaser: P,
    /// Site-wide admin wallet, allowed to see admin tabs on any board
    admin: Option<Pubkey>,
}

impl<R, E, S, P> RaffleService<R, E, S, P>
where
    R: RaffleSource,
    E: EntrantsSource,
    S: EntrantsSubscription,
    P: TicketPurchaser,
{
    pub fn new(raffles: R, entrants: E, subscription: S, purchaser: P) -> Self {
        RaffleService {
            raffles,
            entrants,
            subscription,
            purchaser,
            admin: None,
        }
    }

    pub fn with_admin(mut self, admin: Pubkey) -> Self {
        self.admin = Some(admin);
        self
    }

    pub fn admin(&self) -> Option<&Pubkey> {
        self.admin.as_ref()
    }

    /// Build the board for the raffler at `slug`, as of `now`.
    ///
    /// Entrants accounts are fetched in one batch; raffles whose entrants
    /// account does not exist yet stay on the board with unknown counters.
    pub async fn raffler_board(
        &self,
        slug: &str,
        now: UnixTimestamp,
    ) -> Result<RafflerBoard, ClientError> {
        let raffler = self
            .raffles
            .raffler_by_slug(slug)
            .await?
            .ok_or_else(|| ClientError::UnknownRaffler(slug.to_string()))?;

        let raffles = self.raffles.raffles_for(&raffler.pubkey).await?;
        debug!(slug, raffles = raffles.len(), "loaded raffler board");

        let keys: Vec<Pubkey> = raffles.iter().filter_map(|r| r.raffle.entrants).collect();
        let counters = self.entrants.entrants(&keys).await?;

        let mut fetched = counters.into_iter();
        let entries = raffles
            .into_iter()
            .map(|raffle| {
                let entrants = match raffle.raffle.entrants {
                    Some(_) => fetched.next().flatten(),
                    None => None,
                };
                if raffle.raffle.entrants.is_some() && entrants.is_none() {
                    warn!(raffle = %raffle.pubkey, "entrants account missing, counters unknown");
                }
                let state = raffle_state(&raffle.raffle, entrants.as_ref(), now);
                BoardEntry {
                    raffle,
                    entrants,
                    state,
                }
            })
            .collect();

        Ok(RafflerBoard { raffler, entries })
    }

    /// Validate a purchase against the latest snapshot, then submit it.
    ///
    /// The chain re-checks all of this; validating here just avoids paying
    /// for a transaction that cannot succeed.
    pub async fn buy_tickets(
        &self,
        entry: &BoardEntry,
        count: u64,
        now: UnixTimestamp,
    ) -> Result<Signature, ClientError> {
        let state = raffle_state(&entry.raffle.raffle, entry.entrants.as_ref(), now);
        if state != RaffleState::InProgress {
            return Err(ClientError::RaffleNotOpen);
        }
        if count == 0 {
            return Err(ClientError::InvalidTicketCount);
        }
        if entry.raffle.raffle.payment_type == PaymentType::Nft && count != 1 {
            return Err(ClientError::SingleTicketOnly);
        }
        if let Some(remaining) = entry.entrants.as_ref().and_then(Entrants::remaining) {
            if count > remaining {
                return Err(ClientError::NotEnoughTicketsLeft);
            }
        }

        info!(raffle = %entry.raffle.pubkey, count, "submitting ticket purchase");
        self.purchaser.buy_tickets(&entry.raffle.pubkey, count).await
    }

    /// Watch one board entry: subscribe to its entrants account (when it has
    /// one) and run a countdown ticker off the live snapshot.
    pub async fn watch<C: Clock>(
        &self,
        entry: &BoardEntry,
        clock: C,
    ) -> Result<RaffleWatch<S::Guard>, ClientError> {
        let (snap_tx, snap_rx) = watch::channel(RaffleSnapshot {
            raffle: entry.raffle.raffle.clone(),
            entrants: entry.entrants,
        });

        let mut guard = None;
        let mut feed = None;
        if let Some(key) = entry.raffle.raffle.entrants {
            let (mut updates, g) = self.subscription.subscribe(&key).await?;
            guard = Some(g);
            let raffle = entry.raffle.raffle.clone();
            feed = Some(tokio::spawn(async move {
                while updates.changed().await.is_ok() {
                    let entrants = *updates.borrow();
                    // Replace the whole snapshot before the next tick.
                    let snapshot = RaffleSnapshot {
                        raffle: raffle.clone(),
                        entrants,
                    };
                    if snap_tx.send(snapshot).is_err() {
                        break;
                    }
                }
            }));
        }

        let ticker = CountdownTicker::spawn(snap_rx, clock);
        Ok(RaffleWatch {
            ticker,
            feed,
            _guard: guard,
        })
    }
}
