// Raffle client - Lifecycle state machine
use solana_program::clock::UnixTimestamp;

use crate::state::{Entrants, Raffle};

/// Lifecycle of a raffle as shown to entrants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RaffleState {
    /// Entry window has not opened yet
    NotStarted,
    /// Open for entries
    InProgress,
    /// Window closed or sold out, winner not yet drawn
    Ended,
    /// Winner selected, prize not yet claimed
    Drawn,
    /// Prize and proceeds claimed
    Claimed,
    /// Administratively cancelled
    Cancelled,
}

impl RaffleState {
    /// Whether the entry window is still open or yet to open
    pub fn is_live(self) -> bool {
        matches!(self, RaffleState::NotStarted | RaffleState::InProgress)
    }
}

/// Compute the lifecycle state of a raffle at `now`.
///
/// Pure: same inputs always give the same state. The on-chain program keeps
/// `cancelled`, `winner` and `claimed` mutually exclusive, so their ordering
/// here only encodes precedence over the time and capacity checks.
///
/// An absent entrants account never counts as sold out, and a raffle whose
/// window has not opened is `NotStarted` no matter what the counters say.
pub fn raffle_state(raffle: &Raffle, entrants: Option<&Entrants>, now: UnixTimestamp) -> RaffleState {
    if raffle.cancelled {
        return RaffleState::Cancelled;
    }
    if raffle.claimed {
        return RaffleState::Claimed;
    }
    if raffle.winner.is_some() {
        return RaffleState::Drawn;
    }
    if now < raffle.start_time {
        return RaffleState::NotStarted;
    }
    let sold_out = entrants.map_or(false, Entrants::is_sold_out);
    if now >= raffle.end_time || sold_out {
        return RaffleState::Ended;
    }
    RaffleState::InProgress
}

/// Timestamp the UI counts down to in the given state, if any
pub fn countdown_target(raffle: &Raffle, state: RaffleState) -> Option<UnixTimestamp> {
    match state {
        RaffleState::NotStarted => Some(raffle.start_time),
        RaffleState::InProgress => Some(raffle.end_time),
        _ => None,
    }
}

/// Board tabs, in display order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Live,
    Ended,
    Upcoming,
    Past,
    Cancelled,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Live,
        Section::Ended,
        Section::Upcoming,
        Section::Past,
        Section::Cancelled,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Section::Live => "Live",
            Section::Ended => "Ended",
            Section::Upcoming => "Upcoming",
            Section::Past => "Past",
            Section::Cancelled => "Cancelled",
        }
    }

    /// States collected under this tab. Drawn raffles stay on the ended tab
    /// until the prize is claimed.
    pub fn states(self) -> &'static [RaffleState] {
        match self {
            Section::Live => &[RaffleState::InProgress],
            Section::Ended => &[RaffleState::Ended, RaffleState::Drawn],
            Section::Upcoming => &[RaffleState::NotStarted],
            Section::Past => &[RaffleState::Claimed],
            Section::Cancelled => &[RaffleState::Cancelled],
        }
    }

    /// The cancelled tab is only shown to the raffler authority and the
    /// admin wallet.
    pub fn admin_only(self) -> bool {
        matches!(self, Section::Cancelled)
    }
}
