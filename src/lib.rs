// Raffle web client core
// Decodes raffle program accounts, derives lifecycle state and drives the
// live countdown shown on raffle cards. All chain access goes through the
// injected interfaces in `accessor`.

pub mod accessor;
pub mod error;
pub mod lifecycle;
pub mod service;
pub mod state;
pub mod ticker;
pub mod utils;

pub use accessor::{EntrantsSource, EntrantsSubscription, RaffleSource, TicketPurchaser};
pub use error::ClientError;
pub use lifecycle::{countdown_target, raffle_state, RaffleState, Section};
pub use service::{BoardEntry, RaffleService, RaffleWatch, RafflerBoard};
pub use state::{
    account_discriminator, Entrants, PaymentType, Raffle, RaffleSnapshot, RaffleWithKey, Raffler,
    RafflerWithKey, ENTRANTS_UNCAPPED,
};
pub use ticker::{Clock, CountdownTicker, SystemClock, TICK_INTERVAL};
