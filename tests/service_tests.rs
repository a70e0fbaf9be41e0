use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use solana_sdk::{pubkey::Pubkey, signature::Signature};
use tokio::sync::watch;

use raffle_client::{
    BoardEntry, ClientError, Clock, Entrants, EntrantsSource, EntrantsSubscription, PaymentType,
    Raffle, RaffleService, RaffleSource, RaffleState, RaffleWithKey, Raffler, RafflerWithKey,
    Section, TicketPurchaser, ENTRANTS_UNCAPPED,
};

#[derive(Clone)]
struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    fn new(now: i64) -> Self {
        ManualClock(Arc::new(AtomicI64::new(now)))
    }

    fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// In-memory stand-in for the RPC read layer
#[derive(Clone, Default)]
struct MockChain {
    rafflers: Vec<RafflerWithKey>,
    raffles: Vec<RaffleWithKey>,
}

impl RaffleSource for MockChain {
    async fn rafflers(&self) -> Result<Vec<RafflerWithKey>, ClientError> {
        Ok(self.rafflers.clone())
    }

    async fn raffler_by_slug(&self, slug: &str) -> Result<Option<RafflerWithKey>, ClientError> {
        Ok(self
            .rafflers
            .iter()
            .find(|r| r.raffler.slug == slug)
            .cloned())
    }

    async fn raffles_for(&self, raffler: &Pubkey) -> Result<Vec<RaffleWithKey>, ClientError> {
        Ok(self
            .raffles
            .iter()
            .filter(|r| r.raffle.raffler == *raffler)
            .cloned()
            .collect())
    }
}

#[derive(Clone, Default)]
struct MockEntrants(HashMap<Pubkey, Entrants>);

impl EntrantsSource for MockEntrants {
    async fn entrants(&self, keys: &[Pubkey]) -> Result<Vec<Option<Entrants>>, ClientError> {
        Ok(keys.iter().map(|k| self.0.get(k).copied()).collect())
    }
}

/// Subscription the test can push updates through
#[derive(Clone, Default)]
struct MockSubscription {
    feeds: Arc<Mutex<HashMap<Pubkey, watch::Sender<Option<Entrants>>>>>,
}

impl MockSubscription {
    fn push(&self, key: &Pubkey, entrants: Option<Entrants>) {
        if let Some(tx) = self.feeds.lock().unwrap().get(key) {
            let _ = tx.send(entrants);
        }
    }
}

impl EntrantsSubscription for MockSubscription {
    type Guard = ();

    async fn subscribe(
        &self,
        key: &Pubkey,
    ) -> Result<(watch::Receiver<Option<Entrants>>, ()), ClientError> {
        let (tx, rx) = watch::channel(None);
        self.feeds.lock().unwrap().insert(*key, tx);
        Ok((rx, ()))
    }
}

#[derive(Clone, Default)]
struct MockPurchaser {
    calls: Arc<Mutex<Vec<(Pubkey, u64)>>>,
}

impl TicketPurchaser for MockPurchaser {
    async fn buy_tickets(&self, raffle: &Pubkey, count: u64) -> Result<Signature, ClientError> {
        self.calls.lock().unwrap().push((*raffle, count));
        Ok(Signature::default())
    }
}

fn raffler(slug: &str) -> RafflerWithKey {
    RafflerWithKey {
        pubkey: Pubkey::new_unique(),
        raffler: Raffler {
            authority: Pubkey::new_unique(),
            slug: slug.to_string(),
            name: slug.to_string(),
            staker: None,
            bump: 255,
        },
    }
}

fn raffle(host: &Pubkey, start_time: i64, end_time: i64, entrants: Option<Pubkey>) -> RaffleWithKey {
    RaffleWithKey {
        pubkey: Pubkey::new_unique(),
        raffle: Raffle {
            raffler: *host,
            entrants,
            prize: Some(Pubkey::new_unique()),
            payment_type: PaymentType::Token {
                token_mint: Pubkey::new_unique(),
                ticket_price: 5_000_000,
            },
            start_time,
            end_time,
            cancelled: false,
            winner: None,
            claimed: false,
            uri: None,
            bump: 255,
        },
    }
}

fn entry(raffle: RaffleWithKey, entrants: Option<Entrants>, state: RaffleState) -> BoardEntry {
    BoardEntry {
        raffle,
        entrants,
        state,
    }
}

fn service(
    chain: MockChain,
    entrants: MockEntrants,
    subscription: MockSubscription,
    purchaser: MockPurchaser,
) -> RaffleService<MockChain, MockEntrants, MockSubscription, MockPurchaser> {
    RaffleService::new(chain, entrants, subscription, purchaser)
}

#[tokio::test]
async fn board_groups_raffles_by_state() {
    let host = raffler("dandies");
    let key = host.pubkey;

    let live_key = Pubkey::new_unique();
    let live = raffle(&key, 100, 200, Some(live_key));
    let upcoming = raffle(&key, 300, 400, None);
    let ended = raffle(&key, 10, 20, None);
    let mut drawn = raffle(&key, 10, 20, None);
    drawn.raffle.winner = Some(Pubkey::new_unique());
    let mut claimed = raffle(&key, 10, 20, None);
    claimed.raffle.winner = Some(Pubkey::new_unique());
    claimed.raffle.claimed = true;
    let mut cancelled = raffle(&key, 100, 200, None);
    cancelled.raffle.cancelled = true;

    let chain = MockChain {
        rafflers: vec![host],
        raffles: vec![
            live.clone(),
            upcoming.clone(),
            ended.clone(),
            drawn.clone(),
            claimed.clone(),
            cancelled.clone(),
        ],
    };
    let counters = MockEntrants(HashMap::from([(live_key, Entrants { total: 5, max: 10 })]));
    let svc = service(
        chain,
        counters,
        MockSubscription::default(),
        MockPurchaser::default(),
    );

    let board = svc.raffler_board("dandies", 150).await.unwrap();
    assert_eq!(board.entries.len(), 6);

    let keys = |section: Section| -> Vec<Pubkey> {
        board
            .section(section)
            .iter()
            .map(|e| e.raffle.pubkey)
            .collect()
    };
    assert_eq!(keys(Section::Live), vec![live.pubkey]);
    assert_eq!(keys(Section::Upcoming), vec![upcoming.pubkey]);
    assert_eq!(keys(Section::Ended), vec![ended.pubkey, drawn.pubkey]);
    assert_eq!(keys(Section::Past), vec![claimed.pubkey]);
    assert_eq!(keys(Section::Cancelled), vec![cancelled.pubkey]);

    let live_entry = &board.section(Section::Live)[0];
    assert_eq!(live_entry.entrants, Some(Entrants { total: 5, max: 10 }));
}

#[tokio::test]
async fn board_rejects_unknown_slug() {
    let svc = service(
        MockChain::default(),
        MockEntrants::default(),
        MockSubscription::default(),
        MockPurchaser::default(),
    );
    assert!(matches!(
        svc.raffler_board("nobody", 0).await,
        Err(ClientError::UnknownRaffler(slug)) if slug == "nobody"
    ));
}

#[tokio::test]
async fn board_keeps_raffles_with_missing_entrants_accounts() {
    let host = raffler("dandies");
    let key = host.pubkey;
    // References an entrants account nobody has created yet.
    let r = raffle(&key, 100, 200, Some(Pubkey::new_unique()));

    let chain = MockChain {
        rafflers: vec![host],
        raffles: vec![r],
    };
    let svc = service(
        chain,
        MockEntrants::default(),
        MockSubscription::default(),
        MockPurchaser::default(),
    );

    let board = svc.raffler_board("dandies", 150).await.unwrap();
    assert_eq!(board.entries[0].entrants, None);
    assert_eq!(board.entries[0].state, RaffleState::InProgress);
}

#[tokio::test]
async fn cancelled_tab_is_admin_only() {
    let host = raffler("dandies");
    let authority = host.raffler.authority;
    let chain = MockChain {
        rafflers: vec![host],
        raffles: vec![],
    };
    let admin = Pubkey::new_unique();
    let svc = service(
        chain,
        MockEntrants::default(),
        MockSubscription::default(),
        MockPurchaser::default(),
    )
    .with_admin(admin);

    let board = svc.raffler_board("dandies", 0).await.unwrap();
    let visitor = Pubkey::new_unique();

    assert!(!board
        .sections_for(Some(&visitor), svc.admin())
        .contains(&Section::Cancelled));
    assert!(!board.sections_for(None, svc.admin()).contains(&Section::Cancelled));
    assert!(board
        .sections_for(Some(&authority), svc.admin())
        .contains(&Section::Cancelled));
    assert!(board
        .sections_for(Some(&admin), svc.admin())
        .contains(&Section::Cancelled));
}

#[tokio::test]
async fn purchase_is_validated_before_submission() {
    let host = Pubkey::new_unique();
    let purchaser = MockPurchaser::default();
    let svc = service(
        MockChain::default(),
        MockEntrants::default(),
        MockSubscription::default(),
        purchaser.clone(),
    );

    let open = entry(
        raffle(&host, 100, 200, None),
        Some(Entrants { total: 5, max: 10 }),
        RaffleState::InProgress,
    );

    // Window closed.
    assert!(matches!(
        svc.buy_tickets(&open, 1, 250).await,
        Err(ClientError::RaffleNotOpen)
    ));
    // Zero tickets.
    assert!(matches!(
        svc.buy_tickets(&open, 0, 150).await,
        Err(ClientError::InvalidTicketCount)
    ));
    // More than remain.
    assert!(matches!(
        svc.buy_tickets(&open, 6, 150).await,
        Err(ClientError::NotEnoughTicketsLeft)
    ));
    assert!(purchaser.calls.lock().unwrap().is_empty());

    // Exactly the remaining capacity goes through.
    svc.buy_tickets(&open, 5, 150).await.unwrap();
    let calls = purchaser.calls.lock().unwrap();
    assert_eq!(*calls, vec![(open.raffle.pubkey, 5)]);
}

#[tokio::test]
async fn nft_raffles_take_one_ticket_per_entry() {
    let host = Pubkey::new_unique();
    let purchaser = MockPurchaser::default();
    let svc = service(
        MockChain::default(),
        MockEntrants::default(),
        MockSubscription::default(),
        purchaser.clone(),
    );

    let mut nft = raffle(&host, 100, 200, None);
    nft.raffle.payment_type = PaymentType::Nft;
    let nft_entry = entry(nft, Some(Entrants { total: 0, max: 10 }), RaffleState::InProgress);

    assert!(matches!(
        svc.buy_tickets(&nft_entry, 2, 150).await,
        Err(ClientError::SingleTicketOnly)
    ));
    svc.buy_tickets(&nft_entry, 1, 150).await.unwrap();
}

#[tokio::test]
async fn uncapped_raffles_never_reject_on_capacity() {
    let host = Pubkey::new_unique();
    let purchaser = MockPurchaser::default();
    let svc = service(
        MockChain::default(),
        MockEntrants::default(),
        MockSubscription::default(),
        purchaser.clone(),
    );

    let open = entry(
        raffle(&host, 100, 200, None),
        Some(Entrants {
            total: 999_999,
            max: ENTRANTS_UNCAPPED,
        }),
        RaffleState::InProgress,
    );
    svc.buy_tickets(&open, 1_000, 150).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn watch_reacts_to_entrants_updates() {
    let host = Pubkey::new_unique();
    let entrants_key = Pubkey::new_unique();
    let subscription = MockSubscription::default();
    let svc = service(
        MockChain::default(),
        MockEntrants::default(),
        subscription.clone(),
        MockPurchaser::default(),
    );

    let open = entry(
        raffle(&host, 100, 200, Some(entrants_key)),
        Some(Entrants { total: 5, max: 10 }),
        RaffleState::InProgress,
    );
    let clock = ManualClock::new(150);
    let watch = svc.watch(&open, clock).await.unwrap();
    let mut states = watch.states();
    assert_eq!(watch.state(), RaffleState::InProgress);

    // The push subscription reports the raffle selling out.
    subscription.push(&entrants_key, Some(Entrants { total: 10, max: 10 }));
    while states.changed().await.is_ok() {
        if *states.borrow() == RaffleState::Ended {
            break;
        }
    }
    assert_eq!(*states.borrow(), RaffleState::Ended);
}

#[tokio::test(start_paused = true)]
async fn watch_ticks_without_an_entrants_account() {
    let host = Pubkey::new_unique();
    let svc = service(
        MockChain::default(),
        MockEntrants::default(),
        MockSubscription::default(),
        MockPurchaser::default(),
    );

    let upcoming = entry(raffle(&host, 100, 200, None), None, RaffleState::NotStarted);
    let clock = ManualClock::new(50);
    let watch = svc.watch(&upcoming, clock.clone()).await.unwrap();
    let mut states = watch.states();
    assert_eq!(watch.state(), RaffleState::NotStarted);

    clock.set(150);
    states.changed().await.unwrap();
    assert_eq!(*states.borrow(), RaffleState::InProgress);
}
