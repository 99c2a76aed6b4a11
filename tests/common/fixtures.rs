use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use chrono::{DateTime, Duration, Utc};

use auction_sweeper::config::DurationSource;
use auction_sweeper::store::operations::auctions::{
    Auction, AuctionStatus, AuctionStore, ProductCondition,
};
use auction_sweeper::store::Store;

pub fn setup_store(db_name: &str) -> (tempfile::TempDir, Arc<Store>) {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let db_path = temp_dir.path().join(db_name);
    let store = Arc::new(Store::open(db_path.to_str().expect("db path")).expect("open store"));
    store.run_migrations().expect("migrations");
    (temp_dir, store)
}

/// A valid active auction created `age` ago.
pub fn auction_aged(age: Duration) -> Auction {
    let mut auction = Auction::new(
        "Test Product",
        "Test Category",
        "Test description with enough characters",
        ProductCondition::New,
    )
    .expect("valid auction");
    auction.created_at = Utc::now() - age;
    auction
}

pub fn seed_auction(store: &Store, age: Duration) -> Auction {
    let auction = auction_aged(age);
    store.insert(&auction).expect("insert auction");
    auction
}

pub fn status_of(store: &Store, auction_id: &str) -> AuctionStatus {
    store
        .get_auction(auction_id)
        .expect("get auction")
        .expect("auction exists")
        .status
}

pub fn epoch_seconds_ago(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(Utc::now().timestamp() - secs, 0).expect("valid timestamp")
}

/// Duration source that can be changed while a monitor is running.
#[derive(Debug)]
pub struct AdjustableDuration(AtomicI64);

impl AdjustableDuration {
    pub fn new(minutes: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(minutes)))
    }

    pub fn set(&self, minutes: i64) {
        self.0.store(minutes, Ordering::SeqCst);
    }
}

impl DurationSource for AdjustableDuration {
    fn current_duration_minutes(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Serializes tests that mutate process environment variables.
pub fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}
