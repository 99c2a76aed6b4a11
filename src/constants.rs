use std::time::Duration;

/// Auction lifetime when `AUCTION_DURATION_MINUTES` is unset or unparsable
pub const DEFAULT_AUCTION_DURATION_MINUTES: i64 = 60;

/// Environment key holding the auction lifetime in minutes
pub const AUCTION_DURATION_ENV: &str = "AUCTION_DURATION_MINUTES";

/// Cadence of the expiration sweep
pub const MONITOR_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on a single sweep's store call
pub const MONITOR_TICK_TIMEOUT: Duration = Duration::from_secs(30);

/// Product names must be longer than this many characters
pub const MIN_PRODUCT_NAME_CHARS: usize = 1;

/// Categories must be longer than this many characters
pub const MIN_CATEGORY_CHARS: usize = 2;

/// Descriptions must be longer than this many characters
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Hard cap shared by all free-text auction fields
pub const MAX_TEXT_FIELD_CHARS: usize = 2_000;
