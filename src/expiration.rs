//! Expiration policy: when does an active auction stop accepting bids.
//!
//! Everything here is pure. Callers that read the duration from the
//! environment own the logging when a value has to be defaulted.

use chrono::{DateTime, Duration, Utc};

use crate::constants::DEFAULT_AUCTION_DURATION_MINUTES;
use crate::store::operations::auctions::{Auction, AuctionStatus};

/// Parse a configured duration in minutes. `None` when absent or not a plain
/// integer; surrounding whitespace is not stripped.
pub fn parse_duration_minutes(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.parse::<i64>().ok())
}

/// Parsed duration, or the 60 minute default.
pub fn resolve_duration_minutes(raw: Option<&str>) -> i64 {
    parse_duration_minutes(raw).unwrap_or(DEFAULT_AUCTION_DURATION_MINUTES)
}

/// `now - duration`. Zero and negative durations are allowed; durations outside
/// chrono's range saturate instead of panicking.
pub fn cutoff(duration_minutes: i64, now: DateTime<Utc>) -> DateTime<Utc> {
    let saturated = if duration_minutes > 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    };

    Duration::try_minutes(duration_minutes)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(saturated)
}

/// Whether `created_at` falls strictly before `cutoff`, at whole-second
/// resolution (the persisted precision of `createdAt`).
pub fn is_past_cutoff(created_at: DateTime<Utc>, cutoff: DateTime<Utc>) -> bool {
    created_at.timestamp() < cutoff.timestamp()
}

pub fn is_expired(auction: &Auction, cutoff: DateTime<Utc>) -> bool {
    auction.status == AuctionStatus::Active && is_past_cutoff(auction.created_at, cutoff)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::store::operations::auctions::ProductCondition;

    fn auction_created_at(created_at: DateTime<Utc>, status: AuctionStatus) -> Auction {
        Auction {
            id: "a1".to_string(),
            product_name: "Camera".to_string(),
            category: "Electronics".to_string(),
            description: "Mirrorless camera body".to_string(),
            condition: ProductCondition::Used,
            status,
            created_at,
        }
    }

    #[test]
    fn missing_or_garbage_duration_defaults_to_sixty() {
        assert_eq!(resolve_duration_minutes(None), 60);
        assert_eq!(resolve_duration_minutes(Some("")), 60);
        assert_eq!(resolve_duration_minutes(Some("1h")), 60);
        assert_eq!(resolve_duration_minutes(Some("2.5")), 60);
        assert_eq!(resolve_duration_minutes(Some(" 0 ")), 60);
    }

    #[test]
    fn explicit_durations_are_kept() {
        assert_eq!(resolve_duration_minutes(Some("15")), 15);
        assert_eq!(resolve_duration_minutes(Some("0")), 0);
        assert_eq!(resolve_duration_minutes(Some("+15")), 15);
        assert_eq!(resolve_duration_minutes(Some("-5")), -5);
    }

    #[test]
    fn cutoff_subtracts_minutes() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            cutoff(60, now),
            Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap()
        );
        assert_eq!(cutoff(0, now), now);
        assert_eq!(
            cutoff(-10, now),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 10, 0).unwrap()
        );
    }

    #[test]
    fn cutoff_saturates_on_overflow() {
        let now = Utc::now();
        assert_eq!(cutoff(i64::MAX, now), DateTime::<Utc>::MIN_UTC);
        assert_eq!(cutoff(i64::MIN, now), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn active_auction_older_than_cutoff_is_expired() {
        let now = Utc::now();
        let auction = auction_created_at(now - Duration::hours(2), AuctionStatus::Active);
        assert!(is_expired(&auction, cutoff(60, now)));
    }

    #[test]
    fn active_auction_inside_window_is_not_expired() {
        let now = Utc::now();
        let auction = auction_created_at(now - Duration::minutes(30), AuctionStatus::Active);
        assert!(!is_expired(&auction, cutoff(60, now)));
    }

    #[test]
    fn completed_auction_is_never_expired() {
        let now = Utc::now();
        let auction = auction_created_at(now - Duration::days(365), AuctionStatus::Completed);
        assert!(!is_expired(&auction, cutoff(0, now)));
    }

    #[test]
    fn boundary_second_is_not_expired() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let cut = cutoff(0, now);
        assert!(!is_past_cutoff(now, cut));
        assert!(is_past_cutoff(now - Duration::seconds(1), cut));
    }
}
