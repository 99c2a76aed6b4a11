pub fn auction_key(auction_id: &str) -> String {
    auction_id.to_string()
}

/// Maps epoch seconds onto `u64` so that numeric order survives negative
/// instants (sign bit flipped).
pub fn created_at_sort_value(created_at_secs: i64) -> u64 {
    (created_at_secs as u64) ^ (1 << 63)
}

/// `{sort_value:020}:{auction_id}`; ascending key order is ascending creation time.
pub fn active_auction_index_key(created_at_secs: i64, auction_id: &str) -> String {
    format!(
        "{:020}:{}",
        created_at_sort_value(created_at_secs),
        auction_id
    )
}

/// Exclusive upper bound for index keys of auctions created strictly before
/// `cutoff_secs`.
pub fn active_auction_index_upper_bound(cutoff_secs: i64) -> String {
    format!("{:020}:", created_at_sort_value(cutoff_secs))
}

pub fn auction_id_from_index_key(index_key: &[u8]) -> Option<String> {
    let sep = index_key.iter().position(|b| *b == b':')?;
    let id = std::str::from_utf8(&index_key[sep + 1..]).ok()?;
    if id.is_empty() {
        return None;
    }
    Some(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_orders_by_creation_time_asc() {
        let older = active_auction_index_key(1_000, "b");
        let newer = active_auction_index_key(2_000, "a");
        assert!(older < newer);
    }

    #[test]
    fn negative_timestamps_sort_before_positive() {
        let before_epoch = active_auction_index_key(-10, "a");
        let after_epoch = active_auction_index_key(10, "a");
        assert!(before_epoch < after_epoch);
        assert!(active_auction_index_key(-20, "a") < before_epoch);
    }

    #[test]
    fn upper_bound_excludes_cutoff_second() {
        let bound = active_auction_index_upper_bound(1_000);
        assert!(active_auction_index_key(999, "zzz") < bound);
        assert!(active_auction_index_key(1_000, "a") > bound);
    }

    #[test]
    fn id_round_trips_through_index_key() {
        let key = active_auction_index_key(1_700_000_000, "3f2a-uuid");
        assert_eq!(
            auction_id_from_index_key(key.as_bytes()).as_deref(),
            Some("3f2a-uuid")
        );
        assert_eq!(auction_id_from_index_key(b"00000000000000000001:"), None);
        assert_eq!(auction_id_from_index_key(b"no-separator"), None);
    }
}
