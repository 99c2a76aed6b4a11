use crate::store::operations::auctions::{Auction, AuctionStatus};
use crate::store::{keys, Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

/// Ordered schema steps; a step's version is its 1-based position.
const MIGRATIONS: &[(&str, MigrationFn)] =
    &[("001_active_auction_index", m001_active_auction_index)];

/// Apply every migration newer than the persisted version.
///
/// Each migration must be idempotent: the process can die after a migration
/// body succeeds but before its version is recorded, and the body will run
/// again on the next start. Versions only move forward.
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if current as usize >= MIGRATIONS.len() {
        tracing::debug!(version = current, "Schema up to date");
        return Ok(());
    }

    for (version, (name, migrate)) in (1u32..).zip(MIGRATIONS).skip(current as usize) {
        tracing::info!(version, name, "Running migration");
        migrate(store)?;
        set_version(store, version)?;
        tracing::info!(version, name, "Migration complete");
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    let Some(raw) = store.config_versions.get(VERSION_KEY.as_bytes())? else {
        return Ok(0);
    };
    let bytes = <[u8; 4]>::try_from(&raw[..]).map_err(|_| StoreError::Migration {
        version: 0,
        message: format!("corrupt version marker of {} bytes", raw.len()),
    })?;
    Ok(u32::from_be_bytes(bytes))
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("schema is at {current}, refusing to go back to {version}"),
        });
    }

    store
        .config_versions
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

/// Rebuild the active-by-creation index from the auctions tree. Entries for
/// auctions that are no longer active are dropped.
fn m001_active_auction_index(store: &Store) -> Result<(), StoreError> {
    store.auctions_active_by_created_at.clear()?;

    let mut indexed = 0u64;
    for item in store.auctions.iter() {
        let (_, value) = item?;
        let auction: Auction = Store::deserialize(&value)?;

        if auction.status == AuctionStatus::Active {
            let index_key =
                keys::active_auction_index_key(auction.created_at.timestamp(), &auction.id);
            store
                .auctions_active_by_created_at
                .insert(index_key.as_bytes(), &[] as &[u8])?;
            indexed += 1;
        }
    }

    tracing::info!(indexed, "Active auction index rebuilt");
    Ok(())
}
