use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use thiserror::Error;

use crate::expiration;
use crate::store::keys;
use crate::store::{Store, StoreError};
use crate::validation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id: String,
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: ProductCondition,
    pub status: AuctionStatus,
    /// Persisted as epoch seconds.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCondition {
    New,
    Used,
    Refurbished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Active,
    Completed,
}

impl AuctionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid auction {field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

impl Auction {
    /// Build a new, active auction stamped with the current second.
    pub fn new(
        product_name: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
        condition: ProductCondition,
    ) -> Result<Self, ValidationError> {
        let product_name = product_name.into();
        let category = category.into();
        let description = description.into();

        validation::validate_product_name(&product_name).map_err(|message| ValidationError {
            field: "product_name",
            message,
        })?;
        validation::validate_category(&category).map_err(|message| ValidationError {
            field: "category",
            message,
        })?;
        validation::validate_description(&description).map_err(|message| ValidationError {
            field: "description",
            message,
        })?;

        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            product_name,
            category,
            description,
            condition,
            status: AuctionStatus::Active,
            created_at: DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuctionFilter {
    pub status: Option<AuctionStatus>,
    pub category: Option<String>,
    /// Case-insensitive substring match.
    pub product_name: Option<String>,
}

impl AuctionFilter {
    fn matches(&self, auction: &Auction) -> bool {
        if self.status.is_some_and(|status| status != auction.status) {
            return false;
        }
        if let Some(category) = &self.category {
            if &auction.category != category {
                return false;
            }
        }
        if let Some(needle) = &self.product_name {
            if !auction
                .product_name
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

/// Storage contract the expiration monitor and auction writers depend on.
pub trait AuctionStore: Send + Sync {
    fn insert(&self, auction: &Auction) -> Result<(), StoreError>;

    fn update_status(&self, auction_id: &str, status: AuctionStatus) -> Result<(), StoreError>;

    /// Ids of active auctions created before `cutoff`, oldest first.
    fn find_expired_active(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, StoreError>;

    /// Complete every active auction created before `cutoff` in one atomic
    /// write. Returns how many auctions changed.
    fn complete_expired_active(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}

fn map_transaction_error(error: TransactionError<StoreError>) -> StoreError {
    match error {
        TransactionError::Abort(store_error) => store_error,
        TransactionError::Storage(storage_error) => StoreError::Sled(storage_error),
    }
}

fn index_key_for(auction: &Auction) -> String {
    keys::active_auction_index_key(auction.created_at.timestamp(), &auction.id)
}

impl Store {
    pub fn insert_auction(&self, auction: &Auction) -> Result<(), StoreError> {
        let key = keys::auction_key(&auction.id);
        let value = Self::serialize(auction)?;
        let index_key =
            (auction.status == AuctionStatus::Active).then(|| index_key_for(auction));

        (&self.auctions, &self.auctions_active_by_created_at)
            .transaction(|(tx_auctions, tx_index)| {
                if tx_auctions.get(key.as_bytes())?.is_some() {
                    return sled::transaction::abort(StoreError::Conflict {
                        entity: "auction".to_string(),
                        key: auction.id.clone(),
                    });
                }

                tx_auctions.insert(key.as_bytes(), value.as_slice())?;
                if let Some(index_key) = &index_key {
                    tx_index.insert(index_key.as_bytes(), &[] as &[u8])?;
                }
                Ok(())
            })
            .map_err(map_transaction_error)?;

        Ok(())
    }

    pub fn get_auction(&self, auction_id: &str) -> Result<Option<Auction>, StoreError> {
        let key = keys::auction_key(auction_id);
        match self.auctions.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Auctions matching `filter`, oldest first.
    pub fn list_auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        let mut auctions = Vec::new();
        for item in self.auctions.iter() {
            let (_, v) = item?;
            let auction = Self::deserialize::<Auction>(&v)?;
            if filter.matches(&auction) {
                auctions.push(auction);
            }
        }
        auctions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(auctions)
    }

    /// Set the status of a single auction. Re-applying the current status is a
    /// no-op; a completed auction can never be reopened.
    pub fn update_auction_status(
        &self,
        auction_id: &str,
        status: AuctionStatus,
    ) -> Result<(), StoreError> {
        let key = keys::auction_key(auction_id);

        (&self.auctions, &self.auctions_active_by_created_at)
            .transaction(|(tx_auctions, tx_index)| {
                let Some(raw) = tx_auctions.get(key.as_bytes())? else {
                    return sled::transaction::abort(StoreError::NotFound {
                        entity: "auction".to_string(),
                        key: auction_id.to_string(),
                    });
                };
                let mut auction: Auction = serde_json::from_slice(&raw).map_err(|error| {
                    ConflictableTransactionError::Abort(StoreError::Serialization(error))
                })?;

                match (auction.status, status) {
                    (from, to) if from == to => return Ok(()),
                    (AuctionStatus::Completed, to) => {
                        return sled::transaction::abort(StoreError::InvalidTransition {
                            key: auction_id.to_string(),
                            from: AuctionStatus::Completed.as_str(),
                            to: to.as_str(),
                        });
                    }
                    (AuctionStatus::Active, _) => {}
                }

                tx_index.remove(index_key_for(&auction).as_bytes())?;
                auction.status = status;
                let value = serde_json::to_vec(&auction).map_err(|error| {
                    ConflictableTransactionError::Abort(StoreError::Serialization(error))
                })?;
                tx_auctions.insert(key.as_bytes(), value)?;
                Ok(())
            })
            .map_err(map_transaction_error)?;

        Ok(())
    }

    pub fn find_expired_active_auctions(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<String>, StoreError> {
        Ok(self
            .expired_active_index_entries(cutoff)?
            .into_iter()
            .map(|(_, auction_id)| auction_id)
            .collect())
    }

    /// Flip every expired active auction to completed inside one transaction.
    ///
    /// Candidates come from the index, but each one is re-read and re-checked
    /// inside the transaction, so an auction completed concurrently (by another
    /// sweeper or a manual close) is neither rewritten nor counted.
    pub fn complete_expired_active_auctions(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let candidates = self.expired_active_index_entries(cutoff)?;
        if candidates.is_empty() {
            return Ok(0);
        }

        let completed = (&self.auctions, &self.auctions_active_by_created_at)
            .transaction(|(tx_auctions, tx_index)| {
                let mut completed = 0u64;
                for (index_key, auction_id) in &candidates {
                    let key = keys::auction_key(auction_id);
                    let Some(raw) = tx_auctions.get(key.as_bytes())? else {
                        tx_index.remove(&index_key[..])?;
                        continue;
                    };
                    let mut auction: Auction = serde_json::from_slice(&raw).map_err(|error| {
                        ConflictableTransactionError::Abort(StoreError::Serialization(error))
                    })?;

                    if !expiration::is_expired(&auction, cutoff) {
                        if auction.status != AuctionStatus::Active {
                            tx_index.remove(&index_key[..])?;
                        }
                        continue;
                    }

                    auction.status = AuctionStatus::Completed;
                    let value = serde_json::to_vec(&auction).map_err(|error| {
                        ConflictableTransactionError::Abort(StoreError::Serialization(error))
                    })?;
                    tx_auctions.insert(key.as_bytes(), value)?;
                    tx_index.remove(&index_key[..])?;
                    completed += 1;
                }
                Ok(completed)
            })
            .map_err(map_transaction_error)?;

        Ok(completed)
    }

    fn expired_active_index_entries(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<(sled::IVec, String)>, StoreError> {
        let upper = keys::active_auction_index_upper_bound(cutoff.timestamp());
        let mut entries = Vec::new();

        for item in self.auctions_active_by_created_at.range(..upper.as_bytes()) {
            let (k, _) = item?;
            match keys::auction_id_from_index_key(&k) {
                Some(auction_id) => entries.push((k, auction_id)),
                None => {
                    tracing::warn!(
                        key = %String::from_utf8_lossy(&k),
                        "Skipping malformed active auction index key"
                    );
                }
            }
        }

        Ok(entries)
    }
}

impl AuctionStore for Store {
    fn insert(&self, auction: &Auction) -> Result<(), StoreError> {
        self.insert_auction(auction)
    }

    fn update_status(&self, auction_id: &str, status: AuctionStatus) -> Result<(), StoreError> {
        self.update_auction_status(auction_id, status)
    }

    fn find_expired_active(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, StoreError> {
        self.find_expired_active_auctions(cutoff)
    }

    fn complete_expired_active(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        self.complete_expired_active_auctions(cutoff)
    }
}
