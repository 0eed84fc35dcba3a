//! Database layer.
//!
//! Offers and users are reached through the [`OfferRepository`] and
//! [`UserRepository`] traits. [`FirestoreDb`] is the production backend and
//! [`MemoryDb`] keeps everything in process.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::models::{NewOffer, Offer, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const OFFERS: &str = "offers";
    /// Unique index on offer URL (keyed by SHA-256 of the URL)
    pub const OFFER_URLS: &str = "offer_urls";
    pub const USERS: &str = "users";
}

/// Storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique index rejected the write.
    #[error("Duplicate key in {collection}: {key}")]
    DuplicateKey {
        collection: &'static str,
        key: String,
    },

    #[error("Database error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey { .. })
    }
}

/// Result of a batch insert.
#[derive(Debug, Default)]
pub struct SaveAllOutcome {
    /// Offers that were inserted, with their assigned ids.
    pub saved: Vec<Offer>,
    /// URLs rejected by the unique index.
    pub duplicates: Vec<String>,
}

/// Offer persistence.
#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// All stored offers, in no particular order.
    async fn find_all(&self) -> Result<Vec<Offer>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Offer>, StoreError>;

    async fn exists_by_offer_url(&self, offer_url: &str) -> Result<bool, StoreError>;

    /// Insert one offer and assign its id.
    ///
    /// Fails with [`StoreError::DuplicateKey`] if the URL is already stored.
    async fn save(&self, offer: NewOffer) -> Result<Offer, StoreError>;

    /// Insert every offer of the batch.
    ///
    /// Duplicate URLs do not abort the batch; they are listed in
    /// [`SaveAllOutcome::duplicates`]. Any other failure aborts it.
    async fn save_all(&self, offers: Vec<NewOffer>) -> Result<SaveAllOutcome, StoreError>;
}

/// User persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new user; fails with [`StoreError::DuplicateKey`] if the
    /// username is taken.
    async fn create(&self, user: &User) -> Result<(), StoreError>;
}
