// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store for local runs and tests.
//!
//! Uniqueness is enforced through `DashMap` entries: claiming a vacant
//! entry in the URL (or username) index is atomic, so two concurrent
//! inserts of the same key cannot both succeed.

use super::{collections, OfferRepository, SaveAllOutcome, StoreError, UserRepository};
use crate::models::{NewOffer, Offer, User};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory database. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    offers: Arc<DashMap<String, Offer>>,
    /// offer URL -> offer id
    offer_urls: Arc<DashMap<String, String>>,
    users: Arc<DashMap<String, User>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OfferRepository for MemoryDb {
    async fn find_all(&self) -> Result<Vec<Offer>, StoreError> {
        Ok(self.offers.iter().map(|e| e.value().clone()).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Offer>, StoreError> {
        Ok(self.offers.get(id).map(|e| e.value().clone()))
    }

    async fn exists_by_offer_url(&self, offer_url: &str) -> Result<bool, StoreError> {
        Ok(self.offer_urls.contains_key(offer_url))
    }

    async fn save(&self, offer: NewOffer) -> Result<Offer, StoreError> {
        match self.offer_urls.entry(offer.offer_url.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey {
                collection: collections::OFFER_URLS,
                key: offer.offer_url,
            }),
            Entry::Vacant(slot) => {
                let id = uuid::Uuid::new_v4().to_string();
                let offer = offer.into_offer(id.clone());
                // Publish the offer before releasing the index entry so that
                // an existence check never sees a URL without its offer.
                self.offers.insert(id.clone(), offer.clone());
                slot.insert(id);
                Ok(offer)
            }
        }
    }

    async fn save_all(&self, offers: Vec<NewOffer>) -> Result<SaveAllOutcome, StoreError> {
        let mut outcome = SaveAllOutcome::default();
        for offer in offers {
            match self.save(offer).await {
                Ok(saved) => outcome.saved.push(saved),
                Err(StoreError::DuplicateKey { key, .. }) => outcome.duplicates.push(key),
                Err(e) => return Err(e),
            }
        }
        Ok(outcome)
    }
}

#[async_trait]
impl UserRepository for MemoryDb {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(username).map(|e| e.value().clone()))
    }

    async fn create(&self, user: &User) -> Result<(), StoreError> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey {
                collection: collections::USERS,
                key: user.username.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(())
            }
        }
    }
}
