// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Offer aggregation and lookup.
//!
//! A fetch cycle runs:
//! 1. Fetch candidates from the remote source
//! 2. Drop URLs repeated within the batch
//! 3. Drop URLs already stored
//! 4. Store the rest
//!
//! Steps 3 and 4 are not atomic. When two cycles race on the same URL the
//! store's unique index rejects the late insert, and the cycle skips it.

use crate::db::{OfferRepository, StoreError};
use crate::models::{NewOffer, Offer};
use crate::services::fetcher::{FetchError, OfferFetcher};
use futures_util::{stream, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::sync::Arc;

const MAX_CONCURRENT_LOOKUPS: usize = 16;

/// Offer domain errors.
#[derive(Debug, thiserror::Error)]
pub enum OfferError {
    #[error("Offer with id {0} not found")]
    NotFound(String),

    #[error("Offer already exists")]
    Duplicate,

    #[error("Failed to fetch offers: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for OfferError {
    fn from(e: StoreError) -> Self {
        if e.is_duplicate_key() {
            OfferError::Duplicate
        } else {
            OfferError::Store(e)
        }
    }
}

/// Runs fetch cycles.
#[derive(Clone)]
pub struct OfferService {
    fetcher: Arc<dyn OfferFetcher>,
    repository: Arc<dyn OfferRepository>,
}

impl OfferService {
    pub fn new(fetcher: Arc<dyn OfferFetcher>, repository: Arc<dyn OfferRepository>) -> Self {
        Self {
            fetcher,
            repository,
        }
    }

    /// Run one fetch cycle and return the offers it stored.
    pub async fn fetch_all_offers_and_save_all_if_not_exist(
        &self,
    ) -> Result<Vec<Offer>, OfferError> {
        let candidates = self.fetcher.fetch_offers().await?;
        let fetched = candidates.len();

        let new_offers = self.filter_not_existing(candidates).await?;
        if new_offers.is_empty() {
            tracing::info!(fetched, "No new offers to save");
            return Ok(Vec::new());
        }

        // Duplicates are not errors here; the repository reports them separately.
        let outcome = self
            .repository
            .save_all(new_offers)
            .await
            .map_err(OfferError::Store)?;

        for url in &outcome.duplicates {
            tracing::warn!(url = %url, "Offer stored concurrently by another writer, skipping");
        }

        tracing::info!(
            fetched,
            saved = outcome.saved.len(),
            duplicates = outcome.duplicates.len(),
            "Fetch cycle complete"
        );

        Ok(outcome.saved)
    }

    /// Keep the first candidate per URL, and only if that URL is not stored yet.
    async fn filter_not_existing(
        &self,
        candidates: Vec<NewOffer>,
    ) -> Result<Vec<NewOffer>, OfferError> {
        let mut seen = HashSet::new();
        let unique: Vec<NewOffer> = candidates
            .into_iter()
            .filter(|offer| seen.insert(offer.offer_url.clone()))
            .collect();

        let repository = &self.repository;
        let checked: Vec<(NewOffer, bool)> = stream::iter(unique)
            .map(|offer| async move {
                let exists = repository.exists_by_offer_url(&offer.offer_url).await?;
                Ok::<_, StoreError>((offer, exists))
            })
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .try_collect()
            .await
            .map_err(OfferError::Store)?;

        Ok(checked
            .into_iter()
            .filter(|(_, exists)| !exists)
            .map(|(offer, _)| offer)
            .collect())
    }
}

/// Entry point for the API layer and the scheduler.
#[derive(Clone)]
pub struct OfferFacade {
    repository: Arc<dyn OfferRepository>,
    service: OfferService,
}

impl OfferFacade {
    pub fn new(repository: Arc<dyn OfferRepository>, service: OfferService) -> Self {
        Self {
            repository,
            service,
        }
    }

    pub async fn get_all_offers(&self) -> Result<Vec<Offer>, OfferError> {
        Ok(self.repository.find_all().await?)
    }

    pub async fn get_offer_by_id(&self, id: &str) -> Result<Offer, OfferError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| OfferError::NotFound(id.to_string()))
    }

    /// Store a single offer submitted through the API.
    pub async fn create_offer(&self, offer: NewOffer) -> Result<Offer, OfferError> {
        let saved = self.repository.save(offer).await?;
        tracing::info!(id = %saved.id, url = %saved.offer_url, "Offer created");
        Ok(saved)
    }

    pub async fn fetch_all_offers_and_save_all_if_not_exist(
        &self,
    ) -> Result<Vec<Offer>, OfferError> {
        self.service
            .fetch_all_offers_and_save_all_if_not_exist()
            .await
    }
}
