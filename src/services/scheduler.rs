// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Periodic offer fetching.
//!
//! Each tick runs one fetch cycle. A failed cycle is logged and the next
//! tick tries again on the normal schedule; there is no backoff.

use crate::models::Offer;
use crate::services::offer::{OfferError, OfferFacade};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Background task that keeps the offer store in sync with the remote source.
#[derive(Clone)]
pub struct OfferScheduler {
    facade: OfferFacade,
    period: Duration,
}

impl OfferScheduler {
    pub fn new(facade: OfferFacade, period: Duration) -> Self {
        Self { facade, period }
    }

    /// Run one cycle now.
    ///
    /// This is what every tick does; tests call it to drive a cycle on demand.
    pub async fn run_once(&self) -> Result<Vec<Offer>, OfferError> {
        tracing::info!("Scheduled offer fetch started");
        self.facade
            .fetch_all_offers_and_save_all_if_not_exist()
            .await
    }

    /// Start the timer loop on its own task.
    ///
    /// The first cycle runs immediately. Abort the returned handle to stop.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(&self) {
        tracing::info!(period_secs = self.period.as_secs(), "Starting offer scheduler");

        let mut ticker = interval(self.period);
        // A slow cycle pushes the next one back instead of triggering a burst.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match self.run_once().await {
                Ok(saved) => {
                    tracing::info!(saved = saved.len(), "Scheduled offer fetch finished");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Scheduled offer fetch failed");
                }
            }
        }
    }
}
