// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the remote job offers source.
//!
//! The source serves `GET /offers` with a JSON array of offers. The client
//! makes exactly one request per call; deciding whether to try again is the
//! caller's business.

use crate::models::NewOffer;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Errors while fetching offers from the remote source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Offer source request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Offer source returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Offer source returned malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Source of offer candidates.
#[async_trait]
pub trait OfferFetcher: Send + Sync {
    async fn fetch_offers(&self) -> Result<Vec<NewOffer>, FetchError>;
}

/// Offer as served by the remote source.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOfferResponse {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub salary: String,
    pub offer_url: String,
}

impl From<JobOfferResponse> for NewOffer {
    fn from(remote: JobOfferResponse) -> Self {
        Self {
            position: remote.title,
            company: remote.company,
            salary: remote.salary,
            offer_url: remote.offer_url,
        }
    }
}

/// HTTP implementation of [`OfferFetcher`].
#[derive(Clone)]
pub struct HttpOfferFetcher {
    http: reqwest::Client,
    offers_url: String,
}

impl HttpOfferFetcher {
    /// Create a client for the source at `base_url`.
    pub fn new(
        base_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            offers_url: format!("{}/offers", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl OfferFetcher for HttpOfferFetcher {
    async fn fetch_offers(&self) -> Result<Vec<NewOffer>, FetchError> {
        tracing::debug!(url = %self.offers_url, "Fetching offers from remote source");

        let response = self
            .http
            .get(&self.offers_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let offers: Vec<JobOfferResponse> = serde_json::from_str(&body)?;
        tracing::debug!(count = offers.len(), "Fetched offers");

        Ok(offers.into_iter().map(NewOffer::from).collect())
    }
}
