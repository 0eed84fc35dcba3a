// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Offer routes (require authentication).

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{NewOffer, Offer};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Offer routes. The auth middleware is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/offers", get(get_offers).post(create_offer))
        .route("/offers/{id}", get(get_offer))
}

/// Offer as returned by the API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OfferResponse {
    pub id: String,
    pub company_name: String,
    pub position: String,
    pub salary: String,
    pub offer_url: String,
}

impl From<Offer> for OfferResponse {
    fn from(offer: Offer) -> Self {
        Self {
            id: offer.id,
            company_name: offer.company,
            position: offer.position,
            salary: offer.salary,
            offer_url: offer.offer_url,
        }
    }
}

/// Body of `POST /offers`.
///
/// Missing fields deserialize as empty strings so that they are reported
/// by validation rather than rejected by the JSON extractor.
#[derive(Deserialize, Validate, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OfferRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "companyName must not be empty"))]
    pub company_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "position must not be empty"))]
    pub position: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "salary must not be empty"))]
    pub salary: String,
    #[serde(default)]
    #[validate(url(message = "offerUrl must be a valid URL"))]
    pub offer_url: String,
}

impl From<OfferRequest> for NewOffer {
    fn from(req: OfferRequest) -> Self {
        Self {
            position: req.position,
            company: req.company_name,
            salary: req.salary,
            offer_url: req.offer_url,
        }
    }
}

/// List all stored offers.
async fn get_offers(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<OfferResponse>>> {
    tracing::debug!(username = %user.username, "Listing offers");

    let offers = state.offer_facade.get_all_offers().await?;
    Ok(Json(offers.into_iter().map(OfferResponse::from).collect()))
}

/// Get a single offer.
async fn get_offer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OfferResponse>> {
    let offer = state.offer_facade.get_offer_by_id(&id).await?;
    Ok(Json(offer.into()))
}

/// Submit an offer by hand.
async fn create_offer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<OfferRequest>,
) -> Result<(StatusCode, Json<OfferResponse>)> {
    body.validate()?;

    tracing::info!(
        username = %user.username,
        url = %body.offer_url,
        "Creating offer"
    );

    let offer = state.offer_facade.create_offer(body.into()).await?;
    Ok((StatusCode::CREATED, Json(offer.into())))
}
