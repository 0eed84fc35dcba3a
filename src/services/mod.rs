// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod fetcher;
pub mod offer;
pub mod scheduler;

pub use auth::{AuthError, AuthService};
pub use fetcher::{FetchError, HttpOfferFetcher, OfferFetcher};
pub use offer::{OfferError, OfferFacade, OfferService};
pub use scheduler::OfferScheduler;
