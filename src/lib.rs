// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Job offers aggregator.
//!
//! This crate periodically pulls job offers from a remote HTTP source,
//! stores the ones it has not seen before and serves them through a
//! token-protected REST API.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::{AuthService, OfferFacade};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub offer_facade: OfferFacade,
    pub auth_service: AuthService,
}
