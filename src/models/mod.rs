// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod offer;
pub mod user;

pub use offer::{NewOffer, Offer, OfferDocument};
pub use user::User;
