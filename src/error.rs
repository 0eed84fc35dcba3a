// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Domain errors convert into [`AppError`], and `AppError::into_response`
//! is the one place where they become status codes and bodies.

use crate::services::{AuthError, OfferError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No bearer token on a protected route.
    #[error("Authentication required")]
    Unauthorized,

    /// Bearer token with a bad signature, issuer or expiry.
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Offer with id {0} not found")]
    OfferNotFound(String),

    #[error("Offer already exists")]
    DuplicateOffer,

    #[error("Bad Credentials")]
    InvalidCredentials,

    #[error("Username {0} already taken")]
    UsernameTaken(String),

    #[error("Validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Single-message body: `{"message": ..., "status": ...}`.
#[derive(Serialize)]
struct MessageResponse {
    message: String,
    status: &'static str,
}

/// Multi-message body: `{"messages": [...], "status": ...}`.
#[derive(Serialize)]
struct MessagesResponse {
    messages: Vec<String>,
    status: &'static str,
}

/// Generic JSON error body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            AppError::OfferNotFound(_) => {
                tracing::error!(error = %message, "Offer lookup failed");
                message_response(StatusCode::NOT_FOUND, "NOT_FOUND", message)
            }
            AppError::DuplicateOffer => {
                tracing::warn!(error = %message, "Offer rejected");
                messages_response(StatusCode::CONFLICT, "CONFLICT", vec![message])
            }
            AppError::InvalidCredentials => {
                message_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
            }
            AppError::UsernameTaken(_) => {
                message_response(StatusCode::CONFLICT, "CONFLICT", message)
            }
            AppError::Validation(messages) => {
                messages_response(StatusCode::BAD_REQUEST, "BAD_REQUEST", messages)
            }
            AppError::Unauthorized | AppError::InvalidToken => {
                StatusCode::UNAUTHORIZED.into_response()
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        }
    }
}

fn message_response(code: StatusCode, status: &'static str, message: String) -> Response {
    (code, Json(MessageResponse { message, status })).into_response()
}

fn messages_response(code: StatusCode, status: &'static str, messages: Vec<String>) -> Response {
    (code, Json(MessagesResponse { messages, status })).into_response()
}

fn error_response(code: StatusCode, error: &str, details: Option<String>) -> Response {
    let body = ErrorResponse {
        error: error.to_string(),
        details,
    };
    (code, Json(body)).into_response()
}

impl From<OfferError> for AppError {
    fn from(e: OfferError) -> Self {
        match e {
            OfferError::NotFound(id) => AppError::OfferNotFound(id),
            OfferError::Duplicate => AppError::DuplicateOffer,
            OfferError::Fetch(e) => AppError::Internal(anyhow::Error::new(e)),
            OfferError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::UsernameTaken(name) => AppError::UsernameTaken(name),
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::InvalidToken => AppError::InvalidToken,
            AuthError::Store(e) => AppError::Database(e.to_string()),
            AuthError::Internal(e) => AppError::Internal(e),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter()
                    .map(|err| match &err.message {
                        Some(message) => message.to_string(),
                        None => format!("{} is invalid", field),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        messages.sort();
        AppError::Validation(messages)
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
