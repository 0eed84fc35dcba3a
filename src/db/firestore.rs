// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides storage for:
//! - Offers (`offers/{id}`)
//! - Offer URL unique index (`offer_urls/{sha256(url)}`)
//! - Users (`users/{username}`)
//!
//! Firestore has no secondary unique indexes. Offer URL uniqueness is
//! enforced by writing the index entry and the offer in one transaction,
//! both with a must-not-exist precondition, so either both documents are
//! stored or neither is.

use super::{collections, OfferRepository, SaveAllOutcome, StoreError, UserRepository};
use crate::models::{NewOffer, Offer, OfferDocument, User};
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::FirestoreWritePrecondition;
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Entry of the `offer_urls` unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OfferUrlIndex {
    offer_id: String,
    url: String,
}

/// Firestore's limit on document ID length, in bytes.
const MAX_DOC_ID_BYTES: usize = 1500;

/// Document ID of the unique index entry for an offer URL.
fn offer_url_key(offer_url: &str) -> String {
    hex::encode(Sha256::digest(offer_url.as_bytes()))
}

/// Whether Firestore accepts `id` as a document ID.
fn valid_doc_id(id: &str) -> bool {
    let reserved = id == "."
        || id == ".."
        || (id.len() >= 4 && id.starts_with("__") && id.ends_with("__"));

    !id.is_empty() && id.len() <= MAX_DOC_ID_BYTES && !id.contains('/') && !reserved
}

/// Document ID of a user.
///
/// Percent-encoding with `.` and `_` escaped too, so that no username maps
/// onto a reserved ID. Reversible with `urlencoding::decode`.
fn user_doc_id(username: &str) -> String {
    urlencoding::encode(username)
        .replace('.', "%2E")
        .replace('_', "%5F")
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Backend(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, StoreError> {
        self.client
            .as_ref()
            .ok_or_else(|| StoreError::Backend("Database not connected (offline mode)".to_string()))
    }

    /// Store `offer` under its own id, claiming its URL in the same commit.
    ///
    /// Fails with [`StoreError::DuplicateKey`] if the URL is already claimed.
    pub async fn insert_offer(&self, offer: Offer) -> Result<Offer, StoreError> {
        let client = self.get_client()?;
        if !valid_doc_id(&offer.id) {
            return Err(StoreError::Backend(format!("Invalid offer id: {}", offer.id)));
        }

        let key = offer_url_key(&offer.offer_url);
        let index_entry = OfferUrlIndex {
            offer_id: offer.id.clone(),
            url: offer.offer_url.clone(),
        };

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::OFFER_URLS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&key)
            .object(&index_entry)
            .add_to_transaction(&mut transaction)
            .map_err(backend)?;

        client
            .fluent()
            .update()
            .in_col(collections::OFFERS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&offer.id)
            .object(&OfferDocument::from(&offer))
            .add_to_transaction(&mut transaction)
            .map_err(backend)?;

        match transaction.commit().await {
            Ok(_) => {
                tracing::debug!(id = %offer.id, url = %offer.offer_url, "Offer stored");
                Ok(offer)
            }
            Err(e) => {
                // Nothing was written. Either precondition may have failed,
                // so only another writer's claim on the URL is a duplicate.
                if self.exists_by_offer_url(&offer.offer_url).await? {
                    Err(duplicate_url(offer.offer_url))
                } else {
                    Err(StoreError::Backend(format!("Transaction commit failed: {}", e)))
                }
            }
        }
    }
}

fn duplicate_url(offer_url: String) -> StoreError {
    StoreError::DuplicateKey {
        collection: collections::OFFER_URLS,
        key: offer_url,
    }
}

fn backend(e: FirestoreError) -> StoreError {
    StoreError::Backend(e.to_string())
}

// ─── Offer Operations ────────────────────────────────────────

#[async_trait]
impl OfferRepository for FirestoreDb {
    async fn find_all(&self) -> Result<Vec<Offer>, StoreError> {
        let docs: Vec<OfferDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::OFFERS)
            .obj()
            .query()
            .await
            .map_err(backend)?;

        Ok(docs.into_iter().map(Offer::from).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Offer>, StoreError> {
        // Not a valid document ID, so it cannot name a stored offer.
        if !valid_doc_id(id) {
            return Ok(None);
        }

        let doc: Option<OfferDocument> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::OFFERS)
            .obj()
            .one(id)
            .await
            .map_err(backend)?;

        Ok(doc.map(Offer::from))
    }

    async fn exists_by_offer_url(&self, offer_url: &str) -> Result<bool, StoreError> {
        let entry: Option<OfferUrlIndex> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::OFFER_URLS)
            .obj()
            .one(&offer_url_key(offer_url))
            .await
            .map_err(backend)?;

        Ok(entry.is_some())
    }

    async fn save(&self, offer: NewOffer) -> Result<Offer, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.insert_offer(offer.into_offer(id)).await
    }

    /// Inserts concurrently with a limit to avoid overloading Firestore.
    async fn save_all(&self, offers: Vec<NewOffer>) -> Result<SaveAllOutcome, StoreError> {
        let results: Vec<(String, Result<Offer, StoreError>)> = stream::iter(offers)
            .map(|offer| async move {
                let url = offer.offer_url.clone();
                (url, self.save(offer).await)
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect()
            .await;

        let mut outcome = SaveAllOutcome::default();
        for (url, result) in results {
            match result {
                Ok(offer) => outcome.saved.push(offer),
                Err(e) if e.is_duplicate_key() => outcome.duplicates.push(url),
                Err(e) => return Err(e),
            }
        }
        Ok(outcome)
    }
}

// ─── User Operations ─────────────────────────────────────────

#[async_trait]
impl UserRepository for FirestoreDb {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let doc_id = user_doc_id(username);
        if !valid_doc_id(&doc_id) {
            return Ok(None);
        }

        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&doc_id)
            .await
            .map_err(backend)
    }

    async fn create(&self, user: &User) -> Result<(), StoreError> {
        let doc_id = user_doc_id(&user.username);
        if !valid_doc_id(&doc_id) {
            return Err(StoreError::Backend(format!(
                "Username cannot be stored: {}",
                user.username
            )));
        }

        let created: Result<User, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&doc_id)
            .object(user)
            .execute()
            .await;

        match created {
            Ok(_) => Ok(()),
            Err(FirestoreError::DataConflictError(_)) => Err(StoreError::DuplicateKey {
                collection: collections::USERS,
                key: user.username.clone(),
            }),
            Err(e) => Err(backend(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_url_key_is_stable_hex_digest() {
        let key = offer_url_key("https://jobs.example.com/1");

        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, offer_url_key("https://jobs.example.com/1"));
        assert_ne!(key, offer_url_key("https://jobs.example.com/2"));
    }

    #[test]
    fn test_valid_doc_id_rejects_reserved_ids() {
        assert!(valid_doc_id("0b7c6f8e-5f0e-4f57-9d1b-7a4f1f0e8c11"));
        assert!(valid_doc_id("9999"));
        assert!(valid_doc_id("a.b"));
        assert!(valid_doc_id("__x"));
        assert!(valid_doc_id("___"));

        assert!(!valid_doc_id(""));
        assert!(!valid_doc_id("."));
        assert!(!valid_doc_id(".."));
        assert!(!valid_doc_id("__x__"));
        assert!(!valid_doc_id("____"));
        assert!(!valid_doc_id("a/b"));
        assert!(!valid_doc_id(&"a".repeat(MAX_DOC_ID_BYTES + 1)));
        assert!(valid_doc_id(&"a".repeat(MAX_DOC_ID_BYTES)));
    }

    #[test]
    fn test_user_doc_id_is_always_valid_and_reversible() {
        for username in ["..", ".", "__a__", "____", "a/b", "someUser", "zoë@example.com", "100%"] {
            let doc_id = user_doc_id(username);

            assert!(valid_doc_id(&doc_id), "{username:?} -> {doc_id:?}");
            assert_eq!(urlencoding::decode(&doc_id).unwrap(), username);
        }
    }

    #[test]
    fn test_user_doc_id_fits_longest_registrable_username() {
        // Four-byte characters encode to twelve bytes each.
        let username = "😀".repeat(64);

        assert!(valid_doc_id(&user_doc_id(&username)));
    }

    #[tokio::test]
    async fn test_offline_lookup_of_reserved_id_is_not_found() {
        let db = FirestoreDb::new_mock();

        // Rejected before any request is made, so even the offline client answers.
        assert!(db.find_by_id("..").await.unwrap().is_none());
        assert!(db.find_by_id("__x__").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_offline_client_reports_backend_error() {
        let db = FirestoreDb::new_mock();

        let err = db.find_all().await.unwrap_err();

        assert!(matches!(err, StoreError::Backend(_)));
        assert!(!err.is_duplicate_key());
    }
}
