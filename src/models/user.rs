//! User model for storage.

use serde::{Deserialize, Serialize};

/// Registered user stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Login name (also used, URL-encoded, as document ID)
    pub username: String,
    /// PBKDF2 hash in `pbkdf2-sha256$<rounds>$<salt>$<hash>` form
    pub password_hash: String,
    /// When the user registered (RFC 3339)
    pub created_at: String,
}
