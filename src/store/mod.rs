// ABOUTME: Encrypted key-value persistence for OAuth state and credentials
// ABOUTME: Stores clients, pending flows, auth codes, and tokens as sealed records in SQLite
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Credential Store
//!
//! Every record type funnels through one encrypted key-value abstraction so
//! that swapping the backing medium never touches OAuth logic. Records are
//! sealed with AES-256-GCM before they reach the database; only the lookup
//! key stays in plaintext to serve as the index.
//!
//! Keys are namespaced by prefix: `client:`, `pending:`, `code:`, `token:`,
//! `upstream:`.

use crate::crypto::RecordCipher;
use crate::errors::{AppError, AppResult};
use crate::oauth2::models::{AuthCode, BearerToken, OAuth2Client, PendingAuth, UpstreamToken};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Key namespace prefixes
pub mod keys {
    /// Registered OAuth clients
    pub const CLIENT: &str = "client:";
    /// Authorization flows awaiting the upstream callback
    pub const PENDING: &str = "pending:";
    /// Proxy-issued single-use authorization codes
    pub const CODE: &str = "code:";
    /// Proxy-issued bearer tokens
    pub const TOKEN: &str = "token:";
    /// Upstream access tokens
    pub const UPSTREAM: &str = "upstream:";
}

/// Durable, encrypted mapping from opaque keys to serialized records.
///
/// The store owns the encryption key for its lifetime; the key is derived
/// once at construction and never persisted. Individual operations are
/// atomic (single SQLite statements); cross-key consistency is not provided.
pub struct CredentialStore {
    pool: SqlitePool,
    cipher: RecordCipher,
}

impl CredentialStore {
    /// Open (or create) the store at the given database URL
    ///
    /// Accepts `sqlite:path/to/tokens.db` or `sqlite::memory:`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be created
    pub async fn new(database_url: &str, cipher: RecordCipher) -> AppResult<Self> {
        let in_memory = database_url.contains(":memory:");

        if !in_memory {
            if let Some(parent) = Path::new(database_url.trim_start_matches("sqlite:")).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| AppError::storage(format!("cannot create data dir: {e}")))?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::storage(format!("invalid database URL: {e}")))?
            .create_if_missing(true);

        // An in-memory SQLite database exists per connection; a pool larger
        // than one would hand out empty databases.
        let max_connections = if in_memory { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS records (
                key        TEXT PRIMARY KEY,
                ciphertext BLOB NOT NULL,
                updated_at INTEGER NOT NULL
            )
            ",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool, cipher })
    }

    // ------------------------------------------------------------------
    // Generic encrypted key-value contract
    // ------------------------------------------------------------------

    /// Serialize, encrypt, and durably write a record, overwriting any
    /// existing record at the same key
    pub async fn put<T: Serialize + Sync>(&self, key: &str, record: &T) -> AppResult<()> {
        let plaintext = serde_json::to_vec(record)?;
        let sealed = self.cipher.seal(&plaintext)?;

        sqlx::query(
            r"
            INSERT INTO records (key, ciphertext, updated_at)
            VALUES ($1, $2, unixepoch())
            ON CONFLICT(key) DO UPDATE SET
                ciphertext = excluded.ciphertext,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(&sealed)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up, decrypt, and deserialize a record
    ///
    /// Returns `Ok(None)` when the key does not exist. A record that exists
    /// but cannot be decrypted with the current secret fails with
    /// `ErrorCode::Decryption`, deliberately distinguishable from absent.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let row = sqlx::query("SELECT ciphertext FROM records WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let sealed: Vec<u8> = row.get("ciphertext");
                Ok(Some(self.decode(key, &sealed)?))
            }
            None => Ok(None),
        }
    }

    /// Remove a record; deleting an absent key is not an error
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM records WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Enumerate keys under a namespace prefix; order is unspecified
    pub async fn list_keys(&self, prefix: &str) -> AppResult<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM records WHERE key LIKE $1")
            .bind(format!("{prefix}%"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("key")).collect())
    }

    /// Atomically remove and return a record.
    ///
    /// Single DELETE..RETURNING statement, so under concurrent attempts on
    /// the same key exactly one caller observes the record. This is what
    /// makes authorization codes single-use.
    pub async fn take<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let row = sqlx::query("DELETE FROM records WHERE key = $1 RETURNING ciphertext")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let sealed: Vec<u8> = row.get("ciphertext");
                Ok(Some(self.decode(key, &sealed)?))
            }
            None => Ok(None),
        }
    }

    fn decode<T: DeserializeOwned>(&self, key: &str, sealed: &[u8]) -> AppResult<T> {
        let plaintext = self.cipher.open(sealed).map_err(|e| {
            tracing::warn!("record {key} unreadable with current secret");
            e
        })?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    // ------------------------------------------------------------------
    // Registered clients (dynamic client registration)
    // ------------------------------------------------------------------

    /// Persist a client registration
    pub async fn store_client(&self, client: &OAuth2Client) -> AppResult<()> {
        self.put(&format!("{}{}", keys::CLIENT, client.client_id), client)
            .await
    }

    /// Fetch a client registration by id
    pub async fn get_client(&self, client_id: &str) -> AppResult<Option<OAuth2Client>> {
        self.get(&format!("{}{client_id}", keys::CLIENT)).await
    }

    /// Enumerate all registered client ids
    pub async fn list_client_ids(&self) -> AppResult<Vec<String>> {
        Ok(self
            .list_keys(keys::CLIENT)
            .await?
            .into_iter()
            .map(|key| key.trim_start_matches(keys::CLIENT).to_owned())
            .collect())
    }

    // ------------------------------------------------------------------
    // Pending authorization flows (authorize -> upstream callback)
    // ------------------------------------------------------------------

    /// Persist a pending flow keyed by the upstream state nonce
    pub async fn store_pending_auth(&self, state: &str, pending: &PendingAuth) -> AppResult<()> {
        self.put(&format!("{}{state}", keys::PENDING), pending).await
    }

    /// Consume the pending flow for an arriving callback; single-use
    pub async fn take_pending_auth(&self, state: &str) -> AppResult<Option<PendingAuth>> {
        self.take(&format!("{}{state}", keys::PENDING)).await
    }

    // ------------------------------------------------------------------
    // Authorization codes
    // ------------------------------------------------------------------

    /// Persist a proxy-issued authorization code
    pub async fn store_auth_code(&self, auth_code: &AuthCode) -> AppResult<()> {
        self.put(&format!("{}{}", keys::CODE, auth_code.code), auth_code)
            .await
    }

    /// Atomically consume an authorization code; at most one caller succeeds
    pub async fn take_auth_code(&self, code: &str) -> AppResult<Option<AuthCode>> {
        self.take(&format!("{}{code}", keys::CODE)).await
    }

    // ------------------------------------------------------------------
    // Bearer tokens
    // ------------------------------------------------------------------

    /// Persist a proxy-issued bearer token
    pub async fn store_bearer_token(&self, token: &BearerToken) -> AppResult<()> {
        self.put(&format!("{}{}", keys::TOKEN, token.token), token)
            .await
    }

    /// Fetch a bearer token record by value
    pub async fn get_bearer_token(&self, token: &str) -> AppResult<Option<BearerToken>> {
        self.get(&format!("{}{token}", keys::TOKEN)).await
    }

    /// Delete a bearer token record; idempotent
    pub async fn delete_bearer_token(&self, token: &str) -> AppResult<()> {
        self.delete(&format!("{}{token}", keys::TOKEN)).await
    }

    // ------------------------------------------------------------------
    // Upstream tokens
    // ------------------------------------------------------------------

    /// Persist an upstream access token record
    pub async fn store_upstream_token(&self, token: &UpstreamToken) -> AppResult<()> {
        self.put(&format!("{}{}", keys::UPSTREAM, token.id), token)
            .await
    }

    /// Fetch an upstream token record by id
    pub async fn get_upstream_token(&self, id: Uuid) -> AppResult<Option<UpstreamToken>> {
        self.get(&format!("{}{id}", keys::UPSTREAM)).await
    }
}
