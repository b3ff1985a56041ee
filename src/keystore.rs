//! API key persistence backed by a single SQLite table.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;

use crate::config::constants::API_KEY_LENGTH;
use crate::error::Result;

/// Stored API key and its usage metadata
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKeyRecord {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    pub is_active: bool,
}

/// How long an unused key stays valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyPolicy {
    /// Reject keys whose last use is older than the window
    pub strict_recency: bool,
    pub window_days: i64,
}

impl Default for RecencyPolicy {
    fn default() -> Self {
        Self {
            strict_recency: true,
            window_days: 30,
        }
    }
}

impl RecencyPolicy {
    /// Whether a key last used at `last_used` is stale at `now`
    pub fn is_expired(&self, last_used: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.strict_recency && now - last_used > Duration::days(self.window_days)
    }
}

#[derive(Debug, Clone)]
pub struct KeyStore {
    pool: SqlitePool,
    policy: RecencyPolicy,
}

impl KeyStore {
    /// Open (creating if needed) the database file and ensure the schema exists
    pub async fn open<P: AsRef<Path>>(path: P, policy: RecencyPolicy) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool, policy };
        store.initialize().await?;

        tracing::info!(path = %path.as_ref().display(), "API key store ready");

        Ok(store)
    }

    pub fn policy(&self) -> RecencyPolicy {
        self.policy
    }

    /// Create the api_keys table if it does not exist yet
    pub async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS api_keys (
                key TEXT PRIMARY KEY,
                created_at TIMESTAMP,
                last_used TIMESTAMP,
                is_active BOOLEAN
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Generate, persist and return a fresh key
    pub async fn issue_key(&self) -> Result<String> {
        let key = generate_key();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO api_keys (key, created_at, last_used, is_active)
            VALUES (?, ?, ?, 1)
            "#,
        )
        .bind(&key)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            key_fingerprint = %fingerprint(&key),
            "Issued new API key"
        );

        Ok(key)
    }

    /// Check a presented key and record its use
    ///
    /// Returns false for unknown, inactive or (under a strict policy) stale keys.
    pub async fn validate_and_touch(&self, key: &str) -> Result<bool> {
        self.validate_and_touch_at(key, Utc::now()).await
    }

    pub(crate) async fn validate_and_touch_at(&self, key: &str, now: DateTime<Utc>) -> Result<bool> {
        let record = match self.get(key).await? {
            Some(record) => record,
            None => return Ok(false),
        };

        if !record.is_active {
            tracing::debug!(key_fingerprint = %fingerprint(key), "Rejected inactive API key");
            return Ok(false);
        }

        if self.policy.is_expired(record.last_used, now) {
            tracing::debug!(
                key_fingerprint = %fingerprint(key),
                last_used = %record.last_used,
                window_days = self.policy.window_days,
                "Rejected stale API key"
            );
            return Ok(false);
        }

        // Concurrent touches race benignly: the latest timestamp wins
        sqlx::query("UPDATE api_keys SET last_used = ? WHERE key = ?")
            .bind(now)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(true)
    }

    /// Look up a key record
    pub async fn get(&self, key: &str) -> Result<Option<ApiKeyRecord>> {
        let record = sqlx::query_as::<_, ApiKeyRecord>(
            r#"
            SELECT key, created_at, last_used, is_active
            FROM api_keys
            WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Activate or revoke a key. Returns false if the key does not exist.
    pub async fn set_active(&self, key: &str, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE api_keys SET is_active = ? WHERE key = ?")
            .bind(active)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Random URL-safe token drawn from the operating system's CSPRNG
fn generate_key() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(API_KEY_LENGTH)
        .map(char::from)
        .collect()
}

/// Short, non-reversible identifier of a key for log lines
pub fn fingerprint(key: &str) -> String {
    format!("{:x}", md5::compute(key.as_bytes()))
        .chars()
        .take(8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_store(policy: RecencyPolicy) -> (TempDir, KeyStore) {
        let dir = TempDir::new().unwrap();
        let store = KeyStore::open(dir.path().join("keys.db"), policy)
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_open_creates_database_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh.db");
        assert!(!path.exists());

        let _store = KeyStore::open(&path, RecencyPolicy::default()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (_dir, store) = open_store(RecencyPolicy::default()).await;
        store.initialize().await.unwrap();
        store.initialize().await.unwrap();
    }

    #[tokio::test]
    async fn test_reopen_keeps_existing_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys.db");

        let key = {
            let store = KeyStore::open(&path, RecencyPolicy::default()).await.unwrap();
            let key = store.issue_key().await.unwrap();
            store.close().await;
            key
        };

        let store = KeyStore::open(&path, RecencyPolicy::default()).await.unwrap();
        assert!(store.validate_and_touch(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_issued_keys_are_distinct_and_url_safe() {
        let (_dir, store) = open_store(RecencyPolicy::default()).await;

        let first = store.issue_key().await.unwrap();
        let second = store.issue_key().await.unwrap();

        assert_ne!(first, second);
        assert_eq!(first.len(), API_KEY_LENGTH);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn test_issued_key_validates_immediately() {
        let (_dir, store) = open_store(RecencyPolicy::default()).await;

        let key = store.issue_key().await.unwrap();
        assert!(store.validate_and_touch(&key).await.unwrap());

        let record = store.get(&key).await.unwrap().unwrap();
        assert!(record.is_active);
        assert!(record.last_used >= record.created_at);
    }

    #[tokio::test]
    async fn test_unknown_key_rejected() {
        let (_dir, store) = open_store(RecencyPolicy::default()).await;
        assert!(!store.validate_and_touch("no-such-key").await.unwrap());
    }

    #[tokio::test]
    async fn test_inactive_key_rejected() {
        let (_dir, store) = open_store(RecencyPolicy::default()).await;

        let key = store.issue_key().await.unwrap();
        assert!(store.set_active(&key, false).await.unwrap());
        assert!(!store.validate_and_touch(&key).await.unwrap());

        assert!(store.set_active(&key, true).await.unwrap());
        assert!(store.validate_and_touch(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_active_unknown_key() {
        let (_dir, store) = open_store(RecencyPolicy::default()).await;
        assert!(!store.set_active("missing", false).await.unwrap());
    }

    #[tokio::test]
    async fn test_validation_updates_last_used() {
        let (_dir, store) = open_store(RecencyPolicy::default()).await;

        let key = store.issue_key().await.unwrap();
        let later = Utc::now() + Duration::days(1);

        assert!(store.validate_and_touch_at(&key, later).await.unwrap());

        let record = store.get(&key).await.unwrap().unwrap();
        assert_eq!(record.last_used.timestamp(), later.timestamp());
    }

    #[tokio::test]
    async fn test_strict_recency_rejects_stale_key() {
        let (_dir, store) = open_store(RecencyPolicy::default()).await;

        let key = store.issue_key().await.unwrap();
        let stale = Utc::now() - Duration::days(31);
        sqlx::query("UPDATE api_keys SET last_used = ? WHERE key = ?")
            .bind(stale)
            .bind(&key)
            .execute(&store.pool)
            .await
            .unwrap();

        assert!(!store.validate_and_touch(&key).await.unwrap());

        // Still marked active, and the failed attempt did not refresh it
        let record = store.get(&key).await.unwrap().unwrap();
        assert!(record.is_active);
        assert_eq!(record.last_used.timestamp(), stale.timestamp());
    }

    #[tokio::test]
    async fn test_relaxed_recency_accepts_stale_key() {
        let policy = RecencyPolicy {
            strict_recency: false,
            window_days: 30,
        };
        let (_dir, store) = open_store(policy).await;

        let key = store.issue_key().await.unwrap();
        let far_future = Utc::now() + Duration::days(365);

        assert!(store.validate_and_touch_at(&key, far_future).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_validations_keep_record_intact() {
        let (_dir, store) = open_store(RecencyPolicy::default()).await;
        let key = store.issue_key().await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let key = key.clone();
            tasks.push(tokio::spawn(async move {
                store.validate_and_touch(&key).await
            }));
        }

        for task in tasks {
            assert!(task.await.unwrap().unwrap());
        }

        let record = store.get(&key).await.unwrap().unwrap();
        assert!(record.is_active);
    }

    #[test]
    fn test_recency_policy_window() {
        let policy = RecencyPolicy::default();
        let now = Utc::now();

        assert!(!policy.is_expired(now - Duration::days(29), now));
        assert!(policy.is_expired(now - Duration::days(31), now));
    }

    #[test]
    fn test_fingerprint_is_short_and_stable() {
        let a = fingerprint("secret-api-key");
        let b = fingerprint("secret-api-key");
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert_ne!(a, fingerprint("other-key"));
    }
}
