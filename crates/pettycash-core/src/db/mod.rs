//! Database access layer with connection pooling and migrations
//!
//! A [`Database`] is the session handle for one ledger file. It is opened
//! once by the caller, runs the schema migration on open, and is passed to
//! every operation that touches storage. Dropping it (or calling
//! [`Database::close`]) releases the pool.
//!
//! This module is organized by domain:
//! - `ledger` - Append and read operations on the `petty_cash` relation

use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod ledger;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "PETTYCASH_DB_KEY";

/// Name of the ledger relation
pub const LEDGER_TABLE: &str = "petty_cash";

/// Ledger columns, in storage order
///
/// These names and their order are the on-disk contract shared with existing
/// ledger files.
pub const LEDGER_COLUMNS: [&str; 9] = [
    "日期",
    "姓名",
    "機構摘要",
    "莊交辦摘要",
    "陳交辦摘要",
    "各機構金額",
    "自用金額",
    "總金額",
    "上傳時間",
];

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path. This allows moving/renaming/restoring the database freely.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Fixed application salt - changing this would invalidate all existing encrypted databases
    const APP_SALT: &[u8; 16] = b"pettycash-salt-1";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
    /// Whether connections are keyed with SQLCipher
    encrypted: bool,
    /// Directory holding a throwaway ledger; removed with the last handle
    _scratch: Option<Arc<tempfile::TempDir>>,
}

impl Database {
    /// Open an encrypted ledger
    ///
    /// Requires `PETTYCASH_DB_KEY` environment variable to be set.
    /// The database will be encrypted using SQLCipher with a key derived
    /// from the passphrase via Argon2.
    ///
    /// Returns an error if `PETTYCASH_DB_KEY` is not set. Use `new_unencrypted()`
    /// for a plain SQLite file.
    pub fn new(path: &str) -> Result<Self> {
        let encryption_key = std::env::var(DB_KEY_ENV).ok();
        match encryption_key {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for an unencrypted ledger.",
                DB_KEY_ENV
            ))),
        }
    }

    /// Open an unencrypted ledger
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Open a ledger with an explicit encryption key
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        let pool = if let Some(pass) = passphrase {
            let key = derive_key(pass)?;
            let key_pragma = format!("PRAGMA key = 'x\"{}\"';", key);

            // Use with_init to set the key on every new connection
            let manager = manager.with_init(move |conn| {
                conn.execute_batch(&key_pragma)?;
                Ok(())
            });

            Pool::builder().max_size(4).build(manager)?
        } else {
            Pool::builder().max_size(4).build(manager)?
        };

        let db = Self {
            pool,
            db_path: path.to_string(),
            encrypted: passphrase.is_some(),
            _scratch: None,
        };
        db.initialize_schema()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Note: Uses a file in a temporary directory rather than `:memory:`
    /// because each pooled connection to `:memory:` would see its own empty
    /// database. The directory, with the ledger and its WAL sidecars, is
    /// removed when the last clone of the handle is dropped.
    pub fn in_memory() -> Result<Self> {
        let scratch = tempfile::Builder::new().prefix("pettycash_test_").tempdir()?;
        let path = scratch.path().join("ledger.db");

        let mut db = Self::new_unencrypted(&path.to_string_lossy())?;
        db._scratch = Some(Arc::new(scratch));
        Ok(db)
    }

    /// Whether the ledger was opened with an encryption key
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// End the session, releasing pooled connections
    pub fn close(self) {
        info!("Closing ledger {}", self.db_path);
        drop(self.pool);
    }

    /// Ensure the ledger relation exists
    ///
    /// Idempotent; run once when the handle is opened. The relation has no
    /// key or uniqueness constraint, so importing the same sheet twice stores
    /// the rows twice.
    pub fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block the single writer
            -- Note: creates -wal and -shm sidecar files alongside the database
            PRAGMA journal_mode = WAL;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            -- Store temp tables in memory
            PRAGMA temp_store = MEMORY;

            CREATE TABLE IF NOT EXISTS petty_cash (
                日期 TEXT,
                姓名 TEXT,
                機構摘要 TEXT,
                莊交辦摘要 TEXT,
                陳交辦摘要 TEXT,
                各機構金額 REAL,
                自用金額 REAL,
                總金額 REAL,
                上傳時間 TEXT
            );
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}
