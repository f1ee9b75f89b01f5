use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::{MIGRATIONS, Store, normalize_store_url};
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl Store for SqliteStore {
    fn migrate(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 = conn.query_row(
            "SELECT IFNULL(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i64;
            if version <= current {
                continue;
            }
            conn.execute_batch(&format!("BEGIN;\n{migration}\nCOMMIT;"))?;
            conn.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, format_datetime(&Utc::now())],
            )?;
            tracing::info!("applied schema migration v{version}");
        }
        Ok(())
    }

    fn schema_version(&self) -> Result<i64> {
        let conn = self.conn();
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations')",
            [],
            |row| row.get(0),
        )?;
        if !exists {
            return Ok(0);
        }
        conn.query_row(
            "SELECT IFNULL(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(Error::from)
    }

    // Account operations

    fn create_account(&self, account: &Account) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO accounts (id, email, password_hash, display_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                account.id,
                account.email,
                account.password_hash,
                account.display_name,
                format_datetime(&account.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            // The UNIQUE index on email is the authoritative duplicate signal;
            // the caller's existence check is only advisory
            Err(e) if is_constraint_violation(&e) => {
                Err(Error::Conflict("email already registered".to_string()))
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_account(&self, id: &str) -> Result<Option<Account>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, email, password_hash, display_name, created_at
             FROM accounts WHERE id = ?1",
            params![id],
            |row| {
                Ok(Account {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    password_hash: row.get(2)?,
                    display_name: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, email, password_hash, display_name, created_at
             FROM accounts WHERE email = ?1",
            params![email],
            |row| {
                Ok(Account {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    password_hash: row.get(2)?,
                    display_name: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn account_email_exists(&self, email: &str) -> Result<bool> {
        let conn = self.conn();
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = ?1)",
            params![email],
            |row| row.get(0),
        )
        .map_err(Error::from)
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        self.conn().execute(
            "INSERT INTO sessions (token, account_id, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token,
                session.account_id,
                format_datetime(&session.expires_at),
                format_datetime(&session.created_at),
            ],
        )?;
        Ok(())
    }

    fn find_valid_session(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionWithAccount>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT s.token, s.account_id, s.expires_at, a.email, a.display_name,
                    c.store_url, c.access_token
             FROM sessions s
             JOIN accounts a ON s.account_id = a.id
             LEFT JOIN connections c ON c.account_id = a.id
             WHERE s.token = ?1 AND s.expires_at > ?2",
            params![token, format_datetime(&now)],
            |row| {
                Ok(SessionWithAccount {
                    token: row.get(0)?,
                    account_id: row.get(1)?,
                    expires_at: parse_datetime(&row.get::<_, String>(2)?),
                    email: row.get(3)?,
                    display_name: row.get(4)?,
                    store_url: row.get(5)?,
                    access_token: row.get(6)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_session(&self, token: &str) -> Result<()> {
        // Deleting an absent token is not an error
        self.conn()
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(())
    }

    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let rows = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![format_datetime(&now)],
        )?;
        Ok(rows)
    }

    // Store connection operations

    fn upsert_connection(&self, connection: &StoreConnection) -> Result<()> {
        let store_url = normalize_store_url(&connection.store_url);

        let result = self.conn().execute(
            "INSERT INTO connections (account_id, store_url, access_token, webhook_secret, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (account_id) DO UPDATE SET
                store_url = excluded.store_url,
                access_token = excluded.access_token,
                webhook_secret = excluded.webhook_secret",
            params![
                connection.account_id,
                store_url,
                connection.access_token,
                connection.webhook_secret,
                format_datetime(&connection.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::Conflict(
                "store is already connected to another account".to_string(),
            )),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_connection_by_account(&self, account_id: &str) -> Result<Option<StoreConnection>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT account_id, store_url, access_token, webhook_secret, created_at
             FROM connections WHERE account_id = ?1",
            params![account_id],
            |row| {
                Ok(StoreConnection {
                    account_id: row.get(0)?,
                    store_url: row.get(1)?,
                    access_token: row.get(2)?,
                    webhook_secret: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_connection_by_url(&self, store_url: &str) -> Result<Option<StoreConnection>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT account_id, store_url, access_token, webhook_secret, created_at
             FROM connections WHERE store_url = ?1",
            params![store_url],
            |row| {
                Ok(StoreConnection {
                    account_id: row.get(0)?,
                    store_url: row.get(1)?,
                    access_token: row.get(2)?,
                    webhook_secret: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    // Preorder setting operations

    fn upsert_preorder_setting(&self, setting: &PreorderSetting) -> Result<()> {
        let variant_title = if setting.variant_title.trim().is_empty() {
            DEFAULT_VARIANT_TITLE
        } else {
            setting.variant_title.trim()
        };
        let limit = setting.preorder_limit.max(0);

        // ON CONFLICT DO UPDATE keeps the original rowid and created_at, so
        // repeated replacements don't reorder the fetch sequence
        self.conn().execute(
            "INSERT INTO preorder_settings
                (account_id, product_handle, variant_title, variant_sku,
                 is_preorder_enabled, preorder_limit, preorder_text, last_updated, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (account_id, product_handle, variant_title) DO UPDATE SET
                variant_sku = excluded.variant_sku,
                is_preorder_enabled = excluded.is_preorder_enabled,
                preorder_limit = excluded.preorder_limit,
                preorder_text = excluded.preorder_text,
                last_updated = excluded.last_updated",
            params![
                setting.account_id,
                setting.product_handle,
                variant_title,
                setting.variant_sku,
                setting.is_preorder_enabled,
                limit,
                setting.preorder_text,
                format_datetime(&setting.last_updated),
                format_datetime(&setting.created_at),
            ],
        )?;
        Ok(())
    }

    fn list_preorder_settings(&self, account_id: &str) -> Result<Vec<PreorderSetting>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT account_id, product_handle, variant_title, variant_sku,
                    is_preorder_enabled, preorder_limit, preorder_text, last_updated, created_at
             FROM preorder_settings WHERE account_id = ?1 ORDER BY rowid",
        )?;

        let rows = stmt.query_map(params![account_id], |row| {
            Ok(PreorderSetting {
                account_id: row.get(0)?,
                product_handle: row.get(1)?,
                variant_title: row.get(2)?,
                variant_sku: row.get(3)?,
                is_preorder_enabled: row.get(4)?,
                preorder_limit: row.get(5)?,
                preorder_text: row.get(6)?,
                last_updated: parse_datetime(&row.get::<_, String>(7)?),
                created_at: parse_datetime(&row.get::<_, String>(8)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_preorder_settings(&self, account_id: &str) -> Result<usize> {
        let rows = self.conn().execute(
            "DELETE FROM preorder_settings WHERE account_id = ?1",
            params![account_id],
        )?;
        Ok(rows)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
