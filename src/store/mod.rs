mod schema;
mod sqlite;

pub use schema::MIGRATIONS;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Every read and write of tenant-owned data takes the owning account id;
/// there is no unscoped variant of any per-tenant query.
pub trait Store: Send + Sync {
    /// Applies any pending schema migrations.
    fn migrate(&self) -> Result<()>;

    /// Returns the highest applied migration version, 0 if none.
    fn schema_version(&self) -> Result<i64>;

    // Account operations
    fn create_account(&self, account: &Account) -> Result<()>;
    fn get_account(&self, id: &str) -> Result<Option<Account>>;
    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>>;
    fn account_email_exists(&self, email: &str) -> Result<bool>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn find_valid_session(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionWithAccount>>;
    fn delete_session(&self, token: &str) -> Result<()>;
    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize>;

    // Store connection operations
    fn upsert_connection(&self, connection: &StoreConnection) -> Result<()>;
    fn get_connection_by_account(&self, account_id: &str) -> Result<Option<StoreConnection>>;
    fn get_connection_by_url(&self, store_url: &str) -> Result<Option<StoreConnection>>;

    // Preorder setting operations
    fn upsert_preorder_setting(&self, setting: &PreorderSetting) -> Result<()>;
    fn list_preorder_settings(&self, account_id: &str) -> Result<Vec<PreorderSetting>>;
    fn delete_preorder_settings(&self, account_id: &str) -> Result<usize>;

    fn close(&self) -> Result<()>;
}

/// Ensures a store URL carries an explicit scheme prefix.
#[must_use]
pub fn normalize_store_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("https://") || url.starts_with("http://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_scheme() {
        assert_eq!(
            normalize_store_url("my-shop.myshopify.com"),
            "https://my-shop.myshopify.com"
        );
    }

    #[test]
    fn test_normalize_keeps_existing_scheme() {
        assert_eq!(
            normalize_store_url("https://my-shop.myshopify.com"),
            "https://my-shop.myshopify.com"
        );
        assert_eq!(
            normalize_store_url("http://localhost:8081"),
            "http://localhost:8081"
        );
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        assert_eq!(
            normalize_store_url("  my-shop.myshopify.com "),
            "https://my-shop.myshopify.com"
        );
    }
}
