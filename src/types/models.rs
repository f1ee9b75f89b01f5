use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Variant title stored when a variant has no title of its own.
pub const DEFAULT_VARIANT_TITLE: &str = "Default";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(skip)]
    pub token: String,
    pub account_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Session row joined to the owning account and its store connection,
/// as returned by a validity lookup.
#[derive(Debug, Clone)]
pub struct SessionWithAccount {
    pub token: String,
    pub account_id: String,
    pub expires_at: DateTime<Utc>,
    pub email: String,
    pub display_name: String,
    pub store_url: Option<String>,
    pub access_token: Option<String>,
}

/// One external-platform connection per account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConnection {
    pub account_id: String,
    pub store_url: String,
    #[serde(skip)]
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One persisted preorder setting for one (account, product, variant) triple.
/// Uniqueness key is (account_id, product_handle, variant_title).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreorderSetting {
    pub account_id: String,
    pub product_handle: String,
    pub variant_title: String,
    pub variant_sku: String,
    pub is_preorder_enabled: bool,
    pub preorder_limit: i64,
    pub preorder_text: String,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
