use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub store_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ConnectStoreRequest {
    pub store_url: String,
    pub access_token: String,
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub account_id: String,
}

#[derive(Debug, Serialize)]
pub struct TenantInfoResponse {
    pub account_id: String,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SuggestionsQuery {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertSettingRequest {
    pub product_handle: String,
    #[serde(default)]
    pub variant_title: Option<String>,
    #[serde(default)]
    pub variant_sku: Option<String>,
    #[serde(default)]
    pub preorder_enabled: bool,
    #[serde(default)]
    pub preorder_limit: i64,
    #[serde(default)]
    pub preorder_text: String,
}
