use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use crate::auth::{RequireTenant, TenantIdentity};
use crate::catalog::{CatalogClient, VariantUpdate};
use crate::products::{build_product_view, import_csv};
use crate::server::AppState;
use crate::server::dto::{ProductsQuery, SuggestionsQuery, UpsertSettingRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::types::PreorderSetting;

/// Suggestion queries shorter than this return an empty list without
/// touching the catalog.
const MIN_SUGGESTION_QUERY_LEN: usize = 2;

pub fn products_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/import", post(import_products_csv))
        .route("/products/settings", post(upsert_setting))
        .route("/products/live", get(live_products))
        .route("/products/suggestions", get(suggestions))
        .route("/products/flags", post(push_flags))
}

/// Builds a catalog client from the tenant's connection, or rejects when no
/// store has been connected yet.
fn catalog_for(tenant: &TenantIdentity) -> Result<CatalogClient, ApiError> {
    match (&tenant.store_url, &tenant.access_token) {
        (Some(url), Some(token)) => Ok(CatalogClient::new(url, token)),
        _ => Err(ApiError::bad_request(
            "No store connected - connect a store first",
        )),
    }
}

async fn list_products(
    auth: RequireTenant,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProductsQuery>,
) -> impl IntoResponse {
    let rows = state
        .store
        .list_preorder_settings(&auth.0.account_id)
        .api_err("Failed to list preorder settings")?;

    let search = params.search.as_deref().unwrap_or("");
    let view = build_product_view(&rows, search);

    Ok::<_, ApiError>(Json(ApiResponse::success(view)))
}

async fn import_products_csv(
    auth: RequireTenant,
    State(state): State<Arc<AppState>>,
    body: String,
) -> impl IntoResponse {
    let report = import_csv(state.store.as_ref(), &auth.0.account_id, &body, Utc::now())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(report)))
}

async fn upsert_setting(
    auth: RequireTenant,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpsertSettingRequest>,
) -> impl IntoResponse {
    if req.product_handle.trim().is_empty() {
        return Err(ApiError::bad_request("Product handle cannot be empty"));
    }

    let now = Utc::now();
    state
        .store
        .upsert_preorder_setting(&PreorderSetting {
            account_id: auth.0.account_id.clone(),
            product_handle: req.product_handle.trim().to_string(),
            variant_title: req.variant_title.unwrap_or_default(),
            variant_sku: req.variant_sku.unwrap_or_default(),
            is_preorder_enabled: req.preorder_enabled,
            preorder_limit: req.preorder_limit,
            preorder_text: req.preorder_text,
            last_updated: now,
            created_at: now,
        })
        .api_err("Failed to save preorder setting")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(())))
}

async fn live_products(
    auth: RequireTenant,
    Query(params): Query<ProductsQuery>,
) -> impl IntoResponse {
    let catalog = catalog_for(&auth.0)?;
    let products = catalog.fetch_products(params.search.as_deref()).await?;
    Ok::<_, ApiError>(Json(ApiResponse::success(products)))
}

async fn suggestions(
    auth: RequireTenant,
    Query(params): Query<SuggestionsQuery>,
) -> impl IntoResponse {
    let term = params.q.unwrap_or_default();
    let term = term.trim();
    if term.len() < MIN_SUGGESTION_QUERY_LEN {
        return Ok(Json(ApiResponse::success(Vec::new())));
    }

    let catalog = catalog_for(&auth.0)?;
    let hits = catalog.search_suggestions(term).await?;
    Ok::<_, ApiError>(Json(ApiResponse::success(hits)))
}

async fn push_flags(
    auth: RequireTenant,
    Json(updates): Json<Vec<VariantUpdate>>,
) -> impl IntoResponse {
    if updates.is_empty() {
        return Err(ApiError::bad_request("No updates provided"));
    }

    let catalog = catalog_for(&auth.0)?;
    catalog.push_variant_updates(&updates).await?;
    Ok::<_, ApiError>(Json(ApiResponse::success(())))
}
