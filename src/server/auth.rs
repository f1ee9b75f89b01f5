use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{
        HeaderMap, StatusCode,
        header::{COOKIE, SET_COOKIE},
    },
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::{
    RequireTenant, SESSION_TTL_SECONDS, clear_session_cookie, generate_session_token,
    hash_password, session_cookie, session_token_from_cookie_header, verify_password,
};
use crate::server::AppState;
use crate::server::dto::{ConnectStoreRequest, LoginRequest, SignupRequest, SignupResponse, TenantInfoResponse};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{
    validate_email, validate_password, validate_store_name, validate_store_url,
};
use crate::store::Store;
use crate::types::{Account, Session, StoreConnection};

pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/connect", post(connect_store))
}

fn start_session(store: &dyn Store, account_id: &str) -> Result<String, ApiError> {
    let now = Utc::now();
    let session = Session {
        token: generate_session_token(),
        account_id: account_id.to_string(),
        expires_at: now + Duration::seconds(SESSION_TTL_SECONDS),
        created_at: now,
    };
    store
        .create_session(&session)
        .api_err("Failed to create session")?;
    Ok(session_cookie(&session.token))
}

async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> impl IntoResponse {
    validate_email(&req.email)?;
    validate_password(&req.password)?;
    validate_store_name(&req.store_name)?;

    let store = state.store.as_ref();

    if store
        .account_email_exists(&req.email)
        .api_err("Failed to check email")?
    {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let account = Account {
        id: Uuid::new_v4().to_string(),
        email: req.email,
        password_hash: hash_password(&req.password),
        display_name: req.store_name,
        created_at: Utc::now(),
    };

    // Two signups can both pass the existence check; the UNIQUE index on
    // email decides the winner and surfaces here as a Conflict
    store.create_account(&account)?;

    let cookie = start_session(store, &account.id)?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        [(SET_COOKIE, cookie)],
        Json(ApiResponse::success(SignupResponse {
            account_id: account.id,
        })),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    // Unknown email and wrong password are indistinguishable to the caller
    let account = store
        .get_account_by_email(&req.email)
        .api_err("Failed to look up account")?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&req.password, &account.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let cookie = start_session(store, &account.id)?;
    let connection = store
        .get_connection_by_account(&account.id)
        .api_err("Failed to look up connection")?;

    Ok::<_, ApiError>((
        [(SET_COOKIE, cookie)],
        Json(ApiResponse::success(TenantInfoResponse {
            account_id: account.id,
            email: account.email,
            display_name: account.display_name,
            store_url: connection.map(|c| c.store_url),
        })),
    ))
}

async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let cookie_header = headers.get(COOKIE).and_then(|h| h.to_str().ok());
    if let Some(token) = session_token_from_cookie_header(cookie_header) {
        state
            .store
            .delete_session(&token)
            .api_err("Failed to delete session")?;
    }

    Ok::<_, ApiError>((
        [(SET_COOKIE, clear_session_cookie())],
        Json(ApiResponse::success(())),
    ))
}

async fn me(auth: RequireTenant, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tenant = &auth.0;

    let account = state
        .store
        .get_account(&tenant.account_id)
        .api_err("Failed to look up account")?
        .or_not_found("Account not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(TenantInfoResponse {
        account_id: account.id,
        email: account.email,
        display_name: account.display_name,
        store_url: tenant.store_url.clone(),
    })))
}

async fn connect_store(
    auth: RequireTenant,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConnectStoreRequest>,
) -> impl IntoResponse {
    validate_store_url(&req.store_url)?;
    if req.access_token.trim().is_empty() {
        return Err(ApiError::bad_request("Access token cannot be empty"));
    }

    let store = state.store.as_ref();
    store.upsert_connection(&StoreConnection {
        account_id: auth.0.account_id.clone(),
        store_url: req.store_url,
        access_token: req.access_token,
        webhook_secret: req.webhook_secret,
        created_at: Utc::now(),
    })?;

    let connection = store
        .get_connection_by_account(&auth.0.account_id)
        .api_err("Failed to read back connection")?
        .or_not_found("Connection not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(connection)))
}
