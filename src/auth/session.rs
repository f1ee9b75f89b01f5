use chrono::{DateTime, Utc};
use rand::Rng;

use crate::store::Store;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Session lifetime from creation, in seconds.
pub const SESSION_TTL_SECONDS: i64 = 86400;

const TOKEN_BYTES: usize = 16;

/// The result of resolving an inbound session token.
///
/// Every lookup failure collapses to `Invalid`: a missing cookie, an unknown
/// token and an expired token are indistinguishable to the caller, so the
/// response can't be used as a token-guessing oracle.
#[derive(Debug, Clone)]
pub enum TenantContext {
    Invalid,
    Valid(TenantIdentity),
}

/// The validated tenant a request acts on behalf of.
#[derive(Debug, Clone)]
pub struct TenantIdentity {
    pub account_id: String,
    pub email: String,
    pub store_url: Option<String>,
    pub access_token: Option<String>,
}

/// Generates an opaque session token with 128 bits of entropy.
#[must_use]
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Builds the Set-Cookie value for a fresh session.
#[must_use]
pub fn session_cookie(token: &str) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={SESSION_TTL_SECONDS}"
    )
}

/// Builds the Set-Cookie value that clears the session cookie.
#[must_use]
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
}

/// Extracts the session token from a Cookie header, if present.
#[must_use]
pub fn session_token_from_cookie_header(header: Option<&str>) -> Option<String> {
    let header = header?;
    header.split(';').find_map(|cookie| {
        cookie
            .trim()
            .strip_prefix(SESSION_COOKIE)?
            .strip_prefix('=')
            .map(str::to_string)
    })
}

/// Resolves an inbound token to a tenant context. Read-only and infallible:
/// store failures degrade to `Invalid` like any other lookup miss.
pub fn resolve_session(
    store: &dyn Store,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> TenantContext {
    let Some(token) = token else {
        return TenantContext::Invalid;
    };

    match store.find_valid_session(token, now) {
        Ok(Some(session)) => TenantContext::Valid(TenantIdentity {
            account_id: session.account_id,
            email: session.email,
            store_url: session.store_url,
            access_token: session.access_token,
        }),
        Ok(None) => TenantContext::Invalid,
        Err(e) => {
            tracing::warn!("session lookup failed: {e}");
            TenantContext::Invalid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::types::{Account, Session};
    use chrono::Duration;
    use tempfile::TempDir;

    fn store_with_session(expires_in: Duration) -> (TempDir, SqliteStore, String) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.migrate().unwrap();

        let now = Utc::now();
        store
            .create_account(&Account {
                id: "acc-1".to_string(),
                email: "owner@example.com".to_string(),
                password_hash: "a".repeat(64),
                display_name: "Test Shop".to_string(),
                created_at: now,
            })
            .unwrap();

        let token = generate_session_token();
        store
            .create_session(&Session {
                token: token.clone(),
                account_id: "acc-1".to_string(),
                expires_at: now + expires_in,
                created_at: now,
            })
            .unwrap();

        (temp, store, token)
    }

    #[test]
    fn test_token_is_128_bit_hex() {
        let token = generate_session_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_session_token());
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("abc123");
        assert!(cookie.starts_with("session=abc123; "));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=86400"));
    }

    #[test]
    fn test_token_from_cookie_header() {
        assert_eq!(
            session_token_from_cookie_header(Some("session=abc123")),
            Some("abc123".to_string())
        );
        assert_eq!(
            session_token_from_cookie_header(Some("theme=dark; session=abc123; lang=en")),
            Some("abc123".to_string())
        );
        assert_eq!(session_token_from_cookie_header(Some("theme=dark")), None);
        assert_eq!(session_token_from_cookie_header(None), None);
    }

    #[test]
    fn test_resolve_valid_session() {
        let (_temp, store, token) = store_with_session(Duration::hours(1));

        let context = resolve_session(&store, Some(&token), Utc::now());
        match context {
            TenantContext::Valid(identity) => {
                assert_eq!(identity.account_id, "acc-1");
                assert_eq!(identity.email, "owner@example.com");
                assert!(identity.store_url.is_none());
            }
            TenantContext::Invalid => panic!("expected valid context"),
        }
    }

    #[test]
    fn test_resolve_expired_session_is_invalid() {
        let (_temp, store, token) = store_with_session(Duration::seconds(-1));
        let context = resolve_session(&store, Some(&token), Utc::now());
        assert!(matches!(context, TenantContext::Invalid));
    }

    #[test]
    fn test_resolve_missing_and_unknown_tokens_are_invalid() {
        let (_temp, store, _token) = store_with_session(Duration::hours(1));
        assert!(matches!(
            resolve_session(&store, None, Utc::now()),
            TenantContext::Invalid
        ));
        assert!(matches!(
            resolve_session(&store, Some("not-a-token"), Utc::now()),
            TenantContext::Invalid
        ));
    }
}
