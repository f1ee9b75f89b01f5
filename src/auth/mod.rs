mod middleware;
mod password;
mod session;

pub use middleware::{AuthError, RequireTenant};
pub use password::{hash_password, verify_password};
pub use session::{
    SESSION_COOKIE, SESSION_TTL_SECONDS, TenantContext, TenantIdentity, clear_session_cookie,
    generate_session_token, resolve_session, session_cookie, session_token_from_cookie_header,
};
