mod auth;
pub mod dto;
mod products;
pub mod response;
mod router;
pub mod validation;

pub use auth::auth_router;
pub use products::products_router;
pub use router::{AppState, create_router};
