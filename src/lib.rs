//! # Prestock
//!
//! A multi-tenant preorder dashboard server, usable both as a standalone
//! binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! prestock = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use prestock::server::{AppState, create_router};
//! use prestock::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/prestock.db")).unwrap();
//! store.migrate().unwrap();
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CLI binary. Disable with `default-features = false`.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod products;
pub mod server;
pub mod store;
pub mod types;
