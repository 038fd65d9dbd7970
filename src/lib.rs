//! # Relstore
//!
//! A release registry: projects, their releases, target platforms and files,
//! with per-file download counters. File bytes are served by a front web
//! server; relstore answers each download with an `X-Accel-Redirect`.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use relstore::config::ServerConfig;
//! use relstore::server::{AppState, create_router};
//! use relstore::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), &config));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the admin CLI module. Disable with `default-features = false`.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod delivery;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
