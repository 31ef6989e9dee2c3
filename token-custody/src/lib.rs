//! # token-custody
//!
//! Server-side custody of per-user OAuth access tokens.
//!
//! In a backend-for-frontend deployment the browser never holds tokens; a
//! server-side component keeps them and attaches them to outbound API calls.
//! This crate is that component's token store: a per-subject cache of
//! access/refresh tokens keyed by the principal's stable identifier.
//!
//! ## Features
//!
//! - **One interface, two backends**: [`UserTokenStore`] with an in-memory
//!   implementation and a SQLite-backed one, selected by deployment
//!   configuration
//! - **Write-through caching**: the durable variant serves reads from memory
//!   and falls back to the database on a miss
//! - **Safe under concurrent refresh**: mutations and miss-path reads for a
//!   subject are serialized, so simultaneous token refreshes cannot lose
//!   updates
//! - **Lazy setup**: the database connection is opened and the schema created
//!   on first use, not at process start
//!
//! ## Example
//!
//! ```rust,no_run
//! use token_custody::{SqliteStoreConfig, SqliteTokenStore, TokenRecord, UserTokenStore};
//!
//! # async fn example() -> token_custody::Result<()> {
//! let store = SqliteTokenStore::new(SqliteStoreConfig::from_env());
//!
//! // login callback: keep the tokens the identity layer handed us
//! let expiration = chrono::Utc::now() + chrono::Duration::seconds(3600);
//! let record = TokenRecord::new("alice", "at-123", expiration).with_refresh_token("rt-456");
//! store.store(record).await?;
//!
//! // outbound API call: read through the cache
//! if let Some(token) = store.get("alice").await? {
//!     assert!(!token.is_expired());
//! }
//!
//! // logout
//! store.clear("alice").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;
pub mod token;

pub use config::SqliteStoreConfig;
pub use error::{Error, Result};
pub use memory::MemoryTokenStore;
pub use sqlite::SqliteTokenStore;
pub use store::UserTokenStore;
pub use token::TokenRecord;
