//! Simulated session-layer wiring around the SQLite token store.
//!
//! Walks the token lifecycle the way an authentication front-end drives it:
//! store on login, read through the cache for API calls, survive a restart,
//! clear on logout.
//!
//! Run with:
//! ```
//! cargo run --example login_flow
//! ```

use anyhow::Result;
use chrono::{Duration, Utc};
use token_custody::{SqliteStoreConfig, SqliteTokenStore, TokenRecord, UserTokenStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "token_custody=debug,info".parse().unwrap()),
        )
        .init();

    let config = SqliteStoreConfig::from_env();
    let store = SqliteTokenStore::new(config.clone());

    // login callback: the identity layer hands us fresh credentials
    let expiration = Utc::now() + Duration::seconds(3600);
    let record = TokenRecord::new("alice", "tok-A", expiration).with_refresh_token("ref-A");
    store.store(record).await?;

    // outbound API call: read through the cache
    if let Some(token) = store.get("alice").await? {
        tracing::info!(
            "calling downstream API as alice with bearer {} (refresh soon: {})",
            token.access_token,
            token.needs_refresh(5)
        );
    }

    // process restart: a fresh store over the same file repopulates from disk
    store.close().await;
    let store = SqliteTokenStore::new(config);
    let token = store
        .get("alice")
        .await?
        .expect("token should survive a restart");
    tracing::info!("after restart: bearer {} still available", token.access_token);

    // logout
    store.clear("alice").await?;
    assert!(store.get("alice").await?.is_none());
    tracing::info!("alice logged out, token gone");

    store.close().await;
    Ok(())
}
