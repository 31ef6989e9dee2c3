use crate::error::{Error, Result};
use crate::store::UserTokenStore;
use crate::token::TokenRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory token store.
///
/// Tokens do not survive a process restart and the store does not scale past
/// a single instance; use [`crate::SqliteTokenStore`] when either matters.
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    tokens: Arc<RwLock<HashMap<String, TokenRecord>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserTokenStore for MemoryTokenStore {
    async fn get(&self, subject: &str) -> Result<Option<TokenRecord>> {
        if subject.is_empty() {
            return Err(Error::InvalidSubject);
        }
        tracing::trace!("get token for {}", subject);
        Ok(self.tokens.read().unwrap().get(subject).cloned())
    }

    async fn store(&self, record: TokenRecord) -> Result<()> {
        if record.subject.is_empty() {
            return Err(Error::InvalidSubject);
        }
        tracing::debug!("store token for {}", record.subject);
        self.tokens
            .write()
            .unwrap()
            .insert(record.subject.clone(), record);
        Ok(())
    }

    async fn clear(&self, subject: &str) -> Result<()> {
        if subject.is_empty() {
            return Err(Error::InvalidSubject);
        }
        tracing::debug!("clear token for {}", subject);
        self.tokens.write().unwrap().remove(subject);
        Ok(())
    }
}
