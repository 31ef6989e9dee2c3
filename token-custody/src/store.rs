use crate::error::Result;
use crate::token::TokenRecord;
use async_trait::async_trait;

/// Storage abstraction for per-subject access tokens.
///
/// The session layer stores a record on successful login or token refresh,
/// reads it back before outbound API calls, and clears it on logout. The
/// subject string is supplied by the caller (typically extracted from the
/// authenticated principal); the store never inspects claims itself.
#[async_trait]
pub trait UserTokenStore: Send + Sync {
    /// Get the current token for a subject, or `None` if nothing is stored
    async fn get(&self, subject: &str) -> Result<Option<TokenRecord>>;

    /// Store a token, replacing any prior record for the same subject
    async fn store(&self, record: TokenRecord) -> Result<()>;

    /// Remove the token for a subject; removing an unknown subject is a no-op
    async fn clear(&self, subject: &str) -> Result<()>;
}
