use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Credentials held on behalf of one authenticated principal.
///
/// At most one record exists per subject; storing a new record for the same
/// subject replaces the previous one wholesale. The store never evicts on
/// expiry — callers check freshness before using the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Stable identifier of the principal (typically the `sub` claim)
    pub subject: String,

    /// Bearer credential for calls to protected APIs
    pub access_token: String,

    /// When the access token expires
    pub expiration: DateTime<Utc>,

    /// Credential for obtaining a new access token without re-authentication,
    /// absent for client-credential-only flows
    pub refresh_token: Option<String>,
}

impl TokenRecord {
    /// Create a record without a refresh token
    pub fn new(
        subject: impl Into<String>,
        access_token: impl Into<String>,
        expiration: DateTime<Utc>,
    ) -> Self {
        Self {
            subject: subject.into(),
            access_token: access_token.into(),
            expiration,
            refresh_token: None,
        }
    }

    /// Attach the refresh token issued alongside the access token
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Check if the access token is already past its expiry
    pub fn is_expired(&self) -> bool {
        self.expiration <= Utc::now()
    }

    /// Check if the access token expires within the given buffer
    pub fn needs_refresh(&self, buffer_minutes: i64) -> bool {
        self.expiration < Utc::now() + Duration::minutes(buffer_minutes)
    }
}
