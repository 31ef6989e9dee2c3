use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the token stores.
///
/// A lookup for an unknown subject is not an error; it returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied an empty subject identifier
    #[error("subject must be a non-empty string")]
    InvalidSubject,

    /// Opening the backing database or creating its schema failed on first
    /// use; the store cannot serve durable operations
    #[error("token store initialization failed: {0}")]
    SchemaInit(String),

    /// The backing database rejected an upsert or delete
    #[error("token store unavailable: {0}")]
    Storage(String),
}
