/// `mode=rwc` creates the database file on first open
const DEFAULT_DATABASE_URL: &str = "sqlite:tokenstore.db?mode=rwc";

/// Deployment configuration for the SQLite-backed token store.
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Connection URL for the backing database
    pub database_url: String,

    /// Maximum number of pooled connections
    pub max_connections: u32,
}

impl SqliteStoreConfig {
    /// Create a configuration for the given database URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
        }
    }

    /// Read the database URL from `DATABASE_URL`, falling back to a local
    /// `tokenstore.db` file
    pub fn from_env() -> Self {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        Self::new(url)
    }

    /// Set the connection pool size
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_URL)
    }
}
