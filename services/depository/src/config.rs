//! Service configuration

/// Depository configuration
#[derive(Debug, Clone)]
pub struct DepositoryConfig {
    /// Database connection string
    pub database_url: String,
    /// Host to bind the HTTP server
    pub host: String,
    /// Port to bind the HTTP server
    pub port: u16,
    /// Maximum database connections in the pool
    pub max_connections: u32,
}

impl Default for DepositoryConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/depository".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_connections: 10,
        }
    }
}

impl DepositoryConfig {
    /// The HTTP bind address as `host:port`
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
