//! Client configuration

use std::time::Duration;

/// Host suffix appended to a domain name in [`Config::for_domain`]
pub const EGNYTE_HOST: &str = "egnyte.com";

/// Default whole-client timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Default chunk size for [`upload_large_file`](crate::upload_large_file)
pub const DEFAULT_CHUNK_SIZE: usize = 100 * 1024 * 1024;

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// API endpoint, e.g. `https://acme.egnyte.com`
    pub endpoint: String,
    /// OAuth access token sent as a bearer token
    pub access_token: Option<String>,
    /// Timeout applied to the whole HTTP client
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Chunk size used by the large file uploader (bytes)
    pub chunk_size: usize,
}

impl Config {
    /// Create a new config with the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("egnyte-client/{}", env!("CARGO_PKG_VERSION")),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Create a config for `https://{domain}.egnyte.com`
    pub fn for_domain(domain: &str) -> Self {
        Self::new(format!("https://{}.{}", domain, EGNYTE_HOST))
    }

    /// Set the access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the chunk size used for large uploads
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Build the base URL for API requests
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_domain() {
        let config = Config::for_domain("acme").with_token("t0k3n");
        assert_eq!(config.base_url(), "https://acme.egnyte.com");
        assert_eq!(config.access_token.as_deref(), Some("t0k3n"));
        assert_eq!(config.timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_new_applies_defaults() {
        let config = Config::new("https://files.example.com");
        assert!(config.access_token.is_none());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(config.user_agent.starts_with("egnyte-client/"));
    }

    #[test]
    fn test_base_url_trims_slash() {
        let config = Config::new("https://files.example.com/");
        assert_eq!(config.base_url(), "https://files.example.com");
    }
}
