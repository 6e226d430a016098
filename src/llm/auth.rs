//! Authentication for the reasoning backend

/// Default Messages API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Authentication configuration for API requests
#[derive(Clone)]
pub struct AuthConfig {
    /// API key or token for authentication
    pub api_key: String,
    /// Optional custom base URL (overrides default API endpoint)
    pub base_url: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AuthConfig {
    /// Create a new auth config with just an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    /// Create a new auth config with API key and custom base URL
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Some(base_url.into()),
        }
    }

    /// Endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_default_and_override() {
        assert_eq!(AuthConfig::new("k").endpoint(), DEFAULT_BASE_URL);
        assert_eq!(
            AuthConfig::with_base_url("k", "http://proxy.local/v1/messages").endpoint(),
            "http://proxy.local/v1/messages"
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let printed = format!("{:?}", AuthConfig::new("sk-secret"));
        assert!(!printed.contains("sk-secret"));
    }
}
