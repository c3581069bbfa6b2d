//! Registry endpoint, credential, and site configuration.
//!
//! Configuration can be deserialized from a config file or assembled from the
//! process environment. Credentials are a plain pair sourced from the
//! environment, never embedded in code or config committed to the repo.

use serde::{Deserialize, Serialize};

/// Environment variable holding the registry API base URL.
pub const REGISTRY_URL_VAR: &str = "PIDMINT_REGISTRY_URL";
/// Environment variable holding the registry account name.
pub const USERNAME_VAR: &str = "PIDMINT_USERNAME";
/// Environment variable holding the registry account password.
pub const PASSWORD_VAR: &str = "PIDMINT_PASSWORD";
/// Environment variable holding the site base URL landing pages live under.
pub const SITE_URL_VAR: &str = "PIDMINT_SITE_URL";
/// Environment variable holding the publisher name for derived metadata.
pub const PUBLISHER_VAR: &str = "PIDMINT_PUBLISHER";

/// Registry account credential pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Read the credential pair from the process environment. Returns `None`
    /// unless both variables are set.
    pub fn from_env() -> Option<Self> {
        let username = std::env::var(USERNAME_VAR).ok()?;
        let password = std::env::var(PASSWORD_VAR).ok()?;
        Some(Self { username, password })
    }
}

/// Configuration for one naming-authority registry connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL of the site that serves landing pages.
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Publisher name used in derived metadata. Empty means "unavailable"
    /// and is replaced by the registry sentinel at derivation time.
    #[serde(default)]
    pub publisher: String,

    /// Credential pair for privileged registry calls. Absent credentials
    /// leave the client degraded: reads work, writes fail.
    #[serde(default)]
    pub credentials: Option<Credentials>,

    /// Timeout in milliseconds for registry round trips.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    std::env::var(REGISTRY_URL_VAR).unwrap_or_else(|_| "https://ezid.cdlib.org".to_string())
}

fn default_site_url() -> String {
    std::env::var(SITE_URL_VAR).unwrap_or_else(|_| "http://localhost:8080".to_string())
}

fn default_timeout_ms() -> u64 {
    30000
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            site_url: default_site_url(),
            publisher: String::new(),
            credentials: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RegistryConfig {
    /// Assemble a configuration entirely from the process environment.
    pub fn from_env() -> Self {
        Self {
            publisher: std::env::var(PUBLISHER_VAR).unwrap_or_default(),
            credentials: Credentials::from_env(),
            ..Self::default()
        }
    }

    /// Override the registry base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the site base URL.
    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = site_url.into();
        self
    }

    /// Override the publisher name.
    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = publisher.into();
        self
    }

    /// Supply the credential pair directly.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Override the round-trip timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}
