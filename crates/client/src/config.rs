//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for reaching the campus API gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Gateway base URL, e.g. `http://localhost:8080`
    pub base_url: String,

    /// Overall timeout for ordinary requests in seconds (unset = transport default)
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Upper bound on a token refresh exchange in milliseconds
    #[serde(default = "default_refresh_timeout_ms")]
    pub refresh_timeout_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(5);

fn default_refresh_timeout_ms() -> u64 {
    5_000
}

fn default_user_agent() -> String {
    concat!("campus-client/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            request_timeout_secs: None,
            refresh_timeout_ms: default_refresh_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }
}
