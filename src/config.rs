use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Clone, Debug)]
pub struct Config {
    /// Backend base URL, always ending with a single '/'
    pub api_base_url: String,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Config {
    pub fn from_env() -> Self {
        let api_base_url = env::var("API_BASE_URL")
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|_| normalize_base_url(DEFAULT_BASE_URL));

        Self {
            api_base_url,
            connect_timeout: Duration::from_secs(
                env::var("CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
            user_agent: env::var("USER_AGENT")
                .unwrap_or_else(|_| format!("bookcafe/{}", env!("CARGO_PKG_VERSION"))),
        }
    }

    /// Same defaults as `from_env`, pointed at `base_url`.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            api_base_url: normalize_base_url(base_url),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            user_agent: format!("bookcafe/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

// Url::join drops the last path segment unless the base ends with '/'
fn normalize_base_url(url: &str) -> String {
    format!("{}/", url.trim().trim_end_matches('/'))
}
