//! Service configuration from environment variables, with compiled-in
//! defaults. `.env` loading happens in the binary before this is read.

pub const ENV_DB_PATH: &str = "PIPELINE_DB_PATH";
pub const ENV_SOURCE_URL: &str = "PIPELINE_SOURCE_URL";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "PIPELINE_FETCH_TIMEOUT_SECS";
pub const ENV_NOTIFY_TO: &str = "PIPELINE_NOTIFY_TO";

const DEFAULT_DB_PATH: &str = "pipeline.db";
const DEFAULT_SOURCE_URL: &str = "https://httpbin.org/uuid";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;
const DEFAULT_NOTIFY_TO: &str = "pipeline-alerts@example.com";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_path: String,
    pub identifier_url: String,
    pub fetch_timeout_secs: u64,
    pub notify_recipient: String,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self {
            database_path: env_or(ENV_DB_PATH, DEFAULT_DB_PATH),
            identifier_url: env_or(ENV_SOURCE_URL, DEFAULT_SOURCE_URL),
            fetch_timeout_secs: std::env::var(ENV_FETCH_TIMEOUT_SECS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            notify_recipient: env_or(ENV_NOTIFY_TO, DEFAULT_NOTIFY_TO),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DB_PATH.to_string(),
            identifier_url: DEFAULT_SOURCE_URL.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            notify_recipient: DEFAULT_NOTIFY_TO.to_string(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
