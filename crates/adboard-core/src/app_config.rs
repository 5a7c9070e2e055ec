use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub meta_access_token: Option<String>,
    pub meta_ad_account_id: Option<String>,
    pub meta_page_id: Option<String>,
    pub cron_secret: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub meta_request_timeout_secs: u64,
    pub meta_max_retries: u32,
    pub meta_retry_backoff_base_ms: u64,
    pub sync_chunk_delay_ms: u64,
    pub history_default_since: chrono::NaiveDate,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field(
                "meta_access_token",
                &self.meta_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("meta_ad_account_id", &self.meta_ad_account_id)
            .field("meta_page_id", &self.meta_page_id)
            .field(
                "cron_secret",
                &self.cron_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("meta_request_timeout_secs", &self.meta_request_timeout_secs)
            .field("meta_max_retries", &self.meta_max_retries)
            .field(
                "meta_retry_backoff_base_ms",
                &self.meta_retry_backoff_base_ms,
            )
            .field("sync_chunk_delay_ms", &self.sync_chunk_delay_ms)
            .field("history_default_since", &self.history_default_since)
            .finish()
    }
}
