//! HTTP client for the Meta Marketing API (Graph API).
//!
//! Wraps `reqwest` with credential management, cursor pagination, and typed
//! error handling. Non-2xx responses surface as [`MetaError::Upstream`] with
//! the status and verbatim body so callers can classify upstream failures.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, Url};

use adboard_core::ConfigError;

use crate::error::MetaError;
use crate::retry::retry_with_backoff;
use crate::types::{InsightRow, MetaCampaign, Page};

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v21.0/";

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// Per-day insight rows at ad level; `time_increment=1` yields one row per
/// (ad, day) and Meta reports the row's day in `date_start`.
const INSIGHT_FIELDS: &str = "date_start,impressions,clicks,spend,actions,campaign_id,\
                              campaign_name,ad_id,ad_name,adset_id,adset_name";

/// Credentials and account scope for the Marketing API.
///
/// Built explicitly and passed into [`MetaClient::new`] — never read
/// ambiently by the client — so tests can substitute doubles without
/// touching the process environment.
#[derive(Debug, Clone)]
pub struct MetaConfig {
    access_token: String,
    ad_account_id: String,
}

impl MetaConfig {
    /// Creates a config, normalising the account id to the `act_` prefix
    /// the insights endpoints require.
    #[must_use]
    pub fn new(access_token: impl Into<String>, ad_account_id: &str) -> Self {
        let ad_account_id = if ad_account_id.starts_with("act_") {
            ad_account_id.to_owned()
        } else {
            format!("act_{ad_account_id}")
        };
        Self {
            access_token: access_token.into(),
            ad_account_id,
        }
    }

    /// Builds the config from `META_ACCESS_TOKEN` / `META_AD_ACCOUNT_ID`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if either variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = std::env::var("META_ACCESS_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("META_ACCESS_TOKEN".to_string()))?;
        let account = std::env::var("META_AD_ACCOUNT_ID")
            .map_err(|_| ConfigError::MissingEnvVar("META_AD_ACCOUNT_ID".to_string()))?;
        Ok(Self::new(token, &account))
    }

    /// Builds the config from an already-loaded [`adboard_core::AppConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] naming the credential that is
    /// absent from the loaded configuration.
    pub fn from_app_config(config: &adboard_core::AppConfig) -> Result<Self, ConfigError> {
        let token = config
            .meta_access_token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("META_ACCESS_TOKEN".to_string()))?;
        let account = config
            .meta_ad_account_id
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("META_AD_ACCOUNT_ID".to_string()))?;
        Ok(Self::new(token, account))
    }

    #[must_use]
    pub fn ad_account_id(&self) -> &str {
        &self.ad_account_id
    }
}

/// Client for the Meta Marketing API.
///
/// Use [`MetaClient::new`] for production or [`MetaClient::with_base_url`]
/// to point at a mock server in tests.
pub struct MetaClient {
    client: Client,
    config: MetaConfig,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl MetaClient {
    /// Creates a new client pointed at the production Graph API.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: MetaConfig, timeout_secs: u64) -> Result<Self, MetaError> {
        Self::with_base_url(config, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`MetaError::InvalidUrl`] if `base_url`
    /// cannot be parsed.
    pub fn with_base_url(
        config: MetaConfig,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, MetaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("adboard/0.1 (marketing-analytics)")
            .build()?;

        // Normalise: the base URL must end with exactly one slash so that
        // Url::join appends path segments instead of replacing the last one.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| MetaError::InvalidUrl(format!("base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            config,
            base_url,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the transient-error retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Fetches all campaigns for the configured ad account, following
    /// pagination cursors until exhausted.
    ///
    /// # Errors
    ///
    /// - [`MetaError::Upstream`] on a non-2xx response (status + body).
    /// - [`MetaError::Http`] on network failure.
    /// - [`MetaError::Deserialize`] if a page does not match the expected shape.
    pub async fn fetch_campaigns(&self) -> Result<Vec<MetaCampaign>, MetaError> {
        let mut url = self.endpoint("campaigns", &[("fields", "id,name,objective")])?;
        let mut all = Vec::new();

        loop {
            let page: Page<MetaCampaign> = self.get_page(&url).await?;
            all.extend(page.data);
            match Self::next_url(page.paging)? {
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(all)
    }

    /// Fetches per-day, per-ad insight rows for an inclusive date range,
    /// following pagination to return the complete set regardless of the
    /// source page size.
    ///
    /// # Errors
    ///
    /// - [`MetaError::Upstream`] on a non-2xx response (status + body).
    /// - [`MetaError::Http`] on network failure.
    /// - [`MetaError::Deserialize`] if a page does not match the expected shape.
    pub async fn fetch_ad_insights(
        &self,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<InsightRow>, MetaError> {
        let time_range = serde_json::json!({
            "since": since.format("%Y-%m-%d").to_string(),
            "until": until.format("%Y-%m-%d").to_string(),
        })
        .to_string();

        let mut url = self.endpoint(
            "insights",
            &[
                ("fields", INSIGHT_FIELDS),
                ("time_range", &time_range),
                ("time_increment", "1"),
                ("level", "ad"),
                ("action_attribution_windows", "7d_click"),
            ],
        )?;
        let mut all = Vec::new();

        loop {
            let page: Page<InsightRow> = self.get_page(&url).await?;
            all.extend(page.data);
            match Self::next_url(page.paging)? {
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(all)
    }

    /// Builds `<base>/<ad_account_id>/<resource>` with the given query
    /// parameters plus the access token.
    fn endpoint(&self, resource: &str, params: &[(&str, &str)]) -> Result<Url, MetaError> {
        let path = format!("{}/{resource}", self.config.ad_account_id);
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| MetaError::InvalidUrl(format!("endpoint path '{path}': {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("access_token", &self.config.access_token);
        }
        Ok(url)
    }

    /// Parses a `paging.next` cursor into the next request URL, if any.
    ///
    /// The cursor is an opaque absolute URL that already carries the access
    /// token and query state.
    fn next_url(paging: Option<crate::types::Paging>) -> Result<Option<Url>, MetaError> {
        let Some(next) = paging.and_then(|p| p.next) else {
            return Ok(None);
        };
        let url = Url::parse(&next)
            .map_err(|e| MetaError::InvalidUrl(format!("paging.next '{next}': {e}")))?;
        Ok(Some(url))
    }

    /// Sends a GET request with retry on transient failures, asserts a 2xx
    /// status, and parses the body as one page envelope.
    async fn get_page<T>(&self, url: &Url) -> Result<Page<T>, MetaError>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_text(url.clone())
        })
        .await?;

        serde_json::from_str(&body).map_err(|e| MetaError::Deserialize {
            context: redact_token(url),
            source: e,
        })
    }

    async fn request_text(&self, url: Url) -> Result<String, MetaError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(MetaError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

/// Renders a URL for error context with the access token stripped.
fn redact_token(url: &Url) -> String {
    let mut redacted = url.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "access_token")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    redacted.set_query(None);
    {
        let mut pairs = redacted.query_pairs_mut();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
    }
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> MetaClient {
        MetaClient::with_base_url(MetaConfig::new("test-token", "123"), 30, base_url)
            .expect("client construction should not fail")
    }

    #[test]
    fn meta_config_prefixes_bare_account_id() {
        let config = MetaConfig::new("t", "12345");
        assert_eq!(config.ad_account_id(), "act_12345");
    }

    #[test]
    fn meta_config_keeps_existing_prefix() {
        let config = MetaConfig::new("t", "act_12345");
        assert_eq!(config.ad_account_id(), "act_12345");
    }

    #[test]
    fn endpoint_builds_account_scoped_url_with_token() {
        let client = test_client("https://graph.example.com/v21.0");
        let url = client
            .endpoint("campaigns", &[("fields", "id,name,objective")])
            .expect("endpoint");
        assert_eq!(url.path(), "/v21.0/act_123/campaigns");
        assert!(url
            .query()
            .expect("query")
            .contains("access_token=test-token"));
    }

    #[test]
    fn next_url_absent_paging_ends_iteration() {
        assert!(MetaClient::next_url(None).expect("parse").is_none());
    }

    #[test]
    fn redact_token_strips_access_token_only() {
        let url =
            Url::parse("https://graph.example.com/x?fields=id&access_token=secret").expect("url");
        let shown = redact_token(&url);
        assert!(!shown.contains("secret"));
        assert!(shown.contains("fields=id"));
    }
}
