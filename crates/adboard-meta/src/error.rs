use thiserror::Error;

/// Errors returned by the Meta Marketing API client.
#[derive(Debug, Error)]
pub enum MetaError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Graph API returned a non-2xx status. The body is kept verbatim:
    /// callers match on its content to distinguish expired tokens and
    /// missing ad-account permissions from transient failures.
    #[error("Meta API error: status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A base URL or pagination cursor could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}
