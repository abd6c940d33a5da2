use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {store}{}", describe_hint(*.retry_after_ms))]
    RateLimited {
        store: String,
        /// Server-supplied `Retry-After`, converted to milliseconds.
        retry_after_ms: Option<u64>,
    },

    #[error("server error {status} from {url}")]
    ServerError { status: u16, url: String },

    #[error("request to {url} rejected with HTTP {status}: {message}")]
    Api {
        status: u16,
        url: String,
        message: String,
    },

    #[error("pagination limit reached for {path}: exceeded {max_pages} pages")]
    PaginationLimit { path: String, max_pages: usize },

    #[error("invalid shop domain \"{shop_domain}\": {reason}")]
    InvalidShopDomain { shop_domain: String, reason: String },

    #[error("response for {context} is missing \"{field}\"")]
    MissingField { context: String, field: String },
}

impl ShopifyError {
    /// HTTP status for errors that came from a response, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::ServerError { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn describe_hint(retry_after_ms: Option<u64>) -> String {
    retry_after_ms.map_or_else(String::new, |ms| format!(" (retry after {ms}ms)"))
}
