//! HTTP client for one store's Shopify Admin REST API.

mod base_url;
mod fetch_all;

use std::time::Duration;

use mfsync_core::{AppConfig, StoreCredentials};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ShopifyError;
use crate::rate_limit::{retry_with_backoff, RetryPolicy};
use crate::types::{Product, ShopInfo, ShopResponse};

pub use base_url::admin_base_url;

/// Maximum number of pages to fetch before returning an error.
/// Prevents infinite loops on cycling cursors.
pub(crate) const MAX_PAGES: usize = 400;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Connection and retry settings shared by every store client.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub api_version: String,
    /// `limit` sent on list requests, 1..=250.
    pub page_size: u32,
    pub retry: RetryPolicy,
}

impl ClientSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            api_version: config.api_version.clone(),
            page_size: config.page_size,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                rate_limit_fallback_ms: config.rate_limit_fallback_ms,
                server_error_step_ms: config.server_error_backoff_ms,
            },
        }
    }

    /// Same settings pinned to a per-store API version, when one is configured.
    #[must_use]
    pub fn with_api_version(&self, api_version: Option<&str>) -> Self {
        let mut settings = self.clone();
        if let Some(version) = api_version.map(str::trim).filter(|v| !v.is_empty()) {
            version.clone_into(&mut settings.api_version);
        }
        settings
    }
}

/// HTTP verb for a metafield write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMethod {
    Post,
    Put,
}

impl From<WriteMethod> for Method {
    fn from(method: WriteMethod) -> Self {
        match method {
            WriteMethod::Post => Method::POST,
            WriteMethod::Put => Method::PUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    product: Product,
}

/// One decoded response: body text plus the `Link` header, if any.
pub(crate) struct RawPage {
    pub(crate) body: String,
    pub(crate) link: Option<String>,
}

/// Admin API client bound to one store.
///
/// Rate limits (429), server errors (5xx) and network failures are retried
/// per [`RetryPolicy`]. Other non-2xx responses surface immediately as
/// [`ShopifyError::Api`] carrying Shopify's own error text.
pub struct ShopifyAdminClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) store_label: String,
    access_token: String,
    pub(crate) retry: RetryPolicy,
    pub(crate) page_size: u32,
}

impl ShopifyAdminClient {
    /// # Errors
    ///
    /// Returns [`ShopifyError::InvalidShopDomain`] for an unusable domain and
    /// [`ShopifyError::Http`] if the underlying `reqwest::Client` cannot be
    /// built.
    pub fn new(
        store_label: &str,
        credentials: &StoreCredentials,
        settings: &ClientSettings,
    ) -> Result<Self, ShopifyError> {
        let base_url = admin_base_url(&credentials.shop_domain, &settings.api_version)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&settings.user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url,
            store_label: store_label.to_owned(),
            access_token: credentials.access_token.clone(),
            retry: settings.retry,
            page_size: settings.page_size.clamp(1, 250),
        })
    }

    #[must_use]
    pub fn store_label(&self) -> &str {
        &self.store_label
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Store name from `GET /shop.json`; doubles as a credentials check.
    ///
    /// # Errors
    ///
    /// Any [`ShopifyError`] from the request or decoding.
    pub async fn shop_info(&self) -> Result<ShopInfo, ShopifyError> {
        let url = self.endpoint("/shop.json", &[])?;
        let page = self.send(Method::GET, url, None).await?;
        let response: ShopResponse = decode(&page.body, || format!("shop info of {}", self.store_label))?;
        Ok(response.shop)
    }

    /// A single product with its variants, or `None` when the store answers 404.
    ///
    /// # Errors
    ///
    /// Any [`ShopifyError`] other than a 404.
    pub async fn get_product(&self, product_id: i64) -> Result<Option<Product>, ShopifyError> {
        let url = self.endpoint(&format!("/products/{product_id}.json"), &[])?;
        match self.send(Method::GET, url, None).await {
            Ok(page) => {
                let response: ProductResponse =
                    decode(&page.body, || format!("product {product_id}"))?;
                Ok(Some(response.product))
            }
            Err(err) if err.status() == Some(404) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Sends a JSON write and returns the decoded response body.
    ///
    /// # Errors
    ///
    /// Any [`ShopifyError`] from the request; 422 validation failures come
    /// back as [`ShopifyError::Api`] with the remote message.
    pub async fn write(
        &self,
        method: WriteMethod,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ShopifyError> {
        let url = self.endpoint(path, &[])?;
        let page = self.send(method.into(), url, Some(body)).await?;
        if page.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        decode(&page.body, || format!("{method:?} {path}"))
    }

    pub(crate) fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ShopifyError> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url)).map_err(|e| {
            ShopifyError::InvalidShopDomain {
                shop_domain: self.base_url.clone(),
                reason: format!("cannot join path \"{path}\": {e}"),
            }
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    /// Performs one request with retries and maps non-2xx statuses to errors.
    pub(crate) async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<RawPage, ShopifyError> {
        retry_with_backoff(self.retry, || {
            let method = method.clone();
            let url = url.clone();
            async move {
                tracing::debug!(store = %self.store_label, %method, %url, "shopify request");
                let mut request = self
                    .client
                    .request(method, url.clone())
                    .header(ACCESS_TOKEN_HEADER, &self.access_token)
                    .header(reqwest::header::ACCEPT, "application/json");
                if let Some(body) = body {
                    request = request.json(body);
                }

                let response = request.send().await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    return Err(ShopifyError::RateLimited {
                        store: self.store_label.clone(),
                        retry_after_ms: retry_after_ms(response.headers()),
                    });
                }

                if status.is_server_error() {
                    return Err(ShopifyError::ServerError {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    return Err(ShopifyError::Api {
                        status: status.as_u16(),
                        url: url.to_string(),
                        message: extract_error_message(&text),
                    });
                }

                let link = response
                    .headers()
                    .get(reqwest::header::LINK)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);
                let body = response.text().await?;
                Ok(RawPage { body, link })
            }
        })
        .await
    }
}

pub(crate) fn decode<T: DeserializeOwned>(
    body: &str,
    context: impl FnOnce() -> String,
) -> Result<T, ShopifyError> {
    serde_json::from_str(body).map_err(|source| ShopifyError::Deserialize {
        context: context(),
        source,
    })
}

/// `Retry-After` in milliseconds. Shopify sends seconds, sometimes fractional
/// (`"2.0"`).
fn retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    let secs = headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s >= 0.0)?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let ms = (secs * 1000.0).round() as u64;
    Some(ms)
}

/// Human-readable text from a Shopify error body.
///
/// Shopify sends `{"errors": "..."}`, `{"errors": {"field": ["msg", ...]}}`
/// or `{"errors": ["..."]}`. Anything else is returned trimmed and shortened.
fn extract_error_message(body: &str) -> String {
    const MAX_RAW_LEN: usize = 300;

    let errors = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("errors").cloned());
    let message = match errors {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Array(items)) => join_messages(&items),
        Some(serde_json::Value::Object(fields)) => fields
            .iter()
            .map(|(field, msgs)| match msgs {
                serde_json::Value::Array(items) => format!("{field}: {}", join_messages(items)),
                other => format!("{field}: {}", scalar_text(other)),
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => body.trim().chars().take(MAX_RAW_LEN).collect(),
    };
    if message.is_empty() {
        "no error details".to_owned()
    } else {
        message
    }
}

fn join_messages(items: &[serde_json::Value]) -> String {
    items.iter().map(scalar_text).collect::<Vec<_>>().join(", ")
}

fn scalar_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
