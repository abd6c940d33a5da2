//! Admin API base URL construction.

use crate::error::ShopifyError;

/// Builds `https://{domain}/admin/api/{version}` for one store.
///
/// A bare domain (`shop-a.myshopify.com`) gets the `https://` scheme. A value
/// that already carries a scheme is used as-is so a local mock server
/// (`http://127.0.0.1:PORT`) can stand in for the shop. Any path on the input
/// is dropped; only the origin is kept.
pub fn admin_base_url(shop_domain: &str, api_version: &str) -> Result<String, ShopifyError> {
    let trimmed = shop_domain.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ShopifyError::InvalidShopDomain {
            shop_domain: shop_domain.to_owned(),
            reason: "domain is empty".to_owned(),
        });
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let url = reqwest::Url::parse(&candidate).map_err(|e| ShopifyError::InvalidShopDomain {
        shop_domain: shop_domain.to_owned(),
        reason: e.to_string(),
    })?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ShopifyError::InvalidShopDomain {
            shop_domain: shop_domain.to_owned(),
            reason: "no host".to_owned(),
        });
    }

    let origin = url.origin().ascii_serialization();
    Ok(format!("{origin}/admin/api/{}", api_version.trim()))
}
