//! Cursor pagination for Admin REST list endpoints.
//!
//! Every list response carries a `Link` header with the URLs of adjacent
//! pages; the cursor is the `page_info` query parameter of the `rel="next"`
//! URL:
//!
//! ```text
//! <https://shop.myshopify.com/admin/api/2024-10/products.json?limit=250&page_info=PREV>; rel="previous",
//! <https://shop.myshopify.com/admin/api/2024-10/products.json?limit=250&page_info=NEXT>; rel="next"
//! ```
//!
//! A cursor request may only repeat `limit` (and `fields`); any other filter
//! must be dropped once `page_info` is present.

/// Returns the `page_info` cursor of the next page, or `None` on the last page.
#[must_use]
pub fn next_page_info(link_header: Option<&str>) -> Option<String> {
    link_header?
        .split(',')
        .map(str::trim)
        .find(|directive| directive.contains(r#"rel="next""#))
        .and_then(link_target)
        .and_then(|url| query_value(url, "page_info"))
}

/// The URL between `<` and `>` of one link directive.
fn link_target(directive: &str) -> Option<&str> {
    let start = directive.find('<')? + 1;
    let end = directive.find('>')?;
    directive.get(start..end).filter(|url| !url.is_empty())
}

/// Value of `param` in the query string of `url`, without percent-decoding.
/// Cursors are base64url and never need decoding.
fn query_value(url: &str, param: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, value)| *name == param && !value.is_empty())
        .map(|(_, value)| value.to_owned())
}
