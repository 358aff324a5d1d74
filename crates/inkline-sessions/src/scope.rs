//! Session scope derivation from page identity
//!
//! Sessions are tied to the page or document the user is typing in so that
//! running context never bleeds across documents. The scope is a short hash
//! of the normalized page URL (origin plus path, query and fragment
//! dropped) or, failing that, the page title.

use url::Url;

const SCOPE_PREFIX: &str = "scope";

/// Derive a stable scope string from a page's URL and title
pub fn derive_session_scope(url: Option<&str>, page_title: Option<&str>) -> String {
    let base = normalize_identity(url, page_title);
    let base = if base.is_empty() { "global" } else { &base };
    format!("{SCOPE_PREFIX}:{}", fingerprint_hash(base))
}

fn normalize_identity(url: Option<&str>, page_title: Option<&str>) -> String {
    if let Some(raw) = url.filter(|raw| !raw.is_empty()) {
        return sanitize_url(raw);
    }
    page_title.map(|title| title.trim().to_string()).unwrap_or_default()
}

fn sanitize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(parsed) => {
            format!("{}{}", parsed.origin().ascii_serialization(), parsed.path()).to_lowercase()
        }
        Err(_) => raw.to_string(),
    }
}

fn fingerprint_hash(value: &str) -> String {
    let mut hash: u32 = 0;
    for unit in value.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(u32::from(unit));
    }
    format!("{hash:08x}")
}
