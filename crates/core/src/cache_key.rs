//! Request keys for the response cache.
//!
//! A request is identified by its path and query string. The key is
//! normalized (trailing slash dropped, query pairs sorted by name) and hashed so it
//! can be used as a document ID without clashing with path separators of the
//! underlying store.

use sha2::{Digest, Sha256};

/// Normalized `path?query` form of a request.
pub fn normalize(path: &str, query: Option<&str>) -> String {
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    let mut pairs: Vec<&str> = query
        .unwrap_or("")
        .split('&')
        .filter(|p| !p.is_empty())
        .collect();
    // Stable, so repeated parameters keep their order.
    pairs.sort_by(|a, b| pair_name(a).cmp(pair_name(b)));

    if pairs.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{}", pairs.join("&"))
    }
}

fn pair_name(pair: &str) -> &str {
    pair.split_once('=').map_or(pair, |(name, _)| name)
}

/// Store-safe document ID for a request: SHA-256 hex of the normalized key.
pub fn document_id(path: &str, query: Option<&str>) -> String {
    let digest = Sha256::digest(normalize(path, query).as_bytes());
    format!("{digest:x}")
}
