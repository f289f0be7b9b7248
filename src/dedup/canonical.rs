// src/dedup/canonical.rs
//! Canonical URL keys for exact-duplicate detection.

use url::{form_urlencoded, Url};

/// Query keys dropped from canonical URLs (compared case-insensitively).
pub const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ref",
    "source",
    "campaign",
];

pub fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.iter().any(|p| p.eq_ignore_ascii_case(key))
}

/// Canonical form of `raw`: lower-case scheme/host, no trailing path slash,
/// tracking params removed (others kept in order), fragment dropped.
///
/// Never fails: an unparseable URL maps to its lower-cased raw string.
pub fn canonicalize_url(raw: &str) -> String {
    match try_canonicalize(raw) {
        Some(c) => c,
        None => {
            tracing::warn!(target: "dedup", url = raw, "unparseable url; using raw key");
            raw.to_lowercase()
        }
    }
}

fn try_canonicalize(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    if parsed.cannot_be_a_base() {
        return None;
    }

    let mut out = String::with_capacity(raw.len());
    out.push_str(&parsed.scheme().to_ascii_lowercase());
    out.push_str("://");

    let user = parsed.username();
    if !user.is_empty() {
        out.push_str(user);
        if let Some(pass) = parsed.password() {
            out.push(':');
            out.push_str(pass);
        }
        out.push('@');
    }
    if let Some(host) = parsed.host_str() {
        out.push_str(&host.to_ascii_lowercase());
    }
    if let Some(port) = parsed.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }

    out.push_str(parsed.path().trim_end_matches('/'));

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if !kept.is_empty() {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept.iter())
            .finish();
        out.push('?');
        out.push_str(&query);
    }

    Some(out)
}
