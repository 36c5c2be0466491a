//! Outbound header reconciliation.
//!
//! Builds a fresh `HeaderMap` per call from the caller's overrides and the
//! inbound request; neither input is mutated.

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Cookie carrying the session token the backend expects as a bearer token.
pub const TOKEN_COOKIE: &str = "token";

/// Headers that must not be relayed verbatim (hop-by-hop headers).
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "transfer-encoding",
    "keep-alive",
    "upgrade",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

/// Merge `overrides` with the authorization and cookie evidence of `inbound`.
///
/// Authorization precedence: `overrides` > `inbound` > `Bearer <token>` taken
/// from the effective cookie. The effective cookie itself is resolved as
/// `overrides` > `inbound` and copied over when non-empty. Empty values count
/// as absent on both sides.
pub fn reconcile(inbound: &HeaderMap, overrides: &HeaderMap) -> HeaderMap {
    let mut merged = overrides.clone();
    merged.remove(COOKIE);

    let cookie = joined_cookie(overrides).or_else(|| joined_cookie(inbound));

    let authorization = match non_empty(overrides, AUTHORIZATION) {
        Some(value) => Some(value.clone()),
        None => non_empty(inbound, AUTHORIZATION)
            .cloned()
            .or_else(|| cookie.as_ref().and_then(bearer_from_cookie)),
    };
    merged.remove(AUTHORIZATION);
    if let Some(value) = authorization {
        merged.insert(AUTHORIZATION, value);
    }

    if let Some(cookie) = cookie {
        merged.insert(COOKIE, cookie);
    }

    merged
}

/// Value of the first cookie named exactly `token`, if any.
///
/// Assumes a single session cookie; when several `token` pairs are present
/// the first one wins.
pub fn token_from_cookie(cookie: &str) -> Option<&str> {
    cookie
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == TOKEN_COOKIE)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

fn non_empty(headers: &HeaderMap, name: HeaderName) -> Option<&HeaderValue> {
    headers.get(name).filter(|v| !v.is_empty())
}

/// All non-empty `cookie` fields folded into one header value.
fn joined_cookie(headers: &HeaderMap) -> Option<HeaderValue> {
    let mut fields = headers.get_all(COOKIE).iter().filter(|v| !v.is_empty());
    let first = fields.next()?;
    let rest: Vec<&HeaderValue> = fields.collect();
    if rest.is_empty() {
        return Some(first.clone());
    }

    let mut joined = first.as_bytes().to_vec();
    for value in rest {
        joined.extend_from_slice(b"; ");
        joined.extend_from_slice(value.as_bytes());
    }
    HeaderValue::from_bytes(&joined).ok()
}

fn bearer_from_cookie(cookie: &HeaderValue) -> Option<HeaderValue> {
    let token = token_from_cookie(cookie.to_str().ok()?)?;
    let mut value = HeaderValue::from_str(&format!("Bearer {token}")).ok()?;
    value.set_sensitive(true);
    Some(value)
}
