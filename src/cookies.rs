// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cookie header codec.
//!
//! Two pure functions: pull a named value out of a `Cookie` header string,
//! and serialize raw `Set-Cookie` values back into `Cookie` header form.
//! Nothing here parses cookie attributes (`Path`, `Secure`, ...) - only the
//! leading `name=value` pair is ever forwarded.

use percent_encoding::percent_decode_str;

/// Cookie name carrying the short-lived session token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Cookie name carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Extract a named value from a `Cookie` header string.
///
/// Segments are separated by `"; "` and split on the first `'='`; the value
/// is percent-decoded. Malformed segments (no `=`) are skipped. Duplicate
/// names resolve last-write-wins. A missing name yields `None`.
pub fn extract(cookie_header: &str, name: &str) -> Option<String> {
    let mut found = None;
    for segment in cookie_header.split("; ") {
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };
        if key == name {
            found = Some(percent_decode_str(value).decode_utf8_lossy().into_owned());
        }
    }
    found
}

/// Serialize raw `Set-Cookie` values into a `Cookie` header value.
///
/// Only the leading `name=value` pair of each entry is forwarded; attributes
/// after the first `';'` are dropped without being parsed. Zero entries
/// produce the empty string.
pub fn serialize(set_cookies: &[String]) -> String {
    set_cookies
        .iter()
        .filter_map(|entry| {
            let pair = entry.split(';').next().unwrap_or("").trim();
            if pair.is_empty() {
                None
            } else {
                Some(pair)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_named_cookie() {
        assert_eq!(
            extract("access_token=abc; refresh_token=def", "refresh_token"),
            Some("def".to_string())
        );
        assert_eq!(
            extract("access_token=abc; refresh_token=def", "access_token"),
            Some("abc".to_string())
        );
    }

    #[test]
    fn missing_cookie_yields_none() {
        assert_eq!(extract("", "refresh_token"), None);
        assert_eq!(extract("access_token=abc", "refresh_token"), None);
    }

    #[test]
    fn values_are_percent_decoded() {
        assert_eq!(
            extract("refresh_token=a%20b", "refresh_token"),
            Some("a b".to_string())
        );
    }

    #[test]
    fn value_keeps_equals_signs_after_the_first() {
        assert_eq!(
            extract("token=abc=def==", "token"),
            Some("abc=def==".to_string())
        );
    }

    #[test]
    fn malformed_segments_are_skipped() {
        assert_eq!(
            extract("garbage; access_token=abc", "access_token"),
            Some("abc".to_string())
        );
        assert_eq!(extract("garbage", "garbage"), None);
    }

    #[test]
    fn duplicate_names_resolve_last_write_wins() {
        assert_eq!(
            extract("token=first; token=second", "token"),
            Some("second".to_string())
        );
    }

    #[test]
    fn serialize_strips_attributes() {
        let cookies = vec![
            "access_token=new123; Path=/; HttpOnly; Secure".to_string(),
            "refresh_token=xyz; Max-Age=604800".to_string(),
        ];
        assert_eq!(serialize(&cookies), "access_token=new123; refresh_token=xyz");
    }

    #[test]
    fn serialize_tolerates_zero_entries() {
        assert_eq!(serialize(&[]), "");
    }

    #[test]
    fn serialize_skips_empty_entries() {
        let cookies = vec!["".to_string(), "access_token=abc".to_string()];
        assert_eq!(serialize(&cookies), "access_token=abc");
    }
}
