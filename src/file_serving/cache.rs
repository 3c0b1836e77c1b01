use std::time::{Duration, SystemTime};

use super::FileMeta;

pub const MAX_AGE_SECS: u64 = 180;

/// Outcome of evaluating a request's conditional headers against a file.
///
/// On a hit the caller answers 304 with an empty body and `headers` is empty;
/// on a miss `headers` carries the full validator set to emit with the 200.
#[derive(Debug)]
pub struct CacheDecision {
    pub hit: bool,
    pub headers: Vec<(String, String)>,
}

/// Weak validators: ETag is the byte size as a decimal string, Last-Modified
/// is the mtime rendered as an RFC 3339 string. The client echoes these back
/// verbatim and they are compared by exact string equality, so no date
/// parsing happens on either side.
pub fn validators(meta: &FileMeta) -> (String, String) {
    let etag = meta.size.to_string();
    let last_modified = humantime::format_rfc3339(meta.modified).to_string();
    (etag, last_modified)
}

pub fn evaluate(request_headers: &[(String, String)], meta: &FileMeta) -> CacheDecision {
    let (etag, last_modified) = validators(meta);

    let if_none_match = header_value(request_headers, "if-none-match");
    let if_modified_since = header_value(request_headers, "if-modified-since");

    if if_none_match == Some(etag.as_str()) || if_modified_since == Some(last_modified.as_str()) {
        return CacheDecision {
            hit: true,
            headers: Vec::new(),
        };
    }

    let expires = SystemTime::now() + Duration::from_secs(MAX_AGE_SECS);
    CacheDecision {
        hit: false,
        headers: vec![
            (
                "Cache-Control".to_string(),
                format!("max-age={}", MAX_AGE_SECS),
            ),
            ("ETag".to_string(), etag),
            ("Last-Modified".to_string(), last_modified),
            ("Expires".to_string(), httpdate::fmt_http_date(expires)),
        ],
    }
}

pub fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.to_lowercase() == name)
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn meta(size: u64) -> FileMeta {
        FileMeta {
            is_dir: false,
            size,
            modified: UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        }
    }

    fn header_names(decision: &CacheDecision) -> Vec<&str> {
        decision.headers.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn etag_is_size_as_decimal_string() {
        let (etag, _) = validators(&meta(1234));
        assert_eq!(etag, "1234");
    }

    #[test]
    fn miss_sets_the_four_validator_headers() {
        let decision = evaluate(&[], &meta(42));
        assert!(!decision.hit);
        assert_eq!(
            header_names(&decision),
            vec!["Cache-Control", "ETag", "Last-Modified", "Expires"]
        );
        assert_eq!(decision.headers[0].1, "max-age=180");
        assert_eq!(decision.headers[1].1, "42");

        // Expires must be a real HTTP-date roughly max-age ahead of now
        let expires = httpdate::parse_http_date(&decision.headers[3].1).unwrap();
        let lower = SystemTime::now() + Duration::from_secs(MAX_AGE_SECS - 10);
        assert!(expires > lower);
    }

    #[test]
    fn matching_if_none_match_is_a_hit_without_headers() {
        let request = vec![("If-None-Match".to_string(), "42".to_string())];
        let decision = evaluate(&request, &meta(42));
        assert!(decision.hit);
        assert!(decision.headers.is_empty());
    }

    #[test]
    fn matching_if_modified_since_string_is_a_hit() {
        let m = meta(42);
        let (_, last_modified) = validators(&m);
        let request = vec![("If-Modified-Since".to_string(), last_modified)];
        let decision = evaluate(&request, &m);
        assert!(decision.hit);
    }

    #[test]
    fn http_date_if_modified_since_never_matches() {
        // Browsers send HTTP-dates; the comparison is exact string equality,
        // so only the ETag path produces hits for them.
        let m = meta(42);
        let request = vec![(
            "If-Modified-Since".to_string(),
            httpdate::fmt_http_date(m.modified),
        )];
        let decision = evaluate(&request, &m);
        assert!(!decision.hit);
    }

    #[test]
    fn stale_etag_is_a_miss() {
        let request = vec![("If-None-Match".to_string(), "41".to_string())];
        let decision = evaluate(&request, &meta(42));
        assert!(!decision.hit);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let request = vec![("IF-NONE-MATCH".to_string(), "42".to_string())];
        assert!(evaluate(&request, &meta(42)).hit);
    }
}
