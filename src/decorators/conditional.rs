//! Conditional GET helpers: ETag quoting and matching, HTTP dates, freshness.
//!
//! Freshness is permissive: a request is answered with 304 when either its
//! `If-None-Match` matches the ETag or its `If-Modified-Since` is not older
//! than the last modification time.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use http::header::{InvalidHeaderValue, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use http::{HeaderMap, HeaderValue};

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Obsolete RFC 850 date, e.g. `Sunday, 06-Nov-94 08:49:37 GMT`.
const RFC_850: &str = "%A, %d-%b-%y %H:%M:%S GMT";

/// ANSI C asctime() date, e.g. `Sun Nov  6 08:49:37 1994`.
const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

/// Quote an ETag for the `ETag` header unless it is already quoted.
pub fn quote_etag(etag: &str) -> String {
    let opaque = etag.strip_prefix("W/").unwrap_or(etag);
    if opaque.len() >= 2 && opaque.starts_with('"') && opaque.ends_with('"') {
        etag.to_string()
    } else {
        format!("\"{}\"", etag)
    }
}

/// Split an entity-tag into its opaque value and weakness flag.
pub fn unquote_etag(etag: &str) -> (&str, bool) {
    let etag = etag.trim();
    let (rest, weak) = match etag.strip_prefix("W/") {
        Some(rest) => (rest, true),
        None => (etag, false),
    };
    let opaque = rest
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(rest);
    (opaque, weak)
}

/// Whether an `If-None-Match` value matches `etag` under weak comparison.
///
/// Quoted entity-tags may contain commas, so the list is scanned tag by tag
/// rather than split.
pub fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    let (target, _) = unquote_etag(etag);
    let mut rest = if_none_match;

    loop {
        rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        if rest.is_empty() {
            return false;
        }

        let tag = rest.strip_prefix("W/").unwrap_or(rest);
        let candidate = match tag.strip_prefix('"') {
            Some(quoted) => match quoted.find('"') {
                Some(end) => {
                    rest = &quoted[end + 1..];
                    &quoted[..end]
                }
                None => {
                    rest = "";
                    quoted
                }
            },
            None => {
                let end = tag.find(',').unwrap_or(tag.len());
                rest = &tag[end..];
                let bare = tag[..end].trim();
                if bare == "*" {
                    return true;
                }
                bare
            }
        };

        if candidate == target {
            return true;
        }
    }
}

pub fn format_http_date(date: DateTime<Utc>) -> String {
    date.format(IMF_FIXDATE).to_string()
}

/// Parse any of the three HTTP-date formats.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    [RFC_850, ASCTIME]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Decide whether the client's cached copy is still current.
pub fn is_not_modified(
    headers: &HeaderMap,
    etag: Option<&str>,
    last_modified: Option<DateTime<Utc>>,
) -> bool {
    let etag_fresh = etag.is_some_and(|etag| {
        headers
            .get_all(IF_NONE_MATCH)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| etag_matches(value, etag))
    });

    let date_fresh = last_modified.is_some_and(|modified| {
        headers
            .get(IF_MODIFIED_SINCE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_http_date)
            .is_some_and(|since| modified.trunc_subsecs(0) <= since)
    });

    etag_fresh || date_fresh
}

/// Pre-rendered `ETag` / `Last-Modified` header values.
#[derive(Debug, Clone, Default)]
pub struct Validators {
    etag: Option<HeaderValue>,
    last_modified: Option<HeaderValue>,
}

impl Validators {
    pub fn new(
        etag: Option<&str>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Result<Self, InvalidHeaderValue> {
        let etag = etag
            .map(|etag| HeaderValue::from_str(&quote_etag(etag)))
            .transpose()?;
        let last_modified = last_modified
            .map(|date| HeaderValue::from_str(&format_http_date(date)))
            .transpose()?;
        Ok(Self {
            etag,
            last_modified,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }

    /// Set the headers, replacing any the response already carries.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Some(etag) = &self.etag {
            headers.insert(ETAG, etag.clone());
        }
        if let Some(last_modified) = &self.last_modified {
            headers.insert(LAST_MODIFIED, last_modified.clone());
        }
    }
}
