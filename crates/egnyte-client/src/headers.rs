//! Case-insensitive response header bag

use crate::{ClientError, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Response headers keyed by lowercase name.
///
/// When a header occurs more than once the last value wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    inner: BTreeMap<String, String>,
}

impl ResponseHeaders {
    /// Create an empty header bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any previous value for the same name
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.inner
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Look up a header by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Look up a header, falling back to `default` when absent
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Look up a header, returning an empty string when absent
    pub fn get_or_default(&self, name: &str) -> String {
        self.get(name).map(str::to_string).unwrap_or_default()
    }

    /// Look up a header that the response contract requires.
    ///
    /// Absence is reported as [`ClientError::MalformedResponse`] with the
    /// headers and body of the offending response in the message.
    pub fn require(&self, name: &str, body: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| ClientError::missing_headers(&[name], self, body))
    }

    /// Whether a header is present
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of distinct headers
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the bag is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over `(lowercase name, value)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<&reqwest::header::HeaderMap> for ResponseHeaders {
    fn from(map: &reqwest::header::HeaderMap) -> Self {
        let mut headers = Self::new();
        // HeaderMap yields repeated names in insertion order, so later values overwrite
        for (name, value) in map.iter() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers.insert(name.as_str(), value);
        }
        headers
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ResponseHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

impl fmt::Display for ResponseHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    #[test]
    fn test_lookup_ignores_case() {
        let headers: ResponseHeaders = [("X-Egnyte-Upload-Id", "abc")].into_iter().collect();

        assert_eq!(headers.get("x-egnyte-upload-id"), Some("abc"));
        assert_eq!(headers.get("X-EGNYTE-UPLOAD-ID"), Some("abc"));
        assert!(headers.contains("X-Egnyte-Upload-Id"));
        assert_eq!(headers.iter().next(), Some(("x-egnyte-upload-id", "abc")));
    }

    #[test]
    fn test_last_value_wins() {
        let mut map = HeaderMap::new();
        map.append("retry-after", HeaderValue::from_static("10"));
        map.append("Retry-After", HeaderValue::from_static("20"));

        let headers = ResponseHeaders::from(&map);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("retry-after"), Some("20"));
    }

    #[test]
    fn test_defaults() {
        let headers = ResponseHeaders::new();
        assert_eq!(headers.get_or_default("etag"), "");
        assert_eq!(headers.get_or("x-egnyte-chunk-num", "-1"), "-1");
    }

    #[test]
    fn test_require_reports_headers_and_body() {
        let headers: ResponseHeaders = [("Content-Type", "text/plain")].into_iter().collect();
        let err = headers.require("ETag", "oops").unwrap_err();
        let message = err.to_string();

        assert!(matches!(err, ClientError::MalformedResponse { .. }));
        assert!(message.contains("[ETag]"));
        assert!(message.contains("Headers: {content-type: text/plain}"));
        assert!(message.contains("Content: oops"));
    }
}
