//! Read-only view of an inbound request.
//!
//! Strategies never see the host application's request type directly; they
//! read a [`TenantRequest`], which carries exactly the four inputs tenant
//! resolution needs: host, path segments, headers and query parameters.

use crate::base::error::ResolveError;
use http::header::{HeaderName, HeaderValue, HOST};
use http::{HeaderMap, Uri};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Default)]
pub struct TenantRequest {
    host: String,
    path_segments: Vec<String>,
    headers: HeaderMap,
    query: HashMap<String, String>,
}

impl TenantRequest {
    /// Creates a request for `host`. The host is normalized immediately.
    pub fn new(host: &str) -> Self {
        Self {
            host: normalize_host(host),
            ..Self::default()
        }
    }

    /// Sets the request path; empty segments are dropped.
    pub fn with_path(mut self, path: &str) -> Self {
        self.path_segments = split_path(path);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, ResolveError> {
        let header_name = HeaderName::from_str(name).map_err(|_| ResolveError::InvalidHeader {
            name: name.to_string(),
        })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| ResolveError::InvalidHeader {
                name: name.to_string(),
            })?;
        self.headers.append(header_name, header_value);
        Ok(self)
    }

    /// Adds a query parameter. Like parsed queries, the first value for a key wins.
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
        self
    }

    /// Builds a request view from `http` request parts.
    ///
    /// The host comes from the `Host` header, falling back to the URI
    /// authority for absolute-form requests. Userinfo in the authority is
    /// never part of the host.
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        Self::from_http(&parts.uri, &parts.headers)
    }

    fn from_http(uri: &Uri, headers: &HeaderMap) -> Self {
        let host = headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| uri.authority().map(|a| a.host()))
            .unwrap_or_default();

        Self {
            host: normalize_host(host),
            path_segments: split_path(uri.path()),
            headers: headers.clone(),
            query: uri.query().map(parse_query).unwrap_or_default(),
        }
    }

    /// Normalized host: lower-case, no port, no trailing dot.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path_segments(&self) -> &[String] {
        &self.path_segments
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of header `name` if it is valid visible ASCII.
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }
}

impl<B> From<&http::Request<B>> for TenantRequest {
    fn from(request: &http::Request<B>) -> Self {
        Self::from_http(request.uri(), request.headers())
    }
}

/// Normalizes a host for matching.
///
/// Lower-cases, trims whitespace and a trailing dot, strips `:port`, and
/// unwraps bracketed IPv6 literals (`[::1]:8080` → `::1`). Bare IPv6
/// literals (more than one colon) are returned as-is.
pub fn normalize_host(raw: &str) -> String {
    let raw = raw.trim();

    let host = if let Some(rest) = raw.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else if raw.matches(':').count() == 1 {
        raw.split(':').next().unwrap_or(raw)
    } else {
        raw
    };

    host.trim_end_matches('.').to_ascii_lowercase()
}

fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}
