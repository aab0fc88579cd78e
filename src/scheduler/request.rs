use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha1::{Digest, Sha1};
use std::collections::HashMap;

/// A single unit of crawl work, identified by its URL
///
/// A request whose every field besides the URL is at its default value is
/// "plain": it travels through the shared store as a bare URL string. Any
/// other request is additionally written to a per-task side-metadata hash
/// and reassembled on poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Request {
    /// URL to crawl; also the deduplication identity
    pub url: String,

    /// HTTP method override (None means the fetcher's default)
    pub method: Option<String>,

    /// Charset override for response decoding
    pub charset: Option<String>,

    /// Extra request headers
    pub headers: HashMap<String, String>,

    /// Cookies to send with the request
    pub cookies: HashMap<String, String>,

    /// Whether the response should be treated as binary content
    pub binary_content: bool,

    /// Optional request body (e.g. for POST requests)
    pub body: Option<RequestBody>,

    /// Caller-defined side data carried along with the request
    pub extras: HashMap<String, Value>,

    /// Current depth in the crawl tree (0 for seed URLs)
    pub depth: u32,

    /// Priority tier selector: positive = high, 0 = normal, negative = low
    pub priority: i64,
}

/// Opaque request payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Content type of the payload (e.g. "application/json")
    pub content_type: String,

    /// Raw payload bytes
    pub content: Vec<u8>,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: None,
            charset: None,
            headers: HashMap::new(),
            cookies: HashMap::new(),
            binary_content: false,
            body: None,
            extras: HashMap::new(),
            depth: 0,
            priority: 0,
        }
    }
}

impl Request {
    /// Create a plain request for the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the priority tier
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Set the crawl depth
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Add a request header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a cookie
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Add a caller-defined extra
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    /// Whether this request carries anything beyond its URL
    ///
    /// Determines if the request needs a side-metadata entry in addition to
    /// the bare URL stored in the queue or tier structures.
    pub fn has_extra_metadata(&self) -> bool {
        if !self.headers.is_empty() || !self.cookies.is_empty() {
            return true;
        }
        if is_present(&self.charset) || is_present(&self.method) {
            return true;
        }
        if self.binary_content || self.body.is_some() {
            return true;
        }
        if !self.extras.is_empty() {
            return true;
        }
        self.depth != 0 || self.priority != 0
    }
}

fn is_present(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |s| !s.trim().is_empty())
}

/// SHA-1 hex digest of a raw URL string
///
/// Used as the field name for side-metadata hash entries. Chosen for its
/// negligible collision probability on URL strings, not for cryptographic
/// strength.
pub fn url_digest(url: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
