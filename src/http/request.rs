use std::collections::HashMap;

/// HTTP request methods.
///
/// Represents the HTTP method/verb of a request. Requests with a method not
/// listed here are rejected at the parser as malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of the method (case-sensitive, typically uppercase)
    ///
    /// # Returns
    ///
    /// `Some(Method)` if the string matches a known method, `None` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// # use gale::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "HEAD" => Some(Method::HEAD),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }
}

/// One in-flight HTTP request, built up from parser events.
///
/// Constructed when header parsing completes; the body is appended chunk by
/// chunk as it arrives on the wire. A connection holds at most one request
/// at a time.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The raw request target as received, path plus query (e.g. "/search?q=x")
    pub url: String,
    /// HTTP version, "1.0" or "1.1"
    pub version: String,
    /// Request headers as key-value pairs
    pub headers: HashMap<String, String>,
    /// Request body, empty until body chunks arrive
    pub body: Vec<u8>,
}

impl Request {
    /// Builds a request from the header list accumulated during parsing.
    ///
    /// Duplicate header names collapse to a single entry, later values
    /// overwriting earlier ones.
    pub fn new(method: Method, url: String, version: String, headers: Vec<(String, String)>) -> Self {
        Self {
            method,
            url,
            version,
            headers: headers.into_iter().collect(),
            body: Vec::new(),
        }
    }

    /// Retrieves a header value by name (exact match on the name as sent).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Retrieves the Content-Length header value and parses it as a usize.
    ///
    /// Returns 0 if the header is missing or not a valid number.
    pub fn content_length(&self) -> usize {
        self.header("Content-Length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Whether the client asked for the connection to stay open.
    ///
    /// Checks the Connection header; without one, HTTP/1.1 defaults to
    /// keep-alive and HTTP/1.0 to close. The engine decides actual reuse
    /// from the parser plus the shutdown signal; this accessor only
    /// reflects the request itself.
    pub fn keep_alive(&self) -> bool {
        match self.header("Connection") {
            Some(v) => v.eq_ignore_ascii_case("keep-alive"),
            None => self.version != "1.0",
        }
    }
}
