use crate::http::headers::HeaderTable;

/// Request methods the server implements.
///
/// Only these three are representable; any other token on the wire is
/// rejected during parsing and never reaches a `Request` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Download a file or list a directory
    GET,
    /// PUT - Upload a file
    PUT,
    /// DELETE - Remove a file
    DELETE,
}

/// HTTP protocol versions accepted on the request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http09,
    Http10,
    Http11,
}

impl Method {
    /// Matches a raw method token, case-sensitively, against the supported set.
    ///
    /// # Example
    ///
    /// ```
    /// # use microserve::http::request::Method;
    /// assert_eq!(Method::from_token(b"GET"), Some(Method::GET));
    /// assert_eq!(Method::from_token(b"get"), None);
    /// ```
    pub fn from_token(token: &[u8]) -> Option<Self> {
        match token {
            b"GET" => Some(Method::GET),
            b"PUT" => Some(Method::PUT),
            b"DELETE" => Some(Method::DELETE),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
        }
    }
}

impl Version {
    /// Matches a raw version token against the supported literals.
    ///
    /// # Example
    ///
    /// ```
    /// # use microserve::http::request::Version;
    /// assert_eq!(Version::from_token(b"HTTP/1.1"), Some(Version::Http11));
    /// assert_eq!(Version::from_token(b"HTTP/2.0"), None);
    /// ```
    pub fn from_token(token: &[u8]) -> Option<Self> {
        match token {
            b"HTTP/0.9" => Some(Version::Http09),
            b"HTTP/1.0" => Some(Version::Http10),
            b"HTTP/1.1" => Some(Version::Http11),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http09 => "HTTP/0.9",
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

/// A parsed HTTP request.
///
/// Carries everything extracted from the request line and header section.
/// The body, if any, is not part of this value; the connection hands the
/// unconsumed bytes to the handler separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The HTTP method (GET, PUT, or DELETE)
    pub method: Method,
    /// HTTP version from the request line
    pub version: Version,
    /// The request path (e.g. "/index.html")
    pub path: String,
    /// Request headers in wire order
    pub headers: HeaderTable,
}

impl Request {
    /// Retrieves a header value by exact name, first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Parses the `Content-Length` header.
    ///
    /// Returns `None` when the header is missing or does not parse as a
    /// non-negative integer; surrounding whitespace is tolerated.
    pub fn content_length(&self) -> Option<u64> {
        self.header("Content-Length")
            .and_then(|v| v.trim().parse().ok())
    }
}
