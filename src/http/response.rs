use tokio::fs::File;

use crate::http::headers::HeaderTable;
use crate::http::request::Version;

/// Value of the `Server` header on every response.
pub const SERVER_SOFTWARE: &str = env!("CARGO_PKG_NAME");

const TEXT_HTML: &str = "text/html";
const OCTET_STREAM: &str = "application/octet-stream";

/// HTTP status codes the server can send.
///
/// This is the complete set; nothing outside it ever goes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 100 Continue
    Continue,
    /// 200 OK
    Ok,
    /// 201 Created
    Created,
    /// 204 No Content
    NoContent,
    /// 400 Bad Request
    BadRequest,
    /// 401 Unauthorized
    Unauthorized,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 411 Length Required
    LengthRequired,
    /// 414 Request-URI Too Long
    UriTooLong,
    /// 431 Request Header Fields Too Large
    HeaderFieldsTooLarge,
    /// 500 Internal Server Error
    InternalServerError,
    /// 505 HTTP Version Not Supported
    VersionNotSupported,
}

impl StatusCode {
    /// The numeric code, for logging and comparisons.
    ///
    /// # Example
    ///
    /// ```
    /// # use microserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::Created.as_u16(), 201);
    /// assert_eq!(StatusCode::UriTooLong.as_u16(), 414);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Continue => 100,
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::NoContent => 204,
            StatusCode::BadRequest => 400,
            StatusCode::Unauthorized => 401,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::LengthRequired => 411,
            StatusCode::UriTooLong => 414,
            StatusCode::HeaderFieldsTooLarge => 431,
            StatusCode::InternalServerError => 500,
            StatusCode::VersionNotSupported => 505,
        }
    }

    /// The three-character code as it appears in the status line.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Continue => "100",
            StatusCode::Ok => "200",
            StatusCode::Created => "201",
            StatusCode::NoContent => "204",
            StatusCode::BadRequest => "400",
            StatusCode::Unauthorized => "401",
            StatusCode::NotFound => "404",
            StatusCode::MethodNotAllowed => "405",
            StatusCode::LengthRequired => "411",
            StatusCode::UriTooLong => "414",
            StatusCode::HeaderFieldsTooLarge => "431",
            StatusCode::InternalServerError => "500",
            StatusCode::VersionNotSupported => "505",
        }
    }

    /// The reason phrase that follows the code in the status line.
    ///
    /// # Example
    ///
    /// ```
    /// # use microserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::NoContent.reason_phrase(), "No Content");
    /// assert_eq!(StatusCode::UriTooLong.reason_phrase(), "Request-URI Too Long");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Continue => "Continue",
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::LengthRequired => "Length Required",
            StatusCode::UriTooLong => "Request-URI Too Long",
            StatusCode::HeaderFieldsTooLarge => "Request Header Fields Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::VersionNotSupported => "HTTP Version Not Supported",
        }
    }
}

/// Response content with a known length.
#[derive(Debug)]
pub enum Body {
    /// Content generated in memory.
    Bytes(Vec<u8>),
    /// Content streamed from an open file; `len` is the size reported by
    /// stat when the response was built.
    File { file: File, len: u64 },
}

impl Body {
    pub fn len(&self) -> u64 {
        match self {
            Body::Bytes(bytes) => bytes.len() as u64,
            Body::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A complete HTTP response ready for serialization.
///
/// Every response carries `Connection: closed` and a `Server` header;
/// responses with a body also carry `Content-Type` and `Content-Length`,
/// the latter always matching the body's length exactly.
#[derive(Debug)]
pub struct Response {
    pub version: Version,
    pub status: StatusCode,
    pub headers: HeaderTable,
    pub body: Option<Body>,
}

impl Response {
    fn new(status: StatusCode) -> Self {
        let mut headers = HeaderTable::new();
        headers.push("Connection", "closed");
        headers.push("Server", SERVER_SOFTWARE);
        Self {
            version: Version::Http11,
            status,
            headers,
            body: None,
        }
    }

    /// A header-only response.
    pub fn basic(status: StatusCode) -> Self {
        Self::new(status)
    }

    /// A response carrying a body of the given content type.
    pub fn with_body(status: StatusCode, content_type: &str, body: Body) -> Self {
        let mut response = Self::new(status);
        response.headers.push("Content-Type", content_type);
        // Rendered through the decimal formatter, so a zero-length body
        // still yields the one-digit "0".
        response.headers.push("Content-Length", body.len().to_string());
        response.body = Some(body);
        response
    }

    /// A short HTML diagnostic, used for filesystem failures.
    pub fn html(status: StatusCode, content: &str) -> Self {
        Self::with_body(status, TEXT_HTML, Body::Bytes(content.as_bytes().to_vec()))
    }

    /// A file download.
    pub fn file(file: File, len: u64) -> Self {
        Self::with_body(StatusCode::Ok, OCTET_STREAM, Body::File { file, len })
    }

    /// A rendered directory listing.
    pub fn listing(html: Vec<u8>) -> Self {
        Self::with_body(StatusCode::Ok, TEXT_HTML, Body::Bytes(html))
    }

    /// A 404 Not Found response.
    pub fn not_found() -> Self {
        Self::basic(StatusCode::NotFound)
    }
}
