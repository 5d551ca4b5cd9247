use thiserror::Error;

use crate::http::headers::{
    FieldBuf, HeaderTable, HEADER_NAME_SIZE, HEADER_VALUE_SIZE,
};
use crate::http::request::{Method, Request, Version};
use crate::http::response::StatusCode;

/// Maximum length of a method token in bytes ("DELETE" is the longest).
pub const METHOD_BUFFER_SIZE: usize = 6;
/// Maximum length of a request path in bytes.
pub const PATH_BUFFER_SIZE: usize = 512;
/// Maximum length of a version token in bytes ("HTTP/1.1").
pub const HTTP_VERSION_SIZE: usize = 8;

/// Everything that can go wrong while parsing a request.
///
/// Each variant maps to exactly one response status via
/// [`ParseError::status`]; the connection answers with that status and
/// closes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("unsupported method")]
    UnsupportedMethod,
    #[error("method token too long")]
    MethodTooBig,
    #[error("request path too long")]
    PathTooBig,
    #[error("unsupported http version")]
    UnsupportedVersion,
    #[error("http version token too long")]
    VersionTooBig,
    #[error("too many headers")]
    TooManyHeaders,
    #[error("header name too long")]
    HeaderNameTooBig,
    #[error("header value too long")]
    HeaderValueTooBig,
    #[error("expected new line")]
    ExpectedNewLine,
    #[error("expected space between header name and value")]
    ExpectedNameValueSpace,
    #[error("parser driven past the end of a request")]
    Internal,
}

impl ParseError {
    /// The status code sent back for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::UnsupportedMethod | ParseError::MethodTooBig => {
                StatusCode::MethodNotAllowed
            }
            ParseError::UnsupportedVersion | ParseError::VersionTooBig => {
                StatusCode::VersionNotSupported
            }
            ParseError::PathTooBig => StatusCode::UriTooLong,
            ParseError::TooManyHeaders
            | ParseError::HeaderNameTooBig
            | ParseError::HeaderValueTooBig => StatusCode::HeaderFieldsTooLarge,
            ParseError::ExpectedNewLine | ParseError::ExpectedNameValueSpace => {
                StatusCode::BadRequest
            }
            ParseError::Internal => StatusCode::InternalServerError,
        }
    }
}

/// Result of feeding a chunk into the parser.
#[derive(Debug)]
pub enum ParseStatus {
    /// The header section has not ended yet; feed more bytes.
    NeedMore,
    /// The header section ended. `consumed` counts the bytes of the last
    /// chunk that belonged to it; anything after is the start of the body.
    Complete { request: Request, consumed: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Method,
    Path,
    Version,
    NewLine,
    HeaderName,
    HeaderNvSpace,
    HeaderVal,
    Done,
}

/// Incremental request-line and header parser.
///
/// Bytes arrive in chunks of whatever size the socket happens to deliver;
/// the parser walks them one at a time through a fixed set of states and
/// accumulates each field in a bounded [`FieldBuf`]. The header/body
/// boundary is a run of four terminator characters (`\r\n\r\n`); the
/// parser stops consuming exactly there, so body bytes are never pulled
/// into header state. The result is the same no matter how the input was
/// fragmented.
///
/// Method and version tokens are validated against their literal sets
/// only once the boundary is reached; field-length errors fire earlier,
/// during accumulation.
#[derive(Debug)]
pub struct RequestParser {
    state: State,
    method: FieldBuf,
    path: FieldBuf,
    version: FieldBuf,
    name: FieldBuf,
    value: FieldBuf,
    headers: HeaderTable,
    terminator_run: u8,
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            state: State::Method,
            method: FieldBuf::new(METHOD_BUFFER_SIZE),
            path: FieldBuf::new(PATH_BUFFER_SIZE),
            version: FieldBuf::new(HTTP_VERSION_SIZE),
            name: FieldBuf::new(HEADER_NAME_SIZE),
            value: FieldBuf::new(HEADER_VALUE_SIZE),
            headers: HeaderTable::new(),
            terminator_run: 0,
        }
    }

    /// Consumes one chunk of the byte stream.
    ///
    /// Errors are terminal: after the first `Err` the parser must be
    /// discarded. Feeding more data after `Complete` is an error as well;
    /// each connection carries exactly one request.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<ParseStatus, ParseError> {
        for (i, &byte) in chunk.iter().enumerate() {
            if self.step(byte)? {
                let request = self.finish()?;
                return Ok(ParseStatus::Complete {
                    request,
                    consumed: i + 1,
                });
            }
        }
        Ok(ParseStatus::NeedMore)
    }

    /// Advances the state machine by one byte. Returns `true` when the
    /// terminator run reaches the header/body boundary.
    fn step(&mut self, byte: u8) -> Result<bool, ParseError> {
        match self.state {
            State::Method => {
                if byte == b' ' {
                    self.state = State::Path;
                } else {
                    self.method
                        .push(byte)
                        .map_err(|_| ParseError::MethodTooBig)?;
                }
            }

            State::Path => {
                if byte == b' ' {
                    self.state = State::Version;
                } else {
                    self.path.push(byte).map_err(|_| ParseError::PathTooBig)?;
                }
            }

            State::Version => {
                if byte == b'\r' {
                    self.state = State::NewLine;
                    self.terminator_run += 1;
                } else {
                    self.version
                        .push(byte)
                        .map_err(|_| ParseError::VersionTooBig)?;
                }
            }

            State::NewLine => {
                if byte == b'\n' {
                    self.state = State::HeaderName;
                    self.terminator_run += 1;
                    self.name.clear();
                    self.value.clear();
                } else {
                    return Err(ParseError::ExpectedNewLine);
                }
            }

            State::HeaderName => {
                if byte == b'\r' {
                    self.state = State::NewLine;
                    self.terminator_run += 1;
                } else {
                    self.terminator_run = 0;
                    if byte == b':' {
                        self.state = State::HeaderNvSpace;
                    } else if self.headers.is_full() {
                        return Err(ParseError::TooManyHeaders);
                    } else {
                        self.name
                            .push(byte)
                            .map_err(|_| ParseError::HeaderNameTooBig)?;
                    }
                }
            }

            State::HeaderNvSpace => {
                if byte == b' ' {
                    self.state = State::HeaderVal;
                } else {
                    return Err(ParseError::ExpectedNameValueSpace);
                }
            }

            State::HeaderVal => {
                if byte == b'\r' {
                    self.state = State::NewLine;
                    self.terminator_run += 1;
                    let name = self.name.take_string();
                    let value = self.value.take_string();
                    self.headers
                        .try_push(name, value)
                        .map_err(|_| ParseError::TooManyHeaders)?;
                } else {
                    self.terminator_run = 0;
                    self.value
                        .push(byte)
                        .map_err(|_| ParseError::HeaderValueTooBig)?;
                }
            }

            State::Done => return Err(ParseError::Internal),
        }

        Ok(self.terminator_run >= 4)
    }

    /// Validates the accumulated tokens and assembles the request.
    fn finish(&mut self) -> Result<Request, ParseError> {
        self.state = State::Done;

        let method = Method::from_token(self.method.as_bytes())
            .ok_or(ParseError::UnsupportedMethod)?;
        let version = Version::from_token(self.version.as_bytes())
            .ok_or(ParseError::UnsupportedVersion)?;

        Ok(Request {
            method,
            version,
            path: self.path.take_string(),
            headers: std::mem::take(&mut self.headers),
        })
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}
