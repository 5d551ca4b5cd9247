//! HTTP/1.x protocol layer.
//!
//! This module implements the one-request-per-connection wire handling:
//! an incremental request parser over bounded buffers, the request and
//! response data model, and the wire serializer.
//!
//! # Architecture
//!
//! - **`headers`**: bounded field buffers and the capped, ordered header table
//! - **`request`**: parsed request representation (method, version, path, headers)
//! - **`parser`**: byte-by-byte request parser, tolerant of arbitrary chunking
//! - **`response`**: response representation with the fixed server headers
//! - **`writer`**: serializes responses and streams file bodies
//! - **`connection`**: drives one connection from read to response
//!
//! # Parser State Machine
//!
//! Each received byte advances one step:
//!
//! ```text
//!  METHOD ──sp──▶ PATH ──sp──▶ HTTP_VERSION
//!                                    │ CR
//!                                    ▼
//!            ┌──────────────────▶ NEWLINE ◀───────────────┐
//!            │ CR                    │ LF                 │ CR
//!            │                       ▼                    │
//!        HEADER_NAME ◀───────────────┘             HEADER_VAL
//!            │ ':'                                        ▲
//!            └──────────────▶ HEADER_NV_SPACE ──sp────────┘
//! ```
//!
//! A run of four terminator characters (`\r\n\r\n`) marks the header/body
//! boundary; the parser stops consuming there and reports how many bytes
//! of the final chunk it used, so the connection can hand the rest to the
//! body copy.
//!
//! # Example
//!
//! ```ignore
//! use microserve::config::Config;
//! use microserve::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cfg = Config::load()?;
//!     Server::bind(&cfg)?.run(std::future::pending()).await
//! }
//! ```

pub mod connection;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
