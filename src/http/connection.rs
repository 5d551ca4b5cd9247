use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::files::FileHandler;
use crate::http::parser::{ParseError, ParseStatus, RequestParser};
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::writer;

/// Receive buffer size; the socket fills as much of it as it has.
const BUFFER_SIZE: usize = 1024;

enum ReadOutcome {
    /// A complete request, plus any body bytes read past the boundary.
    Complete { request: Request, leftover: Vec<u8> },
    Failed(ParseError),
    /// Peer closed before the header section ended.
    Eof { received_any: bool },
}

/// One accepted client connection.
///
/// Handles exactly one request: read and parse the header section,
/// dispatch, send the response, close.
pub struct Connection {
    stream: TcpStream,
    handler: Arc<FileHandler>,
}

impl Connection {
    pub fn new(stream: TcpStream, handler: Arc<FileHandler>) -> Self {
        Self { stream, handler }
    }

    pub async fn run(mut self) -> Result<()> {
        match self.read_request().await? {
            ReadOutcome::Complete { request, leftover } => {
                self.handler
                    .handle(&mut self.stream, &request, &leftover)
                    .await?;
            }

            ReadOutcome::Failed(err) => {
                warn!(error = %err, "Request rejected");
                writer::send_response(&mut self.stream, Response::basic(err.status())).await?;
            }

            ReadOutcome::Eof { received_any: false } => {
                debug!("Connection closed without sending a request");
            }

            ReadOutcome::Eof { received_any: true } => {
                warn!("Connection closed mid-request");
                writer::send_response(
                    &mut self.stream,
                    Response::basic(StatusCode::BadRequest),
                )
                .await?;
            }
        }

        let _ = self.stream.shutdown().await;
        Ok(())
    }

    async fn read_request(&mut self) -> Result<ReadOutcome> {
        let mut parser = RequestParser::new();
        let mut buf = [0u8; BUFFER_SIZE];
        let mut received_any = false;

        loop {
            let n = timeout(self.handler.read_timeout(), self.stream.read(&mut buf))
                .await
                .context("timed out reading request")?
                .context("reading request")?;

            if n == 0 {
                return Ok(ReadOutcome::Eof { received_any });
            }
            received_any = true;

            match parser.feed(&buf[..n]) {
                Ok(ParseStatus::NeedMore) => {}
                Ok(ParseStatus::Complete { request, consumed }) => {
                    return Ok(ReadOutcome::Complete {
                        request,
                        leftover: buf[consumed..n].to_vec(),
                    });
                }
                Err(err) => return Ok(ReadOutcome::Failed(err)),
            }
        }
    }
}
