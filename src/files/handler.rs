use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::auth::{authorize, Authenticator};
use crate::files::listing;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::http::writer;

/// Chunk size for copying an upload body to disk.
const BUFFER_SIZE: usize = 1024;

/// Routes parsed requests to filesystem operations under a fixed root.
pub struct FileHandler {
    root: PathBuf,
    auth: Arc<dyn Authenticator>,
    read_timeout: Duration,
}

impl FileHandler {
    pub fn new(root: PathBuf, auth: Arc<dyn Authenticator>, read_timeout: Duration) -> Self {
        Self {
            root,
            auth,
            read_timeout,
        }
    }

    /// The directory all request paths resolve under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deadline applied to every receive call on a connection.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Handles one request and sends the response.
    ///
    /// `body_prefix` holds any bytes that arrived in the same chunk as the
    /// end of the header section; for PUT they are the start of the upload.
    pub async fn handle(
        &self,
        stream: &mut TcpStream,
        request: &Request,
        body_prefix: &[u8],
    ) -> Result<()> {
        let response = match request.method {
            Method::GET => self.get(request).await,
            Method::PUT => self.put(stream, request, body_prefix).await?,
            Method::DELETE => self.delete(request).await,
        };

        info!(
            method = ?request.method,
            path = %request.path,
            status = response.status.as_u16(),
            "Request handled"
        );

        writer::send_response(stream, response).await
    }

    async fn get(&self, request: &Request) -> Response {
        let Some(path) = self.resolve(&request.path) else {
            return Response::not_found();
        };

        let meta = match fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(_) => {
                debug!(path = %path.display(), "Path does not exist");
                return Response::not_found();
            }
        };

        if meta.is_file() {
            match fs::File::open(&path).await {
                Ok(file) => Response::file(file, meta.len()),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Can't open file");
                    Response::html(StatusCode::InternalServerError, "Can't open file")
                }
            }
        } else if meta.is_dir() {
            match listing::render(&path).await {
                Ok(html) => Response::listing(html),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Can't list directory");
                    Response::not_found()
                }
            }
        } else {
            // Fifos, sockets and such are not served.
            Response::not_found()
        }
    }

    async fn put(
        &self,
        stream: &mut TcpStream,
        request: &Request,
        body_prefix: &[u8],
    ) -> Result<Response> {
        if let Err(reason) = authorize(request, self.auth.as_ref()) {
            debug!(reason = %reason, "Authentication failed");
            return Ok(Response::basic(StatusCode::Unauthorized));
        }

        let Some(path) = self.resolve(&request.path) else {
            return Ok(Response::not_found());
        };

        // Checked before the file is touched, so a rejected upload leaves
        // no empty file behind.
        let Some(length) = request.content_length() else {
            return Ok(Response::html(
                StatusCode::LengthRequired,
                "Expected Content-Length header",
            ));
        };

        let mut file = match fs::File::create(&path).await {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Can't create file");
                return Ok(Response::html(
                    StatusCode::InternalServerError,
                    "Can't create file",
                ));
            }
        };

        // The only Expect directive is 100-continue.
        if request.header("Expect").is_some() {
            writer::send_response(stream, Response::basic(StatusCode::Continue)).await?;
        }

        if self
            .copy_body(stream, &mut file, body_prefix, length)
            .await?
        {
            Ok(Response::basic(StatusCode::Created))
        } else {
            warn!(
                path = %path.display(),
                expected = length,
                "Connection closed before the full body arrived"
            );
            Ok(Response::basic(StatusCode::BadRequest))
        }
    }

    async fn delete(&self, request: &Request) -> Response {
        if let Err(reason) = authorize(request, self.auth.as_ref()) {
            debug!(reason = %reason, "Authentication failed");
            return Response::basic(StatusCode::Unauthorized);
        }

        let Some(path) = self.resolve(&request.path) else {
            return Response::not_found();
        };

        let meta = match fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Can't stat path for removal");
                return Response::basic(StatusCode::InternalServerError);
            }
        };

        let removed = if meta.is_dir() {
            fs::remove_dir(&path).await
        } else {
            fs::remove_file(&path).await
        };

        match removed {
            Ok(()) => Response::basic(StatusCode::NoContent),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Can't remove path");
                Response::basic(StatusCode::InternalServerError)
            }
        }
    }

    /// Copies exactly `length` body bytes from the connection to `file`,
    /// starting with the bytes already read past the header section.
    /// Returns `false` when the peer closes before the count is reached;
    /// whatever was written stays on disk.
    async fn copy_body(
        &self,
        stream: &mut TcpStream,
        file: &mut fs::File,
        prefix: &[u8],
        length: u64,
    ) -> Result<bool> {
        let mut remaining = length;

        let take = prefix.len().min(remaining as usize);
        file.write_all(&prefix[..take])
            .await
            .context("writing upload")?;
        remaining -= take as u64;

        let mut buf = [0u8; BUFFER_SIZE];
        while remaining > 0 {
            let n = timeout(self.read_timeout, stream.read(&mut buf))
                .await
                .context("timed out reading request body")?
                .context("reading request body")?;
            if n == 0 {
                break;
            }
            let take = n.min(remaining as usize);
            file.write_all(&buf[..take]).await.context("writing upload")?;
            remaining -= take as u64;
        }

        // Flushed on the early-EOF exit as well, so a truncated upload
        // still lands its bytes on disk.
        file.flush().await.context("flushing upload")?;
        Ok(remaining == 0)
    }

    /// Maps a request path onto the served root. Paths trying to climb out
    /// of the root resolve to nothing.
    fn resolve(&self, raw: &str) -> Option<PathBuf> {
        let relative = raw.trim_start_matches('/');
        let mut path = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(path)
    }
}
