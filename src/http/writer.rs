use anyhow::{Context, Result};
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::{Body, Response};

/// Chunk size for streaming file bodies.
const BUFFER_SIZE: usize = 1024;

/// Exact byte length of the serialized status line and header section,
/// including the terminating blank line.
pub fn head_len(response: &Response) -> usize {
    let mut len = response.version.as_str().len()
        + 1
        + response.status.as_str().len()
        + 1
        + response.status.reason_phrase().len()
        + 2;

    for header in response.headers.iter() {
        len += header.name.len() + 2 + header.value.len() + 2;
    }

    len + 2
}

/// Serializes the status line and headers into a buffer sized once up
/// front; [`head_len`] is the allocation contract.
pub fn encode_head(response: &Response) -> BytesMut {
    let mut buf = BytesMut::with_capacity(head_len(response));

    buf.extend_from_slice(response.version.as_str().as_bytes());
    buf.extend_from_slice(b" ");
    buf.extend_from_slice(response.status.as_str().as_bytes());
    buf.extend_from_slice(b" ");
    buf.extend_from_slice(response.status.reason_phrase().as_bytes());
    buf.extend_from_slice(b"\r\n");

    for header in response.headers.iter() {
        buf.extend_from_slice(header.name.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(header.value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    buf.extend_from_slice(b"\r\n");
    buf
}

/// Writes the head and then the body, if any.
///
/// File bodies are copied through a fixed buffer and capped at the length
/// declared when the response was built; a file that shrank in the
/// meantime ends the body early.
pub async fn send_response<W>(stream: &mut W, response: Response) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let head = encode_head(&response);
    stream
        .write_all(&head)
        .await
        .context("writing response head")?;

    match response.body {
        None => {}
        Some(Body::Bytes(bytes)) => {
            stream
                .write_all(&bytes)
                .await
                .context("writing response body")?;
        }
        Some(Body::File { mut file, len }) => {
            let mut buf = [0u8; BUFFER_SIZE];
            let mut sent: u64 = 0;
            while sent < len {
                let n = file.read(&mut buf).await.context("reading file body")?;
                if n == 0 {
                    break;
                }
                let take = (n as u64).min(len - sent) as usize;
                stream
                    .write_all(&buf[..take])
                    .await
                    .context("writing file body")?;
                sent += take as u64;
            }
        }
    }

    stream.flush().await.context("flushing response")?;
    Ok(())
}
