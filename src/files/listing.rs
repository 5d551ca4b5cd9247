use std::io;
use std::path::Path;

use tracing::debug;

/// Renders a directory as one HTML line per entry:
/// `<a href="name">name</a><br>`, with a trailing slash on both the href
/// and the label when the entry is itself a directory.
///
/// The directory is walked twice: a first pass sums the rendered length
/// of every entry to size the output buffer, a second pass emits the
/// fragments. If the directory changes between the passes the sums
/// disagree; the rendered bytes win and the mismatch is logged.
pub async fn render(path: &Path) -> io::Result<Vec<u8>> {
    let declared = measure(path).await?;

    let mut html = Vec::with_capacity(declared);
    let mut dir = tokio::fs::read_dir(path).await?;
    while let Some(entry) = dir.next_entry().await? {
        let name = entry.file_name();
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        push_entry(&mut html, &name.to_string_lossy(), is_dir);
    }

    if html.len() != declared {
        debug!(
            declared,
            actual = html.len(),
            "Directory changed between listing passes"
        );
    }

    Ok(html)
}

/// First pass: the total rendered length of all entries.
async fn measure(path: &Path) -> io::Result<usize> {
    let mut size = 0;
    let mut dir = tokio::fs::read_dir(path).await?;
    while let Some(entry) = dir.next_entry().await? {
        let name = entry.file_name();
        let mut len = name.to_string_lossy().len();
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            len += 1;
        }
        size += entry_len(len);
    }
    Ok(size)
}

/// Rendered length of one entry whose displayed name is `name_len` bytes.
fn entry_len(name_len: usize) -> usize {
    // <a href="NAME">NAME</a><br>
    name_len * 2 + 19
}

fn push_entry(out: &mut Vec<u8>, name: &str, is_dir: bool) {
    out.extend_from_slice(b"<a href=\"");
    out.extend_from_slice(name.as_bytes());
    if is_dir {
        out.push(b'/');
    }
    out.extend_from_slice(b"\">");
    out.extend_from_slice(name.as_bytes());
    if is_dir {
        out.push(b'/');
    }
    out.extend_from_slice(b"</a><br>");
}
