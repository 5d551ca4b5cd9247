use std::io;
use std::path::PathBuf;

use pwhash::unix;
use tracing::warn;

use crate::auth::{AuthDecision, Authenticator};

/// Verifies credentials against an `/etc/shadow` style file.
///
/// Each line is `name:hash:...`; the hash field is checked with the
/// crypt(3)-compatible schemes `pwhash` understands. Locked entries
/// (`!`, `*`) never verify, so they come back rejected. Reading the file
/// usually requires elevated privileges; an unreadable file reports the
/// backend as unavailable rather than rejecting the user.
#[derive(Debug, Clone)]
pub struct ShadowFile {
    path: PathBuf,
}

impl ShadowFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The system shadow database.
    pub fn system() -> Self {
        Self::new("/etc/shadow")
    }

    fn lookup(&self, username: &str) -> Result<Option<String>, io::Error> {
        let contents = std::fs::read_to_string(&self.path)?;
        for line in contents.lines() {
            let mut fields = line.split(':');
            if fields.next() == Some(username) {
                return Ok(fields.next().map(str::to_owned));
            }
        }
        Ok(None)
    }
}

impl Authenticator for ShadowFile {
    fn check(&self, username: &str, password: &str) -> AuthDecision {
        let hash = match self.lookup(username) {
            Ok(Some(hash)) => hash,
            Ok(None) => return AuthDecision::Rejected,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Shadow file unreadable");
                return AuthDecision::Unavailable;
            }
        };

        if unix::verify(password, &hash) {
            AuthDecision::Accepted
        } else {
            AuthDecision::Rejected
        }
    }
}
