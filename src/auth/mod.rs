//! Authentication for mutating requests.
//!
//! PUT and DELETE are gated behind HTTP Basic authentication. The
//! credential check itself is pluggable: [`basic`] extracts and decodes
//! the `Authorization` header, then delegates the allow/deny decision to
//! whichever [`Authenticator`] the server was configured with.

pub mod basic;
pub mod fixed;
pub mod shadow;

pub use basic::{authorize, AuthFailure};
pub use fixed::FixedCredentials;
pub use shadow::ShadowFile;

/// Outcome of a credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    /// The credentials matched.
    Accepted,
    /// The credentials did not match.
    Rejected,
    /// The backing store could not be consulted.
    Unavailable,
}

/// A credential-checking backend.
///
/// Implementations answer a single question: do this username and
/// password identify a user allowed to mutate the served tree? Anything
/// other than [`AuthDecision::Accepted`] leaves the request unauthorized.
pub trait Authenticator: Send + Sync {
    fn check(&self, username: &str, password: &str) -> AuthDecision;
}
