use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::auth::{AuthDecision, Authenticator};
use crate::http::request::Request;

/// Why a request failed authentication.
///
/// The wire response is 401 in every case; the distinction exists for
/// logging only and is never exposed to the client.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("no credentials supplied")]
    NoCredentials,
    #[error("malformed authorization header")]
    Malformed,
    #[error("credentials rejected")]
    Rejected,
    #[error("authentication backend unavailable")]
    Unavailable,
}

/// Checks the request's `Authorization` header against `backend`.
///
/// The header value is split on the first space into scheme and payload
/// (the scheme token is not inspected further), the payload is
/// base64-decoded, and the decoded text is split on the first colon into
/// username and password. Base64 input must be padded to a multiple of
/// four characters; anything else is malformed, as is a missing or empty
/// username or password.
pub fn authorize(request: &Request, backend: &dyn Authenticator) -> Result<(), AuthFailure> {
    let value = request
        .header("Authorization")
        .ok_or(AuthFailure::NoCredentials)?;

    let (scheme, encoded) = value.split_once(' ').ok_or(AuthFailure::Malformed)?;
    if scheme.is_empty() || encoded.is_empty() {
        return Err(AuthFailure::Malformed);
    }

    let decoded = STANDARD
        .decode(encoded)
        .map_err(|_| AuthFailure::Malformed)?;
    let text = String::from_utf8(decoded).map_err(|_| AuthFailure::Malformed)?;

    let (username, password) = text.split_once(':').ok_or(AuthFailure::Malformed)?;
    if username.is_empty() || password.is_empty() {
        return Err(AuthFailure::Malformed);
    }

    match backend.check(username, password) {
        AuthDecision::Accepted => Ok(()),
        AuthDecision::Rejected => Err(AuthFailure::Rejected),
        AuthDecision::Unavailable => Err(AuthFailure::Unavailable),
    }
}
