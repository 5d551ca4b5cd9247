use crate::auth::{AuthDecision, Authenticator};

/// Accepts exactly one configured username/password pair.
#[derive(Debug, Clone)]
pub struct FixedCredentials {
    username: String,
    password: String,
}

impl FixedCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Default for FixedCredentials {
    /// The out-of-the-box pair. Deployments should configure their own.
    fn default() -> Self {
        Self::new(
            "super secret username",
            "you would never guess this password",
        )
    }
}

impl Authenticator for FixedCredentials {
    fn check(&self, username: &str, password: &str) -> AuthDecision {
        if username == self.username && password == self.password {
            AuthDecision::Accepted
        } else {
            AuthDecision::Rejected
        }
    }
}
