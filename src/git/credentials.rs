//! Token-based HTTP credentials for Git remotes

use std::fmt;

use git2::{Cred, CredentialType, ErrorClass, ErrorCode, RemoteCallbacks};

/// Username sent alongside the access token
pub const GIT_USERNAME: &str = "oauth2";

#[derive(Clone)]
pub struct GitCredentials {
    token: String,
}

impl fmt::Debug for GitCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitCredentials")
            .field("username", &GIT_USERNAME)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl GitCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Callbacks answering the remote's credential challenge once
    ///
    /// libgit2 re-invokes the credential callback after a rejection, so a
    /// second invocation reports the token as rejected instead of looping.
    pub fn remote_callbacks(&self) -> RemoteCallbacks<'_> {
        let mut callbacks = RemoteCallbacks::new();
        let mut attempted = false;
        callbacks.credentials(move |_url, _username, allowed| {
            if attempted {
                return Err(git2::Error::new(
                    ErrorCode::Auth,
                    ErrorClass::Http,
                    "access token rejected by remote",
                ));
            }
            attempted = true;
            if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                Cred::userpass_plaintext(GIT_USERNAME, &self.token)
            } else {
                Err(git2::Error::new(
                    ErrorCode::Auth,
                    ErrorClass::Http,
                    "remote does not accept username/token credentials",
                ))
            }
        });
        callbacks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let creds = GitCredentials::new("ghp_very_secret");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("ghp_very_secret"));
        assert!(rendered.contains("oauth2"));
    }
}
