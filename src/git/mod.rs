//! GitOps repository access
//!
//! All functions here are blocking (libgit2). Async callers run them inside
//! `tokio::task::spawn_blocking`.

mod credentials;
mod presence;
mod publisher;
mod workspace;

#[cfg(test)]
pub(crate) mod test_support;

pub use credentials::{GitCredentials, GIT_USERNAME};
pub use presence::read_git_presence;
pub use publisher::{publish, PublishOutcome, BOT_EMAIL, BOT_NAME};
pub use workspace::Workspace;
