//! Ingress reachability probe
//!
//! A single bounded GET against the application's public URL. Reachability is
//! advisory: every transport failure (DNS, refused connection, timeout) is
//! reported as unreachable rather than as an error.

use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::Client;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("argo-deployer/", env!("CARGO_PKG_VERSION"));

/// True iff the URL answers with a status in the 2xx/3xx range
///
/// Redirects are not followed: a 3xx from the ingress already proves it is
/// routed.
pub async fn probe(url: &str, timeout: Duration) -> bool {
    let client = match Client::builder()
        .timeout(timeout)
        .redirect(Policy::none())
        .user_agent(USER_AGENT)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!("Failed to build HTTP client for reachability probe: {}", e);
            return false;
        }
    };

    match client.get(url).send().await {
        Ok(resp) => {
            let status = resp.status();
            debug!("Probe {} returned {}", url, status);
            (200..400).contains(&status.as_u16())
        }
        Err(e) => {
            debug!("Probe {} failed: {}", url, e);
            false
        }
    }
}
