/// Edge existence check - is the file currently served from the CDN's public domain?
use super::guarded;
use crate::clients::EdgeProbe;
use reqwest::Url;
use resilience::ServiceConfig;
use std::sync::Arc;
use tracing::debug;

pub struct EdgeChecker {
    probe: Arc<dyn EdgeProbe>,
    policy: ServiceConfig,
}

impl EdgeChecker {
    pub fn new(probe: Arc<dyn EdgeProbe>, policy: ServiceConfig) -> Self {
        Self { probe, policy }
    }

    /// `true` only for a 2xx answer. Every other status, transport error or
    /// timeout counts as "not cached".
    pub async fn exists(&self, domain: &str, edge_path: &str) -> bool {
        let Some(url) = edge_url(domain, edge_path) else {
            debug!(domain, edge_path, "Edge domain is not a valid URL base");
            return false;
        };

        match guarded(&self.policy, || self.probe.fetch_status(&url)).await {
            Ok(status) => {
                debug!(%url, status, "Edge probe answered");
                (200..300).contains(&status)
            }
            Err(err) => {
                debug!(%url, error = %err, "Edge probe failed");
                false
            }
        }
    }
}

/// `https://<domain>/<path>` with every path segment percent-encoded.
///
/// A domain that already carries a scheme is kept as is. `None` when the domain
/// does not form a valid URL.
pub fn edge_url(domain: &str, edge_path: &str) -> Option<String> {
    let domain = domain.trim_end_matches('/');
    let base = if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    };

    let mut url = Url::parse(&base).ok()?;
    url.path_segments_mut()
        .ok()?
        .clear()
        .extend(edge_path.trim_start_matches('/').split('/'));
    Some(url.to_string())
}
