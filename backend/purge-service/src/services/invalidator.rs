/// Invalidation dispatch - asks the CDN to evict cached paths
///
/// The live dispatcher submits one invalidation request per call; batching is
/// decided by the caller through how many targets it passes. The dry-run
/// dispatcher only logs the equivalent AWS CLI command.
use super::guarded;
use crate::clients::CdnClient;
use crate::error::ProviderError;
use crate::models::{Operation, PurgeOutcome, PurgeStatus, PurgeTarget};
use async_trait::async_trait;
use resilience::ServiceConfig;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[async_trait]
pub trait InvalidationDispatcher: Send + Sync {
    /// One outcome per target, in the order the targets were given
    async fn invalidate(&self, distribution_id: &str, targets: &[PurgeTarget]) -> Vec<PurgeOutcome>;
}

pub struct LiveDispatcher {
    client: Arc<dyn CdnClient>,
    policy: ServiceConfig,
}

impl LiveDispatcher {
    pub fn new(client: Arc<dyn CdnClient>, policy: ServiceConfig) -> Self {
        Self { client, policy }
    }
}

#[async_trait]
impl InvalidationDispatcher for LiveDispatcher {
    async fn invalidate(&self, distribution_id: &str, targets: &[PurgeTarget]) -> Vec<PurgeOutcome> {
        if targets.is_empty() {
            return Vec::new();
        }

        let paths = unique_paths(targets);
        // Same reference on every attempt so a retried request cannot start a second invalidation
        let caller_reference = format!("asset-purge-{}", Uuid::new_v4());

        let result = guarded(&self.policy, || {
            self.client
                .create_invalidation(distribution_id, &paths, &caller_reference)
        })
        .await;

        let (status, detail) = match result {
            Ok(ticket) => {
                info!(
                    distribution_id,
                    invalidation_id = %ticket.id,
                    invalidation_status = %ticket.status,
                    paths = paths.len(),
                    "Invalidation created"
                );
                (PurgeStatus::InvalidationStarted, ticket.id)
            }
            Err(ProviderError::AccessDenied(message)) => {
                warn!(distribution_id, %message, "Invalidation denied");
                (PurgeStatus::Denied, message)
            }
            Err(err) => {
                warn!(distribution_id, error = %err, "Invalidation failed");
                (PurgeStatus::Failed, err.to_string())
            }
        };

        targets
            .iter()
            .map(|target| {
                PurgeOutcome::new(target.clone(), Operation::Invalidate, status)
                    .with_detail(detail.clone())
            })
            .collect()
    }
}

/// Logs the invalidation that would be sent and reports it as started
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunDispatcher;

#[async_trait]
impl InvalidationDispatcher for DryRunDispatcher {
    async fn invalidate(&self, distribution_id: &str, targets: &[PurgeTarget]) -> Vec<PurgeOutcome> {
        if targets.is_empty() {
            return Vec::new();
        }

        let command = cli_command(distribution_id, &unique_paths(targets));
        info!(%command, "Dry run, invalidation not sent");

        targets
            .iter()
            .map(|target| {
                PurgeOutcome::new(
                    target.clone(),
                    Operation::Invalidate,
                    PurgeStatus::InvalidationStarted,
                )
                .with_detail("dry-run")
            })
            .collect()
    }
}

/// Equivalent AWS CLI invocation
pub fn cli_command(distribution_id: &str, paths: &[String]) -> String {
    format!(
        "aws cloudfront create-invalidation --distribution-id {} --paths {}",
        distribution_id,
        paths.join(" ")
    )
}

fn unique_paths(targets: &[PurgeTarget]) -> Vec<String> {
    let mut paths: Vec<String> = Vec::with_capacity(targets.len());
    for target in targets {
        if !paths.contains(&target.edge_path) {
            paths.push(target.edge_path.clone());
        }
    }
    paths
}
