/// Purge coordinator - drives a whole run
///
/// For every identifier: resolve targets, then per target delete the store
/// object and (when a distribution is configured) check the edge and request an
/// invalidation. Identifiers run concurrently up to the configured limit; the
/// steps of one identifier always run in order.
use super::{guarded, EdgeChecker, InvalidationDispatcher, KeyResolver, ObjectDeleter};
use super::{DryRunDispatcher, LiveDispatcher};
use crate::clients::{CdnClient, EdgeProbe, ObjectStoreClient};
use crate::config::{PurgeConfig, RuntimeConfig};
use crate::error::{PurgeError, Result};
use crate::models::{Operation, PurgeOutcome, PurgeStatus, PurgeTarget, RunSummary};
use crate::report::{ReportSink, RunPlan};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use resilience::{cdn_api_config, edge_probe_config, object_storage_config, ServiceConfig};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{info, info_span, warn, Instrument};

/// Provider handles a run is built from
#[derive(Clone)]
pub struct Capabilities {
    pub store: Arc<dyn ObjectStoreClient>,
    /// Required when a distribution id is configured
    pub cdn: Option<Arc<dyn CdnClient>>,
    pub probe: Arc<dyn EdgeProbe>,
}

/// Everything the CDN steps need, resolved once at startup
pub struct CdnStage {
    pub distribution_id: String,
    pub domain: String,
    pub checker: EdgeChecker,
    pub dispatcher: Arc<dyn InvalidationDispatcher>,
}

pub struct PurgeCoordinator {
    bucket: String,
    resolver: KeyResolver,
    deleter: ObjectDeleter,
    cdn: Option<CdnStage>,
    runtime: RuntimeConfig,
}

impl PurgeCoordinator {
    pub fn new(
        bucket: impl Into<String>,
        resolver: KeyResolver,
        deleter: ObjectDeleter,
        runtime: RuntimeConfig,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            resolver,
            deleter,
            cdn: None,
            runtime,
        }
    }

    pub fn with_cdn(mut self, stage: CdnStage) -> Self {
        self.cdn = Some(stage);
        self
    }

    /// Verify provider access and build a ready coordinator.
    ///
    /// Checks that the bucket is reachable and, when a distribution is
    /// configured, looks up its public domain. Either failure aborts with
    /// [`PurgeError::Connection`] before any target is touched.
    pub async fn connect(config: &PurgeConfig, capabilities: Capabilities) -> Result<Self> {
        let storage_policy = policy(object_storage_config(), &config.runtime);

        guarded(&storage_policy, || capabilities.store.verify(&config.storage.bucket))
            .await
            .map_err(|err| {
                PurgeError::Connection(format!("bucket {}: {}", config.storage.bucket, err))
            })?;
        info!(bucket = %config.storage.bucket, "Object store reachable");

        let coordinator = Self::new(
            config.storage.bucket.clone(),
            KeyResolver::new(config.paths.clone()),
            ObjectDeleter::new(capabilities.store.clone(), storage_policy),
            config.runtime.clone(),
        );

        let Some(cdn_config) = &config.cdn else {
            info!("No distribution configured, CDN steps disabled");
            return Ok(coordinator);
        };

        let cdn = capabilities.cdn.ok_or_else(|| {
            PurgeError::Connection("distribution configured but no CDN client available".to_string())
        })?;
        let cdn_policy = policy(cdn_api_config(), &config.runtime);

        let distribution_id = cdn_config.distribution_id.clone();
        let domain = guarded(&cdn_policy, || cdn.distribution_domain(&distribution_id))
            .await
            .map_err(|err| PurgeError::Connection(format!("distribution {}: {}", distribution_id, err)))?;
        info!(%distribution_id, %domain, "Distribution resolved");

        let dispatcher: Arc<dyn InvalidationDispatcher> = if config.runtime.dry_run {
            Arc::new(DryRunDispatcher)
        } else {
            Arc::new(LiveDispatcher::new(cdn, cdn_policy))
        };

        Ok(coordinator.with_cdn(CdnStage {
            distribution_id,
            domain,
            checker: EdgeChecker::new(
                capabilities.probe,
                policy(edge_probe_config(), &config.runtime),
            ),
            dispatcher,
        }))
    }

    /// Process every identifier and return the aggregated summary.
    ///
    /// Per-target failures are outcomes, not errors. Once `shutdown` flips to
    /// `true` no further identifiers are started; those already in flight finish
    /// and the summary is marked cancelled.
    pub async fn run(
        &self,
        identifiers: &[String],
        sink: &dyn ReportSink,
        shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary> {
        if identifiers.is_empty() {
            return Err(PurgeError::EmptyInput("identifier list".to_string()));
        }

        let started = Instant::now();
        let recorder = OutcomeRecorder::new(sink);

        let processed = stream::iter(identifiers)
            .take_while(|_| futures::future::ready(!*shutdown.borrow()))
            .map(|identifier| {
                self.process_identifier(identifier, &recorder)
                    .instrument(info_span!("purge_identifier", %identifier))
            })
            .buffer_unordered(self.runtime.concurrency.max(1))
            .count()
            .await;

        let mut summary = recorder.into_summary();
        summary.identifiers_processed = processed;
        summary.cancelled = processed < identifiers.len();
        summary.elapsed = started.elapsed();

        if summary.cancelled {
            warn!(
                processed,
                skipped = identifiers.len() - processed,
                "Run cancelled before all identifiers were started"
            );
        }

        sink.finish(&summary);
        Ok(summary)
    }

    async fn process_identifier(&self, identifier: &str, recorder: &OutcomeRecorder<'_>) {
        let mut batch: Vec<PurgeTarget> = Vec::new();

        for target in self.resolver.resolve(identifier) {
            recorder.record(self.deleter.delete(&self.bucket, &target).await);

            let Some(cdn) = &self.cdn else {
                continue;
            };

            let cached = !self.runtime.gate_on_edge_presence
                || cdn.checker.exists(&cdn.domain, &target.edge_path).await;

            if !cached {
                recorder.record(PurgeOutcome::new(
                    target,
                    Operation::Invalidate,
                    PurgeStatus::SkippedNotCached,
                ));
            } else if self.runtime.batch_invalidations {
                batch.push(target);
            } else {
                let outcomes = cdn
                    .dispatcher
                    .invalidate(&cdn.distribution_id, std::slice::from_ref(&target))
                    .await;
                recorder.record_all(outcomes);
            }
        }

        if let Some(cdn) = &self.cdn {
            if !batch.is_empty() {
                let outcomes = cdn.dispatcher.invalidate(&cdn.distribution_id, &batch).await;
                recorder.record_all(outcomes);
            }
        }
    }
}

/// Run a purge end to end: refuse empty input, connect, process.
///
/// Empty input is rejected before any provider is contacted.
pub async fn execute(
    config: &PurgeConfig,
    identifiers: &[String],
    capabilities: Capabilities,
    sink: &dyn ReportSink,
    shutdown: watch::Receiver<bool>,
) -> Result<RunSummary> {
    if identifiers.is_empty() {
        return Err(PurgeError::EmptyInput("identifier list".to_string()));
    }

    sink.start(&RunPlan::new(config, identifiers.len()));
    let coordinator = PurgeCoordinator::connect(config, capabilities).await?;
    coordinator.run(identifiers, sink, shutdown).await
}

fn policy(preset: ServiceConfig, runtime: &RuntimeConfig) -> ServiceConfig {
    preset
        .with_timeout(runtime.call_timeout)
        .with_max_retries(runtime.max_retries)
}

/// Summary aggregation shared by concurrently processed identifiers
struct OutcomeRecorder<'a> {
    sink: &'a dyn ReportSink,
    summary: Mutex<RunSummary>,
}

impl<'a> OutcomeRecorder<'a> {
    fn new(sink: &'a dyn ReportSink) -> Self {
        Self {
            sink,
            summary: Mutex::new(RunSummary::default()),
        }
    }

    fn record(&self, outcome: PurgeOutcome) {
        self.summary.lock().record(outcome.status);
        self.sink.record(&outcome);
    }

    fn record_all(&self, outcomes: Vec<PurgeOutcome>) {
        for outcome in outcomes {
            self.record(outcome);
        }
    }

    fn into_summary(self) -> RunSummary {
        self.summary.into_inner()
    }
}
