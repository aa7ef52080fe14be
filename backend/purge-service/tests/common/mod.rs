//! In-memory providers for purge flow tests
//!
//! One shared `World` holds the bucket contents and the set of paths the edge
//! currently serves. The fake store, CDN and probe all act on it, so a delete
//! followed by an invalidation is visible to the next run.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use purge_service::clients::{CdnClient, DeleteStatus, EdgeProbe, InvalidationTicket, ObjectStoreClient};
use purge_service::config::{CdnConfig, PathConfig, PurgeConfig, RuntimeConfig, StorageConfig};
use purge_service::report::{ReportSink, RunPlan};
use purge_service::services::Capabilities;
use purge_service::{ProviderError, PurgeOutcome, RunSummary};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;

pub const BUCKET: &str = "assets";
pub const DISTRIBUTION: &str = "E2QWRUHAPOMQZL";
pub const DOMAIN: &str = "d111111abcdef8.cloudfront.net";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Verify(String),
    Delete(String),
    Domain(String),
    Probe(String),
    Invalidate(Vec<String>),
}

#[derive(Default)]
pub struct World {
    objects: Mutex<HashSet<String>>,
    edge: Mutex<HashSet<String>>,
    events: Mutex<Vec<Event>>,
    delete_errors: Mutex<HashMap<String, ProviderError>>,
    invalidation_errors: Mutex<HashMap<String, ProviderError>>,
    verify_error: Mutex<Option<ProviderError>>,
    invalidations: Mutex<usize>,
}

impl World {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Put `key` in the bucket and its edge path in the CDN cache
    pub fn publish(&self, key: &str) {
        self.objects.lock().insert(key.to_string());
        self.edge.lock().insert(format!("/{}", key));
    }

    pub fn store_only(&self, key: &str) {
        self.objects.lock().insert(key.to_string());
    }

    pub fn fail_delete(&self, key: &str, error: ProviderError) {
        self.delete_errors.lock().insert(key.to_string(), error);
    }

    pub fn fail_invalidation(&self, path: &str, error: ProviderError) {
        self.invalidation_errors.lock().insert(path.to_string(), error);
    }

    pub fn fail_verify(&self, error: ProviderError) {
        *self.verify_error.lock() = Some(error);
    }

    pub fn has_object(&self, key: &str) -> bool {
        self.objects.lock().contains(key)
    }

    pub fn is_cached(&self, path: &str) -> bool {
        self.edge.lock().contains(path)
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(*e)).count()
    }

    fn log(&self, event: Event) {
        self.events.lock().push(event);
    }
}

pub struct FakeStore(pub Arc<World>);

#[async_trait]
impl ObjectStoreClient for FakeStore {
    async fn verify(&self, bucket: &str) -> Result<(), ProviderError> {
        self.0.log(Event::Verify(bucket.to_string()));
        match self.0.verify_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn delete_object(&self, _bucket: &str, key: &str) -> Result<DeleteStatus, ProviderError> {
        self.0.log(Event::Delete(key.to_string()));
        if let Some(err) = self.0.delete_errors.lock().get(key) {
            return Err(err.clone());
        }
        if self.0.objects.lock().remove(key) {
            Ok(DeleteStatus::Removed)
        } else {
            Ok(DeleteStatus::NotFound)
        }
    }
}

pub struct FakeCdn(pub Arc<World>);

#[async_trait]
impl CdnClient for FakeCdn {
    async fn distribution_domain(&self, distribution_id: &str) -> Result<String, ProviderError> {
        self.0.log(Event::Domain(distribution_id.to_string()));
        if distribution_id == DISTRIBUTION {
            Ok(DOMAIN.to_string())
        } else {
            Err(ProviderError::NotFound(format!("NoSuchDistribution: {}", distribution_id)))
        }
    }

    async fn create_invalidation(
        &self,
        _distribution_id: &str,
        paths: &[String],
        _caller_reference: &str,
    ) -> Result<InvalidationTicket, ProviderError> {
        self.0.log(Event::Invalidate(paths.to_vec()));
        for path in paths {
            if let Some(err) = self.0.invalidation_errors.lock().get(path) {
                return Err(err.clone());
            }
        }

        let mut edge = self.0.edge.lock();
        for path in paths {
            edge.remove(path);
        }
        let mut counter = self.0.invalidations.lock();
        *counter += 1;
        Ok(InvalidationTicket {
            id: format!("I{:04}", *counter),
            status: "InProgress".to_string(),
        })
    }
}

pub struct FakeProbe(pub Arc<World>);

#[async_trait]
impl EdgeProbe for FakeProbe {
    async fn fetch_status(&self, url: &str) -> Result<u16, ProviderError> {
        let path = url
            .strip_prefix(&format!("https://{}", DOMAIN))
            .unwrap_or(url)
            .to_string();
        self.0.log(Event::Probe(path.clone()));
        Ok(if self.0.is_cached(&path) { 200 } else { 404 })
    }
}

pub fn capabilities(world: &Arc<World>) -> Capabilities {
    Capabilities {
        store: Arc::new(FakeStore(world.clone())),
        cdn: Some(Arc::new(FakeCdn(world.clone()))),
        probe: Arc::new(FakeProbe(world.clone())),
    }
}

pub fn config(secondary: Option<&str>, distribution: Option<&str>) -> PurgeConfig {
    PurgeConfig {
        storage: StorageConfig {
            bucket: BUCKET.to_string(),
            region: "ap-southeast-2".to_string(),
            credentials: None,
        },
        paths: PathConfig {
            primary_path: "products/".to_string(),
            secondary_path: secondary.map(str::to_string),
            extension: ".webp".to_string(),
        },
        cdn: distribution.map(|id| CdnConfig {
            distribution_id: id.to_string(),
        }),
        runtime: RuntimeConfig::default(),
    }
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Shutdown receiver that never fires
pub fn no_shutdown() -> watch::Receiver<bool> {
    watch::channel(false).1
}

/// Keeps every outcome; can flip a shutdown signal after N outcomes
#[derive(Default)]
pub struct CollectingSink {
    outcomes: Mutex<Vec<PurgeOutcome>>,
    plan: Mutex<Option<RunPlan>>,
    summary: Mutex<Option<RunSummary>>,
    cancel_after: Mutex<Option<(usize, watch::Sender<bool>)>>,
}

impl CollectingSink {
    pub fn cancelling_after(outcomes: usize, trigger: watch::Sender<bool>) -> Self {
        Self {
            cancel_after: Mutex::new(Some((outcomes, trigger))),
            ..Default::default()
        }
    }

    pub fn outcomes(&self) -> Vec<PurgeOutcome> {
        self.outcomes.lock().clone()
    }

    pub fn plan(&self) -> Option<RunPlan> {
        self.plan.lock().clone()
    }

    pub fn summary(&self) -> Option<RunSummary> {
        self.summary.lock().clone()
    }
}

impl ReportSink for CollectingSink {
    fn start(&self, plan: &RunPlan) {
        *self.plan.lock() = Some(plan.clone());
    }

    fn record(&self, outcome: &PurgeOutcome) {
        let recorded = {
            let mut outcomes = self.outcomes.lock();
            outcomes.push(outcome.clone());
            outcomes.len()
        };
        if let Some((limit, trigger)) = &*self.cancel_after.lock() {
            if recorded >= *limit {
                let _ = trigger.send(true);
            }
        }
    }

    fn finish(&self, summary: &RunSummary) {
        *self.summary.lock() = Some(summary.clone());
    }
}
