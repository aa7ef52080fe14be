/// Reporting - where per-target outcomes and the final summary go
///
/// The coordinator hands every outcome to a [`ReportSink`] as soon as it is
/// known. [`ConsoleSink`] renders the operator-facing text report on stdout,
/// [`TracingSink`] emits one structured event per outcome for log pipelines.
use crate::config::PurgeConfig;
use crate::models::{edge_path_for, Operation, PurgeOutcome, PurgeStatus, RunSummary};
use tracing::{info, warn};

/// Width the location column is padded to
pub const LOCATION_WIDTH: usize = 50;

const RULE_WIDTH: usize = 72;

/// What a run is about to do, announced once before any remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub bucket: String,
    pub primary_path: String,
    pub secondary_path: Option<String>,
    pub distribution_id: Option<String>,
    pub identifiers: usize,
    pub concurrency: usize,
    pub dry_run: bool,
}

impl RunPlan {
    pub fn new(config: &PurgeConfig, identifiers: usize) -> Self {
        Self {
            bucket: config.storage.bucket.clone(),
            primary_path: config.paths.primary_path.clone(),
            secondary_path: config.paths.secondary_path.clone(),
            distribution_id: config.cdn.as_ref().map(|cdn| cdn.distribution_id.clone()),
            identifiers,
            concurrency: config.runtime.concurrency,
            dry_run: config.runtime.dry_run,
        }
    }
}

/// Consumer of run progress. Outcomes may arrive from concurrently processed
/// identifiers, so implementations must be shareable.
pub trait ReportSink: Send + Sync {
    fn start(&self, _plan: &RunPlan) {}

    fn record(&self, outcome: &PurgeOutcome);

    fn finish(&self, _summary: &RunSummary) {}
}

/// Plain-text report on stdout
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    bucket: String,
    distribution_id: Option<String>,
}

impl ConsoleSink {
    pub fn new(bucket: impl Into<String>, distribution_id: Option<String>) -> Self {
        Self {
            bucket: bucket.into(),
            distribution_id,
        }
    }

    pub fn for_config(config: &PurgeConfig) -> Self {
        Self::new(
            config.storage.bucket.clone(),
            config.cdn.as_ref().map(|cdn| cdn.distribution_id.clone()),
        )
    }

    pub fn render_banner(&self, plan: &RunPlan) -> String {
        let rule = "-".repeat(RULE_WIDTH);
        let mut lines = vec![
            rule.clone(),
            " Asset purge: S3 objects and CloudFront cache".to_string(),
            rule.clone(),
            format!(" {:<16}{}", "Bucket:", plan.bucket),
            format!(" {:<16}{}", "Primary path:", plan.primary_path),
            format!(
                " {:<16}{}",
                "Secondary path:",
                plan.secondary_path.as_deref().unwrap_or("(none)")
            ),
            format!(
                " {:<16}{}",
                "Distribution:",
                plan.distribution_id
                    .as_deref()
                    .unwrap_or("(none, CDN steps skipped)")
            ),
        ];
        if let Some(id) = &plan.distribution_id {
            lines.push(format!(" {:<16}{}", "CloudFront:", cdn_prefix(id, &plan.primary_path)));
            if let Some(secondary) = &plan.secondary_path {
                lines.push(format!(" {:<16}{}", "", cdn_prefix(id, secondary)));
            }
        }
        lines.push(format!(" {:<16}{}", "Identifiers:", plan.identifiers));
        lines.push(format!(" {:<16}{}", "Concurrency:", plan.concurrency));
        if plan.dry_run {
            lines.push(format!(" {:<16}{}", "Mode:", "dry run (invalidations are printed, not sent)"));
        }
        lines.push(rule);
        lines.join("\n")
    }

    pub fn render_outcome(&self, outcome: &PurgeOutcome) -> String {
        let location = match outcome.operation {
            Operation::Delete => format!("s3://{}/{}", self.bucket, outcome.target.store_key),
            Operation::Invalidate => match &self.distribution_id {
                Some(id) => format!("cloudfront://{}{}", id, outcome.target.edge_path),
                None => format!("cloudfront:{}", outcome.target.edge_path),
            },
        };

        let mut line = format!(
            "{:<width$} - {}",
            location,
            outcome.status.label(),
            width = LOCATION_WIDTH
        );
        if let Some(detail) = &outcome.detail {
            line.push_str(&format!(" ({})", detail));
        }
        line
    }

    pub fn render_summary(&self, summary: &RunSummary) -> String {
        let rule = "-".repeat(RULE_WIDTH);
        let mut lines = vec![rule.clone()];

        let processed = if summary.cancelled {
            format!("{} (cancelled)", summary.identifiers_processed)
        } else {
            summary.identifiers_processed.to_string()
        };
        lines.push(format!(" {:<24}{}", "Identifiers processed:", processed));

        for status in PurgeStatus::ALL {
            lines.push(format!(" {:<24}{}", format!("{}:", status.label()), summary.count(status)));
        }
        lines.push(format!(" {:<24}{:.2}s", "Elapsed:", summary.elapsed.as_secs_f64()));
        lines.push(rule);
        lines.join("\n")
    }
}

/// `cloudfront://<id>/<prefix>/` for a store path prefix
fn cdn_prefix(distribution_id: &str, store_prefix: &str) -> String {
    let path = edge_path_for(store_prefix);
    format!("cloudfront://{}{}/", distribution_id, path.trim_end_matches('/'))
}

impl ReportSink for ConsoleSink {
    fn start(&self, plan: &RunPlan) {
        println!("{}", self.render_banner(plan));
    }

    fn record(&self, outcome: &PurgeOutcome) {
        println!("{}", self.render_outcome(outcome));
    }

    fn finish(&self, summary: &RunSummary) {
        println!("{}", self.render_summary(summary));
    }
}

/// One structured event per outcome
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn start(&self, plan: &RunPlan) {
        info!(
            bucket = %plan.bucket,
            primary_path = %plan.primary_path,
            secondary_path = plan.secondary_path.as_deref(),
            distribution_id = plan.distribution_id.as_deref(),
            identifiers = plan.identifiers,
            concurrency = plan.concurrency,
            dry_run = plan.dry_run,
            "Purge run starting"
        );
    }

    fn record(&self, outcome: &PurgeOutcome) {
        let target = &outcome.target;
        if outcome.status.is_problem() {
            warn!(
                identifier = %target.identifier,
                role = target.role.as_str(),
                operation = outcome.operation.as_str(),
                store_key = %target.store_key,
                edge_path = %target.edge_path,
                status = outcome.status.label(),
                detail = outcome.detail.as_deref(),
                "Purge outcome"
            );
        } else {
            info!(
                identifier = %target.identifier,
                role = target.role.as_str(),
                operation = outcome.operation.as_str(),
                store_key = %target.store_key,
                edge_path = %target.edge_path,
                status = outcome.status.label(),
                detail = outcome.detail.as_deref(),
                "Purge outcome"
            );
        }
    }

    fn finish(&self, summary: &RunSummary) {
        info!(
            identifiers = summary.identifiers_processed,
            deleted = summary.count(PurgeStatus::Deleted),
            already_absent = summary.count(PurgeStatus::AlreadyAbsent),
            invalidation_started = summary.count(PurgeStatus::InvalidationStarted),
            skipped_not_cached = summary.count(PurgeStatus::SkippedNotCached),
            denied = summary.count(PurgeStatus::Denied),
            failed = summary.count(PurgeStatus::Failed),
            cancelled = summary.cancelled,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Purge run finished"
        );
    }
}
