/// Data model for a purge run
///
/// Targets and outcomes are immutable values handed from the services to the
/// coordinator and on to the report sink. The run summary is the only state that
/// accumulates during a run.
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Which storage location a target belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRole {
    Primary,
    Secondary,
}

impl TargetRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetRole::Primary => "primary",
            TargetRole::Secondary => "secondary",
        }
    }
}

/// One concrete object to purge, resolved from an asset identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeTarget {
    pub identifier: String,
    pub role: TargetRole,
    pub store_key: String,
    pub edge_path: String,
}

impl PurgeTarget {
    pub fn new(identifier: impl Into<String>, role: TargetRole, store_key: String) -> Self {
        let edge_path = edge_path_for(&store_key);
        Self {
            identifier: identifier.into(),
            role,
            store_key,
            edge_path,
        }
    }
}

/// CDN path for a store key: forward slashes only, exactly one leading slash
pub fn edge_path_for(store_key: &str) -> String {
    let normalized = store_key.replace('\\', "/");
    format!("/{}", normalized.trim_start_matches('/'))
}

/// The sub-operation an outcome describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Delete,
    Invalidate,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Delete => "delete",
            Operation::Invalidate => "invalidate",
        }
    }
}

/// Classified result of one operation on one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeStatus {
    Deleted,
    AlreadyAbsent,
    InvalidationStarted,
    SkippedNotCached,
    Denied,
    Failed,
}

impl PurgeStatus {
    pub const ALL: [PurgeStatus; 6] = [
        PurgeStatus::Deleted,
        PurgeStatus::AlreadyAbsent,
        PurgeStatus::InvalidationStarted,
        PurgeStatus::SkippedNotCached,
        PurgeStatus::Denied,
        PurgeStatus::Failed,
    ];

    /// Human-readable label used in console output
    pub fn label(&self) -> &'static str {
        match self {
            PurgeStatus::Deleted => "deleted",
            PurgeStatus::AlreadyAbsent => "already deleted",
            PurgeStatus::InvalidationStarted => "invalidating",
            PurgeStatus::SkippedNotCached => "not cached",
            PurgeStatus::Denied => "access denied",
            PurgeStatus::Failed => "failed",
        }
    }

    /// Whether the operator needs to look at this outcome
    pub fn is_problem(&self) -> bool {
        matches!(self, PurgeStatus::Denied | PurgeStatus::Failed)
    }
}

impl fmt::Display for PurgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of acting on one target for one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeOutcome {
    pub target: PurgeTarget,
    pub operation: Operation,
    pub status: PurgeStatus,
    pub detail: Option<String>,
}

impl PurgeOutcome {
    pub fn new(target: PurgeTarget, operation: Operation, status: PurgeStatus) -> Self {
        Self {
            target,
            operation,
            status,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Aggregate counts for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub identifiers_processed: usize,
    pub counts: BTreeMap<PurgeStatus, usize>,
    pub cancelled: bool,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn record(&mut self, status: PurgeStatus) {
        *self.counts.entry(status).or_insert(0) += 1;
    }

    pub fn count(&self, status: PurgeStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    /// Total number of recorded outcomes
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Number of outcomes that were Denied or Failed
    pub fn problems(&self) -> usize {
        self.count(PurgeStatus::Denied) + self.count(PurgeStatus::Failed)
    }

    pub fn has_problems(&self) -> bool {
        self.problems() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_path_normalizes_backslashes() {
        assert_eq!(edge_path_for("images\\200\\abc.webp"), "/images/200/abc.webp");
    }

    #[test]
    fn test_edge_path_single_leading_slash() {
        assert_eq!(edge_path_for("products/abc.webp"), "/products/abc.webp");
        assert_eq!(edge_path_for("/products/abc.webp"), "/products/abc.webp");
        assert_eq!(edge_path_for("\\\\products\\abc.webp"), "/products/abc.webp");
    }

    #[test]
    fn test_target_derives_edge_path() {
        let target = PurgeTarget::new("abc", TargetRole::Secondary, "thumbs\\abc.webp".into());
        assert_eq!(target.store_key, "thumbs\\abc.webp");
        assert_eq!(target.edge_path, "/thumbs/abc.webp");
    }

    #[test]
    fn test_summary_total_matches_counts() {
        let mut summary = RunSummary::default();
        summary.record(PurgeStatus::Deleted);
        summary.record(PurgeStatus::Deleted);
        summary.record(PurgeStatus::SkippedNotCached);
        summary.record(PurgeStatus::Denied);

        assert_eq!(summary.total(), 4);
        assert_eq!(summary.count(PurgeStatus::Deleted), 2);
        assert_eq!(summary.count(PurgeStatus::Failed), 0);
        assert_eq!(summary.problems(), 1);
        assert!(summary.has_problems());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&PurgeStatus::SkippedNotCached).unwrap();
        assert_eq!(json, "\"skipped_not_cached\"");
    }
}
