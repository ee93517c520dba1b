use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use super::{MembershipKind, NodeKind};

/// Why a row (or collection) was counted and skipped instead of applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// The SKU cell was empty.
    MissingSku,
    /// The SKU is not in the catalog.
    UnknownSku,
    /// The first category level was empty.
    NoCategory,
    /// The row did not match a `facets tag` rule.
    FilterMismatch,
    /// No facet value matches a collection's path.
    NoFacetValue,
    /// Collection depth is 0 or beyond the configured levels.
    OutOfRangeDepth,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkipReason::MissingSku => "missing sku",
            SkipReason::UnknownSku => "unknown sku",
            SkipReason::NoCategory => "no category",
            SkipReason::FilterMismatch => "filter mismatch",
            SkipReason::NoFacetValue => "no facet value",
            SkipReason::OutOfRangeDepth => "out-of-range depth",
        };
        f.write_str(label)
    }
}

/// Counters for one run, printed to the operator at the end.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub job: String,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub rows_read: usize,
    pub rows_processed: usize,
    pub nodes_created: BTreeMap<NodeKind, usize>,
    pub nodes_reused: BTreeMap<NodeKind, usize>,
    pub memberships_inserted: BTreeMap<MembershipKind, u64>,
    pub memberships_removed: BTreeMap<MembershipKind, u64>,
    pub collections_updated: usize,
    pub facet_values_deleted: u64,
    pub assets_assigned: u64,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl RunSummary {
    #[must_use]
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            dry_run: false,
            started_at: Utc::now(),
            finished_at: None,
            rows_read: 0,
            rows_processed: 0,
            nodes_created: BTreeMap::new(),
            nodes_reused: BTreeMap::new(),
            memberships_inserted: BTreeMap::new(),
            memberships_removed: BTreeMap::new(),
            collections_updated: 0,
            facet_values_deleted: 0,
            assets_assigned: 0,
            skipped: BTreeMap::new(),
        }
    }

    pub fn skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_default() += 1;
    }

    #[must_use]
    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    pub fn node_created(&mut self, kind: NodeKind) {
        *self.nodes_created.entry(kind).or_default() += 1;
    }

    pub fn node_reused(&mut self, kind: NodeKind) {
        *self.nodes_reused.entry(kind).or_default() += 1;
    }

    #[must_use]
    pub fn created(&self, kind: NodeKind) -> usize {
        self.nodes_created.get(&kind).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_created(&self) -> usize {
        self.nodes_created.values().sum()
    }

    pub fn add_inserted(&mut self, kind: MembershipKind, n: u64) {
        *self.memberships_inserted.entry(kind).or_default() += n;
    }

    pub fn add_removed(&mut self, kind: MembershipKind, n: u64) {
        *self.memberships_removed.entry(kind).or_default() += n;
    }

    #[must_use]
    pub fn inserted(&self, kind: MembershipKind) -> u64 {
        self.memberships_inserted.get(&kind).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn removed(&self, kind: MembershipKind) -> u64 {
        self.memberships_removed.get(&kind).copied().unwrap_or(0)
    }

    /// Stamp the end time.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    fn elapsed_secs(&self) -> Option<f64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds() as f64 / 1000.0)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.dry_run { " (dry run)" } else { "" };
        writeln!(f, "{}{mode}", self.job)?;
        writeln!(f, "  started:    {}", self.started_at.to_rfc3339())?;
        if let Some(secs) = self.elapsed_secs() {
            writeln!(f, "  elapsed:    {secs:.1}s")?;
        }
        if self.rows_read > 0 {
            writeln!(f, "  rows read:  {}", self.rows_read)?;
            writeln!(f, "  processed:  {}", self.rows_processed)?;
        }
        for (kind, n) in &self.nodes_created {
            writeln!(f, "  created {kind}: {n}")?;
        }
        for (kind, n) in &self.nodes_reused {
            writeln!(f, "  reused {kind}: {n}")?;
        }
        for (kind, n) in &self.memberships_inserted {
            writeln!(f, "  {kind} inserted: {n}")?;
        }
        for (kind, n) in &self.memberships_removed {
            writeln!(f, "  {kind} removed: {n}")?;
        }
        if self.collections_updated > 0 {
            writeln!(f, "  collections updated: {}", self.collections_updated)?;
        }
        if self.facet_values_deleted > 0 {
            writeln!(f, "  facet values deleted: {}", self.facet_values_deleted)?;
        }
        if self.assets_assigned > 0 {
            writeln!(f, "  assets assigned: {}", self.assets_assigned)?;
        }
        for (reason, n) in &self.skipped {
            writeln!(f, "  skipped ({reason}): {n}")?;
        }
        Ok(())
    }
}
