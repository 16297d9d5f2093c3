//! Per-run reporting: counters, per-realm outcomes, run summary.

use serde::{Deserialize, Serialize};

/// Write counters for one resource step or one realm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCounters {
    pub created: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub deleted: u32,
}

impl ImportCounters {
    /// Fold another step's counters into this one.
    pub fn merge(&mut self, other: ImportCounters) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.deleted += other.deleted;
    }

    /// Number of remote mutations performed.
    #[must_use]
    pub fn writes(&self) -> u32 {
        self.created + self.updated + self.deleted
    }
}

/// How a realm's reconciliation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RealmStatus {
    /// Reconciled (possibly with zero writes).
    Imported,
    /// Skipped by the checksum gate.
    Skipped,
    /// A fatal error aborted the realm's remaining steps.
    Failed { error: String },
}

/// Outcome of one realm's pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmOutcome {
    pub realm: String,
    pub status: RealmStatus,
    #[serde(default)]
    pub counters: ImportCounters,
}

impl RealmOutcome {
    /// Whether this realm raised a fatal error.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self.status, RealmStatus::Failed { .. })
    }
}

/// Aggregate result of one full run across realms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub realms: Vec<RealmOutcome>,
}

impl RunSummary {
    /// Whether any realm raised a fatal error. Drives the caller's exit
    /// status; soft-fail branches never set this.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.realms.iter().any(RealmOutcome::is_failure)
    }

    /// Total writes across all realms.
    #[must_use]
    pub fn total_writes(&self) -> u32 {
        self.realms.iter().map(|r| r.counters.writes()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_merge_and_writes() {
        let mut counters = ImportCounters {
            created: 1,
            updated: 2,
            unchanged: 5,
            deleted: 0,
        };
        counters.merge(ImportCounters {
            created: 0,
            updated: 1,
            unchanged: 3,
            deleted: 2,
        });

        assert_eq!(counters.created, 1);
        assert_eq!(counters.updated, 3);
        assert_eq!(counters.unchanged, 8);
        assert_eq!(counters.deleted, 2);
        assert_eq!(counters.writes(), 6);
    }

    #[test]
    fn test_summary_failure_detection() {
        let mut summary = RunSummary::default();
        summary.realms.push(RealmOutcome {
            realm: "a".to_string(),
            status: RealmStatus::Imported,
            counters: ImportCounters::default(),
        });
        assert!(!summary.has_failures());

        summary.realms.push(RealmOutcome {
            realm: "b".to_string(),
            status: RealmStatus::Failed {
                error: "boom".to_string(),
            },
            counters: ImportCounters::default(),
        });
        assert!(summary.has_failures());
    }
}
