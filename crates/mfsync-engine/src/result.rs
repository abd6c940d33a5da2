//! Counters and log lines produced by copy passes.

use std::fmt;

/// Per-pass counters. `attempted == copied + skipped_existing + errors`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyCounts {
    /// Fields that passed filtering.
    pub attempted: usize,
    /// Written (or, in a dry run, would be written).
    pub copied: usize,
    pub created: usize,
    pub updated: usize,
    /// The reserved sync-flag field.
    pub skipped_reserved: usize,
    pub skipped_namespace: usize,
    pub skipped_key_filter: usize,
    pub skipped_not_synced: usize,
    /// Present on the receiver while overwrite is off.
    pub skipped_existing: usize,
    pub errors: usize,
}

impl CopyCounts {
    pub fn merge(&mut self, other: &Self) {
        self.attempted += other.attempted;
        self.copied += other.copied;
        self.created += other.created;
        self.updated += other.updated;
        self.skipped_reserved += other.skipped_reserved;
        self.skipped_namespace += other.skipped_namespace;
        self.skipped_key_filter += other.skipped_key_filter;
        self.skipped_not_synced += other.skipped_not_synced;
        self.skipped_existing += other.skipped_existing;
        self.errors += other.errors;
    }
}

impl fmt::Display for CopyCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempted={} copied={} (created={} updated={}) skipped_reserved={} \
             skipped_namespace={} skipped_key_filter={} skipped_not_synced={} \
             skipped_existing={} errors={}",
            self.attempted,
            self.copied,
            self.created,
            self.updated,
            self.skipped_reserved,
            self.skipped_namespace,
            self.skipped_key_filter,
            self.skipped_not_synced,
            self.skipped_existing,
            self.errors,
        )
    }
}

/// Counters plus the human-readable log of one or more passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyResult {
    pub counts: CopyCounts,
    pub log: Vec<String>,
}

impl CopyResult {
    pub fn merge(&mut self, other: Self) {
        self.counts.merge(&other.counts);
        self.log.extend(other.log);
    }

    pub(crate) fn line(&mut self, line: String) {
        self.log.push(line);
    }

    #[must_use]
    pub fn summary_line(&self) -> String {
        format!("summary: {}", self.counts)
    }
}
