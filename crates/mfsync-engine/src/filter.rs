//! Which donor metafields take part in a copy.
//!
//! The reserved sync-flag metafield never takes part. Other fields go through
//! ordered checks and the first failing one decides the skip reason:
//! namespace allow-list, then include/exclude key lists, then the donor's
//! sync-flag set.

use std::collections::BTreeSet;

use mfsync_shopify::{Metafield, SYNC_KEY, SYNC_NAMESPACE};

/// Outcome of filtering one donor metafield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    Keep,
    /// The receiver's own sync-flag set; only the sync-flag commands write it.
    SkipReserved,
    SkipNamespace,
    SkipKeyFilter,
    SkipNotSynced,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyFilter {
    /// Allowed namespaces; empty allows all.
    pub namespaces: BTreeSet<String>,
    /// Entries are a bare `key` or `namespace.key`; empty includes all.
    pub include: BTreeSet<String>,
    /// Same entry forms as `include`; checked first.
    pub exclude: BTreeSet<String>,
    /// Restrict to keys in the donor's sync-flag set.
    pub only_synced: bool,
}

impl CopyFilter {
    #[must_use]
    pub fn check(&self, field: &Metafield, sync_keys: &BTreeSet<String>) -> FilterVerdict {
        if field.namespace == SYNC_NAMESPACE && field.key == SYNC_KEY {
            return FilterVerdict::SkipReserved;
        }
        if !self.namespaces.is_empty() && !self.namespaces.contains(&field.namespace) {
            return FilterVerdict::SkipNamespace;
        }
        if selects(&self.exclude, field)
            || (!self.include.is_empty() && !selects(&self.include, field))
        {
            return FilterVerdict::SkipKeyFilter;
        }
        if self.only_synced && !sync_keys.contains(&field.key) {
            return FilterVerdict::SkipNotSynced;
        }
        FilterVerdict::Keep
    }
}

fn selects(entries: &BTreeSet<String>, field: &Metafield) -> bool {
    entries.contains(&field.key) || entries.contains(&field.qualified_key())
}

/// Splits comma-separated operator input into trimmed, non-empty entries.
#[must_use]
pub fn parse_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(namespace: &str, key: &str) -> Metafield {
        Metafield {
            id: 1,
            namespace: namespace.to_owned(),
            key: key.to_owned(),
            value: Some("v".to_owned()),
            type_name: None,
            owner_id: None,
            owner_resource: None,
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = CopyFilter::default();
        assert_eq!(filter.check(&field("a", "x"), &set(&[])), FilterVerdict::Keep);
    }

    #[test]
    fn namespace_allow_list() {
        let filter = CopyFilter {
            namespaces: set(&["details"]),
            ..CopyFilter::default()
        };
        assert_eq!(filter.check(&field("details", "x"), &set(&[])), FilterVerdict::Keep);
        assert_eq!(
            filter.check(&field("custom", "x"), &set(&[])),
            FilterVerdict::SkipNamespace
        );
    }

    #[test]
    fn include_and_exclude_accept_bare_or_qualified_keys() {
        let filter = CopyFilter {
            include: set(&["color", "specs.weight"]),
            exclude: set(&["details.color"]),
            ..CopyFilter::default()
        };
        assert_eq!(filter.check(&field("specs", "color"), &set(&[])), FilterVerdict::Keep);
        assert_eq!(filter.check(&field("specs", "weight"), &set(&[])), FilterVerdict::Keep);
        assert_eq!(
            filter.check(&field("details", "weight"), &set(&[])),
            FilterVerdict::SkipKeyFilter
        );
        assert_eq!(
            filter.check(&field("details", "color"), &set(&[])),
            FilterVerdict::SkipKeyFilter
        );
    }

    #[test]
    fn only_synced_uses_bare_keys() {
        let filter = CopyFilter {
            only_synced: true,
            ..CopyFilter::default()
        };
        let synced = set(&["x"]);
        assert_eq!(filter.check(&field("a", "x"), &synced), FilterVerdict::Keep);
        assert_eq!(filter.check(&field("b", "x"), &synced), FilterVerdict::Keep);
        assert_eq!(filter.check(&field("a", "y"), &synced), FilterVerdict::SkipNotSynced);
    }

    #[test]
    fn namespace_check_wins_over_later_checks() {
        let filter = CopyFilter {
            namespaces: set(&["a"]),
            exclude: set(&["z"]),
            only_synced: true,
            ..CopyFilter::default()
        };
        assert_eq!(filter.check(&field("b", "z"), &set(&[])), FilterVerdict::SkipNamespace);
        assert_eq!(filter.check(&field("a", "z"), &set(&[])), FilterVerdict::SkipKeyFilter);
    }

    #[test]
    fn sync_flag_field_is_reserved_under_any_filter() {
        let reserved = field("sync", "sync_fields");
        assert_eq!(
            CopyFilter::default().check(&reserved, &set(&[])),
            FilterVerdict::SkipReserved
        );
        let filter = CopyFilter {
            namespaces: set(&["sync"]),
            include: set(&["sync.sync_fields"]),
            only_synced: true,
            ..CopyFilter::default()
        };
        assert_eq!(
            filter.check(&reserved, &set(&["sync_fields"])),
            FilterVerdict::SkipReserved
        );
        assert_eq!(
            CopyFilter::default().check(&field("sync", "other"), &set(&[])),
            FilterVerdict::Keep
        );
    }

    #[test]
    fn parse_list_trims_and_drops_blanks() {
        assert_eq!(parse_list(" details, ,custom ,"), set(&["custom", "details"]));
        assert!(parse_list("").is_empty());
    }
}
