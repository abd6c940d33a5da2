//! Pre-flight variant matching statistics.

use std::collections::HashSet;
use std::fmt;

use mfsync_shopify::Variant;

use crate::matcher::{index_variants, MatchKey, VariantMatchKey};

/// Key quality on one side of a pairing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideStats {
    pub total: usize,
    /// Variants whose key is blank.
    pub blank: usize,
    /// Variants whose key repeats an earlier variant's key.
    pub duplicates: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchStats {
    pub key: VariantMatchKey,
    pub donor: SideStats,
    pub receiver: SideStats,
    /// Donor variants that would find a receiver counterpart.
    pub matched: usize,
}

impl fmt::Display for MatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "key={} donor: total={} blank={} duplicates={} | receiver: total={} blank={} duplicates={} | matched={}/{}",
            self.key,
            self.donor.total,
            self.donor.blank,
            self.donor.duplicates,
            self.receiver.total,
            self.receiver.blank,
            self.receiver.duplicates,
            self.matched,
            self.donor.total,
        )
    }
}

/// How well `key` pairs `donor` variants with `receiver` variants.
#[must_use]
pub fn match_stats(donor: &[Variant], receiver: &[Variant], key: VariantMatchKey) -> MatchStats {
    let index = index_variants(receiver, key);
    let matched = donor
        .iter()
        .filter_map(|v| key.key_of(v))
        .filter(|k| index.contains_key(k))
        .count();
    MatchStats {
        key,
        donor: side_stats(donor, key),
        receiver: side_stats(receiver, key),
        matched,
    }
}

fn side_stats(variants: &[Variant], key: VariantMatchKey) -> SideStats {
    let mut seen: HashSet<MatchKey> = HashSet::new();
    let mut stats = SideStats {
        total: variants.len(),
        ..SideStats::default()
    };
    for variant in variants {
        match key.key_of(variant) {
            None => stats.blank += 1,
            Some(k) => {
                if !seen.insert(k) {
                    stats.duplicates += 1;
                }
            }
        }
    }
    stats
}
