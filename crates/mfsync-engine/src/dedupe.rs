//! Consolidating metafields across products that share a title in one store.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use mfsync_shopify::{CatalogStore, Metafield, Owner, Product};

use crate::copy::{copy_from_fields, discovery_failure, pass_context, CopyOptions};
use crate::error::EngineError;
use crate::matcher::normalize_title;
use crate::result::{CopyCounts, CopyResult};
use crate::session::StoreSession;

/// How the donor is chosen within a group of same-titled products.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DonorStrategy {
    /// The product with the most metafields; ties go to the first listed.
    #[default]
    MostMetafields,
    OldestId,
    NewestId,
}

impl fmt::Display for DonorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MostMetafields => "most-metafields",
            Self::OldestId => "oldest-id",
            Self::NewestId => "newest-id",
        })
    }
}

impl FromStr for DonorStrategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "most-metafields" => Ok(Self::MostMetafields),
            "oldest-id" => Ok(Self::OldestId),
            "newest-id" => Ok(Self::NewestId),
            _ => Err(EngineError::UnknownOption {
                kind: "donor strategy",
                value: s.to_owned(),
                expected: "most-metafields, oldest-id, newest-id",
            }),
        }
    }
}

/// Products sharing a normalised title, in listing order. Only groups with
/// two or more members are returned, ordered by first appearance.
#[must_use]
pub fn duplicate_groups(products: &[Product]) -> Vec<Vec<&Product>> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&Product>> = HashMap::new();
    for product in products {
        let title = normalize_title(&product.title);
        if title.is_empty() {
            continue;
        }
        let group = groups.entry(title.clone()).or_default();
        if group.is_empty() {
            order.push(title);
        }
        group.push(product);
    }
    order
        .into_iter()
        .filter_map(|title| groups.remove(&title))
        .filter(|group| group.len() > 1)
        .collect()
}

#[derive(Debug, Clone)]
pub struct DedupePair {
    pub title: String,
    pub donor_id: i64,
    pub receiver_id: i64,
    pub result: CopyResult,
}

#[derive(Debug, Clone, Default)]
pub struct DedupeReport {
    pub groups: usize,
    pub pairs: Vec<DedupePair>,
}

impl DedupeReport {
    #[must_use]
    pub fn totals(&self) -> CopyCounts {
        let mut totals = CopyCounts::default();
        for pair in &self.pairs {
            totals.merge(&pair.result.counts);
        }
        totals
    }
}

/// For every group of same-titled products, copies product-level metafields
/// from the chosen donor to each other member.
///
/// # Errors
///
/// Returns [`EngineError::Shopify`] when the product list cannot be read.
/// Metafield failures are counted per pair instead.
pub async fn dedupe_titles<S: CatalogStore>(
    session: &mut StoreSession<S>,
    strategy: DonorStrategy,
    options: &CopyOptions,
) -> Result<DedupeReport, EngineError> {
    let products = session.products().await?.to_vec();
    let store = session.store();
    let groups = duplicate_groups(&products);
    tracing::info!(store = store.label(), groups = groups.len(), %strategy, "duplicate titles found");

    let mut report = DedupeReport {
        groups: groups.len(),
        pairs: Vec::new(),
    };

    for group in groups {
        let mut fetched: HashMap<i64, Vec<Metafield>> = HashMap::new();
        let donor = match strategy {
            DonorStrategy::MostMetafields => {
                for product in &group {
                    match store.list_metafields(Owner::product(product.id)).await {
                        Ok(fields) => {
                            fetched.insert(product.id, fields);
                        }
                        Err(err) => {
                            tracing::warn!(
                                store = store.label(),
                                product_id = product.id,
                                error = %err,
                                "could not count metafields"
                            );
                        }
                    }
                }
                pick_most_metafields(&group, &fetched)
            }
            DonorStrategy::OldestId => group.iter().copied().min_by_key(|p| p.id),
            DonorStrategy::NewestId => group.iter().copied().max_by_key(|p| p.id),
        };
        let Some(donor) = donor else { continue };

        let donor_fields = match fetched.remove(&donor.id) {
            Some(fields) => Ok(fields),
            None => store.list_metafields(Owner::product(donor.id)).await,
        };

        for receiver in group.iter().filter(|p| p.id != donor.id) {
            let donor_owner = Owner::product(donor.id);
            let receiver_owner = Owner::product(receiver.id);
            let context = pass_context(store.label(), donor_owner, store.label(), receiver_owner);
            let result = match &donor_fields {
                Ok(fields) => {
                    copy_from_fields(&context, fields, store, receiver_owner, options).await
                }
                Err(err) => discovery_failure(&context, "donor", &err.to_string()),
            };
            report.pairs.push(DedupePair {
                title: donor.title.clone(),
                donor_id: donor.id,
                receiver_id: receiver.id,
                result,
            });
        }
    }

    Ok(report)
}

/// Member with the most fetched metafields; the first listed wins a tie.
/// Members whose metafields could not be read count as zero.
fn pick_most_metafields<'a>(
    group: &[&'a Product],
    fetched: &HashMap<i64, Vec<Metafield>>,
) -> Option<&'a Product> {
    let mut best: Option<(&Product, usize)> = None;
    for &product in group {
        let count = fetched.get(&product.id).map_or(0, Vec::len);
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((product, count));
        }
    }
    best.map(|(product, _)| product)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product(id: i64, title: &str) -> Product {
        serde_json::from_value(json!({"id": id, "title": title})).unwrap()
    }

    fn fields(n: usize) -> Vec<Metafield> {
        (0..n)
            .map(|i| {
                serde_json::from_value(json!({"id": i, "namespace": "d", "key": format!("k{i}")}))
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn groups_by_trimmed_lowercased_title() {
        let products = vec![
            product(1, "Tee"),
            product(2, "Cap"),
            product(3, " tee "),
            product(4, "Hoodie"),
            product(5, "CAP"),
            product(6, "TEE"),
        ];
        let groups: Vec<Vec<i64>> = duplicate_groups(&products)
            .iter()
            .map(|g| g.iter().map(|p| p.id).collect())
            .collect();
        assert_eq!(groups, vec![vec![1, 3, 6], vec![2, 5]]);
    }

    #[test]
    fn blank_titles_are_not_grouped() {
        let products = vec![product(1, " "), product(2, "")];
        assert!(duplicate_groups(&products).is_empty());
    }

    #[test]
    fn most_metafields_breaks_ties_by_listing_order() {
        let a = product(1, "Tee");
        let b = product(2, "Tee");
        let c = product(3, "Tee");
        let group = vec![&a, &b, &c];
        let mut fetched = HashMap::new();
        fetched.insert(1, fields(1));
        fetched.insert(2, fields(3));
        fetched.insert(3, fields(3));
        assert_eq!(pick_most_metafields(&group, &fetched).unwrap().id, 2);

        let empty = HashMap::new();
        assert_eq!(pick_most_metafields(&group, &empty).unwrap().id, 1);
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!("oldest_id".parse::<DonorStrategy>().unwrap(), DonorStrategy::OldestId);
        assert_eq!(" Newest-Id".parse::<DonorStrategy>().unwrap(), DonorStrategy::NewestId);
        assert!("random".parse::<DonorStrategy>().is_err());
        assert_eq!(DonorStrategy::default().to_string(), "most-metafields");
    }
}
