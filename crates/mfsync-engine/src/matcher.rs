//! Finding the counterpart of a product or variant in another store.
//!
//! Stores share no identifiers, so products are correlated by derived keys
//! tried in order: barcode, then handle, then normalised title (SKU can be
//! added). The first strategy with exactly one candidate wins. Two or more
//! candidates stop the search as ambiguous instead of guessing; zero falls
//! through to the next strategy.
//!
//! Variants within a matched pair are correlated by one selectable key.
//! Blank keys never match. When several receiver variants share a key the
//! last one enumerated wins.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use mfsync_shopify::{Product, Variant};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductMatchStrategy {
    Barcode,
    Sku,
    Handle,
    Title,
}

impl ProductMatchStrategy {
    pub const DEFAULT_ORDER: [Self; 3] = [Self::Barcode, Self::Handle, Self::Title];

    fn as_str(self) -> &'static str {
        match self {
            Self::Barcode => "barcode",
            Self::Sku => "sku",
            Self::Handle => "handle",
            Self::Title => "title",
        }
    }

    fn is_candidate(self, donor: &Product, candidate: &Product) -> bool {
        match self {
            Self::Barcode => {
                let wanted: BTreeSet<&str> = donor.barcodes().collect();
                !wanted.is_empty() && candidate.barcodes().any(|b| wanted.contains(b))
            }
            Self::Sku => {
                let wanted: BTreeSet<&str> = skus(donor).collect();
                !wanted.is_empty() && skus(candidate).any(|s| wanted.contains(s))
            }
            Self::Handle => {
                let handle = donor.handle.trim();
                !handle.is_empty() && candidate.handle.trim() == handle
            }
            Self::Title => {
                let title = normalize_title(&donor.title);
                !title.is_empty() && normalize_title(&candidate.title) == title
            }
        }
    }
}

impl fmt::Display for ProductMatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductMatchStrategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "barcode" => Ok(Self::Barcode),
            "sku" => Ok(Self::Sku),
            "handle" => Ok(Self::Handle),
            "title" => Ok(Self::Title),
            _ => Err(EngineError::UnknownOption {
                kind: "product match strategy",
                value: s.to_owned(),
                expected: "barcode, sku, handle, title",
            }),
        }
    }
}

/// Parses a comma-separated strategy order such as `"barcode,handle,title"`.
///
/// # Errors
///
/// Returns [`EngineError::UnknownOption`] for an unrecognised entry.
pub fn parse_strategy_order(raw: &str) -> Result<Vec<ProductMatchStrategy>, EngineError> {
    let mut order = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let strategy = part.parse()?;
        if !order.contains(&strategy) {
            order.push(strategy);
        }
    }
    if order.is_empty() {
        order.extend(ProductMatchStrategy::DEFAULT_ORDER);
    }
    Ok(order)
}

#[derive(Debug, Clone, Copy)]
pub enum ProductMatch<'a> {
    Found {
        product: &'a Product,
        strategy: ProductMatchStrategy,
    },
    /// A strategy yielded several candidates; no confident match.
    Ambiguous {
        strategy: ProductMatchStrategy,
        candidates: usize,
    },
    NotFound,
}

/// Trimmed, lowercased title used for title matching and duplicate grouping.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Finds `donor`'s counterpart among `candidates`, trying `order` in turn.
#[must_use]
pub fn match_product<'a>(
    donor: &Product,
    candidates: &'a [Product],
    order: &[ProductMatchStrategy],
) -> ProductMatch<'a> {
    for &strategy in order {
        let mut hits = candidates.iter().filter(|c| strategy.is_candidate(donor, c));
        match (hits.next(), hits.next()) {
            (None, _) => {}
            (Some(product), None) => return ProductMatch::Found { product, strategy },
            (Some(_), Some(_)) => {
                return ProductMatch::Ambiguous {
                    strategy,
                    candidates: 2 + hits.count(),
                }
            }
        }
    }
    ProductMatch::NotFound
}

fn skus(product: &Product) -> impl Iterator<Item = &str> {
    product
        .variants
        .iter()
        .filter_map(|v| v.sku.as_deref().map(str::trim))
        .filter(|s| !s.is_empty())
}

/// Variant attribute used to pair variants across stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VariantMatchKey {
    #[default]
    Barcode,
    Sku,
    Title,
    Option1,
    Option2,
    Option3,
    Position,
}

/// A derived, comparable variant key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchKey {
    Text(String),
    Position(i64),
}

impl VariantMatchKey {
    /// `variant`'s key, or `None` when the attribute is blank.
    #[must_use]
    pub fn key_of(self, variant: &Variant) -> Option<MatchKey> {
        let text = match self {
            Self::Position => return variant.position.map(MatchKey::Position),
            Self::Barcode => variant.barcode.as_deref(),
            Self::Sku => variant.sku.as_deref(),
            Self::Title => Some(variant.title.as_str()),
            Self::Option1 => variant.option1.as_deref(),
            Self::Option2 => variant.option2.as_deref(),
            Self::Option3 => variant.option3.as_deref(),
        };
        text.map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| MatchKey::Text(t.to_owned()))
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Barcode => "barcode",
            Self::Sku => "sku",
            Self::Title => "title",
            Self::Option1 => "option1",
            Self::Option2 => "option2",
            Self::Option3 => "option3",
            Self::Position => "position",
        }
    }
}

impl fmt::Display for VariantMatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariantMatchKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "barcode" => Ok(Self::Barcode),
            "sku" => Ok(Self::Sku),
            "title" => Ok(Self::Title),
            "option1" => Ok(Self::Option1),
            "option2" => Ok(Self::Option2),
            "option3" => Ok(Self::Option3),
            "position" => Ok(Self::Position),
            _ => Err(EngineError::UnknownOption {
                kind: "variant match key",
                value: s.to_owned(),
                expected: "barcode, sku, title, option1, option2, option3, position",
            }),
        }
    }
}

/// Receiver variants by key. A repeated key maps to the last variant.
#[must_use]
pub fn index_variants(variants: &[Variant], key: VariantMatchKey) -> HashMap<MatchKey, &Variant> {
    variants
        .iter()
        .filter_map(|v| key.key_of(v).map(|k| (k, v)))
        .collect()
}

#[derive(Debug, Default)]
pub struct VariantPairing<'a> {
    /// `(donor, receiver)` pairs in donor order.
    pub pairs: Vec<(&'a Variant, &'a Variant)>,
    pub unmatched: Vec<&'a Variant>,
}

/// Pairs each donor variant with its receiver counterpart under `key`.
#[must_use]
pub fn match_variants<'a>(
    donor: &'a [Variant],
    receiver: &'a [Variant],
    key: VariantMatchKey,
) -> VariantPairing<'a> {
    let index = index_variants(receiver, key);
    let mut pairing = VariantPairing::default();
    for variant in donor {
        match key.key_of(variant).and_then(|k| index.get(&k)) {
            Some(target) => pairing.pairs.push((variant, *target)),
            None => pairing.unmatched.push(variant),
        }
    }
    pairing
}

#[cfg(test)]
#[path = "matcher_test.rs"]
mod tests;
