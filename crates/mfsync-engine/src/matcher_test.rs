use serde_json::json;

use super::*;

fn product(id: i64, title: &str, handle: &str, barcodes: &[&str]) -> Product {
    let variants: Vec<_> = barcodes
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let offset = i64::try_from(i).unwrap();
            json!({"id": id * 100 + offset, "barcode": b, "sku": format!("SKU-{b}")})
        })
        .collect();
    serde_json::from_value(json!({
        "id": id, "title": title, "handle": handle, "variants": variants
    }))
    .unwrap()
}

fn variant(id: i64, fields: serde_json::Value) -> Variant {
    let mut value = fields;
    value["id"] = json!(id);
    serde_json::from_value(value).unwrap()
}

fn found_id(m: ProductMatch<'_>) -> Option<(i64, ProductMatchStrategy)> {
    match m {
        ProductMatch::Found { product, strategy } => Some((product.id, strategy)),
        _ => None,
    }
}

#[test]
fn barcode_beats_title() {
    let donor = product(1, "Linen Shirt", "linen-shirt", &["111"]);
    let candidates = vec![
        product(10, "Linen Shirt", "other-handle", &["999"]),
        product(11, "Summer Top", "summer-top", &["111"]),
    ];
    let m = match_product(&donor, &candidates, &ProductMatchStrategy::DEFAULT_ORDER);
    assert_eq!(found_id(m), Some((11, ProductMatchStrategy::Barcode)));
}

#[test]
fn falls_through_to_handle_then_title() {
    let donor = product(1, "  Linen SHIRT ", "linen-shirt", &[""]);
    let by_handle = vec![product(10, "Other", "linen-shirt", &["5"])];
    let by_title = vec![product(11, "linen shirt", "x", &["6"])];

    let m = match_product(&donor, &by_handle, &ProductMatchStrategy::DEFAULT_ORDER);
    assert_eq!(found_id(m), Some((10, ProductMatchStrategy::Handle)));
    let m = match_product(&donor, &by_title, &ProductMatchStrategy::DEFAULT_ORDER);
    assert_eq!(found_id(m), Some((11, ProductMatchStrategy::Title)));
}

#[test]
fn blank_barcodes_never_match() {
    let donor = product(1, "A", "a", &[" "]);
    let candidates = vec![product(10, "B", "b", &[" "])];
    let m = match_product(&donor, &candidates, &ProductMatchStrategy::DEFAULT_ORDER);
    assert!(matches!(m, ProductMatch::NotFound));
}

#[test]
fn several_candidates_stop_as_ambiguous() {
    let donor = product(1, "Tee", "tee", &["111"]);
    let candidates = vec![
        product(10, "Tee", "tee-red", &["111"]),
        product(11, "Tee", "tee-blue", &["111"]),
        product(12, "Tee", "tee", &["222"]),
    ];
    let m = match_product(&donor, &candidates, &ProductMatchStrategy::DEFAULT_ORDER);
    assert!(matches!(
        m,
        ProductMatch::Ambiguous {
            strategy: ProductMatchStrategy::Barcode,
            candidates: 2
        }
    ));
}

#[test]
fn sku_strategy_is_opt_in() {
    let donor = product(1, "A", "a", &["111"]);
    let candidates: Vec<Product> = vec![serde_json::from_value(json!({
        "id": 10, "title": "B", "handle": "b", "variants": [{"id": 1, "sku": "SKU-111"}]
    }))
    .unwrap()];
    assert!(matches!(
        match_product(&donor, &candidates, &ProductMatchStrategy::DEFAULT_ORDER),
        ProductMatch::NotFound
    ));
    let order = parse_strategy_order("sku").unwrap();
    assert_eq!(
        found_id(match_product(&donor, &candidates, &order)),
        Some((10, ProductMatchStrategy::Sku))
    );
}

#[test]
fn strategy_order_parsing() {
    assert_eq!(
        parse_strategy_order(" Title ,barcode,title").unwrap(),
        vec![ProductMatchStrategy::Title, ProductMatchStrategy::Barcode]
    );
    assert_eq!(
        parse_strategy_order("").unwrap(),
        ProductMatchStrategy::DEFAULT_ORDER.to_vec()
    );
    assert!(matches!(
        parse_strategy_order("barcode,colour"),
        Err(EngineError::UnknownOption { .. })
    ));
}

#[test]
fn variant_keys_trim_and_skip_blanks() {
    let v = variant(1, json!({"barcode": " 123 ", "sku": "", "title": "Red / M", "position": 2}));
    assert_eq!(
        VariantMatchKey::Barcode.key_of(&v),
        Some(MatchKey::Text("123".to_owned()))
    );
    assert_eq!(VariantMatchKey::Sku.key_of(&v), None);
    assert_eq!(VariantMatchKey::Option1.key_of(&v), None);
    assert_eq!(VariantMatchKey::Position.key_of(&v), Some(MatchKey::Position(2)));
}

#[test]
fn duplicate_receiver_key_resolves_to_last_variant() {
    let donor = vec![variant(1, json!({"sku": "A"}))];
    let receiver = vec![
        variant(10, json!({"sku": "A"})),
        variant(11, json!({"sku": "A"})),
    ];
    let pairing = match_variants(&donor, &receiver, VariantMatchKey::Sku);
    assert_eq!(pairing.pairs.len(), 1);
    assert_eq!(pairing.pairs[0].1.id, 11);
}

#[test]
fn unmatched_donor_variants_are_reported() {
    let donor = vec![
        variant(1, json!({"option1": "Red"})),
        variant(2, json!({"option1": "Blue"})),
        variant(3, json!({})),
    ];
    let receiver = vec![
        variant(10, json!({"option1": "red"})),
        variant(11, json!({"option1": "Blue"})),
    ];
    let pairing = match_variants(&donor, &receiver, VariantMatchKey::Option1);
    let paired: Vec<(i64, i64)> = pairing.pairs.iter().map(|(d, r)| (d.id, r.id)).collect();
    assert_eq!(paired, vec![(2, 11)]);
    let unmatched: Vec<i64> = pairing.unmatched.iter().map(|v| v.id).collect();
    assert_eq!(unmatched, vec![1, 3]);
}

#[test]
fn variant_key_parsing() {
    assert_eq!("Option2".parse::<VariantMatchKey>().unwrap(), VariantMatchKey::Option2);
    assert!("colour".parse::<VariantMatchKey>().is_err());
    assert_eq!(VariantMatchKey::default().to_string(), "barcode");
}
