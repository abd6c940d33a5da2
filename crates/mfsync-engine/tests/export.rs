mod common;

use std::time::Duration;

use calamine::{open_workbook_auto, Reader};
use common::FakeStore;
use mfsync_engine::{build_export, write_export, ExportOptions, PRODUCTS_SHEET, VARIANTS_SHEET};
use mfsync_shopify::{Owner, Product};
use serde_json::json;

fn catalog() -> Vec<Product> {
    serde_json::from_value(json!([
        {
            "id": 1,
            "title": "Trail Tee",
            "handle": "trail-tee",
            "product_type": "Shirts",
            "status": "active",
            "tags": "summer, cotton",
            "variants": [
                {"id": 11, "title": "S", "sku": "TT-S", "barcode": "0001", "price": "20.00", "position": 1},
                {"id": 12, "title": "M", "sku": "TT-M", "price": "20.00", "position": 2}
            ]
        },
        {
            "id": 2,
            "title": "Rain Jacket",
            "handle": "rain-jacket",
            "product_type": " shirts ",
            "status": "draft",
            "variants": []
        },
        {
            "id": 3,
            "title": "Mug",
            "handle": "mug",
            "product_type": "Kitchen",
            "status": "active",
            "variants": [{"id": 31, "title": "Default Title"}]
        }
    ]))
    .unwrap()
}

fn store() -> FakeStore {
    FakeStore::new("Main")
        .with_field(Owner::product(1), "details", "fabric", "single_line_text_field", "cotton")
        .with_field(Owner::product(1), "sync", "sync_fields", "json", r#"["fabric"]"#)
        .with_field(Owner::product(2), "details", "lining", "single_line_text_field", "mesh")
        .with_field(Owner::product(2), "details", "fabric", "single_line_text_field", "nylon")
        .with_field(Owner::variant(11), "fit", "chest_cm", "number_integer", "96")
        .with_field(Owner::product(3), "details", "volume", "single_line_text_field", "350ml")
}

fn options() -> ExportOptions {
    ExportOptions {
        category: Some("shirts".to_owned()),
        variant_delay: Duration::ZERO,
        ..ExportOptions::default()
    }
}

#[tokio::test]
async fn exports_selected_category_with_metafield_columns() {
    let store = store();
    let products = catalog();

    let tables = build_export(&store, &products, &options()).await;

    let table = &tables.products;
    assert_eq!(table.column("product_id").unwrap(), vec!["1", "2"]);
    assert_eq!(table.column("details.fabric").unwrap(), vec!["cotton", "nylon"]);
    assert_eq!(table.column("details.lining").unwrap(), vec!["", "mesh"]);
    assert_eq!(table.column("status").unwrap(), vec!["active", "draft"]);
    assert!(table.column("details.volume").is_none());
    assert!(table.column("vendor").is_none());

    let variants = tables.variants.as_ref().unwrap();
    assert_eq!(variants.column("variant_id").unwrap(), vec!["11", "12"]);
    assert_eq!(variants.column("fit.chest_cm").unwrap(), vec!["96", ""]);
    assert!(variants.column("option3").is_none());
}

#[tokio::test]
async fn only_synced_limits_columns_to_each_owners_sync_keys() {
    let store = store();
    let products = catalog();
    let opts = ExportOptions {
        only_synced: true,
        include_variants: false,
        ..options()
    };

    let tables = build_export(&store, &products, &opts).await;

    let table = &tables.products;
    assert_eq!(table.column("details.fabric").unwrap(), vec!["cotton", ""]);
    assert!(table.column("details.lining").is_none());
    assert!(table.column("sync.sync_fields").is_none());
    assert!(tables.variants.is_none());
}

#[tokio::test]
async fn unreadable_owner_keeps_its_row() {
    let store = store().unreadable(Owner::product(2));
    let products = catalog();
    let opts = ExportOptions {
        include_variants: false,
        ..options()
    };

    let tables = build_export(&store, &products, &opts).await;

    assert_eq!(tables.products.column("product_id").unwrap(), vec!["1", "2"]);
    assert!(tables.products.column("details.lining").is_none());
}

#[tokio::test]
async fn writes_one_workbook_with_product_and_variant_sheets() {
    let store = store();
    let products = catalog();
    let opts = ExportOptions {
        category: None,
        ..options()
    };
    let tables = build_export(&store, &products, &opts).await;
    let dir = std::env::temp_dir().join(format!("mfsync-export-files-{}", std::process::id()));

    let path = write_export(&tables, &dir, "export_main_all_2024-05-01").unwrap();

    assert_eq!(path, dir.join("export_main_all_2024-05-01.xlsx"));
    let mut workbook = open_workbook_auto(&path).unwrap();
    assert_eq!(workbook.sheet_names(), vec![PRODUCTS_SHEET, VARIANTS_SHEET]);

    let products_sheet = workbook.worksheet_range(PRODUCTS_SHEET).unwrap();
    let header: Vec<String> = products_sheet.rows().next().unwrap().iter().map(ToString::to_string).collect();
    assert_eq!(header[..3], ["product_id", "title", "handle"]);
    assert_eq!(products_sheet.height(), 4);
    let variants_sheet = workbook.worksheet_range(VARIANTS_SHEET).unwrap();
    assert_eq!(variants_sheet.height(), 4);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn workbook_keeps_an_empty_variants_sheet_without_variants() {
    let store = store();
    let products = catalog();
    let opts = ExportOptions {
        include_variants: false,
        ..options()
    };
    let tables = build_export(&store, &products, &opts).await;
    let dir = std::env::temp_dir().join(format!("mfsync-export-novariants-{}", std::process::id()));

    let path = write_export(&tables, &dir, "export_main_shirts_2024-05-01").unwrap();

    let mut workbook = open_workbook_auto(&path).unwrap();
    assert_eq!(workbook.sheet_names(), vec![PRODUCTS_SHEET, VARIANTS_SHEET]);
    assert!(workbook.worksheet_range(VARIANTS_SHEET).unwrap().is_empty());
    assert_eq!(workbook.worksheet_range(PRODUCTS_SHEET).unwrap().height(), 3);

    std::fs::remove_dir_all(&dir).unwrap();
}
