//! Flattening a store's products, variants and metafields into a two-sheet
//! workbook.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use mfsync_shopify::{sync_keys_from, CatalogStore, Owner, Product, Variant};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::error::EngineError;

const PRODUCT_COLUMNS: [&str; 9] = [
    "product_id",
    "title",
    "handle",
    "vendor",
    "product_type",
    "status",
    "tags",
    "created_at",
    "updated_at",
];
const PRODUCT_KEEP: [&str; 4] = ["product_id", "title", "handle", "product_type"];

const VARIANT_COLUMNS: [&str; 12] = [
    "product_id",
    "product_title",
    "variant_id",
    "variant_title",
    "sku",
    "barcode",
    "price",
    "compare_at_price",
    "position",
    "option1",
    "option2",
    "option3",
];
const VARIANT_KEEP: [&str; 6] = [
    "product_id",
    "product_title",
    "variant_id",
    "variant_title",
    "sku",
    "barcode",
];

const MAX_CATEGORY_LEN: usize = 60;

pub const PRODUCTS_SHEET: &str = "Products";
pub const VARIANTS_SHEET: &str = "Variants";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Product type to export; `None` exports every product.
    pub category: Option<String>,
    /// Only emit metafield columns listed in each owner's sync-flag set.
    pub only_synced: bool,
    pub include_variants: bool,
    /// Pause between variant metafield reads.
    pub variant_delay: Duration,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            category: None,
            only_synced: false,
            include_variants: true,
            variant_delay: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportTables {
    pub products: Table,
    pub variants: Option<Table>,
}

/// Products whose type equals `category`, ignoring case and surrounding
/// whitespace. `None` or a blank category selects everything.
#[must_use]
pub fn filter_by_category<'a>(products: &'a [Product], category: Option<&str>) -> Vec<&'a Product> {
    let wanted = category.map(str::trim).filter(|c| !c.is_empty());
    products
        .iter()
        .filter(|p| {
            wanted.is_none_or(|c| {
                p.product_type
                    .as_deref()
                    .is_some_and(|t| t.trim().eq_ignore_ascii_case(c))
            })
        })
        .collect()
}

/// Builds the product table and, when requested, the variant table.
///
/// An owner whose metafields cannot be read keeps its row with no metafield
/// values; the failure is logged.
pub async fn build_export<S: CatalogStore>(
    store: &S,
    products: &[Product],
    options: &ExportOptions,
) -> ExportTables {
    let selected = filter_by_category(products, options.category.as_deref());
    tracing::info!(
        store = store.label(),
        products = selected.len(),
        category = options.category.as_deref().unwrap_or("all"),
        "building export"
    );

    let mut product_rows = TableBuilder::new(&PRODUCT_COLUMNS, &PRODUCT_KEEP);
    let mut variant_rows = TableBuilder::new(&VARIANT_COLUMNS, &VARIANT_KEEP);

    for product in &selected {
        let meta = owner_values(store, Owner::product(product.id), options.only_synced).await;
        product_rows.push(product_cells(product), meta);

        if options.include_variants {
            for variant in &product.variants {
                if !options.variant_delay.is_zero() {
                    tokio::time::sleep(options.variant_delay).await;
                }
                let meta =
                    owner_values(store, Owner::variant(variant.id), options.only_synced).await;
                variant_rows.push(variant_cells(product, variant), meta);
            }
        }
    }

    ExportTables {
        products: product_rows.finish(),
        variants: options.include_variants.then(|| variant_rows.finish()),
    }
}

/// `namespace.key → value` for one owner; empty when the read fails.
async fn owner_values<S: CatalogStore>(
    store: &S,
    owner: Owner,
    only_synced: bool,
) -> BTreeMap<String, String> {
    let fields = match store.list_metafields(owner).await {
        Ok(fields) => fields,
        Err(err) => {
            tracing::warn!(
                store = store.label(),
                %owner,
                error = %err,
                "metafields unavailable for export"
            );
            return BTreeMap::new();
        }
    };
    let synced = if only_synced {
        Some(sync_keys_from(&fields))
    } else {
        None
    };
    fields
        .iter()
        .filter(|f| synced.as_ref().is_none_or(|keys| keys.contains(&f.key)))
        .map(|f| (f.qualified_key(), f.value.clone().unwrap_or_default()))
        .collect()
}

fn product_cells(product: &Product) -> Vec<String> {
    vec![
        product.id.to_string(),
        product.title.clone(),
        product.handle.clone(),
        product.vendor.clone().unwrap_or_default(),
        product.product_type.clone().unwrap_or_default(),
        product.status.to_string(),
        product.tags.join(", "),
        product.created_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
        product.updated_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
    ]
}

fn variant_cells(product: &Product, variant: &Variant) -> Vec<String> {
    vec![
        product.id.to_string(),
        product.title.clone(),
        variant.id.to_string(),
        variant.title.clone(),
        variant.sku.clone().unwrap_or_default(),
        variant.barcode.clone().unwrap_or_default(),
        variant.price.clone().unwrap_or_default(),
        variant.compare_at_price.clone().unwrap_or_default(),
        variant.position.map(|p| p.to_string()).unwrap_or_default(),
        variant.option1.clone().unwrap_or_default(),
        variant.option2.clone().unwrap_or_default(),
        variant.option3.clone().unwrap_or_default(),
    ]
}

/// Accumulates rows with fixed leading columns and open-ended metafield
/// columns in first-seen order.
struct TableBuilder {
    base: &'static [&'static str],
    keep: &'static [&'static str],
    meta_columns: Vec<String>,
    seen: HashSet<String>,
    rows: Vec<(Vec<String>, BTreeMap<String, String>)>,
}

impl TableBuilder {
    fn new(base: &'static [&'static str], keep: &'static [&'static str]) -> Self {
        Self {
            base,
            keep,
            meta_columns: Vec::new(),
            seen: HashSet::new(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, cells: Vec<String>, meta: BTreeMap<String, String>) {
        for column in meta.keys() {
            if self.seen.insert(column.clone()) {
                self.meta_columns.push(column.clone());
            }
        }
        self.rows.push((cells, meta));
    }

    /// Lays rows out in full, then drops columns that are empty in every row
    /// unless they are always kept.
    fn finish(self) -> Table {
        let headers: Vec<String> = self
            .base
            .iter()
            .map(|h| (*h).to_owned())
            .chain(self.meta_columns.iter().cloned())
            .collect();
        let full: Vec<Vec<String>> = self
            .rows
            .into_iter()
            .map(|(mut cells, meta)| {
                cells.extend(
                    self.meta_columns
                        .iter()
                        .map(|c| meta.get(c).cloned().unwrap_or_default()),
                );
                cells
            })
            .collect();

        let kept: Vec<usize> = (0..headers.len())
            .filter(|&i| {
                self.keep.contains(&headers[i].as_str())
                    || full.iter().any(|row| !row[i].trim().is_empty())
            })
            .collect();

        Table {
            headers: kept.iter().map(|&i| headers[i].clone()).collect(),
            rows: full
                .iter()
                .map(|row| kept.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }
}

/// Restricts `raw` to `[A-Za-z0-9_-]` (other characters become `_`) and
/// truncates it to 60 characters.
#[must_use]
pub fn sanitize_category(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_CATEGORY_LEN)
        .collect()
}

/// `export_{store}_{category}_{date}`; the category is `all` when unset.
#[must_use]
pub fn export_file_stem(store: &str, category: Option<&str>, date: NaiveDate) -> String {
    let category = category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map_or_else(|| "all".to_owned(), sanitize_category);
    format!(
        "export_{}_{category}_{}",
        sanitize_category(store),
        date.format("%Y-%m-%d")
    )
}

/// Writes `table` into `sheet`: a bold header row, then one row per record.
fn fill_sheet(sheet: &mut Worksheet, name: &str, table: &Table) -> Result<(), XlsxError> {
    sheet.set_name(name)?;
    let bold = Format::new().set_bold();
    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, column_index(col)?, header, &bold)?;
    }
    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = u32::try_from(row_idx + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                sheet.write_string(row_num, column_index(col)?, cell)?;
            }
        }
    }
    Ok(())
}

fn column_index(col: usize) -> Result<u16, XlsxError> {
    u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}

/// Writes `{stem}.xlsx` into `dir` with a `Products` and a `Variants` sheet;
/// the variants sheet is empty when variants were not exported.
///
/// # Errors
///
/// Returns [`EngineError::Io`] when `dir` cannot be created and
/// [`EngineError::Workbook`] when the workbook cannot be built or saved.
pub fn write_export(tables: &ExportTables, dir: &Path, stem: &str) -> Result<PathBuf, EngineError> {
    std::fs::create_dir_all(dir).map_err(|source| EngineError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(format!("{stem}.xlsx"));
    let workbook_err = |source: XlsxError| EngineError::Workbook {
        path: path.clone(),
        source,
    };

    let mut workbook = Workbook::new();
    fill_sheet(workbook.add_worksheet(), PRODUCTS_SHEET, &tables.products).map_err(workbook_err)?;
    let no_variants = Table::default();
    fill_sheet(
        workbook.add_worksheet(),
        VARIANTS_SHEET,
        tables.variants.as_ref().unwrap_or(&no_variants),
    )
    .map_err(workbook_err)?;
    workbook.save(&path).map_err(workbook_err)?;

    tracing::debug!(path = %path.display(), "export workbook written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_and_truncates() {
        assert_eq!(sanitize_category("Hats & Caps/2024"), "Hats___Caps_2024");
        assert_eq!(sanitize_category(&"x".repeat(80)).len(), 60);
        assert_eq!(sanitize_category("snake_case-ok"), "snake_case-ok");
    }

    #[test]
    fn file_stem_defaults_category_to_all() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            export_file_stem("shop-a", None, date),
            "export_shop-a_all_2024-05-01"
        );
        assert_eq!(
            export_file_stem("shop-a", Some("T Shirts"), date),
            "export_shop-a_T_Shirts_2024-05-01"
        );
    }

    #[test]
    fn empty_columns_dropped_except_kept_ones() {
        let mut builder = TableBuilder::new(&PRODUCT_COLUMNS, &PRODUCT_KEEP);
        let mut meta = BTreeMap::new();
        meta.insert("details.color".to_owned(), "red".to_owned());
        meta.insert("details.blank".to_owned(), String::new());
        builder.push(
            vec![
                "1".into(),
                "Tee".into(),
                "tee".into(),
                String::new(),
                String::new(),
                "active".into(),
                String::new(),
                String::new(),
                String::new(),
            ],
            meta,
        );
        let table = builder.finish();
        assert_eq!(
            table.headers,
            vec!["product_id", "title", "handle", "product_type", "status", "details.color"]
        );
        assert_eq!(table.rows, vec![vec!["1", "Tee", "tee", "", "active", "red"]]);
    }

    #[test]
    fn write_export_names_the_workbook_after_the_stem() {
        let dir = std::env::temp_dir().join(format!("mfsync-export-{}", std::process::id()));
        let tables = ExportTables {
            products: Table {
                headers: vec!["product_id".into(), "title".into()],
                rows: vec![vec!["1".into(), "Tee, Red".into()]],
            },
            variants: None,
        };
        let written = write_export(&tables, &dir, "export_test").unwrap();
        assert_eq!(written, dir.join("export_test.xlsx"));
        let bytes = std::fs::read(&written).unwrap();
        assert!(bytes.starts_with(b"PK"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
