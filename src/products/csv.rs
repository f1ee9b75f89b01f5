use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::PreorderSetting;

/// Expected column order. The header line is required but informational;
/// columns are matched by position, not by name.
pub const CSV_COLUMNS: &str =
    "handle,title,variant_title,variant_sku,preorder_enabled,preorder_limit,preorder_text";

/// Minimum fields for a well-formed data line: handle, title, variant_title,
/// variant_sku. The trailing three columns are optional with defaults.
const MIN_FIELDS: usize = 4;

/// Outcome of a bulk import. `processed <= total`; malformed lines are
/// excluded from `total` and reported in `skipped_lines`.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub processed: usize,
    pub total: usize,
    pub skipped_lines: Vec<usize>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

struct CsvRow {
    line: usize,
    product_handle: String,
    variant_title: String,
    variant_sku: String,
    enabled: bool,
    limit: i64,
    text: String,
}

fn parse_enabled(field: &str) -> bool {
    field.eq_ignore_ascii_case("true") || field == "1"
}

fn parse_limit(field: &str) -> i64 {
    field.parse::<i64>().map_or(0, |n| n.max(0))
}

/// Splits the upload into well-formed rows and skipped line numbers.
/// Line numbers are 1-based positions in the original text.
fn parse_rows(raw: &str) -> Result<(Vec<CsvRow>, Vec<usize>)> {
    let lines: Vec<(usize, &str)> = raw
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(Error::InvalidFormat(
            "csv upload must contain a header line and at least one data line".to_string(),
        ));
    }

    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    // lines[0] is the header
    for &(line, text) in &lines[1..] {
        let fields: Vec<&str> = text.split(',').map(str::trim).collect();
        if fields.len() < MIN_FIELDS {
            skipped.push(line);
            continue;
        }

        rows.push(CsvRow {
            line,
            product_handle: fields[0].to_string(),
            // fields[1] is the display title; the handle is the identity
            variant_title: fields[2].to_string(),
            variant_sku: fields[3].to_string(),
            enabled: fields.get(4).map(|f| parse_enabled(f)).unwrap_or(false),
            limit: fields.get(5).map(|f| parse_limit(f)).unwrap_or(0),
            text: fields.get(6).map_or(String::new(), |f| (*f).to_string()),
        });
    }

    Ok((rows, skipped))
}

/// Imports a CSV upload for one tenant. Each well-formed row is upserted
/// independently; a failed row is recorded and the batch continues. There
/// is no batch-wide transaction, which is safe to retry because every
/// row-upsert is an insert-or-replace on the same key.
pub fn import_csv(
    store: &dyn Store,
    account_id: &str,
    raw: &str,
    now: DateTime<Utc>,
) -> Result<ImportReport> {
    let (rows, skipped_lines) = parse_rows(raw)?;

    let total = rows.len();
    let mut processed = 0;
    let mut errors = Vec::new();

    for row in rows {
        let setting = PreorderSetting {
            account_id: account_id.to_string(),
            product_handle: row.product_handle,
            variant_title: row.variant_title,
            variant_sku: row.variant_sku,
            is_preorder_enabled: row.enabled,
            preorder_limit: row.limit,
            preorder_text: row.text,
            last_updated: now,
            created_at: now,
        };

        match store.upsert_preorder_setting(&setting) {
            Ok(()) => processed += 1,
            Err(e) => {
                tracing::warn!("csv import: line {} failed: {e}", row.line);
                errors.push(RowError {
                    line: row.line,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(ImportReport {
        processed,
        total,
        skipped_lines,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::types::Account;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.migrate().unwrap();
        store
            .create_account(&Account {
                id: "acc-1".to_string(),
                email: "owner@example.com".to_string(),
                password_hash: "a".repeat(64),
                display_name: "Test Shop".to_string(),
                created_at: Utc::now(),
            })
            .unwrap();
        (temp, store)
    }

    #[test]
    fn test_import_well_formed_rows() {
        let (_temp, store) = open_store();

        let csv = format!(
            "{CSV_COLUMNS}\n\
             mug,Mug,Blue,SKU1,true,5,Ships in 2 weeks\n\
             mug,Mug,Red,SKU2,false,0,\n"
        );

        let report = import_csv(&store, "acc-1", &csv, Utc::now()).unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.total, 2);
        assert!(report.skipped_lines.is_empty());
        assert!(report.errors.is_empty());

        let rows = store.list_preorder_settings("acc-1").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].variant_title, "Blue");
        assert!(rows[0].is_preorder_enabled);
        assert_eq!(rows[0].preorder_limit, 5);
        assert_eq!(rows[0].preorder_text, "Ships in 2 weeks");
        assert_eq!(rows[1].variant_title, "Red");
        assert!(!rows[1].is_preorder_enabled);
    }

    #[test]
    fn test_malformed_rows_are_skipped_and_surfaced() {
        let (_temp, store) = open_store();

        let csv = format!(
            "{CSV_COLUMNS}\n\
             mug,Mug\n\
             mug,Mug,Blue,SKU1,true,5,\n"
        );

        let report = import_csv(&store, "acc-1", &csv, Utc::now()).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.total, 1);
        assert_eq!(report.skipped_lines, vec![2]);

        assert_eq!(store.list_preorder_settings("acc-1").unwrap().len(), 1);
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let (_temp, store) = open_store();

        let csv = format!(
            "\n{CSV_COLUMNS}\n\n\
             mug,Mug,Blue,SKU1,true,5,\n\n"
        );

        let report = import_csv(&store, "acc-1", &csv, Utc::now()).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.total, 1);
    }

    #[test]
    fn test_empty_upload_is_invalid_format() {
        let (_temp, store) = open_store();

        for raw in ["", "\n\n", CSV_COLUMNS] {
            let result = import_csv(&store, "acc-1", raw, Utc::now());
            assert!(matches!(result, Err(Error::InvalidFormat(_))), "{raw:?}");
        }
    }

    #[test]
    fn test_optional_fields_default() {
        let (_temp, store) = open_store();

        let csv = format!("{CSV_COLUMNS}\nmug,Mug,Blue,SKU1\n");
        import_csv(&store, "acc-1", &csv, Utc::now()).unwrap();

        let rows = store.list_preorder_settings("acc-1").unwrap();
        assert!(!rows[0].is_preorder_enabled);
        assert_eq!(rows[0].preorder_limit, 0);
        assert_eq!(rows[0].preorder_text, "");
    }

    #[test]
    fn test_non_numeric_limit_coerces_to_zero() {
        let (_temp, store) = open_store();

        let csv = format!(
            "{CSV_COLUMNS}\n\
             mug,Mug,Blue,SKU1,true,lots,\n\
             mug,Mug,Red,SKU2,true,-4,\n"
        );
        import_csv(&store, "acc-1", &csv, Utc::now()).unwrap();

        let rows = store.list_preorder_settings("acc-1").unwrap();
        assert_eq!(rows[0].preorder_limit, 0);
        assert_eq!(rows[1].preorder_limit, 0);
    }

    #[test]
    fn test_empty_variant_title_gets_default() {
        let (_temp, store) = open_store();

        let csv = format!("{CSV_COLUMNS}\nmug,Mug,,SKU1,true,5,\n");
        import_csv(&store, "acc-1", &csv, Utc::now()).unwrap();

        let rows = store.list_preorder_settings("acc-1").unwrap();
        assert_eq!(rows[0].variant_title, "Default");
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let (_temp, store) = open_store();

        let csv = format!(
            "{CSV_COLUMNS}\n\
             mug,Mug,Blue,SKU1,true,5,\n\
             mug,Mug,Red,SKU2,false,0,\n"
        );
        import_csv(&store, "acc-1", &csv, Utc::now()).unwrap();
        let report = import_csv(&store, "acc-1", &csv, Utc::now()).unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(store.list_preorder_settings("acc-1").unwrap().len(), 2);
    }

    #[test]
    fn test_crlf_line_endings() {
        let (_temp, store) = open_store();

        let csv = format!("{CSV_COLUMNS}\r\nmug,Mug,Blue,SKU1,true,5,Ships soon\r\n");
        let report = import_csv(&store, "acc-1", &csv, Utc::now()).unwrap();
        assert_eq!(report.processed, 1);

        let rows = store.list_preorder_settings("acc-1").unwrap();
        assert_eq!(rows[0].preorder_text, "Ships soon");
    }
}
