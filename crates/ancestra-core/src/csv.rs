//! # CSV Product Import/Export
//!
//! Implements the fixed-column CSV contract used by the inventory screen:
//!
//! ```text
//! id,name,product_code,category,price,quantity,reorder_level
//! ```
//!
//! Import is forgiving on purpose, because the files come from hand-edited
//! spreadsheets:
//! - headers are matched case-insensitively, with `product_id`, `product_name`
//!   and `code` accepted as aliases
//! - numeric fields that fail to parse produce a per-row error and are
//!   treated as absent instead of aborting the batch
//! - quoted fields, embedded commas/newlines and a UTF-8 BOM are handled
//!
//! No crate in this workspace's stack covers CSV, so the reader/writer is a
//! small RFC-4180 subset kept here next to the other pure parsing logic.
//! The matching and upsert side lives in the product repository; this module
//! only parses and interprets rows.

use thiserror::Error;

use crate::types::Product;

/// Export column order; also the canonical import header.
pub const EXPORT_HEADER: [&str; 7] = [
    "id",
    "name",
    "product_code",
    "category",
    "price",
    "quantity",
    "reorder_level",
];

/// File-shape problems that abort the import before any row is processed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsvFileError {
    #[error("CSV file is missing a header row.")]
    MissingHeader,
}

// =============================================================================
// Low-Level Reader
// =============================================================================

/// Splits CSV text into records of unquoted field values.
///
/// Handles `""` escapes inside quoted fields, bare CR/LF/CRLF terminators,
/// and skips truly blank lines (whitespace-only lines still count as rows,
/// matching how spreadsheet exports behave).
pub fn parse(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // Distinguishes an empty line from a line like `""` or `,`.
    let mut saw_structure = false;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' => {
                in_quotes = true;
                saw_structure = true;
            }
            ',' => {
                fields.push(std::mem::take(&mut field));
                saw_structure = true;
            }
            '\r' | '\n' => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                if saw_structure || !field.is_empty() {
                    fields.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut fields));
                }
                saw_structure = false;
            }
            _ => field.push(ch),
        }
    }
    if saw_structure || !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(fields);
    }

    records
}

// =============================================================================
// Import Rows
// =============================================================================

/// One data row with header-keyed access, before numeric interpretation.
#[derive(Debug, Clone)]
pub struct RawRow {
    /// 1-based file row number; the header is row 1, so data starts at 2.
    /// Used verbatim in error messages.
    pub number: usize,
    keys: Vec<String>,
    values: Vec<String>,
}

impl RawRow {
    /// Looks up a column by normalized header name. Returns `None` for
    /// missing columns and for empty values, which the import treats alike.
    pub fn get(&self, key: &str) -> Option<&str> {
        // Later duplicate headers shadow earlier ones.
        self.keys
            .iter()
            .enumerate()
            .rev()
            .find(|(_, k)| k.as_str() == key)
            .and_then(|(i, _)| self.values.get(i))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// First non-empty value among alias columns.
    pub fn get_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    /// Resolves the row into typed fields, appending parse errors for bad
    /// numerics. An errored numeric becomes `None`, so the row can still be
    /// matched and partially applied.
    pub fn interpret(&self, errors: &mut Vec<String>) -> ImportRow {
        ImportRow {
            number: self.number,
            id: self.get_any(&["id", "product_id"]).map(str::to_string),
            name: self.get_any(&["name", "product_name"]).map(str::to_string),
            product_code: self.get_any(&["product_code", "code"]).map(str::to_string),
            category: self.get("category").map(str::to_string),
            price: parse_float(self.get("price"), "price", self.number, errors),
            quantity: parse_int(self.get("quantity"), "quantity", self.number, errors),
            reorder_level: parse_int(
                self.get("reorder_level"),
                "reorder_level",
                self.number,
                errors,
            ),
        }
    }
}

/// Typed view of one import row. `None` means absent, empty, or unparseable
/// (with the parse failure already recorded).
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub number: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub product_code: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub reorder_level: Option<i64>,
}

/// Parses import text into header-resolved rows.
///
/// Whitespace-only input yields no rows (the import reports all-zero counts).
/// Header cells are trimmed and lowercased; value cells are trimmed.
pub fn parse_import(text: &str) -> Result<Vec<RawRow>, CsvFileError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut records = parse(text).into_iter();
    let header: Vec<String> = match records.next() {
        Some(record) => record
            .iter()
            .map(|cell| cell.trim().to_lowercase())
            .collect(),
        None => return Err(CsvFileError::MissingHeader),
    };

    Ok(records
        .enumerate()
        .map(|(i, record)| RawRow {
            number: i + 2,
            keys: header.clone(),
            values: record.iter().map(|cell| cell.trim().to_string()).collect(),
        })
        .collect())
}

fn parse_float(
    value: Option<&str>,
    field: &str,
    row_number: usize,
    errors: &mut Vec<String>,
) -> Option<f64> {
    let value = value?;
    match value.parse::<f64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.push(format!(
                "Row {row_number}: Invalid number for '{field}' -> '{value}'"
            ));
            None
        }
    }
}

fn parse_int(
    value: Option<&str>,
    field: &str,
    row_number: usize,
    errors: &mut Vec<String>,
) -> Option<i64> {
    let value = value?;
    // Spreadsheets export integers as "5.0"; accept those but truncate.
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Some(parsed.trunc() as i64),
        _ => {
            errors.push(format!(
                "Row {row_number}: Invalid integer for '{field}' -> '{value}'"
            ));
            None
        }
    }
}

// =============================================================================
// Export
// =============================================================================

/// Serializes the catalog in export-header order with CRLF line endings.
pub fn export_products(products: &[Product]) -> String {
    let mut out = String::new();
    write_record(&mut out, &EXPORT_HEADER);
    for product in products {
        let fields = [
            product.id.clone(),
            product.name.clone(),
            product.product_code.clone().unwrap_or_default(),
            product.category.clone(),
            format!("{:.2}", product.price),
            product.quantity.to_string(),
            product.reorder_level.to_string(),
        ];
        let refs: Vec<&str> = fields.iter().map(String::as_str).collect();
        write_record(&mut out, &refs);
    }
    out
}

fn write_record(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains(['"', ',', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push_str("\r\n");
}
