//! # Entry Rows
//!
//! Decodes the row-parallel arrays submitted by the multi-row entry
//! grids into typed rows.
//!
//! ## Shape Of The Input
//! ```text
//! product_names:  ["Urea 46%", "",        "Gromor DAP"]
//! batch_numbers:  ["LOT-1",    "LOT-9",   "LOT-2"    ]
//! quantities:     ["10",       "3",       "25"       ]
//! basic_rates:    ["265",      "99",      "1350.50"  ]
//!                      │            │           │
//!                      ▼            ▼           ▼
//!                   row 1       skipped       row 3
//! ```
//!
//! One array per column, one index per row. The grid submits every row
//! it rendered, including ones the operator left blank, so decoding is
//! forgiving by design:
//! - a purchase row with an empty product name is skipped;
//! - a sale/return row with an empty batch id or a quantity ≤ 0 is
//!   skipped;
//! - arrays shorter than the row count read as empty at the missing
//!   indexes;
//! - empty numeric strings decode as zero;
//! - anything non-empty that fails to parse is an error naming the
//!   column and row.
//!
//! Skipping and zero-defaulting never mask a malformed value: "12,50"
//! in a rate cell fails the whole submission.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::{parse_fixed_hundredths, Money};

// =============================================================================
// Field Helpers
// =============================================================================

/// Reads index `i`, treating missing (ragged) entries as empty.
fn at(values: &[String], i: usize) -> &str {
    values.get(i).map(|s| s.trim()).unwrap_or("")
}

fn bad(field: &str, raw: &str, row: usize) -> ValidationError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("'{}' (row {})", raw, row + 1),
    }
}

/// Empty → zero; otherwise a decimal rupee amount.
fn money_at(field: &str, values: &[String], i: usize) -> Result<Money, ValidationError> {
    let raw = at(values, i);
    if raw.is_empty() {
        return Ok(Money::zero());
    }
    raw.parse().map_err(|_| bad(field, raw, i))
}

/// Empty → zero; otherwise a percentage with up to two decimals,
/// returned in basis points ("2.5" → 250).
fn bps_at(field: &str, values: &[String], i: usize) -> Result<i64, ValidationError> {
    let raw = at(values, i);
    if raw.is_empty() {
        return Ok(0);
    }
    parse_fixed_hundredths(raw).ok_or_else(|| bad(field, raw, i))
}

/// Empty → zero; otherwise a whole number.
fn int_at(field: &str, values: &[String], i: usize) -> Result<i64, ValidationError> {
    let raw = at(values, i);
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse().map_err(|_| bad(field, raw, i))
}

/// Empty → zero; otherwise a plain decimal (pack sizes).
fn f64_at(field: &str, values: &[String], i: usize) -> Result<f64, ValidationError> {
    let raw = at(values, i);
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse().map_err(|_| bad(field, raw, i))
}

/// Empty → None; otherwise a `YYYY-MM-DD` date.
fn date_at(field: &str, values: &[String], i: usize) -> Result<Option<NaiveDate>, ValidationError> {
    let raw = at(values, i);
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| bad(field, raw, i))
}

// =============================================================================
// Purchase Rows
// =============================================================================

/// The raw column arrays of a purchase entry grid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseRows {
    pub product_names: Vec<String>,
    pub batch_numbers: Vec<String>,
    pub mfg_dates: Vec<String>,
    pub expiry_dates: Vec<String>,
    pub pack_sizes: Vec<String>,
    pub pack_units: Vec<String>,
    pub mrps: Vec<String>,
    pub basic_rates: Vec<String>,
    pub selling_prices: Vec<String>,
    pub margins: Vec<String>,
    pub quantities: Vec<String>,
}

/// One decoded purchase line, ready for pricing and batch upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRow {
    pub product_name: String,
    pub batch_number: String,
    pub mfg_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub pack_size: f64,
    pub pack_unit: String,
    pub mrp: Money,
    /// Pre-tax unit cost.
    pub basic_rate: Money,
    /// Defaults to the row's MRP when left blank.
    pub selling_price: Money,
    /// Margin as entered, in basis points.
    pub margin_bps: i64,
    pub quantity: i64,
}

impl PurchaseRows {
    /// Decodes the grid. The product-name column drives the row count;
    /// rows with an empty product name are skipped.
    pub fn rows(&self) -> Result<Vec<PurchaseRow>, ValidationError> {
        let mut out = Vec::new();

        for i in 0..self.product_names.len() {
            let product_name = at(&self.product_names, i);
            if product_name.is_empty() {
                continue;
            }

            let mrp = money_at("mrp", &self.mrps, i)?;
            let selling = money_at("selling_price", &self.selling_prices, i)?;
            let pack_unit = at(&self.pack_units, i);

            out.push(PurchaseRow {
                product_name: product_name.to_string(),
                batch_number: at(&self.batch_numbers, i).to_string(),
                mfg_date: date_at("mfg_date", &self.mfg_dates, i)?,
                expiry_date: date_at("expiry_date", &self.expiry_dates, i)?,
                pack_size: f64_at("pack_size", &self.pack_sizes, i)?,
                pack_unit: if pack_unit.is_empty() {
                    "kg".to_string()
                } else {
                    pack_unit.to_string()
                },
                mrp,
                basic_rate: money_at("basic_rate", &self.basic_rates, i)?,
                selling_price: if selling.is_zero() { mrp } else { selling },
                margin_bps: bps_at("margin", &self.margins, i)?,
                quantity: int_at("quantity", &self.quantities, i)?,
            });
        }

        Ok(out)
    }
}

// =============================================================================
// Sales / Return Rows
// =============================================================================

/// The raw column arrays of a sale entry grid.
///
/// The return entry grids are clones of the sale grid and submit the
/// same three arrays, so purchase-return and sales-return decoding
/// reuses this type; `unit_price` is the refund price there.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesRows {
    pub batch_ids: Vec<String>,
    pub quantities: Vec<String>,
    pub unit_prices: Vec<String>,
}

/// One decoded sale (or return) line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesRow {
    pub batch_id: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl SalesRows {
    /// Decodes the grid. The batch-id column drives the row count; rows
    /// with an empty batch id or a quantity ≤ 0 are skipped.
    pub fn rows(&self) -> Result<Vec<SalesRow>, ValidationError> {
        let mut out = Vec::new();

        for i in 0..self.batch_ids.len() {
            let batch_id = at(&self.batch_ids, i);
            if batch_id.is_empty() {
                continue;
            }

            let quantity = int_at("quantity", &self.quantities, i)?;
            if quantity <= 0 {
                continue;
            }

            out.push(SalesRow {
                batch_id: batch_id.to_string(),
                quantity,
                unit_price: money_at("price", &self.unit_prices, i)?,
            });
        }

        Ok(out)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_purchase_rows_skip_empty_product() {
        let grid = PurchaseRows {
            product_names: strs(&["Urea 46%", "", "Gromor DAP"]),
            batch_numbers: strs(&["LOT-1", "LOT-9", "LOT-2"]),
            quantities: strs(&["10", "3", "25"]),
            basic_rates: strs(&["265", "99", "1350.50"]),
            mrps: strs(&["300", "120", "1500"]),
            ..Default::default()
        };

        let rows = grid.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_name, "Urea 46%");
        assert_eq!(rows[0].quantity, 10);
        assert_eq!(rows[0].basic_rate, Money::from_paise(26_500));
        assert_eq!(rows[1].product_name, "Gromor DAP");
        assert_eq!(rows[1].basic_rate, Money::from_paise(135_050));
    }

    #[test]
    fn test_purchase_rows_ragged_arrays_read_as_empty() {
        let grid = PurchaseRows {
            product_names: strs(&["Urea 46%", "Gromor DAP"]),
            batch_numbers: strs(&["LOT-1"]),
            quantities: strs(&["10"]),
            mrps: strs(&["300", "1500"]),
            ..Default::default()
        };

        let rows = grid.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].batch_number, "");
        assert_eq!(rows[1].quantity, 0);
        assert_eq!(rows[1].mrp, Money::from_paise(150_000));
    }

    #[test]
    fn test_purchase_row_selling_defaults_to_mrp() {
        let grid = PurchaseRows {
            product_names: strs(&["Urea 46%", "Gromor DAP"]),
            mrps: strs(&["300", "1500"]),
            selling_prices: strs(&["", "1400"]),
            ..Default::default()
        };

        let rows = grid.rows().unwrap();
        assert_eq!(rows[0].selling_price, Money::from_paise(30_000));
        assert_eq!(rows[1].selling_price, Money::from_paise(140_000));
    }

    #[test]
    fn test_purchase_row_dates_and_unit() {
        let grid = PurchaseRows {
            product_names: strs(&["Urea 46%"]),
            mfg_dates: strs(&["2026-01-15"]),
            expiry_dates: strs(&[""]),
            pack_sizes: strs(&["50"]),
            pack_units: strs(&[""]),
            ..Default::default()
        };

        let rows = grid.rows().unwrap();
        assert_eq!(
            rows[0].mfg_date,
            Some(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap())
        );
        assert_eq!(rows[0].expiry_date, None);
        assert_eq!(rows[0].pack_size, 50.0);
        assert_eq!(rows[0].pack_unit, "kg");
    }

    #[test]
    fn test_purchase_row_margin_to_bps() {
        let grid = PurchaseRows {
            product_names: strs(&["Urea 46%", "Gromor DAP"]),
            margins: strs(&["2.5", ""]),
            ..Default::default()
        };

        let rows = grid.rows().unwrap();
        assert_eq!(rows[0].margin_bps, 250);
        assert_eq!(rows[1].margin_bps, 0);
    }

    #[test]
    fn test_purchase_row_malformed_rate_names_row() {
        let grid = PurchaseRows {
            product_names: strs(&["Urea 46%", "Gromor DAP"]),
            basic_rates: strs(&["265", "12,50"]),
            ..Default::default()
        };

        let err = grid.rows().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("basic_rate"), "{message}");
        assert!(message.contains("row 2"), "{message}");
    }

    #[test]
    fn test_sales_rows_skip_and_decode() {
        let grid = SalesRows {
            batch_ids: strs(&["b-1", "", "b-3", "b-4"]),
            quantities: strs(&["2", "5", "0", "1"]),
            unit_prices: strs(&["100", "50", "75", ""]),
        };

        let rows = grid.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].batch_id, "b-1");
        assert_eq!(rows[0].quantity, 2);
        assert_eq!(rows[0].unit_price, Money::from_paise(10_000));
        // Empty price decodes as zero.
        assert_eq!(rows[1].batch_id, "b-4");
        assert_eq!(rows[1].unit_price, Money::zero());
    }

    #[test]
    fn test_sales_rows_negative_quantity_skipped() {
        let grid = SalesRows {
            batch_ids: strs(&["b-1"]),
            quantities: strs(&["-3"]),
            unit_prices: strs(&["100"]),
        };
        assert!(grid.rows().unwrap().is_empty());
    }

    #[test]
    fn test_sales_rows_malformed_quantity_errors() {
        let grid = SalesRows {
            batch_ids: strs(&["b-1"]),
            quantities: strs(&["two"]),
            unit_prices: strs(&["100"]),
        };
        assert!(grid.rows().is_err());
    }
}
