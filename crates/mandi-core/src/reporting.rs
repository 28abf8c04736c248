//! # Reporting Derivations
//!
//! Pure arithmetic behind the monthly overview cards.
//!
//! ## Calendar Months, Not Rolling Windows
//! ```text
//! "this month"  = invoices whose date falls in the literal year+month
//! "last month"  = the true previous calendar month
//!
//! Dec 2026 compares against Nov 2026  ✓
//! Dec 2026 never compares against Dec 2025  ✗
//! ```
//!
//! The previous month is found by rolling back one day from the 1st,
//! which handles the January → December-of-prior-year boundary without
//! any month arithmetic.
//!
//! Percentages here are display figures only and may be f64; no money
//! flows through them.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Direction of the month-over-month movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// One overview card: this month against the previous calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyComparison {
    pub this_month: Money,
    pub last_month: Money,
    pub difference: Money,
    /// |difference| / last_month × 100, one decimal. 0 without last data.
    pub percentage_diff: f64,
    pub trend: Trend,
    /// False when the previous month had no invoices at all; the card
    /// hides the trend arrow in that case.
    pub has_last_data: bool,
}

impl MonthlyComparison {
    /// Derives the card from the two summed totals.
    ///
    /// ## Example
    /// ```
    /// use mandi_core::money::Money;
    /// use mandi_core::reporting::{MonthlyComparison, Trend};
    ///
    /// let card = MonthlyComparison::from_totals(
    ///     Money::from_rupees(200, 0),
    ///     Money::from_rupees(100, 0),
    /// );
    /// assert_eq!(card.trend, Trend::Up);
    /// assert_eq!(card.percentage_diff, 100.0);
    /// ```
    pub fn from_totals(this_month: Money, last_month: Money) -> Self {
        let difference = this_month - last_month;
        let has_last_data = last_month.is_positive();

        let (percentage_diff, trend) = if has_last_data {
            let pct = difference.paise().abs() as f64 / last_month.paise() as f64 * 100.0;
            let trend = if difference.is_positive() {
                Trend::Up
            } else if difference.is_negative() {
                Trend::Down
            } else {
                Trend::Neutral
            };
            ((pct * 10.0).round() / 10.0, trend)
        } else {
            (0.0, Trend::Neutral)
        };

        MonthlyComparison {
            this_month,
            last_month,
            difference,
            percentage_diff,
            trend,
            has_last_data,
        }
    }
}

/// A date inside the calendar month before the one containing `today`:
/// the 1st of the month, minus one day.
pub fn previous_month_anchor(today: NaiveDate) -> NaiveDate {
    let first = today.with_day(1).unwrap_or(today);
    first.pred_opt().unwrap_or(first)
}

/// Grouping key for a calendar month, matching SQLite's
/// `strftime('%Y-%m', date)`.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increase() {
        let card = MonthlyComparison::from_totals(
            Money::from_rupees(200, 0),
            Money::from_rupees(100, 0),
        );
        assert_eq!(card.trend, Trend::Up);
        assert_eq!(card.percentage_diff, 100.0);
        assert!(card.has_last_data);
        assert_eq!(card.difference, Money::from_rupees(100, 0));
    }

    #[test]
    fn test_decrease() {
        let card = MonthlyComparison::from_totals(
            Money::from_rupees(100, 0),
            Money::from_rupees(200, 0),
        );
        assert_eq!(card.trend, Trend::Down);
        assert_eq!(card.percentage_diff, 50.0);
    }

    #[test]
    fn test_flat_month() {
        let card = MonthlyComparison::from_totals(
            Money::from_rupees(150, 0),
            Money::from_rupees(150, 0),
        );
        assert_eq!(card.trend, Trend::Neutral);
        assert_eq!(card.percentage_diff, 0.0);
        assert!(card.has_last_data);
    }

    #[test]
    fn test_no_last_data() {
        let card = MonthlyComparison::from_totals(Money::from_rupees(100, 0), Money::zero());
        assert!(!card.has_last_data);
        assert_eq!(card.trend, Trend::Neutral);
        assert_eq!(card.percentage_diff, 0.0);
    }

    #[test]
    fn test_percentage_rounds_to_one_decimal() {
        // 100 / 300 × 100 = 33.333… → 33.3
        let card = MonthlyComparison::from_totals(
            Money::from_rupees(400, 0),
            Money::from_rupees(300, 0),
        );
        assert_eq!(card.percentage_diff, 33.3);
    }

    #[test]
    fn test_previous_month_anchor_mid_year() {
        let dec = NaiveDate::from_ymd_opt(2026, 12, 15).unwrap();
        let anchor = previous_month_anchor(dec);
        assert_eq!(anchor, NaiveDate::from_ymd_opt(2026, 11, 30).unwrap());
        assert_eq!(month_key(anchor), "2026-11");
    }

    #[test]
    fn test_previous_month_anchor_january() {
        let jan = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        let anchor = previous_month_anchor(jan);
        assert_eq!(anchor, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(month_key(anchor), "2025-12");
    }

    #[test]
    fn test_month_key_pads() {
        assert_eq!(
            month_key(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
            "2026-03"
        );
    }
}
