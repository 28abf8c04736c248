//! # Customer Export
//!
//! Formats the customer list as CSV for download.
//!
//! The byte format is a contract: accountants feed this file to GST
//! filing tools that expect exactly this header, column order, and CRLF
//! line endings. Fields are quoted only when they need to be (commas,
//! quotes, line breaks), with embedded quotes doubled.
//!
//! Serving the file (content type, attachment headers) is the outer
//! layer's job; this module only produces the bytes. Callers pass the
//! list already ordered by name.

use crate::types::Customer;

/// Download filename the rendering layer attaches.
pub const CUSTOMER_CSV_FILENAME: &str = "customer_list.csv";

/// Fixed header row.
pub const CUSTOMER_CSV_HEADER: &str = "Customer Name,Mobile Number,City/Village,Address,GSTIN";

/// Quotes a field only when it contains a delimiter, quote, or line
/// break. Embedded quotes are doubled.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Renders the customer list as CSV with CRLF line endings.
///
/// Optional city and GSTIN render as empty cells; a customer without a
/// GSTIN produces a row ending in a bare comma.
///
/// ## Example
/// ```
/// use mandi_core::export::{customer_csv, CUSTOMER_CSV_HEADER};
///
/// let csv = customer_csv(&[]);
/// assert_eq!(csv, format!("{}\r\n", CUSTOMER_CSV_HEADER));
/// ```
pub fn customer_csv(customers: &[Customer]) -> String {
    let mut out = String::with_capacity(64 + customers.len() * 64);
    out.push_str(CUSTOMER_CSV_HEADER);
    out.push_str("\r\n");

    for customer in customers {
        let row = [
            csv_field(&customer.name),
            csv_field(&customer.mobile),
            csv_field(customer.city.as_deref().unwrap_or("")),
            csv_field(&customer.address),
            csv_field(customer.gstin.as_deref().unwrap_or("")),
        ];
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }

    out
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn customer(name: &str, mobile: &str, city: Option<&str>, address: &str, gstin: Option<&str>) -> Customer {
        Customer {
            id: "c1".to_string(),
            name: name.to_string(),
            mobile: mobile.to_string(),
            city: city.map(|s| s.to_string()),
            address: address.to_string(),
            gstin: gstin.map(|s| s.to_string()),
            wallet_balance_paise: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_header_and_crlf() {
        let csv = customer_csv(&[customer(
            "Test Customer 1",
            "1234567890",
            Some("Test City"),
            "Test Address",
            Some("GST123"),
        )]);

        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert_eq!(lines[0], "Customer Name,Mobile Number,City/Village,Address,GSTIN");
        assert_eq!(lines[1], "Test Customer 1,1234567890,Test City,Test Address,GST123");
        assert!(csv.ends_with("\r\n"));
    }

    #[test]
    fn test_missing_optionals_are_empty_cells() {
        let csv = customer_csv(&[customer(
            "Test Customer 2",
            "0987654321",
            Some("Another City"),
            "Another Address",
            None,
        )]);
        assert!(csv.contains("Test Customer 2,0987654321,Another City,Another Address,\r\n"));

        let csv = customer_csv(&[customer("Walk In", "1112223334", None, "", None)]);
        assert!(csv.contains("Walk In,1112223334,,,\r\n"));
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let csv = customer_csv(&[customer(
            "Sharma & Sons",
            "9998887776",
            Some("Alandi"),
            "Shop 4, Market Road",
            None,
        )]);
        assert!(csv.contains("Sharma & Sons,9998887776,Alandi,\"Shop 4, Market Road\",\r\n"));
    }

    #[test]
    fn test_embedded_quotes_doubled() {
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("plain"), "plain");
    }

    #[test]
    fn test_empty_list_is_header_only() {
        let csv = customer_csv(&[]);
        assert_eq!(csv, "Customer Name,Mobile Number,City/Village,Address,GSTIN\r\n");
    }
}
