/// Column, counter and format constants shared across the pipeline.
/// Column names are the post-normalization names of the retail extract; the
/// defaults in `config::ColumnConfig` are built from them.

// Default column names (after schema normalization)
pub const INVOICE_NO: &str = "invoiceno";
pub const STOCK_CODE: &str = "stockcode";
pub const DESCRIPTION: &str = "description";
pub const QUANTITY: &str = "quantity";
pub const INVOICE_DATE: &str = "invoicedate";
pub const UNIT_PRICE: &str = "unitprice";
pub const CUSTOMER_ID: &str = "customerid";
pub const COUNTRY: &str = "country";

// Derived columns
pub const TOTAL_SALES: &str = "total_sales";

/// Substituted for a missing customer identifier
pub const UNKNOWN_CUSTOMER: &str = "UNKNOWN";

// Date formats
pub const SOURCE_DATE_FORMAT: &str = "%m/%d/%Y %H:%M";
pub const CANONICAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Quality report counters
pub const NULL_INVOICEID: &str = "null_invoiceid";
pub const NULL_CUSTOMERID: &str = "null_customerid";
pub const NONPOSITIVE_QUANTITY: &str = "nonpositive_quantity";
pub const NONPOSITIVE_PRICE: &str = "nonpositive_price";

/// Counters that abort the run when non-zero
pub fn default_gating_counters() -> Vec<String> {
    vec![
        NULL_INVOICEID.to_string(),
        NONPOSITIVE_QUANTITY.to_string(),
        NONPOSITIVE_PRICE.to_string(),
    ]
}

// Delimiters
pub const INPUT_DELIMITER: u8 = b',';
pub const OUTPUT_DELIMITER: u8 = b'\t';
