//! # Receipt Document
//!
//! The semantic input to the formatter. Created by the point-of-sale side
//! and never mutated by the driver. Field aliases accept the order records
//! the shop's backend already stores (`customer_name`, `discount_amount`,
//! `total_amount`, `item_name`, `price`).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::PrinterError;

/// One ordered product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(alias = "item_name")]
    pub name: String,
    pub quantity: u32,
    /// Unit price in whole rupiah
    #[serde(alias = "price")]
    pub unit_price: i64,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: u32, unit_price: i64) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price,
        }
    }

    /// `quantity × unit_price`, or `None` if it does not fit in an `i64`.
    pub fn checked_total(&self) -> Option<i64> {
        i64::from(self.quantity).checked_mul(self.unit_price)
    }

    /// `quantity × unit_price`, saturating at the `i64` bounds.
    pub fn line_total(&self) -> i64 {
        i64::from(self.quantity).saturating_mul(self.unit_price)
    }
}

/// Store header, venue block and closing lines printed on every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreProfile {
    /// Printed bold and double height
    pub name: String,
    pub tagline: String,
    pub address: Vec<String>,
    /// Guest network credentials and similar, printed bold
    pub venue_info: Vec<String>,
    pub thanks: Vec<String>,
}

/// The shop's header and closing lines. The venue lines are placeholders;
/// real network credentials come from a store profile file.
impl Default for StoreProfile {
    fn default() -> Self {
        Self {
            name: "KOPI BREWASA".to_string(),
            tagline: "brewasa.com".to_string(),
            address: vec![
                "Jl. Jalur I No.5, Surgi Mufti,".to_string(),
                "Banjarmasin Utara,".to_string(),
                "Kota Banjarmasin, Kalsel 70122".to_string(),
            ],
            venue_info: vec!["WIFI: Kopi Brewasa".to_string(), "PASS: ngopidulu".to_string()],
            thanks: vec!["Terima Kasih!".to_string(), "Selamat Menikmati".to_string()],
        }
    }
}

/// A fully priced order, ready to print.
///
/// Amounts are whole rupiah. The formatter prints them as given and does not
/// re-derive `subtotal` or `total` from the items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptDocument {
    #[serde(default)]
    pub store: StoreProfile,
    /// Printed as `Guest` when absent or blank
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Printed as the local time of rendering when absent
    #[serde(default)]
    pub printed_at: Option<NaiveDateTime>,
    pub items: Vec<LineItem>,
    pub subtotal: i64,
    /// Zero means no discount row
    #[serde(default, alias = "discount_amount")]
    pub discount: i64,
    #[serde(alias = "total_amount")]
    pub total: i64,
}

impl ReceiptDocument {
    /// Start a document for the default store with the given items.
    ///
    /// Subtotal and total are both the sum of the line totals.
    pub fn new(items: Vec<LineItem>) -> Self {
        let subtotal = items
            .iter()
            .map(LineItem::line_total)
            .fold(0i64, i64::saturating_add);
        Self {
            store: StoreProfile::default(),
            customer_name: None,
            printed_at: None,
            items,
            subtotal,
            discount: 0,
            total: subtotal,
        }
    }

    pub fn customer(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    /// Apply a discount, lowering the total by the same amount.
    pub fn discount(mut self, amount: i64) -> Self {
        self.discount = amount;
        self.total = self.subtotal.saturating_sub(amount);
        self
    }

    pub fn printed_at(mut self, at: NaiveDateTime) -> Self {
        self.printed_at = Some(at);
        self
    }

    pub fn store(mut self, store: StoreProfile) -> Self {
        self.store = store;
        self
    }

    /// Reject documents whose line totals or their sum overflow.
    ///
    /// Amounts come from outside the driver; a receipt with a wrapped or
    /// clamped figure must not be printed.
    pub fn validate(&self) -> Result<(), PrinterError> {
        let mut sum = 0i64;
        for item in &self.items {
            let total = item.checked_total().ok_or_else(|| {
                PrinterError::InvalidDocument(format!(
                    "line total of {:?} overflows ({} x {})",
                    item.name, item.quantity, item.unit_price
                ))
            })?;
            sum = sum.checked_add(total).ok_or_else(|| {
                PrinterError::InvalidDocument("sum of line totals overflows".to_string())
            })?;
        }
        Ok(())
    }

    /// Name for the `Cus:` line.
    pub fn customer_label(&self) -> &str {
        match self.customer_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => "Guest",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        assert_eq!(LineItem::new("Kopi Renjana", 2, 28_000).line_total(), 56_000);
    }

    #[test]
    fn test_new_sums_items() {
        let doc = ReceiptDocument::new(vec![
            LineItem::new("Kopi Renjana", 2, 28_000),
            LineItem::new("Latte Jeda", 1, 32_000),
        ]);
        assert_eq!(doc.subtotal, 88_000);
        assert_eq!(doc.total, 88_000);
        assert_eq!(doc.discount, 0);

        let discounted = doc.discount(5_000);
        assert_eq!(discounted.total, 83_000);
    }

    #[test]
    fn test_default_store_venue_is_placeholder() {
        let store = StoreProfile::default();
        assert_eq!(store.name, "KOPI BREWASA");
        assert_eq!(store.address.len(), 3);
        assert_eq!(store.venue_info, vec!["WIFI: Kopi Brewasa", "PASS: ngopidulu"]);
    }

    #[test]
    fn test_oversized_price_is_rejected() {
        let json = r#"{
            "items": [{"item_name": "Kopi", "quantity": 4, "price": 4611686018427387904}],
            "subtotal": 0,
            "total": 0
        }"#;
        let doc: ReceiptDocument = serde_json::from_str(json).unwrap();

        assert_eq!(doc.items[0].checked_total(), None);
        assert_eq!(doc.items[0].line_total(), i64::MAX);
        assert!(matches!(doc.validate(), Err(PrinterError::InvalidDocument(_))));
    }

    #[test]
    fn test_overflowing_sum_is_rejected() {
        let doc = ReceiptDocument::new(vec![
            LineItem::new("Kopi", 1, i64::MAX),
            LineItem::new("Teh", 1, 1),
        ]);
        assert_eq!(doc.subtotal, i64::MAX);
        assert!(matches!(doc.validate(), Err(PrinterError::InvalidDocument(_))));
    }

    #[test]
    fn test_ordinary_document_is_valid() {
        let doc = ReceiptDocument::new(vec![LineItem::new("Kopi Renjana", 2, 28_000)]);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_customer_label_defaults_to_guest() {
        let doc = ReceiptDocument::new(vec![]);
        assert_eq!(doc.customer_label(), "Guest");
        assert_eq!(doc.clone().customer("  ").customer_label(), "Guest");
        assert_eq!(doc.customer("Raka").customer_label(), "Raka");
    }

    #[test]
    fn test_deserialize_backend_field_names() {
        let json = r#"{
            "customer_name": "Nadia",
            "items": [{"item_name": "Latte Jeda", "quantity": 1, "price": 32000}],
            "subtotal": 32000,
            "discount_amount": 2000,
            "total_amount": 30000
        }"#;
        let doc: ReceiptDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.customer_name.as_deref(), Some("Nadia"));
        assert_eq!(doc.items[0], LineItem::new("Latte Jeda", 1, 32_000));
        assert_eq!(doc.discount, 2_000);
        assert_eq!(doc.total, 30_000);
        assert_eq!(doc.store, StoreProfile::default());
    }
}
