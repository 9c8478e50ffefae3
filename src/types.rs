//! Record Types Module
//!
//! The normalized output model: one [`Order`] per detected block, one
//! [`Item`] per `(order_id, code)` key, one [`Total`] per order that
//! produced at least one item, bundled into [`ParseOutput`] together with
//! the audit log and the extraction timestamp.
//!
//! All records are plain owned data: items reference their order by id, not
//! by pointer, and nothing outlives the parse invocation that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::AuditLog;
use crate::error::ParseError;

/// One order block. Created exactly once when its defining data row is
/// parsed; never mutated afterward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier. Never empty: a blank source cell yields a synthetic
    /// `UNKNOWN_<row>` id so the row stays traceable.
    pub order_id: String,
    /// Order type token (`PED`, `ACU`, `DEV`, or free text in some exports).
    pub order_type: String,
    /// Seller name.
    pub seller: String,
    /// Customer name.
    pub customer: String,
    /// Customer registration date ("Data Cad. Cliente").
    pub customer_signup_date: String,
    /// Customer acquisition origin.
    pub customer_origin: String,
    /// Customer phone.
    pub customer_phone: String,
    /// Closing timestamp as rendered by the ERP.
    pub closed_at: String,
    /// Receiving timestamp as rendered by the ERP.
    pub received_at: String,

    /// Product value.
    pub product_value: f64,
    /// Service value.
    pub service_value: f64,
    /// Freight.
    pub freight: f64,
    /// Other expenses ("Out. Desp.").
    pub other_expenses: f64,
    /// Interest.
    pub interest: f64,
    /// TC (card fee) figure.
    pub tc: f64,
    /// Discount.
    pub discount: f64,
    /// Manual credit ("Cred. Man.").
    pub manual_credit: f64,
    /// Net value.
    pub net_value: f64,
    /// Cost.
    pub cost: f64,
    /// Profit fraction ("%Lucro", stored as 0.0–1.0).
    pub profit_pct: f64,
    /// Embedded interest.
    pub embedded_interest: f64,
    /// Embedded CIF freight.
    pub embedded_freight_cif: f64,
    /// Real retention.
    pub real_retention: f64,
    /// Presumed-profit base.
    pub presumed_profit_base: f64,
    /// Presumed-profit fraction.
    pub presumed_profit_pct: f64,
    /// Presumed-profit value.
    pub presumed_profit_value: f64,
    /// Purchase cost.
    pub purchase_cost: f64,

    /// External seller name.
    pub external_seller: String,
    /// Secondary customer registration date ("Dt. Cad. Cliente").
    pub customer_reg_date: String,
    /// Order origin.
    pub origin: String,
    /// Average payment term.
    pub average_term: f64,
    /// General discount value.
    pub general_discount: f64,
    /// General discount fraction.
    pub general_discount_pct: f64,
    /// Impulse value.
    pub impulse_value: f64,
    /// Gift value.
    pub gift_value: f64,
    /// Grouped delivery flag as text ("Ent. Agrupada").
    pub grouped_delivery: String,
    /// User who inserted the order.
    pub inserted_by: String,
    /// Direct-sale company commission value.
    pub direct_sale_commission: f64,
    /// Price table.
    pub price_table: String,
    /// Original order referenced by a return ("Pedido da Devolução").
    pub return_order_ref: String,

    /// Absolute grid row the order data was read from.
    pub source_row: usize,
}

/// One logical item, unique per `(order_id, code)` across the whole parse.
/// Repeated source rows with the same key are folded in (see the item
/// store's merge rule): quantities and interest/discount sum, descriptive
/// fields keep their first-seen value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Owning order id (by value; no pointer back to the order).
    pub order_id: String,
    /// Item code, the second half of the dedup key.
    pub code: String,
    /// Item name (first-seen).
    pub name: String,
    /// Brand (first-seen).
    pub brand: String,
    /// Promotion flag as text (first-seen).
    pub promotion: String,
    /// Quantity, summed across merged rows.
    pub quantity: f64,
    /// Unit sale price (first-seen).
    pub unit_price: f64,
    /// Interest-or-discount figure, summed across merged rows. Sign is
    /// preserved as given; discounts are typically negative.
    pub interest_discount: f64,
    /// Derived subtotal: `quantity * unit_price + interest_discount`.
    pub subtotal: f64,
    /// Net total as reported by the source.
    pub net_total: f64,
    /// Cost value.
    pub cost_value: f64,
    /// Profit fraction.
    pub profit_pct: f64,
    /// Purchase cost.
    pub purchase_cost: f64,
    /// Absolute grid row of the first occurrence, for audit traceability.
    pub source_row: usize,
}

/// Per-order totals, derived entirely from the finalized item set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Total {
    /// Order id.
    pub order_id: String,
    /// Number of distinct item codes.
    pub item_count: usize,
    /// Σ quantity × unit price.
    pub gross_value: f64,
    /// Σ interest/discount.
    pub discount_value: f64,
    /// Σ item subtotal.
    pub net_value: f64,
}

/// Complete result of one parse invocation: the three record collections
/// (stable-sorted by `order_id`), the audit log, and the extraction
/// timestamp, the only time-dependent field in the output.
#[derive(Debug, Clone, Serialize)]
pub struct ParseOutput {
    /// Orders, one per detected block.
    pub orders: Vec<Order>,
    /// Items, one per `(order_id, code)` key.
    pub items: Vec<Item>,
    /// Totals, one per order that produced at least one item.
    pub totals: Vec<Total>,
    /// Ordered audit trail of the parse.
    pub log: AuditLog,
    /// When this extraction ran.
    pub extracted_at: DateTime<Utc>,
}

impl ParseOutput {
    /// Render the whole result as JSON for the persistence collaborator.
    pub fn to_json(&self) -> Result<String, ParseError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;

    fn sample_total() -> Total {
        Total {
            order_id: "100".to_string(),
            item_count: 1,
            gross_value: 50.0,
            discount_value: 0.0,
            net_value: 50.0,
        }
    }

    #[test]
    fn test_output_to_json() {
        let output = ParseOutput {
            orders: Vec::new(),
            items: Vec::new(),
            totals: vec![sample_total()],
            log: AuditLog::new(false),
            extracted_at: Utc::now(),
        };

        let json = output.to_json().unwrap();
        assert!(json.contains("\"totals\""));
        assert!(json.contains("\"order_id\":\"100\""));
        assert!(json.contains("\"extracted_at\""));
    }

    #[test]
    fn test_total_serde_round_trip() {
        let total = sample_total();
        let json = serde_json::to_string(&total).unwrap();
        let back: Total = serde_json::from_str(&json).unwrap();
        assert_eq!(back, total);
    }
}
