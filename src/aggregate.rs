//! Item Aggregation Module
//!
//! Deduplicates item rows by `(order_id, code)` and derives the per-order
//! totals dataset once segmentation is complete.

use std::collections::HashMap;

use crate::types::{Item, Order, Total};

/// Insertion-ordered item collection with merge-on-duplicate semantics.
///
/// Descriptive fields (name, brand, promotion) keep their first-seen values;
/// `quantity` and `interest_discount` accumulate across repeats and the
/// subtotal is recomputed from the merged figures.
pub(crate) struct ItemStore {
    items: Vec<Item>,
    index: HashMap<(String, String), usize>,
}

impl ItemStore {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert or merge an item. Returns `true` when the item was new.
    pub(crate) fn upsert(&mut self, item: Item) -> bool {
        let key = (item.order_id.clone(), item.code.clone());
        match self.index.get(&key) {
            Some(&pos) => {
                let existing = &mut self.items[pos];
                existing.quantity += item.quantity;
                existing.interest_discount += item.interest_discount;
                existing.subtotal =
                    existing.quantity * existing.unit_price + existing.interest_discount;
                false
            }
            None => {
                self.index.insert(key, self.items.len());
                self.items.push(item);
                true
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn into_items(self) -> Vec<Item> {
        self.items
    }
}

/// Final assembly: recompute subtotals, derive totals, sort all three
/// datasets by order id so equal inputs produce identical outputs.
pub(crate) fn finalize(
    mut orders: Vec<Order>,
    store: ItemStore,
) -> (Vec<Order>, Vec<Item>, Vec<Total>) {
    let mut items = store.items;

    // Subtotals are authoritative over whatever the export carried.
    for item in &mut items {
        item.subtotal = item.quantity * item.unit_price + item.interest_discount;
    }

    let mut grouped: HashMap<&str, Total> = HashMap::new();
    for item in &items {
        let entry = grouped
            .entry(item.order_id.as_str())
            .or_insert_with(|| Total {
                order_id: item.order_id.clone(),
                item_count: 0,
                gross_value: 0.0,
                discount_value: 0.0,
                net_value: 0.0,
            });
        entry.item_count += 1;
        entry.gross_value += item.quantity * item.unit_price;
        entry.discount_value += item.interest_discount;
        entry.net_value += item.subtotal;
    }
    let mut totals: Vec<Total> = grouped.into_values().collect();

    orders.sort_by(|a, b| a.order_id.cmp(&b.order_id));
    items.sort_by(|a, b| a.order_id.cmp(&b.order_id));
    totals.sort_by(|a, b| a.order_id.cmp(&b.order_id));

    (orders, items, totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(order_id: &str, code: &str, qty: f64, price: f64, disc: f64) -> Item {
        Item {
            order_id: order_id.to_string(),
            code: code.to_string(),
            name: format!("item {}", code),
            brand: String::new(),
            promotion: String::new(),
            quantity: qty,
            unit_price: price,
            interest_discount: disc,
            subtotal: qty * price + disc,
            net_total: 0.0,
            cost_value: 0.0,
            profit_pct: 0.0,
            purchase_cost: 0.0,
            source_row: 0,
        }
    }

    fn order(id: &str) -> Order {
        Order {
            order_id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_merges_and_keeps_first_descriptives() {
        let mut store = ItemStore::new();
        let mut first = item("1", "A", 2.0, 10.0, 1.0);
        first.name = "original".to_string();
        assert!(store.upsert(first));

        let mut second = item("1", "A", 3.0, 10.0, 2.0);
        second.name = "changed".to_string();
        assert!(!store.upsert(second));

        let items = store.into_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "original");
        assert!((items[0].quantity - 5.0).abs() < 1e-9);
        assert!((items[0].subtotal - 53.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_code_different_orders_stay_separate() {
        let mut store = ItemStore::new();
        store.upsert(item("1", "A", 1.0, 5.0, 0.0));
        store.upsert(item("2", "A", 2.0, 5.0, 0.0));
        assert_eq!(store.into_items().len(), 2);
    }

    #[test]
    fn test_totals_aggregation_law() {
        let mut store = ItemStore::new();
        store.upsert(item("1", "A", 2.0, 10.0, -1.0));
        store.upsert(item("1", "B", 1.0, 4.0, 0.5));
        store.upsert(item("2", "A", 3.0, 2.0, 0.0));

        let (_, items, totals) = finalize(vec![order("1"), order("2")], store);
        assert_eq!(totals.len(), 2);

        let t1 = &totals[0];
        assert_eq!(t1.order_id, "1");
        assert_eq!(t1.item_count, 2);
        assert!((t1.gross_value - 24.0).abs() < 1e-9);
        assert!((t1.discount_value - -0.5).abs() < 1e-9);
        assert!((t1.net_value - 23.5).abs() < 1e-9);
        assert!((t1.net_value - (t1.gross_value + t1.discount_value)).abs() < 1e-9);

        let sum: f64 = items
            .iter()
            .filter(|i| i.order_id == "1")
            .map(|i| i.subtotal)
            .sum();
        assert!((sum - t1.net_value).abs() < 1e-9);
    }

    #[test]
    fn test_orders_without_items_get_no_total() {
        let store = ItemStore::new();
        let (orders, items, totals) = finalize(vec![order("9")], store);
        assert_eq!(orders.len(), 1);
        assert!(items.is_empty());
        assert!(totals.is_empty());
    }

    #[test]
    fn test_output_sorted_by_order_id() {
        let mut store = ItemStore::new();
        store.upsert(item("20", "A", 1.0, 1.0, 0.0));
        store.upsert(item("10", "B", 1.0, 1.0, 0.0));

        let (orders, items, totals) = finalize(vec![order("20"), order("10")], store);
        assert_eq!(orders[0].order_id, "10");
        assert_eq!(items[0].order_id, "10");
        assert_eq!(totals[0].order_id, "10");
    }
}
