//! Backorder detection (pure).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cargobay_core::{DomainError, DomainResult, ItemId, ValueObject};

use crate::order::{MissingItem, Order};
use crate::shipment::Shipment;

/// Shipped quantity per item over every shipment that serves the order.
///
/// A shipment serves an order when its own order list contains it; the
/// shipment status is not considered.
pub fn shipped_amounts(order: &Order, shipments: &[Shipment]) -> BTreeMap<ItemId, u64> {
    let mut shipped = BTreeMap::new();
    for shipment in shipments.iter().filter(|s| s.is_for_order(order.id_typed())) {
        for line in shipment.items() {
            let total = shipped.entry(line.item_id().clone()).or_insert(0u64);
            *total = total.saturating_add(line.quantity());
        }
    }
    shipped
}

/// Items the order is still short of, in order-line order.
pub fn missing_items(order: &Order, shipments: &[Shipment]) -> Vec<MissingItem> {
    let shipped = shipped_amounts(order, shipments);
    order
        .items()
        .iter()
        .filter_map(|line| {
            let have = shipped.get(line.item_id()).copied().unwrap_or(0);
            let amount = line.ordered_amount().saturating_sub(have);
            (amount > 0).then(|| MissingItem {
                item_id: line.item_id().clone(),
                amount,
            })
        })
        .collect()
}

/// Flag the order as backordered and keep only its short lines.
///
/// Fails with `InvalidState` when nothing is missing, and when the order is
/// already backordered for exactly the same shortfall (the update would be
/// a no-op).
pub fn detect_backorder(
    order: &mut Order,
    shipments: &[Shipment],
    now: DateTime<Utc>,
) -> DomainResult<Vec<MissingItem>> {
    let missing = missing_items(order, shipments);
    if missing.is_empty() {
        return Err(DomainError::invalid_state(format!(
            "order {}: nothing to backorder",
            order.id_typed()
        )));
    }
    if order.is_backordered() && order.shipment_details() == missing.as_slice() {
        return Err(DomainError::invalid_state(format!(
            "order {} is already backordered for the same items",
            order.id_typed()
        )));
    }

    order.record_backorder(missing.clone(), now);
    Ok(missing)
}

/// Per-item view of how far an order has been served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFulfillment {
    pub item_id: ItemId,
    pub ordered: u64,
    pub shipped: u64,
    pub outstanding: u64,
}

impl ValueObject for ItemFulfillment {}

pub fn fulfillment_summary(order: &Order, shipments: &[Shipment]) -> Vec<ItemFulfillment> {
    let shipped = shipped_amounts(order, shipments);
    order
        .items()
        .iter()
        .map(|line| {
            let have = shipped.get(line.item_id()).copied().unwrap_or(0);
            ItemFulfillment {
                item_id: line.item_id().clone(),
                ordered: line.ordered_amount(),
                shipped: have,
                outstanding: line.ordered_amount().saturating_sub(have),
            }
        })
        .collect()
}
