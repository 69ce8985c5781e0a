//! Cross-dock matching of shipment lines against order demand (pure).
//!
//! Matching is greedy and first-come: each shipment line is matched against
//! the order line with the same item, `matched = min(shipment remaining,
//! order remaining)`. There is no allocation across several order lines.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cargobay_core::{DomainError, DomainResult, ItemId, OrderId, ShipmentId, ValueObject};

use crate::order::{Order, OrderStatus};
use crate::shipment::{CrossDockStatus, Shipment, ShipmentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Matched,
    Pending,
}

/// One line of a matching report. Transient; never persisted as an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub shipment_id: ShipmentId,
    pub order_id: OrderId,
    pub item_id: ItemId,
    pub matched_amount: u64,
    /// Order demand left for this item after the match.
    pub remaining_order_amount: u64,
    /// Shipment quantity left without demand (item absent from the order, or
    /// more shipped than ordered).
    pub pending_amount: u64,
    pub status: MatchStatus,
}

impl ValueObject for MatchResult {}

/// The order a shipment feeds: the first one whose linked set contains it.
pub fn linked_order<'a>(shipment_id: ShipmentId, orders: &'a [Order]) -> Option<&'a Order> {
    orders.iter().find(|o| o.links_shipment(shipment_id))
}

/// Commit a shipment against its order and deliver it.
///
/// Both entities are updated together or not at all: the work happens on
/// copies which replace the originals only when every line succeeded.
pub fn ship_items(
    shipment: &mut Shipment,
    order: &mut Order,
    now: DateTime<Utc>,
) -> DomainResult<Vec<MatchResult>> {
    shipment.ensure_shippable()?;
    let shipment_id = shipment.id_typed();
    let order_id = order.id_typed();
    if !order.links_shipment(shipment_id) {
        return Err(DomainError::invalid_state(format!(
            "order {order_id} is not linked to shipment {shipment_id}"
        )));
    }

    let mut next_shipment = shipment.clone();
    let mut next_order = order.clone();
    let mut results = Vec::new();

    for line in next_shipment.items_mut() {
        let Some(order_line) = next_order.line_mut(line.item_id()) else {
            continue;
        };

        let matched = line.remaining_amount().min(order_line.remaining_amount());
        line.take(matched)?;
        order_line.take(matched)?;

        line.set_status(if line.remaining_amount() == 0 {
            CrossDockStatus::Shipped
        } else {
            CrossDockStatus::Matched
        });

        results.push(MatchResult {
            shipment_id,
            order_id,
            item_id: line.item_id().clone(),
            matched_amount: matched,
            remaining_order_amount: order_line.remaining_amount(),
            pending_amount: line.remaining_amount(),
            status: MatchStatus::Matched,
        });
    }

    next_order.refresh_status();
    next_order.touch(now);
    next_shipment.mark_delivered(now);

    *shipment = next_shipment;
    *order = next_order;
    Ok(results)
}

/// Read-only matching preview.
///
/// Covers every shipment not yet delivered (or only `filter`) that has a
/// linked order. Order-line capacity is tracked in a working copy shared by
/// the whole pass, so two shipments feeding the same order never both claim
/// the same demand. Matched results come first, pending ones after.
pub fn preview_matches(
    shipments: &[Shipment],
    orders: &[Order],
    filter: Option<ShipmentId>,
) -> Vec<MatchResult> {
    let mut capacity: HashMap<(OrderId, ItemId), u64> = HashMap::new();
    let mut matched = Vec::new();
    let mut pending = Vec::new();

    let candidates = shipments.iter().filter(|s| {
        s.status() != ShipmentStatus::Delivered && filter.is_none_or(|id| s.id_typed() == id)
    });

    for shipment in candidates {
        let Some(order) = linked_order(shipment.id_typed(), orders) else {
            continue;
        };
        let order_id = order.id_typed();

        for line in shipment.items() {
            let on_dock = line.remaining_amount();
            let Some(order_line) = order.line(line.item_id()) else {
                if on_dock > 0 {
                    pending.push(MatchResult {
                        shipment_id: shipment.id_typed(),
                        order_id,
                        item_id: line.item_id().clone(),
                        matched_amount: 0,
                        remaining_order_amount: 0,
                        pending_amount: on_dock,
                        status: MatchStatus::Pending,
                    });
                }
                continue;
            };

            let left = capacity
                .entry((order_id, line.item_id().clone()))
                .or_insert(order_line.remaining_amount());
            let amount = on_dock.min(*left);
            *left -= amount;

            if amount > 0 {
                matched.push(MatchResult {
                    shipment_id: shipment.id_typed(),
                    order_id,
                    item_id: line.item_id().clone(),
                    matched_amount: amount,
                    remaining_order_amount: *left,
                    pending_amount: 0,
                    status: MatchStatus::Matched,
                });
            }
            if on_dock > amount {
                pending.push(MatchResult {
                    shipment_id: shipment.id_typed(),
                    order_id,
                    item_id: line.item_id().clone(),
                    matched_amount: 0,
                    remaining_order_amount: *left,
                    pending_amount: on_dock - amount,
                    status: MatchStatus::Pending,
                });
            }
        }
    }

    matched.extend(pending);
    matched
}

/// Whether every line of the order has been satisfied.
pub fn is_fulfilled(order: &Order) -> bool {
    order.status() == OrderStatus::Fulfilled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{LineFulfillment, OrderItemLine};
    use crate::shipment::ShipmentItemLine;
    use proptest::prelude::*;

    fn item(id: &str) -> ItemId {
        ItemId::new(id).unwrap()
    }

    fn shipment(id: u64, order: u64, lines: &[(&str, u64)]) -> Shipment {
        Shipment::new(
            ShipmentId::new(id),
            [OrderId::new(order)],
            lines
                .iter()
                .map(|(i, q)| ShipmentItemLine::new(item(i), *q))
                .collect(),
            Utc::now(),
        )
    }

    fn order(id: u64, shipments: &[u64], lines: &[(&str, u64)]) -> Order {
        Order::new(
            OrderId::new(id),
            shipments.iter().map(|s| ShipmentId::new(*s)),
            lines
                .iter()
                .map(|(i, q)| OrderItemLine::new(item(i), *q))
                .collect(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn ship_items_matches_min_and_delivers() {
        let mut s1 = shipment(1, 1, &[("X", 6)]);
        let mut o1 = order(1, &[1], &[("X", 10)]);
        s1.receive(Utc::now()).unwrap();

        let results = ship_items(&mut s1, &mut o1, Utc::now()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matched_amount, 6);
        assert_eq!(results[0].remaining_order_amount, 4);

        assert_eq!(s1.items()[0].remaining_amount(), 0);
        assert_eq!(s1.items()[0].cross_dock_status(), CrossDockStatus::Shipped);
        assert_eq!(s1.status(), ShipmentStatus::Delivered);

        let line = o1.line(&item("X")).unwrap();
        assert_eq!(line.remaining_amount(), 4);
        assert_eq!(line.fulfillment(), LineFulfillment::PartiallyFulfilled);
        assert_eq!(o1.status(), OrderStatus::PartiallyFulfilled);
    }

    #[test]
    fn oversupply_leaves_line_matched_with_remainder() {
        let mut s1 = shipment(1, 1, &[("X", 12), ("Y", 3)]);
        let mut o1 = order(1, &[1], &[("X", 10)]);
        s1.receive(Utc::now()).unwrap();

        let results = ship_items(&mut s1, &mut o1, Utc::now()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].pending_amount, 2);

        assert_eq!(s1.items()[0].remaining_amount(), 2);
        assert_eq!(s1.items()[0].cross_dock_status(), CrossDockStatus::Matched);
        // No order line for Y: untouched.
        assert_eq!(s1.items()[1].remaining_amount(), 3);
        assert_eq!(s1.items()[1].cross_dock_status(), CrossDockStatus::InTransit);
        assert!(is_fulfilled(&o1));
    }

    #[test]
    fn shipping_twice_is_rejected_without_changes() {
        let mut s1 = shipment(1, 1, &[("X", 6)]);
        let mut o1 = order(1, &[1], &[("X", 10)]);
        s1.receive(Utc::now()).unwrap();
        ship_items(&mut s1, &mut o1, Utc::now()).unwrap();

        let (s_before, o_before) = (s1.clone(), o1.clone());
        let err = ship_items(&mut s1, &mut o1, Utc::now()).unwrap_err();
        assert!(err.is_invalid_state());
        assert_eq!(s1, s_before);
        assert_eq!(o1, o_before);
    }

    #[test]
    fn pending_shipment_cannot_be_shipped() {
        let mut s1 = shipment(1, 1, &[("X", 6)]);
        let mut o1 = order(1, &[1], &[("X", 10)]);
        assert!(ship_items(&mut s1, &mut o1, Utc::now()).unwrap_err().is_invalid_state());
    }

    #[test]
    fn preview_shares_order_capacity_across_shipments() {
        let mut s1 = shipment(1, 1, &[("X", 6)]);
        let mut s2 = shipment(2, 1, &[("X", 6), ("Z", 1)]);
        s1.receive(Utc::now()).unwrap();
        s2.receive(Utc::now()).unwrap();
        let o1 = order(1, &[1, 2], &[("X", 10)]);

        let results = preview_matches(&[s1.clone(), s2.clone()], &[o1.clone()], None);
        let matched: Vec<_> = results
            .iter()
            .filter(|r| r.status == MatchStatus::Matched)
            .map(|r| (r.shipment_id.get(), r.matched_amount, r.remaining_order_amount))
            .collect();
        assert_eq!(matched, vec![(1, 6, 4), (2, 4, 0)]);

        let pending: Vec<_> = results
            .iter()
            .filter(|r| r.status == MatchStatus::Pending)
            .map(|r| (r.shipment_id.get(), r.item_id.to_string(), r.pending_amount))
            .collect();
        assert_eq!(pending, vec![(2, "X".to_string(), 2), (2, "Z".to_string(), 1)]);

        // Nothing was mutated.
        assert_eq!(o1.line(&item("X")).unwrap().remaining_amount(), 10);
        assert_eq!(s2.items()[0].remaining_amount(), 6);
    }

    #[test]
    fn preview_filters_and_skips_delivered_or_unlinked() {
        let s1 = shipment(1, 1, &[("X", 1)]);
        let s2 = shipment(2, 9, &[("X", 1)]);
        let o1 = order(1, &[1], &[("X", 5)]);

        let only_one = preview_matches(&[s1.clone(), s2.clone()], &[o1.clone()], Some(ShipmentId::new(1)));
        assert_eq!(only_one.len(), 1);

        // s2 has no order linking it.
        let none = preview_matches(&[s2], &[o1.clone()], None);
        assert!(none.is_empty());

        let mut s1 = s1;
        let mut o1 = o1;
        s1.receive(Utc::now()).unwrap();
        ship_items(&mut s1, &mut o1, Utc::now()).unwrap();
        assert!(preview_matches(&[s1], &[o1], None).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: matched never exceeds either side, nothing goes negative,
        /// and the preview is stable across repeated calls.
        #[test]
        fn matching_respects_both_sides(shipped in 0u64..50, ordered in 0u64..50) {
            let mut s1 = shipment(1, 1, &[("X", shipped)]);
            let mut o1 = order(1, &[1], &[("X", ordered)]);
            s1.receive(Utc::now()).unwrap();

            let first = preview_matches(&[s1.clone()], &[o1.clone()], None);
            let second = preview_matches(&[s1.clone()], &[o1.clone()], None);
            prop_assert_eq!(&first, &second);

            let results = ship_items(&mut s1, &mut o1, Utc::now()).unwrap();
            let matched = results[0].matched_amount;
            prop_assert!(matched <= shipped && matched <= ordered);
            prop_assert_eq!(s1.items()[0].remaining_amount(), shipped - matched);
            prop_assert_eq!(o1.items()[0].remaining_amount(), ordered - matched);
            prop_assert_eq!(matched, shipped.min(ordered));
        }
    }
}
