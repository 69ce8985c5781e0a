use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cargobay_core::{DomainError, DomainResult, Entity, ItemId, OrderId, ShipmentId, ValueObject};

/// Order fulfillment lifecycle as driven by cross-docking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    PartiallyFulfilled,
    Fulfilled,
}

/// Fulfillment of a single order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineFulfillment {
    Open,
    PartiallyFulfilled,
    Fulfilled,
}

/// One item line of an order.
///
/// `remaining_amount` is the demand still outstanding; it starts at
/// `ordered_amount` and only ever decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderItemLineData")]
pub struct OrderItemLine {
    item_id: ItemId,
    ordered_amount: u64,
    remaining_amount: u64,
    fulfillment: LineFulfillment,
}

#[derive(Deserialize)]
struct OrderItemLineData {
    item_id: ItemId,
    ordered_amount: u64,
    remaining_amount: Option<u64>,
}

impl TryFrom<OrderItemLineData> for OrderItemLine {
    type Error = DomainError;

    fn try_from(data: OrderItemLineData) -> Result<Self, Self::Error> {
        let remaining = data.remaining_amount.unwrap_or(data.ordered_amount);
        if remaining > data.ordered_amount {
            return Err(DomainError::validation(format!(
                "order line {}: remaining {} exceeds ordered {}",
                data.item_id, remaining, data.ordered_amount
            )));
        }
        Ok(Self {
            item_id: data.item_id,
            ordered_amount: data.ordered_amount,
            remaining_amount: remaining,
            fulfillment: fulfillment_of(data.ordered_amount, remaining),
        })
    }
}

fn fulfillment_of(ordered: u64, remaining: u64) -> LineFulfillment {
    if remaining == 0 {
        LineFulfillment::Fulfilled
    } else if remaining < ordered {
        LineFulfillment::PartiallyFulfilled
    } else {
        LineFulfillment::Open
    }
}

impl OrderItemLine {
    pub fn new(item_id: ItemId, ordered_amount: u64) -> Self {
        Self {
            item_id,
            ordered_amount,
            remaining_amount: ordered_amount,
            fulfillment: fulfillment_of(ordered_amount, ordered_amount),
        }
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn ordered_amount(&self) -> u64 {
        self.ordered_amount
    }

    pub fn remaining_amount(&self) -> u64 {
        self.remaining_amount
    }

    pub fn fulfillment(&self) -> LineFulfillment {
        self.fulfillment
    }

    pub(crate) fn take(&mut self, amount: u64) -> DomainResult<()> {
        self.remaining_amount = self.remaining_amount.checked_sub(amount).ok_or_else(|| {
            DomainError::invalid_state(format!(
                "order line {} has {} outstanding, cannot fulfil {}",
                self.item_id, self.remaining_amount, amount
            ))
        })?;
        self.fulfillment = fulfillment_of(self.ordered_amount, self.remaining_amount);
        Ok(())
    }
}

/// An item the order is still short of after all linked shipments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingItem {
    pub item_id: ItemId,
    pub amount: u64,
}

impl ValueObject for MissingItem {}

/// Customer order (external entity consumed and mutated by the core).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderData")]
pub struct Order {
    id: OrderId,
    #[serde(default)]
    shipment_ids: BTreeSet<ShipmentId>,
    status: OrderStatus,
    items: Vec<OrderItemLine>,
    #[serde(default)]
    is_backordered: bool,
    /// Backordered items, replaced on every backorder update.
    #[serde(default)]
    shipment_details: Vec<MissingItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct OrderData {
    id: OrderId,
    #[serde(default)]
    shipment_ids: BTreeSet<ShipmentId>,
    status: OrderStatus,
    items: Vec<OrderItemLine>,
    #[serde(default)]
    is_backordered: bool,
    #[serde(default)]
    shipment_details: Vec<MissingItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderData> for Order {
    type Error = DomainError;

    fn try_from(data: OrderData) -> Result<Self, Self::Error> {
        ensure_one_line_per_item(data.id, &data.items)?;
        Ok(Self {
            id: data.id,
            shipment_ids: data.shipment_ids,
            status: data.status,
            items: data.items,
            is_backordered: data.is_backordered,
            shipment_details: data.shipment_details,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }
}

fn ensure_one_line_per_item(id: OrderId, items: &[OrderItemLine]) -> DomainResult<()> {
    let mut seen = HashSet::new();
    for line in items {
        if !seen.insert(line.item_id()) {
            return Err(DomainError::validation(format!(
                "order {id} has more than one line for item {}",
                line.item_id()
            )));
        }
    }
    Ok(())
}

impl Order {
    /// Orders carry at most one line per item.
    pub fn new(
        id: OrderId,
        shipment_ids: impl IntoIterator<Item = ShipmentId>,
        items: Vec<OrderItemLine>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        ensure_one_line_per_item(id, &items)?;

        let mut order = Self {
            id,
            shipment_ids: shipment_ids.into_iter().collect(),
            status: OrderStatus::Open,
            items,
            is_backordered: false,
            shipment_details: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        order.refresh_status();
        Ok(order)
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn shipment_ids(&self) -> &BTreeSet<ShipmentId> {
        &self.shipment_ids
    }

    pub fn links_shipment(&self, shipment_id: ShipmentId) -> bool {
        self.shipment_ids.contains(&shipment_id)
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItemLine] {
        &self.items
    }

    /// The line for `item_id`.
    pub fn line(&self, item_id: &ItemId) -> Option<&OrderItemLine> {
        self.items.iter().find(|l| l.item_id() == item_id)
    }

    pub(crate) fn line_mut(&mut self, item_id: &ItemId) -> Option<&mut OrderItemLine> {
        self.items.iter_mut().find(|l| l.item_id() == item_id)
    }

    pub fn is_backordered(&self) -> bool {
        self.is_backordered
    }

    pub fn shipment_details(&self) -> &[MissingItem] {
        &self.shipment_details
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn refresh_status(&mut self) {
        self.status = if self.items.iter().all(|l| l.remaining_amount() == 0) {
            OrderStatus::Fulfilled
        } else if self
            .items
            .iter()
            .any(|l| l.remaining_amount() < l.ordered_amount())
        {
            OrderStatus::PartiallyFulfilled
        } else {
            OrderStatus::Open
        };
    }

    pub(crate) fn record_backorder(
        &mut self,
        missing: Vec<MissingItem>,
        now: DateTime<Utc>,
    ) {
        let backordered: HashSet<&ItemId> = missing.iter().map(|m| &m.item_id).collect();
        self.items.retain(|l| backordered.contains(l.item_id()));
        self.is_backordered = true;
        self.shipment_details = missing;
        self.updated_at = now;
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Entity for Order {
    type Id = OrderId;

    const KIND: &'static str = "order";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
