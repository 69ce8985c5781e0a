use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cargobay_core::{DomainError, DomainResult, Entity, ItemId, OrderId, ShipmentId};

/// Shipment lifecycle: `Pending → Transit → Delivered` (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipmentStatus {
    Pending,
    Transit,
    Delivered,
}

impl core::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::Transit => "transit",
            ShipmentStatus::Delivered => "delivered",
        };
        f.write_str(s)
    }
}

/// Cross-dock progress of a single shipment line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossDockStatus {
    /// Not yet received.
    Unmatched,
    /// Received on the dock, waiting to be matched.
    InTransit,
    /// Matched against order demand, but some of the line is still on the dock.
    Matched,
    /// Fully passed on to the order.
    Shipped,
}

/// One item line of a shipment.
///
/// `remaining_amount` starts at `quantity` and only ever decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ShipmentItemLineData")]
pub struct ShipmentItemLine {
    item_id: ItemId,
    quantity: u64,
    remaining_amount: u64,
    cross_dock_status: CrossDockStatus,
}

#[derive(Deserialize)]
struct ShipmentItemLineData {
    item_id: ItemId,
    quantity: u64,
    remaining_amount: Option<u64>,
    cross_dock_status: Option<CrossDockStatus>,
}

impl TryFrom<ShipmentItemLineData> for ShipmentItemLine {
    type Error = DomainError;

    fn try_from(data: ShipmentItemLineData) -> Result<Self, Self::Error> {
        let remaining = data.remaining_amount.unwrap_or(data.quantity);
        if remaining > data.quantity {
            return Err(DomainError::validation(format!(
                "shipment line {}: remaining {} exceeds quantity {}",
                data.item_id, remaining, data.quantity
            )));
        }
        Ok(Self {
            item_id: data.item_id,
            quantity: data.quantity,
            remaining_amount: remaining,
            cross_dock_status: data.cross_dock_status.unwrap_or(CrossDockStatus::Unmatched),
        })
    }
}

impl ShipmentItemLine {
    pub fn new(item_id: ItemId, quantity: u64) -> Self {
        Self {
            item_id,
            quantity,
            remaining_amount: quantity,
            cross_dock_status: CrossDockStatus::Unmatched,
        }
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    /// Quantity shipped on this line (never changes).
    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn remaining_amount(&self) -> u64 {
        self.remaining_amount
    }

    pub fn cross_dock_status(&self) -> CrossDockStatus {
        self.cross_dock_status
    }

    /// Consume `amount` from the remaining quantity.
    pub(crate) fn take(&mut self, amount: u64) -> DomainResult<()> {
        self.remaining_amount = self.remaining_amount.checked_sub(amount).ok_or_else(|| {
            DomainError::invalid_state(format!(
                "shipment line {} has {} remaining, cannot take {}",
                self.item_id, self.remaining_amount, amount
            ))
        })?;
        Ok(())
    }

    pub(crate) fn set_status(&mut self, status: CrossDockStatus) {
        self.cross_dock_status = status;
    }
}

/// Result of receiving a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiveOutcome {
    /// `Pending → Transit`.
    Received,
    /// Already in transit; lines were re-tagged where needed.
    AlreadyInTransit,
}

/// Inbound shipment (external entity consumed and mutated by the core).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    id: ShipmentId,
    #[serde(default)]
    order_ids: BTreeSet<OrderId>,
    status: ShipmentStatus,
    items: Vec<ShipmentItemLine>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Shipment {
    pub fn new(
        id: ShipmentId,
        order_ids: impl IntoIterator<Item = OrderId>,
        items: Vec<ShipmentItemLine>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            order_ids: order_ids.into_iter().collect(),
            status: ShipmentStatus::Pending,
            items,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id_typed(&self) -> ShipmentId {
        self.id
    }

    pub fn order_ids(&self) -> &BTreeSet<OrderId> {
        &self.order_ids
    }

    pub fn is_for_order(&self, order_id: OrderId) -> bool {
        self.order_ids.contains(&order_id)
    }

    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    pub fn items(&self) -> &[ShipmentItemLine] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [ShipmentItemLine] {
        &mut self.items
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Take the shipment onto the dock.
    ///
    /// Delivered shipments cannot be received again; a shipment already in
    /// transit only has its lines re-tagged.
    pub fn receive(&mut self, now: DateTime<Utc>) -> DomainResult<ReceiveOutcome> {
        let outcome = match self.status {
            ShipmentStatus::Delivered => {
                return Err(DomainError::invalid_state(format!(
                    "shipment {} has already been delivered and cannot be received",
                    self.id
                )));
            }
            ShipmentStatus::Transit => ReceiveOutcome::AlreadyInTransit,
            ShipmentStatus::Pending => ReceiveOutcome::Received,
        };

        for line in &mut self.items {
            line.set_status(CrossDockStatus::InTransit);
        }
        self.status = ShipmentStatus::Transit;
        self.updated_at = now;
        Ok(outcome)
    }

    /// Only a shipment in transit may be shipped on.
    pub fn ensure_shippable(&self) -> DomainResult<()> {
        match self.status {
            ShipmentStatus::Transit => Ok(()),
            ShipmentStatus::Pending => Err(DomainError::invalid_state(format!(
                "shipment {} must be in transit before it can be shipped",
                self.id
            ))),
            ShipmentStatus::Delivered => Err(DomainError::invalid_state(format!(
                "shipment {} has already been delivered",
                self.id
            ))),
        }
    }

    pub(crate) fn mark_delivered(&mut self, now: DateTime<Utc>) {
        self.status = ShipmentStatus::Delivered;
        self.updated_at = now;
    }
}

impl Entity for Shipment {
    type Id = ShipmentId;

    const KIND: &'static str = "shipment";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
