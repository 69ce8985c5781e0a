use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cargobay_audit::AuditEvent;
use cargobay_core::{OrderId, ShipmentId};

use crate::matcher::MatchResult;
use crate::order::{MissingItem, OrderStatus};
use crate::shipment::{ReceiveOutcome, ShipmentStatus};

/// Event: ShipmentReceived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentReceived {
    pub shipment_id: ShipmentId,
    pub status: ShipmentStatus,
    pub outcome: ReceiveOutcome,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ShipmentShipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentShipped {
    pub shipment_id: ShipmentId,
    pub order_id: OrderId,
    pub matches: Vec<MatchResult>,
    pub order_status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderBackordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBackordered {
    pub order_id: OrderId,
    pub missing: Vec<MissingItem>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossDockEvent {
    ShipmentReceived(ShipmentReceived),
    ShipmentShipped(ShipmentShipped),
    OrderBackordered(OrderBackordered),
}

impl AuditEvent for CrossDockEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CrossDockEvent::ShipmentReceived(_) => "crossdock.shipment.received",
            CrossDockEvent::ShipmentShipped(_) => "crossdock.shipment.shipped",
            CrossDockEvent::OrderBackordered(_) => "orders.order.backordered",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CrossDockEvent::ShipmentReceived(e) => e.occurred_at,
            CrossDockEvent::ShipmentShipped(e) => e.occurred_at,
            CrossDockEvent::OrderBackordered(e) => e.occurred_at,
        }
    }
}
