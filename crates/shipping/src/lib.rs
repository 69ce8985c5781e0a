//! Cross-dock domain: shipments, orders, matching and backorders.
//!
//! Pure: callers load entities, hand them to the functions here and persist
//! what comes back.

pub mod backorder;
pub mod event;
pub mod matcher;
pub mod order;
pub mod shipment;

pub use backorder::{
    ItemFulfillment, detect_backorder, fulfillment_summary, missing_items, shipped_amounts,
};
pub use event::{CrossDockEvent, OrderBackordered, ShipmentReceived, ShipmentShipped};
pub use matcher::{MatchResult, MatchStatus, is_fulfilled, linked_order, preview_matches, ship_items};
pub use order::{LineFulfillment, MissingItem, Order, OrderItemLine, OrderStatus};
pub use shipment::{CrossDockStatus, ReceiveOutcome, Shipment, ShipmentItemLine, ShipmentStatus};
