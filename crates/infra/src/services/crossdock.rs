//! CrossDockMatcher: receive inbound shipments and pass them on to orders.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use cargobay_audit::AuditSink;
use cargobay_auth::{Permission, PermissionCheck};
use cargobay_core::page::paginate;
use cargobay_core::{DomainError, OperatorId, OrderId, Pagination, ShipmentId};
use cargobay_shipping::{
    CrossDockEvent, MatchResult, Order, Shipment, ShipmentReceived, ShipmentShipped, linked_order,
    preview_matches, ship_items,
};

use super::{ServiceContext, ShipmentMatcher};
use crate::error::{ServiceError, ServiceResult};
use crate::locks::EntityLocks;
use crate::store::EntityStore;

pub struct CrossDockMatcher<SS, OS, P, A> {
    shipments: SS,
    orders: OS,
    shipment_locks: Arc<EntityLocks<ShipmentId>>,
    order_locks: Arc<EntityLocks<OrderId>>,
    ctx: ServiceContext<P, A>,
}

impl<SS, OS, P, A> CrossDockMatcher<SS, OS, P, A>
where
    SS: EntityStore<Shipment>,
    OS: EntityStore<Order>,
    P: PermissionCheck,
    A: AuditSink,
{
    pub fn new(shipments: SS, orders: OS, ctx: ServiceContext<P, A>) -> Self {
        Self::with_locks(shipments, orders, Arc::new(EntityLocks::new()), ctx)
    }

    /// Share order locks with the backorder detector over the same store.
    pub fn with_locks(
        shipments: SS,
        orders: OS,
        order_locks: Arc<EntityLocks<OrderId>>,
        ctx: ServiceContext<P, A>,
    ) -> Self {
        Self {
            shipments,
            orders,
            shipment_locks: Arc::new(EntityLocks::new()),
            order_locks,
            ctx,
        }
    }

    pub fn order_locks(&self) -> Arc<EntityLocks<OrderId>> {
        self.order_locks.clone()
    }

    fn load_shipment(&self, shipment_id: ShipmentId) -> ServiceResult<Shipment> {
        self.shipments
            .get(&shipment_id)?
            .ok_or_else(|| DomainError::not_found("shipment", shipment_id).into())
    }

    fn load_order(&self, order_id: OrderId) -> ServiceResult<Order> {
        self.orders
            .get(&order_id)?
            .ok_or_else(|| DomainError::not_found("order", order_id).into())
    }
}

impl<SS, OS, P, A> ShipmentMatcher for CrossDockMatcher<SS, OS, P, A>
where
    SS: EntityStore<Shipment>,
    OS: EntityStore<Order>,
    P: PermissionCheck,
    A: AuditSink,
{
    /// `Pending → Transit`; a shipment already in transit has its lines
    /// re-tagged and stays in transit.
    #[instrument(skip(self))]
    fn receive_shipment(&self, operator: &OperatorId, shipment_id: ShipmentId) -> ServiceResult<Shipment> {
        self.ctx.authorize(operator, &Permission::CROSSDOCK_RECEIVE)?;

        let (shipment, outcome) = self.shipment_locks.with(&shipment_id, || {
            let mut shipment = self.load_shipment(shipment_id)?;
            let outcome = shipment.receive(Utc::now())?;
            self.shipments.put(shipment.clone())?;
            Ok::<_, ServiceError>((shipment, outcome))
        })?;

        info!(status = %shipment.status(), ?outcome, "shipment received");
        self.ctx.record(
            operator,
            &CrossDockEvent::ShipmentReceived(ShipmentReceived {
                shipment_id,
                status: shipment.status(),
                outcome,
                occurred_at: shipment.updated_at(),
            }),
        );
        Ok(shipment)
    }

    /// Match the shipment against its linked order, then deliver it.
    ///
    /// The shipment is written before the order. If the order write fails
    /// the shipment is already delivered; re-running is rejected rather than
    /// matching twice.
    #[instrument(skip(self))]
    fn ship_items(&self, operator: &OperatorId, shipment_id: ShipmentId) -> ServiceResult<Vec<MatchResult>> {
        self.ctx.authorize(operator, &Permission::CROSSDOCK_SHIP)?;

        let (order, results) = self.shipment_locks.with(&shipment_id, || {
            let mut shipment = self.load_shipment(shipment_id)?;
            shipment.ensure_shippable()?;

            let order_id = linked_order(shipment_id, &self.orders.list()?)
                .map(Order::id_typed)
                .ok_or_else(|| DomainError::not_found("order for shipment", shipment_id))?;

            self.order_locks.with(&order_id, || {
                let mut order = self.load_order(order_id)?;
                let results = ship_items(&mut shipment, &mut order, Utc::now())?;
                self.shipments.put(shipment.clone())?;
                self.orders.put(order.clone())?;
                Ok::<_, ServiceError>((order, results))
            })
        })?;

        let matched: u64 = results.iter().map(|r| r.matched_amount).sum();
        info!(
            order = %order.id_typed(),
            lines = results.len(),
            matched,
            order_status = ?order.status(),
            "shipment delivered"
        );
        self.ctx.record(
            operator,
            &CrossDockEvent::ShipmentShipped(ShipmentShipped {
                shipment_id,
                order_id: order.id_typed(),
                matches: results.clone(),
                order_status: order.status(),
                occurred_at: order.updated_at(),
            }),
        );
        Ok(results)
    }

    /// Read-only matching preview; stored entities are never touched.
    #[instrument(skip(self))]
    fn match_items(
        &self,
        operator: &OperatorId,
        shipment_id: Option<ShipmentId>,
        page: Option<Pagination>,
    ) -> ServiceResult<Vec<MatchResult>> {
        self.ctx.authorize(operator, &Permission::CROSSDOCK_READ)?;

        if let Some(id) = shipment_id {
            self.load_shipment(id)?;
        }
        let shipments = self.shipments.list()?;
        let orders = self.orders.list()?;

        let results = preview_matches(&shipments, &orders, shipment_id);
        debug!(results = results.len(), "match preview computed");
        Ok(paginate(results, page))
    }
}
