use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use cargobay_audit::AuditSink;
use cargobay_auth::{Permission, PermissionCheck};
use cargobay_core::{DomainError, OperatorId, OrderId};
use cargobay_shipping::{
    CrossDockEvent, ItemFulfillment, Order, OrderBackordered, Shipment, detect_backorder,
    fulfillment_summary,
};

use super::{BackorderTracker, ServiceContext};
use crate::error::{ServiceError, ServiceResult};
use crate::locks::EntityLocks;
use crate::store::EntityStore;

/// BackorderDetector: flags orders whose shipments fell short.
pub struct BackorderDetector<SS, OS, P, A> {
    shipments: SS,
    orders: OS,
    order_locks: Arc<EntityLocks<OrderId>>,
    ctx: ServiceContext<P, A>,
}

impl<SS, OS, P, A> BackorderDetector<SS, OS, P, A>
where
    SS: EntityStore<Shipment>,
    OS: EntityStore<Order>,
    P: PermissionCheck,
    A: AuditSink,
{
    /// `order_locks` should come from [`super::CrossDockMatcher::order_locks`]
    /// when both services run over the same order store.
    pub fn new(
        shipments: SS,
        orders: OS,
        order_locks: Arc<EntityLocks<OrderId>>,
        ctx: ServiceContext<P, A>,
    ) -> Self {
        Self {
            shipments,
            orders,
            order_locks,
            ctx,
        }
    }

    fn load_order(&self, order_id: OrderId) -> ServiceResult<Order> {
        self.orders
            .get(&order_id)?
            .ok_or_else(|| DomainError::not_found("order", order_id).into())
    }
}

impl<SS, OS, P, A> BackorderTracker for BackorderDetector<SS, OS, P, A>
where
    SS: EntityStore<Shipment>,
    OS: EntityStore<Order>,
    P: PermissionCheck,
    A: AuditSink,
{
    #[instrument(skip(self))]
    fn update_backorder_status(&self, operator: &OperatorId, order_id: OrderId) -> ServiceResult<Order> {
        self.ctx.authorize(operator, &Permission::ORDERS_BACKORDER)?;

        let (order, missing) = self.order_locks.with(&order_id, || {
            let mut order = self.load_order(order_id)?;
            let shipments = self.shipments.list()?;
            let missing = detect_backorder(&mut order, &shipments, Utc::now())?;
            self.orders.put(order.clone())?;
            Ok::<_, ServiceError>((order, missing))
        })?;

        let outstanding: u64 = missing.iter().map(|m| m.amount).sum();
        info!(items = missing.len(), outstanding, "order backordered");
        self.ctx.record(
            operator,
            &CrossDockEvent::OrderBackordered(OrderBackordered {
                order_id,
                missing,
                occurred_at: order.updated_at(),
            }),
        );
        Ok(order)
    }

    fn fulfillment_summary(
        &self,
        operator: &OperatorId,
        order_id: OrderId,
    ) -> ServiceResult<Vec<ItemFulfillment>> {
        self.ctx.authorize(operator, &Permission::CROSSDOCK_READ)?;
        let order = self.load_order(order_id)?;
        Ok(fulfillment_summary(&order, &self.shipments.list()?))
    }
}
