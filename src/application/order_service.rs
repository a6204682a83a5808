use std::sync::Arc;

use bigdecimal::BigDecimal;
use log::info;
use uuid::Uuid;

use crate::application::retry::retry_transient;
use crate::domain::clock::Clock;
use crate::domain::errors::DomainError;
use crate::domain::events::OutboxEvent;
use crate::domain::history::Actor;
use crate::domain::order::{Order, OrderTransition};
use crate::domain::ports::{Store, StoreTx};

pub struct OrderService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn get_order(&self, id: Uuid) -> Result<Order, DomainError> {
        self.store
            .transaction(|tx| tx.find_order(id))?
            .ok_or(DomainError::NotFound { entity: "Order", id })
    }

    /// Moves the order to `transition.to`. The status, any documents or
    /// received quantities that come with it, the history entry and the
    /// outbox event are committed together or not at all.
    pub fn transition(
        &self,
        id: Uuid,
        transition: &OrderTransition,
        actor: &Actor,
    ) -> Result<Order, DomainError> {
        let now = self.clock.now();
        let (order, from) = retry_transient("change order status", || {
            self.store.transaction(|tx| {
                let mut order = locked_order(tx, id)?;
                let change = order.apply(transition, actor, now)?;
                tx.update_order(&order, now)?;
                tx.append_order_history(order.id, &change)?;
                tx.append_outbox(&OutboxEvent::order_status_changed(&order, &change))?;
                Ok((order, change.from))
            })
        })?;

        if let Some(from) = from {
            info!(
                "Order {} moved {} -> {} by {}",
                order.number,
                from,
                order.status,
                actor.as_str()
            );
        }
        Ok(order)
    }

    pub fn update_line(
        &self,
        order_id: Uuid,
        line_id: Uuid,
        quantity: i32,
        unit_price: BigDecimal,
    ) -> Result<Order, DomainError> {
        let now = self.clock.now();
        retry_transient("update order line", || {
            self.store.transaction(|tx| {
                let mut order = locked_order(tx, order_id)?;
                order.update_line(line_id, quantity, unit_price.clone())?;
                tx.update_order(&order, now)?;
                Ok(order)
            })
        })
    }
}

fn locked_order(tx: &mut dyn StoreTx, id: Uuid) -> Result<Order, DomainError> {
    tx.lock_order(id)?
        .ok_or(DomainError::NotFound { entity: "Order", id })
}
