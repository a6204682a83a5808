use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use log::info;
use uuid::Uuid;

use crate::application::numbering_service::next_number;
use crate::application::purchase_list_service::locked_list;
use crate::application::retry::retry_transient;
use crate::domain::clock::Clock;
use crate::domain::errors::DomainError;
use crate::domain::events::OutboxEvent;
use crate::domain::history::Actor;
use crate::domain::numbering::DocumentKind;
use crate::domain::order::{Order, OrderLine};
use crate::domain::ports::{Store, StoreTx};
use crate::domain::purchase_list::PurchaseListStatus;

/// Turns a DRAFT purchase list into one REGISTERED order per supplier.
pub struct PurchaseListConverter<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: Store> PurchaseListConverter<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Creates the orders, empties the list and archives it in a single
    /// transaction. Returns the ids of the created orders in supplier
    /// encounter order.
    ///
    /// The list row is locked first, so of two concurrent conversions of the
    /// same list one creates the orders and the other sees it ARCHIVED.
    pub fn convert(&self, list_id: Uuid, actor: &Actor) -> Result<Vec<Uuid>, DomainError> {
        let now = self.clock.now();
        let orders = retry_transient("convert purchase list", || {
            self.store.transaction(|tx| self.create_orders(tx, list_id, actor, now))
        })?;

        for (id, number) in &orders {
            info!("Created order {} ({}) from purchase list {}", number, id, list_id);
        }
        info!(
            "Converted purchase list {} into {} order(s)",
            list_id,
            orders.len()
        );
        Ok(orders.into_iter().map(|(id, _)| id).collect())
    }

    fn create_orders(
        &self,
        tx: &mut dyn StoreTx,
        list_id: Uuid,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Uuid, String)>, DomainError> {
        let list = locked_list(tx, list_id)?;
        list.ensure_convertible()?;

        let mut orders = Vec::new();
        for (supplier_id, items) in list.items_by_supplier() {
            let number = next_number(tx, DocumentKind::Order, now.year())?;
            let lines = items
                .iter()
                .zip(1..)
                .map(|(item, position)| OrderLine::from_list_item(item, position))
                .collect();
            let order = Order::register(
                number,
                list.station_id,
                supplier_id,
                Some(list.id),
                lines,
                actor,
                now,
            );
            tx.insert_order(&order)?;
            tx.append_outbox(&OutboxEvent::order_created(&order))?;
            orders.push((order.id, order.number));
        }

        tx.delete_purchase_list_items(list.id)?;
        tx.set_purchase_list_status(list.id, PurchaseListStatus::Archived, now)?;
        Ok(orders)
    }
}
