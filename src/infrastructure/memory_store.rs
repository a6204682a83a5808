use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::events::OutboxEvent;
use crate::domain::history::StatusChange;
use crate::domain::numbering::DocumentKind;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::{Store, StoreTx};
use crate::domain::purchase_list::{PurchaseList, PurchaseListItem, PurchaseListStatus};
use crate::domain::transfer::{TransferRequest, TransferStatus};

#[derive(Debug, Clone, Default)]
struct State {
    stations: HashSet<Uuid>,
    suppliers: HashSet<Uuid>,
    products: HashSet<Uuid>,
    sequences: HashMap<(DocumentKind, i32), i64>,
    purchase_lists: HashMap<Uuid, PurchaseList>,
    orders: HashMap<Uuid, Order>,
    transfers: HashMap<Uuid, TransferRequest>,
    outbox: Vec<OutboxEvent>,
}

/// Process-local `Store`.
///
/// Transactions are serialised on one mutex and run against a copy of the
/// state that replaces the shared one only when the closure succeeds.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_station(&self, id: Uuid) {
        self.with_state(|s| s.stations.insert(id));
    }

    pub fn add_supplier(&self, id: Uuid) {
        self.with_state(|s| s.suppliers.insert(id));
    }

    pub fn add_product(&self, id: Uuid) {
        self.with_state(|s| s.products.insert(id));
    }

    /// Committed outbox rows, oldest first.
    pub fn outbox(&self) -> Vec<OutboxEvent> {
        self.with_state(|s| s.outbox.clone())
    }

    pub fn order_count(&self) -> usize {
        self.with_state(|s| s.orders.len())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.lock())
    }

    // The shared state is only replaced after a closure returns, so a panic
    // inside a transaction cannot leave it half-written.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Store for InMemoryStore {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, DomainError>,
    {
        let mut guard = self.lock();
        let mut tx = MemoryTx {
            state: guard.clone(),
        };
        let out = f(&mut tx)?;
        *guard = tx.state;
        Ok(out)
    }
}

struct MemoryTx {
    state: State,
}

impl MemoryTx {
    fn list_mut(&mut self, id: Uuid) -> Result<&mut PurchaseList, DomainError> {
        self.state
            .purchase_lists
            .get_mut(&id)
            .ok_or(DomainError::NotFound {
                entity: "Purchase list",
                id,
            })
    }

    fn order_mut(&mut self, id: Uuid) -> Result<&mut Order, DomainError> {
        self.state
            .orders
            .get_mut(&id)
            .ok_or(DomainError::NotFound { entity: "Order", id })
    }

    fn transfer_mut(&mut self, id: Uuid) -> Result<&mut TransferRequest, DomainError> {
        self.state
            .transfers
            .get_mut(&id)
            .ok_or(DomainError::NotFound {
                entity: "Transfer request",
                id,
            })
    }
}

impl StoreTx for MemoryTx {
    fn station_exists(&mut self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.state.stations.contains(&id))
    }

    fn supplier_exists(&mut self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.state.suppliers.contains(&id))
    }

    fn product_exists(&mut self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.state.products.contains(&id))
    }

    fn next_sequence(&mut self, kind: DocumentKind, year: i32) -> Result<i64, DomainError> {
        let counter = self.state.sequences.entry((kind, year)).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    fn find_purchase_list(&mut self, id: Uuid) -> Result<Option<PurchaseList>, DomainError> {
        Ok(self.state.purchase_lists.get(&id).cloned())
    }

    fn lock_purchase_list(&mut self, id: Uuid) -> Result<Option<PurchaseList>, DomainError> {
        self.find_purchase_list(id)
    }

    fn lock_draft_list(&mut self, station_id: Uuid) -> Result<Option<PurchaseList>, DomainError> {
        Ok(self
            .state
            .purchase_lists
            .values()
            .find(|l| l.station_id == station_id && l.status == PurchaseListStatus::Draft)
            .cloned())
    }

    fn insert_purchase_list(&mut self, list: &PurchaseList) -> Result<(), DomainError> {
        if list.status == PurchaseListStatus::Draft
            && self.lock_draft_list(list.station_id)?.is_some()
        {
            return Err(DomainError::Transient(format!(
                "station {} already has a draft purchase list",
                list.station_id
            )));
        }
        self.state.purchase_lists.insert(list.id, list.clone());
        Ok(())
    }

    fn set_purchase_list_status(
        &mut self,
        id: Uuid,
        status: PurchaseListStatus,
        _now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.list_mut(id)?.status = status;
        Ok(())
    }

    fn delete_purchase_list(&mut self, id: Uuid) -> Result<(), DomainError> {
        self.state.purchase_lists.remove(&id);
        Ok(())
    }

    fn insert_purchase_list_item(
        &mut self,
        list_id: Uuid,
        item: &PurchaseListItem,
    ) -> Result<(), DomainError> {
        self.list_mut(list_id)?.items.push(item.clone());
        Ok(())
    }

    fn update_purchase_list_item(
        &mut self,
        list_id: Uuid,
        item: &PurchaseListItem,
    ) -> Result<(), DomainError> {
        let list = self.list_mut(list_id)?;
        if let Some(existing) = list.items.iter_mut().find(|i| i.id == item.id) {
            *existing = item.clone();
        }
        Ok(())
    }

    fn delete_purchase_list_item(
        &mut self,
        list_id: Uuid,
        item_id: Uuid,
    ) -> Result<(), DomainError> {
        self.list_mut(list_id)?.items.retain(|i| i.id != item_id);
        Ok(())
    }

    fn delete_purchase_list_items(&mut self, list_id: Uuid) -> Result<(), DomainError> {
        self.list_mut(list_id)?.items.clear();
        Ok(())
    }

    fn insert_order(&mut self, order: &Order) -> Result<(), DomainError> {
        if self.state.orders.values().any(|o| o.number == order.number) {
            return Err(DomainError::Transient(format!(
                "order number {} already taken",
                order.number
            )));
        }
        self.state.orders.insert(order.id, order.clone());
        Ok(())
    }

    fn find_order(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.state.orders.get(&id).cloned())
    }

    fn lock_order(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        self.find_order(id)
    }

    fn update_order(&mut self, order: &Order, _now: DateTime<Utc>) -> Result<(), DomainError> {
        let stored = self.order_mut(order.id)?;
        let history = std::mem::take(&mut stored.history);
        *stored = order.clone();
        stored.history = history;
        Ok(())
    }

    fn append_order_history(
        &mut self,
        order_id: Uuid,
        change: &StatusChange<OrderStatus>,
    ) -> Result<(), DomainError> {
        self.order_mut(order_id)?.history.push(change.clone());
        Ok(())
    }

    fn insert_transfer(&mut self, transfer: &TransferRequest) -> Result<(), DomainError> {
        if self
            .state
            .transfers
            .values()
            .any(|t| t.number == transfer.number)
        {
            return Err(DomainError::Transient(format!(
                "transfer number {} already taken",
                transfer.number
            )));
        }
        self.state.transfers.insert(transfer.id, transfer.clone());
        Ok(())
    }

    fn find_transfer(&mut self, id: Uuid) -> Result<Option<TransferRequest>, DomainError> {
        Ok(self.state.transfers.get(&id).cloned())
    }

    fn lock_transfer(&mut self, id: Uuid) -> Result<Option<TransferRequest>, DomainError> {
        self.find_transfer(id)
    }

    fn update_transfer(
        &mut self,
        transfer: &TransferRequest,
        _now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let stored = self.transfer_mut(transfer.id)?;
        let history = std::mem::take(&mut stored.history);
        *stored = transfer.clone();
        stored.history = history;
        Ok(())
    }

    fn append_transfer_history(
        &mut self,
        transfer_id: Uuid,
        change: &StatusChange<TransferStatus>,
    ) -> Result<(), DomainError> {
        self.transfer_mut(transfer_id)?.history.push(change.clone());
        Ok(())
    }

    fn append_outbox(&mut self, event: &OutboxEvent) -> Result<(), DomainError> {
        self.state.outbox.push(event.clone());
        Ok(())
    }
}

/// Fails the next `n` transactions with `Transient`, then delegates.
#[cfg(test)]
#[derive(Clone)]
pub(crate) struct FlakyStore {
    inner: InMemoryStore,
    failures: Arc<std::sync::atomic::AtomicU32>,
}

#[cfg(test)]
impl FlakyStore {
    pub(crate) fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            failures: Arc::default(),
        }
    }

    pub(crate) fn fail_next(&self, n: u32) {
        self.failures.store(n, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Store for FlakyStore {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, DomainError>,
    {
        use std::sync::atomic::Ordering::SeqCst;
        if self
            .failures
            .fetch_update(SeqCst, SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(DomainError::Transient("could not serialize access".to_string()));
        }
        self.inner.transaction(f)
    }
}
