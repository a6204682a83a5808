use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::events::OutboxEvent;
use super::history::StatusChange;
use super::numbering::DocumentKind;
use super::order::{Order, OrderStatus};
use super::purchase_list::{PurchaseList, PurchaseListItem, PurchaseListStatus};
use super::transfer::{TransferRequest, TransferStatus};

/// Unit-of-work boundary over the entity store.
///
/// `transaction` runs `f` inside one store transaction: everything `f` writes
/// through the `StoreTx` is committed together when it returns `Ok`, and
/// nothing is kept when it returns `Err`. Aggregates read with a `lock_*`
/// method stay locked against concurrent writers until the transaction ends.
pub trait Store: Clone + Send + Sync + 'static {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, DomainError>;
}

pub trait StoreTx {
    fn station_exists(&mut self, id: Uuid) -> Result<bool, DomainError>;
    fn supplier_exists(&mut self, id: Uuid) -> Result<bool, DomainError>;
    fn product_exists(&mut self, id: Uuid) -> Result<bool, DomainError>;

    /// Increments and returns the counter for `kind`/`year`, starting at 1.
    fn next_sequence(&mut self, kind: DocumentKind, year: i32) -> Result<i64, DomainError>;

    // ── Purchase lists ────────────────────────────────────────────────────────

    fn find_purchase_list(&mut self, id: Uuid) -> Result<Option<PurchaseList>, DomainError>;
    fn lock_purchase_list(&mut self, id: Uuid) -> Result<Option<PurchaseList>, DomainError>;
    /// The station's DRAFT list, locked.
    fn lock_draft_list(&mut self, station_id: Uuid) -> Result<Option<PurchaseList>, DomainError>;
    fn insert_purchase_list(&mut self, list: &PurchaseList) -> Result<(), DomainError>;
    fn set_purchase_list_status(
        &mut self,
        id: Uuid,
        status: PurchaseListStatus,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError>;
    fn delete_purchase_list(&mut self, id: Uuid) -> Result<(), DomainError>;
    fn insert_purchase_list_item(
        &mut self,
        list_id: Uuid,
        item: &PurchaseListItem,
    ) -> Result<(), DomainError>;
    fn update_purchase_list_item(
        &mut self,
        list_id: Uuid,
        item: &PurchaseListItem,
    ) -> Result<(), DomainError>;
    fn delete_purchase_list_item(&mut self, list_id: Uuid, item_id: Uuid)
        -> Result<(), DomainError>;
    fn delete_purchase_list_items(&mut self, list_id: Uuid) -> Result<(), DomainError>;

    // ── Orders ────────────────────────────────────────────────────────────────

    /// Inserts the order with its lines and initial history.
    fn insert_order(&mut self, order: &Order) -> Result<(), DomainError>;
    fn find_order(&mut self, id: Uuid) -> Result<Option<Order>, DomainError>;
    fn lock_order(&mut self, id: Uuid) -> Result<Option<Order>, DomainError>;
    /// Persists header fields and lines. History is only written through
    /// `append_order_history`. `now` stamps the row's modification time.
    fn update_order(&mut self, order: &Order, now: DateTime<Utc>) -> Result<(), DomainError>;
    fn append_order_history(
        &mut self,
        order_id: Uuid,
        change: &StatusChange<OrderStatus>,
    ) -> Result<(), DomainError>;

    // ── Transfer requests ─────────────────────────────────────────────────────

    fn insert_transfer(&mut self, transfer: &TransferRequest) -> Result<(), DomainError>;
    fn find_transfer(&mut self, id: Uuid) -> Result<Option<TransferRequest>, DomainError>;
    fn lock_transfer(&mut self, id: Uuid) -> Result<Option<TransferRequest>, DomainError>;
    fn update_transfer(
        &mut self,
        transfer: &TransferRequest,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError>;
    fn append_transfer_history(
        &mut self,
        transfer_id: Uuid,
        change: &StatusChange<TransferStatus>,
    ) -> Result<(), DomainError>;

    fn append_outbox(&mut self, event: &OutboxEvent) -> Result<(), DomainError>;
}
