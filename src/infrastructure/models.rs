use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::history::StatusChange;
use crate::domain::order::{Order, OrderLine, OrderStatus};
use crate::domain::purchase_list::{PurchaseList, PurchaseListItem};
use crate::domain::transfer::{TransferLine, TransferRequest, TransferStatus};
use crate::schema::{
    order_lines, order_status_history, orders, procurement_outbox, purchase_list_items,
    purchase_lists, transfer_request_lines, transfer_requests, transfer_status_history,
};

// ── Purchase lists ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = purchase_lists)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PurchaseListRow {
    pub id: Uuid,
    pub station_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseListRow {
    pub fn into_domain(self, items: Vec<PurchaseListItemRow>) -> Result<PurchaseList, DomainError> {
        Ok(PurchaseList {
            id: self.id,
            station_id: self.station_id,
            status: self.status.parse()?,
            items: items.into_iter().map(PurchaseListItem::from).collect(),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = purchase_lists)]
pub struct NewPurchaseListRow {
    pub id: Uuid,
    pub station_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = purchase_list_items)]
#[diesel(belongs_to(PurchaseListRow, foreign_key = list_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PurchaseListItemRow {
    pub id: Uuid,
    pub list_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub desired_delivery: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<PurchaseListItemRow> for PurchaseListItem {
    fn from(row: PurchaseListItemRow) -> Self {
        PurchaseListItem {
            id: row.id,
            position: row.position,
            product_id: row.product_id,
            supplier_id: row.supplier_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            desired_delivery: row.desired_delivery,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = purchase_list_items)]
pub struct NewPurchaseListItemRow {
    pub id: Uuid,
    pub list_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub desired_delivery: Option<NaiveDate>,
}

impl NewPurchaseListItemRow {
    pub fn new(list_id: Uuid, item: &PurchaseListItem) -> Self {
        Self {
            id: item.id,
            list_id,
            position: item.position,
            product_id: item.product_id,
            supplier_id: item.supplier_id,
            quantity: item.quantity,
            unit_price: item.unit_price.clone(),
            desired_delivery: item.desired_delivery,
        }
    }
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub number: String,
    pub station_id: Uuid,
    pub supplier_id: Uuid,
    pub source_list_id: Option<Uuid>,
    pub status: String,
    pub shipping_document: Option<String>,
    pub delivery_document: Option<String>,
    pub total: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    pub fn into_domain(
        self,
        lines: Vec<OrderLineRow>,
        history: Vec<OrderHistoryRow>,
    ) -> Result<Order, DomainError> {
        Ok(Order {
            id: self.id,
            number: self.number,
            station_id: self.station_id,
            supplier_id: self.supplier_id,
            source_list_id: self.source_list_id,
            status: self.status.parse()?,
            shipping_document: self.shipping_document,
            delivery_document: self.delivery_document,
            total: self.total,
            lines: lines.into_iter().map(OrderLine::from).collect(),
            history: history
                .into_iter()
                .map(OrderHistoryRow::into_domain)
                .collect::<Result<_, _>>()?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub number: String,
    pub station_id: Uuid,
    pub supplier_id: Uuid,
    pub source_list_id: Option<Uuid>,
    pub status: String,
    pub total: BigDecimal,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for NewOrderRow {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            number: order.number.clone(),
            station_id: order.station_id,
            supplier_id: order.supplier_id,
            source_list_id: order.source_list_id,
            status: order.status.as_str().to_string(),
            total: order.total.clone(),
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_lines)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub quantity: i32,
    pub received_quantity: i32,
    pub unit_price: BigDecimal,
    pub desired_delivery: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            id: row.id,
            position: row.position,
            product_id: row.product_id,
            quantity: row.quantity,
            received_quantity: row.received_quantity,
            unit_price: row.unit_price,
            desired_delivery: row.desired_delivery,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_lines)]
pub struct NewOrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub quantity: i32,
    pub received_quantity: i32,
    pub unit_price: BigDecimal,
    pub desired_delivery: Option<NaiveDate>,
}

impl NewOrderLineRow {
    pub fn new(order_id: Uuid, line: &OrderLine) -> Self {
        Self {
            id: line.id,
            order_id,
            position: line.position,
            product_id: line.product_id,
            quantity: line.quantity,
            received_quantity: line.received_quantity,
            unit_price: line.unit_price.clone(),
            desired_delivery: line.desired_delivery,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = order_status_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderHistoryRow {
    pub id: i64,
    pub order_id: Uuid,
    pub from_status: Option<String>,
    pub to_status: String,
    pub changed_at: DateTime<Utc>,
    pub actor: String,
}

impl OrderHistoryRow {
    pub fn into_domain(self) -> Result<StatusChange<OrderStatus>, DomainError> {
        Ok(StatusChange {
            from: self.from_status.map(|s| s.parse()).transpose()?,
            status: self.to_status.parse()?,
            changed_at: self.changed_at,
            actor: self.actor,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_status_history)]
pub struct NewOrderHistoryRow {
    pub order_id: Uuid,
    pub from_status: Option<String>,
    pub to_status: String,
    pub changed_at: DateTime<Utc>,
    pub actor: String,
}

impl NewOrderHistoryRow {
    pub fn new(order_id: Uuid, change: &StatusChange<OrderStatus>) -> Self {
        Self {
            order_id,
            from_status: change.from.map(|s| s.as_str().to_string()),
            to_status: change.status.as_str().to_string(),
            changed_at: change.changed_at,
            actor: change.actor.clone(),
        }
    }
}

// ── Transfer requests ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = transfer_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransferRow {
    pub id: Uuid,
    pub number: String,
    pub requesting_station_id: Uuid,
    pub source_station_id: Uuid,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransferRow {
    pub fn into_domain(
        self,
        lines: Vec<TransferLineRow>,
        history: Vec<TransferHistoryRow>,
    ) -> Result<TransferRequest, DomainError> {
        Ok(TransferRequest {
            id: self.id,
            number: self.number,
            requesting_station_id: self.requesting_station_id,
            source_station_id: self.source_station_id,
            status: self.status.parse()?,
            rejection_reason: self.rejection_reason,
            lines: lines.into_iter().map(TransferLine::from).collect(),
            history: history
                .into_iter()
                .map(TransferHistoryRow::into_domain)
                .collect::<Result<_, _>>()?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = transfer_requests)]
pub struct NewTransferRow {
    pub id: Uuid,
    pub number: String,
    pub requesting_station_id: Uuid,
    pub source_station_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&TransferRequest> for NewTransferRow {
    fn from(t: &TransferRequest) -> Self {
        Self {
            id: t.id,
            number: t.number.clone(),
            requesting_station_id: t.requesting_station_id,
            source_station_id: t.source_station_id,
            status: t.status.as_str().to_string(),
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = transfer_request_lines)]
#[diesel(belongs_to(TransferRow, foreign_key = transfer_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransferLineRow {
    pub id: Uuid,
    pub transfer_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub requested_quantity: i32,
    pub granted_quantity: Option<i32>,
    pub received_quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<TransferLineRow> for TransferLine {
    fn from(row: TransferLineRow) -> Self {
        TransferLine {
            id: row.id,
            position: row.position,
            product_id: row.product_id,
            requested_quantity: row.requested_quantity,
            granted_quantity: row.granted_quantity,
            received_quantity: row.received_quantity,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = transfer_request_lines)]
pub struct NewTransferLineRow {
    pub id: Uuid,
    pub transfer_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub requested_quantity: i32,
    pub granted_quantity: Option<i32>,
    pub received_quantity: i32,
}

impl NewTransferLineRow {
    pub fn new(transfer_id: Uuid, line: &TransferLine) -> Self {
        Self {
            id: line.id,
            transfer_id,
            position: line.position,
            product_id: line.product_id,
            requested_quantity: line.requested_quantity,
            granted_quantity: line.granted_quantity,
            received_quantity: line.received_quantity,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = transfer_status_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransferHistoryRow {
    pub id: i64,
    pub transfer_id: Uuid,
    pub from_status: Option<String>,
    pub to_status: String,
    pub changed_at: DateTime<Utc>,
    pub actor: String,
}

impl TransferHistoryRow {
    pub fn into_domain(self) -> Result<StatusChange<TransferStatus>, DomainError> {
        Ok(StatusChange {
            from: self.from_status.map(|s| s.parse()).transpose()?,
            status: self.to_status.parse()?,
            changed_at: self.changed_at,
            actor: self.actor,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = transfer_status_history)]
pub struct NewTransferHistoryRow {
    pub transfer_id: Uuid,
    pub from_status: Option<String>,
    pub to_status: String,
    pub changed_at: DateTime<Utc>,
    pub actor: String,
}

impl NewTransferHistoryRow {
    pub fn new(transfer_id: Uuid, change: &StatusChange<TransferStatus>) -> Self {
        Self {
            transfer_id,
            from_status: change.from.map(|s| s.as_str().to_string()),
            to_status: change.status.as_str().to_string(),
            changed_at: change.changed_at,
            actor: change.actor.clone(),
        }
    }
}

// ── Outbox ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = procurement_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = procurement_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}
