use serde_json::{json, Value};
use uuid::Uuid;

use super::history::StatusChange;
use super::order::{Order, OrderStatus};
use super::transfer::{TransferRequest, TransferStatus};

pub const ORDER_AGGREGATE: &str = "Order";
pub const TRANSFER_AGGREGATE: &str = "TransferRequest";

/// A row for the transactional outbox. Written in the same transaction as
/// the change it describes; relayed to downstream consumers (the stock
/// ledger among them) by CDC.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxEvent {
    pub aggregate_type: &'static str,
    pub aggregate_id: Uuid,
    pub event_type: &'static str,
    pub payload: Value,
}

impl OutboxEvent {
    pub fn order_created(order: &Order) -> Self {
        let lines: Vec<Value> = order
            .lines
            .iter()
            .map(|l| {
                json!({
                    "line_id": l.id,
                    "product_id": l.product_id,
                    "quantity": l.quantity,
                    "unit_price": l.unit_price.to_string()
                })
            })
            .collect();

        Self {
            aggregate_type: ORDER_AGGREGATE,
            aggregate_id: order.id,
            event_type: "OrderCreated",
            payload: json!({
                "order_id": order.id,
                "number": order.number,
                "station_id": order.station_id,
                "supplier_id": order.supplier_id,
                "source_list_id": order.source_list_id,
                "status": order.status,
                "total": order.total.to_string(),
                "lines": lines
            }),
        }
    }

    pub fn order_status_changed(order: &Order, change: &StatusChange<OrderStatus>) -> Self {
        Self {
            aggregate_type: ORDER_AGGREGATE,
            aggregate_id: order.id,
            event_type: "OrderStatusChanged",
            payload: json!({
                "order_id": order.id,
                "number": order.number,
                "from": change.from,
                "to": change.status,
                "changed_at": change.changed_at,
                "actor": change.actor,
                "shipping_document": order.shipping_document,
                "delivery_document": order.delivery_document
            }),
        }
    }

    pub fn transfer_status_changed(
        transfer: &TransferRequest,
        change: &StatusChange<TransferStatus>,
    ) -> Self {
        let lines: Vec<Value> = transfer
            .lines
            .iter()
            .map(|l| {
                json!({
                    "product_id": l.product_id,
                    "requested_quantity": l.requested_quantity,
                    "granted_quantity": l.granted_quantity,
                    "received_quantity": l.received_quantity
                })
            })
            .collect();

        Self {
            aggregate_type: TRANSFER_AGGREGATE,
            aggregate_id: transfer.id,
            event_type: "TransferStatusChanged",
            payload: json!({
                "transfer_id": transfer.id,
                "number": transfer.number,
                "requesting_station_id": transfer.requesting_station_id,
                "source_station_id": transfer.source_station_id,
                "from": change.from,
                "to": change.status,
                "changed_at": change.changed_at,
                "actor": change.actor,
                "rejection_reason": transfer.rejection_reason,
                "lines": lines
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::history::Actor;
    use crate::domain::transfer::{NewTransferRequest, ProductQuantity};

    #[test]
    fn transfer_event_carries_line_quantities_and_edge() {
        let product = Uuid::new_v4();
        let actor = Actor::new("u-1");
        let mut transfer = TransferRequest::register(
            "TR-2025-000009".into(),
            NewTransferRequest {
                requesting_station_id: Uuid::new_v4(),
                source_station_id: Uuid::new_v4(),
                lines: vec![ProductQuantity::new(product, 4)],
            },
            &actor,
            Utc::now(),
        )
        .unwrap();
        let change = transfer
            .approve(&[ProductQuantity::new(product, 3)], &actor, Utc::now())
            .unwrap();

        let event = OutboxEvent::transfer_status_changed(&transfer, &change);

        assert_eq!(event.aggregate_type, "TransferRequest");
        assert_eq!(event.event_type, "TransferStatusChanged");
        assert_eq!(event.payload["from"], "REGISTERED");
        assert_eq!(event.payload["to"], "CONFIRMED");
        assert_eq!(event.payload["actor"], "u-1");
        assert_eq!(event.payload["lines"][0]["granted_quantity"], 3);
    }
}
