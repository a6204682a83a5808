use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::history::{Actor, StatusChange};
use super::purchase_list::{validate_quantity, PurchaseListItem};

const ENTITY: &str = "Order";

/// Purchase-order lifecycle. Variants are declared in lifecycle order, so the
/// derived `Ord` is the chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Registered,
    Confirmed,
    Shipped,
    Received,
    Closed,
    Invoiced,
    Archived,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Registered,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Received,
        OrderStatus::Closed,
        OrderStatus::Invoiced,
        OrderStatus::Archived,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Registered => "REGISTERED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Received => "RECEIVED",
            OrderStatus::Closed => "CLOSED",
            OrderStatus::Invoiced => "INVOICED",
            OrderStatus::Archived => "ARCHIVED",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == OrderStatus::Archived
    }

    /// Statuses reachable from `self`.
    ///
    /// Each status advances only to its successor. `ARCHIVED` is additionally
    /// reachable from every non-terminal status as an administrative write-off.
    pub fn valid_transitions(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Registered => &[Confirmed, Archived],
            Confirmed => &[Shipped, Archived],
            Shipped => &[Received, Archived],
            Received => &[Closed, Archived],
            Closed => &[Invoiced, Archived],
            Invoiced => &[Archived],
            Archived => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::Internal(format!("unknown order status '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub quantity: i32,
    pub received_quantity: i32,
    pub unit_price: BigDecimal,
    pub desired_delivery: Option<NaiveDate>,
}

impl OrderLine {
    /// Copies quantity, price and delivery wish verbatim from a list item.
    pub fn from_list_item(item: &PurchaseListItem, position: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            product_id: item.product_id,
            quantity: item.quantity,
            received_quantity: 0,
            unit_price: item.unit_price.clone(),
            desired_delivery: item.desired_delivery,
        }
    }

    pub fn amount(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }

    pub fn is_over_delivered(&self) -> bool {
        self.received_quantity > self.quantity
    }
}

/// Quantity received for one order line at reception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineReception {
    pub line_id: Uuid,
    pub quantity: i32,
}

/// A requested status change together with the payload its guards inspect.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTransition {
    pub to: OrderStatus,
    pub shipping_document: Option<String>,
    pub delivery_document: Option<String>,
    pub received: Vec<LineReception>,
}

impl OrderTransition {
    pub fn to(status: OrderStatus) -> Self {
        Self {
            to: status,
            shipping_document: None,
            delivery_document: None,
            received: Vec::new(),
        }
    }

    pub fn with_shipping_document(mut self, reference: impl Into<String>) -> Self {
        self.shipping_document = Some(reference.into());
        self
    }

    pub fn with_delivery_document(mut self, reference: impl Into<String>) -> Self {
        self.delivery_document = Some(reference.into());
        self
    }

    pub fn with_received(mut self, line_id: Uuid, quantity: i32) -> Self {
        self.received.push(LineReception { line_id, quantity });
        self
    }
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub number: String,
    pub station_id: Uuid,
    pub supplier_id: Uuid,
    pub source_list_id: Option<Uuid>,
    pub status: OrderStatus,
    pub shipping_document: Option<String>,
    pub delivery_document: Option<String>,
    /// Cached Σ quantity × unit price; the lines are authoritative.
    pub total: BigDecimal,
    pub lines: Vec<OrderLine>,
    pub history: Vec<StatusChange<OrderStatus>>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn register(
        number: String,
        station_id: Uuid,
        supplier_id: Uuid,
        source_list_id: Option<Uuid>,
        lines: Vec<OrderLine>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Self {
        let mut order = Self {
            id: Uuid::new_v4(),
            number,
            station_id,
            supplier_id,
            source_list_id,
            status: OrderStatus::Registered,
            shipping_document: None,
            delivery_document: None,
            total: BigDecimal::zero(),
            lines,
            history: vec![StatusChange::new(None, OrderStatus::Registered, now, actor)],
            created_at: now,
        };
        order.recompute_total();
        order
    }

    pub fn recompute_total(&mut self) {
        self.total = self
            .lines
            .iter()
            .fold(BigDecimal::zero(), |acc, line| acc + line.amount());
    }

    /// Validates `transition` against the lifecycle and its guards, then
    /// applies it. Nothing is modified unless every check passes.
    pub fn apply(
        &mut self,
        transition: &OrderTransition,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<StatusChange<OrderStatus>, DomainError> {
        let to = transition.to;
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidTransition {
                entity: ENTITY,
                id: self.id,
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }

        let shipping_document = non_blank(&transition.shipping_document)
            .or_else(|| self.shipping_document.clone());
        let delivery_document = non_blank(&transition.delivery_document)
            .or_else(|| self.delivery_document.clone());

        match to {
            OrderStatus::Confirmed => {
                if self.lines.is_empty() || self.lines.iter().any(|l| l.quantity <= 0) {
                    return Err(self.guard(to, "lines"));
                }
            }
            OrderStatus::Shipped if shipping_document.is_none() => {
                return Err(self.guard(to, "shipping_document"));
            }
            OrderStatus::Received if delivery_document.is_none() => {
                return Err(self.guard(to, "delivery_document"));
            }
            _ => {}
        }

        if !transition.received.is_empty() {
            if to != OrderStatus::Received {
                return Err(DomainError::Validation(format!(
                    "received quantities can only be recorded when entering RECEIVED (target is {to})"
                )));
            }
            for reception in &transition.received {
                if reception.quantity < 0 {
                    return Err(DomainError::Validation(format!(
                        "received quantity for line {} must not be negative",
                        reception.line_id
                    )));
                }
                if !self.lines.iter().any(|l| l.id == reception.line_id) {
                    return Err(DomainError::NotFound {
                        entity: "Order line",
                        id: reception.line_id,
                    });
                }
            }
        }

        for reception in &transition.received {
            if let Some(line) = self.lines.iter_mut().find(|l| l.id == reception.line_id) {
                line.received_quantity = reception.quantity;
                if line.is_over_delivered() {
                    warn!(
                        "Order {} line {} over-delivered: received {} of {} ordered",
                        self.number, line.id, line.received_quantity, line.quantity
                    );
                }
            }
        }
        self.shipping_document = shipping_document;
        self.delivery_document = delivery_document;

        let change = StatusChange::new(Some(self.status), to, now, actor);
        self.status = to;
        self.history.push(change.clone());
        Ok(change)
    }

    pub fn update_line(
        &mut self,
        line_id: Uuid,
        quantity: i32,
        unit_price: BigDecimal,
    ) -> Result<&OrderLine, DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidState {
                entity: ENTITY,
                id: self.id,
                status: self.status.to_string(),
                operation: "edit lines of",
            });
        }
        validate_quantity(quantity)?;
        if unit_price < BigDecimal::zero() {
            return Err(DomainError::Validation(format!(
                "unit_price must not be negative (got {unit_price})"
            )));
        }
        let index = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or(DomainError::NotFound {
                entity: "Order line",
                id: line_id,
            })?;
        self.lines[index].quantity = quantity;
        self.lines[index].unit_price = unit_price;
        self.recompute_total();
        Ok(&self.lines[index])
    }

    fn guard(&self, to: OrderStatus, field: &'static str) -> DomainError {
        DomainError::GuardCondition {
            entity: ENTITY,
            id: self.id,
            to: to.to_string(),
            field,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn line(quantity: i32, price: &str) -> OrderLine {
        OrderLine {
            id: Uuid::new_v4(),
            position: 1,
            product_id: Uuid::new_v4(),
            quantity,
            received_quantity: 0,
            unit_price: BigDecimal::from_str(price).expect("valid decimal"),
            desired_delivery: None,
        }
    }

    fn order_with(lines: Vec<OrderLine>) -> Order {
        Order::register(
            "PO-2025-000001".into(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
            lines,
            &Actor::new("buyer"),
            Utc::now(),
        )
    }

    fn actor() -> Actor {
        Actor::new("clerk")
    }

    fn advance_to(order: &mut Order, target: OrderStatus) {
        for status in OrderStatus::ALL {
            if status <= order.status {
                continue;
            }
            if status > target {
                break;
            }
            let t = OrderTransition::to(status)
                .with_shipping_document("BL-1")
                .with_delivery_document("POD-1");
            order.apply(&t, &actor(), Utc::now()).expect("chain step");
        }
    }

    #[test]
    fn status_strings_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(OrderStatus::from_str("PENDING").is_err());
    }

    #[test]
    fn chain_only_moves_to_successor_or_archive() {
        for (i, from) in OrderStatus::ALL.iter().enumerate() {
            for (j, to) in OrderStatus::ALL.iter().enumerate() {
                let expected =
                    (j == i + 1) || (*to == OrderStatus::Archived && !from.is_terminal());
                assert_eq!(from.can_transition_to(*to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn register_computes_total_and_seeds_history() {
        let order = order_with(vec![line(5, "2.00"), line(2, "1.25")]);
        assert_eq!(order.total, BigDecimal::from_str("12.50").unwrap());
        assert_eq!(order.status, OrderStatus::Registered);
        assert_eq!(order.history.len(), 1);
        assert_eq!(order.history[0].from, None);
        assert_eq!(order.history[0].actor, "buyer");
    }

    #[test]
    fn skipping_a_step_is_an_invalid_transition() {
        let mut order = order_with(vec![line(1, "1")]);
        let err = order
            .apply(
                &OrderTransition::to(OrderStatus::Shipped).with_shipping_document("BL"),
                &actor(),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidTransition { ref from, ref to, .. } if from == "REGISTERED" && to == "SHIPPED"
        ));
        assert_eq!(order.status, OrderStatus::Registered);
        assert_eq!(order.history.len(), 1);
    }

    #[test]
    fn confirm_requires_lines() {
        let mut order = order_with(vec![]);
        let err = order
            .apply(&OrderTransition::to(OrderStatus::Confirmed), &actor(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::GuardCondition { field: "lines", .. }));
    }

    #[test]
    fn ship_requires_shipping_document() {
        let mut order = order_with(vec![line(1, "1")]);
        advance_to(&mut order, OrderStatus::Confirmed);

        let blank = OrderTransition::to(OrderStatus::Shipped).with_shipping_document("   ");
        let err = order.apply(&blank, &actor(), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            DomainError::GuardCondition { field: "shipping_document", .. }
        ));
        assert_eq!(order.status, OrderStatus::Confirmed);

        let ok = OrderTransition::to(OrderStatus::Shipped).with_shipping_document("BL-42");
        order.apply(&ok, &actor(), Utc::now()).unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.shipping_document.as_deref(), Some("BL-42"));
    }

    #[test]
    fn receive_without_signed_delivery_document_keeps_order_shipped() {
        let mut order = order_with(vec![line(3, "1")]);
        advance_to(&mut order, OrderStatus::Shipped);
        let line_id = order.lines[0].id;

        let t = OrderTransition::to(OrderStatus::Received).with_received(line_id, 3);
        let err = order.apply(&t, &actor(), Utc::now()).unwrap_err();

        assert!(matches!(
            err,
            DomainError::GuardCondition { field: "delivery_document", .. }
        ));
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.lines[0].received_quantity, 0);
    }

    #[test]
    fn receive_records_quantities_and_flags_over_delivery() {
        let mut order = order_with(vec![line(3, "1"), line(2, "1")]);
        advance_to(&mut order, OrderStatus::Shipped);
        let (a, b) = (order.lines[0].id, order.lines[1].id);

        let t = OrderTransition::to(OrderStatus::Received)
            .with_delivery_document("POD-7")
            .with_received(a, 4);
        order.apply(&t, &actor(), Utc::now()).unwrap();

        let first = order.lines.iter().find(|l| l.id == a).unwrap();
        let second = order.lines.iter().find(|l| l.id == b).unwrap();
        assert_eq!(first.received_quantity, 4);
        assert!(first.is_over_delivered());
        assert_eq!(second.received_quantity, 0);
    }

    #[test]
    fn receive_rejects_negative_or_unknown_lines() {
        let mut order = order_with(vec![line(3, "1")]);
        advance_to(&mut order, OrderStatus::Shipped);
        let id = order.lines[0].id;

        let negative = OrderTransition::to(OrderStatus::Received)
            .with_delivery_document("POD")
            .with_received(id, -1);
        assert!(matches!(
            order.apply(&negative, &actor(), Utc::now()),
            Err(DomainError::Validation(_))
        ));

        let unknown = OrderTransition::to(OrderStatus::Received)
            .with_delivery_document("POD")
            .with_received(Uuid::new_v4(), 1);
        assert!(matches!(
            order.apply(&unknown, &actor(), Utc::now()),
            Err(DomainError::NotFound { .. })
        ));
        assert_eq!(order.status, OrderStatus::Shipped);
    }

    #[test]
    fn received_quantities_outside_reception_are_rejected() {
        let mut order = order_with(vec![line(3, "1")]);
        let id = order.lines[0].id;
        let t = OrderTransition::to(OrderStatus::Confirmed).with_received(id, 1);
        assert!(matches!(
            order.apply(&t, &actor(), Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn archive_is_reachable_from_any_non_terminal_status() {
        for target in OrderStatus::ALL {
            if target.is_terminal() {
                continue;
            }
            let mut order = order_with(vec![line(1, "1")]);
            advance_to(&mut order, target);
            order
                .apply(&OrderTransition::to(OrderStatus::Archived), &actor(), Utc::now())
                .unwrap();
            assert_eq!(order.status, OrderStatus::Archived);
        }
    }

    #[test]
    fn full_chain_history_is_non_decreasing() {
        let mut order = order_with(vec![line(1, "1")]);
        advance_to(&mut order, OrderStatus::Archived);
        assert_eq!(order.history.len(), OrderStatus::ALL.len());
        for entry in &order.history {
            if let Some(from) = entry.from {
                assert!(from < entry.status);
            }
        }
    }

    #[test]
    fn terminal_order_refuses_line_edits() {
        let mut order = order_with(vec![line(1, "1")]);
        let id = order.lines[0].id;
        order
            .apply(&OrderTransition::to(OrderStatus::Archived), &actor(), Utc::now())
            .unwrap();
        assert!(matches!(
            order.update_line(id, 2, BigDecimal::from(1)),
            Err(DomainError::InvalidState { .. })
        ));
        assert!(order
            .apply(&OrderTransition::to(OrderStatus::Registered), &actor(), Utc::now())
            .is_err());
    }

    #[test]
    fn update_line_recomputes_total() {
        let mut order = order_with(vec![line(1, "3.00"), line(1, "1.00")]);
        let id = order.lines[0].id;
        order
            .update_line(id, 4, BigDecimal::from_str("2.50").unwrap())
            .unwrap();
        assert_eq!(order.total, BigDecimal::from_str("11.00").unwrap());
    }
}
