use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::history::{Actor, StatusChange};
use super::purchase_list::validate_quantity;

const ENTITY: &str = "Transfer request";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Registered,
    Confirmed,
    LogisticsProcessed,
    Shipped,
    Received,
    Closed,
    AccountingProcessed,
    Rejected,
    Archived,
}

impl TransferStatus {
    pub const ALL: [TransferStatus; 9] = [
        TransferStatus::Registered,
        TransferStatus::Confirmed,
        TransferStatus::LogisticsProcessed,
        TransferStatus::Shipped,
        TransferStatus::Received,
        TransferStatus::Closed,
        TransferStatus::AccountingProcessed,
        TransferStatus::Rejected,
        TransferStatus::Archived,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransferStatus::Registered => "REGISTERED",
            TransferStatus::Confirmed => "CONFIRMED",
            TransferStatus::LogisticsProcessed => "LOGISTICS_PROCESSED",
            TransferStatus::Shipped => "SHIPPED",
            TransferStatus::Received => "RECEIVED",
            TransferStatus::Closed => "CLOSED",
            TransferStatus::AccountingProcessed => "ACCOUNTING_PROCESSED",
            TransferStatus::Rejected => "REJECTED",
            TransferStatus::Archived => "ARCHIVED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TransferStatus::Rejected | TransferStatus::Archived)
    }

    /// Adjacency map of the transfer lifecycle.
    ///
    /// - `REGISTERED`           -> `CONFIRMED`, `REJECTED`, `ARCHIVED`
    /// - `CONFIRMED`            -> `LOGISTICS_PROCESSED`, `ARCHIVED`
    /// - `LOGISTICS_PROCESSED`  -> `SHIPPED`, `ARCHIVED`
    /// - `SHIPPED`              -> `RECEIVED`, `ARCHIVED`
    /// - `RECEIVED`             -> `CLOSED`, `ARCHIVED`
    /// - `CLOSED`               -> `ACCOUNTING_PROCESSED`, `ARCHIVED`
    /// - `ACCOUNTING_PROCESSED` -> `ARCHIVED`
    /// - `REJECTED`, `ARCHIVED` -> nothing
    pub fn valid_transitions(self) -> &'static [TransferStatus] {
        use TransferStatus::*;
        match self {
            Registered => &[Confirmed, Rejected, Archived],
            Confirmed => &[LogisticsProcessed, Archived],
            LogisticsProcessed => &[Shipped, Archived],
            Shipped => &[Received, Archived],
            Received => &[Closed, Archived],
            Closed => &[AccountingProcessed, Archived],
            AccountingProcessed => &[Archived],
            Rejected | Archived => &[],
        }
    }

    pub fn can_transition_to(self, next: TransferStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransferStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::Internal(format!("unknown transfer status '{s}'")))
    }
}

/// A quantity keyed by product: requested lines, approvals and receptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuantity {
    pub product_id: Uuid,
    pub quantity: i32,
}

impl ProductQuantity {
    pub fn new(product_id: Uuid, quantity: i32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferLine {
    pub id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub requested_quantity: i32,
    /// `None` until the source station decides on this product.
    pub granted_quantity: Option<i32>,
    pub received_quantity: i32,
}

#[derive(Debug, Clone)]
pub struct NewTransferRequest {
    pub requesting_station_id: Uuid,
    pub source_station_id: Uuid,
    pub lines: Vec<ProductQuantity>,
}

impl NewTransferRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.requesting_station_id == self.source_station_id {
            return Err(DomainError::Validation(
                "requesting and source station must differ".to_string(),
            ));
        }
        if self.lines.is_empty() {
            return Err(DomainError::Validation(
                "a transfer request needs at least one line".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for line in &self.lines {
            validate_quantity(line.quantity)?;
            if !seen.insert(line.product_id) {
                return Err(DomainError::Validation(format!(
                    "product {} appears more than once",
                    line.product_id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub id: Uuid,
    pub number: String,
    pub requesting_station_id: Uuid,
    pub source_station_id: Uuid,
    pub status: TransferStatus,
    pub rejection_reason: Option<String>,
    pub lines: Vec<TransferLine>,
    pub history: Vec<StatusChange<TransferStatus>>,
    pub created_at: DateTime<Utc>,
}

impl TransferRequest {
    pub fn register(
        number: String,
        request: NewTransferRequest,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        request.validate()?;
        let lines = request
            .lines
            .iter()
            .zip(1..)
            .map(|(line, position)| TransferLine {
                id: Uuid::new_v4(),
                position,
                product_id: line.product_id,
                requested_quantity: line.quantity,
                granted_quantity: None,
                received_quantity: 0,
            })
            .collect();
        Ok(Self {
            id: Uuid::new_v4(),
            number,
            requesting_station_id: request.requesting_station_id,
            source_station_id: request.source_station_id,
            status: TransferStatus::Registered,
            rejection_reason: None,
            lines,
            history: vec![StatusChange::new(
                None,
                TransferStatus::Registered,
                now,
                actor,
            )],
            created_at: now,
        })
    }

    /// Records the source station's decision per product and confirms the
    /// request. Lines without an entry keep an unset granted quantity; an
    /// explicit zero declines that product.
    pub fn approve(
        &mut self,
        approved: &[ProductQuantity],
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<StatusChange<TransferStatus>, DomainError> {
        self.ensure_edge(TransferStatus::Confirmed)?;
        self.check_line_quantities(approved, "granted")?;
        for entry in approved {
            if let Some(line) = self.line_for(entry.product_id) {
                if entry.quantity > line.requested_quantity {
                    return Err(DomainError::Validation(format!(
                        "granted quantity {} for product {} exceeds the requested {}",
                        entry.quantity, entry.product_id, line.requested_quantity
                    )));
                }
            }
        }

        for entry in approved {
            if let Some(line) = self
                .lines
                .iter_mut()
                .find(|l| l.product_id == entry.product_id)
            {
                line.granted_quantity = Some(entry.quantity);
            }
        }
        Ok(self.record(TransferStatus::Confirmed, actor, now))
    }

    pub fn reject(
        &mut self,
        reason: &str,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<StatusChange<TransferStatus>, DomainError> {
        self.ensure_edge(TransferStatus::Rejected)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(self.guard(TransferStatus::Rejected, "rejection_reason"));
        }
        self.rejection_reason = Some(reason.to_string());
        Ok(self.record(TransferStatus::Rejected, actor, now))
    }

    /// Books what actually arrived. Products not mentioned were not received.
    pub fn receive(
        &mut self,
        received: &[ProductQuantity],
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<StatusChange<TransferStatus>, DomainError> {
        self.ensure_edge(TransferStatus::Received)?;
        self.check_line_quantities(received, "received")?;
        for entry in received {
            if let Some(line) = self
                .lines
                .iter_mut()
                .find(|l| l.product_id == entry.product_id)
            {
                line.received_quantity = entry.quantity;
            }
        }
        Ok(self.record(TransferStatus::Received, actor, now))
    }

    /// Moves along an edge that carries no payload. Edges that need one are
    /// refused with the name of the missing field so the caller can switch to
    /// the dedicated operation.
    pub fn transition(
        &mut self,
        to: TransferStatus,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<StatusChange<TransferStatus>, DomainError> {
        self.ensure_edge(to)?;
        match to {
            TransferStatus::Confirmed => Err(self.guard(to, "approved_lines")),
            TransferStatus::Rejected => Err(self.guard(to, "rejection_reason")),
            TransferStatus::Received => Err(self.guard(to, "received_lines")),
            _ => Ok(self.record(to, actor, now)),
        }
    }

    fn ensure_edge(&self, to: TransferStatus) -> Result<(), DomainError> {
        if self.status.can_transition_to(to) {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                entity: ENTITY,
                id: self.id,
                from: self.status.to_string(),
                to: to.to_string(),
            })
        }
    }

    fn check_line_quantities(
        &self,
        entries: &[ProductQuantity],
        what: &str,
    ) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for entry in entries {
            if entry.quantity < 0 {
                return Err(DomainError::Validation(format!(
                    "{what} quantity for product {} must not be negative",
                    entry.product_id
                )));
            }
            if self.line_for(entry.product_id).is_none() {
                return Err(DomainError::Validation(format!(
                    "product {} is not part of transfer {}",
                    entry.product_id, self.number
                )));
            }
            if !seen.insert(entry.product_id) {
                return Err(DomainError::Validation(format!(
                    "product {} appears more than once",
                    entry.product_id
                )));
            }
        }
        Ok(())
    }

    fn line_for(&self, product_id: Uuid) -> Option<&TransferLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    fn record(
        &mut self,
        to: TransferStatus,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> StatusChange<TransferStatus> {
        let change = StatusChange::new(Some(self.status), to, now, actor);
        self.status = to;
        self.history.push(change.clone());
        change
    }

    fn guard(&self, to: TransferStatus, field: &'static str) -> DomainError {
        DomainError::GuardCondition {
            entity: ENTITY,
            id: self.id,
            to: to.to_string(),
            field,
        }
    }
}
