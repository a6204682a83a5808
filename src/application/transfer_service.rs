use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use log::info;
use uuid::Uuid;

use crate::application::numbering_service::next_number;
use crate::application::retry::retry_transient;
use crate::domain::clock::Clock;
use crate::domain::errors::DomainError;
use crate::domain::events::OutboxEvent;
use crate::domain::history::{Actor, StatusChange};
use crate::domain::numbering::DocumentKind;
use crate::domain::ports::{Store, StoreTx};
use crate::domain::transfer::{
    NewTransferRequest, ProductQuantity, TransferRequest, TransferStatus,
};

const ENTITY: &str = "Transfer request";

pub struct TransferService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: Store> TransferService<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Registers a request and assigns it the next TR number.
    pub fn create_transfer(
        &self,
        request: NewTransferRequest,
        actor: &Actor,
    ) -> Result<TransferRequest, DomainError> {
        request.validate()?;
        let now = self.clock.now();
        let transfer = retry_transient("create transfer request", || {
            self.store.transaction(|tx| register(tx, request.clone(), actor, now))
        })?;

        info!(
            "Registered transfer {} from station {} to station {}",
            transfer.number, transfer.source_station_id, transfer.requesting_station_id
        );
        Ok(transfer)
    }

    pub fn get_transfer(&self, id: Uuid) -> Result<TransferRequest, DomainError> {
        self.store
            .transaction(|tx| tx.find_transfer(id))?
            .ok_or(DomainError::NotFound { entity: ENTITY, id })
    }

    /// Confirms the request with the granted quantity per product.
    pub fn approve(
        &self,
        id: Uuid,
        approved: &[ProductQuantity],
        actor: &Actor,
    ) -> Result<TransferRequest, DomainError> {
        self.change_status(id, actor, |transfer, now| {
            transfer.approve(approved, actor, now)
        })
    }

    pub fn reject(
        &self,
        id: Uuid,
        reason: &str,
        actor: &Actor,
    ) -> Result<TransferRequest, DomainError> {
        self.change_status(id, actor, |transfer, now| {
            transfer.reject(reason, actor, now)
        })
    }

    pub fn receive(
        &self,
        id: Uuid,
        received: &[ProductQuantity],
        actor: &Actor,
    ) -> Result<TransferRequest, DomainError> {
        self.change_status(id, actor, |transfer, now| {
            transfer.receive(received, actor, now)
        })
    }

    /// Any edge without a payload (logistics, shipping, closing, accounting,
    /// archiving).
    pub fn transition(
        &self,
        id: Uuid,
        to: TransferStatus,
        actor: &Actor,
    ) -> Result<TransferRequest, DomainError> {
        self.change_status(id, actor, |transfer, now| transfer.transition(to, actor, now))
    }

    fn change_status<F>(
        &self,
        id: Uuid,
        actor: &Actor,
        apply: F,
    ) -> Result<TransferRequest, DomainError>
    where
        F: Fn(
            &mut TransferRequest,
            DateTime<Utc>,
        ) -> Result<StatusChange<TransferStatus>, DomainError>,
    {
        let now = self.clock.now();
        let (transfer, change) = retry_transient("change transfer status", || {
            self.store.transaction(|tx| {
                let mut transfer = tx
                    .lock_transfer(id)?
                    .ok_or(DomainError::NotFound { entity: ENTITY, id })?;
                let change = apply(&mut transfer, now)?;
                tx.update_transfer(&transfer, now)?;
                tx.append_transfer_history(transfer.id, &change)?;
                tx.append_outbox(&OutboxEvent::transfer_status_changed(&transfer, &change))?;
                Ok((transfer, change))
            })
        })?;

        if let Some(from) = change.from {
            info!(
                "Transfer {} moved {} -> {} by {}",
                transfer.number,
                from,
                change.status,
                actor.as_str()
            );
        }
        Ok(transfer)
    }
}

fn register(
    tx: &mut dyn StoreTx,
    request: NewTransferRequest,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<TransferRequest, DomainError> {
    for station in [request.requesting_station_id, request.source_station_id] {
        if !tx.station_exists(station)? {
            return Err(DomainError::Validation(format!(
                "station {station} does not exist"
            )));
        }
    }
    for line in &request.lines {
        if !tx.product_exists(line.product_id)? {
            return Err(DomainError::Validation(format!(
                "product {} does not exist",
                line.product_id
            )));
        }
    }
    let number = next_number(tx, DocumentKind::Transfer, now.year())?;
    let transfer = TransferRequest::register(number, request, actor, now)?;
    tx.insert_transfer(&transfer)?;
    Ok(transfer)
}
