use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use uuid::Uuid;

use crate::application::retry::retry_transient;
use crate::domain::clock::Clock;
use crate::domain::errors::DomainError;
use crate::domain::ports::{Store, StoreTx};
use crate::domain::purchase_list::{
    ItemChange, PurchaseList, PurchaseListItem, PurchaseListItemInput,
};

pub struct PurchaseListService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: Store> PurchaseListService<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Returns the station's DRAFT list, creating it when there is none.
    pub fn open_draft(&self, station_id: Uuid) -> Result<PurchaseList, DomainError> {
        let now = self.clock.now();
        retry_transient("open purchase list", || {
            self.store
                .transaction(|tx| draft_for_station(tx, station_id, now))
        })
    }

    pub fn get_list(&self, list_id: Uuid) -> Result<PurchaseList, DomainError> {
        self.store
            .transaction(|tx| tx.find_purchase_list(list_id))?
            .ok_or(DomainError::NotFound {
                entity: "Purchase list",
                id: list_id,
            })
    }

    /// Adds a product to the station's DRAFT list, opening one if needed.
    pub fn add_item(
        &self,
        station_id: Uuid,
        input: PurchaseListItemInput,
    ) -> Result<PurchaseListItem, DomainError> {
        input.validate()?;
        let now = self.clock.now();
        let (list_id, change) = retry_transient("add purchase list item", || {
            self.store.transaction(|tx| {
                if !tx.product_exists(input.product_id)? {
                    return Err(DomainError::Validation(format!(
                        "product {} does not exist",
                        input.product_id
                    )));
                }
                if !tx.supplier_exists(input.supplier_id)? {
                    return Err(DomainError::Validation(format!(
                        "supplier {} does not exist",
                        input.supplier_id
                    )));
                }
                let mut list = draft_for_station(tx, station_id, now)?;
                let change = list.add_item(input.clone())?;
                match &change {
                    ItemChange::Added(item) => tx.insert_purchase_list_item(list.id, item)?,
                    ItemChange::Merged(item) => tx.update_purchase_list_item(list.id, item)?,
                }
                Ok((list.id, change))
            })
        })?;

        let item = change.item();
        info!(
            "Purchase list {}: {} product {} x{}",
            list_id,
            if matches!(change, ItemChange::Added(_)) { "added" } else { "merged" },
            item.product_id,
            item.quantity
        );
        Ok(item.clone())
    }

    pub fn update_item(
        &self,
        list_id: Uuid,
        item_id: Uuid,
        quantity: i32,
        desired_delivery: Option<NaiveDate>,
    ) -> Result<PurchaseListItem, DomainError> {
        retry_transient("update purchase list item", || {
            self.store.transaction(|tx| {
                let mut list = locked_list(tx, list_id)?;
                let item = list.update_item(item_id, quantity, desired_delivery)?;
                tx.update_purchase_list_item(list_id, &item)?;
                Ok(item)
            })
        })
    }

    pub fn remove_item(&self, list_id: Uuid, item_id: Uuid) -> Result<(), DomainError> {
        retry_transient("remove purchase list item", || {
            self.store.transaction(|tx| {
                let mut list = locked_list(tx, list_id)?;
                list.remove_item(item_id)?;
                tx.delete_purchase_list_item(list_id, item_id)
            })
        })
    }

    /// Deletes a DRAFT list and its items. Archived lists are kept as the
    /// record of what was converted.
    pub fn discard_draft(&self, list_id: Uuid) -> Result<(), DomainError> {
        retry_transient("discard purchase list", || {
            self.store.transaction(|tx| {
                let list = locked_list(tx, list_id)?;
                list.ensure_draft("discard")?;
                tx.delete_purchase_list_items(list_id)?;
                tx.delete_purchase_list(list_id)
            })
        })?;
        info!("Discarded draft purchase list {}", list_id);
        Ok(())
    }
}

fn draft_for_station(
    tx: &mut dyn StoreTx,
    station_id: Uuid,
    now: DateTime<Utc>,
) -> Result<PurchaseList, DomainError> {
    if !tx.station_exists(station_id)? {
        return Err(DomainError::Validation(format!(
            "station {station_id} does not exist"
        )));
    }
    if let Some(list) = tx.lock_draft_list(station_id)? {
        return Ok(list);
    }
    let list = PurchaseList::draft(station_id, now);
    tx.insert_purchase_list(&list)?;
    info!("Opened purchase list {} for station {}", list.id, station_id);
    Ok(list)
}

pub(crate) fn locked_list(
    tx: &mut dyn StoreTx,
    list_id: Uuid,
) -> Result<PurchaseList, DomainError> {
    tx.lock_purchase_list(list_id)?.ok_or(DomainError::NotFound {
        entity: "Purchase list",
        id: list_id,
    })
}
