use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::errors::DomainError;

const ENTITY: &str = "Purchase list";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseListStatus {
    Draft,
    Archived,
}

impl PurchaseListStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseListStatus::Draft => "DRAFT",
            PurchaseListStatus::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for PurchaseListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseListStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(PurchaseListStatus::Draft),
            "ARCHIVED" => Ok(PurchaseListStatus::Archived),
            other => Err(DomainError::Internal(format!(
                "unknown purchase list status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PurchaseListItemInput {
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub desired_delivery: Option<NaiveDate>,
}

impl PurchaseListItemInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_quantity(self.quantity)?;
        if self.unit_price < BigDecimal::zero() {
            return Err(DomainError::Validation(format!(
                "unit_price must not be negative (got {})",
                self.unit_price
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseListItem {
    pub id: Uuid,
    /// Insertion rank within the list; drives supplier-encounter order.
    pub position: i32,
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub desired_delivery: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct PurchaseList {
    pub id: Uuid,
    pub station_id: Uuid,
    pub status: PurchaseListStatus,
    pub items: Vec<PurchaseListItem>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of adding a product to a list: either a new row or an increase of
/// the quantity already requested from the same supplier.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemChange {
    Added(PurchaseListItem),
    Merged(PurchaseListItem),
}

impl ItemChange {
    pub fn item(&self) -> &PurchaseListItem {
        match self {
            ItemChange::Added(item) | ItemChange::Merged(item) => item,
        }
    }
}

impl PurchaseList {
    pub fn draft(station_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            station_id,
            status: PurchaseListStatus::Draft,
            items: Vec::new(),
            created_at: now,
        }
    }

    pub fn ensure_draft(&self, operation: &'static str) -> Result<(), DomainError> {
        if self.status == PurchaseListStatus::Draft {
            Ok(())
        } else {
            Err(DomainError::InvalidState {
                entity: ENTITY,
                id: self.id,
                status: self.status.to_string(),
                operation,
            })
        }
    }

    pub fn add_item(&mut self, input: PurchaseListItemInput) -> Result<ItemChange, DomainError> {
        self.ensure_draft("add items to")?;
        input.validate()?;

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == input.product_id && i.supplier_id == input.supplier_id)
        {
            existing.quantity = existing
                .quantity
                .checked_add(input.quantity)
                .ok_or_else(|| DomainError::Validation("quantity is too large".to_string()))?;
            existing.unit_price = input.unit_price;
            if input.desired_delivery.is_some() {
                existing.desired_delivery = input.desired_delivery;
            }
            return Ok(ItemChange::Merged(existing.clone()));
        }

        let position = self.items.iter().map(|i| i.position).max().unwrap_or(0) + 1;
        let item = PurchaseListItem {
            id: Uuid::new_v4(),
            position,
            product_id: input.product_id,
            supplier_id: input.supplier_id,
            quantity: input.quantity,
            unit_price: input.unit_price,
            desired_delivery: input.desired_delivery,
        };
        self.items.push(item.clone());
        Ok(ItemChange::Added(item))
    }

    pub fn update_item(
        &mut self,
        item_id: Uuid,
        quantity: i32,
        desired_delivery: Option<NaiveDate>,
    ) -> Result<PurchaseListItem, DomainError> {
        self.ensure_draft("edit items of")?;
        validate_quantity(quantity)?;
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(DomainError::NotFound {
                entity: "Purchase list item",
                id: item_id,
            })?;
        item.quantity = quantity;
        item.desired_delivery = desired_delivery;
        Ok(item.clone())
    }

    pub fn remove_item(&mut self, item_id: Uuid) -> Result<PurchaseListItem, DomainError> {
        self.ensure_draft("remove items from")?;
        let index = self
            .items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or(DomainError::NotFound {
                entity: "Purchase list item",
                id: item_id,
            })?;
        Ok(self.items.remove(index))
    }

    /// A list converts only from DRAFT and only with at least one item. The
    /// state check comes first so an archived (and therefore emptied) list
    /// reports `InvalidState` rather than `EmptyList`.
    pub fn ensure_convertible(&self) -> Result<(), DomainError> {
        self.ensure_draft("convert")?;
        if self.items.is_empty() {
            return Err(DomainError::EmptyList { list_id: self.id });
        }
        Ok(())
    }

    /// Items partitioned by supplier, suppliers in the order they are first
    /// encountered when walking the list by position.
    pub fn items_by_supplier(&self) -> Vec<(Uuid, Vec<&PurchaseListItem>)> {
        let mut ordered: Vec<&PurchaseListItem> = self.items.iter().collect();
        ordered.sort_by_key(|i| i.position);

        let mut groups: Vec<(Uuid, Vec<&PurchaseListItem>)> = Vec::new();
        let mut index: HashMap<Uuid, usize> = HashMap::new();
        for item in ordered {
            match index.get(&item.supplier_id) {
                Some(&slot) => groups[slot].1.push(item),
                None => {
                    index.insert(item.supplier_id, groups.len());
                    groups.push((item.supplier_id, vec![item]));
                }
            }
        }
        groups
    }

    pub fn archive(&mut self) {
        self.status = PurchaseListStatus::Archived;
        self.items.clear();
    }
}

pub(crate) fn validate_quantity(quantity: i32) -> Result<(), DomainError> {
    if quantity <= 0 {
        return Err(DomainError::Validation(format!(
            "quantity must be greater than zero (got {quantity})"
        )));
    }
    Ok(())
}
