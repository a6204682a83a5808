use log::info;

use crate::application::retry::retry_transient;
use crate::domain::errors::DomainError;
use crate::domain::numbering::{format_document_number, DocumentKind};
use crate::domain::ports::{Store, StoreTx};

/// Draws the next number for `kind`/`year` from the caller's transaction.
///
/// The counter row is incremented inside `tx`, so the number is only
/// consumed if that transaction commits.
pub fn next_number(
    tx: &mut dyn StoreTx,
    kind: DocumentKind,
    year: i32,
) -> Result<String, DomainError> {
    let sequence = tx.next_sequence(kind, year)?;
    Ok(format_document_number(kind, year, sequence))
}

pub struct NumberingService<S> {
    store: S,
}

impl<S: Store> NumberingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reserves a number in its own transaction.
    pub fn next(&self, kind: DocumentKind, year: i32) -> Result<String, DomainError> {
        let number = retry_transient("reserve document number", || {
            self.store.transaction(|tx| next_number(tx, kind, year))
        })?;
        info!("Reserved {} number {}", kind, number);
        Ok(number)
    }
}
