//! Equipment price catalog.
//!
//! Borrowers name an item and the catalog supplies its inventory id and credit cost,
//! so the price of a loan is set by configuration rather than by the borrower.

use crate::{
    config::policy::EquipmentItem,
    core::ledger::BorrowRequest,
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};

/// The lendable equipment, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct EquipmentCatalog {
    items: Vec<EquipmentItem>,
}

impl EquipmentCatalog {
    /// Wraps already-validated catalog entries.
    #[must_use]
    pub const fn new(items: Vec<EquipmentItem>) -> Self {
        Self { items }
    }

    /// Every item in the catalog.
    #[must_use]
    pub fn items(&self) -> &[EquipmentItem] {
        &self.items
    }

    /// Whether nothing can be borrowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks an item up by id or by name, ignoring case.
    #[must_use]
    pub fn find(&self, query: &str) -> Option<&EquipmentItem> {
        let query = query.trim();
        self.items
            .iter()
            .find(|item| item.id.eq_ignore_ascii_case(query))
            .or_else(|| {
                self.items
                    .iter()
                    .find(|item| item.name.eq_ignore_ascii_case(query))
            })
    }

    /// Items whose id or name contains `partial`, ignoring case.
    pub fn matching<'a>(&'a self, partial: &str) -> impl Iterator<Item = &'a EquipmentItem> {
        let partial = partial.trim().to_lowercase();
        self.items.iter().filter(move |item| {
            item.name.to_lowercase().contains(&partial) || item.id.to_lowercase().contains(&partial)
        })
    }

    /// Builds a borrow of the catalog item named by `query`, priced by the catalog.
    ///
    /// Fails with `NotFound` when no item matches.
    pub fn borrow_request(&self, query: &str, due: DateTime<Utc>) -> Result<BorrowRequest> {
        let item = self
            .find(query)
            .ok_or_else(|| Error::not_found("Equipment", query.trim()))?;
        Ok(BorrowRequest {
            equipment_id: item.id.clone(),
            equipment_name: item.name.clone(),
            expected_return_date: due,
            cost: item.cost,
        })
    }
}
