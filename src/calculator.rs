//! Interactive cost calculator over a selection of menu items.

use crate::billing;
use crate::error::Result;
use crate::model::{LineItem, MenuItem};
use crate::record::RecordId;
use rust_decimal::Decimal;

/// One selected item and its quantity (always at least 1).
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub item: MenuItem,
    pub quantity: u32,
}

impl Selection {
    pub fn line_total(&self) -> Result<Decimal> {
        billing::line_total(self.quantity, self.item.price)
    }
}

/// Selection state with a running total.
///
/// Selections keep the order in which items were first picked. The total is
/// recomputed from the selection on every read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CostCalculator {
    selections: Vec<Selection>,
}

impl CostCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select an item at quantity 1, or deselect it if already selected.
    ///
    /// Returns whether the item is selected afterwards.
    pub fn toggle(&mut self, item: &MenuItem) -> bool {
        if let Some(index) = self.position(item.id) {
            self.selections.remove(index);
            false
        } else {
            self.selections.push(Selection {
                item: item.clone(),
                quantity: 1,
            });
            true
        }
    }

    /// Set the quantity of a selected item. Zero or less deselects it.
    ///
    /// Items that are not selected are ignored.
    pub fn set_quantity(&mut self, id: RecordId, quantity: i64) {
        let Some(index) = self.position(id) else {
            return;
        };
        if quantity <= 0 {
            self.selections.remove(index);
        } else {
            self.selections[index].quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    pub fn increment(&mut self, id: RecordId) {
        if let Some(quantity) = self.quantity(id) {
            self.set_quantity(id, i64::from(quantity) + 1);
        }
    }

    /// Decrementing from 1 deselects the item.
    pub fn decrement(&mut self, id: RecordId) {
        if let Some(quantity) = self.quantity(id) {
            self.set_quantity(id, i64::from(quantity) - 1);
        }
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }

    pub fn is_selected(&self, id: RecordId) -> bool {
        self.position(id).is_some()
    }

    pub fn quantity(&self, id: RecordId) -> Option<u32> {
        self.position(id).map(|index| self.selections[index].quantity)
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Σ quantity × price over the selection.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationError` when the total leaves the `Decimal` range.
    pub fn total(&self) -> Result<Decimal> {
        billing::subtotal(
            self.selections
                .iter()
                .map(|selection| (selection.quantity, selection.item.price)),
        )
    }

    /// The selection as invoice line items.
    pub fn to_line_items(&self) -> Result<Vec<LineItem>> {
        self.selections
            .iter()
            .map(|s| LineItem::new(s.item.id, s.item.name.clone(), s.quantity, s.item.price))
            .collect()
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.selections.iter().position(|s| s.item.id == id)
    }
}
