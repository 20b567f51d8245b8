//! Invoice computation and the pricing arithmetic shared with the calculator.
//!
//! A draft invoice is derived from an event's guest count and a selection of
//! menu items: one line per item at `quantity = guest_count`, a fixed 10% tax,
//! and a due date 15 days after issue.

use crate::error::{Error, Result};
use crate::model::{Event, Invoice, InvoiceStatus, LineItem, MenuItem};
use crate::record::RecordId;
use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::Decimal;

/// Days between issue date and due date.
pub const PAYMENT_TERM_DAYS: i64 = 15;

pub const INVOICE_PREFIX: &str = "INV";

/// Fixed tax rate applied to every invoice subtotal: 10%.
pub fn tax_rate() -> Decimal {
    Decimal::new(10, 2)
}

/// `quantity × unit_price`.
///
/// # Errors
///
/// Returns `Error::ValidationError` when the product leaves the `Decimal` range.
pub fn line_total(quantity: u32, unit_price: Decimal) -> Result<Decimal> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .ok_or_else(|| out_of_range(format!("line total {} x {}", quantity, unit_price)))
}

/// Sum of `quantity × unit_price` over the given lines.
pub fn subtotal<I>(lines: I) -> Result<Decimal>
where
    I: IntoIterator<Item = (u32, Decimal)>,
{
    lines
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, (quantity, unit_price)| {
            add_amounts(sum, line_total(quantity, unit_price)?)
        })
}

/// Checked addition of two amounts.
pub fn add_amounts(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| out_of_range(format!("sum {} + {}", a, b)))
}

fn out_of_range(what: String) -> Error {
    Error::ValidationError(format!("{} exceeds the supported amount range", what))
}

/// Subtotal, tax and total of an invoice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Totals {
    pub fn from_subtotal(subtotal: Decimal) -> Result<Self> {
        let tax = subtotal
            .checked_mul(tax_rate())
            .ok_or_else(|| out_of_range(format!("tax on {}", subtotal)))?;
        Ok(Totals {
            subtotal,
            tax,
            total: add_amounts(subtotal, tax)?,
        })
    }

    pub fn from_line_items(line_items: &[LineItem]) -> Result<Self> {
        let subtotal = line_items
            .iter()
            .try_fold(Decimal::ZERO, |sum, line| add_amounts(sum, line.line_total))?;
        Totals::from_subtotal(subtotal)
    }
}

/// A computed invoice that has not been numbered or stored yet.
#[derive(Clone, Debug, PartialEq)]
pub struct InvoiceDraft {
    pub event_id: RecordId,
    pub line_items: Vec<LineItem>,
    pub totals: Totals,
    pub date_issued: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub status: InvoiceStatus,
}

impl InvoiceDraft {
    /// Compute a draft for a stored event.
    pub fn for_event(
        event: &Event,
        items: &[MenuItem],
        issued_at: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        compute_invoice(event.id, Some(i64::from(event.guest_count)), items, issued_at)
    }

    /// Attach an invoice number. The store assigns the id on create.
    pub fn into_invoice(self, invoice_number: String) -> Invoice {
        Invoice {
            id: 0,
            event_id: self.event_id,
            invoice_number,
            date_issued: self.date_issued,
            due_date: self.due_date,
            line_items: self.line_items,
            subtotal: self.totals.subtotal,
            tax: self.totals.tax,
            total: self.totals.total,
            status: self.status,
        }
    }
}

/// Derive line items and amounts for an event.
///
/// An empty selection yields a zero-value invoice. The issue date defaults to
/// now; the status is always `pending`.
///
/// # Errors
///
/// Returns `Error::ValidationError` when the guest count is missing, negative,
/// or too large to bill, or when an amount leaves the `Decimal` range.
pub fn compute_invoice(
    event_id: RecordId,
    guest_count: Option<i64>,
    items: &[MenuItem],
    issued_at: Option<DateTime<Utc>>,
) -> Result<InvoiceDraft> {
    let guest_count = guest_count.ok_or_else(|| {
        Error::ValidationError(format!("event {}: guest count is required", event_id))
    })?;
    if guest_count < 0 {
        return Err(Error::ValidationError(format!(
            "event {}: guest count must not be negative, got {}",
            event_id, guest_count
        )));
    }
    let quantity = u32::try_from(guest_count).map_err(|_| {
        Error::ValidationError(format!(
            "event {}: guest count {} is out of range",
            event_id, guest_count
        ))
    })?;

    let line_items = items
        .iter()
        .map(|item| LineItem::new(item.id, item.name.clone(), quantity, item.price))
        .collect::<Result<Vec<LineItem>>>()?;
    let totals = Totals::from_line_items(&line_items)?;
    let date_issued = issued_at.unwrap_or_else(Utc::now);

    if line_items.is_empty() {
        debug!("Invoice for event {} computed with no line items", event_id);
    }

    Ok(InvoiceDraft {
        event_id,
        line_items,
        totals,
        date_issued,
        due_date: date_issued + Duration::days(PAYMENT_TERM_DAYS),
        status: InvoiceStatus::Pending,
    })
}

/// Split `INV-<year>-<sequence>` into its year and sequence.
pub fn parse_invoice_number(number: &str) -> Option<(i32, u32)> {
    let mut parts = number.split('-');
    if parts.next()? != INVOICE_PREFIX {
        return None;
    }
    let year = parts.next()?;
    let sequence = parts.next()?;
    if parts.next().is_some()
        || year.len() != 4
        || sequence.is_empty()
        || !year.bytes().chain(sequence.bytes()).all(|b| b.is_ascii_digit())
    {
        return None;
    }
    Some((year.parse().ok()?, sequence.parse().ok()?))
}

/// Next free number for `year`: one past the highest sequence already used.
///
/// Sequences are zero-padded to three digits and keep growing past 999.
pub fn next_invoice_number(existing: &[Invoice], year: i32) -> String {
    let next = existing
        .iter()
        .filter_map(|invoice| parse_invoice_number(&invoice.invoice_number))
        .filter(|(y, _)| *y == year)
        .map(|(_, sequence)| sequence)
        .max()
        .unwrap_or(0)
        + 1;
    format!("{}-{}-{:03}", INVOICE_PREFIX, year, next)
}

/// Number for a draft issued at `date_issued`.
pub fn invoice_number_for(existing: &[Invoice], date_issued: DateTime<Utc>) -> String {
    next_invoice_number(existing, date_issued.year())
}
