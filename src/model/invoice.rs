use crate::billing::{self, Totals};
use crate::error::{Error, Result};
use crate::record::{Record, RecordId};
use crate::schema::{Field, FieldType, OrderBy, Schema, SortDirection};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Pending,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Pending,
        InvoiceStatus::Paid,
        InvoiceStatus::Overdue,
    ];

    pub const NAMES: &'static [&'static str] = &["draft", "pending", "paid", "overdue"];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    /// Pending and overdue invoices still await payment.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, InvoiceStatus::Pending | InvoiceStatus::Overdue)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::ValidationError(format!("Unknown invoice status: {}", s)))
    }
}

/// One billed menu item. Owned by its invoice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub menu_item_id: RecordId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl LineItem {
    pub fn new(
        menu_item_id: RecordId,
        name: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
    ) -> Result<Self> {
        Ok(LineItem {
            menu_item_id,
            name: name.into(),
            quantity,
            unit_price,
            line_total: billing::line_total(quantity, unit_price)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(rename = "Id")]
    pub id: RecordId,
    /// Reference only; the event may since have been deleted.
    pub event_id: RecordId,
    pub invoice_number: String,
    pub date_issued: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub line_items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub status: InvoiceStatus,
}

impl Invoice {
    pub fn totals(&self) -> Totals {
        Totals {
            subtotal: self.subtotal,
            tax: self.tax,
            total: self.total,
        }
    }

    fn set_totals(&mut self, totals: Totals) {
        self.subtotal = totals.subtotal;
        self.tax = totals.tax;
        self.total = totals.total;
    }
}

/// Partial update of an invoice.
///
/// Amounts are not patchable: replacing `line_items` recomputes subtotal,
/// tax and total.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_issued: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_items: Option<Vec<LineItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
}

impl InvoicePatch {
    pub fn status(status: InvoiceStatus) -> Self {
        InvoicePatch {
            status: Some(status),
            ..Default::default()
        }
    }
}

const LINE_ITEM_FIELDS: &[Field] = &[
    Field::required("menu_item_id", FieldType::Reference),
    Field::required("name", FieldType::Text),
    Field::required("quantity", FieldType::Count),
    Field::required("unit_price", FieldType::Amount),
    Field::required("line_total", FieldType::Amount),
];

pub static INVOICE_SCHEMA: Schema = Schema {
    kind: "invoice",
    fields: &[
        Field::required("event_id", FieldType::Reference),
        Field::required("invoice_number", FieldType::Text),
        Field::required("date_issued", FieldType::Timestamp),
        Field::required("due_date", FieldType::Timestamp),
        Field::required("line_items", FieldType::ObjectList(LINE_ITEM_FIELDS)),
        Field::required("subtotal", FieldType::Amount),
        Field::required("tax", FieldType::Amount),
        Field::required("total", FieldType::Amount),
        Field::required("status", FieldType::Choice(InvoiceStatus::NAMES)),
    ],
    order_by: OrderBy {
        field: "date_issued",
        direction: SortDirection::Desc,
    },
};

impl Record for Invoice {
    type Patch = InvoicePatch;

    fn schema() -> &'static Schema {
        &INVOICE_SCHEMA
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn apply_patch(&mut self, patch: &InvoicePatch) {
        if let Some(event_id) = patch.event_id {
            self.event_id = event_id;
        }
        if let Some(number) = &patch.invoice_number {
            self.invoice_number = number.clone();
        }
        if let Some(date_issued) = patch.date_issued {
            self.date_issued = date_issued;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(line_items) = &patch.line_items {
            self.line_items = line_items.clone();
            // Out-of-range amounts keep the old totals and fail validation.
            if let Ok(totals) = Totals::from_line_items(&self.line_items) {
                self.set_totals(totals);
            }
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }

    /// Most recently issued first.
    fn canonical_order(a: &Self, b: &Self) -> Ordering {
        b.date_issued.cmp(&a.date_issued)
    }

    fn validate(&self) -> Result<()> {
        if billing::parse_invoice_number(&self.invoice_number).is_none() {
            return Err(Error::ValidationError(format!(
                "invoice: malformed invoice number '{}'",
                self.invoice_number
            )));
        }
        if self.due_date < self.date_issued {
            return Err(Error::ValidationError(
                "invoice: due date precedes issue date".into(),
            ));
        }
        for line in &self.line_items {
            if line.unit_price.is_sign_negative() {
                return Err(Error::ValidationError(format!(
                    "invoice: negative unit price for '{}'",
                    line.name
                )));
            }
            if line.line_total != billing::line_total(line.quantity, line.unit_price)? {
                return Err(Error::ValidationError(format!(
                    "invoice: line total for '{}' does not equal quantity x unit price",
                    line.name
                )));
            }
        }
        if self.totals() != Totals::from_line_items(&self.line_items)? {
            return Err(Error::ValidationError(format!(
                "invoice: amounts {}/{}/{} do not match line items",
                self.subtotal, self.tax, self.total
            )));
        }
        Ok(())
    }
}
