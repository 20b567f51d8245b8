//! Entity kinds held by the record store.

pub mod event;
pub mod invoice;
pub mod menu_item;

pub use event::{Event, EventPatch, EventStatus, EVENT_SCHEMA};
pub use invoice::{Invoice, InvoicePatch, InvoiceStatus, LineItem, INVOICE_SCHEMA};
pub use menu_item::{MenuCategory, MenuItem, MenuItemPatch, MENU_ITEM_SCHEMA};
