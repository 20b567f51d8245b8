//! # catering-kit
//!
//! Data layer for a catering administration dashboard: events, invoices and
//! menu items behind swappable record stores, plus the derived views and
//! calculations a dashboard needs.
//!
//! ## Features
//!
//! - **Typed records:** every entity kind carries a [`schema::Schema`] and is
//!   validated before it is written
//! - **Store agnostic:** in-memory store for development and tests, hosted
//!   record service behind the `remote` feature, or any custom [`RecordStore`]
//! - **Derived views:** search, facet filtering and canonical ordering over
//!   loaded collections ([`aggregate`])
//! - **Billing:** invoice computation with 10% tax, 15-day terms and yearly
//!   invoice numbering ([`billing`])
//! - **Reports:** revenue by month, status counts and menu popularity
//!   ([`report`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use catering_kit::model::{Event, MenuCategory, MenuItem};
//! use catering_kit::{AppConfig, CateringService};
//! use chrono::{Duration, Utc};
//! use rust_decimal::Decimal;
//!
//! # async fn example() -> catering_kit::Result<()> {
//! let config = AppConfig::load(None)?;
//! let service = CateringService::from_config(&config)?;
//!
//! let soup = service
//!     .create_menu_item(MenuItem::new("Tomato Soup", MenuCategory::Appetizers, Decimal::new(650, 2)))
//!     .await?;
//! let event = service
//!     .create_event(Event::new("Harbour Gala", Utc::now() + Duration::days(30), "Pier 4", 80))
//!     .await?;
//!
//! let invoice = service.generate_invoice(event.id, &[soup.id], None).await?;
//! println!("{} due {}", invoice.invoice_number, invoice.due_date);
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod aggregate;
pub mod billing;
pub mod calculator;
pub mod config;
pub mod error;
pub mod feed;
pub mod key;
pub mod model;
pub mod observability;
pub mod record;
pub mod report;
pub mod schema;
pub mod serialization;
pub mod service;
pub mod store;

// Re-exports for convenience
pub use aggregate::{derive_view, Criteria, Faceted, Searchable};
pub use calculator::CostCalculator;
pub use config::{AppConfig, StoreConfig};
pub use error::{Error, Result};
pub use feed::{ListView, RecordFeed};
pub use record::{Record, RecordId};
pub use service::CateringService;
pub use store::RecordStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
