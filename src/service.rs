//! High-level service wiring the three record stores together.
//!
//! Provides CRUD passthroughs with logging and metrics, plus the operations
//! that span entity kinds: invoice generation, dashboard statistics and
//! reports.

use crate::billing::{invoice_number_for, InvoiceDraft};
use crate::config::{AppConfig, ReportConfig};
use crate::error::Result;
use crate::feed::RecordFeed;
use crate::key::RecordKeyBuilder;
use crate::model::{
    Event, EventPatch, EventStatus, Invoice, InvoicePatch, InvoiceStatus, MenuItem, MenuItemPatch,
};
use crate::observability::{LogMetrics, StoreMetrics};
use crate::record::{Record, RecordId};
use crate::report::{self, DashboardStats, ReportRange, ReportSummary};
use crate::store::{AnyStore, RecordStore, StoreSet};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

struct Inner<E, I, M> {
    events: E,
    invoices: I,
    menu_items: M,
    metrics: Box<dyn StoreMetrics>,
    reports: ReportConfig,
}

/// Catering data service for dashboards and list pages.
///
/// Wraps its stores in `Arc`, so cloning is cheap and clones share state.
/// Every store failure is logged and returned unchanged; nothing is retried.
///
/// # Example
///
/// ```no_run
/// use catering_kit::model::{Event, Invoice, MenuItem};
/// use catering_kit::store::InMemoryStore;
/// use catering_kit::CateringService;
///
/// # async fn example() -> catering_kit::Result<()> {
/// let service = CateringService::new(
///     InMemoryStore::<Event>::new(),
///     InMemoryStore::<Invoice>::new(),
///     InMemoryStore::<MenuItem>::new(),
/// );
///
/// let stats = service.dashboard_stats(chrono::Utc::now()).await?;
/// println!("{} upcoming events", stats.upcoming_events);
/// # Ok(())
/// # }
/// ```
pub struct CateringService<E, I, M> {
    inner: Arc<Inner<E, I, M>>,
}

impl<E, I, M> Clone for CateringService<E, I, M> {
    fn clone(&self) -> Self {
        CateringService {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl CateringService<AnyStore<Event>, AnyStore<Invoice>, AnyStore<MenuItem>> {
    /// Build stores and options from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let stores = StoreSet::from_config(&config.store)?;
        Ok(CateringService::with_options(
            stores.events,
            stores.invoices,
            stores.menu_items,
            Box::new(LogMetrics),
            config.reports.clone(),
        ))
    }
}

impl<E, I, M> CateringService<E, I, M>
where
    E: RecordStore<Event>,
    I: RecordStore<Invoice>,
    M: RecordStore<MenuItem>,
{
    /// Create a service with log-based metrics, chronological months and a
    /// six-month default report window.
    pub fn new(events: E, invoices: I, menu_items: M) -> Self {
        Self::with_options(
            events,
            invoices,
            menu_items,
            Box::new(LogMetrics),
            ReportConfig::default(),
        )
    }

    /// Create a service with custom metrics.
    pub fn with_metrics(events: E, invoices: I, menu_items: M, metrics: Box<dyn StoreMetrics>) -> Self {
        Self::with_options(events, invoices, menu_items, metrics, ReportConfig::default())
    }

    pub fn with_options(
        events: E,
        invoices: I,
        menu_items: M,
        metrics: Box<dyn StoreMetrics>,
        reports: ReportConfig,
    ) -> Self {
        CateringService {
            inner: Arc::new(Inner {
                events,
                invoices,
                menu_items,
                metrics,
                reports,
            }),
        }
    }

    pub fn events(&self) -> &E {
        &self.inner.events
    }

    pub fn invoices(&self) -> &I {
        &self.inner.invoices
    }

    pub fn menu_items(&self) -> &M {
        &self.inner.menu_items
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub async fn list_events(&self) -> Result<Vec<Event>> {
        self.fetch_all(self.events()).await
    }

    pub async fn get_event(&self, id: RecordId) -> Result<Event> {
        self.fetch_by_id(self.events(), id).await
    }

    pub async fn create_event(&self, event: Event) -> Result<Event> {
        self.create(self.events(), event).await
    }

    pub async fn update_event(&self, id: RecordId, patch: &EventPatch) -> Result<Event> {
        self.update(self.events(), id, patch).await
    }

    pub async fn update_event_status(&self, id: RecordId, status: EventStatus) -> Result<Event> {
        self.update(self.events(), id, &EventPatch::status(status)).await
    }

    pub async fn delete_event(&self, id: RecordId) -> Result<()> {
        self.delete(self.events(), id).await
    }

    /// Delete each event independently; one failure does not stop the rest.
    pub async fn delete_events(&self, ids: &[RecordId]) -> Vec<(RecordId, Result<()>)> {
        self.delete_each(self.events(), ids).await
    }

    pub async fn load_events<F: RecordFeed<Event>>(&self, feed: &mut F) {
        self.load(self.events(), feed).await
    }

    // ------------------------------------------------------------------
    // Invoices
    // ------------------------------------------------------------------

    pub async fn list_invoices(&self) -> Result<Vec<Invoice>> {
        self.fetch_all(self.invoices()).await
    }

    pub async fn get_invoice(&self, id: RecordId) -> Result<Invoice> {
        self.fetch_by_id(self.invoices(), id).await
    }

    pub async fn create_invoice(&self, invoice: Invoice) -> Result<Invoice> {
        self.create(self.invoices(), invoice).await
    }

    pub async fn update_invoice(&self, id: RecordId, patch: &InvoicePatch) -> Result<Invoice> {
        self.update(self.invoices(), id, patch).await
    }

    pub async fn update_invoice_status(&self, id: RecordId, status: InvoiceStatus) -> Result<Invoice> {
        self.update(self.invoices(), id, &InvoicePatch::status(status))
            .await
    }

    pub async fn delete_invoice(&self, id: RecordId) -> Result<()> {
        self.delete(self.invoices(), id).await
    }

    pub async fn delete_invoices(&self, ids: &[RecordId]) -> Vec<(RecordId, Result<()>)> {
        self.delete_each(self.invoices(), ids).await
    }

    pub async fn load_invoices<F: RecordFeed<Invoice>>(&self, feed: &mut F) {
        self.load(self.invoices(), feed).await
    }

    /// Compute, number and store an invoice for an event.
    ///
    /// Menu items are billed in the given order. Unlike aggregation, an
    /// unknown menu item id fails the whole operation with `NotFound`.
    pub async fn generate_invoice(
        &self,
        event_id: RecordId,
        menu_item_ids: &[RecordId],
        issued_at: Option<DateTime<Utc>>,
    ) -> Result<Invoice> {
        let event = self.get_event(event_id).await?;
        let items = futures::future::try_join_all(
            menu_item_ids.iter().map(|id| self.get_menu_item(*id)),
        )
        .await?;

        let draft = InvoiceDraft::for_event(&event, &items, issued_at)?;
        let existing = self.list_invoices().await?;
        let number = invoice_number_for(&existing, draft.date_issued);

        info!(
            "Generating {} for event {} ({} line items, total {})",
            number,
            event_id,
            draft.line_items.len(),
            draft.totals.total
        );
        self.create_invoice(draft.into_invoice(number)).await
    }

    // ------------------------------------------------------------------
    // Menu items
    // ------------------------------------------------------------------

    pub async fn list_menu_items(&self) -> Result<Vec<MenuItem>> {
        self.fetch_all(self.menu_items()).await
    }

    pub async fn get_menu_item(&self, id: RecordId) -> Result<MenuItem> {
        self.fetch_by_id(self.menu_items(), id).await
    }

    pub async fn create_menu_item(&self, item: MenuItem) -> Result<MenuItem> {
        self.create(self.menu_items(), item).await
    }

    pub async fn update_menu_item(&self, id: RecordId, patch: &MenuItemPatch) -> Result<MenuItem> {
        self.update(self.menu_items(), id, patch).await
    }

    pub async fn delete_menu_item(&self, id: RecordId) -> Result<()> {
        self.delete(self.menu_items(), id).await
    }

    pub async fn load_menu_items<F: RecordFeed<MenuItem>>(&self, feed: &mut F) {
        self.load(self.menu_items(), feed).await
    }

    // ------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------

    /// Headline numbers; events and invoices are fetched concurrently.
    pub async fn dashboard_stats(&self, now: DateTime<Utc>) -> Result<DashboardStats> {
        let (events, invoices) = futures::try_join!(self.list_events(), self.list_invoices())?;
        report::dashboard_stats(&events, &invoices, now)
    }

    /// Report for a window ending at `now`; all three kinds fetched concurrently.
    pub async fn report(&self, range: ReportRange, now: DateTime<Utc>) -> Result<ReportSummary> {
        let (events, invoices, menu_items) = futures::try_join!(
            self.list_events(),
            self.list_invoices(),
            self.list_menu_items()
        )?;
        report::build_report(
            &events,
            &invoices,
            &menu_items,
            range,
            now,
            self.inner.reports.month_ordering,
        )
    }

    /// Report over the configured default window.
    pub async fn report_default(&self, now: DateTime<Utc>) -> Result<ReportSummary> {
        self.report(self.inner.reports.default_range, now).await
    }

    /// True only when all three stores answer.
    pub async fn health_check(&self) -> Result<bool> {
        let (events, invoices, menu_items) = futures::try_join!(
            self.events().health_check(),
            self.invoices().health_check(),
            self.menu_items().health_check()
        )?;
        if !(events && invoices && menu_items) {
            warn!(
                "Store health: event={} invoice={} menu_item={}",
                events, invoices, menu_items
            );
        }
        Ok(events && invoices && menu_items)
    }

    // ------------------------------------------------------------------
    // Store plumbing
    // ------------------------------------------------------------------

    async fn fetch_all<T, S>(&self, store: &S) -> Result<Vec<T>>
    where
        T: Record,
        S: RecordStore<T>,
    {
        let start = Instant::now();
        match store.fetch_all().await {
            Ok(records) => {
                self.inner
                    .metrics
                    .record_fetch(T::kind(), records.len(), start.elapsed());
                Ok(records)
            }
            Err(e) => {
                error!("Error fetching {} records: {}", T::kind(), e);
                self.inner.metrics.record_error(T::kind(), &e.to_string());
                Err(e)
            }
        }
    }

    async fn fetch_by_id<T, S>(&self, store: &S, id: RecordId) -> Result<T>
    where
        T: Record,
        S: RecordStore<T>,
    {
        let key = RecordKeyBuilder::build::<T>(id);
        let start = Instant::now();
        match store.fetch_by_id(id).await {
            Ok(record) => {
                self.inner.metrics.record_read(&key, start.elapsed());
                Ok(record)
            }
            Err(e) => {
                error!("Error fetching {}: {}", key, e);
                self.inner.metrics.record_error(&key, &e.to_string());
                Err(e)
            }
        }
    }

    async fn create<T, S>(&self, store: &S, record: T) -> Result<T>
    where
        T: Record,
        S: RecordStore<T>,
    {
        let start = Instant::now();
        match store.create(record).await {
            Ok(created) => {
                let key = RecordKeyBuilder::build::<T>(created.id());
                self.inner.metrics.record_write(&key, start.elapsed());
                Ok(created)
            }
            Err(e) => {
                error!("Error creating {}: {}", T::kind(), e);
                self.inner.metrics.record_error(T::kind(), &e.to_string());
                Err(e)
            }
        }
    }

    async fn update<T, S>(&self, store: &S, id: RecordId, patch: &T::Patch) -> Result<T>
    where
        T: Record,
        S: RecordStore<T>,
    {
        let key = RecordKeyBuilder::build::<T>(id);
        let start = Instant::now();
        match store.update(id, patch).await {
            Ok(updated) => {
                self.inner.metrics.record_write(&key, start.elapsed());
                Ok(updated)
            }
            Err(e) => {
                error!("Error updating {}: {}", key, e);
                self.inner.metrics.record_error(&key, &e.to_string());
                Err(e)
            }
        }
    }

    async fn delete<T, S>(&self, store: &S, id: RecordId) -> Result<()>
    where
        T: Record,
        S: RecordStore<T>,
    {
        let key = RecordKeyBuilder::build::<T>(id);
        let start = Instant::now();
        match store.delete(id).await {
            Ok(()) => {
                self.inner.metrics.record_delete(&key, start.elapsed());
                Ok(())
            }
            Err(e) => {
                error!("Error deleting {}: {}", key, e);
                self.inner.metrics.record_error(&key, &e.to_string());
                Err(e)
            }
        }
    }

    async fn delete_each<T, S>(&self, store: &S, ids: &[RecordId]) -> Vec<(RecordId, Result<()>)>
    where
        T: Record,
        S: RecordStore<T>,
    {
        let mut outcomes = Vec::with_capacity(ids.len());
        for &id in ids {
            outcomes.push((id, self.delete::<T, S>(store, id).await));
        }
        outcomes
    }

    async fn load<T, S, F>(&self, store: &S, feed: &mut F)
    where
        T: Record,
        S: RecordStore<T>,
        F: RecordFeed<T>,
    {
        feed.on_loading();
        match self.fetch_all(store).await {
            Ok(records) => feed.feed(records),
            Err(e) => feed.on_error(&e),
        }
    }
}
