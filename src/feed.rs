//! Feed trait for consuming loaded collections, and list-page state.

use crate::aggregate::{derive_view, Criteria, Faceted, Searchable};
use crate::error::{Error, Result};
use crate::record::{sort_canonical, Record, RecordId};

/// Consumer side of a collection load.
///
/// # Example
///
/// ```
/// use catering_kit::feed::RecordFeed;
/// use catering_kit::model::Event;
///
/// struct EventCounter {
///     count: usize,
/// }
///
/// impl RecordFeed<Event> for EventCounter {
///     fn feed(&mut self, records: Vec<Event>) {
///         self.count = records.len();
///     }
/// }
/// ```
pub trait RecordFeed<T: Record>: Send {
    /// Called before the store is asked.
    fn on_loading(&mut self) {}

    /// Receive the loaded collection, in canonical order.
    fn feed(&mut self, records: Vec<T>);

    /// Called instead of `feed` when the load fails.
    fn on_error(&mut self, _error: &Error) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// A one-line message for the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

/// State of one list page: the loaded collection, the user's criteria, and
/// the notices raised while loading or mutating.
///
/// A failed load keeps whatever was loaded before. Loads are not sequenced:
/// whichever completes last wins.
#[derive(Clone, Debug)]
pub struct ListView<T>
where
    T: Record + Searchable + Faceted,
{
    records: Vec<T>,
    criteria: Criteria<T::Facet>,
    loading: bool,
    error: Option<String>,
    notices: Vec<Notice>,
}

impl<T> Default for ListView<T>
where
    T: Record + Searchable + Faceted,
{
    fn default() -> Self {
        ListView {
            records: Vec::new(),
            criteria: Criteria::default(),
            loading: false,
            error: None,
            notices: Vec::new(),
        }
    }
}

impl<T> ListView<T>
where
    T: Record + Searchable + Faceted,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded records in canonical order, unfiltered.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Records matching the current criteria.
    pub fn visible(&self) -> Vec<&T> {
        derive_view(&self.records, &self.criteria)
    }

    pub fn criteria(&self) -> &Criteria<T::Facet> {
        &self.criteria
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.criteria.search = term.into();
    }

    pub fn toggle_facet(&mut self, facet: T::Facet) -> bool {
        self.criteria.toggle_facet(facet)
    }

    pub fn clear_criteria(&mut self) {
        self.criteria.clear();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed load, cleared by the next successful one.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain pending notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Replace a record after the store confirmed an update, or add it after a
    /// confirmed create.
    pub fn apply_update(&mut self, record: T) {
        match self.records.iter().position(|r| r.id() == record.id()) {
            Some(index) => self.records[index] = record,
            None => self.records.push(record),
        }
        sort_canonical(&mut self.records);
    }

    /// Drop a record after the store confirmed its deletion.
    pub fn apply_removal(&mut self, id: RecordId) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id() != id);
        self.records.len() != before
    }

    /// Apply the outcome of a confirmed write and raise a notice for it.
    ///
    /// Nothing changes locally when the store reported an error.
    pub fn record_write(&mut self, outcome: &Result<T>, success: &str, failure: &str) {
        match outcome {
            Ok(record) => {
                self.apply_update(record.clone());
                self.notify(Notice::success(success));
            }
            Err(e) => {
                warn!("{}: {}", failure, e);
                self.notify(Notice::error(failure));
            }
        }
    }

    /// Apply the outcome of a confirmed delete and raise a notice for it.
    pub fn record_removal(&mut self, id: RecordId, outcome: &Result<()>, success: &str, failure: &str) {
        match outcome {
            Ok(()) => {
                self.apply_removal(id);
                self.notify(Notice::success(success));
            }
            Err(e) => {
                warn!("{}: {}", failure, e);
                self.notify(Notice::error(failure));
            }
        }
    }
}

impl<T> RecordFeed<T> for ListView<T>
where
    T: Record + Searchable + Faceted,
{
    fn on_loading(&mut self) {
        self.loading = true;
    }

    fn feed(&mut self, mut records: Vec<T>) {
        sort_canonical(&mut records);
        self.records = records;
        self.loading = false;
        self.error = None;
    }

    fn on_error(&mut self, error: &Error) {
        self.loading = false;
        self.error = Some(error.to_string());
        self.notify(Notice::error(format!(
            "Failed to load {} records",
            T::kind().replace('_', " ")
        )));
    }
}
