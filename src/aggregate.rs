//! Search, facet filtering and canonical ordering of loaded collections.
//!
//! Views are derived, never stored: the full collection is sorted into the
//! kind's canonical order first, then filtered, so survivors keep their
//! relative order and the source collection is left untouched.

use crate::model::{Event, EventStatus, Invoice, InvoiceStatus, MenuCategory, MenuItem};
use crate::record::Record;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

/// Records that take part in free-text search.
pub trait Searchable {
    /// Text fields matched by the search term.
    fn search_fields(&self) -> Vec<Cow<'_, str>>;
}

/// Records that carry one categorical value used for facet filtering.
pub trait Faceted {
    type Facet: Copy + Ord + Debug + Send + Sync + 'static;

    fn facet(&self) -> Self::Facet;
}

impl Searchable for Event {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        let mut fields = vec![
            Cow::Borrowed(self.title.as_str()),
            Cow::Borrowed(self.location.as_str()),
        ];
        if let Some(notes) = &self.notes {
            fields.push(Cow::Borrowed(notes.as_str()));
        }
        fields
    }
}

impl Faceted for Event {
    type Facet = EventStatus;

    fn facet(&self) -> EventStatus {
        self.status
    }
}

impl Searchable for MenuItem {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.name.as_str()),
            Cow::Borrowed(self.description.as_str()),
            Cow::Borrowed(self.category.as_str()),
        ]
    }
}

impl Faceted for MenuItem {
    type Facet = MenuCategory;

    fn facet(&self) -> MenuCategory {
        self.category
    }
}

impl Searchable for Invoice {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.invoice_number.as_str()),
            Cow::Owned(self.event_id.to_string()),
        ]
    }
}

impl Faceted for Invoice {
    type Facet = InvoiceStatus;

    fn facet(&self) -> InvoiceStatus {
        self.status
    }
}

/// Case-insensitive substring match over a record's search fields.
///
/// An empty term matches everything.
pub fn matches_search<T: Searchable>(record: &T, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Search term plus selected facet values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Criteria<F: Ord> {
    pub search: String,
    pub facets: BTreeSet<F>,
}

impl<F: Ord> Default for Criteria<F> {
    fn default() -> Self {
        Criteria {
            search: String::new(),
            facets: BTreeSet::new(),
        }
    }
}

impl<F: Copy + Ord> Criteria<F> {
    /// Criteria that match everything.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn with_facet(mut self, facet: F) -> Self {
        self.facets.insert(facet);
        self
    }

    /// Select the value if absent, deselect it if present.
    ///
    /// Returns whether the value is selected afterwards.
    pub fn toggle_facet(&mut self, facet: F) -> bool {
        if self.facets.remove(&facet) {
            false
        } else {
            self.facets.insert(facet);
            true
        }
    }

    pub fn clear(&mut self) {
        self.search.clear();
        self.facets.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.facets.is_empty()
    }

    /// Search AND facet; an empty facet set matches every value.
    pub fn matches<T>(&self, record: &T) -> bool
    where
        T: Searchable + Faceted<Facet = F>,
    {
        (self.facets.is_empty() || self.facets.contains(&record.facet()))
            && matches_search(record, &self.search)
    }
}

/// Canonically ordered records matching `criteria`.
pub fn derive_view<'a, T>(records: &'a [T], criteria: &Criteria<T::Facet>) -> Vec<&'a T>
where
    T: Record + Searchable + Faceted,
{
    let mut view: Vec<&T> = records.iter().collect();
    view.sort_by(|a, b| T::canonical_order(a, b));
    view.retain(|record| criteria.matches(*record));
    view
}

/// Number of records per facet value. Values with no records are absent.
pub fn count_by_facet<'a, T, I>(records: I) -> BTreeMap<T::Facet, usize>
where
    T: Faceted + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.facet()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn event(id: i64, title: &str, month: u32, status: EventStatus) -> Event {
        let date = Utc
            .with_ymd_and_hms(2024, month, 1, 18, 0, 0)
            .single()
            .expect("valid date");
        let mut event = Event::new(title, date, "Riverside Hall", 50).with_status(status);
        event.id = id;
        event
    }

    fn events() -> Vec<Event> {
        vec![
            event(1, "Spring Wedding", 4, EventStatus::Confirmed),
            event(2, "Board Lunch", 2, EventStatus::Planning),
            event(3, "Summer Gala", 7, EventStatus::Confirmed),
            event(4, "Retirement Party", 5, EventStatus::Cancelled)
                .with_notes("Gluten-free cake"),
        ]
    }

    #[test]
    fn test_empty_criteria_only_reorders() {
        let source = events();
        let view = derive_view(&source, &Criteria::new());

        let ids: Vec<i64> = view.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 4, 1, 2]);
        assert_eq!(source[0].id, 1, "source must not be reordered");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let source = events();
        let view = derive_view(&source, &Criteria::new().with_search("GALA"));
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].title, "Summer Gala");
    }

    #[test]
    fn test_search_covers_notes_and_location() {
        let source = events();
        let by_notes = derive_view(&source, &Criteria::new().with_search("gluten"));
        assert_eq!(by_notes.len(), 1);
        assert_eq!(by_notes[0].id, 4);

        let by_location = derive_view(&source, &Criteria::new().with_search("riverside"));
        assert_eq!(by_location.len(), 4);
    }

    #[test]
    fn test_facets_are_ored_and_anded_with_search() {
        let source = events();
        let criteria = Criteria::new()
            .with_facet(EventStatus::Confirmed)
            .with_facet(EventStatus::Planning);
        let ids: Vec<i64> = derive_view(&source, &criteria).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);

        let narrowed = criteria.with_search("lunch");
        let ids: Vec<i64> = derive_view(&source, &narrowed).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_toggle_twice_restores_criteria() {
        let mut criteria = Criteria::new();
        assert!(criteria.toggle_facet(EventStatus::Cancelled));
        assert!(!criteria.toggle_facet(EventStatus::Cancelled));
        assert_eq!(criteria, Criteria::new());
        assert!(criteria.is_empty());
    }

    #[test]
    fn test_invoice_search_by_event_id_text() {
        let invoice = Invoice {
            id: 1,
            event_id: 42,
            invoice_number: "INV-2024-003".to_string(),
            date_issued: Utc::now(),
            due_date: Utc::now(),
            line_items: vec![],
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            status: InvoiceStatus::Draft,
        };

        assert!(matches_search(&invoice, "42"));
        assert!(matches_search(&invoice, "inv-2024"));
        assert!(!matches_search(&invoice, "43"));
    }

    #[test]
    fn test_menu_items_sorted_by_category_label() {
        let mut cake = MenuItem::new("Cake", MenuCategory::Desserts, Decimal::ONE);
        cake.id = 1;
        let mut tea = MenuItem::new("Tea", MenuCategory::Beverages, Decimal::ONE);
        tea.id = 2;
        let mut wings = MenuItem::new("Wings", MenuCategory::Appetizers, Decimal::ONE);
        wings.id = 3;

        let source = vec![cake, tea, wings];
        let names: Vec<&str> = derive_view(&source, &Criteria::new())
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["Wings", "Tea", "Cake"]);
    }

    #[test]
    fn test_count_by_facet() {
        let source = events();
        let counts = count_by_facet(&source);

        assert_eq!(counts.get(&EventStatus::Confirmed), Some(&2));
        assert_eq!(counts.get(&EventStatus::Planning), Some(&1));
        assert_eq!(counts.get(&EventStatus::Completed), None);
    }
}
