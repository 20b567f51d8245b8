use crate::error::{Error, Result};
use crate::record::{Record, RecordId};
use crate::schema::{Field, FieldType, OrderBy, Schema, SortDirection};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Planning,
    Confirmed,
    Pending,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub const ALL: [EventStatus; 5] = [
        EventStatus::Planning,
        EventStatus::Confirmed,
        EventStatus::Pending,
        EventStatus::Completed,
        EventStatus::Cancelled,
    ];

    pub const NAMES: &'static [&'static str] =
        &["planning", "confirmed", "pending", "completed", "cancelled"];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Planning => "planning",
            EventStatus::Confirmed => "confirmed",
            EventStatus::Pending => "pending",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EventStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::ValidationError(format!("Unknown event status: {}", s)))
    }
}

/// A scheduled catering engagement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub title: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub guest_count: u32,
    pub status: EventStatus,
    pub total_cost: Decimal,
    pub notes: Option<String>,
    /// Non-owning references to menu items; dangling ids are tolerated.
    #[serde(rename = "menu_items")]
    pub menu_item_ids: Vec<RecordId>,
}

impl Event {
    /// New unsaved event in `planning` status with no menu.
    pub fn new(
        title: impl Into<String>,
        date: DateTime<Utc>,
        location: impl Into<String>,
        guest_count: u32,
    ) -> Self {
        Event {
            id: 0,
            title: title.into(),
            date,
            location: location.into(),
            guest_count,
            status: EventStatus::default(),
            total_cost: Decimal::ZERO,
            notes: None,
            menu_item_ids: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_menu(mut self, menu_item_ids: Vec<RecordId>) -> Self {
        self.menu_item_ids = menu_item_ids;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_total_cost(mut self, total_cost: Decimal) -> Self {
        self.total_cost = total_cost;
        self
    }

    /// True when the event is still ahead of `now` and not cancelled.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.date >= now && self.status != EventStatus::Cancelled
    }
}

/// Partial update of an event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "menu_items", skip_serializing_if = "Option::is_none")]
    pub menu_item_ids: Option<Vec<RecordId>>,
}

impl EventPatch {
    pub fn status(status: EventStatus) -> Self {
        EventPatch {
            status: Some(status),
            ..Default::default()
        }
    }
}

pub static EVENT_SCHEMA: Schema = Schema {
    kind: "event",
    fields: &[
        Field::required("title", FieldType::Text),
        Field::required("date", FieldType::Timestamp),
        Field::required("location", FieldType::Text),
        Field::required("guest_count", FieldType::Count),
        Field::required("status", FieldType::Choice(EventStatus::NAMES)),
        Field::required("total_cost", FieldType::Amount),
        Field::optional("notes", FieldType::Text),
        Field::required("menu_items", FieldType::ReferenceList),
    ],
    order_by: OrderBy {
        field: "date",
        direction: SortDirection::Desc,
    },
};

impl Record for Event {
    type Patch = EventPatch;

    fn schema() -> &'static Schema {
        &EVENT_SCHEMA
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn apply_patch(&mut self, patch: &EventPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(location) = &patch.location {
            self.location = location.clone();
        }
        if let Some(guest_count) = patch.guest_count {
            self.guest_count = guest_count;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(total_cost) = patch.total_cost {
            self.total_cost = total_cost;
        }
        if let Some(notes) = &patch.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(ids) = &patch.menu_item_ids {
            self.menu_item_ids = ids.clone();
        }
    }

    /// Newest first.
    fn canonical_order(a: &Self, b: &Self) -> Ordering {
        b.date.cmp(&a.date)
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::ValidationError("event: title is required".into()));
        }
        if self.total_cost.is_sign_negative() {
            return Err(Error::ValidationError(format!(
                "event: total_cost must not be negative, got {}",
                self.total_cost
            )));
        }

        let mut seen = HashSet::with_capacity(self.menu_item_ids.len());
        if let Some(dup) = self.menu_item_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(Error::ValidationError(format!(
                "event: menu item {} referenced twice",
                dup
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0)
            .single()
            .expect("valid date")
    }

    #[test]
    fn test_status_roundtrip_through_str() {
        for status in EventStatus::ALL {
            assert_eq!(status.as_str().parse::<EventStatus>().expect("parse"), status);
        }
        assert!("postponed".parse::<EventStatus>().is_err());
    }

    #[test]
    fn test_new_event_defaults() {
        let event = Event::new("Gala", at(2024, 5, 1), "Pier 9", 120);
        assert_eq!(event.status, EventStatus::Planning);
        assert_eq!(event.total_cost, Decimal::ZERO);
        assert!(event.menu_item_ids.is_empty());
    }

    #[test]
    fn test_canonical_order_newest_first() {
        let older = Event::new("A", at(2024, 1, 1), "X", 1);
        let newer = Event::new("B", at(2024, 6, 1), "Y", 1);
        assert_eq!(Event::canonical_order(&newer, &older), Ordering::Less);
    }

    #[test]
    fn test_duplicate_menu_reference_rejected() {
        let event = Event::new("Brunch", at(2024, 2, 2), "Cafe", 10).with_menu(vec![1, 2, 1]);
        let err = event.validate().expect_err("duplicate id");
        assert!(matches!(err, Error::ValidationError(ref msg) if msg.contains("menu item 1")));
    }

    #[test]
    fn test_blank_title_rejected() {
        let event = Event::new("   ", at(2024, 2, 2), "Cafe", 10);
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_status_patch_only_touches_status() {
        let mut event = Event::new("Wedding", at(2024, 9, 14), "Vineyard", 150).with_notes("tent");
        event.id = 3;

        event.apply_patch(&EventPatch::status(EventStatus::Confirmed));

        assert_eq!(event.id, 3);
        assert_eq!(event.status, EventStatus::Confirmed);
        assert_eq!(event.notes.as_deref(), Some("tent"));
        assert_eq!(event.guest_count, 150);
    }

    #[test]
    fn test_upcoming_excludes_cancelled() {
        let now = at(2024, 3, 1);
        let event = Event::new("Picnic", at(2024, 4, 1), "Park", 30);
        assert!(event.is_upcoming(now));
        assert!(!event
            .clone()
            .with_status(EventStatus::Cancelled)
            .is_upcoming(now));
        assert!(!Event::new("Past", at(2024, 2, 1), "Park", 30).is_upcoming(now));
    }

    #[test]
    fn test_json_matches_schema() {
        let event = Event::new("Gala", at(2024, 5, 1), "Pier 9", 120).with_menu(vec![4, 5]);
        let json = serde_json::to_value(&event).expect("to json");

        assert_eq!(json["menu_items"], serde_json::json!([4, 5]));
        assert_eq!(json["guest_count"], 120);
        EVENT_SCHEMA.check_record(&json).expect("schema accepts own output");
    }
}
