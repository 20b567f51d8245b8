//! Reporting over loaded collections: revenue by month, status counts,
//! popularity ranking, and the dashboard, report and invoice summaries.

use crate::aggregate::count_by_facet;
use crate::billing::add_amounts;
use crate::error::{Error, Result};
use crate::model::{Event, EventStatus, Invoice, InvoiceStatus, MenuCategory, MenuItem};
use crate::record::{sort_canonical, RecordId};
use chrono::{DateTime, Datelike, Months, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Size of the popularity ranking.
pub const POPULAR_ITEMS_LIMIT: usize = 10;

/// Order of the revenue-by-month series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthOrdering {
    /// Calendar order, oldest month first.
    #[default]
    Chronological,
    /// String order of the `"Mon YYYY"` labels ("Apr 2024" before "Jan 2024").
    Lexical,
}

impl FromStr for MonthOrdering {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chronological" => Ok(MonthOrdering::Chronological),
            "lexical" => Ok(MonthOrdering::Lexical),
            other => Err(Error::ConfigError(format!(
                "unknown month ordering '{}'",
                other
            ))),
        }
    }
}

/// Reporting window ending now.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
pub enum ReportRange {
    LastThreeMonths,
    #[default]
    LastSixMonths,
    LastTwelveMonths,
}

impl ReportRange {
    pub fn months(&self) -> u32 {
        match self {
            ReportRange::LastThreeMonths => 3,
            ReportRange::LastSixMonths => 6,
            ReportRange::LastTwelveMonths => 12,
        }
    }

    /// First instant inside the window.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_months(Months::new(self.months()))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl TryFrom<u32> for ReportRange {
    type Error = Error;

    fn try_from(months: u32) -> Result<Self> {
        match months {
            3 => Ok(ReportRange::LastThreeMonths),
            6 => Ok(ReportRange::LastSixMonths),
            12 => Ok(ReportRange::LastTwelveMonths),
            other => Err(Error::ConfigError(format!(
                "report range must be 3, 6 or 12 months, got {}",
                other
            ))),
        }
    }
}

/// `"%b %Y"` label of a timestamp's month, e.g. `"Mar 2024"`.
pub fn month_label(date: DateTime<Utc>) -> String {
    date.format("%b %Y").to_string()
}

/// Sum of invoice totals.
///
/// # Errors
///
/// Returns `Error::ValidationError` when the sum leaves the `Decimal` range.
pub fn total_revenue<'a, I>(invoices: I) -> Result<Decimal>
where
    I: IntoIterator<Item = &'a Invoice>,
{
    invoices
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, invoice| add_amounts(sum, invoice.total))
}

/// Sum of invoice totals per calendar month of issue.
pub fn revenue_by_month<'a, I>(invoices: I, ordering: MonthOrdering) -> Result<Vec<(String, Decimal)>>
where
    I: IntoIterator<Item = &'a Invoice>,
{
    let mut months: BTreeMap<(i32, u32), (String, Decimal)> = BTreeMap::new();
    for invoice in invoices {
        let issued = invoice.date_issued;
        let entry = months
            .entry((issued.year(), issued.month()))
            .or_insert_with(|| (month_label(issued), Decimal::ZERO));
        entry.1 = add_amounts(entry.1, invoice.total)?;
    }

    let mut series: Vec<(String, Decimal)> = months.into_values().collect();
    if ordering == MonthOrdering::Lexical {
        series.sort_by(|a, b| a.0.cmp(&b.0));
    }
    Ok(series)
}

pub fn events_by_status(events: &[Event]) -> BTreeMap<EventStatus, usize> {
    count_by_facet(events)
}

pub fn menu_items_by_category(items: &[MenuItem]) -> BTreeMap<MenuCategory, usize> {
    count_by_facet(items)
}

/// Most referenced menu items across events, by name.
///
/// Dangling menu item ids are skipped. Ties keep first-encountered order.
pub fn popular_items<'a, I>(events: I, menu_items: &[MenuItem], limit: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a Event>,
{
    let by_id: HashMap<RecordId, &MenuItem> =
        menu_items.iter().map(|item| (item.id, item)).collect();

    let mut ranking: Vec<(String, usize)> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();
    for event in events {
        for id in &event.menu_item_ids {
            let Some(item) = by_id.get(id) else {
                continue;
            };
            match position.get(item.name.as_str()) {
                Some(&index) => ranking[index].1 += 1,
                None => {
                    position.insert(item.name.as_str(), ranking.len());
                    ranking.push((item.name.clone(), 1));
                }
            }
        }
    }

    ranking.sort_by(|a, b| b.1.cmp(&a.1));
    ranking.truncate(limit);
    ranking
}

/// Most recent events first, at most `limit`.
pub fn recent_events(events: &[Event], limit: usize) -> Vec<Event> {
    let mut recent = events.to_vec();
    sort_canonical(&mut recent);
    recent.truncate(limit);
    recent
}

/// Headline numbers of the dashboard.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardStats {
    /// Sum of every invoice total, whatever its status.
    pub total_revenue: Decimal,
    pub upcoming_events: usize,
    pub pending_invoices: usize,
    pub completed_events: usize,
}

pub fn dashboard_stats(
    events: &[Event],
    invoices: &[Invoice],
    now: DateTime<Utc>,
) -> Result<DashboardStats> {
    Ok(DashboardStats {
        total_revenue: total_revenue(invoices)?,
        upcoming_events: events.iter().filter(|e| e.is_upcoming(now)).count(),
        pending_invoices: invoices
            .iter()
            .filter(|i| i.status == InvoiceStatus::Pending)
            .count(),
        completed_events: events
            .iter()
            .filter(|e| e.status == EventStatus::Completed)
            .count(),
    })
}

/// Summary cards of an invoice list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvoiceSummary {
    /// Pending plus overdue totals.
    pub outstanding: Decimal,
    pub paid: Decimal,
    pub overdue_count: usize,
    pub draft_count: usize,
}

pub fn invoice_summary<'a, I>(invoices: I) -> Result<InvoiceSummary>
where
    I: IntoIterator<Item = &'a Invoice>,
{
    let mut summary = InvoiceSummary::default();
    for invoice in invoices {
        match invoice.status {
            InvoiceStatus::Pending => {
                summary.outstanding = add_amounts(summary.outstanding, invoice.total)?
            }
            InvoiceStatus::Overdue => {
                summary.outstanding = add_amounts(summary.outstanding, invoice.total)?;
                summary.overdue_count += 1;
            }
            InvoiceStatus::Paid => summary.paid = add_amounts(summary.paid, invoice.total)?,
            InvoiceStatus::Draft => summary.draft_count += 1,
        }
    }
    Ok(summary)
}

/// Everything shown on the reports page for one window.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportSummary {
    pub range: ReportRange,
    pub monthly_revenue: Vec<(String, Decimal)>,
    pub events_by_status: BTreeMap<EventStatus, usize>,
    pub popular_items: Vec<(String, usize)>,
    pub total_revenue: Decimal,
    pub total_events: usize,
    /// Window revenue per window event, rounded to cents; zero without events.
    pub average_event_value: Decimal,
}

/// Build the report for invoices issued and events dated inside `range`.
pub fn build_report(
    events: &[Event],
    invoices: &[Invoice],
    menu_items: &[MenuItem],
    range: ReportRange,
    now: DateTime<Utc>,
    ordering: MonthOrdering,
) -> Result<ReportSummary> {
    let start = range.start(now);
    let events: Vec<Event> = events.iter().filter(|e| e.date >= start).cloned().collect();
    let invoices: Vec<&Invoice> = invoices.iter().filter(|i| i.date_issued >= start).collect();

    let revenue = total_revenue(invoices.iter().copied())?;
    let average_event_value = if events.is_empty() {
        Decimal::ZERO
    } else {
        (revenue / Decimal::from(events.len())).round_dp(2)
    };

    Ok(ReportSummary {
        range,
        monthly_revenue: revenue_by_month(invoices.iter().copied(), ordering)?,
        events_by_status: events_by_status(&events),
        popular_items: popular_items(&events, menu_items, POPULAR_ITEMS_LIMIT),
        total_revenue: revenue,
        total_events: events.len(),
        average_event_value,
    })
}
