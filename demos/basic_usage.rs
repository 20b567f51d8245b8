//! Basic usage example of the catering data layer.

use catering_kit::model::{Event, EventStatus, InvoiceStatus, MenuCategory, MenuItem};
use catering_kit::observability::LatencyPolicy;
use catering_kit::report::invoice_summary;
use catering_kit::store::InMemoryStore;
use catering_kit::{error::Result, CateringService, CostCalculator, ListView, RecordFeed};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;

/// Feed that only prints what arrives.
struct PrintFeed;

impl RecordFeed<MenuItem> for PrintFeed {
    fn on_loading(&mut self) {
        println!("   ... loading menu");
    }

    fn feed(&mut self, records: Vec<MenuItem>) {
        for item in records {
            println!("   - [{}] {} ${} {}", item.category, item.name, item.price, item.unit);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== Catering Kit - Basic Example ===\n");

    // 1. Stores with a little simulated latency
    println!("1. Initializing in-memory stores...");
    let latency = LatencyPolicy::PerKind(|kind| match kind {
        "invoice" => std::time::Duration::from_millis(40),
        _ => std::time::Duration::from_millis(20),
    });
    let service = CateringService::new(
        InMemoryStore::<Event>::new().with_latency(latency.clone()),
        InMemoryStore::new().with_latency(latency.clone()),
        InMemoryStore::<MenuItem>::new().with_latency(latency),
    );
    println!("   ✓ Stores ready\n");

    // 2. Menu
    println!("2. Creating menu items:");
    let bruschetta = service
        .create_menu_item(
            MenuItem::new("Bruschetta", MenuCategory::Appetizers, Decimal::new(850, 2))
                .with_dietary(["vegetarian"]),
        )
        .await?;
    let salmon = service
        .create_menu_item(MenuItem::new("Grilled Salmon", MenuCategory::Entrees, Decimal::new(2800, 2)))
        .await?;
    let tart = service
        .create_menu_item(MenuItem::new("Lemon Tart", MenuCategory::Desserts, Decimal::new(700, 2)))
        .await?;
    service.load_menu_items(&mut PrintFeed).await;
    println!();

    // 3. Events
    println!("3. Creating events:");
    let wedding = service
        .create_event(
            Event::new("Harbour Wedding", Utc::now() + Duration::days(21), "Pier 4", 120)
                .with_status(EventStatus::Confirmed)
                .with_menu(vec![bruschetta.id, salmon.id, tart.id]),
        )
        .await?;
    service
        .create_event(
            Event::new("Quarterly Offsite", Utc::now() - Duration::days(40), "Museum Atrium", 45)
                .with_status(EventStatus::Completed)
                .with_menu(vec![bruschetta.id, tart.id]),
        )
        .await?;
    println!("   ✓ Wedding is event {}\n", wedding.id);

    // 4. Cost calculator
    println!("4. Estimating a custom order:");
    let mut calc = CostCalculator::new();
    calc.toggle(&salmon);
    calc.toggle(&tart);
    calc.set_quantity(salmon.id, 30);
    calc.set_quantity(tart.id, 30);
    println!("   ✓ 30 x salmon + 30 x tart = ${}\n", calc.total()?);

    // 5. Invoice
    println!("5. Generating invoice for the wedding:");
    let invoice = service
        .generate_invoice(wedding.id, &wedding.menu_item_ids, None)
        .await?;
    println!(
        "   ✓ {}: subtotal ${} + tax ${} = ${} (due {})\n",
        invoice.invoice_number,
        invoice.subtotal,
        invoice.tax,
        invoice.total,
        invoice.due_date.format("%Y-%m-%d")
    );

    // 6. List view
    println!("6. Filtering events:");
    let mut events = ListView::<Event>::new();
    service.load_events(&mut events).await;
    events.toggle_facet(EventStatus::Confirmed);
    for event in events.visible() {
        println!("   - {} at {} ({} guests)", event.title, event.location, event.guest_count);
    }
    println!();

    // 7. Dashboard and report
    println!("7. Dashboard:");
    let stats = service.dashboard_stats(Utc::now()).await?;
    println!(
        "   ✓ revenue ${}, {} upcoming, {} pending invoices, {} completed",
        stats.total_revenue, stats.upcoming_events, stats.pending_invoices, stats.completed_events
    );

    service
        .update_invoice_status(invoice.id, InvoiceStatus::Paid)
        .await?;
    let summary = invoice_summary(&service.list_invoices().await?)?;
    println!("   ✓ paid ${}, outstanding ${}", summary.paid, summary.outstanding);

    let report = service.report_default(Utc::now()).await?;
    for (month, revenue) in &report.monthly_revenue {
        println!("   {} ${}", month, revenue);
    }
    for (name, count) in &report.popular_items {
        println!("   {} x{}", name, count);
    }

    println!("\n=== Example Complete ===\n");
    Ok(())
}
