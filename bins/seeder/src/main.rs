//! Database seeder for Tally development and testing.
//!
//! Opens a demo account set with the standard chart of accounts and posts a
//! few sample entries in the current month. Running it twice is a no-op.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_core::account::standard_chart;
use tally_core::journal::{EntryLine, JournalEntryView};
use tally_core::store::LedgerStore;
use tally_core::{Ledger, RequestContext};
use tally_db::SeaLedgerStore;
use tally_shared::AppConfig;

/// Name of the seeded account set.
const DEMO_ACCOUNT_SET: &str = "Demo";

/// Sample postings: debit code, credit code, amount in cents, description.
const SAMPLE_ENTRIES: [(&str, &str, i64, &str); 4] = [
    ("1002", "3001", 5_000_000, "Owner capital contribution"),
    ("1002", "5001", 1_250_000, "Consulting revenue"),
    ("5602", "1002", 320_000, "Office rent"),
    ("1001", "1002", 50_000, "Petty cash withdrawal"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug,seeder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    info!("Connecting to database...");
    let db = tally_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;

    let ledger = Ledger::new(
        Arc::new(SeaLedgerStore::new(db)),
        &config.ledger,
        &config.cache,
    );

    if ledger
        .store()
        .account_set_by_name(DEMO_ACCOUNT_SET)
        .await?
        .is_some()
    {
        info!("Demo account set already exists, skipping...");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
        .context("Invalid start of month")?;

    info!("Seeding demo account set...");
    let (set, _) = ledger
        .open_account_set(
            DEMO_ACCOUNT_SET,
            start,
            Some("Sample books for local development".to_string()),
            today,
        )
        .await?;
    let ctx = RequestContext::new(set.id, today);

    info!("Seeding chart of accounts...");
    let report = ledger.import_accounts(ctx, standard_chart()).await?;
    info!(created = report.created.len(), "Chart of accounts imported");

    info!("Seeding sample entries...");
    let accounts = ledger.accounts(ctx).await?;
    let id = |code: &str| {
        accounts
            .iter()
            .find(|a| a.code == code)
            .map(|a| a.id)
            .with_context(|| format!("Account {code} missing from the standard chart"))
    };
    for (debit, credit, cents, description) in SAMPLE_ENTRIES {
        let amount = Decimal::new(cents, 2);
        let view = JournalEntryView::new(set.id, "Rec")
            .dated(today)
            .line(EntryLine::debit(id(debit)?, amount, description))
            .line(EntryLine::credit(id(credit)?, amount, description));
        let posted = ledger.process(ctx, view).await?;
        info!(voucher = ?posted.entry.voucher_num, %description, "Entry posted");
    }

    info!("Seeding complete!");
    Ok(())
}
