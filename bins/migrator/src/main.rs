//! Database migration runner for Tally.
//!
//! Creates and drops the ledger tables (account sets, accounts, journal
//! entries, transactions, accounting periods and their balances).
//!
//! Usage:
//!   migrator up      - Apply pending migrations
//!   migrator down    - Roll back the last migration
//!   migrator status  - List applied and pending migrations
//!   migrator fresh   - Drop every table and migrate from scratch
//!
//! The database URL is read from `DATABASE_URL`, or from `.env` when present.

use sea_orm_migration::prelude::*;
use tally_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // run_cli installs its own tracing subscriber
    cli::run_cli(Migrator).await;
}
