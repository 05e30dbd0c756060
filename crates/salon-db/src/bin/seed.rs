//! # Seed Data Generator
//!
//! Populates a development database with the three package tiers, the
//! default calculator settings and a sample service catalog.
//!
//! ## Usage
//! ```bash
//! cargo run -p salon-db --bin seed
//!
//! # Specify database path
//! cargo run -p salon-db --bin seed -- --db ./data/salon.db
//! ```

use std::env;

use salon_core::types::{CalculatorSettings, PackageConfig, Rate, RateStep, Tier};
use salon_core::Money;
use salon_db::{Database, DbConfig};

/// Sample catalog: (id, name, price in roubles)
const SERVICES: &[(&str, &str, i64)] = &[
    ("laser-legs", "Laser hair removal: legs", 3_000),
    ("laser-arms", "Laser hair removal: arms", 2_200),
    ("laser-face", "Laser hair removal: face", 1_500),
    ("laser-bikini", "Laser hair removal: bikini", 2_500),
    ("laser-underarms", "Laser hair removal: underarms", 1_200),
    ("laser-back", "Laser hair removal: back", 2_800),
    ("rf-lifting", "RF lifting", 4_000),
    ("peeling", "Chemical peeling", 3_500),
];

fn package_configs() -> Vec<(Tier, PackageConfig)> {
    vec![
        (
            Tier::Vip,
            PackageConfig {
                discount_rate: Rate::from_bps(2_500),
                min_cost: Money::from_major(50_000),
                requires_full_payment: true,
                gift_session_count: 2,
                bonus_account_rate: Rate::from_bps(500),
                ..PackageConfig::default()
            },
        ),
        (
            Tier::Standard,
            PackageConfig {
                discount_rate: Rate::from_bps(1_500),
                min_cost: Money::from_major(25_000),
                min_down_payment_rate: Rate::from_bps(3_000),
                gift_session_count: 1,
                ..PackageConfig::default()
            },
        ),
        (
            Tier::Economy,
            PackageConfig {
                discount_rate: Rate::from_bps(500),
                min_cost: Money::from_major(15_000),
                min_down_payment_rate: Rate::from_bps(2_000),
                dynamic_rates: vec![
                    RateStep {
                        threshold: Money::from_major(40_000),
                        rate: Rate::from_bps(700),
                    },
                    RateStep {
                        threshold: Money::from_major(80_000),
                        rate: Rate::from_bps(1_000),
                    },
                ],
                ..PackageConfig::default()
            },
        ),
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./salon_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Salon Calculator Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./salon_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Salon Calculator Seed Data Generator");
    println!("=======================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Package tiers and settings are upserts, safe to re-run
    for (tier, config) in package_configs() {
        db.package_configs().upsert(tier, &config).await?;
        println!("  {} package: {} bps", tier.label(), config.discount_rate.bps());
    }

    db.settings().save(&CalculatorSettings::default()).await?;
    println!("✓ Calculator settings written");

    let mut inserted = 0;
    for (id, name, price) in SERVICES {
        if let Err(e) = db.services().upsert(id, name, Money::from_major(*price)).await {
            eprintln!("Failed to insert {}: {}", id, e);
            continue;
        }
        inserted += 1;
    }
    println!("✓ {} services in catalog", inserted);

    let catalog = db.services().catalog().await?;
    println!("  Active catalog size: {}", catalog.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
