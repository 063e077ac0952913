//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `server_geo` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use futures::future::join_all;
use std::process;

use server_geo::initialization::{init_logger_with, init_store};
use server_geo::{GeoCacheConfig, GeoCoordinator, GeoRecord, Opt, OutputFormat};

fn format_plain(address: &str, record: Option<&GeoRecord>) -> String {
    match record {
        Some(record) => {
            let mut line = format!(
                "{}\t{}\t{}",
                address,
                record.country_code,
                record.display_location()
            );
            if !record.region.is_empty() {
                line.push_str(&format!(" ({})", record.region));
            }
            if !record.timezone.id.is_empty() {
                line.push_str(&format!("\t{}", record.timezone.id));
                if let Some(clock) = record.local_clock() {
                    line.push_str(&format!(" {} {}", clock, record.timezone.abbreviation));
                }
            }
            line
        }
        None => format!("{}\t-\tno geo data available", address),
    }
}

fn format_json(address: &str, record: Option<&GeoRecord>) -> Result<String> {
    let value = serde_json::json!({
        "address": address,
        "geo": record,
    });
    serde_json::to_string(&value).context("Failed to serialize geo record")
}

async fn run(opt: Opt) -> Result<usize> {
    let config = GeoCacheConfig::from(&opt);
    let store = init_store(&opt)
        .await
        .context("Failed to open geo cache store")?;
    let geo = GeoCoordinator::with_http_resolver(&config, store)
        .context("Failed to initialize geo lookup client")?;
    let restored = geo.hydrate().await;
    log::info!("Restored {} cached address(es)", restored);

    let mut watches: Vec<_> = opt.addresses.iter().map(|a| geo.watch(a)).collect();
    let results = join_all(watches.iter_mut().map(|w| w.resolved())).await;

    let mut unresolved = 0;
    for (address, record) in opt.addresses.iter().zip(results) {
        if record.is_none() {
            unresolved += 1;
        }
        let line = match opt.output {
            OutputFormat::Plain => format_plain(address, record.as_deref()),
            OutputFormat::Json => format_json(address, record.as_deref())?,
        };
        println!("{}", line);
    }

    geo.flush().await;
    geo.stats().log_summary();
    Ok(unresolved)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    let _ = dotenvy::dotenv();

    let opt = Opt::parse();

    let log_level = opt.log_level.clone();
    let log_format = opt.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match run(opt).await {
        Ok(0) => Ok(()),
        Ok(unresolved) => {
            log::warn!("{} address(es) could not be resolved", unresolved);
            Ok(())
        }
        Err(e) => {
            eprintln!("server_geo error: {:#}", e);
            process::exit(1);
        }
    }
}
