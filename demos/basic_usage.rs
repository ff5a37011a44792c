//! Basic usage example
//!
//! Demonstrates scoped loggers, structured fields, level changes and panic
//! recovery on the local stream.
//!
//! Run with: cargo run --example basic_usage

use layerlog::prelude::*;
use layerlog::{info, warn};
use std::time::Duration;

fn main() {
    println!("=== layerlog - Basic Usage Example ===\n");

    let logger = Logger::builder().level(LogLevel::Debug).build();

    println!("1. Severity methods with fields:");
    logger.debug("cache warmed", &[Field::uint("entries", 512)]);
    logger.info("service started", &[Field::string("version", "1.4.2")]);
    logger.warn("slow dependency", &[Field::duration("latency", Duration::from_millis(870))]);

    println!("\n2. Scoped children:");
    let api = logger.with("api");
    let db = api.with("db");
    db.info("pool ready", &[Field::int("size", 8)]);
    info!(api, "listening on port {}", 8080);

    println!("\n3. Shared level gate:");
    db.set_level(LogLevel::Warn);
    logger.info("not shown, the whole tree is at WARN now", &[]);
    warn!(api, "shown: {} retries left", 2);
    logger.set_level(LogLevel::Debug);

    println!("\n4. JSON output with bound context:");
    let json = Logger::builder().json().build();
    let request = json.with("http").with_fields(&[Field::string("request_id", "r-81f2")]);
    request.info("request served", &[Field::uint("status", 200)]);

    println!("\n5. Panic recovery:");
    let total = logger.recover_panic("sum_batch", &["batch-7"], None, || {
        let batch: Vec<u64> = Vec::new();
        batch[0] + 1
    });
    println!("   recovered result: {:?}", total);

    let parsed: std::result::Result<u16, _> = "80a".parse::<u16>();
    logger.warn_on_err("invalid port in config", &parsed, &[Field::string("raw", "80a")]);

    if let Err(e) = logger.sync() {
        eprintln!("flush failed: {}", e);
    }

    println!("\n=== Example completed successfully ===");
}
