//! Datadog shipping example
//!
//! Tees a local logger into Datadog, either directly through the intake API
//! (`DD_API_KEY` set) or through a local agent (`DD_AGENT_ADDR`, e.g.
//! `localhost:10518`). With neither set the remote side is a no-op.
//!
//! Run with: cargo run --example datadog_shipping

use layerlog::destinations::datadog::{self, AgentFormat};
use layerlog::prelude::*;
use std::time::Duration;

fn main() {
    println!("=== layerlog - Datadog Shipping Example ===\n");

    let api_key = std::env::var("DD_API_KEY").unwrap_or_default();
    let agent_addr = std::env::var("DD_AGENT_ADDR").unwrap_or_default();

    let remote = if !api_key.is_empty() {
        println!("Shipping directly to the intake API");
        datadog::api(api_key)
            .site(std::env::var("DD_SITE").unwrap_or_else(|_| datadog::DEFAULT_SITE.to_string()))
            .service_name("layerlog-demo")
            .source("rust")
            .hostname("demo-host")
            .tags([("env", "dev"), ("version", env!("CARGO_PKG_VERSION"))])
            .flush_timeout(Duration::from_secs(2))
            .build()
    } else {
        println!("Relaying through agent at {:?}", agent_addr);
        datadog::agent(agent_addr)
            .env("dev")
            .service_name("layerlog-demo")
            .source("rust")
            .agent_format(AgentFormat::Envelope)
            .level(LogLevel::Warn)
            .build()
    };
    println!("Remote destination: {}\n", remote.name());

    let logger = Logger::builder().json().build().with_core(remote);
    let billing = logger.with("billing");

    billing.info("invoice created", &[Field::string("invoice", "INV-1042")]);
    billing.warn("card expiring soon", &[Field::string("customer", "c-77")]);

    // The underlying write reports remote failures to the caller.
    match billing.write(LogLevel::Error, "charge declined", &[Field::uint("amount_cents", 4599)]) {
        Ok(()) => println!("\nall destinations accepted the entry"),
        Err(e) => println!("\nremote delivery failed: {}", e),
    }

    println!(
        "written: {}, failed: {}",
        logger.metrics().entries_written(),
        logger.metrics().failed_writes()
    );
}
