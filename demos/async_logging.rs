//! Async logging example
//!
//! Logs from many tokio tasks through children of one logger. Logging calls
//! are synchronous and safe to make from async code.
//!
//! Run with: cargo run --example async_logging

use layerlog::prelude::*;

#[tokio::main]
async fn main() {
    println!("=== layerlog - Async Logging Example ===\n");

    let logger = Logger::builder().json().build();

    let tasks: Vec<_> = (0..4)
        .map(|worker| {
            let logger = logger.with(&format!("worker-{}", worker));
            tokio::spawn(async move {
                for job in 0..3 {
                    logger.info("job finished", &[Field::int("job", job)]);
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for task in tasks {
        if let Err(e) = task.await {
            eprintln!("task failed: {}", e);
        }
    }

    println!(
        "\nentries written: {}",
        logger.metrics().entries_written()
    );
}
