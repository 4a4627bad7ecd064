/// Alert Tail
///
/// Follows the live alert feed from the terminal: prints the alert list each
/// time it changes, until Ctrl-C.
use std::error::Error;

use alert_feed::{logging::init_logging, AlertFeed, FeedConfig, FeedSnapshot};
use tracing::{info, warn};

fn print_snapshot(snapshot: &FeedSnapshot) {
    let status = if snapshot.loading { "loading" } else { "ready" };
    println!(
        "--- {} alerts ({}, {}) ---",
        snapshot.alerts.len(),
        snapshot.connection,
        status
    );
    for alert in snapshot.alerts.iter() {
        println!(
            "[{}] {} --{} {}",
            alert.timestamp,
            alert.display_symbol(),
            alert.kind.label(),
            alert.message
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let config = FeedConfig::from_env()?;
    let handle = AlertFeed::new(config)?.start();
    let mut snapshots = handle.subscribe();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    warn!("Alert feed ended unexpectedly");
                    break;
                }
                print_snapshot(&snapshots.borrow_and_update());
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                break;
            }
        }
    }

    handle.stop().await;
    Ok(())
}
