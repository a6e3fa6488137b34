use chrono::Local;
use log::{debug, info};
use std::time::Duration;
use tokio::{select, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;
use crate::fetch::Fetcher;
use crate::session::Session;
use crate::sink::EventSink;

/// Watches a single page until `token` is cancelled.
///
/// # Behavior
///
/// - Fetches the page once to establish the baseline, without reporting it
/// - Sleeps for the configured interval, then fetches again and compares
/// - Emits every classified change to `sink` before starting the next wait
/// - Keeps the same interval whatever the fetch outcome; there is no backoff
///
/// Cancellation is observed while sleeping and between cycles. A fetch that is
/// already in flight runs to completion (bounded by the fetch timeout) and its
/// events are still emitted.
pub async fn monitor_page(
    config: MonitorConfig,
    fetcher: &dyn Fetcher,
    sink: &dyn EventSink,
    token: CancellationToken,
) {
    info!(
        "Started monitoring {} every {} seconds",
        config.url, config.interval_secs
    );
    debug!("Fetch timeout: {} seconds", config.timeout_secs);

    let seed = fetcher.fetch(&config.url).await;
    debug!("Baseline for {}: status {:?}", config.url, seed.status);
    let mut session = Session::new(config.url.clone(), seed);
    let interval = Duration::from_secs(config.interval_secs);

    loop {
        if token.is_cancelled() {
            info!("Shutdown requested, stopping monitor");
            break;
        }

        select! {
            () = sleep(interval) => {},
            () = token.cancelled() => {
                info!("Shutdown requested during sleep");
                break;
            }
        }

        let current = fetcher.fetch(&config.url).await;
        let events = session.observe(current, Local::now());
        if events.is_empty() {
            debug!("{}: no change", config.url);
        }
        for event in events {
            sink.emit(event);
        }
    }

    info!("Stopped monitoring {}", config.url);
}
