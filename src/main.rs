use log::{info, warn};
use pagewatch::{Config, Error, Event, Logbook, Monitor};
use tokio::{select, signal};

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    // A missing .env file is fine, variables may come from the environment.
    dotenvy::dotenv().ok();

    let config = load_or_create_config()?;
    let mut logbook = Logbook::new();
    let mut monitor = Monitor::new();

    let mut events = monitor.start_with_channel(config.monitor.clone())?;
    logbook.note(&format!(
        "Started monitoring {} every {} seconds...",
        config.monitor.url, config.monitor.interval_secs
    ));

    loop {
        select! {
            Some(event) = events.recv() => {
                report(&event);
                logbook.record(&event);
            }
            result = signal::ctrl_c() => {
                result?;
                info!("Shutdown requested");
                break;
            }
        }
    }

    monitor.stop().await?;
    logbook.note("Monitoring stopped.");

    if let Some(path) = &config.log.export_path {
        logbook.export(path)?;
        info!("Logs exported to {}", path.display());
    }
    Ok(())
}

/// Loads the config file, or on first run builds one from the environment and
/// saves it for next time.
fn load_or_create_config() -> Result<Config, Error> {
    let path = Config::default_path()?;
    if path.exists() {
        let config = Config::load_from(&path)?;
        info!("Configuration loaded from {}", path.display());
        return Ok(config);
    }

    warn!("No configuration file found at {}", path.display());
    let config = Config::from_env()?;
    config.save_to(&path)?;
    info!("Configuration saved to {}", path.display());
    Ok(config)
}

fn report(event: &Event) {
    for line in event.render_lines() {
        if event.is_alert() {
            warn!("{line}");
        } else {
            info!("{line}");
        }
    }
}
