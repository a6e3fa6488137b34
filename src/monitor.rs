use log::{error, info};
use std::sync::Arc;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;
use crate::error::Error;
use crate::event::Event;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::sink::{ChannelSink, EventSink};
use crate::worker::monitor_page;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
}

struct Worker {
    url: String,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Handle through which a controller starts and stops monitoring.
///
/// At most one worker runs per `Monitor`. The worker owns the snapshot state
/// for its run; stopping discards it, so every start seeds a fresh baseline.
#[derive(Default)]
pub struct Monitor {
    fetcher: Option<Arc<dyn Fetcher>>,
    worker: Option<Worker>,
}

impl Monitor {
    /// A monitor that fetches over HTTP, using the timeout of each started
    /// config.
    pub fn new() -> Self {
        Self::default()
    }

    /// A monitor that fetches through `fetcher` instead of HTTP.
    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher: Some(fetcher),
            worker: None,
        }
    }

    pub fn state(&self) -> MonitorState {
        if self.worker.is_some() {
            MonitorState::Running
        } else {
            MonitorState::Stopped
        }
    }

    /// Spawns the monitoring worker for `config`, delivering events to `sink`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRunning`] if a worker is active, a validation
    /// error for an invalid config, or an HTTP error if the client cannot be
    /// built.
    pub fn start<S>(&mut self, config: MonitorConfig, sink: S) -> Result<(), Error>
    where
        S: EventSink + 'static,
    {
        if self.worker.is_some() {
            return Err(Error::AlreadyRunning);
        }
        config.validate()?;

        let fetcher: Arc<dyn Fetcher> = match &self.fetcher {
            Some(fetcher) => Arc::clone(fetcher),
            None => Arc::new(HttpFetcher::new(config.timeout_secs)?),
        };
        let url = config.url.clone();
        let token = CancellationToken::new();
        let worker_token = token.clone();
        let handle = tokio::spawn(async move {
            monitor_page(config, fetcher.as_ref(), &sink, worker_token).await;
        });

        self.worker = Some(Worker { url, token, handle });
        Ok(())
    }

    /// Like [`Monitor::start`], returning a channel that yields the events.
    /// The channel closes once the monitor is stopped.
    ///
    /// # Errors
    ///
    /// See [`Monitor::start`].
    pub fn start_with_channel(
        &mut self,
        config: MonitorConfig,
    ) -> Result<UnboundedReceiver<Event>, Error> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.start(config, ChannelSink::new(tx))?;
        Ok(rx)
    }

    /// Signals the worker to stop and waits for it to exit. A fetch already in
    /// flight completes first; no fetch starts afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if no worker is active.
    pub async fn stop(&mut self) -> Result<(), Error> {
        let worker = self.worker.take().ok_or(Error::NotRunning)?;
        worker.token.cancel();
        if let Err(e) = worker.handle.await {
            error!("Monitor worker for {} failed: {e}", worker.url);
        }
        info!("Monitoring of {} stopped", worker.url);
        Ok(())
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        if let Some(worker) = &self.worker {
            worker.token.cancel();
        }
    }
}
