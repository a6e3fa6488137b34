//! Watches a web page for reachability and text changes, reporting each
//! change as a timestamped [`Event`].

pub mod config;
pub mod diff;
pub mod error;
pub mod event;
pub mod fetch;
pub mod logbook;
pub mod monitor;
pub mod session;
pub mod sink;
pub mod worker;

pub use config::{Config, MonitorConfig};
pub use error::Error;
pub use event::Event;
pub use fetch::{Fetcher, HttpFetcher, Snapshot};
pub use logbook::Logbook;
pub use monitor::{Monitor, MonitorState};
pub use sink::{ChannelSink, EventSink};
pub use worker::monitor_page;
