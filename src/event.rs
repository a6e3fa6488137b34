use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A change observed by the monitor during one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// The fetch failed outright (network error or timeout).
    StatusDown {
        url: String,
        timestamp: DateTime<Local>,
    },
    /// The page answered with a different status code than last cycle.
    StatusChanged {
        url: String,
        from: u16,
        to: u16,
        timestamp: DateTime<Local>,
    },
    /// The page answered again after an unreachable cycle.
    StatusRecovered {
        url: String,
        status: u16,
        timestamp: DateTime<Local>,
    },
    /// The page text differs from last cycle.
    ContentChanged {
        url: String,
        diff_lines: Vec<String>,
        timestamp: DateTime<Local>,
    },
}

impl Event {
    pub fn timestamp(&self) -> DateTime<Local> {
        match self {
            Event::StatusDown { timestamp, .. }
            | Event::StatusChanged { timestamp, .. }
            | Event::StatusRecovered { timestamp, .. }
            | Event::ContentChanged { timestamp, .. } => *timestamp,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Event::StatusDown { url, .. }
            | Event::StatusChanged { url, .. }
            | Event::StatusRecovered { url, .. }
            | Event::ContentChanged { url, .. } => url,
        }
    }

    /// Whether the event signals a reachability problem rather than new content.
    pub fn is_alert(&self) -> bool {
        matches!(self, Event::StatusDown { .. } | Event::StatusChanged { .. })
    }

    /// The event as log lines: the summary line followed by any diff lines.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = vec![self.to_string()];
        if let Event::ContentChanged { diff_lines, .. } = self {
            lines.extend(diff_lines.iter().cloned());
        }
        lines
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self.timestamp().format(TIMESTAMP_FORMAT);
        match self {
            Event::StatusDown { url, .. } => write!(f, "{ts} Website {url} is DOWN!"),
            Event::StatusChanged { from, to, .. } => {
                write!(f, "{ts} Status changed: {from} -> {to}")
            }
            Event::StatusRecovered { url, status, .. } => {
                write!(f, "{ts} Website {url} is reachable again (status {status})")
            }
            Event::ContentChanged { url, .. } => write!(f, "{ts} Change detected on {url}:"),
        }
    }
}
