use log::debug;
use tokio::sync::mpsc::UnboundedSender;

use crate::event::Event;

/// Receives events from the monitoring worker, in cycle order.
///
/// Called on the worker task: a slow implementation delays the next cycle.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Forwards events onto a channel so the consumer drains them on its own
/// schedule.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<Event>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<Event>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: Event) {
        if self.tx.send(event).is_err() {
            debug!("Event receiver dropped, discarding event");
        }
    }
}

impl<F> EventSink for F
where
    F: Fn(Event) + Send + Sync,
{
    fn emit(&self, event: Event) {
        self(event);
    }
}
