use chrono::{DateTime, Local};

use crate::diff::{DEFAULT_CONTEXT, unified_diff};
use crate::event::Event;
use crate::fetch::Snapshot;

/// Comparison state of one monitoring run: the URL being watched and the
/// snapshot taken on the previous cycle.
#[derive(Debug, Clone)]
pub struct Session {
    url: String,
    previous: Snapshot,
}

impl Session {
    /// Starts a session from the seeding fetch. The seed itself is never
    /// reported.
    pub fn new(url: impl Into<String>, seed: Snapshot) -> Self {
        Self {
            url: url.into(),
            previous: seed,
        }
    }

    pub fn previous(&self) -> &Snapshot {
        &self.previous
    }

    /// Classifies `current` against the previous snapshot and makes it the new
    /// baseline. Returns the events for this cycle in emission order; an
    /// unchanged page yields none.
    pub fn observe(&mut self, current: Snapshot, timestamp: DateTime<Local>) -> Vec<Event> {
        let mut events = Vec::new();

        match (self.previous.status, current.status) {
            (_, None) => events.push(Event::StatusDown {
                url: self.url.clone(),
                timestamp,
            }),
            (Some(from), Some(to)) if from != to => events.push(Event::StatusChanged {
                url: self.url.clone(),
                from,
                to,
                timestamp,
            }),
            (None, Some(status)) => events.push(Event::StatusRecovered {
                url: self.url.clone(),
                status,
                timestamp,
            }),
            (Some(_), Some(_)) => {}
        }

        if let (Some(before), Some(after)) = (&self.previous.text, &current.text) {
            if before != after {
                events.push(Event::ContentChanged {
                    url: self.url.clone(),
                    diff_lines: unified_diff(before, after, DEFAULT_CONTEXT),
                    timestamp,
                });
            }
        }

        self.previous = current;
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::apply;

    const URL: &str = "http://a.test";

    fn observe(seed: Snapshot, current: Snapshot) -> (Session, Vec<Event>) {
        let mut session = Session::new(URL, seed);
        let events = session.observe(current, Local::now());
        (session, events)
    }

    fn count(events: &[Event], pred: fn(&Event) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_content_change_between_ok_fetches() {
        let (_, events) = observe(Snapshot::ok("A"), Snapshot::ok("B"));

        assert_eq!(events.len(), 1);
        let Event::ContentChanged { diff_lines, url, .. } = &events[0] else {
            panic!("expected ContentChanged, got {:?}", events[0]);
        };
        assert_eq!(url, URL);
        assert!(diff_lines.contains(&"-A".to_string()));
        assert!(diff_lines.contains(&"+B".to_string()));
    }

    #[test]
    fn test_unreachable_fetch_reports_down_and_becomes_baseline() {
        let (session, events) = observe(Snapshot::ok("A"), Snapshot::unreachable());

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::StatusDown { .. }));
        assert_eq!(session.previous(), &Snapshot::unreachable());
    }

    #[test]
    fn test_down_takes_priority_over_status_change() {
        for seed in [
            Snapshot::ok("A"),
            Snapshot::status_only(500),
            Snapshot::unreachable(),
        ] {
            let (_, events) = observe(seed, Snapshot::unreachable());
            assert_eq!(count(&events, |e| matches!(e, Event::StatusDown { .. })), 1);
            assert_eq!(count(&events, |e| matches!(e, Event::StatusChanged { .. })), 0);
        }
    }

    #[test]
    fn test_status_change_without_text() {
        let (_, events) = observe(Snapshot::status_only(500), Snapshot::status_only(404));

        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::StatusChanged {
                from: 500,
                to: 404,
                ..
            }
        ));
    }

    #[test]
    fn test_status_change_and_content_are_independent() {
        let (_, events) = observe(Snapshot::ok("A"), Snapshot::status_only(503));
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::StatusChanged {
                from: 200,
                to: 503,
                ..
            }
        ));
    }

    #[test]
    fn test_repeated_error_status_is_silent() {
        let (_, events) = observe(Snapshot::status_only(503), Snapshot::status_only(503));
        assert!(events.is_empty());
    }

    #[test]
    fn test_unchanged_page_is_silent() {
        let (_, events) = observe(Snapshot::ok("same\ntext"), Snapshot::ok("same\ntext"));
        assert!(events.is_empty());
    }

    #[test]
    fn test_line_ending_change_carries_replayable_diff() {
        for (before, after) in [("A\n", "A"), ("A\r\nB", "A\nB")] {
            let (_, events) = observe(Snapshot::ok(before), Snapshot::ok(after));
            let [Event::ContentChanged { diff_lines, .. }] = events.as_slice() else {
                panic!("expected one ContentChanged, got {events:?}");
            };
            assert!(!diff_lines.is_empty());
            assert_eq!(apply(before, diff_lines).as_deref(), Some(after));
        }
    }

    #[test]
    fn test_recovery_after_outage_has_no_content_diff() {
        let (_, events) = observe(Snapshot::unreachable(), Snapshot::ok("back"));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::StatusRecovered { status: 200, .. }));
    }

    #[test]
    fn test_emitted_diff_reconstructs_current_text() {
        let pages = [
            "Title\nIntro\nItem 1\nItem 2\nFooter",
            "Title\nIntro\nItem 1\nItem 1.5\nItem 2\nFooter",
            "Title\nNew intro\nItem 2\nFooter\nCopyright",
            "Title",
        ];
        let mut session = Session::new(URL, Snapshot::ok(pages[0]));
        for pair in pages.windows(2) {
            let events = session.observe(Snapshot::ok(pair[1]), Local::now());
            let [Event::ContentChanged { diff_lines, .. }] = events.as_slice() else {
                panic!("expected one ContentChanged, got {events:?}");
            };
            assert_eq!(apply(pair[0], diff_lines).as_deref(), Some(pair[1]));
        }
    }

    #[test]
    fn test_sequence_over_several_cycles() {
        let mut session = Session::new(URL, Snapshot::ok("A"));
        let cycles = [
            Snapshot::ok("A"),
            Snapshot::unreachable(),
            Snapshot::unreachable(),
            Snapshot::ok("A"),
            Snapshot::status_only(404),
            Snapshot::status_only(404),
        ];
        let kinds: Vec<Vec<&str>> = cycles
            .into_iter()
            .map(|snapshot| {
                session
                    .observe(snapshot, Local::now())
                    .iter()
                    .map(|e| match e {
                        Event::StatusDown { .. } => "down",
                        Event::StatusChanged { .. } => "changed",
                        Event::StatusRecovered { .. } => "recovered",
                        Event::ContentChanged { .. } => "content",
                    })
                    .collect()
            })
            .collect();

        assert_eq!(
            kinds,
            vec![
                vec![],
                vec!["down"],
                vec!["down"],
                vec!["recovered"],
                vec!["changed"],
                vec![],
            ]
        );
    }
}
