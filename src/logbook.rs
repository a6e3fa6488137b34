use chrono::Local;
use std::{fs, path::Path};

use crate::error::Error;
use crate::event::{Event, TIMESTAMP_FORMAT};

/// In-memory history of rendered monitor output, exportable as a text file.
#[derive(Debug, Clone, Default)]
pub struct Logbook {
    lines: Vec<String>,
}

impl Logbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the rendered lines of `event`.
    pub fn record(&mut self, event: &Event) {
        self.lines.extend(event.render_lines());
    }

    /// Appends a free-form status line, stamped with the current time.
    pub fn note(&mut self, message: &str) {
        self.lines
            .push(format!("{} {message}", Local::now().format(TIMESTAMP_FORMAT)));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Writes every line to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let mut content = self.lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(path, content)?;
        Ok(())
    }
}
