//! In-memory log book for crash reports.
//!
//! [`LogBook`] is a tracing layer that keeps the most recent records in a
//! bounded ring. The crash state prints them newest-first.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::constants::LOGBOOK_CAPACITY;

/// Bounded, shared record of formatted log lines.
///
/// Clones share the same ring.
#[derive(Clone)]
pub struct LogBook {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl Default for LogBook {
    fn default() -> Self {
        Self::new(LOGBOOK_CAPACITY)
    }
}

impl LogBook {
    /// Create a log book keeping at most `capacity` lines.
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// Append a line, evicting the oldest when full.
    pub fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            if lines.len() == self.capacity {
                lines.pop_front();
            }
            lines.push_back(line);
        }
    }

    /// Lines, newest first.
    pub fn newest_first(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of lines held.
    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S> Layer<S> for LogBook
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        self.push(format!(
            "[{}] {}: {}",
            metadata.level(),
            metadata.target(),
            visitor.0
        ));
    }
}

/// Collects the message and any extra fields of an event.
#[derive(Default)]
struct MessageVisitor(String);

impl MessageVisitor {
    fn append(&mut self, field: &Field, value: impl fmt::Display) {
        if field.name() == "message" {
            self.0 = if self.0.is_empty() {
                value.to_string()
            } else {
                format!("{} {}", value, self.0)
            };
        } else if self.0.is_empty() {
            self.0 = format!("{}={}", field.name(), value);
        } else {
            self.0.push_str(&format!(" {}={}", field.name(), value));
        }
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.append(field, format_args!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.append(field, value);
    }
}
