//! Structured reporting for failures on background paths.

use std::cell::RefCell;
use std::fmt;

use log::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
	IndexFailed,
	EnrichFailed,
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			EventKind::IndexFailed => "index_failed",
			EventKind::EnrichFailed => "enrich_failed",
		})
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundEvent {
	pub kind: EventKind,
	pub item_id: Option<String>,
	pub cause: String,
}

impl BackgroundEvent {
	pub fn new(kind: EventKind, item_id: Option<&str>, cause: impl fmt::Display) -> Self {
		Self {
			kind,
			item_id: item_id.map(str::to_string),
			cause: cause.to_string(),
		}
	}
}

/// Receives background failures in place of ad hoc console output.
pub trait EventSink {
	fn emit(&self, event: BackgroundEvent);
}

/// Forwards events to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
	fn emit(&self, event: BackgroundEvent) {
		warn!(
			target: "semantic_canvas::background",
			"{} item={} cause={}",
			event.kind,
			event.item_id.as_deref().unwrap_or("-"),
			event.cause
		);
	}
}

/// Keeps every event; lets callers assert on failure counts.
#[derive(Debug, Default)]
pub struct MemorySink {
	events: RefCell<Vec<BackgroundEvent>>,
}

impl MemorySink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> Vec<BackgroundEvent> {
		self.events.borrow().clone()
	}

	pub fn count(&self, kind: EventKind) -> usize {
		self.events.borrow().iter().filter(|e| e.kind == kind).count()
	}
}

impl EventSink for MemorySink {
	fn emit(&self, event: BackgroundEvent) {
		self.events.borrow_mut().push(event);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn memory_sink_counts_by_kind() {
		let sink = MemorySink::new();
		sink.emit(BackgroundEvent::new(EventKind::IndexFailed, Some("shape:1"), "503"));
		sink.emit(BackgroundEvent::new(EventKind::IndexFailed, Some("shape:2"), "503"));
		sink.emit(BackgroundEvent::new(EventKind::EnrichFailed, None, "timeout"));
		assert_eq!(sink.count(EventKind::IndexFailed), 2);
		assert_eq!(sink.count(EventKind::EnrichFailed), 1);
		assert_eq!(sink.events()[0].item_id.as_deref(), Some("shape:1"));
	}
}
