//! Decides which canvas items get indexed, at most once per session.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde_json::{Map, Value};

use crate::client::{IndexDocument, IndexResponse, SearchBackend};
use crate::error::{Error, Result};
use crate::events::{BackgroundEvent, EventKind, EventSink};
use crate::surface::CanvasItem;

/// Items with less text than this are never indexed.
pub const MIN_TEXT_CHARS: usize = 20;
const TITLE_CHARS: usize = 100;

#[derive(Clone, Debug, PartialEq)]
pub struct IndexingRecord {
	pub source_item_id: String,
	/// `None` while the request is in flight.
	pub indexed_at: Option<DateTime<Utc>>,
	pub document_id: Option<String>,
}

impl IndexingRecord {
	pub fn is_pending(&self) -> bool {
		self.indexed_at.is_none()
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
	/// The item exposes no text.
	NoText,
	TooShort,
	/// Indexed, or being indexed, earlier this session.
	AlreadyIndexed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum IndexOutcome {
	Indexed(IndexResponse),
	Skipped(SkipReason),
	/// Reported to the event sink; only returned by the background path.
	Failed,
}

pub struct IndexingGate<B> {
	backend: Rc<B>,
	records: RefCell<HashMap<String, IndexingRecord>>,
	sink: Rc<dyn EventSink>,
}

impl<B: SearchBackend> IndexingGate<B> {
	pub fn new(backend: Rc<B>, sink: Rc<dyn EventSink>) -> Self {
		Self {
			backend,
			records: RefCell::new(HashMap::new()),
			sink,
		}
	}

	/// Text worth indexing, or why the item is skipped.
	pub fn eligible_text(item: &dyn CanvasItem) -> std::result::Result<String, SkipReason> {
		let text = item.text_content().ok_or(SkipReason::NoText)?;
		let text = text.trim();
		if text.chars().count() < MIN_TEXT_CHARS {
			return Err(SkipReason::TooShort);
		}
		Ok(text.to_string())
	}

	/// Automatic path for canvas change events. Never fails.
	pub async fn on_item_changed(&self, item: &dyn CanvasItem) -> IndexOutcome {
		let text = match Self::eligible_text(item) {
			Ok(text) => text,
			Err(reason) => return IndexOutcome::Skipped(reason),
		};
		if !self.claim(item.item_id()) {
			return IndexOutcome::Skipped(SkipReason::AlreadyIndexed);
		}
		match self.submit(item, text).await {
			Ok(response) => IndexOutcome::Indexed(response),
			Err(e) => {
				self.sink.emit(BackgroundEvent::new(EventKind::IndexFailed, Some(item.item_id()), &e));
				IndexOutcome::Failed
			}
		}
	}

	/// User-initiated path: same policy and record set, errors propagate.
	pub async fn index_item(&self, item: &dyn CanvasItem) -> Result<IndexOutcome> {
		let text = Self::eligible_text(item).map_err(|reason| {
			Error::Validation(match reason {
				SkipReason::NoText => format!("{} has no text to index", item.kind().as_str()),
				_ => format!("text must be at least {MIN_TEXT_CHARS} characters"),
			})
		})?;
		if !self.claim(item.item_id()) {
			return Ok(IndexOutcome::Skipped(SkipReason::AlreadyIndexed));
		}
		self.submit(item, text).await.map(IndexOutcome::Indexed)
	}

	/// Check-and-mark in one step, before any network call.
	fn claim(&self, item_id: &str) -> bool {
		let mut records = self.records.borrow_mut();
		if records.contains_key(item_id) {
			debug!("{item_id} already indexed or in flight");
			return false;
		}
		records.insert(item_id.to_string(), IndexingRecord {
			source_item_id: item_id.to_string(),
			indexed_at: None,
			document_id: None,
		});
		true
	}

	async fn submit(&self, item: &dyn CanvasItem, text: String) -> Result<IndexResponse> {
		let doc = document_for(item, text);
		match self.backend.index(&doc).await {
			Ok(response) => {
				info!("indexed {} as {}", item.item_id(), response.id);
				if let Some(record) = self.records.borrow_mut().get_mut(item.item_id()) {
					record.indexed_at = Some(Utc::now());
					record.document_id = Some(response.id.clone());
				}
				Ok(response)
			}
			Err(e) => {
				self.records.borrow_mut().remove(item.item_id());
				Err(e)
			}
		}
	}

	pub fn is_indexed(&self, item_id: &str) -> bool {
		self.records
			.borrow()
			.get(item_id)
			.is_some_and(|r| !r.is_pending())
	}

	pub fn record(&self, item_id: &str) -> Option<IndexingRecord> {
		self.records.borrow().get(item_id).cloned()
	}

	pub fn len(&self) -> usize {
		self.records.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.borrow().is_empty()
	}
}

fn document_for(item: &dyn CanvasItem, text: String) -> IndexDocument {
	let title: String = text
		.lines()
		.next()
		.unwrap_or_default()
		.chars()
		.take(TITLE_CHARS)
		.collect();
	let mut metadata = Map::new();
	metadata.insert("source".into(), Value::from("canvas"));
	metadata.insert("shape_id".into(), Value::from(item.item_id()));
	metadata.insert("shape_type".into(), Value::from(item.kind().as_str()));
	IndexDocument {
		text,
		url: None,
		title: Some(title),
		metadata: Some(metadata),
	}
}
