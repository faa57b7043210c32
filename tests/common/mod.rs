#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use async_trait::async_trait;
use semantic_canvas::client::{
	BatchIndexResponse, DeleteResponse, GraphOptions, GraphPayload, Health, IndexDocument,
	IndexResponse, SearchBackend, SearchOptions, SearchResult, Stats,
};
use semantic_canvas::config::Config;
use semantic_canvas::controller::InteractionController;
use semantic_canvas::error::{Error, Result};
use semantic_canvas::events::MemorySink;
use semantic_canvas::graph::Position;
use semantic_canvas::surface::{
	MemoryCanvas, SceneLink, SceneNode, SceneSurface, Shape, ShapeKind, ShapeProps, ShapeSpec,
};
use tokio::sync::oneshot;

/// Scripted backend. Answers immediately from canned data unless a response
/// is parked on a oneshot channel, which lets tests control completion order.
#[derive(Default)]
pub struct FakeBackend {
	pub results: RefCell<HashMap<String, Vec<SearchResult>>>,
	pub graph: RefCell<GraphPayload>,
	pending_search: RefCell<HashMap<String, oneshot::Receiver<Result<Vec<SearchResult>>>>>,
	pending_index: RefCell<Option<oneshot::Receiver<Result<IndexResponse>>>>,
	pub fail_search: Cell<bool>,
	pub fail_index: Cell<bool>,
	pub search_calls: RefCell<Vec<(String, SearchOptions)>>,
	pub index_calls: RefCell<Vec<IndexDocument>>,
	pub graph_calls: RefCell<Vec<GraphOptions>>,
}

impl FakeBackend {
	pub fn new() -> Rc<Self> {
		Rc::new(Self::default())
	}

	pub fn with_results(&self, query: &str, results: Vec<SearchResult>) {
		self.results.borrow_mut().insert(query.to_string(), results);
	}

	/// Hold the next search for `query` until the sender fires.
	pub fn park_search(&self, query: &str) -> oneshot::Sender<Result<Vec<SearchResult>>> {
		let (tx, rx) = oneshot::channel();
		self.pending_search.borrow_mut().insert(query.to_string(), rx);
		tx
	}

	/// Hold the next index call until the sender fires.
	pub fn park_index(&self) -> oneshot::Sender<Result<IndexResponse>> {
		let (tx, rx) = oneshot::channel();
		*self.pending_index.borrow_mut() = Some(rx);
		tx
	}

	pub fn search_count(&self) -> usize {
		self.search_calls.borrow().len()
	}

	pub fn index_count(&self) -> usize {
		self.index_calls.borrow().len()
	}
}

fn unavailable() -> Error {
	Error::status(503, Some("Service Unavailable"), "embedding service down")
}

fn dropped() -> Error {
	Error::Network {
		status: None,
		message: "request dropped".into(),
	}
}

#[async_trait(?Send)]
impl SearchBackend for FakeBackend {
	async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
		self.search_calls
			.borrow_mut()
			.push((query.to_string(), options.clone()));
		let parked = self.pending_search.borrow_mut().remove(query);
		if let Some(rx) = parked {
			return rx.await.unwrap_or_else(|_| Err(dropped()));
		}
		if self.fail_search.get() {
			return Err(unavailable());
		}
		Ok(self.results.borrow().get(query).cloned().unwrap_or_default())
	}

	async fn index(&self, doc: &IndexDocument) -> Result<IndexResponse> {
		self.index_calls.borrow_mut().push(doc.clone());
		let parked = self.pending_index.borrow_mut().take();
		if let Some(rx) = parked {
			return rx.await.unwrap_or_else(|_| Err(dropped()));
		}
		if self.fail_index.get() {
			return Err(unavailable());
		}
		Ok(indexed(&format!("doc-{}", self.index_count())))
	}

	async fn index_batch(&self, docs: &[IndexDocument]) -> Result<BatchIndexResponse> {
		let mut ids = Vec::new();
		for doc in docs {
			ids.push(self.index(doc).await?.id);
		}
		Ok(BatchIndexResponse {
			indexed_count: ids.len(),
			ids,
		})
	}

	async fn stats(&self) -> Result<Stats> {
		Ok(Stats {
			total_documents: self.index_count() as u64,
			collection_name: "documents".into(),
			embedding_dimension: Some(768),
		})
	}

	async fn graph(&self, options: &GraphOptions) -> Result<GraphPayload> {
		self.graph_calls.borrow_mut().push(options.clone());
		if self.fail_search.get() {
			return Err(unavailable());
		}
		Ok(self.graph.borrow().clone())
	}

	async fn health(&self) -> Result<Health> {
		Ok(Health {
			status: "healthy".into(),
			store_connected: true,
			embedding_service: Some("ollama".into()),
		})
	}

	async fn delete_document(&self, id: &str) -> Result<DeleteResponse> {
		Ok(DeleteResponse {
			status: "deleted".into(),
			id: id.to_string(),
		})
	}
}

pub fn indexed(id: &str) -> IndexResponse {
	IndexResponse {
		id: id.to_string(),
		status: "indexed".into(),
		indexed_at: None,
	}
}

pub fn result(id: &str, score: f64) -> SearchResult {
	SearchResult {
		id: id.to_string(),
		text: format!("text of {id}"),
		url: format!("https://example.com/{id}"),
		title: format!("Title {id}"),
		score,
		metadata: Default::default(),
	}
}

pub fn note(id: &str, text: &str, at: Position) -> Shape {
	Shape {
		id: id.to_string(),
		spec: ShapeSpec {
			kind: ShapeKind::Note,
			x: at.x,
			y: at.y,
			props: ShapeProps {
				text: text.to_string(),
				..Default::default()
			},
		},
	}
}

pub fn arrow(id: &str) -> Shape {
	Shape {
		id: id.to_string(),
		spec: ShapeSpec {
			kind: ShapeKind::Arrow,
			x: 0.0,
			y: 0.0,
			props: ShapeProps {
				end: Some((10.0, 10.0)),
				..Default::default()
			},
		},
	}
}

/// Keeps the last data and highlight pushed into the scene.
#[derive(Default)]
pub struct SceneRecorder {
	pub nodes: Vec<SceneNode>,
	pub links: Vec<SceneLink>,
	pub focus: Option<String>,
	pub lit: BTreeSet<String>,
	pub updates: usize,
}

impl SceneSurface for SceneRecorder {
	fn set_graph_data(&mut self, nodes: Vec<SceneNode>, links: Vec<SceneLink>) {
		self.nodes = nodes;
		self.links = links;
		self.updates += 1;
	}

	fn set_highlight(&mut self, focus: Option<&str>, neighbors: &BTreeSet<String>) {
		self.focus = focus.map(str::to_string);
		self.lit = neighbors.clone();
	}

	fn clear(&mut self) {
		self.nodes.clear();
		self.links.clear();
		self.focus = None;
		self.lit.clear();
	}
}

pub struct Harness {
	pub backend: Rc<FakeBackend>,
	pub board: Rc<RefCell<MemoryCanvas>>,
	pub scene: Rc<RefCell<SceneRecorder>>,
	pub sink: Rc<MemorySink>,
	pub controller: InteractionController<FakeBackend>,
}

pub fn harness() -> Harness {
	harness_with(Config::default())
}

pub fn harness_with(config: Config) -> Harness {
	let backend = FakeBackend::new();
	let board = Rc::new(RefCell::new(MemoryCanvas::new()));
	let scene = Rc::new(RefCell::new(SceneRecorder::default()));
	let sink = Rc::new(MemorySink::new());
	let controller = InteractionController::new(
		backend.clone(),
		config,
		Box::new(board.clone()),
		Box::new(scene.clone()),
		sink.clone(),
	);
	Harness {
		backend,
		board,
		scene,
		sink,
		controller,
	}
}
