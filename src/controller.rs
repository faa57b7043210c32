//! Query, display and selection state machine.
//!
//! `Idle → Querying → Displaying ⇄ Selected`, back to `Idle` only through
//! [`InteractionController::clear`]. Every request takes a sequence number;
//! a response is applied only if its number is still the latest issued, so
//! a newer query always wins over an older one still in flight. Issuing a
//! request also aborts the one before it; dropping the future cancels the
//! underlying fetch.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use futures::future::{AbortHandle, Abortable};
use log::{debug, info};

use crate::client::{
	GRAPH_LIMIT_RANGE, GRAPH_THRESHOLD_RANGE, GraphOptions, GraphPayload, SEARCH_LIMIT_RANGE, SearchBackend,
	SearchOptions, SearchResult, Stats,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{BackgroundEvent, EventKind, EventSink};
use crate::graph::{Anchor, GraphMode, GraphModel, GraphModelBuilder, Position};
use crate::layout::{ForceLayout, LayoutEngine};
use crate::surface::{CanvasAdapter, CanvasEditor, CanvasItem, SceneAdapter, SceneSurface, SizeMetric};

/// Id of the anchor created for a typed query.
pub const QUERY_ANCHOR_ID: &str = "query";
const ANCHOR_LABEL_CHARS: usize = 80;

#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
	Idle,
	Querying,
	Displaying,
	Selected(String),
}

/// The single authoritative description of what is on screen.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
	pub query: String,
	pub active_node_id: Option<String>,
	pub threshold: f64,
	pub limit: usize,
	pub mode: Option<GraphMode>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum QueryOutcome {
	Displayed { nodes: usize, edges: usize },
	/// A newer request was issued before this one answered.
	Superseded,
	/// Nothing to do, e.g. an item without text.
	Skipped,
}

#[derive(Clone, Debug)]
enum Request {
	Search { query: String },
	Enrich { anchor: Anchor, text: String, linear: bool },
	Explore { query: Option<String> },
}

impl Request {
	fn mode(&self) -> GraphMode {
		match self {
			Request::Explore { .. } => GraphMode::Exploration,
			_ => GraphMode::Enrichment,
		}
	}

	fn query_text(&self) -> String {
		match self {
			Request::Search { query } => query.clone(),
			Request::Enrich { text, .. } => text.clone(),
			Request::Explore { query } => query.clone().unwrap_or_default(),
		}
	}
}

enum Fetched {
	Results(Vec<SearchResult>),
	Graph(GraphPayload),
}

pub struct InteractionController<B> {
	backend: Rc<B>,
	config: Config,
	builder: GraphModelBuilder,
	layout: LayoutEngine,
	force: RefCell<ForceLayout>,
	canvas: RefCell<CanvasAdapter>,
	scene: RefCell<SceneAdapter>,
	sink: Rc<dyn EventSink>,
	phase: RefCell<Phase>,
	view: RefCell<ViewState>,
	model: RefCell<Option<GraphModel>>,
	last: RefCell<Option<Request>>,
	search_params: Cell<(f64, usize)>,
	explore_params: Cell<(f64, usize)>,
	seq: Cell<u64>,
	in_flight: RefCell<Option<AbortHandle>>,
}

impl<B: SearchBackend> InteractionController<B> {
	pub fn new(
		backend: Rc<B>,
		config: Config,
		canvas: Box<dyn CanvasEditor>,
		scene: Box<dyn SceneSurface>,
		sink: Rc<dyn EventSink>,
	) -> Self {
		let search_params = clamp_params(
			GraphMode::Enrichment,
			config.default_score_threshold,
			config.default_limit,
		);
		let explore_params = clamp_params(
			GraphMode::Exploration,
			config.exploration_threshold,
			config.exploration_limit,
		);
		Self {
			builder: GraphModelBuilder::new(&config),
			layout: LayoutEngine::new(&config.layout),
			force: RefCell::new(ForceLayout::new(&config.layout)),
			canvas: RefCell::new(CanvasAdapter::new(canvas)),
			scene: RefCell::new(SceneAdapter::new(scene, SizeMetric::Degree)),
			view: RefCell::new(idle_view(search_params)),
			phase: RefCell::new(Phase::Idle),
			model: RefCell::new(None),
			last: RefCell::new(None),
			search_params: Cell::new(search_params),
			explore_params: Cell::new(explore_params),
			seq: Cell::new(0),
			in_flight: RefCell::new(None),
			backend,
			config,
			sink,
		}
	}

	pub fn phase(&self) -> Phase {
		self.phase.borrow().clone()
	}

	pub fn view(&self) -> ViewState {
		self.view.borrow().clone()
	}

	pub fn model(&self) -> Ref<'_, Option<GraphModel>> {
		self.model.borrow()
	}

	pub fn canvas(&self) -> Ref<'_, CanvasAdapter> {
		self.canvas.borrow()
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn latest_seq(&self) -> u64 {
		self.seq.get()
	}

	/// Search for typed text and arrange the hits around a query label at
	/// the origin.
	pub async fn search(&self, query: &str) -> Result<QueryOutcome> {
		let query = query.trim();
		if query.is_empty() {
			return Err(Error::Validation("query must not be empty".into()));
		}
		self.run(Request::Search {
			query: query.to_string(),
		})
		.await
	}

	/// Search for an item's own text and arrange the hits around it.
	/// Items without text are a no-op.
	pub async fn enrich(&self, item: &dyn CanvasItem) -> Result<QueryOutcome> {
		match enrich_request(item, false) {
			Some(request) => self.run(request).await,
			None => Ok(QueryOutcome::Skipped),
		}
	}

	/// Like [`enrich`](Self::enrich) with the results in a row beside the item.
	pub async fn related(&self, item: &dyn CanvasItem) -> Result<QueryOutcome> {
		match enrich_request(item, true) {
			Some(request) => self.run(request).await,
			None => Ok(QueryOutcome::Skipped),
		}
	}

	/// Enrichment triggered by an item update; failures go to the sink.
	pub async fn enrich_in_background(&self, item: &dyn CanvasItem) {
		if let Err(e) = self.enrich(item).await {
			self.sink.emit(BackgroundEvent::new(EventKind::EnrichFailed, Some(item.item_id()), &e));
		}
	}

	/// Full-corpus view, optionally focused by a query.
	pub async fn explore(&self, query: Option<&str>) -> Result<QueryOutcome> {
		let query = query.map(str::trim).filter(|q| !q.is_empty()).map(str::to_string);
		self.run(Request::Explore { query }).await
	}

	/// Change the threshold of the current mode and re-query if a view is up.
	pub async fn set_threshold(&self, threshold: f64) -> Result<QueryOutcome> {
		let mode = self.current_mode();
		self.set_params(mode, threshold, self.params(mode).1);
		self.requery().await
	}

	/// Change the limit of the current mode and re-query if a view is up.
	pub async fn set_limit(&self, limit: usize) -> Result<QueryOutcome> {
		let mode = self.current_mode();
		self.set_params(mode, self.params(mode).0, limit);
		self.requery().await
	}

	/// `(threshold, limit)` the next query in `mode` will use.
	pub fn params(&self, mode: GraphMode) -> (f64, usize) {
		self.params_cell(mode).get()
	}

	/// Store parameters for a mode without re-querying. Values are clamped
	/// to what the backend accepts in that mode.
	pub fn set_params(&self, mode: GraphMode, threshold: f64, limit: usize) {
		self.params_cell(mode).set(clamp_params(mode, threshold, limit));
	}

	/// Id of the item or query label the current enrichment view is built
	/// around.
	pub fn anchor_id(&self) -> Option<String> {
		self.model
			.borrow()
			.as_ref()
			.and_then(|m| m.anchor.as_ref())
			.map(|a| a.id.clone())
	}

	pub async fn stats(&self) -> Result<Stats> {
		self.backend.stats().await
	}

	/// Click on a node (`Some`) or on empty space (`None`). Clicking the
	/// selected node again, empty space, or anything not in the view returns
	/// to `Displaying`.
	pub fn select(&self, node_id: Option<&str>) -> Phase {
		let phase = self.phase();
		if !matches!(phase, Phase::Displaying | Phase::Selected(_)) {
			return phase;
		}
		let model = self.model.borrow();
		let Some(model) = model.as_ref() else {
			return phase;
		};

		let next = match node_id {
			Some(id) if phase != Phase::Selected(id.to_string()) && model.contains(id) => {
				Phase::Selected(id.to_string())
			}
			_ => Phase::Displaying,
		};
		let focus = match &next {
			Phase::Selected(id) => Some(id.as_str()),
			_ => None,
		};
		match model.mode {
			GraphMode::Enrichment => self.canvas.borrow_mut().highlight(model, focus),
			GraphMode::Exploration => self.scene.borrow_mut().highlight(model, focus),
		}
		self.view.borrow_mut().active_node_id = focus.map(str::to_string);
		*self.phase.borrow_mut() = next.clone();
		next
	}

	/// Drop the view and discard anything in flight.
	pub fn clear(&self) {
		self.seq.set(self.seq.get() + 1);
		if let Some(handle) = self.in_flight.borrow_mut().take() {
			handle.abort();
		}
		self.canvas.borrow_mut().clear();
		self.scene.borrow_mut().clear();
		self.force.borrow_mut().clear();
		*self.model.borrow_mut() = None;
		*self.last.borrow_mut() = None;
		*self.view.borrow_mut() = idle_view(self.search_params.get());
		*self.phase.borrow_mut() = Phase::Idle;
		info!("view cleared");
	}

	async fn requery(&self) -> Result<QueryOutcome> {
		let last = self.last.borrow().clone();
		match last {
			Some(request) => self.run(request).await,
			None => Ok(QueryOutcome::Skipped),
		}
	}

	fn current_mode(&self) -> GraphMode {
		self.view.borrow().mode.unwrap_or(GraphMode::Enrichment)
	}

	fn params_cell(&self, mode: GraphMode) -> &Cell<(f64, usize)> {
		match mode {
			GraphMode::Enrichment => &self.search_params,
			GraphMode::Exploration => &self.explore_params,
		}
	}

	fn is_current(&self, seq: u64) -> bool {
		self.seq.get() == seq
	}

	async fn run(&self, request: Request) -> Result<QueryOutcome> {
		let seq = self.seq.get() + 1;
		self.seq.set(seq);
		let (handle, registration) = AbortHandle::new_pair();
		if let Some(previous) = self.in_flight.replace(Some(handle)) {
			previous.abort();
		}
		*self.phase.borrow_mut() = Phase::Querying;
		let (threshold, limit) = self.params_cell(request.mode()).get();

		let fetch = async {
			match &request {
				Request::Explore { query } => {
					let options = GraphOptions {
						query: query.clone(),
						limit,
						similarity_threshold: threshold,
						filter_metadata: None,
					};
					self.backend.graph(&options).await.map(Fetched::Graph)
				}
				_ => {
					let options = SearchOptions {
						limit,
						score_threshold: threshold,
						use_exa: self.config.use_exa,
						filter_metadata: None,
					};
					self.backend
						.search(&request.query_text(), &options)
						.await
						.map(Fetched::Results)
				}
			}
		};
		let Ok(fetched) = Abortable::new(fetch, registration).await else {
			debug!("request #{seq} aborted, latest is #{}", self.seq.get());
			return Ok(QueryOutcome::Superseded);
		};

		if !self.is_current(seq) {
			debug!("discarding response #{seq}, latest is #{}", self.seq.get());
			return Ok(QueryOutcome::Superseded);
		}
		self.in_flight.borrow_mut().take();
		let fetched = match fetched {
			Ok(fetched) => fetched,
			Err(e) => {
				let fallback = if self.model.borrow().is_some() {
					Phase::Displaying
				} else {
					Phase::Idle
				};
				*self.phase.borrow_mut() = fallback;
				return Err(e);
			}
		};

		let model = self.build(&request, fetched, threshold);
		let outcome = QueryOutcome::Displayed {
			nodes: model.nodes.len(),
			edges: model.edges.len(),
		};
		self.display(model, &request, threshold, limit);
		*self.last.borrow_mut() = Some(request);
		Ok(outcome)
	}

	fn build(&self, request: &Request, fetched: Fetched, threshold: f64) -> GraphModel {
		match (request, fetched) {
			(Request::Search { query }, Fetched::Results(results)) => {
				let anchor = Anchor {
					id: QUERY_ANCHOR_ID.into(),
					label: query.clone(),
					position: Position::ORIGIN,
					existing_shape: false,
				};
				let mut model = self.builder.enrichment(anchor, &results);
				self.layout.apply_radial(&mut model);
				model
			}
			(Request::Enrich { anchor, linear, .. }, Fetched::Results(results)) => {
				let results: Vec<_> = results
					.into_iter()
					.filter(|r| !is_self_hit(r, &anchor.id))
					.collect();
				if *linear {
					let mut model = self.builder.related(anchor.clone(), &results);
					self.layout.apply_linear(&mut model);
					model
				} else {
					let mut model = self.builder.enrichment(anchor.clone(), &results);
					self.layout.apply_radial(&mut model);
					model
				}
			}
			(_, Fetched::Graph(payload)) => {
				let mut model = self.builder.exploration(&payload, threshold);
				self.force.borrow_mut().layout(&mut model);
				model
			}
			(_, Fetched::Results(_)) => GraphModel::empty(request.mode()),
		}
	}

	fn display(&self, model: GraphModel, request: &Request, threshold: f64, limit: usize) {
		match model.mode {
			GraphMode::Enrichment => {
				self.scene.borrow_mut().clear();
				self.canvas.borrow_mut().render(&model);
			}
			GraphMode::Exploration => {
				self.canvas.borrow_mut().clear();
				self.scene.borrow_mut().render(&model);
			}
		}
		info!(
			"displaying {} nodes, {} edges for {:?}",
			model.nodes.len(),
			model.edges.len(),
			request.query_text()
		);
		*self.view.borrow_mut() = ViewState {
			query: request.query_text(),
			active_node_id: None,
			threshold,
			limit,
			mode: Some(model.mode),
		};
		*self.model.borrow_mut() = Some(model);
		*self.phase.borrow_mut() = Phase::Displaying;
	}
}

fn idle_view((threshold, limit): (f64, usize)) -> ViewState {
	ViewState {
		query: String::new(),
		active_node_id: None,
		threshold,
		limit,
		mode: None,
	}
}

/// Bounds the backend enforces for `mode`.
fn clamp_params(mode: GraphMode, threshold: f64, limit: usize) -> (f64, usize) {
	match mode {
		GraphMode::Enrichment => (
			threshold.clamp(0.0, 1.0),
			limit.clamp(SEARCH_LIMIT_RANGE.0, SEARCH_LIMIT_RANGE.1),
		),
		GraphMode::Exploration => (
			threshold.clamp(GRAPH_THRESHOLD_RANGE.0, GRAPH_THRESHOLD_RANGE.1),
			limit.clamp(GRAPH_LIMIT_RANGE.0, GRAPH_LIMIT_RANGE.1),
		),
	}
}

fn enrich_request(item: &dyn CanvasItem, linear: bool) -> Option<Request> {
	let text = item.text_content()?;
	let text = text.trim();
	if text.is_empty() {
		return None;
	}
	Some(Request::Enrich {
		anchor: Anchor {
			id: item.item_id().to_string(),
			label: text.chars().take(ANCHOR_LABEL_CHARS).collect(),
			position: item.position(),
			existing_shape: true,
		},
		text: text.to_string(),
		linear,
	})
}

/// The item's own indexed copy coming back as a hit.
fn is_self_hit(result: &SearchResult, item_id: &str) -> bool {
	result
		.metadata
		.get("shape_id")
		.and_then(|v| v.as_str())
		.is_some_and(|id| id == item_id)
}
