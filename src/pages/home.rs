use std::cell::RefCell;
use std::rc::Rc;

use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::client::{GRAPH_LIMIT_RANGE, SEARCH_LIMIT_RANGE, SearchClient};
use crate::components::board::{Board, NOTE_H};
use crate::components::force_graph::{ForceGraphCanvas, ForceGraphState};
use crate::config::Config;
use crate::controller::{InteractionController, Phase, QueryOutcome};
use crate::error::Result;
use crate::events::{EventSink, LogSink};
use crate::graph::GraphMode;
use crate::indexing::{IndexOutcome, IndexingGate};
use crate::surface::{CanvasEditor, MemoryCanvas, Shape, ShapeKind, ShapeProps, ShapeSpec};

const BOARD_W: f64 = 900.0;
const BOARD_H: f64 = 640.0;
/// Column user notes are stacked in, left of the result ring.
const NOTE_COLUMN_X: f64 = -560.0;

type Controller = InteractionController<SearchClient>;
type Gate = IndexingGate<SearchClient>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
	Search,
	Explore,
}

impl Mode {
	fn graph_mode(self) -> GraphMode {
		match self {
			Mode::Search => GraphMode::Enrichment,
			Mode::Explore => GraphMode::Exploration,
		}
	}

	fn limit_range(self) -> (usize, usize) {
		match self {
			Mode::Search => SEARCH_LIMIT_RANGE,
			Mode::Explore => GRAPH_LIMIT_RANGE,
		}
	}
}

/// Status line for a finished query; `None` leaves the line alone because a
/// newer query owns it.
fn describe(result: &Result<QueryOutcome>) -> Option<String> {
	match result {
		Ok(QueryOutcome::Displayed { nodes, edges }) => Some(format!("{nodes} results, {edges} links")),
		Ok(QueryOutcome::Superseded) => None,
		Ok(QueryOutcome::Skipped) => Some("Nothing to search for".into()),
		Err(e) => Some(e.to_string()),
	}
}

fn describe_phase(phase: &Phase) -> String {
	match phase {
		Phase::Selected(id) => format!("Selected {id}"),
		Phase::Querying => "Searching…".into(),
		Phase::Displaying => "Showing results".into(),
		Phase::Idle => "Ready".into(),
	}
}

fn is_user_shape(shape: &Shape) -> bool {
	shape.spec.props.binding.is_none() && shape.spec.kind.has_text()
}

/// What a click on a board shape asks for.
#[derive(Clone, Debug, PartialEq)]
enum Pick {
	Select(String),
	Enrich,
}

/// Result notes select their node, and so does the note the current view is
/// anchored on. Any other user note is enriched.
fn route_pick(shape: &Shape, anchor_id: Option<&str>) -> Pick {
	match &shape.spec.props.binding {
		Some(node_id) => Pick::Select(node_id.clone()),
		None if anchor_id == Some(shape.id.as_str()) => Pick::Select(shape.id.clone()),
		None => Pick::Enrich,
	}
}

/// Index new or edited user notes, then enrich them.
fn flush_changes(board: &Rc<RefCell<MemoryCanvas>>, gate: &Rc<Gate>, controller: &Rc<Controller>) {
	let changed = board.borrow_mut().take_changed();
	for shape in changed.into_iter().filter(is_user_shape) {
		let (gate, controller) = (gate.clone(), controller.clone());
		spawn_local(async move {
			if let IndexOutcome::Indexed(response) = gate.on_item_changed(&shape).await {
				log::info!("{} indexed as {}", shape.id, response.id);
			}
			controller.enrich_in_background(&shape).await;
		});
	}
}

/// Semantic canvas: notes on a board, enriched with related documents, and a
/// force-directed view of the whole corpus.
#[component]
pub fn Home() -> impl IntoView {
	let config = Config::from_document();
	let backend = Rc::new(SearchClient::new(&config));
	let sink: Rc<dyn EventSink> = Rc::new(LogSink);
	let board = Rc::new(RefCell::new(MemoryCanvas::new()));
	let scene = Rc::new(RefCell::new(ForceGraphState::new(&config.layout, BOARD_W, BOARD_H)));
	let controller = Rc::new(InteractionController::new(
		backend.clone(),
		config.clone(),
		Box::new(board.clone()),
		Box::new(scene.clone()),
		sink.clone(),
	));
	let gate = Rc::new(IndexingGate::new(backend, sink));

	let query = RwSignal::new(String::new());
	let note = RwSignal::new(String::new());
	let mode = RwSignal::new(Mode::Search);
	let threshold = RwSignal::new(config.default_score_threshold);
	let limit = RwSignal::new(config.default_limit);
	let status = RwSignal::new(String::from("Connecting…"));

	{
		let controller = controller.clone();
		spawn_local(async move {
			match controller.stats().await {
				Ok(stats) => status.set(format!(
					"{} documents in {}",
					stats.total_documents, stats.collection_name
				)),
				Err(e) => status.set(format!("Backend unavailable: {e}")),
			}
		});
	}

	let on_submit = {
		let controller = controller.clone();
		move |ev: SubmitEvent| {
			ev.prevent_default();
			let (controller, q, m) = (controller.clone(), query.get_untracked(), mode.get_untracked());
			status.set("Searching…".into());
			spawn_local(async move {
				let result = match m {
					Mode::Search => controller.search(&q).await,
					Mode::Explore => controller.explore(Some(&q)).await,
				};
				if let Some(line) = describe(&result) {
					status.set(line);
				}
			});
		}
	};

	let set_mode = {
		let controller = controller.clone();
		move |m: Mode| {
			mode.set(m);
			let (t, l) = controller.params(m.graph_mode());
			threshold.set(t);
			limit.set(l);
		}
	};
	let (search_tab, explore_tab) = (set_mode.clone(), set_mode);

	let on_threshold = {
		let controller = controller.clone();
		move |ev: leptos::ev::Event| {
			let Ok(value) = event_target_value(&ev).parse::<f64>() else {
				return;
			};
			let m = mode.get_untracked().graph_mode();
			if controller.view().mode != Some(m) {
				controller.set_params(m, value, limit.get_untracked());
				threshold.set(controller.params(m).0);
				return;
			}
			let controller = controller.clone();
			spawn_local(async move {
				let result = controller.set_threshold(value).await;
				threshold.set(controller.params(m).0);
				if let Some(line) = describe(&result) {
					status.set(line);
				}
			});
		}
	};

	let on_limit = {
		let controller = controller.clone();
		move |ev: leptos::ev::Event| {
			let Ok(value) = event_target_value(&ev).parse::<usize>() else {
				return;
			};
			let m = mode.get_untracked().graph_mode();
			if controller.view().mode != Some(m) {
				controller.set_params(m, threshold.get_untracked(), value);
				limit.set(controller.params(m).1);
				return;
			}
			let controller = controller.clone();
			spawn_local(async move {
				let result = controller.set_limit(value).await;
				limit.set(controller.params(m).1);
				if let Some(line) = describe(&result) {
					status.set(line);
				}
			});
		}
	};

	let on_add_note = {
		let (board, gate, controller) = (board.clone(), gate.clone(), controller.clone());
		move |ev: SubmitEvent| {
			ev.prevent_default();
			let text = note.get_untracked();
			if text.trim().is_empty() {
				return;
			}
			let count = board.borrow().shapes().iter().filter(|s| is_user_shape(s)).count();
			board.borrow_mut().create_shape(ShapeSpec {
				kind: ShapeKind::Note,
				x: NOTE_COLUMN_X,
				y: -BOARD_H / 2.0 + (NOTE_H + 20.0) * count as f64,
				props: ShapeProps {
					text,
					..Default::default()
				},
			});
			note.set(String::new());
			flush_changes(&board, &gate, &controller);
		}
	};

	let on_clear = {
		let (board, controller) = (board.clone(), controller.clone());
		move |_: leptos::ev::MouseEvent| {
			controller.clear();
			board.borrow_mut().deselect_all();
			status.set(describe_phase(&controller.phase()));
		}
	};

	let on_pick: Rc<dyn Fn(Option<Shape>)> = {
		let (board, controller) = (board.clone(), controller.clone());
		Rc::new(move |shape: Option<Shape>| {
			board.borrow_mut().deselect_all();
			let Some(shape) = shape else {
				status.set(describe_phase(&controller.select(None)));
				return;
			};
			match route_pick(&shape, controller.anchor_id().as_deref()) {
				Pick::Select(node_id) => status.set(describe_phase(&controller.select(Some(&node_id)))),
				Pick::Enrich => {
					board.borrow_mut().select(&shape.id);
					status.set("Finding related documents…".into());
					let controller = controller.clone();
					spawn_local(async move {
						controller.enrich_in_background(&shape).await;
						status.set(describe_phase(&controller.phase()));
					});
				}
			}
		})
	};

	let on_select: Rc<dyn Fn(Option<String>)> = {
		let controller = controller.clone();
		Rc::new(move |node_id: Option<String>| {
			status.set(describe_phase(&controller.select(node_id.as_deref())));
		})
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="semantic-canvas">
				<header class="toolbar">
					<div class="tabs">
						<button
							class:active=move || mode.get() == Mode::Search
							on:click=move |_| search_tab(Mode::Search)
						>
							"Search"
						</button>
						<button
							class:active=move || mode.get() == Mode::Explore
							on:click=move |_| explore_tab(Mode::Explore)
						>
							"Explore"
						</button>
					</div>
					<form on:submit=on_submit>
						<input
							type="search"
							placeholder="Search the corpus"
							prop:value=move || query.get()
							on:input=move |ev| query.set(event_target_value(&ev))
						/>
						<button type="submit">"Go"</button>
					</form>
					<label>
						"Threshold "
						{move || format!("{:.2}", threshold.get())}
						<input
							type="range"
							min="0"
							max="1"
							step="0.05"
							prop:value=move || threshold.get().to_string()
							on:change=on_threshold
						/>
					</label>
					<label>
						"Limit "
						<input
							type="number"
							min=move || mode.get().limit_range().0.to_string()
							max=move || mode.get().limit_range().1.to_string()
							prop:value=move || limit.get().to_string()
							on:change=on_limit
						/>
					</label>
					<button on:click=on_clear>"Clear"</button>
				</header>

				<div class="surfaces">
					<div style:display=move || if mode.get() == Mode::Search { "block" } else { "none" }>
						<Board board=board on_pick=on_pick width=BOARD_W height=BOARD_H />
						<form class="add-note" on:submit=on_add_note>
							<input
								type="text"
								placeholder="Write a note"
								prop:value=move || note.get()
								on:input=move |ev| note.set(event_target_value(&ev))
							/>
							<button type="submit">"Add note"</button>
						</form>
					</div>
					<div style:display=move || if mode.get() == Mode::Explore { "block" } else { "none" }>
						<ForceGraphCanvas
							state=scene
							on_select=on_select
							width=Some(BOARD_W)
							height=Some(BOARD_H)
						/>
					</div>
				</div>

				<p class="status">{move || status.get()}</p>
			</div>
		</ErrorBoundary>
	}
}
