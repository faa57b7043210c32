mod common;

use common::{harness, note, result};
use semantic_canvas::client::{BackendEdge, BackendNode, GraphPayload};
use semantic_canvas::controller::{Phase, QueryOutcome};
use semantic_canvas::events::EventKind;
use semantic_canvas::graph::{GraphMode, Position};
use semantic_canvas::surface::{CanvasEditor, ShapeKind};
use serde_json::json;

fn ten_results() -> Vec<semantic_canvas::client::SearchResult> {
	[0.95, 0.91, 0.84, 0.78, 0.7, 0.66, 0.58, 0.5, 0.41, 0.3]
		.iter()
		.enumerate()
		.map(|(i, score)| result(&format!("r{i}"), *score))
		.collect()
}

fn corpus() -> GraphPayload {
	let node = |id: &str| BackendNode {
		id: id.into(),
		title: format!("Title {id}"),
		..Default::default()
	};
	let edge = |s: &str, t: &str, w: f64| BackendEdge {
		source: s.into(),
		target: t.into(),
		weight: w,
	};
	GraphPayload {
		nodes: vec![node("a"), node("b"), node("c"), node("d")],
		edges: vec![
			edge("a", "b", 0.9),
			edge("b", "c", 0.72),
			edge("c", "d", 0.61),
			edge("a", "d", 0.45),
		],
		node_count: 4,
		edge_count: 4,
	}
}

#[tokio::test]
async fn search_places_results_on_a_ring_around_the_query_label() {
	let h = harness();
	h.backend.with_results("mycelial coordination", ten_results());

	let outcome = h.controller.search("mycelial coordination").await.unwrap();
	assert_eq!(outcome, QueryOutcome::Displayed { nodes: 10, edges: 6 });
	assert_eq!(h.controller.phase(), Phase::Displaying);

	let shapes = h.board.borrow().shapes();
	let label = shapes.iter().find(|s| s.spec.kind == ShapeKind::Text).unwrap();
	assert_eq!((label.spec.x, label.spec.y), (0.0, 0.0));
	assert_eq!(label.spec.props.text, "mycelial coordination");

	let notes: Vec<_> = shapes.iter().filter(|s| s.spec.kind == ShapeKind::Note).collect();
	assert_eq!(notes.len(), 10);
	for n in &notes {
		let r = n.spec.x.hypot(n.spec.y);
		assert!((r - 300.0).abs() < 1e-9, "note at radius {r}");
	}
	let colors: Vec<_> = notes.iter().map(|n| n.spec.props.color.as_str()).collect();
	assert_eq!(
		colors,
		["green", "green", "green", "blue", "blue", "blue", "orange", "orange", "orange", "grey"]
	);
	let arrows = shapes.iter().filter(|s| s.spec.kind == ShapeKind::Arrow).count();
	assert_eq!(arrows, 6);

	let view = h.controller.view();
	assert_eq!(view.query, "mycelial coordination");
	assert_eq!(view.mode, Some(GraphMode::Enrichment));
	let (query, options) = h.backend.search_calls.borrow()[0].clone();
	assert_eq!(query, "mycelial coordination");
	assert_eq!((options.limit, options.score_threshold), (10, 0.5));
}

#[tokio::test]
async fn empty_query_is_rejected_without_a_request() {
	let h = harness();
	let err = h.controller.search("   ").await.unwrap_err();
	assert!(matches!(err, semantic_canvas::Error::Validation(_)));
	assert_eq!(h.backend.search_count(), 0);
	assert_eq!(h.controller.phase(), Phase::Idle);
}

#[tokio::test]
async fn textless_item_is_a_no_op() {
	let h = harness();
	let empty = note("shape:1", "", Position::ORIGIN);
	assert_eq!(h.controller.enrich(&empty).await.unwrap(), QueryOutcome::Skipped);
	assert_eq!(h.controller.enrich(&common::arrow("shape:2")).await.unwrap(), QueryOutcome::Skipped);
	assert_eq!(h.backend.search_count(), 0);
	assert!(h.board.borrow().is_empty());
	assert_eq!(h.controller.phase(), Phase::Idle);
}

#[tokio::test]
async fn enrichment_anchors_on_the_item_and_skips_its_own_copy() {
	let h = harness();
	let item = note("shape:4", "Mycelial networks share nutrients", Position::new(100.0, -50.0));
	let mut own = result("own", 0.99);
	own.metadata.insert("shape_id".into(), json!("shape:4"));
	h.backend.with_results(
		"Mycelial networks share nutrients",
		vec![own, result("r0", 0.81), result("r1", 0.62)],
	);

	let outcome = h.controller.enrich(&item).await.unwrap();
	assert_eq!(outcome, QueryOutcome::Displayed { nodes: 2, edges: 2 });

	let shapes = h.board.borrow().shapes();
	assert!(shapes.iter().all(|s| s.spec.kind != ShapeKind::Text));
	for n in shapes.iter().filter(|s| s.spec.kind == ShapeKind::Note) {
		let r = (n.spec.x - 100.0).hypot(n.spec.y + 50.0);
		assert!((r - 300.0).abs() < 1e-9);
	}
	let model = h.controller.model();
	let model = model.as_ref().unwrap();
	assert!(model.edges.iter().all(|e| e.source == "shape:4"));
}

#[tokio::test]
async fn related_lays_results_out_in_a_row() {
	let h = harness();
	let item = note("shape:1", "Token engineering for public goods", Position::new(0.0, 40.0));
	h.backend.with_results(
		"Token engineering for public goods",
		vec![result("r0", 0.9), result("r1", 0.7), result("r2", 0.5)],
	);
	let outcome = h.controller.related(&item).await.unwrap();
	assert_eq!(outcome, QueryOutcome::Displayed { nodes: 3, edges: 3 });

	let model = h.controller.model();
	let model = model.as_ref().unwrap();
	let xs: Vec<_> = model.nodes.iter().map(|n| n.position.x).collect();
	assert_eq!(xs, vec![0.0, 250.0, 500.0]);
	assert!(model.nodes.iter().all(|n| n.position.y == 190.0));

	// every hit is linked, including the one under the enrichment threshold
	let targets: Vec<_> = model.edges.iter().map(|e| e.target.as_str()).collect();
	assert_eq!(targets, vec!["r0", "r1", "r2"]);
	assert!(model.edges.iter().all(|e| e.source == "shape:1"));
	let arrows = h.board.borrow().shapes().iter().filter(|s| s.spec.kind == ShapeKind::Arrow).count();
	assert_eq!(arrows, 3);
}

#[tokio::test]
async fn a_newer_query_wins_over_a_slower_older_one() {
	let h = harness();
	let first = h.backend.park_search("first");
	h.backend.with_results("second", vec![result("s0", 0.9)]);

	let (older, newer) = tokio::join!(h.controller.search("first"), async {
		let outcome = h.controller.search("second").await;
		let _ = first.send(Ok(vec![result("f0", 0.9), result("f1", 0.8)]));
		outcome
	});

	assert_eq!(older.unwrap(), QueryOutcome::Superseded);
	assert_eq!(newer.unwrap(), QueryOutcome::Displayed { nodes: 1, edges: 1 });
	assert_eq!(h.controller.view().query, "second");
	let model = h.controller.model();
	let ids: Vec<_> = model.as_ref().unwrap().nodes.iter().map(|n| n.id.clone()).collect();
	assert_eq!(ids, vec!["s0"]);
	assert_eq!(h.board.borrow().shapes().iter().filter(|s| s.spec.kind == ShapeKind::Note).count(), 1);
}

#[tokio::test]
async fn a_superseded_request_is_aborted_not_awaited() {
	let h = harness();
	let slow = h.backend.park_search("slow");
	h.backend.with_results("fast", vec![result("s0", 0.9)]);

	let (older, newer) = tokio::join!(h.controller.search("slow"), h.controller.search("fast"));
	assert_eq!(older.unwrap(), QueryOutcome::Superseded);
	assert_eq!(newer.unwrap(), QueryOutcome::Displayed { nodes: 1, edges: 1 });
	// the slow request's future was dropped along with its pending response
	assert!(slow.is_closed());
	assert_eq!(h.controller.view().query, "fast");
}

#[tokio::test]
async fn a_failure_after_being_superseded_is_discarded() {
	let h = harness();
	let first = h.backend.park_search("first");
	h.backend.with_results("second", vec![result("s0", 0.9)]);

	let (older, _) = tokio::join!(h.controller.search("first"), async {
		let outcome = h.controller.search("second").await;
		drop(first);
		outcome
	});
	assert_eq!(older.unwrap(), QueryOutcome::Superseded);
	assert_eq!(h.controller.phase(), Phase::Displaying);
}

#[tokio::test]
async fn new_query_replaces_the_previous_view() {
	let h = harness();
	h.backend.with_results("one", ten_results());
	h.backend.with_results("two", vec![result("x", 0.9)]);
	h.controller.search("one").await.unwrap();
	h.controller.search("two").await.unwrap();

	let shapes = h.board.borrow().shapes();
	// label, one note, one arrow
	assert_eq!(shapes.len(), 3);
	assert_eq!(shapes.iter().find(|s| s.spec.kind == ShapeKind::Text).unwrap().spec.props.text, "two");
}

#[tokio::test]
async fn selection_lights_the_one_hop_neighborhood() {
	let h = harness();
	h.backend.with_results("q", vec![result("r0", 0.9), result("r1", 0.7), result("r2", 0.3)]);
	h.controller.search("q").await.unwrap();

	let opacity = |node: &str| {
		let shape = h.controller.canvas().shape_for(node).unwrap().clone();
		h.board.borrow().shape(&shape).unwrap().spec.props.opacity
	};

	assert_eq!(h.controller.select(Some("r0")), Phase::Selected("r0".into()));
	assert_eq!(h.controller.view().active_node_id.as_deref(), Some("r0"));
	assert_eq!(opacity("r0"), 1.0);
	assert_eq!(opacity("r1"), 0.3);
	assert_eq!(opacity("r2"), 0.3);

	assert_eq!(h.controller.select(Some("r0")), Phase::Displaying);
	assert_eq!(opacity("r1"), 1.0);

	h.controller.select(Some("r1"));
	assert_eq!(h.controller.select(None), Phase::Displaying);
	assert_eq!(h.controller.view().active_node_id, None);
	assert_eq!(opacity("r0"), 1.0);

	assert_eq!(h.controller.select(Some("not-in-view")), Phase::Displaying);
}

#[tokio::test]
async fn the_anchor_item_can_be_selected() {
	let h = harness();
	let item = note("shape:4", "Mycelial networks share nutrients", Position::ORIGIN);
	h.backend.with_results(
		"Mycelial networks share nutrients",
		vec![result("r0", 0.81), result("r1", 0.62), result("r2", 0.2)],
	);
	h.controller.enrich(&item).await.unwrap();
	assert_eq!(h.controller.anchor_id().as_deref(), Some("shape:4"));

	assert_eq!(h.controller.select(Some("shape:4")), Phase::Selected("shape:4".into()));
	let opacity = |node: &str| {
		let shape = h.controller.canvas().shape_for(node).unwrap().clone();
		h.board.borrow().shape(&shape).unwrap().spec.props.opacity
	};
	assert_eq!(opacity("r0"), 1.0);
	assert_eq!(opacity("r1"), 1.0);
	assert_eq!(opacity("r2"), 0.3);
}

#[tokio::test]
async fn select_before_any_view_does_nothing() {
	let h = harness();
	assert_eq!(h.controller.select(Some("r0")), Phase::Idle);
}

#[tokio::test]
async fn exploration_drops_edges_below_the_threshold() {
	let h = harness();
	*h.backend.graph.borrow_mut() = corpus();

	let outcome = h.controller.explore(None).await.unwrap();
	assert_eq!(outcome, QueryOutcome::Displayed { nodes: 4, edges: 3 });
	{
		let scene = h.scene.borrow();
		assert_eq!(scene.nodes.len(), 4);
		assert!(scene.links.iter().all(|l| l.weight >= 0.6));
		assert!(scene.nodes.iter().all(|n| n.position.x.is_finite()));
	}
	let options = h.backend.graph_calls.borrow()[0].clone();
	assert_eq!((options.query, options.limit, options.similarity_threshold), (None, 100, 0.6));
	assert!(h.board.borrow().is_empty());

	let outcome = h.controller.set_threshold(0.8).await.unwrap();
	assert_eq!(outcome, QueryOutcome::Displayed { nodes: 4, edges: 1 });
	assert_eq!(h.backend.graph_calls.borrow().len(), 2);
	assert!(h.scene.borrow().links.iter().all(|l| l.weight >= 0.8));
	assert_eq!(h.controller.view().threshold, 0.8);
}

#[tokio::test]
async fn exploration_selection_goes_to_the_scene() {
	let h = harness();
	*h.backend.graph.borrow_mut() = corpus();
	h.controller.explore(Some("commons")).await.unwrap();

	h.controller.select(Some("b"));
	let scene = h.scene.borrow();
	assert_eq!(scene.focus.as_deref(), Some("b"));
	let lit: Vec<_> = scene.lit.iter().cloned().collect();
	assert_eq!(lit, vec!["a".to_string(), "c".to_string()]);
}

#[tokio::test]
async fn changing_the_limit_re_runs_the_last_search() {
	let h = harness();
	assert_eq!(h.controller.set_limit(25).await.unwrap(), QueryOutcome::Skipped);
	assert_eq!(h.backend.search_count(), 0);

	h.backend.with_results("q", vec![result("r0", 0.9)]);
	h.controller.search("q").await.unwrap();
	h.controller.set_limit(40).await.unwrap();
	let calls = h.backend.search_calls.borrow();
	assert_eq!(calls.len(), 2);
	assert_eq!(calls[1].1.limit, 40);
}

#[tokio::test]
async fn parameters_are_kept_within_backend_bounds() {
	let h = harness();
	h.backend.with_results("q", vec![result("r0", 0.9)]);
	h.controller.search("q").await.unwrap();
	h.controller.set_limit(300).await.unwrap();
	assert_eq!(h.controller.view().limit, 100);
	assert_eq!(h.backend.search_calls.borrow()[1].1.limit, 100);

	*h.backend.graph.borrow_mut() = corpus();
	h.controller.explore(None).await.unwrap();
	h.controller.set_threshold(0.99).await.unwrap();
	h.controller.set_limit(2).await.unwrap();
	let view = h.controller.view();
	assert_eq!((view.threshold, view.limit), (0.95, 10));
	let last = h.backend.graph_calls.borrow().last().cloned().unwrap();
	assert_eq!((last.similarity_threshold, last.limit), (0.95, 10));
	assert_eq!(h.controller.params(GraphMode::Exploration), (0.95, 10));
}

#[tokio::test]
async fn backend_failure_surfaces_and_leaves_no_view() {
	let h = harness();
	h.backend.fail_search.set(true);
	let err = h.controller.search("q").await.unwrap_err();
	assert!(err.is_network());
	assert_eq!(h.controller.phase(), Phase::Idle);
	assert!(h.board.borrow().is_empty());
}

#[tokio::test]
async fn background_enrichment_reports_failures_to_the_sink() {
	let h = harness();
	h.backend.fail_search.set(true);
	let item = note("shape:9", "Regenerative finance and the commons", Position::ORIGIN);
	h.controller.enrich_in_background(&item).await;
	assert_eq!(h.sink.count(EventKind::EnrichFailed), 1);
	assert_eq!(h.sink.events()[0].item_id.as_deref(), Some("shape:9"));
}

#[tokio::test]
async fn clear_empties_both_surfaces_and_discards_in_flight_responses() {
	let h = harness();
	h.backend.with_results("q", ten_results());
	h.controller.search("q").await.unwrap();
	assert!(!h.board.borrow().is_empty());

	let late = h.backend.park_search("late");
	let (outcome, _) = tokio::join!(h.controller.search("late"), async {
		h.controller.clear();
		let _ = late.send(Ok(vec![result("z", 0.9)]));
	});
	assert_eq!(outcome.unwrap(), QueryOutcome::Superseded);
	assert!(h.board.borrow().is_empty());
	assert!(h.scene.borrow().nodes.is_empty());
	assert_eq!(h.controller.phase(), Phase::Idle);
	assert!(h.controller.model().is_none());
}
