use std::collections::{HashMap, HashSet};

use log::debug;

use super::scale::edge_width;
use super::{CanvasEditor, ShapeId, ShapeKind, ShapeProps, ShapeSpec};
use crate::graph::{Anchor, EdgeKey, GraphEdge, GraphModel, GraphNode};

pub const DIMMED: f64 = 0.3;
const EDGE_COLOR: &str = "grey";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
	pub created: usize,
	pub updated: usize,
	pub removed: usize,
}

/// Draws a [`GraphModel`] onto a 2D canvas with create-or-update semantics
/// keyed by node id, so rendering the same view twice never duplicates
/// shapes.
pub struct CanvasAdapter {
	editor: Box<dyn CanvasEditor>,
	label: Option<(String, ShapeId)>,
	nodes: HashMap<String, ShapeId>,
	edges: HashMap<EdgeKey, ShapeId>,
}

impl CanvasAdapter {
	pub fn new(editor: Box<dyn CanvasEditor>) -> Self {
		Self {
			editor,
			label: None,
			nodes: HashMap::new(),
			edges: HashMap::new(),
		}
	}

	pub fn editor(&self) -> &dyn CanvasEditor {
		self.editor.as_ref()
	}

	pub fn editor_mut(&mut self) -> &mut dyn CanvasEditor {
		self.editor.as_mut()
	}

	pub fn shape_for(&self, node_id: &str) -> Option<&ShapeId> {
		self.nodes.get(node_id)
	}

	/// Graph node rendered by a shape, if the shape belongs to the view.
	pub fn node_for(&self, shape_id: &str) -> Option<&str> {
		self.nodes
			.iter()
			.find(|(_, s)| s.as_str() == shape_id)
			.map(|(n, _)| n.as_str())
	}

	pub fn render(&mut self, model: &GraphModel) -> RenderStats {
		let mut stats = RenderStats::default();
		let editor = self.editor.as_mut();

		let previous = self.label.take();
		match &model.anchor {
			Some(anchor) if !anchor.existing_shape => {
				let existing = match previous {
					Some((id, shape)) if id == anchor.id => Some(shape),
					Some((_, shape)) => {
						if editor.delete_shape(&shape) {
							stats.removed += 1;
						}
						None
					}
					None => None,
				};
				let shape = upsert(editor, existing, label_spec(anchor), &mut stats);
				self.label = Some((anchor.id.clone(), shape));
			}
			_ => {
				if let Some((_, shape)) = previous {
					if editor.delete_shape(&shape) {
						stats.removed += 1;
					}
				}
			}
		}

		let mut live_nodes = HashMap::with_capacity(model.nodes.len());
		for node in &model.nodes {
			let existing = self.nodes.remove(&node.id);
			let shape = upsert(editor, existing, node_spec(node), &mut stats);
			live_nodes.insert(node.id.clone(), shape);
		}
		for (_, shape) in self.nodes.drain() {
			if editor.delete_shape(&shape) {
				stats.removed += 1;
			}
		}
		self.nodes = live_nodes;

		let mut live_edges = HashMap::with_capacity(model.edges.len());
		for edge in &model.edges {
			let Some(spec) = edge_spec(model, edge) else {
				continue;
			};
			let key = edge.key();
			let existing = self.edges.remove(&key);
			let shape = upsert(editor, existing, spec, &mut stats);
			live_edges.insert(key, shape);
		}
		for (_, shape) in self.edges.drain() {
			if editor.delete_shape(&shape) {
				stats.removed += 1;
			}
		}
		self.edges = live_edges;

		debug!(
			"canvas render: {} created, {} updated, {} removed",
			stats.created, stats.updated, stats.removed
		);
		stats
	}

	/// Full opacity for `focus`, its one-hop neighbors and the edges touching
	/// it; everything else dimmed. `None` restores every shape.
	pub fn highlight(&mut self, model: &GraphModel, focus: Option<&str>) {
		let lit: HashSet<String> = match focus {
			Some(id) => {
				let mut lit = model.neighbors(id);
				lit.insert(id.to_string());
				lit.into_iter().collect()
			}
			None => HashSet::new(),
		};
		let opacity = |on: bool| if focus.is_none() || on { 1.0 } else { DIMMED };
		let editor = self.editor.as_mut();

		for (node_id, shape) in &self.nodes {
			set_opacity(editor, shape, opacity(lit.contains(node_id)));
		}
		if let Some((anchor_id, shape)) = &self.label {
			set_opacity(editor, shape, opacity(lit.contains(anchor_id)));
		}
		for edge in &model.edges {
			if let Some(shape) = self.edges.get(&edge.key()) {
				let on = focus.is_some_and(|f| edge.touches(f));
				set_opacity(editor, shape, opacity(on));
			}
		}
	}

	/// Remove every shape this adapter created.
	pub fn clear(&mut self) {
		let editor = self.editor.as_mut();
		let shapes = self
			.label
			.take()
			.map(|(_, s)| s)
			.into_iter()
			.chain(self.nodes.drain().map(|(_, s)| s))
			.chain(self.edges.drain().map(|(_, s)| s));
		for shape in shapes {
			editor.delete_shape(&shape);
		}
	}
}

fn upsert(
	editor: &mut dyn CanvasEditor,
	existing: Option<ShapeId>,
	spec: ShapeSpec,
	stats: &mut RenderStats,
) -> ShapeId {
	if let Some(id) = existing {
		if editor.update_shape(&id, spec.clone()) {
			stats.updated += 1;
			return id;
		}
	}
	stats.created += 1;
	editor.create_shape(spec)
}

fn set_opacity(editor: &mut dyn CanvasEditor, id: &str, opacity: f64) {
	if let Some(mut shape) = editor.shape(id) {
		shape.spec.props.opacity = opacity;
		editor.update_shape(id, shape.spec);
	}
}

fn label_spec(anchor: &Anchor) -> ShapeSpec {
	ShapeSpec {
		kind: ShapeKind::Text,
		x: anchor.position.x,
		y: anchor.position.y,
		props: ShapeProps {
			text: anchor.label.clone(),
			size: 1.5,
			binding: Some(anchor.id.clone()),
			..Default::default()
		},
	}
}

/// Title, formatted score and source reference.
pub fn node_text(node: &GraphNode) -> String {
	let mut text = format!("{}\n{:.2}", node.label, node.score);
	if !node.url.is_empty() {
		text.push('\n');
		text.push_str(&node.url);
	}
	text
}

fn node_spec(node: &GraphNode) -> ShapeSpec {
	ShapeSpec {
		kind: ShapeKind::Note,
		x: node.position.x,
		y: node.position.y,
		props: ShapeProps {
			text: node_text(node),
			color: node.tier.canvas_color().into(),
			binding: Some(node.id.clone()),
			..Default::default()
		},
	}
}

fn edge_spec(model: &GraphModel, edge: &GraphEdge) -> Option<ShapeSpec> {
	let from = model.position_of(&edge.source)?;
	let to = model.position_of(&edge.target)?;
	Some(ShapeSpec {
		kind: ShapeKind::Arrow,
		x: from.x,
		y: from.y,
		props: ShapeProps {
			color: EDGE_COLOR.into(),
			size: edge_width(edge.weight),
			end: Some((to.x, to.y)),
			binding: Some(format!("{}->{}", edge.source, edge.target)),
			..Default::default()
		},
	})
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;
	use crate::config::Config;
	use crate::client::SearchResult;
	use crate::graph::{GraphModelBuilder, Position};
	use crate::layout::LayoutEngine;
	use crate::surface::MemoryCanvas;

	fn view(scores: &[f64]) -> GraphModel {
		let config = Config::default();
		let results: Vec<_> = scores
			.iter()
			.enumerate()
			.map(|(i, score)| SearchResult {
				id: format!("doc-{i}"),
				text: String::new(),
				url: format!("https://example.com/{i}"),
				title: format!("Doc {i}"),
				score: *score,
				metadata: Default::default(),
			})
			.collect();
		let anchor = Anchor {
			id: "query".into(),
			label: "mycelial coordination".into(),
			position: Position::ORIGIN,
			existing_shape: false,
		};
		let mut model = GraphModelBuilder::new(&config).enrichment(anchor, &results);
		LayoutEngine::new(&config.layout).apply_radial(&mut model);
		model
	}

	fn adapter() -> (Rc<RefCell<MemoryCanvas>>, CanvasAdapter) {
		let board = Rc::new(RefCell::new(MemoryCanvas::new()));
		let adapter = CanvasAdapter::new(Box::new(board.clone()));
		(board, adapter)
	}

	#[test]
	fn first_render_creates_label_nodes_and_edges() {
		let (board, mut adapter) = adapter();
		let stats = adapter.render(&view(&[0.9, 0.7, 0.3]));
		assert_eq!(stats.created, 1 + 3 + 2);
		let shapes = board.borrow().shapes();
		let label = &shapes[0];
		assert_eq!(label.spec.kind, ShapeKind::Text);
		assert_eq!((label.spec.x, label.spec.y), (0.0, 0.0));
		let notes: Vec<_> = shapes.iter().filter(|s| s.spec.kind == ShapeKind::Note).collect();
		assert_eq!(notes[0].spec.props.text, "Doc 0\n0.90\nhttps://example.com/0");
		assert_eq!(notes[0].spec.props.color, "green");
	}

	#[test]
	fn rerender_updates_in_place() {
		let (board, mut adapter) = adapter();
		let model = view(&[0.9, 0.7, 0.3]);
		adapter.render(&model);
		let before = board.borrow().shapes();
		let stats = adapter.render(&model);
		assert_eq!(stats.created, 0);
		assert_eq!(stats.updated, 6);
		assert_eq!(board.borrow().shapes(), before);
	}

	#[test]
	fn superseded_nodes_are_removed() {
		let (board, mut adapter) = adapter();
		adapter.render(&view(&[0.9, 0.7, 0.3]));
		let stats = adapter.render(&view(&[0.9]));
		assert_eq!(stats.removed, 3);
		assert_eq!(board.borrow().len(), 3);
	}

	#[test]
	fn edge_width_follows_weight() {
		let (board, mut adapter) = adapter();
		adapter.render(&view(&[0.95, 0.65]));
		let arrows: Vec<_> = board
			.borrow()
			.shapes()
			.into_iter()
			.filter(|s| s.spec.kind == ShapeKind::Arrow)
			.collect();
		assert_eq!(arrows.len(), 2);
		assert!(arrows[0].spec.props.size > arrows[1].spec.props.size);
	}

	#[test]
	fn highlight_dims_everything_outside_the_neighborhood() {
		let (board, mut adapter) = adapter();
		let model = view(&[0.9, 0.7, 0.3]);
		adapter.render(&model);
		let opacity = |adapter: &CanvasAdapter, node: &str| {
			let id = adapter.shape_for(node).unwrap().clone();
			board.borrow().shape(&id).unwrap().spec.props.opacity
		};

		adapter.highlight(&model, Some("doc-2"));
		assert_eq!(opacity(&adapter, "doc-2"), 1.0);
		assert_eq!(opacity(&adapter, "doc-0"), DIMMED);

		adapter.highlight(&model, Some("doc-0"));
		assert_eq!(opacity(&adapter, "doc-0"), 1.0);
		assert_eq!(opacity(&adapter, "doc-1"), DIMMED);

		adapter.highlight(&model, None);
		assert_eq!(opacity(&adapter, "doc-1"), 1.0);
	}

	#[test]
	fn clear_removes_everything() {
		let (board, mut adapter) = adapter();
		adapter.render(&view(&[0.9, 0.7]));
		adapter.clear();
		assert!(board.borrow().is_empty());
	}
}
