use std::collections::HashMap;
use std::f32::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use crate::config::LayoutConfig;
use crate::graph::{GraphModel, Position};

const STEP: f32 = 0.016;
const NODE_MASS: f32 = 10.0;
const SEED_RADIUS: f32 = 100.0;

#[derive(Clone, Copy, Debug)]
struct Saved {
	x: f32,
	y: f32,
	pinned: bool,
}

/// Force-directed layout over the `force_graph` simulation, keyed by node id.
///
/// Edge user data is the similarity weight. Positions survive [`sync`]
/// for every id that is still present, so re-rendering an exploration view
/// updates in place instead of starting over.
///
/// [`sync`]: ForceLayout::sync
pub struct ForceLayout<N = ()> {
	graph: ForceGraph<N, f32>,
	config: LayoutConfig,
	ids: HashMap<String, DefaultNodeIdx>,
	names: HashMap<DefaultNodeIdx, String>,
	saved: HashMap<String, Saved>,
}

fn parameters(config: &LayoutConfig) -> SimulationParameters {
	SimulationParameters {
		force_charge: config.repulsion as f32,
		force_spring: config.spring as f32,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	}
}

impl<N> ForceLayout<N> {
	pub fn new(config: &LayoutConfig) -> Self {
		Self {
			graph: ForceGraph::new(parameters(config)),
			config: config.clone(),
			ids: HashMap::new(),
			names: HashMap::new(),
			saved: HashMap::new(),
		}
	}

	/// Replace the node and edge sets, keeping positions of known ids.
	pub fn sync(&mut self, nodes: Vec<(String, N)>, edges: &[(String, String, f64)]) {
		self.remember();
		let mut graph = ForceGraph::new(parameters(&self.config));
		let (mut ids, mut names) = (HashMap::new(), HashMap::new());
		let n = nodes.len();

		for (i, (id, user_data)) in nodes.into_iter().enumerate() {
			let Saved { x, y, pinned } = self.saved.get(&id).copied().unwrap_or_else(|| {
				let angle = i as f32 * 2.0 * PI / n as f32;
				Saved {
					x: SEED_RADIUS * angle.cos(),
					y: SEED_RADIUS * angle.sin(),
					pinned: false,
				}
			});
			let idx = graph.add_node(NodeData {
				x,
				y,
				mass: NODE_MASS,
				is_anchor: pinned,
				user_data,
			});
			names.insert(idx, id.clone());
			ids.insert(id, idx);
		}

		for (source, target, weight) in edges {
			if let (Some(&src), Some(&tgt)) = (ids.get(source), ids.get(target)) {
				graph.add_edge(src, tgt, EdgeData {
					user_data: *weight as f32,
					..Default::default()
				});
			}
		}

		self.saved.retain(|id, _| ids.contains_key(id));
		self.graph = graph;
		self.ids = ids;
		self.names = names;
	}

	/// Starting point for an id the next [`sync`](Self::sync) adds. Ignored
	/// for ids already laid out.
	pub fn seed(&mut self, id: &str, position: Position) {
		if self.ids.contains_key(id) {
			return;
		}
		self.saved.entry(id.to_string()).or_insert(Saved {
			x: position.x as f32,
			y: position.y as f32,
			pinned: false,
		});
	}

	fn remember(&mut self) {
		let names = &self.names;
		let saved = &mut self.saved;
		self.graph.visit_nodes(|node| {
			if let Some(id) = names.get(&node.index()) {
				saved.insert(id.clone(), Saved {
					x: node.x(),
					y: node.y(),
					pinned: node.data.is_anchor,
				});
			}
		});
	}

	/// One simulation step followed by the weighted link pass.
	pub fn step(&mut self, dt: f32) {
		self.graph.update(dt);
		self.pull_links();
	}

	pub fn settle(&mut self, steps: usize) {
		for _ in 0..steps {
			self.step(STEP);
		}
	}

	/// Springs in the simulation share one constant; this pass pulls each
	/// pair toward a rest length that shrinks as similarity grows, with a
	/// strength proportional to the weight.
	fn pull_links(&mut self) {
		let rest = self.config.link_distance as f32;
		let k = self.config.spring as f32;
		let mut shift: HashMap<DefaultNodeIdx, (f32, f32)> = HashMap::new();

		self.graph.visit_edges(|a, b, edge| {
			let (dx, dy) = (b.x() - a.x(), b.y() - a.y());
			let dist = (dx * dx + dy * dy).sqrt();
			if dist < 0.001 {
				return;
			}
			let w = edge.user_data.clamp(0.0, 1.0);
			let target = rest * (2.0 - w);
			let pull = (dist - target) / dist * k * w * 0.5;
			let sa = shift.entry(a.index()).or_insert((0.0, 0.0));
			sa.0 += dx * pull;
			sa.1 += dy * pull;
			let sb = shift.entry(b.index()).or_insert((0.0, 0.0));
			sb.0 -= dx * pull;
			sb.1 -= dy * pull;
		});

		self.graph.visit_nodes_mut(|node| {
			if node.data.is_anchor {
				return;
			}
			if let Some((sx, sy)) = shift.get(&node.index()) {
				node.data.x += sx;
				node.data.y += sy;
			}
		});
	}

	pub fn index_of(&self, id: &str) -> Option<DefaultNodeIdx> {
		self.ids.get(id).copied()
	}

	pub fn id_of(&self, idx: DefaultNodeIdx) -> Option<&str> {
		self.names.get(&idx).map(String::as_str)
	}

	pub fn position(&self, id: &str) -> Option<Position> {
		let idx = self.index_of(id)?;
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some(Position::new(node.x() as f64, node.y() as f64));
			}
		});
		found
	}

	pub fn positions(&self) -> HashMap<String, Position> {
		let mut out = HashMap::new();
		self.graph.visit_nodes(|node| {
			if let Some(id) = self.names.get(&node.index()) {
				out.insert(id.clone(), Position::new(node.x() as f64, node.y() as f64));
			}
		});
		out
	}

	/// Write current positions back into the model.
	pub fn apply(&self, model: &mut GraphModel) {
		let positions = self.positions();
		for node in &mut model.nodes {
			if let Some(p) = positions.get(&node.id) {
				node.position = *p;
			}
		}
	}

	/// Pin a node where it is, e.g. after a drag.
	pub fn pin(&mut self, idx: DefaultNodeIdx, x: f32, y: f32) {
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.x = x;
				node.data.y = y;
				node.data.is_anchor = true;
			}
		});
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	pub fn graph(&self) -> &ForceGraph<N, f32> {
		&self.graph
	}

	pub fn clear(&mut self) {
		self.graph = ForceGraph::new(parameters(&self.config));
		self.ids.clear();
		self.names.clear();
		self.saved.clear();
	}
}

impl ForceLayout<()> {
	/// Lay out a model: sync its nodes and edges, settle, write positions back.
	pub fn layout(&mut self, model: &mut GraphModel) {
		let nodes = model.nodes.iter().map(|n| (n.id.clone(), ())).collect();
		let edges: Vec<_> = model
			.edges
			.iter()
			.map(|e| (e.source.clone(), e.target.clone(), e.weight))
			.collect();
		self.sync(nodes, &edges);
		self.settle(self.config.settle_steps);
		self.apply(model);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{ColorTier, GraphEdge, GraphMode, GraphNode};

	fn model(ids: &[&str], edges: &[(&str, &str, f64)]) -> GraphModel {
		let mut model = GraphModel::empty(GraphMode::Exploration);
		model.nodes = ids
			.iter()
			.map(|id| GraphNode {
				id: id.to_string(),
				label: id.to_string(),
				score: 0.7,
				tier: ColorTier::Strong,
				url: String::new(),
				category: None,
				position: Position::ORIGIN,
			})
			.collect();
		model.edges = edges
			.iter()
			.map(|(s, t, w)| GraphEdge {
				source: s.to_string(),
				target: t.to_string(),
				weight: *w,
			})
			.collect();
		model
	}

	fn small_config() -> LayoutConfig {
		LayoutConfig {
			settle_steps: 20,
			..LayoutConfig::default()
		}
	}

	#[test]
	fn layout_writes_positions_for_every_node() {
		let mut layout: ForceLayout = ForceLayout::new(&small_config());
		let mut m = model(&["a", "b", "c"], &[("a", "b", 0.9), ("b", "c", 0.7)]);
		layout.layout(&mut m);
		assert_eq!(layout.len(), 3);
		assert!(m.nodes.iter().all(|n| n.position.x.is_finite() && n.position.y.is_finite()));
		let distinct: std::collections::HashSet<_> =
			m.nodes.iter().map(|n| (n.position.x.to_bits(), n.position.y.to_bits())).collect();
		assert_eq!(distinct.len(), 3);
	}

	#[test]
	fn resync_keeps_positions_of_known_ids() {
		let mut layout: ForceLayout = ForceLayout::new(&small_config());
		let edges = [("a".to_string(), "b".to_string(), 0.8)];
		layout.sync(vec![("a".into(), ()), ("b".into(), ())], &edges);
		layout.settle(10);
		let before = layout.position("a").unwrap();

		layout.sync(vec![("a".into(), ()), ("b".into(), ()), ("c".into(), ())], &edges);
		assert_eq!(layout.position("a"), Some(before));
		assert!(layout.position("c").is_some());

		layout.sync(vec![("c".into(), ())], &[]);
		assert_eq!(layout.position("a"), None);
		assert_eq!(layout.len(), 1);
	}

	#[test]
	fn seeded_ids_start_where_asked() {
		let mut layout: ForceLayout = ForceLayout::new(&small_config());
		layout.seed("a", Position::new(40.0, -25.0));
		layout.sync(vec![("a".into(), ()), ("b".into(), ())], &[]);
		assert_eq!(layout.position("a"), Some(Position::new(40.0, -25.0)));

		layout.seed("a", Position::new(0.0, 0.0));
		layout.sync(vec![("a".into(), ())], &[]);
		assert_eq!(layout.position("a"), Some(Position::new(40.0, -25.0)));
	}

	#[test]
	fn edges_to_unknown_ids_are_ignored() {
		let mut layout: ForceLayout = ForceLayout::new(&small_config());
		layout.sync(vec![("a".into(), ())], &[("a".into(), "ghost".into(), 0.9)]);
		let mut edges = 0;
		layout.graph().visit_edges(|_, _, _| edges += 1);
		assert_eq!(edges, 0);
	}
}
