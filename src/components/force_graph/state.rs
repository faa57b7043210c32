use std::collections::{BTreeSet, HashSet};

use force_graph::DefaultNodeIdx;

use crate::config::LayoutConfig;
use crate::layout::ForceLayout;
use crate::surface::{SceneLink, SceneNode, SceneSurface};

pub const HIT_RADIUS: f64 = 12.0;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub label: String,
	pub color: String,
	/// Radius in world units.
	pub size: f64,
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<DefaultNodeIdx>,
	pub neighbors: HashSet<DefaultNodeIdx>,
	pub highlight_t: f64,
	pub prev_node: Option<DefaultNodeIdx>,
	pub prev_neighbors: HashSet<DefaultNodeIdx>,
	delay_t: f64,
}

/// Selection pushed in from the controller; stays lit until replaced.
#[derive(Clone, Debug, Default)]
pub struct Selection {
	pub node: Option<DefaultNodeIdx>,
	pub neighbors: HashSet<DefaultNodeIdx>,
}

/// Live exploration scene: the simulation plus view and pointer state.
pub struct ForceGraphState {
	pub layout: ForceLayout<NodeInfo>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub selection: Selection,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub flow_time: f64,
	edges: Vec<(DefaultNodeIdx, DefaultNodeIdx)>,
}

impl ForceGraphState {
	pub fn new(config: &LayoutConfig, width: f64, height: f64) -> Self {
		Self {
			layout: ForceLayout::new(config),
			edges: Vec::new(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			selection: Selection::default(),
			width,
			height,
			animation_running: true,
			flow_time: 0.0,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.layout.graph().visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			// world-space, scales with zoom like nodes
			if (dx * dx + dy * dy).sqrt() < HIT_RADIUS.max(node.data.user_data.size) {
				found = Some(node.index());
			}
		});
		found
	}

	pub fn node_id(&self, idx: DefaultNodeIdx) -> Option<String> {
		self.layout.id_of(idx).map(str::to_string)
	}

	fn neighbors_of(&self, idx: DefaultNodeIdx) -> HashSet<DefaultNodeIdx> {
		self.edges
			.iter()
			.filter_map(|&(src, tgt)| {
				if src == idx {
					Some(tgt)
				} else if tgt == idx {
					Some(src)
				} else {
					None
				}
			})
			.collect()
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// keep the previous set for the fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			self.hover.neighbors = self.neighbors_of(idx);
		}
	}

	pub fn is_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.selection.node == Some(idx)
			|| self.selection.neighbors.contains(&idx)
			|| self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: DefaultNodeIdx) -> bool {
		self.selection.node == Some(idx)
			|| self.hover.node == Some(idx)
			|| self.hover.prev_node == Some(idx)
	}

	pub fn is_neighbor(&self, idx: DefaultNodeIdx) -> bool {
		self.selection.neighbors.contains(&idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.selection.node.is_some() || self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tick(&mut self, dt: f32) {
		self.layout.step(dt);
		self.flow_time += dt as f64;

		let lit = self.hover.node.is_some() || self.selection.node.is_some();
		let (target, delay, speed) = if lit { (1.0, 0.08, 1.8) } else { (0.0, 0.0, 1.26) };

		if lit {
			self.hover.delay_t = (self.hover.delay_t + dt as f64).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Recenter the view on the origin, e.g. after the first layout.
	pub fn recenter(&mut self) {
		self.transform.x = self.width / 2.0;
		self.transform.y = self.height / 2.0;
	}
}

impl SceneSurface for ForceGraphState {
	fn set_graph_data(&mut self, nodes: Vec<SceneNode>, links: Vec<SceneLink>) {
		for node in &nodes {
			self.layout.seed(&node.id, node.position);
		}
		let nodes = nodes
			.into_iter()
			.map(|n| {
				let info = NodeInfo {
					label: n.label,
					color: n.color,
					size: n.size,
				};
				(n.id, info)
			})
			.collect();
		let links: Vec<_> = links
			.into_iter()
			.map(|l| (l.source, l.target, l.weight))
			.collect();
		self.layout.sync(nodes, &links);

		self.edges = links
			.iter()
			.filter_map(|(s, t, _)| Some((self.layout.index_of(s)?, self.layout.index_of(t)?)))
			.collect();
		self.hover = HoverState::default();
		self.selection = Selection::default();
		self.drag = DragState::default();
		self.animation_running = true;
	}

	fn set_highlight(&mut self, focus: Option<&str>, neighbors: &BTreeSet<String>) {
		self.selection = Selection {
			node: focus.and_then(|id| self.layout.index_of(id)),
			neighbors: neighbors
				.iter()
				.filter_map(|id| self.layout.index_of(id))
				.collect(),
		};
		if self.selection.node.is_none() {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}
	}

	fn clear(&mut self) {
		self.layout.clear();
		self.edges.clear();
		self.hover = HoverState::default();
		self.selection = Selection::default();
		self.drag = DragState::default();
		self.pan = PanState::default();
	}
}
