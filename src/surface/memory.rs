use std::collections::{BTreeSet, HashMap};

use super::{CanvasEditor, Shape, ShapeId, ShapeSpec};

/// In-process canvas: shapes in creation order plus selection and a
/// changed-shape queue. The browser board draws one of these.
#[derive(Clone, Debug, Default)]
pub struct MemoryCanvas {
	order: Vec<ShapeId>,
	shapes: HashMap<ShapeId, ShapeSpec>,
	selected: BTreeSet<ShapeId>,
	changed: Vec<ShapeId>,
	next_id: u64,
}

impl MemoryCanvas {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	pub fn select(&mut self, id: &str) {
		if self.shapes.contains_key(id) {
			self.selected.insert(id.to_string());
		}
	}

	pub fn deselect_all(&mut self) {
		self.selected.clear();
	}

	/// Topmost shape whose box contains `(x, y)`.
	pub fn hit(&self, x: f64, y: f64, half_w: f64, half_h: f64) -> Option<Shape> {
		self.order.iter().rev().find_map(|id| {
			let spec = &self.shapes[id];
			let inside = (spec.x - x).abs() <= half_w && (spec.y - y).abs() <= half_h;
			(inside && spec.kind.has_text()).then(|| Shape {
				id: id.clone(),
				spec: spec.clone(),
			})
		})
	}

	fn mark_changed(&mut self, id: &str) {
		if !self.changed.iter().any(|c| c == id) {
			self.changed.push(id.to_string());
		}
	}
}

impl CanvasEditor for MemoryCanvas {
	fn create_shape(&mut self, spec: ShapeSpec) -> ShapeId {
		self.next_id += 1;
		let id = format!("shape:{}", self.next_id);
		self.order.push(id.clone());
		self.shapes.insert(id.clone(), spec);
		self.mark_changed(&id);
		id
	}

	fn update_shape(&mut self, id: &str, spec: ShapeSpec) -> bool {
		match self.shapes.get_mut(id) {
			Some(existing) if *existing == spec => true,
			Some(existing) => {
				*existing = spec;
				self.mark_changed(id);
				true
			}
			None => false,
		}
	}

	fn delete_shape(&mut self, id: &str) -> bool {
		if self.shapes.remove(id).is_none() {
			return false;
		}
		self.order.retain(|o| o != id);
		self.selected.remove(id);
		self.changed.retain(|c| c != id);
		true
	}

	fn shape(&self, id: &str) -> Option<Shape> {
		self.shapes.get(id).map(|spec| Shape {
			id: id.to_string(),
			spec: spec.clone(),
		})
	}

	fn shapes(&self) -> Vec<Shape> {
		self.order.iter().filter_map(|id| self.shape(id)).collect()
	}

	fn selected_shapes(&self) -> Vec<Shape> {
		self.order
			.iter()
			.filter(|id| self.selected.contains(*id))
			.filter_map(|id| self.shape(id))
			.collect()
	}

	fn take_changed(&mut self) -> Vec<Shape> {
		std::mem::take(&mut self.changed)
			.into_iter()
			.filter_map(|id| self.shape(&id))
			.collect()
	}
}
