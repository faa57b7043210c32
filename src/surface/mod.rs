//! Render targets.
//!
//! The core only talks to a canvas through [`CanvasEditor`] and reads items
//! through [`CanvasItem`]; any concrete editor binding that satisfies these
//! can host the board.

pub mod canvas;
pub mod memory;
pub mod scale;
pub mod scene;

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::graph::Position;

pub use canvas::{CanvasAdapter, RenderStats};
pub use memory::MemoryCanvas;
pub use scene::{SceneAdapter, SceneLink, SceneNode, SceneSurface, SizeMetric};

pub type ShapeId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
	Text,
	Note,
	Arrow,
}

impl ShapeKind {
	pub fn as_str(self) -> &'static str {
		match self {
			ShapeKind::Text => "text",
			ShapeKind::Note => "note",
			ShapeKind::Arrow => "arrow",
		}
	}

	/// Whether shapes of this kind carry extractable text.
	pub fn has_text(self) -> bool {
		matches!(self, ShapeKind::Text | ShapeKind::Note)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeProps {
	pub text: String,
	pub color: String,
	pub opacity: f64,
	/// Stroke width for arrows, font scale for text.
	pub size: f64,
	/// Arrow end point, absolute.
	pub end: Option<(f64, f64)>,
	/// Graph node or edge this shape renders, if any.
	pub binding: Option<String>,
}

impl Default for ShapeProps {
	fn default() -> Self {
		Self {
			text: String::new(),
			color: "black".into(),
			opacity: 1.0,
			size: 1.0,
			end: None,
			binding: None,
		}
	}
}

/// Parameters of a create/update call: `{type, x, y, props}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeSpec {
	#[serde(rename = "type")]
	pub kind: ShapeKind,
	pub x: f64,
	pub y: f64,
	pub props: ShapeProps,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shape {
	pub id: ShapeId,
	#[serde(flatten)]
	pub spec: ShapeSpec,
}

/// Capability set a canvas binding must provide.
pub trait CanvasEditor {
	fn create_shape(&mut self, spec: ShapeSpec) -> ShapeId;
	/// Returns false when no shape has that id.
	fn update_shape(&mut self, id: &str, spec: ShapeSpec) -> bool;
	fn delete_shape(&mut self, id: &str) -> bool;
	fn shape(&self, id: &str) -> Option<Shape>;
	fn shapes(&self) -> Vec<Shape>;
	fn selected_shapes(&self) -> Vec<Shape>;
	/// Shapes changed since the last call, oldest first.
	fn take_changed(&mut self) -> Vec<Shape>;
}

/// What the core needs to know about a canvas item.
pub trait CanvasItem {
	fn item_id(&self) -> &str;
	fn kind(&self) -> ShapeKind;
	/// `None` when the item exposes no text (capability mismatch).
	fn text_content(&self) -> Option<String>;
	fn position(&self) -> Position;
}

impl CanvasItem for Shape {
	fn item_id(&self) -> &str {
		&self.id
	}

	fn kind(&self) -> ShapeKind {
		self.spec.kind
	}

	fn text_content(&self) -> Option<String> {
		self.spec.kind.has_text().then(|| self.spec.props.text.clone())
	}

	fn position(&self) -> Position {
		Position::new(self.spec.x, self.spec.y)
	}
}

impl<E: CanvasEditor> CanvasEditor for Rc<RefCell<E>> {
	fn create_shape(&mut self, spec: ShapeSpec) -> ShapeId {
		self.borrow_mut().create_shape(spec)
	}

	fn update_shape(&mut self, id: &str, spec: ShapeSpec) -> bool {
		self.borrow_mut().update_shape(id, spec)
	}

	fn delete_shape(&mut self, id: &str) -> bool {
		self.borrow_mut().delete_shape(id)
	}

	fn shape(&self, id: &str) -> Option<Shape> {
		self.borrow().shape(id)
	}

	fn shapes(&self) -> Vec<Shape> {
		self.borrow().shapes()
	}

	fn selected_shapes(&self) -> Vec<Shape> {
		self.borrow().selected_shapes()
	}

	fn take_changed(&mut self) -> Vec<Shape> {
		self.borrow_mut().take_changed()
	}
}
