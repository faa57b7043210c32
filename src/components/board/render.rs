use web_sys::CanvasRenderingContext2d;

use super::BoardView;
use crate::surface::{CanvasEditor, MemoryCanvas, Shape, ShapeKind};

pub const NOTE_W: f64 = 200.0;
pub const NOTE_H: f64 = 90.0;
const LINE_CHARS: usize = 30;
const LINE_H: f64 = 16.0;

/// Fill for a note's named color.
fn swatch(color: &str) -> &'static str {
	match color {
		"green" => "#c5e8bd",
		"blue" => "#bcd6f0",
		"orange" => "#ffd7ad",
		"grey" => "#e2e2e2",
		_ => "#fff3a8",
	}
}

fn stroke(color: &str) -> &'static str {
	match color {
		"green" => "#2ca02c",
		"blue" => "#1f77b4",
		"orange" => "#ff7f0e",
		"grey" => "#7f7f7f",
		_ => "#3a3a3a",
	}
}

fn clip(line: &str) -> String {
	if line.chars().count() <= LINE_CHARS {
		return line.to_string();
	}
	let mut out: String = line.chars().take(LINE_CHARS - 1).collect();
	out.push('…');
	out
}

pub fn render(board: &MemoryCanvas, view: &BoardView, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#f7f7f2");
	ctx.fill_rect(0.0, 0.0, view.width, view.height);
	ctx.save();
	let _ = ctx.translate(view.x, view.y);
	let _ = ctx.scale(view.k, view.k);

	let shapes = board.shapes();
	let selected: Vec<_> = board.selected_shapes().into_iter().map(|s| s.id).collect();
	// arrows under notes, notes under labels
	for kind in [ShapeKind::Arrow, ShapeKind::Note, ShapeKind::Text] {
		for shape in shapes.iter().filter(|s| s.spec.kind == kind) {
			ctx.set_global_alpha(shape.spec.props.opacity);
			match kind {
				ShapeKind::Arrow => draw_arrow(ctx, shape),
				ShapeKind::Note => draw_note(ctx, shape, selected.contains(&shape.id), view.k),
				ShapeKind::Text => draw_text(ctx, shape),
			}
		}
	}
	ctx.set_global_alpha(1.0);
	ctx.restore();
}

fn draw_arrow(ctx: &CanvasRenderingContext2d, shape: &Shape) {
	let Some((x2, y2)) = shape.spec.props.end else {
		return;
	};
	let (x1, y1) = (shape.spec.x, shape.spec.y);
	ctx.set_stroke_style_str(stroke(&shape.spec.props.color));
	ctx.set_line_width(shape.spec.props.size);
	ctx.begin_path();
	ctx.move_to(x1, y1);
	ctx.line_to(x2, y2);
	ctx.stroke();
}

fn draw_note(ctx: &CanvasRenderingContext2d, shape: &Shape, selected: bool, k: f64) {
	let color = &shape.spec.props.color;
	let (left, top) = (shape.spec.x - NOTE_W / 2.0, shape.spec.y - NOTE_H / 2.0);
	ctx.set_fill_style_str(swatch(color));
	ctx.fill_rect(left, top, NOTE_W, NOTE_H);
	ctx.set_stroke_style_str(stroke(color));
	ctx.set_line_width(if selected { 3.0 / k } else { 1.0 / k });
	ctx.stroke_rect(left, top, NOTE_W, NOTE_H);

	ctx.set_fill_style_str("#1a1a1a");
	ctx.set_font("13px sans-serif");
	let lines = shape.spec.props.text.lines().take((NOTE_H / LINE_H) as usize - 1);
	for (i, line) in lines.enumerate() {
		let _ = ctx.fill_text(&clip(line), left + 8.0, top + 20.0 + i as f64 * LINE_H);
	}
}

fn draw_text(ctx: &CanvasRenderingContext2d, shape: &Shape) {
	ctx.set_fill_style_str(stroke(&shape.spec.props.color));
	ctx.set_font(&format!("bold {}px sans-serif", 14.0 * shape.spec.props.size));
	ctx.set_text_align("center");
	let _ = ctx.fill_text(&shape.spec.props.text, shape.spec.x, shape.spec.y);
	ctx.set_text_align("start");
}
