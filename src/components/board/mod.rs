//! The 2D board: draws a [`MemoryCanvas`] and reports clicks on its shapes.

mod render;

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use crate::surface::{MemoryCanvas, Shape};

pub use render::{NOTE_H, NOTE_W};

const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Debug)]
pub struct BoardView {
	pub x: f64,
	pub y: f64,
	pub k: f64,
	pub width: f64,
	pub height: f64,
}

impl BoardView {
	fn new(width: f64, height: f64) -> Self {
		Self {
			x: width / 2.0,
			y: height / 2.0,
			k: 0.75,
			width,
			height,
		}
	}

	pub fn screen_to_board(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}
}

#[derive(Clone, Debug, Default)]
struct Press {
	active: bool,
	moved: bool,
	start_x: f64,
	start_y: f64,
	view_start_x: f64,
	view_start_y: f64,
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Board canvas. A click reports the topmost note or label under the
/// pointer, or `None` for empty space; dragging pans, scrolling zooms.
#[component]
pub fn Board(
	board: Rc<RefCell<MemoryCanvas>>,
	on_pick: Rc<dyn Fn(Option<Shape>)>,
	#[prop(default = 900.0)] width: f64,
	#[prop(default = 640.0)] height: f64,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let view = Rc::new(RefCell::new(BoardView::new(width, height)));
	let press = Rc::new(RefCell::new(Press::default()));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (board_anim, view_anim, animate_init) = (board.clone(), view.clone(), animate.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		canvas.set_width(width as u32);
		canvas.set_height(height as u32);
		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			log::error!("board canvas has no 2d context");
			return;
		};

		let (board, view, animate_inner) = (board_anim.clone(), view_anim.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			render::render(&board.borrow(), &view.borrow(), &ctx);
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let (Some(cb), Some(win)) = (&*animate_init.borrow(), web_sys::window()) {
			let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let (view_md, press_md) = (view.clone(), press.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let view = view_md.borrow();
		*press_md.borrow_mut() = Press {
			active: true,
			moved: false,
			start_x: x,
			start_y: y,
			view_start_x: view.x,
			view_start_y: view.y,
		};
	};

	let (view_mm, press_mm) = (view.clone(), press.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut press = press_mm.borrow_mut();
		if !press.active {
			return;
		}
		let (dx, dy) = (x - press.start_x, y - press.start_y);
		if dx.hypot(dy) > CLICK_SLOP {
			press.moved = true;
		}
		let mut view = view_mm.borrow_mut();
		view.x = press.view_start_x + dx;
		view.y = press.view_start_y + dy;
	};

	let (view_mu, press_mu, board_mu) = (view.clone(), press.clone(), board.clone());
	let on_mouseup = move |ev: MouseEvent| {
		let clicked = std::mem::take(&mut *press_mu.borrow_mut());
		if !clicked.active || clicked.moved {
			return;
		}
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let (bx, by) = view_mu.borrow().screen_to_board(x, y);
		// temporary borrow; the pick handler renders into the board
		let hit = board_mu.borrow().hit(bx, by, NOTE_W / 2.0, NOTE_H / 2.0);
		on_pick(hit);
	};

	let press_ml = press.clone();
	let on_mouseleave = move |_: MouseEvent| {
		*press_ml.borrow_mut() = Press::default();
	};

	let view_wh = view.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut view = view_wh.borrow_mut();
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		let new_k = (view.k * factor).clamp(0.1, 5.0);
		let ratio = new_k / view.k;
		view.x = x - (x - view.x) * ratio;
		view.y = y - (y - view.y) * ratio;
		view.k = new_k;
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="board-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: default;"
		/>
	}
}
