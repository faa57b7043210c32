use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::ForceGraphState;

/// Pointer travel, in pixels, below which a press counts as a click.
const CLICK_SLOP: f64 = 3.0;

type Frame = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Animated exploration scene. Clicking a node reports its id, clicking the
/// background reports `None`; dragging pins a node, dragging the background
/// pans, scrolling zooms.
#[component]
pub fn ForceGraphCanvas(
	state: Rc<RefCell<ForceGraphState>>,
	on_select: Rc<dyn Fn(Option<String>)>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let animate: Frame = Rc::new(RefCell::new(None));
	let resize_cb: Frame = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let parent = |f: fn(&web_sys::Element) -> i32, fallback| {
			canvas
				.parent_element()
				.map(|p| f(&p) as f64)
				.filter(|v| *v > 0.0)
				.unwrap_or(fallback)
		};
		let (w, h) = match (fullscreen, window_size(&window)) {
			(true, Some(size)) => size,
			_ => (
				width.unwrap_or_else(|| parent(web_sys::Element::client_width, 800.0)),
				height.unwrap_or_else(|| parent(web_sys::Element::client_height, 600.0)),
			),
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			log::error!("scene canvas has no 2d context");
			return;
		};
		{
			let mut s = state_init.borrow_mut();
			s.resize(w, h);
			s.recenter();
		}

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				state_resize.borrow_mut().resize(nw, nh);
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			{
				let mut s = state_anim.borrow_mut();
				if s.animation_running {
					s.tick(0.016);
				}
				render::render(&s, &ctx);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut guard = state_md.borrow_mut();
		let s = &mut *guard;
		if let Some(idx) = s.node_at_position(x, y) {
			s.drag.active = true;
			s.drag.moved = false;
			s.drag.node_idx = Some(idx);
			s.drag.start_x = x;
			s.drag.start_y = y;
			let drag = &mut s.drag;
			s.layout.graph().visit_nodes(|node| {
				if node.index() == idx {
					drag.node_start_x = node.x();
					drag.node_start_y = node.y();
				}
			});
		} else {
			s.pan.active = true;
			s.pan.moved = false;
			s.pan.start_x = x;
			s.pan.start_y = y;
			s.pan.transform_start_x = s.transform.x;
			s.pan.transform_start_y = s.transform.y;
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut s = state_mm.borrow_mut();
		if !s.drag.active {
			let hovered = s.node_at_position(x, y);
			s.set_hover(hovered);
		}

		if s.drag.active {
			let (dx, dy) = (x - s.drag.start_x, y - s.drag.start_y);
			if dx.hypot(dy) > CLICK_SLOP {
				s.drag.moved = true;
			}
			if let (Some(idx), true) = (s.drag.node_idx, s.drag.moved) {
				let (nx, ny) = (
					s.drag.node_start_x + (dx / s.transform.k) as f32,
					s.drag.node_start_y + (dy / s.transform.k) as f32,
				);
				s.layout.pin(idx, nx, ny);
			}
		} else if s.pan.active {
			let (dx, dy) = (x - s.pan.start_x, y - s.pan.start_y);
			if dx.hypot(dy) > CLICK_SLOP {
				s.pan.moved = true;
			}
			s.transform.x = s.pan.transform_start_x + dx;
			s.transform.y = s.pan.transform_start_y + dy;
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		// release the borrow before the callback; selection writes back into the scene
		let clicked = {
			let mut s = state_mu.borrow_mut();
			let clicked = if s.drag.active && !s.drag.moved {
				Some(s.drag.node_idx.and_then(|idx| s.node_id(idx)))
			} else if s.pan.active && !s.pan.moved {
				Some(None)
			} else {
				None
			};
			s.drag = Default::default();
			s.pan.active = false;
			clicked
		};
		if let Some(node_id) = clicked {
			on_select(node_id);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		let mut s = state_ml.borrow_mut();
		s.drag = Default::default();
		s.pan.active = false;
		s.set_hover(None);
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut s = state_wh.borrow_mut();
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		let new_k = (s.transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / s.transform.k;
		s.transform.x = x - (x - s.transform.x) * ratio;
		s.transform.y = y - (y - s.transform.y) * ratio;
		s.transform.k = new_k;
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
