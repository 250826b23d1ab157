use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::render;
use super::state::ForceGraphState;
use super::types::GraphData;

type SharedState = Rc<RefCell<Option<ForceGraphState>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

const FALLBACK_SIZE: (f64, f64) = (800.0, 600.0);

/// Canvas position of a mouse event.
fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Whether the frame loop continues. Once the canvas is disposed the frame
/// callback is handed to `defer` for release, since it must not be dropped
/// while it is still running.
fn keep_running<C: 'static>(
	alive: &AtomicBool,
	frame: &Rc<RefCell<Option<C>>>,
	defer: impl FnOnce(Box<dyn FnOnce()>),
) -> bool {
	if alive.load(Ordering::Relaxed) {
		return true;
	}
	let frame = frame.clone();
	defer(Box::new(move || {
		frame.borrow_mut().take();
	}));
	false
}

/// Force-directed canvas sized to its container. The simulation is rebuilt
/// whenever `data` changes.
#[component]
pub fn ForceGraphCanvas(#[prop(into)] data: Signal<GraphData>) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let alive = Arc::new(AtomicBool::new(true));

	let alive_cleanup = alive.clone();
	on_cleanup(move || alive_cleanup.store(false, Ordering::Relaxed));

	let state_init = state.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = canvas
			.parent_element()
			.map(|p| (p.client_width() as f64, p.client_height() as f64))
			.filter(|&(w, h)| w > 0.0 && h > 0.0)
			.unwrap_or(FALLBACK_SIZE);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			log::error!("Canvas 2d context unavailable");
			return;
		};
		*state_init.borrow_mut() = Some(ForceGraphState::new(&data.get_untracked(), w, h));

		let (state_anim, animate_inner, alive_anim) =
			(state_init.clone(), animate.clone(), alive.clone());
		*animate.borrow_mut() = Some(Closure::new(move || {
			let running = keep_running(&alive_anim, &animate_inner, |release| {
				spawn_local(async move { release() })
			});
			if !running {
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				if s.animation_running {
					s.tick(0.016);
				}
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_data = state.clone();
	Effect::new(move |_| {
		let snapshot = data.get();
		if let Some(ref mut s) = *state_data.borrow_mut() {
			s.load(&snapshot);
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.press(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_moved(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.release(false);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.release(true);
		}
	};

	let state_wh = state;
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.zoom_at(x, y, ev.delta_y());
		}
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

#[cfg(test)]
mod tests {
	use super::*;

	type Frame = Box<dyn Fn()>;

	#[test]
	fn live_loop_keeps_its_callback() {
		let alive = AtomicBool::new(true);
		let frame: Rc<RefCell<Option<Frame>>> = Rc::new(RefCell::new(Some(Box::new(|| {}))));
		assert!(keep_running(&alive, &frame, |_| panic!("released while alive")));
		assert!(frame.borrow().is_some());
	}

	#[test]
	fn stopped_loop_breaks_the_self_reference() {
		let alive = AtomicBool::new(false);
		let frame: Rc<RefCell<Option<Frame>>> = Rc::new(RefCell::new(None));
		let inner = frame.clone();
		*frame.borrow_mut() = Some(Box::new(move || {
			let _ = inner.borrow();
		}));
		assert_eq!(Rc::strong_count(&frame), 2);

		let mut deferred = None;
		assert!(!keep_running(&alive, &frame, |release| deferred = Some(release)));
		// still held until the deferred release runs
		assert!(frame.borrow().is_some());

		deferred.expect("release scheduled")();
		assert!(frame.borrow().is_none());
		assert_eq!(Rc::strong_count(&frame), 1);
	}
}
