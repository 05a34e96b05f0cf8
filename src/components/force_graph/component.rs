use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::html::Canvas;
use leptos::prelude::*;
use log::{debug, error};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::render;
use super::state::ForceGraphState;
use super::types::GraphData;
use crate::graph::{GraphOverlay, LayoutSnapshot, NodeId};

/// Pointer travel (px) before a press counts as a drag rather than a click.
const CLICK_SLOP: f64 = 3.0;

type FrameClosure = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn local_point(canvas_ref: NodeRef<Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn parent_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|&(w, h)| w > 0.0 && h > 0.0)
		.unwrap_or((800.0, 600.0))
}

/// Canvas view of the quote graph. The physics engine lives here; everything
/// the user does is reported through the callbacks.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(into)] overlay: Signal<GraphOverlay>,
	/// Pointer entered a node (`Some`) or left it (`None`).
	#[prop(into)]
	on_hover: Callback<Option<NodeId>>,
	/// Click on a node, or on empty canvas.
	#[prop(into)]
	on_select: Callback<Option<NodeId>>,
	/// Right click on a node.
	#[prop(into)]
	on_collapse: Callback<NodeId>,
	/// Positions once the layout comes to rest or a drag ends.
	#[prop(into)]
	on_settled: Callback<LayoutSnapshot>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<Canvas>::new();
	let state: Rc<RefCell<Option<ForceGraphState>>> = Rc::new(RefCell::new(None));
	let size = Rc::new(Cell::new((0.0, 0.0)));
	let animate: FrameClosure = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, size_init, animate_init, resize_cb_init) =
		(state.clone(), size.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let graph = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};

		if animate_init.borrow().is_none() {
			let Some(window) = web_sys::window() else {
				error!("no window to draw the graph in");
				return;
			};
			let (w, h) = parent_size(&canvas);
			canvas.set_width(w as u32);
			canvas.set_height(h as u32);
			size_init.set((w, h));

			let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
				Ok(Some(ctx)) => match ctx.dyn_into() {
					Ok(ctx) => ctx,
					Err(_) => {
						error!("canvas context is not 2d");
						return;
					}
				},
				_ => {
					error!("canvas has no 2d context");
					return;
				}
			};

			let (state_resize, size_resize, canvas_resize) =
				(state_init.clone(), size_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let (nw, nh) = parent_size(&canvas_resize);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				size_resize.set((nw, nh));
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}

			let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
			*animate_init.borrow_mut() = Some(Closure::new(move || {
				let mut settled = None;
				let drawn = {
					let mut guard = state_anim.borrow_mut();
					match guard.as_mut() {
						Some(s) => overlay
							.try_with_untracked(|o| {
								if s.animation_running && s.tick(0.016) {
									settled = Some(LayoutSnapshot::capture(&*s));
								}
								render::render(s, o, &ctx);
							})
							.is_some(),
						None => true,
					}
				};
				if let Some(layout) = settled {
					debug!("layout settled");
					on_settled.run(layout);
				}
				// The overlay signal is gone once the component unmounts.
				if !drawn {
					return;
				}
				if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
					let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}));
			if let Some(ref cb) = *animate_init.borrow() {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}

		let (w, h) = size_init.get();
		let previous = state_init.borrow().as_ref().map(|s| s.transform.clone());
		*state_init.borrow_mut() = Some(ForceGraphState::new(&graph, w, h, previous));
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			let hit = overlay.with_untracked(|o| s.node_at_position(x, y, &o.hidden));
			if let Some(idx) = hit {
				s.drag.active = true;
				s.drag.moved = false;
				s.drag.node_idx = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				if let Some((nx, ny)) = s.center(idx) {
					s.drag.node_start_x = nx as f32;
					s.drag.node_start_y = ny as f32;
				}
				s.graph.visit_nodes(|node| {
					if node.index() == idx {
						s.drag.was_anchor = node.data.is_anchor;
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
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		let mut hover_change = None;
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if !s.drag.active {
				let hovered = overlay.with_untracked(|o| s.node_at_position(x, y, &o.hidden));
				if hovered != s.hover.node {
					hover_change = Some(hovered.and_then(|idx| s.node_id(idx)));
					s.set_hover(hovered);
				}
			}

			if s.drag.active {
				if (x - s.drag.start_x).hypot(y - s.drag.start_y) > CLICK_SLOP {
					s.drag.moved = true;
				}
				if let (true, Some(idx)) = (s.drag.moved, s.drag.node_idx) {
					let (dx, dy) = (
						(x - s.drag.start_x) / s.transform.k,
						(y - s.drag.start_y) / s.transform.k,
					);
					let (nx, ny) = (
						s.drag.node_start_x + dx as f32,
						s.drag.node_start_y + dy as f32,
					);
					s.graph.visit_nodes_mut(|node| {
						if node.index() == idx {
							node.data.x = nx;
							node.data.y = ny;
							node.data.is_anchor = true;
						}
					});
					s.refresh_centers();
				}
			} else if s.pan.active {
				if (x - s.pan.start_x).hypot(y - s.pan.start_y) > CLICK_SLOP {
					s.pan.moved = true;
				}
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
			}
		}
		if let Some(id) = hover_change {
			on_hover.run(id);
		}
	};

	enum Release {
		Select(Option<NodeId>),
		Dropped(LayoutSnapshot),
	}

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let mut release = None;
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			if s.drag.active {
				if let Some(idx) = s.drag.node_idx {
					if s.drag.moved {
						let anchor = s.drag.was_anchor;
						s.graph.visit_nodes_mut(|node| {
							if node.index() == idx {
								node.data.is_anchor = anchor;
							}
						});
						s.unsettle();
						release = Some(Release::Dropped(LayoutSnapshot::capture(&*s)));
					} else {
						release = Some(Release::Select(s.node_id(idx)));
					}
				}
			} else if s.pan.active && !s.pan.moved {
				release = Some(Release::Select(None));
			}
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
		}
		match release {
			Some(Release::Select(id)) => on_select.run(id),
			Some(Release::Dropped(layout)) => on_settled.run(layout),
			None => {}
		}
	};

	let state_cm = state.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		let hit = state_cm.borrow().as_ref().and_then(|s| {
			overlay
				.with_untracked(|o| s.node_at_position(x, y, &o.hidden))
				.and_then(|idx| s.node_id(idx))
		});
		if let Some(id) = hit {
			on_collapse.run(id);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		let mut was_hovering = false;
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
			was_hovering = s.hover.node.is_some();
			s.set_hover(None);
		}
		if was_hovering {
			on_hover.run(None);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (s.transform.k * factor).clamp(0.05, 10.0);
			let ratio = new_k / s.transform.k;
			s.transform.x = x - (x - s.transform.x) * ratio;
			s.transform.y = y - (y - s.transform.y) * ratio;
			s.transform.k = new_k;
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
			on:contextmenu=on_contextmenu
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
