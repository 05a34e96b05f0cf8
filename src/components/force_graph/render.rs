use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{CHAR_WIDTH, ForceGraphState, LABEL_PADDING, NODE_HEIGHT, NodeInfo};
use crate::graph::GraphOverlay;
use crate::graph::visibility::{BadgeKind, badge_placements};

const ARMED_RING: &str = "#ff7f0e";
const SELECTED_RING: &str = "#ffffff";
const COUNT_BADGE: &str = "#d62728";
const HIDDEN_BADGE: &str = "#555555";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &ForceGraphState, overlay: &GraphOverlay, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, overlay, ctx);
	draw_nodes(state, overlay, ctx);
	draw_badges(state, overlay, ctx);
	ctx.restore();
}

/// Distance from a box center to its border along the unit vector `(ux, uy)`.
fn box_exit(width: f64, ux: f64, uy: f64) -> f64 {
	let tx = if ux.abs() > f64::EPSILON {
		(width / 2.0) / ux.abs()
	} else {
		f64::INFINITY
	};
	let ty = if uy.abs() > f64::EPSILON {
		(NODE_HEIGHT / 2.0) / uy.abs()
	} else {
		f64::INFINITY
	};
	tx.min(ty)
}

fn draw_edges(state: &ForceGraphState, overlay: &GraphOverlay, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, arrow_size) = (1.5 / k.max(0.2), 8.0 / k.max(0.2));
	let t = ease_out_cubic(state.hover.highlight_t);

	for edge in &state.edges {
		if !overlay.shown_edges.contains(&edge.id) {
			continue;
		}
		let (Some((x1, y1)), Some((x2, y2))) =
			(state.center(edge.source), state.center(edge.target))
		else {
			continue;
		};
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		let is_highlighted = state.is_highlighted(edge.source) && state.is_highlighted(edge.target);
		let (edge_alpha, arrow_alpha, width) = if is_highlighted {
			(0.6 + 0.3 * t, 0.8 + 0.1 * t, line_width * (1.0 + 0.3 * t))
		} else {
			(0.6 - 0.45 * t, 0.8 - 0.45 * t, line_width * (1.0 - 0.3 * t))
		};

		let (ux, uy) = (dx / dist, dy / dist);
		let start = box_exit(state.width(edge.source), ux, uy);
		let end = box_exit(state.width(edge.target), ux, uy);
		if start + end + arrow_size >= dist {
			continue;
		}

		ctx.set_stroke_style_str(&format!("rgba(100, 180, 255, {})", edge_alpha));
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(x1 + ux * start, y1 + uy * start);
		ctx.line_to(x2 - ux * (end + arrow_size), y2 - uy * (end + arrow_size));
		ctx.stroke();

		ctx.set_fill_style_str(&format!("rgba(100, 180, 255, {})", arrow_alpha));
		let (tip_x, tip_y) = (x2 - ux * end, y2 - uy * end);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
}

/// Split a label into at most two lines that fit the box, with an ellipsis
/// on overflow.
fn wrap_label(label: &str, width: f64) -> Vec<String> {
	let per_line = (((width - LABEL_PADDING) / CHAR_WIDTH).floor() as usize).max(1);
	let chars: Vec<char> = label.chars().collect();
	if chars.len() <= per_line {
		return vec![label.to_string()];
	}
	let first: String = chars[..per_line].iter().collect();
	let rest = &chars[per_line..];
	let second: String = if rest.len() <= per_line {
		rest.iter().collect()
	} else {
		let mut s: String = rest[..per_line.saturating_sub(1)].iter().collect();
		s.push('…');
		s
	};
	vec![first, second]
}

fn draw_box(
	ctx: &CanvasRenderingContext2d,
	info: &NodeInfo,
	x: f64,
	y: f64,
	alpha: f64,
	k: f64,
) {
	let (left, top) = (x - info.width / 2.0, y - NODE_HEIGHT / 2.0);
	let alpha = if info.dimmed { alpha * 0.55 } else { alpha };

	ctx.set_global_alpha(alpha);
	ctx.set_fill_style_str(&info.color);
	ctx.fill_rect(left, top, info.width, NODE_HEIGHT);

	ctx.set_stroke_style_str(if info.dimmed { "#666666" } else { "#2b7ce9" });
	ctx.set_line_width(1.0 / k.max(0.5));
	if info.dashed {
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(5.0),
			&JsValue::from_f64(5.0),
		));
	}
	ctx.stroke_rect(left, top, info.width, NODE_HEIGHT);
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	ctx.set_fill_style_str(if info.dimmed { "#333333" } else { "#111111" });
	ctx.set_font("12px sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let lines = wrap_label(&info.label, info.width);
	let line_height = 14.0;
	let first_y = y - (lines.len() as f64 - 1.0) * line_height / 2.0;
	for (i, line) in lines.iter().enumerate() {
		let _ = ctx.fill_text(line, x, first_y + i as f64 * line_height);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_ring(ctx: &CanvasRenderingContext2d, info: &NodeInfo, x: f64, y: f64, color: &str, k: f64) {
	let pad = 4.0 / k.max(0.5);
	ctx.set_stroke_style_str(color);
	ctx.set_line_width(3.0 / k.max(0.5));
	ctx.stroke_rect(
		x - info.width / 2.0 - pad,
		y - NODE_HEIGHT / 2.0 - pad,
		info.width + 2.0 * pad,
		NODE_HEIGHT + 2.0 * pad,
	);
}

fn draw_nodes(state: &ForceGraphState, overlay: &GraphOverlay, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);

	// Highlighted nodes go last so they sit on top.
	for pass_highlighted in [false, true] {
		state.graph.visit_nodes(|node| {
			let idx = node.index();
			let info = &node.data.user_data;
			if overlay.hidden.contains(&info.id) {
				return;
			}
			let highlighted = has_highlight && state.is_highlighted(idx);
			if highlighted != pass_highlighted {
				return;
			}
			let (x, y) = (node.x() as f64, node.y() as f64);
			let alpha = if !has_highlight || highlighted {
				1.0
			} else {
				1.0 - 0.7 * t
			};
			draw_box(ctx, info, x, y, alpha, k);

			if overlay.armed.as_deref() == Some(info.id.as_str()) {
				draw_ring(ctx, info, x, y, ARMED_RING, k);
			} else if overlay.selected.as_deref() == Some(info.id.as_str()) {
				draw_ring(ctx, info, x, y, SELECTED_RING, k);
			} else if state.is_hovered(idx) && t > 0.01 {
				draw_ring(ctx, info, x, y, &format!("rgba(255, 255, 255, {})", 0.7 * t), k);
			}
		});
	}
}

fn draw_badges(state: &ForceGraphState, overlay: &GraphOverlay, ctx: &CanvasRenderingContext2d) {
	ctx.set_font("bold 12px sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	for badge in badge_placements(&overlay.badges, state) {
		let (fill, text) = match badge.kind {
			BadgeKind::Count(n) => (COUNT_BADGE, n.to_string()),
			BadgeKind::HiddenNeighbors => (HIDDEN_BADGE, "+".to_string()),
		};
		ctx.begin_path();
		let _ = ctx.arc(badge.center.x, badge.center.y, badge.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(fill);
		ctx.fill();
		ctx.set_fill_style_str("white");
		let _ = ctx.fill_text(&text, badge.center.x, badge.center.y);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn short_labels_stay_on_one_line() {
		assert_eq!(wrap_label("Bolt", 120.0), vec!["Bolt"]);
	}

	#[test]
	fn long_labels_wrap_then_ellipsize() {
		let lines = wrap_label(&"a".repeat(40), 120.0);
		assert_eq!(lines.len(), 2);
		assert!(lines[1].ends_with('…'));
		assert_eq!(lines[0].chars().count(), lines[1].chars().count());
	}

	#[test]
	fn box_exit_hits_the_nearer_side() {
		assert_eq!(box_exit(100.0, 1.0, 0.0), 50.0);
		assert_eq!(box_exit(100.0, 0.0, 1.0), NODE_HEIGHT / 2.0);
	}
}
