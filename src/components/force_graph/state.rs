use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;

use super::types::GraphData;
use crate::graph::layout::{BoundingBox, LayoutConfig, LayoutPort, PhysicsPhase, Point};
use crate::graph::NodeId;

pub const NODE_HEIGHT: f64 = 40.0;
const NODE_MIN_WIDTH: f64 = 60.0;
const NODE_MAX_WIDTH: f64 = 120.0;
pub const CHAR_WIDTH: f64 = 7.0;
pub const LABEL_PADDING: f64 = 16.0;

/// Per-tick displacement (world units) below which a node counts as still.
const REST_SPEED: f64 = 0.05;
const REST_TICKS: u32 = 30;
/// Report a layout even if the engine never quite comes to rest.
const MAX_SETTLE_SECS: f64 = 8.0;
const FIT_MARGIN: f64 = 40.0;

/// Box width for a label, clamped so long part names wrap into the box.
pub fn node_width(label: &str) -> f64 {
	(label.chars().count() as f64 * CHAR_WIDTH + LABEL_PADDING).clamp(NODE_MIN_WIDTH, NODE_MAX_WIDTH)
}

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: NodeId,
	pub label: String,
	pub color: String,
	pub dimmed: bool,
	pub dashed: bool,
	pub width: f64,
}

#[derive(Clone, Debug)]
pub struct EdgeInfo {
	pub id: String,
	pub source: DefaultNodeIdx,
	pub target: DefaultNodeIdx,
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
	/// Set once the pointer actually moved, so a plain click is not a drag.
	pub moved: bool,
	/// Anchor flag to restore when the node is released.
	pub was_anchor: bool,
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

/// Tracks the exploratory window and when the engine comes to rest.
#[derive(Clone, Debug, Default)]
struct SettleState {
	exploratory_left: Option<f64>,
	steady_charge: f32,
	elapsed: f64,
	resting_ticks: u32,
	reported: bool,
}

pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub edges: Vec<EdgeInfo>,
	id_to_idx: HashMap<NodeId, DefaultNodeIdx>,
	widths: HashMap<DefaultNodeIdx, f64>,
	/// Node centers as of the last tick, keyed by engine index.
	centers: HashMap<DefaultNodeIdx, (f64, f64)>,
	settle: SettleState,
}

/// Sub-unit offset so nodes seeded on the same point never coincide inside
/// the engine, which divides by their distance.
fn spread(i: usize) -> (f32, f32) {
	let angle = i as f64 * 2.399_963;
	let r = 0.5 + (i % 7) as f64 * 0.1;
	((r * angle.cos()) as f32, (r * angle.sin()) as f32)
}

impl ForceGraphState {
	/// Build a simulation for `data`. `previous` keeps the viewport across
	/// refreshes that do not start a fresh layout.
	pub fn new(data: &GraphData, width: f64, height: f64, previous: Option<ViewTransform>) -> Self {
		let defaults = LayoutConfig::default();
		let (steady_charge, phase, fresh) = match &data.plan {
			Some(plan) => (plan.steady_charge, plan.phase, plan.fresh),
			None => (defaults.steady_charge, PhysicsPhase::Steady, false),
		};
		let (charge, exploratory_left) = match phase {
			PhysicsPhase::Exploratory { settle_secs } => (
				data.plan
					.as_ref()
					.map_or(defaults.exploratory_charge, |p| p.exploratory_charge),
				Some(settle_secs),
			),
			PhysicsPhase::Steady => (steady_charge, None),
		};

		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: charge,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let mut id_to_idx = HashMap::new();
		let mut widths = HashMap::new();
		let mut edges = Vec::new();

		for (i, node) in data.nodes.iter().enumerate() {
			let seed = data.plan.as_ref().map(|p| p.seed(&node.id)).unwrap_or_default();
			let (x, y) = match seed.position {
				Some(p) if seed.pinned => (p.x as f32, p.y as f32),
				Some(p) => {
					let (dx, dy) = spread(i);
					(p.x as f32 + dx, p.y as f32 + dy)
				}
				None => {
					let angle = (i as f64) * 2.0 * PI / data.nodes.len().max(1) as f64;
					((100.0 * angle.cos()) as f32, (100.0 * angle.sin()) as f32)
				}
			};

			let width = node_width(&node.label);
			let idx = graph.add_node(NodeData {
				x,
				y,
				mass: 10.0,
				is_anchor: seed.pinned,
				user_data: NodeInfo {
					id: node.id.clone(),
					label: node.label.clone(),
					color: node.color.clone(),
					dimmed: node.dimmed,
					dashed: node.dashed,
					width,
				},
			});
			id_to_idx.insert(node.id.clone(), idx);
			widths.insert(idx, width);
		}

		for link in &data.links {
			if let (Some(&src), Some(&tgt)) =
				(id_to_idx.get(&link.source), id_to_idx.get(&link.target))
			{
				if src != tgt {
					graph.add_edge(src, tgt, EdgeData::default());
				}
				edges.push(EdgeInfo {
					id: link.id.clone(),
					source: src,
					target: tgt,
				});
			}
		}

		let mut state = Self {
			graph,
			edges,
			id_to_idx,
			widths,
			centers: HashMap::new(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			animation_running: true,
			settle: SettleState {
				exploratory_left,
				steady_charge,
				..SettleState::default()
			},
		};
		state.refresh_centers();
		match previous {
			Some(t) if !fresh => state.transform = t,
			_ => state.fit(),
		}
		state
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn center(&self, idx: DefaultNodeIdx) -> Option<(f64, f64)> {
		self.centers.get(&idx).copied()
	}

	pub fn width(&self, idx: DefaultNodeIdx) -> f64 {
		self.widths.get(&idx).copied().unwrap_or(NODE_MIN_WIDTH)
	}

	pub fn index_of(&self, id: &str) -> Option<DefaultNodeIdx> {
		self.id_to_idx.get(id).copied()
	}

	/// The topmost shown node whose box contains the screen point.
	pub fn node_at_position(
		&self,
		sx: f64,
		sy: f64,
		hidden: &HashSet<NodeId>,
	) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let info = &node.data.user_data;
			if hidden.contains(&info.id) {
				return;
			}
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			if dx.abs() <= info.width / 2.0 && dy.abs() <= NODE_HEIGHT / 2.0 {
				found = Some(node.index());
			}
		});
		found
	}

	pub fn node_id(&self, idx: DefaultNodeIdx) -> Option<NodeId> {
		let mut id = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				id = Some(node.data.user_data.id.clone());
			}
		});
		id
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

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
			for edge in &self.edges {
				if edge.source == idx {
					self.hover.neighbors.insert(edge.target);
				} else if edge.target == idx {
					self.hover.neighbors.insert(edge.source);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	/// Advance one frame. Returns true on the frame the layout comes to rest.
	pub fn tick(&mut self, dt: f32) -> bool {
		self.graph.update(dt);
		let dt = dt as f64;
		let speed = self.refresh_centers();
		self.animate_hover(dt);

		if let Some(left) = self.settle.exploratory_left.as_mut() {
			*left -= dt;
			if *left <= 0.0 {
				self.settle.exploratory_left = None;
				self.graph.parameters.force_charge = self.settle.steady_charge;
				self.fit();
				debug!("exploratory phase over, relaxing to steady charge");
			}
			return false;
		}

		if self.settle.reported || self.drag.active {
			return false;
		}
		self.settle.elapsed += dt;
		if speed < REST_SPEED {
			self.settle.resting_ticks += 1;
		} else {
			self.settle.resting_ticks = 0;
		}
		if self.settle.resting_ticks >= REST_TICKS || self.settle.elapsed >= MAX_SETTLE_SECS {
			self.settle.reported = true;
			return true;
		}
		false
	}

	/// Wait for the next rest before reporting again.
	pub fn unsettle(&mut self) {
		self.settle.reported = false;
		self.settle.resting_ticks = 0;
		self.settle.elapsed = 0.0;
	}

	fn animate_hover(&mut self, dt: f64) {
		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	/// Re-read node centers from the engine; returns the largest movement.
	pub fn refresh_centers(&mut self) -> f64 {
		let mut max_step: f64 = 0.0;
		let centers = &mut self.centers;
		self.graph.visit_nodes(|node| {
			let now = (node.x() as f64, node.y() as f64);
			if let Some(before) = centers.insert(node.index(), now) {
				max_step = max_step.max((now.0 - before.0).hypot(now.1 - before.1));
			}
		});
		max_step
	}

	/// Zoom and pan so every node is on screen.
	pub fn fit(&mut self) {
		let mut bounds: Option<BoundingBox> = None;
		self.graph.visit_nodes(|node| {
			let (x, y) = (node.x() as f64, node.y() as f64);
			let half_w = node.data.user_data.width / 2.0;
			let b = bounds.get_or_insert(BoundingBox {
				left: x - half_w,
				top: y,
				right: x + half_w,
				bottom: y,
			});
			b.left = b.left.min(x - half_w);
			b.right = b.right.max(x + half_w);
			b.top = b.top.min(y - NODE_HEIGHT / 2.0);
			b.bottom = b.bottom.max(y + NODE_HEIGHT / 2.0);
		});
		let Some(b) = bounds else {
			return;
		};
		let (bw, bh) = (
			(b.right - b.left).max(1.0) + 2.0 * FIT_MARGIN,
			(b.bottom - b.top).max(1.0) + 2.0 * FIT_MARGIN,
		);
		let k = (self.width / bw).min(self.height / bh).clamp(0.05, 1.5);
		let (cx, cy) = ((b.left + b.right) / 2.0, (b.top + b.bottom) / 2.0);
		self.transform = ViewTransform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		};
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

impl LayoutPort for ForceGraphState {
	fn positions(&self) -> Vec<(NodeId, Point)> {
		let mut out = Vec::with_capacity(self.id_to_idx.len());
		self.graph.visit_nodes(|node| {
			out.push((
				node.data.user_data.id.clone(),
				Point::new(node.x() as f64, node.y() as f64),
			));
		});
		out
	}

	fn bounding_box(&self, id: &str) -> Option<BoundingBox> {
		let idx = self.index_of(id)?;
		let (x, y) = self.center(idx)?;
		let half_w = self.width(idx) / 2.0;
		Some(BoundingBox {
			left: x - half_w,
			top: y - NODE_HEIGHT / 2.0,
			right: x + half_w,
			bottom: y + NODE_HEIGHT / 2.0,
		})
	}
}
