use crate::graph::connectivity::DegreeClass;
use crate::graph::layout::LayoutPlan;
use crate::graph::{Edge, NodeStyle};

const INACTIVE_FILL: &str = "#D3D3D3";

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub label: String,
	pub color: String,
	/// Inactive parts are drawn faded with dark text.
	pub dimmed: bool,
	/// Ghost parts get a dashed border.
	pub dashed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
	pub id: String,
	pub source: String,
	pub target: String,
}

/// One graph snapshot ready for the canvas, with its seed plan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
	pub plan: Option<LayoutPlan>,
}

impl GraphData {
	pub fn new(styles: Vec<NodeStyle>, edges: &[Edge], plan: LayoutPlan) -> Self {
		let nodes = styles
			.into_iter()
			.map(|s| GraphNode {
				color: if s.active {
					s.class.color().to_string()
				} else {
					INACTIVE_FILL.to_string()
				},
				id: s.id,
				label: s.label,
				dimmed: !s.active,
				dashed: s.ghost,
			})
			.collect();
		let links = edges
			.iter()
			.map(|e| GraphLink {
				id: e.id.clone(),
				source: e.from.clone(),
				target: e.to.clone(),
			})
			.collect();
		Self {
			nodes,
			links,
			plan: Some(plan),
		}
	}
}

/// Legend rows for the help panel.
pub fn legend() -> [(DegreeClass, &'static str); 5] {
	[
		(DegreeClass::OpenSlot, "Parts with missing components"),
		(DegreeClass::Hub, "Parts with 3 or more connections"),
		(DegreeClass::Double, "Parts with 2 connections"),
		(DegreeClass::Single, "Parts with 1 connection"),
		(DegreeClass::Isolated, "Parts with no connections"),
	]
}
