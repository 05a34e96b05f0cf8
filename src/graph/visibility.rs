//! Shown/hidden state of nodes and edges, and the badges derived from it.

use std::collections::{HashMap, HashSet};

use super::connectivity::{degree_map, neighbors};
use super::layout::{LayoutPort, Point};
use super::model::{Edge, GraphSnapshot, Node, NodeId};

/// Tag group the operator can isolate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GroupFilter {
	/// No filter.
	#[default]
	None,
	/// Interlock and laser-safety parts.
	Interlock,
	/// Triggering and BNC parts.
	Triggering,
}

impl GroupFilter {
	/// Tags a node needs one of to stay shown.
	pub fn allowed_tags(self) -> &'static [&'static str] {
		match self {
			GroupFilter::None => &[],
			GroupFilter::Interlock => &["Interlock", "LaserSafety"],
			GroupFilter::Triggering => &["Triggering", "BNC"],
		}
	}

	/// Whether `node` passes the filter.
	pub fn admits(self, node: &Node) -> bool {
		self == GroupFilter::None || node.has_any_tag(self.allowed_tags())
	}

	/// Radio-style toggle: picking the active group again clears the filter.
	pub fn toggled(self, picked: GroupFilter) -> GroupFilter {
		if self == picked {
			GroupFilter::None
		} else {
			picked
		}
	}

	/// Radio button text.
	pub fn label(self) -> &'static str {
		match self {
			GroupFilter::None => "All parts",
			GroupFilter::Interlock => "Isolate Interlock",
			GroupFilter::Triggering => "Isolate Triggering",
		}
	}
}

/// The set of hidden node ids. Everything else is shown; edges are derived.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Visibility {
	hidden: HashSet<NodeId>,
}

impl Visibility {
	/// Start with `ids` hidden.
	pub fn from_hidden(ids: impl IntoIterator<Item = NodeId>) -> Self {
		Self {
			hidden: ids.into_iter().collect(),
		}
	}

	/// Whether `id` is hidden.
	pub fn is_hidden(&self, id: &str) -> bool {
		self.hidden.contains(id)
	}

	/// Every hidden id.
	pub fn hidden(&self) -> &HashSet<NodeId> {
		&self.hidden
	}

	/// Show everything.
	pub fn clear(&mut self) {
		self.hidden.clear();
	}

	/// Recompute every node from the filter alone. Manual toggles are lost.
	pub fn apply_filter(&mut self, filter: GroupFilter, nodes: &[Node]) {
		self.hidden = nodes
			.iter()
			.filter(|n| !filter.admits(n))
			.map(|n| n.id.clone())
			.collect();
	}

	/// Flip every degree-1 neighbor of `id`. Returns the flipped ids.
	pub fn collapse_dead_ends(&mut self, id: &str, snapshot: &GraphSnapshot) -> Vec<NodeId> {
		let degrees = degree_map(&snapshot.nodes, &snapshot.edges);
		let mut flipped = Vec::new();
		for nbr in neighbors(id, &snapshot.edges) {
			if degrees.get(nbr).copied() != Some(1) {
				continue;
			}
			if !self.hidden.remove(nbr) {
				self.hidden.insert(nbr.to_string());
			}
			flipped.push(nbr.to_string());
		}
		flipped
	}

	/// An edge is shown iff both endpoints exist and are shown.
	pub fn edge_shown(&self, edge: &Edge, known: &HashSet<&str>) -> bool {
		[&edge.from, &edge.to]
			.iter()
			.all(|end| known.contains(end.as_str()) && !self.is_hidden(end))
	}

	/// Ids of the edges to draw.
	pub fn shown_edges(&self, snapshot: &GraphSnapshot) -> HashSet<String> {
		let known: HashSet<&str> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
		snapshot
			.edges
			.iter()
			.filter(|e| self.edge_shown(e, &known))
			.map(|e| e.id.clone())
			.collect()
	}
}

/// Display-only annotations for one node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeBadges {
	/// Merge count, when more than one item backs the node.
	pub count: Option<u32>,
	/// Some neighbor is hidden.
	pub hidden_neighbors: bool,
}

impl NodeBadges {
	/// True when there is nothing to draw.
	pub fn is_empty(&self) -> bool {
		self.count.is_none() && !self.hidden_neighbors
	}
}

/// Badges for every shown node that has any.
pub fn badges(snapshot: &GraphSnapshot, visibility: &Visibility) -> HashMap<NodeId, NodeBadges> {
	snapshot
		.nodes
		.iter()
		.filter(|n| !visibility.is_hidden(&n.id))
		.filter_map(|n| {
			let badges = NodeBadges {
				count: (n.badge_count > 1).then_some(n.badge_count),
				hidden_neighbors: neighbors(&n.id, &snapshot.edges)
					.into_iter()
					.any(|m| visibility.is_hidden(m)),
			};
			(!badges.is_empty()).then(|| (n.id.clone(), badges))
		})
		.collect()
}

/// What a badge shows.
#[derive(Clone, Debug, PartialEq)]
pub enum BadgeKind {
	/// Number of merged items.
	Count(u32),
	/// Marker for hidden neighbors.
	HiddenNeighbors,
}

/// Where to draw one badge.
#[derive(Clone, Debug, PartialEq)]
pub struct BadgePlacement {
	/// Node the badge belongs to.
	pub node: NodeId,
	/// Badge content.
	pub kind: BadgeKind,
	/// Center in graph space.
	pub center: Point,
	/// Circle radius.
	pub radius: f64,
}

/// Radius of every badge circle.
pub const BADGE_RADIUS: f64 = 15.0;
const BADGE_INSET: f64 = 5.0;

/// Count badges sit top-right of the node box, hidden-neighbor badges
/// bottom-right. Nodes the port cannot place are skipped.
pub fn badge_placements(
	badges: &HashMap<NodeId, NodeBadges>,
	port: &impl LayoutPort,
) -> Vec<BadgePlacement> {
	let mut out = Vec::new();
	for (id, b) in badges {
		let Some(bbox) = port.bounding_box(id) else {
			continue;
		};
		if let Some(count) = b.count {
			out.push(BadgePlacement {
				node: id.clone(),
				kind: BadgeKind::Count(count),
				center: Point::new(bbox.right - BADGE_INSET, bbox.top + BADGE_INSET),
				radius: BADGE_RADIUS,
			});
		}
		if b.hidden_neighbors {
			out.push(BadgePlacement {
				node: id.clone(),
				kind: BadgeKind::HiddenNeighbors,
				center: Point::new(bbox.right - BADGE_INSET, bbox.bottom - BADGE_INSET),
				radius: BADGE_RADIUS,
			});
		}
	}
	out
}
