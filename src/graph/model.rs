//! Records exchanged with the quote service, and the repair pass that makes a
//! freshly fetched snapshot safe for the analyzers.

use std::collections::HashSet;

use log::warn;
use serde::{Deserialize, Serialize};

/// Stable identifier of a visual node.
pub type NodeId = String;

fn default_true() -> bool {
	true
}

/// A part (or several merged identical parts) drawn as one node.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
	/// Unique within one snapshot.
	pub id: NodeId,
	/// Text drawn in the node box.
	#[serde(default)]
	pub label: String,
	/// Category tags such as `Interlock` or `BNC`.
	#[serde(default)]
	pub tags: Vec<String>,
	/// Inactive nodes are drawn dimmed.
	#[serde(default = "default_true")]
	pub active: bool,
	/// Bundled part, never separately purchasable.
	#[serde(default)]
	pub ghost: bool,
	/// Number of underlying items merged into this node.
	#[serde(default)]
	pub badge_count: u32,
	/// Opaque backing item uids, handed back verbatim when toggling.
	#[serde(default)]
	pub uid: Vec<serde_json::Value>,
}

impl Node {
	/// An active, untagged node whose label is its id.
	pub fn new(id: impl Into<NodeId>) -> Self {
		let id = id.into();
		Self {
			label: id.clone(),
			id,
			tags: Vec::new(),
			active: true,
			ghost: false,
			badge_count: 1,
			uid: Vec::new(),
		}
	}

	/// Builder used by fixtures.
	pub fn with_tags<I, S>(mut self, tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.tags = tags.into_iter().map(Into::into).collect();
		self
	}

	/// True when any of the node's tags is in `allowed`.
	pub fn has_any_tag(&self, allowed: &[&str]) -> bool {
		self.tags.iter().any(|t| allowed.contains(&t.as_str()))
	}
}

/// A compatibility or inclusion link. Direction is kept for drawing only.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Edge {
	/// Unique once the snapshot is repaired.
	#[serde(default)]
	pub id: String,
	/// Source endpoint.
	pub from: NodeId,
	/// Target endpoint.
	pub to: NodeId,
}

impl Edge {
	/// An edge with no id yet; ids are assigned by [`GraphSnapshot::repair`].
	pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
		Self {
			id: String::new(),
			from: from.into(),
			to: to.into(),
		}
	}

	/// The endpoint opposite `id`, if `id` is an endpoint at all.
	pub fn other(&self, id: &str) -> Option<&str> {
		if self.from == id {
			Some(&self.to)
		} else if self.to == id {
			Some(&self.from)
		} else {
			None
		}
	}
}

/// A part bundled with an item, shown under it in the sidebar.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GhostPart {
	/// Part ID.
	pub id: String,
	/// Catalog description.
	#[serde(default)]
	pub description: String,
}

/// A purchasable line of the quote.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Item {
	/// Item ID.
	pub id: String,
	/// Catalog description.
	#[serde(default)]
	pub description: String,
	/// Parts that come bundled with this item.
	#[serde(default)]
	pub ghosts: Vec<GhostPart>,
}

/// One full graph fetch. Every field tolerates being absent on the wire.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GraphSnapshot {
	/// Visual nodes.
	pub nodes: Vec<Node>,
	/// Links between nodes.
	pub edges: Vec<Edge>,
	/// Quote lines for the sidebar.
	pub items: Vec<Item>,
	/// Latest status line from the service.
	pub status_message: String,
	/// Free-text warnings about the quote.
	pub warnings: Vec<String>,
	/// Nodes with at least one unfilled mandatory slot.
	pub open_slot_nodes: Vec<NodeId>,
}

impl GraphSnapshot {
	/// Build a snapshot from bare nodes and edges, repaired.
	pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
		Self {
			nodes,
			edges,
			..Self::default()
		}
		.repair()
	}

	/// Drop duplicate node ids and dangling edges, and give every edge an id.
	pub fn repair(mut self) -> Self {
		let mut seen = HashSet::with_capacity(self.nodes.len());
		self.nodes.retain(|n| {
			let fresh = seen.insert(n.id.clone());
			if !fresh {
				warn!("dropping duplicate node id {}", n.id);
			}
			fresh
		});

		let before = self.edges.len();
		self.edges
			.retain(|e| seen.contains(&e.from) && seen.contains(&e.to));
		if self.edges.len() != before {
			warn!(
				"dropped {} edges referencing unknown nodes",
				before - self.edges.len()
			);
		}

		let mut edge_ids = HashSet::with_capacity(self.edges.len());
		for (i, edge) in self.edges.iter_mut().enumerate() {
			if edge.id.is_empty() || edge_ids.contains(&edge.id) {
				edge.id = format!("{}->{}#{}", edge.from, edge.to, i);
			}
			edge_ids.insert(edge.id.clone());
		}
		self
	}

	/// Node with `id`, if present.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Whether `id` still has an unfilled mandatory slot.
	pub fn is_open_slot(&self, id: &str) -> bool {
		self.open_slot_nodes.iter().any(|n| n == id)
	}
}
