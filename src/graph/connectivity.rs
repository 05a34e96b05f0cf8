//! Connected components, degrees, and the degree-based color classes.
//!
//! Edges are read as undirected. Parallel edges are allowed; an edge whose
//! endpoint is not among `nodes` is skipped rather than trusted.

use std::collections::{HashMap, HashSet};

use super::model::{Edge, Node, NodeId};

/// Undirected adjacency over known nodes only. Parallel edges appear as
/// repeated neighbors.
pub fn adjacency<'a>(nodes: &'a [Node], edges: &'a [Edge]) -> HashMap<&'a str, Vec<&'a str>> {
	let mut adj: HashMap<&str, Vec<&str>> =
		nodes.iter().map(|n| (n.id.as_str(), Vec::new())).collect();
	for edge in edges {
		if !adj.contains_key(edge.from.as_str()) || !adj.contains_key(edge.to.as_str()) {
			continue;
		}
		if let Some(list) = adj.get_mut(edge.from.as_str()) {
			list.push(edge.to.as_str());
		}
		if let Some(list) = adj.get_mut(edge.to.as_str()) {
			list.push(edge.from.as_str());
		}
	}
	adj
}

/// Partition `nodes` into connected components.
///
/// Components come out in the order their first member appears in `nodes`;
/// members are in traversal order. Uses an explicit stack so deep chains do
/// not grow the call stack.
pub fn components(nodes: &[Node], edges: &[Edge]) -> Vec<Vec<NodeId>> {
	let adj = adjacency(nodes, edges);
	let mut visited: HashSet<&str> = HashSet::with_capacity(nodes.len());
	let mut out = Vec::new();
	let mut stack = Vec::new();

	for node in nodes {
		if visited.contains(node.id.as_str()) {
			continue;
		}
		let mut comp = Vec::new();
		stack.push(node.id.as_str());
		while let Some(current) = stack.pop() {
			if !visited.insert(current) {
				continue;
			}
			comp.push(current.to_string());
			for &nbr in &adj[current] {
				if !visited.contains(nbr) {
					stack.push(nbr);
				}
			}
		}
		out.push(comp);
	}
	out
}

/// Number of incidences of `id` across `edges`. A self-loop counts twice.
/// Edges with an endpoint outside `nodes` are skipped, as in [`degree_map`].
pub fn degree(id: &str, nodes: &[Node], edges: &[Edge]) -> usize {
	let known: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
	if !known.contains(id) {
		return 0;
	}
	edges
		.iter()
		.filter(|e| known.contains(e.from.as_str()) && known.contains(e.to.as_str()))
		.map(|e| usize::from(e.from == id) + usize::from(e.to == id))
		.sum()
}

/// Degree of every node in one pass.
pub fn degree_map(nodes: &[Node], edges: &[Edge]) -> HashMap<NodeId, usize> {
	let mut degrees: HashMap<NodeId, usize> = nodes.iter().map(|n| (n.id.clone(), 0)).collect();
	for edge in edges {
		if !degrees.contains_key(&edge.from) || !degrees.contains_key(&edge.to) {
			continue;
		}
		for end in [&edge.from, &edge.to] {
			if let Some(d) = degrees.get_mut(end) {
				*d += 1;
			}
		}
	}
	degrees
}

/// Nodes with degree 0, in node order.
pub fn orphans(nodes: &[Node], edges: &[Edge]) -> Vec<NodeId> {
	with_degree(nodes, edges, |d| d == 0)
}

/// Nodes with degree exactly 1, in node order.
pub fn dead_ends(nodes: &[Node], edges: &[Edge]) -> Vec<NodeId> {
	with_degree(nodes, edges, |d| d == 1)
}

fn with_degree(nodes: &[Node], edges: &[Edge], keep: impl Fn(usize) -> bool) -> Vec<NodeId> {
	let degrees = degree_map(nodes, edges);
	nodes
		.iter()
		.filter(|n| keep(degrees[&n.id]))
		.map(|n| n.id.clone())
		.collect()
}

/// Distinct neighbors of `id`, in edge order.
pub fn neighbors<'a>(id: &str, edges: &'a [Edge]) -> Vec<&'a str> {
	let mut seen = HashSet::new();
	edges
		.iter()
		.filter_map(|e| e.other(id))
		.filter(|n| seen.insert(*n))
		.collect()
}

/// Display bucket for a node, derived from degree and slot state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DegreeClass {
	/// No links.
	Isolated,
	/// Dead end.
	Single,
	/// Two links.
	Double,
	/// Three links or more.
	Hub,
	/// Has an unfilled mandatory slot; overrides every degree bucket.
	OpenSlot,
}

impl DegreeClass {
	/// Bucket for a node of `degree`.
	pub fn of(degree: usize, open_slot: bool) -> Self {
		if open_slot {
			return DegreeClass::OpenSlot;
		}
		match degree {
			0 => DegreeClass::Isolated,
			1 => DegreeClass::Single,
			2 => DegreeClass::Double,
			_ => DegreeClass::Hub,
		}
	}

	/// Fill color of the bucket.
	pub fn color(self) -> &'static str {
		match self {
			DegreeClass::Isolated => "#808080",
			DegreeClass::Single => "#2B7CE9",
			DegreeClass::Double => "#bd7900",
			DegreeClass::Hub => "#800080",
			DegreeClass::OpenSlot => "#FF0000",
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use super::*;

	fn nodes(ids: &[&str]) -> Vec<Node> {
		ids.iter().map(|id| Node::new(*id)).collect()
	}

	fn as_sets(comps: Vec<Vec<NodeId>>) -> Vec<BTreeSet<NodeId>> {
		comps.into_iter().map(|c| c.into_iter().collect()).collect()
	}

	fn set(ids: &[&str]) -> BTreeSet<NodeId> {
		ids.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn three_node_scenario() {
		let ns = nodes(&["1", "2", "3"]);
		let es = vec![Edge::new("1", "2")];

		assert_eq!(as_sets(components(&ns, &es)), vec![set(&["1", "2"]), set(&["3"])]);
		assert_eq!(degree("1", &ns, &es), 1);
		assert_eq!(degree("2", &ns, &es), 1);
		assert_eq!(degree("3", &ns, &es), 0);
		assert_eq!(orphans(&ns, &es), vec!["3".to_string()]);
		assert_eq!(dead_ends(&ns, &es), vec!["1".to_string(), "2".to_string()]);
	}

	#[test]
	fn components_form_a_partition() {
		let ns = nodes(&["a", "b", "c", "d", "e", "f", "g"]);
		let es = vec![
			Edge::new("a", "b"),
			Edge::new("c", "b"),
			Edge::new("d", "e"),
			Edge::new("e", "d"),
			Edge::new("f", "f"),
			Edge::new("g", "missing"),
		];
		let comps = components(&ns, &es);

		let mut all: Vec<&NodeId> = comps.iter().flatten().collect();
		all.sort();
		all.dedup();
		assert_eq!(all.len(), ns.len());
		assert_eq!(comps.iter().map(Vec::len).sum::<usize>(), ns.len());

		let owner = |id: &str| comps.iter().position(|c| c.iter().any(|m| m == id));
		for e in es.iter().filter(|e| e.to != "missing") {
			assert_eq!(owner(&e.from), owner(&e.to), "edge {e:?} split");
		}
		assert_ne!(owner("g"), owner("a"));
	}

	#[test]
	fn long_chain_does_not_recurse() {
		let ns: Vec<Node> = (0..50_000).map(|i| Node::new(i.to_string())).collect();
		let es: Vec<Edge> = (1..50_000)
			.map(|i| Edge::new((i - 1).to_string(), i.to_string()))
			.collect();
		let comps = components(&ns, &es);
		assert_eq!(comps.len(), 1);
		assert_eq!(comps[0].len(), 50_000);
	}

	#[test]
	fn handshake_holds_with_parallel_edges_and_loops() {
		let ns = nodes(&["a", "b", "c"]);
		let es = vec![
			Edge::new("a", "b"),
			Edge::new("a", "b"),
			Edge::new("b", "a"),
			Edge::new("c", "c"),
		];
		let sum: usize = ns.iter().map(|n| degree(&n.id, &ns, &es)).sum();
		assert_eq!(sum, 2 * es.len());
		assert_eq!(degree("a", &ns, &es), 3);
		assert_eq!(degree_map(&ns, &es)["c"], 2);
		assert_eq!(neighbors("a", &es), vec!["b"]);
	}

	#[test]
	fn degree_skips_edges_to_unknown_nodes() {
		let ns = nodes(&["a", "b"]);
		let es = vec![Edge::new("a", "b"), Edge::new("a", "ghost"), Edge::new("ghost", "ghost")];
		let map = degree_map(&ns, &es);
		for n in &ns {
			assert_eq!(degree(&n.id, &ns, &es), map[&n.id]);
		}
		assert_eq!(degree("a", &ns, &es), 1);
		assert_eq!(degree("ghost", &ns, &es), 0);
	}

	#[test]
	fn degree_class_buckets() {
		assert_eq!(DegreeClass::of(0, false), DegreeClass::Isolated);
		assert_eq!(DegreeClass::of(1, false), DegreeClass::Single);
		assert_eq!(DegreeClass::of(2, false), DegreeClass::Double);
		assert_eq!(DegreeClass::of(3, false), DegreeClass::Hub);
		assert_eq!(DegreeClass::of(9, false), DegreeClass::Hub);
		assert_eq!(DegreeClass::of(0, true), DegreeClass::OpenSlot);
		assert_eq!(DegreeClass::of(5, true).color(), "#FF0000");
	}
}
