//! Seed positions for the physics engine and the position cache that lets a
//! user's arrangement survive graph refreshes.

use std::collections::HashMap;

use super::connectivity::{components, degree_map};
use super::model::{GraphSnapshot, Node, NodeId};

/// Spacing and physics constants for seeding.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	/// Horizontal distance between group cells.
	pub group_spacing_x: f64,
	/// Vertical distance between group cells.
	pub group_spacing_y: f64,
	/// Spacing of the orphan sub-grid.
	pub local_spacing: f64,
	/// Columns of the orphan sub-grid.
	pub orphan_columns: usize,
	/// Repulsion used once the layout has settled.
	pub steady_charge: f32,
	/// Repulsion used right after a fresh load to fan components out.
	pub exploratory_charge: f32,
	/// Seconds spent in the exploratory phase.
	pub settle_secs: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			group_spacing_x: 2000.0,
			group_spacing_y: 1000.0,
			local_spacing: 200.0,
			orphan_columns: 3,
			steady_charge: 4000.0,
			exploratory_charge: 80000.0,
			settle_secs: 1.0,
		}
	}
}

/// A position in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Axis-aligned box in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
	/// Left edge.
	pub left: f64,
	/// Top edge.
	pub top: f64,
	/// Right edge.
	pub right: f64,
	/// Bottom edge.
	pub bottom: f64,
}

/// Where a node starts and whether physics may move it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Seed {
	/// `None` leaves placement to the engine.
	pub position: Option<Point>,
	/// Pinned nodes take no part in attraction or repulsion.
	pub pinned: bool,
	/// Start hidden, carried over from the cache.
	pub hidden: bool,
}

/// How hard nodes repel at the start of a layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PhysicsPhase {
	/// Strong repulsion for `settle_secs`, then relax to steady.
	Exploratory {
		/// Length of the exploratory window.
		settle_secs: f64,
	},
	/// Normal repulsion.
	Steady,
}

/// Everything an adapter needs to (re)build its simulation for one snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutPlan {
	/// Seed per node id; missing ids are unseeded.
	pub seeds: HashMap<NodeId, Seed>,
	/// Starting phase.
	pub phase: PhysicsPhase,
	/// True when the viewport should be fitted to the new graph.
	pub fresh: bool,
	/// Repulsion once settled.
	pub steady_charge: f32,
	/// Repulsion while exploring.
	pub exploratory_charge: f32,
}

impl LayoutPlan {
	/// Seed for `id`, unplaced when absent.
	pub fn seed(&self, id: &str) -> Seed {
		self.seeds.get(id).copied().unwrap_or_default()
	}
}

/// A set of nodes placed together in one grid cell.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutGroup {
	/// Node ids in the group.
	pub members: Vec<NodeId>,
	/// Whether this is the orphan group.
	pub orphan: bool,
}

/// One orphan group (if any orphans exist) followed by one group per
/// connected component of the remaining nodes.
pub fn partition(snapshot: &GraphSnapshot) -> Vec<LayoutGroup> {
	let degrees = degree_map(&snapshot.nodes, &snapshot.edges);
	let (orphans, linked): (Vec<&Node>, Vec<&Node>) =
		snapshot.nodes.iter().partition(|n| degrees[&n.id] == 0);

	let mut groups = Vec::new();
	if !orphans.is_empty() {
		groups.push(LayoutGroup {
			members: orphans.iter().map(|n| n.id.clone()).collect(),
			orphan: true,
		});
	}
	let linked: Vec<Node> = linked.into_iter().cloned().collect();
	groups.extend(
		components(&linked, &snapshot.edges)
			.into_iter()
			.map(|members| LayoutGroup {
				members,
				orphan: false,
			}),
	);
	groups
}

/// Side length of the square grid that holds `groups` cells.
pub fn grid_size(groups: usize) -> usize {
	(groups as f64).sqrt().ceil() as usize
}

/// `(column, row)` of group `index`.
pub fn grid_cell(index: usize, grid: usize) -> (usize, usize) {
	let grid = grid.max(1);
	(index % grid, index / grid)
}

/// Seed coordinates for a fresh load.
pub fn seed_groups(groups: &[LayoutGroup], config: &LayoutConfig) -> HashMap<NodeId, Seed> {
	let grid = grid_size(groups.len());
	let columns = config.orphan_columns.max(1);
	let mut seeds = HashMap::new();

	for (g, group) in groups.iter().enumerate() {
		let (col, row) = grid_cell(g, grid);
		let origin = Point::new(
			col as f64 * config.group_spacing_x,
			row as f64 * config.group_spacing_y,
		);
		for (i, id) in group.members.iter().enumerate() {
			let seed = if group.orphan {
				Seed {
					position: Some(Point::new(
						origin.x + (i % columns) as f64 * config.local_spacing,
						origin.y + (i / columns) as f64 * config.local_spacing,
					)),
					pinned: true,
					hidden: false,
				}
			} else {
				// Identical seeds; repulsion fans the component out.
				Seed {
					position: Some(origin),
					pinned: false,
					hidden: false,
				}
			};
			seeds.insert(id.clone(), seed);
		}
	}
	seeds
}

/// A stabilized position and hidden flag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CachedPosition {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
	/// Hidden when the snapshot was taken.
	pub hidden: bool,
}

/// Last stabilized position of every node, keyed by id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionCache {
	entries: HashMap<NodeId, CachedPosition>,
}

impl PositionCache {
	/// Cached entry for `id`.
	pub fn get(&self, id: &str) -> Option<CachedPosition> {
		self.entries.get(id).copied()
	}

	/// Replace the whole cache with a new snapshot.
	pub fn replace(&mut self, entries: impl IntoIterator<Item = (NodeId, CachedPosition)>) {
		self.entries = entries.into_iter().collect();
	}

	/// Update the hidden flag of an already cached node.
	pub fn set_hidden(&mut self, id: &str, hidden: bool) {
		if let Some(entry) = self.entries.get_mut(id) {
			entry.hidden = hidden;
		}
	}

	/// Forget every position.
	pub fn clear(&mut self) {
		self.entries.clear();
	}

	/// Number of cached nodes.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// True when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Build the plan for `snapshot`. A fresh load discards the cache and
/// partitions; otherwise cached nodes keep their place and new ones are left
/// to the engine. Orphans are pinned either way.
pub fn plan_layout(
	snapshot: &GraphSnapshot,
	cache: &mut PositionCache,
	fresh: bool,
	config: &LayoutConfig,
) -> LayoutPlan {
	let degrees = degree_map(&snapshot.nodes, &snapshot.edges);
	let seeds = if fresh {
		cache.clear();
		seed_groups(&partition(snapshot), config)
	} else {
		snapshot
			.nodes
			.iter()
			.map(|n| {
				let cached = cache.get(&n.id);
				let seed = Seed {
					position: cached.map(|c| Point::new(c.x, c.y)),
					pinned: degrees[&n.id] == 0,
					hidden: cached.is_some_and(|c| c.hidden),
				};
				(n.id.clone(), seed)
			})
			.collect()
	};

	LayoutPlan {
		seeds,
		phase: if fresh {
			PhysicsPhase::Exploratory {
				settle_secs: config.settle_secs,
			}
		} else {
			PhysicsPhase::Steady
		},
		fresh,
		steady_charge: config.steady_charge,
		exploratory_charge: config.exploratory_charge,
	}
}

/// What the core needs from whatever engine lays the graph out.
pub trait LayoutPort {
	/// Current position of every node the engine knows.
	fn positions(&self) -> Vec<(NodeId, Point)>;
	/// Screen-independent box around a node, for badge placement.
	fn bounding_box(&self, id: &str) -> Option<BoundingBox>;
}

/// Positions read from a port at stabilization or drag end.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutSnapshot(pub Vec<(NodeId, Point)>);

impl LayoutSnapshot {
	/// Read every position from `port`.
	pub fn capture(port: &impl LayoutPort) -> Self {
		Self(port.positions())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::model::{Edge, Node};

	fn snapshot(ids: &[&str], edges: &[(&str, &str)]) -> GraphSnapshot {
		GraphSnapshot::from_parts(
			ids.iter().map(|id| Node::new(*id)).collect(),
			edges.iter().map(|(a, b)| Edge::new(*a, *b)).collect(),
		)
	}

	#[test]
	fn two_components_and_orphans_fill_a_two_by_two_grid() {
		let snap = snapshot(&["a", "b", "c", "d", "o1", "o2"], &[("a", "b"), ("c", "d")]);
		let groups = partition(&snap);

		assert_eq!(groups.len(), 3);
		assert!(groups[0].orphan);
		assert_eq!(groups[0].members, vec!["o1".to_string(), "o2".to_string()]);
		assert_eq!(grid_size(groups.len()), 2);
		let cells: Vec<_> = (0..3).map(|g| grid_cell(g, 2)).collect();
		assert_eq!(cells, vec![(0, 0), (1, 0), (0, 1)]);

		let config = LayoutConfig::default();
		let seeds = seed_groups(&groups, &config);
		assert_eq!(seeds["a"].position, Some(Point::new(2000.0, 0.0)));
		assert_eq!(seeds["b"].position, seeds["a"].position);
		assert_eq!(seeds["c"].position, Some(Point::new(0.0, 1000.0)));
		assert!(!seeds["c"].pinned);
	}

	#[test]
	fn orphans_use_a_three_column_subgrid() {
		let snap = snapshot(&["o0", "o1", "o2", "o3"], &[]);
		let seeds = seed_groups(&partition(&snap), &LayoutConfig::default());

		assert_eq!(seeds["o0"].position, Some(Point::new(0.0, 0.0)));
		assert_eq!(seeds["o2"].position, Some(Point::new(400.0, 0.0)));
		assert_eq!(seeds["o3"].position, Some(Point::new(0.0, 200.0)));
		assert!(seeds.values().all(|s| s.pinned));
	}

	#[test]
	fn grid_size_is_ceiling_square_root() {
		assert_eq!(grid_size(0), 0);
		assert_eq!(grid_size(1), 1);
		assert_eq!(grid_size(4), 2);
		assert_eq!(grid_size(5), 3);
		assert_eq!(grid_cell(0, 0), (0, 0));
	}

	#[test]
	fn fresh_plan_discards_the_cache() {
		let snap = snapshot(&["a", "b"], &[("a", "b")]);
		let mut cache = PositionCache::default();
		cache.replace([(
			"a".to_string(),
			CachedPosition {
				x: 9.0,
				y: 9.0,
				hidden: true,
			},
		)]);
		let plan = plan_layout(&snap, &mut cache, true, &LayoutConfig::default());

		assert!(cache.is_empty());
		assert!(plan.fresh);
		assert_eq!(plan.phase, PhysicsPhase::Exploratory { settle_secs: 1.0 });
		assert_eq!(plan.seed("a").position, Some(Point::new(0.0, 0.0)));
		assert!(!plan.seed("a").hidden);
	}

	#[test]
	fn incremental_plan_reuses_cached_positions() {
		let snap = snapshot(&["a", "b", "new", "lonely"], &[("a", "b"), ("b", "new")]);
		let mut cache = PositionCache::default();
		cache.replace([
			(
				"a".to_string(),
				CachedPosition {
					x: 10.0,
					y: -4.0,
					hidden: false,
				},
			),
			(
				"b".to_string(),
				CachedPosition {
					x: 3.0,
					y: 7.0,
					hidden: true,
				},
			),
		]);
		let plan = plan_layout(&snap, &mut cache, false, &LayoutConfig::default());

		assert_eq!(cache.len(), 2);
		assert_eq!(plan.phase, PhysicsPhase::Steady);
		assert_eq!(plan.seed("a").position, Some(Point::new(10.0, -4.0)));
		assert!(plan.seed("b").hidden);
		assert_eq!(plan.seed("new").position, None);
		assert!(!plan.seed("new").pinned);
		assert!(plan.seed("lonely").pinned);
	}

	struct FixedPort(Vec<(NodeId, Point)>);

	impl LayoutPort for FixedPort {
		fn positions(&self) -> Vec<(NodeId, Point)> {
			self.0.clone()
		}

		fn bounding_box(&self, _id: &str) -> Option<BoundingBox> {
			None
		}
	}

	#[test]
	fn capture_reads_the_port() {
		let port = FixedPort(vec![("a".into(), Point::new(1.0, 2.0))]);
		assert_eq!(LayoutSnapshot::capture(&port).0, port.0);
	}
}
