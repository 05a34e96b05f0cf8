//! The session controller: one object owning every piece of mutable graph
//! state for the lifetime of a browser session.
//!
//! Mutations take plain events (input, service responses, button presses)
//! and return the [`Command`]s the I/O layer must run. Rendering reads
//! [`SessionView`] and [`GraphOverlay`]; nothing here touches the DOM.

use std::collections::{HashMap, HashSet};

use log::{debug, error, info, warn};

use super::catalog::{self, Part};
use super::connectivity::{DegreeClass, degree_map};
use super::custom_edge::{ConfirmOutcome, ConnectRequest, CustomEdgeWorkflow, EdgeDraft};
use super::input::InputEvent;
use super::layout::{CachedPosition, LayoutConfig, LayoutPlan, LayoutSnapshot, PositionCache, plan_layout};
use super::model::{GraphSnapshot, Item, Node, NodeId};
use super::suggest::{SuggestMode, SuggestionPanel, SuggestionSet, SuggestionTracker, Ticket};
use super::visibility::{GroupFilter, NodeBadges, Visibility, badges};
use crate::error::{QuoteError, Result};

/// Requests the session needs the quote service to perform.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
	/// Reload the whole graph.
	FetchGraph,
	/// Load the parts catalog.
	FetchCatalog,
	/// Suggestions for the selected node.
	FetchSuggestions {
		/// Handed back with the response.
		ticket: Ticket,
		/// Node to suggest for.
		node: NodeId,
		/// Which slots to list.
		mode: SuggestMode,
	},
	/// Slots of both ends of a captured pair, always in "all parts" mode.
	FetchSlotOptions {
		/// Armed end of the pair.
		source: NodeId,
		/// Captured end of the pair.
		target: NodeId,
	},
	/// Create a custom connection.
	Connect(ConnectRequest),
	/// Add an item by ID.
	AddItem(String),
	/// Remove an item by ID.
	RemoveItem(String),
	/// Flip the active flag of the backing items.
	ToggleActive {
		/// Backing item uids, as received.
		uid: Vec<serde_json::Value>,
		/// New value of the flag.
		active: bool,
	},
	/// Empty the quote.
	ClearAll,
}

/// A warning line plus the part id it mentions, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct Warning {
	/// The warning as received.
	pub text: String,
	/// Part id found in the first parenthesized group.
	pub part_id: Option<String>,
}

/// Everything the side panels render.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionView {
	/// Quote lines.
	pub items: Vec<Item>,
	/// Service status line.
	pub status_message: String,
	/// Parsed warnings.
	pub warnings: Vec<Warning>,
	/// Active group filter.
	pub filter: GroupFilter,
	/// Selected node, if it still exists.
	pub selected: Option<Node>,
	/// Suggestion panel contents.
	pub suggestions: SuggestionPanel,
	/// Custom connection progress.
	pub edge: EdgeDraft,
	/// Catalog search text.
	pub catalog_query: String,
	/// Catalog parts matching the search.
	pub catalog_hits: Vec<Part>,
	/// Nodes in the graph.
	pub node_count: usize,
	/// Edges in the graph.
	pub edge_count: usize,
}

/// Per-frame annotations for the canvas.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphOverlay {
	/// Nodes not drawn.
	pub hidden: HashSet<NodeId>,
	/// Ids of edges to draw.
	pub shown_edges: HashSet<String>,
	/// Badges per shown node.
	pub badges: HashMap<NodeId, NodeBadges>,
	/// Source armed for a custom connection.
	pub armed: Option<NodeId>,
	/// Selected node.
	pub selected: Option<NodeId>,
}

/// Static per-node styling for one snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	/// Node id.
	pub id: NodeId,
	/// Box text.
	pub label: String,
	/// Color bucket.
	pub class: DegreeClass,
	/// Drawn dimmed when false.
	pub active: bool,
	/// Drawn with a dashed border.
	pub ghost: bool,
}

/// All graph state for one browser session.
#[derive(Debug, Default)]
pub struct QuoteSession {
	config: LayoutConfig,
	snapshot: GraphSnapshot,
	cache: PositionCache,
	/// Set once a non-empty graph has been laid out from scratch.
	layout_primed: bool,
	filter: GroupFilter,
	visibility: Visibility,
	workflow: CustomEdgeWorkflow,
	suggestions: SuggestionTracker,
	catalog: Vec<Part>,
	catalog_query: String,
}

impl QuoteSession {
	/// Empty session laying out with `config`.
	pub fn new(config: LayoutConfig) -> Self {
		Self {
			config,
			..Self::default()
		}
	}

	/// Commands to run when the page opens.
	pub fn start(&self) -> Vec<Command> {
		vec![Command::FetchGraph, Command::FetchCatalog]
	}

	/// Last loaded graph.
	pub fn snapshot(&self) -> &GraphSnapshot {
		&self.snapshot
	}

	/// Custom connection state.
	pub fn workflow(&self) -> &CustomEdgeWorkflow {
		&self.workflow
	}

	/// Hidden nodes.
	pub fn visibility(&self) -> &Visibility {
		&self.visibility
	}

	/// Cached positions.
	pub fn cache(&self) -> &PositionCache {
		&self.cache
	}

	/// Replace the graph wholesale and plan its layout.
	pub fn on_graph_loaded(&mut self, snapshot: GraphSnapshot) -> LayoutPlan {
		self.snapshot = snapshot.repair();
		let fresh = !self.layout_primed && !self.snapshot.nodes.is_empty();
		let plan = plan_layout(&self.snapshot, &mut self.cache, fresh, &self.config);
		if fresh {
			self.layout_primed = true;
		}

		self.visibility = Visibility::from_hidden(
			plan.seeds
				.iter()
				.filter(|(_, s)| s.hidden)
				.map(|(id, _)| id.clone()),
		);

		if let Some(sel) = self.suggestions.selected() {
			if self.snapshot.node(sel).is_none() {
				debug!("selected node {sel} left the graph");
				self.suggestions.deselect();
			}
		}

		info!(
			"graph loaded: {} nodes, {} edges, fresh={}",
			self.snapshot.nodes.len(),
			self.snapshot.edges.len(),
			fresh
		);
		plan
	}

	/// The request failed; whatever is on screen stays.
	pub fn on_graph_failed(&self, err: &QuoteError) {
		error!("error fetching graph: {err}");
	}

	/// Store the parts catalog.
	pub fn on_catalog_loaded(&mut self, parts: Vec<Part>) {
		debug!("catalog loaded: {} parts", parts.len());
		self.catalog = parts;
	}

	/// Record engine positions, with the current hidden flags, as the cache.
	pub fn on_layout_settled(&mut self, layout: LayoutSnapshot) {
		let known: HashSet<&str> = self.snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
		let visibility = &self.visibility;
		self.cache.replace(
			layout
				.0
				.into_iter()
				.filter(|(id, _)| known.contains(id.as_str()))
				.map(|(id, p)| {
					let hidden = visibility.is_hidden(&id);
					(
						id,
						CachedPosition {
							x: p.x,
							y: p.y,
							hidden,
						},
					)
				}),
		);
		debug!("layout cached for {} nodes", self.cache.len());
	}

	/// Feed one input event to the custom connection workflow.
	pub fn handle_input(&mut self, event: InputEvent) -> Vec<Command> {
		match event {
			InputEvent::Hover(id) => {
				self.workflow.hover(&id);
				Vec::new()
			}
			InputEvent::Blur => {
				self.workflow.blur();
				Vec::new()
			}
			InputEvent::Dismiss => {
				self.dismiss_edge();
				Vec::new()
			}
			InputEvent::Confirm => match self.workflow.confirm() {
				ConfirmOutcome::Armed(source) => {
					info!("edge initiation: source node {source}");
					Vec::new()
				}
				ConfirmOutcome::Captured { source, target } => {
					info!("custom edge pending: {source} -> {target}");
					vec![Command::FetchSlotOptions { source, target }]
				}
				ConfirmOutcome::Cancelled => {
					info!("no valid target selected, cancelling custom edge");
					Vec::new()
				}
				ConfirmOutcome::Ignored => Vec::new(),
			},
		}
	}

	/// Select `id` and request its suggestions.
	pub fn select_node(&mut self, id: &str) -> Vec<Command> {
		if self.snapshot.node(id).is_none() {
			warn!("ignoring selection of unknown node {id}");
			return Vec::new();
		}
		let ticket = self.suggestions.select(id);
		vec![Command::FetchSuggestions {
			ticket,
			node: id.to_string(),
			mode: self.suggestions.mode(),
		}]
	}

	/// Close the suggestion panel.
	pub fn clear_selection(&mut self) {
		self.suggestions.deselect();
	}

	/// Switch mode, re-requesting for the selection.
	pub fn set_suggestion_mode(&mut self, mode: SuggestMode) -> Vec<Command> {
		match self.suggestions.set_mode(mode) {
			Some((ticket, node)) => vec![Command::FetchSuggestions { ticket, node, mode }],
			None => Vec::new(),
		}
	}

	/// Filter the suggestion panel.
	pub fn set_suggestion_query(&mut self, query: &str) {
		self.suggestions.set_query(query);
	}

	/// Apply a suggestion response unless a newer request superseded it.
	pub fn on_suggestions(&mut self, ticket: Ticket, result: Result<SuggestionSet>) {
		match result {
			Ok(set) => {
				if !self.suggestions.accept(ticket, set) {
					debug!("dropping stale suggestions {ticket:?}");
				}
			}
			Err(err) => {
				error!("error fetching suggestions: {err}");
				self.suggestions.fail(ticket);
			}
		}
	}

	/// Recompute visibility from scratch for `filter`. Manual collapses are
	/// overwritten.
	pub fn set_filter(&mut self, filter: GroupFilter) {
		self.filter = filter;
		self.visibility.apply_filter(filter, &self.snapshot.nodes);
		self.sync_hidden_flags();
		debug!("filtered nodes with group {filter:?}");
	}

	/// Picking the active group again clears the filter.
	pub fn toggle_filter(&mut self, picked: GroupFilter) {
		self.set_filter(self.filter.toggled(picked));
	}

	/// Hide or show the dead ends hanging off `id`.
	pub fn collapse_dead_ends(&mut self, id: &str) {
		let flipped = self.visibility.collapse_dead_ends(id, &self.snapshot);
		for nbr in &flipped {
			self.cache.set_hidden(nbr, self.visibility.is_hidden(nbr));
		}
		debug!("toggled {} dead ends around {id}", flipped.len());
	}

	fn sync_hidden_flags(&mut self) {
		for node in &self.snapshot.nodes {
			self.cache
				.set_hidden(&node.id, self.visibility.is_hidden(&node.id));
		}
	}

	/// Slot lookups for a captured pair came back.
	pub fn on_slot_options(
		&mut self,
		source: &str,
		target: &str,
		result: Result<(SuggestionSet, SuggestionSet)>,
	) {
		let applied = match result {
			Ok((a, b)) => self.workflow.slot_options(source, target, &a, &b),
			Err(err) => {
				error!("error fetching slots for {source} -> {target}: {err}");
				self.workflow
					.slot_options_failed(source, target, err.to_string())
			}
		};
		if !applied {
			debug!("dropping slot options for abandoned pair {source} -> {target}");
		}
	}

	/// Send the connect request for `slot`.
	pub fn choose_slot(&mut self, slot: &str) -> Result<Vec<Command>> {
		let request = self.workflow.choose_slot(slot)?;
		info!(
			"connecting {} -> {} via {}",
			request.source, request.target, request.slot
		);
		Ok(vec![Command::Connect(request)])
	}

	/// A successful connect reloads the graph even if the dialog was closed
	/// meanwhile, since the edge now exists. The dialog only reacts to the
	/// reply for the request it sent.
	pub fn on_connect_result(
		&mut self,
		request: &ConnectRequest,
		result: Result<()>,
	) -> Vec<Command> {
		match result {
			Ok(()) => {
				if !self.workflow.connect_succeeded(request) {
					debug!(
						"connect {} -> {} succeeded after the dialog moved on",
						request.source, request.target
					);
				}
				vec![Command::FetchGraph]
			}
			Err(err) => {
				error!("error connecting custom slot: {err}");
				let message = if err.is_rejection() {
					err.to_string()
				} else {
					format!("Could not reach the quote service ({err})")
				};
				if !self.workflow.connect_failed(request, message) {
					debug!("connect failure arrived after the dialog closed");
				}
				Vec::new()
			}
		}
	}

	/// Abandon the custom connection.
	pub fn dismiss_edge(&mut self) {
		if self.workflow.state() != &EdgeDraft::Idle {
			debug!("custom edge dismissed");
		}
		self.workflow.dismiss();
	}

	/// Search the catalog.
	pub fn set_catalog_query(&mut self, query: &str) {
		self.catalog_query = query.to_string();
	}

	/// Add an item by ID and clear the search box.
	pub fn add_item(&mut self, id: &str) -> Vec<Command> {
		let id = id.trim();
		if id.is_empty() {
			return Vec::new();
		}
		self.catalog_query.clear();
		vec![Command::AddItem(id.to_string())]
	}

	/// Remove an item.
	pub fn remove_item(&self, id: &str) -> Vec<Command> {
		vec![Command::RemoveItem(id.to_string())]
	}

	/// Flip the active flag of the selected node's backing items.
	pub fn toggle_selected_active(&self) -> Vec<Command> {
		let Some(node) = self.suggestions.selected().and_then(|id| self.snapshot.node(id)) else {
			return Vec::new();
		};
		vec![Command::ToggleActive {
			uid: node.uid.clone(),
			active: !node.active,
		}]
	}

	/// Forget all session state; the next graph is laid out from scratch.
	pub fn reset(&mut self) {
		self.snapshot = GraphSnapshot::default();
		self.cache.clear();
		self.layout_primed = false;
		self.filter = GroupFilter::None;
		self.visibility.clear();
		self.workflow.reset();
		self.suggestions.deselect();
		self.catalog_query.clear();
	}

	/// Empty the quote and start the layout over.
	pub fn clear(&mut self) -> Vec<Command> {
		self.reset();
		vec![Command::ClearAll]
	}

	/// An uploaded quote replaces everything, so lay it out fresh.
	pub fn begin_file_load(&mut self) {
		debug!("file upload started, resetting session");
		self.reset();
	}

	/// Style of every node in the snapshot.
	pub fn node_styles(&self) -> Vec<NodeStyle> {
		let degrees = degree_map(&self.snapshot.nodes, &self.snapshot.edges);
		self.snapshot
			.nodes
			.iter()
			.map(|n| NodeStyle {
				id: n.id.clone(),
				label: n.label.clone(),
				class: DegreeClass::of(degrees[&n.id], self.snapshot.is_open_slot(&n.id)),
				active: n.active,
				ghost: n.ghost,
			})
			.collect()
	}

	/// Canvas annotations for the current state.
	pub fn overlay(&self) -> GraphOverlay {
		GraphOverlay {
			hidden: self.visibility.hidden().clone(),
			shown_edges: self.visibility.shown_edges(&self.snapshot),
			badges: badges(&self.snapshot, &self.visibility),
			armed: self.workflow.armed_source().map(str::to_string),
			selected: self.suggestions.selected().map(str::to_string),
		}
	}

	/// Panel view-model for the current state.
	pub fn view(&self) -> SessionView {
		SessionView {
			items: self.snapshot.items.clone(),
			status_message: self.snapshot.status_message.clone(),
			warnings: self
				.snapshot
				.warnings
				.iter()
				.map(|w| Warning {
					text: w.clone(),
					part_id: catalog::warning_part_id(w).map(str::to_string),
				})
				.collect(),
			filter: self.filter,
			selected: self
				.suggestions
				.selected()
				.and_then(|id| self.snapshot.node(id))
				.cloned(),
			suggestions: self.suggestions.panel(),
			edge: self.workflow.state().clone(),
			catalog_query: self.catalog_query.clone(),
			catalog_hits: catalog::search(&self.catalog, &self.catalog_query)
				.into_iter()
				.cloned()
				.collect(),
			node_count: self.snapshot.nodes.len(),
			edge_count: self.snapshot.edges.len(),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;
	use crate::graph::custom_edge::SlotOptions;
	use crate::graph::input::InputSource;
	use crate::graph::input::scripted::ScriptedInput;
	use crate::graph::layout::{PhysicsPhase, Point};
	use crate::graph::model::Edge;
	use crate::graph::suggest::Candidate;

	fn graph(ids: &[&str], edges: &[(&str, &str)]) -> GraphSnapshot {
		GraphSnapshot {
			nodes: ids.iter().map(|id| Node::new(*id)).collect(),
			edges: edges.iter().map(|(a, b)| Edge::new(*a, *b)).collect(),
			..GraphSnapshot::default()
		}
	}

	fn slots(names: &[&str]) -> SuggestionSet {
		names
			.iter()
			.map(|n| (n.to_string(), vec![Candidate::new("P-1", "Part")]))
			.collect()
	}

	fn suggestion_ticket(cmds: &[Command]) -> Ticket {
		match cmds {
			[Command::FetchSuggestions { ticket, .. }] => *ticket,
			other => panic!("expected a suggestion fetch, got {other:?}"),
		}
	}

	#[test]
	fn first_load_is_fresh_and_later_loads_reuse_positions() {
		let mut s = QuoteSession::default();
		assert_eq!(s.start(), vec![Command::FetchGraph, Command::FetchCatalog]);

		let empty = s.on_graph_loaded(GraphSnapshot::default());
		assert!(!empty.fresh);

		let plan = s.on_graph_loaded(graph(&["a", "b", "o"], &[("a", "b")]));
		assert!(plan.fresh);
		assert!(plan.seed("o").pinned);

		s.on_layout_settled(LayoutSnapshot(vec![
			("a".into(), Point::new(5.0, 6.0)),
			("b".into(), Point::new(7.0, 8.0)),
			("gone".into(), Point::new(0.0, 0.0)),
		]));
		assert_eq!(s.cache().len(), 2);

		let plan = s.on_graph_loaded(graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]));
		assert!(!plan.fresh);
		assert_eq!(plan.phase, PhysicsPhase::Steady);
		assert_eq!(plan.seed("a").position, Some(Point::new(5.0, 6.0)));
		assert_eq!(plan.seed("c").position, None);
	}

	#[test]
	fn collapsed_nodes_stay_hidden_across_reload() {
		let mut s = QuoteSession::default();
		s.on_graph_loaded(graph(&["hub", "leaf", "x", "y"], &[("hub", "leaf"), ("hub", "x"), ("x", "y")]));
		s.on_layout_settled(LayoutSnapshot(vec![
			("hub".into(), Point::default()),
			("leaf".into(), Point::default()),
		]));

		s.collapse_dead_ends("hub");
		assert!(s.overlay().hidden.contains("leaf"));
		assert!(s.overlay().badges["hub"].hidden_neighbors);

		s.on_graph_loaded(graph(&["hub", "leaf", "x", "y"], &[("hub", "leaf"), ("hub", "x"), ("x", "y")]));
		let overlay = s.overlay();
		assert!(overlay.hidden.contains("leaf"));
		assert_eq!(overlay.shown_edges.len(), 2);
	}

	#[test]
	fn clear_resets_everything_and_next_load_is_fresh() {
		let mut s = QuoteSession::default();
		s.on_graph_loaded(graph(&["a", "b"], &[("a", "b")]));
		s.on_layout_settled(LayoutSnapshot(vec![("a".into(), Point::new(1.0, 1.0))]));
		s.handle_input(InputEvent::Hover("a".into()));
		s.handle_input(InputEvent::Confirm);
		s.toggle_filter(GroupFilter::Interlock);

		assert_eq!(s.clear(), vec![Command::ClearAll]);
		assert!(s.cache().is_empty());
		assert_eq!(s.workflow().state(), &EdgeDraft::Idle);
		assert_eq!(s.workflow().hovered(), None);
		assert_eq!(s.view().filter, GroupFilter::None);

		assert!(s.on_graph_loaded(graph(&["a"], &[])).fresh);
	}

	#[test]
	fn file_load_forces_a_fresh_layout() {
		let mut s = QuoteSession::default();
		s.on_graph_loaded(graph(&["a"], &[]));
		s.begin_file_load();
		assert!(s.on_graph_loaded(graph(&["z"], &[])).fresh);
	}

	#[test]
	fn scripted_keyboard_drives_the_edge_workflow() {
		let session = Rc::new(RefCell::new(QuoteSession::default()));
		session
			.borrow_mut()
			.on_graph_loaded(graph(&["A", "B"], &[]));

		let issued = Rc::new(RefCell::new(Vec::new()));
		let input = ScriptedInput::default();
		let (s, out) = (session.clone(), issued.clone());
		let sub = input.subscribe(Box::new(move |ev| {
			out.borrow_mut().extend(s.borrow_mut().handle_input(ev));
		}));

		input.emit(InputEvent::Hover("A".into()));
		input.emit(InputEvent::Confirm);
		assert_eq!(session.borrow().overlay().armed.as_deref(), Some("A"));

		input.emit(InputEvent::Blur);
		input.emit(InputEvent::Hover("B".into()));
		input.emit(InputEvent::Confirm);
		assert_eq!(
			*issued.borrow(),
			vec![Command::FetchSlotOptions {
				source: "A".into(),
				target: "B".into()
			}]
		);

		input.emit(InputEvent::Dismiss);
		assert_eq!(session.borrow().workflow().state(), &EdgeDraft::Idle);
		input.unsubscribe(sub);
	}

	#[test]
	fn connect_round_trip() {
		let mut s = QuoteSession::default();
		s.on_graph_loaded(graph(&["A", "B"], &[]));
		s.handle_input(InputEvent::Hover("A".into()));
		s.handle_input(InputEvent::Confirm);
		s.handle_input(InputEvent::Hover("B".into()));
		s.handle_input(InputEvent::Confirm);

		s.on_slot_options("A", "B", Ok((slots(&["Power"]), slots(&["BNC"]))));
		match &s.view().edge {
			EdgeDraft::AwaitingSlotChoice(p) => {
				assert_eq!(p.slots, SlotOptions::Ready(vec!["Power".into(), "BNC".into()]))
			}
			other => panic!("unexpected state {other:?}"),
		}

		let cmds = s.choose_slot("BNC").unwrap();
		assert!(matches!(&cmds[..], [Command::Connect(r)] if r.slot == "BNC"));
		let bnc = connect_request(&cmds);

		let rejected = QuoteError::Rejected {
			status: 400,
			message: "Both nodes already have the slot".into(),
		};
		assert!(s.on_connect_result(&bnc, Err(rejected)).is_empty());
		match &s.view().edge {
			EdgeDraft::AwaitingSlotChoice(p) => {
				assert_eq!(p.error.as_deref(), Some("Both nodes already have the slot"))
			}
			other => panic!("unexpected state {other:?}"),
		}

		let power = connect_request(&s.choose_slot("Power").unwrap());
		assert_eq!(s.on_connect_result(&power, Ok(())), vec![Command::FetchGraph]);
		assert_eq!(s.view().edge, EdgeDraft::Idle);
	}

	fn connect_request(cmds: &[Command]) -> ConnectRequest {
		match cmds {
			[Command::Connect(r)] => r.clone(),
			other => panic!("expected one connect, got {other:?}"),
		}
	}

	fn capture(s: &mut QuoteSession, source: &str, target: &str) {
		s.handle_input(InputEvent::Hover(source.into()));
		s.handle_input(InputEvent::Confirm);
		s.handle_input(InputEvent::Hover(target.into()));
		s.handle_input(InputEvent::Confirm);
	}

	#[test]
	fn late_connect_reply_does_not_touch_a_newer_dialog() {
		let mut s = QuoteSession::default();
		s.on_graph_loaded(graph(&["A", "B", "C", "D"], &[]));
		capture(&mut s, "A", "B");
		s.on_slot_options("A", "B", Ok((slots(&["Power"]), slots(&[]))));
		let stale = connect_request(&s.choose_slot("Power").unwrap());
		s.dismiss_edge();

		capture(&mut s, "C", "D");
		s.on_slot_options("C", "D", Ok((slots(&["Power"]), slots(&[]))));

		let rejected = QuoteError::Rejected {
			status: 400,
			message: "A-B slot full".into(),
		};
		assert!(s.on_connect_result(&stale, Err(rejected)).is_empty());
		// The A-B edge exists now, so the graph still reloads.
		assert_eq!(s.on_connect_result(&stale, Ok(())), vec![Command::FetchGraph]);
		match &s.view().edge {
			EdgeDraft::AwaitingSlotChoice(p) => {
				assert_eq!((p.source.as_str(), p.target.as_str()), ("C", "D"));
				assert!(p.error.is_none());
				assert!(p.in_flight.is_none());
			}
			other => panic!("unexpected state {other:?}"),
		}
	}

	#[test]
	fn slow_suggestions_for_an_old_selection_are_ignored() {
		let mut s = QuoteSession::default();
		s.on_graph_loaded(graph(&["A", "B"], &[("A", "B")]));

		let for_a = suggestion_ticket(&s.select_node("A"));
		let for_b = suggestion_ticket(&s.select_node("B"));
		s.on_suggestions(for_b, Ok(slots(&["b-slot"])));
		s.on_suggestions(for_a, Ok(slots(&["a-slot"])));

		let panel = s.view().suggestions;
		assert_eq!(panel.node.as_deref(), Some("B"));
		assert_eq!(panel.slots.slot_names().collect::<Vec<_>>(), vec!["b-slot"]);
		assert!(s.select_node("nope").is_empty());
	}

	#[test]
	fn selection_is_dropped_when_its_node_disappears() {
		let mut s = QuoteSession::default();
		s.on_graph_loaded(graph(&["A", "B"], &[]));
		s.select_node("A");
		assert_eq!(s.view().selected.map(|n| n.id), Some("A".to_string()));

		s.on_graph_loaded(graph(&["B"], &[]));
		assert!(s.view().selected.is_none());
		assert!(s.toggle_selected_active().is_empty());
	}

	#[test]
	fn toggle_active_sends_backing_uids() {
		let mut snap = graph(&["A"], &[]);
		snap.nodes[0].uid = vec![serde_json::json!(4), serde_json::json!(7)];
		let mut s = QuoteSession::default();
		s.on_graph_loaded(snap);
		s.select_node("A");
		assert_eq!(
			s.toggle_selected_active(),
			vec![Command::ToggleActive {
				uid: vec![serde_json::json!(4), serde_json::json!(7)],
				active: false
			}]
		);
	}

	#[test]
	fn styles_follow_degree_and_open_slots() {
		let mut snap = graph(&["a", "b", "c", "d", "e"], &[("a", "b"), ("a", "c"), ("a", "d"), ("b", "c")]);
		snap.open_slot_nodes = vec!["d".into()];
		let mut s = QuoteSession::default();
		s.on_graph_loaded(snap);

		let classes: HashMap<NodeId, DegreeClass> =
			s.node_styles().into_iter().map(|st| (st.id, st.class)).collect();
		assert_eq!(classes["a"], DegreeClass::Hub);
		assert_eq!(classes["b"], DegreeClass::Double);
		assert_eq!(classes["d"], DegreeClass::OpenSlot);
		assert_eq!(classes["e"], DegreeClass::Isolated);
	}

	#[test]
	fn view_exposes_catalog_hits_and_warning_ids() {
		let mut s = QuoteSession::default();
		let mut snap = graph(&[], &[]);
		snap.warnings = vec!["Missing cable (CBL-1)".into(), "General note".into()];
		s.on_graph_loaded(snap);
		s.on_catalog_loaded(vec![Part {
			id: "CBL-1".into(),
			description: "BNC cable".into(),
		}]);
		s.set_catalog_query("bnc");

		let view = s.view();
		assert_eq!(view.catalog_hits.len(), 1);
		assert_eq!(view.warnings[0].part_id.as_deref(), Some("CBL-1"));
		assert_eq!(view.warnings[1].part_id, None);

		assert_eq!(s.add_item("  CBL-1 "), vec![Command::AddItem("CBL-1".into())]);
		assert!(s.view().catalog_hits.is_empty());
		assert!(s.add_item("   ").is_empty());
	}
}
