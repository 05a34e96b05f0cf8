//! Client-side refinement of slot suggestions, and the bookkeeping that keeps
//! a late response from overwriting the panel of a newer selection.

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::model::NodeId;

/// The search box is offered from this many candidates up.
pub const SEARCH_THRESHOLD: usize = 10;

/// A part that could fill a slot.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Candidate {
	/// Part ID.
	#[serde(rename = "ID")]
	pub id: String,
	/// Display name, used for sorting.
	#[serde(rename = "Name")]
	pub name: String,
}

impl Candidate {
	/// Candidate with `id` and `name`.
	pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
		}
	}

	fn matches(&self, needle: &str) -> bool {
		self.id.to_lowercase().contains(needle) || self.name.to_lowercase().contains(needle)
	}
}

/// Which slots the compatibility service should report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum SuggestMode {
	/// Every slot of the part.
	#[default]
	#[serde(rename = "all parts")]
	AllParts,
	/// Only slots that are still unfilled.
	#[serde(rename = "missing parts")]
	MissingParts,
}

impl SuggestMode {
	/// Query-string value.
	pub fn as_str(self) -> &'static str {
		match self {
			SuggestMode::AllParts => "all parts",
			SuggestMode::MissingParts => "missing parts",
		}
	}
}

/// Slot name to candidate parts, in the order the service listed them. Slot
/// names are opaque.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SuggestionSet {
	slots: IndexMap<String, Vec<Candidate>>,
}

impl FromIterator<(String, Vec<Candidate>)> for SuggestionSet {
	fn from_iter<T: IntoIterator<Item = (String, Vec<Candidate>)>>(iter: T) -> Self {
		Self {
			slots: iter.into_iter().collect(),
		}
	}
}

/// Name order: case-insensitive, ties broken by exact text so the result is
/// total and repeatable.
fn by_name(a: &Candidate, b: &Candidate) -> Ordering {
	a.name
		.to_lowercase()
		.cmp(&b.name.to_lowercase())
		.then_with(|| a.name.cmp(&b.name))
}

impl SuggestionSet {
	/// Candidates across all slots, before any text filter.
	pub fn total_count(&self) -> usize {
		self.slots.values().map(Vec::len).sum()
	}

	/// True when no slot is listed.
	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Slot names in service order.
	pub fn slot_names(&self) -> impl Iterator<Item = &str> {
		self.slots.keys().map(String::as_str)
	}

	/// Slots with their candidates, in service order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &[Candidate])> {
		self.slots.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
	}

	/// Candidates for one slot.
	pub fn slot(&self, name: &str) -> Option<&[Candidate]> {
		self.slots.get(name).map(Vec::as_slice)
	}

	/// Keep candidates whose id or name contains `query` (any case), drop
	/// slots left empty, and sort each slot by name.
	pub fn refine(&self, query: &str) -> SuggestionSet {
		let needle = query.to_lowercase();
		self.slots
			.iter()
			.filter_map(|(slot, parts)| {
				let mut kept: Vec<Candidate> =
					parts.iter().filter(|p| p.matches(&needle)).cloned().collect();
				if kept.is_empty() {
					return None;
				}
				kept.sort_by(by_name);
				Some((slot.clone(), kept))
			})
			.collect()
	}
}

/// Wire shape of a suggestion response.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SuggestResponse {
	/// Candidates by slot.
	#[serde(default)]
	pub suggestions: SuggestionSet,
}

/// Identifies one suggestion request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Selection, mode, search text and the last accepted response.
#[derive(Clone, Debug, Default)]
pub struct SuggestionTracker {
	next: u64,
	pending: Option<Ticket>,
	selected: Option<NodeId>,
	mode: SuggestMode,
	raw: SuggestionSet,
	query: String,
}

/// What the suggestion panel shows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SuggestionPanel {
	/// Selected node.
	pub node: Option<NodeId>,
	/// Mode of the last request.
	pub mode: SuggestMode,
	/// Search text.
	pub query: String,
	/// A request is outstanding.
	pub loading: bool,
	/// Candidates before the text filter.
	pub total: usize,
	/// Whether to offer the search box.
	pub show_search: bool,
	/// Filtered and sorted candidates.
	pub slots: SuggestionSet,
}

impl SuggestionTracker {
	fn issue(&mut self) -> Ticket {
		self.next += 1;
		let ticket = Ticket(self.next);
		self.pending = Some(ticket);
		ticket
	}

	/// Selected node.
	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	/// Current mode.
	pub fn mode(&self) -> SuggestMode {
		self.mode
	}

	/// Select `node`; any earlier request becomes stale.
	pub fn select(&mut self, node: &str) -> Ticket {
		self.selected = Some(node.to_string());
		self.query.clear();
		self.raw = SuggestionSet::default();
		self.issue()
	}

	/// Change mode; re-request for the current selection if there is one.
	pub fn set_mode(&mut self, mode: SuggestMode) -> Option<(Ticket, NodeId)> {
		self.mode = mode;
		let node = self.selected.clone()?;
		Some((self.issue(), node))
	}

	/// Drop the selection and every outstanding ticket.
	pub fn deselect(&mut self) {
		self.selected = None;
		self.pending = None;
		self.raw = SuggestionSet::default();
		self.query.clear();
	}

	/// Set the search text.
	pub fn set_query(&mut self, query: &str) {
		self.query = query.to_string();
	}

	/// Store `set` if `ticket` is the newest request. Returns false for a
	/// stale response, which is dropped.
	pub fn accept(&mut self, ticket: Ticket, set: SuggestionSet) -> bool {
		if self.pending != Some(ticket) {
			return false;
		}
		self.pending = None;
		self.raw = set;
		true
	}

	/// Forget `ticket` after a failed request, keeping whatever was shown.
	pub fn fail(&mut self, ticket: Ticket) {
		if self.pending == Some(ticket) {
			self.pending = None;
		}
	}

	/// View-model for the suggestion panel.
	pub fn panel(&self) -> SuggestionPanel {
		let total = self.raw.total_count();
		SuggestionPanel {
			node: self.selected.clone(),
			mode: self.mode,
			query: self.query.clone(),
			loading: self.pending.is_some(),
			total,
			show_search: total >= SEARCH_THRESHOLD,
			slots: self.raw.refine(&self.query),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> SuggestionSet {
		[
			(
				"BNC|Trigger".to_string(),
				vec![
					Candidate::new("CBL-2", "bnc cable 2m"),
					Candidate::new("CBL-1", "BNC Cable 1m"),
					Candidate::new("ADP-9", "Adapter"),
				],
			),
			(
				"Interlock".to_string(),
				vec![Candidate::new("IL-1", "Interlock Key")],
			),
		]
		.into_iter()
		.collect()
	}

	#[test]
	fn decodes_wire_response() {
		let json = r#"{"suggestions": {"Power": [{"ID": "PSU-1", "Name": "Supply"}]}}"#;
		let resp: SuggestResponse = serde_json::from_str(json).unwrap();
		assert_eq!(resp.suggestions.total_count(), 1);
		assert_eq!(resp.suggestions.slot("Power").unwrap()[0].id, "PSU-1");
		assert_eq!(serde_json::to_string(&SuggestMode::MissingParts).unwrap(), "\"missing parts\"");
	}

	#[test]
	fn refine_is_a_sorted_subset() {
		let all = sample();
		for q in ["", "cbl", "CABLE", "key", "nothing-matches"] {
			let out = all.refine(q);
			for (slot, parts) in out.iter() {
				assert!(!parts.is_empty());
				let source = all.slot(slot).unwrap();
				assert!(parts.iter().all(|p| source.contains(p)));
				assert!(parts.windows(2).all(|w| by_name(&w[0], &w[1]) != Ordering::Greater));
			}
		}

		let cables = all.refine("cable");
		assert_eq!(cables.slot_names().collect::<Vec<_>>(), vec!["BNC|Trigger"]);
		let ids: Vec<&str> = cables.slot("BNC|Trigger").unwrap().iter().map(|p| p.id.as_str()).collect();
		assert_eq!(ids, vec!["CBL-1", "CBL-2"]);
		assert!(all.refine("nothing-matches").is_empty());
	}

	#[test]
	fn refine_is_deterministic_for_equal_names() {
		let set: SuggestionSet = [(
			"s".to_string(),
			vec![Candidate::new("b", "Same"), Candidate::new("a", "same"), Candidate::new("c", "Same")],
		)]
		.into_iter()
		.collect();
		let once = set.refine("");
		assert_eq!(once, set.refine(""));
		let ids: Vec<&str> = once.slot("s").unwrap().iter().map(|p| p.id.as_str()).collect();
		assert_eq!(ids, vec!["b", "c", "a"]);
	}

	#[test]
	fn stale_responses_are_dropped() {
		let mut t = SuggestionTracker::default();
		let first = t.select("A");
		let second = t.select("B");

		assert!(!t.accept(first, sample()));
		assert!(t.panel().slots.is_empty());
		assert!(t.panel().loading);

		assert!(t.accept(second, sample()));
		let panel = t.panel();
		assert_eq!(panel.node.as_deref(), Some("B"));
		assert_eq!(panel.total, 4);
		assert!(!panel.show_search);
		assert!(!panel.loading);
	}

	#[test]
	fn mode_change_reissues_for_the_selection() {
		let mut t = SuggestionTracker::default();
		assert!(t.set_mode(SuggestMode::MissingParts).is_none());

		let first = t.select("A");
		let (ticket, node) = t.set_mode(SuggestMode::AllParts).unwrap();
		assert_eq!(node, "A");
		assert_ne!(ticket, first);
		assert!(!t.accept(first, sample()));
		assert!(t.accept(ticket, sample()));
	}

	#[test]
	fn deselect_invalidates_outstanding_requests() {
		let mut t = SuggestionTracker::default();
		let ticket = t.select("A");
		t.deselect();
		assert!(!t.accept(ticket, sample()));
		assert_eq!(t.panel(), SuggestionPanel::default());
	}

	#[test]
	fn query_filters_the_panel_and_resets_on_selection() {
		let mut t = SuggestionTracker::default();
		let ticket = t.select("A");
		t.accept(ticket, sample());
		t.set_query("key");
		assert_eq!(t.panel().slots.total_count(), 1);
		assert_eq!(t.panel().total, 4);

		t.select("B");
		assert!(t.panel().query.is_empty());
	}

	#[test]
	fn search_box_appears_at_ten_candidates() {
		let many = |n: usize| -> SuggestionSet {
			[(
				"Power".to_string(),
				(0..n)
					.map(|i| Candidate::new(format!("PSU-{i}"), "Supply"))
					.collect::<Vec<_>>(),
			)]
			.into_iter()
			.collect()
		};
		let mut t = SuggestionTracker::default();
		let ticket = t.select("A");
		t.accept(ticket, many(9));
		assert!(!t.panel().show_search);

		let ticket = t.select("A");
		t.accept(ticket, many(10));
		let panel = t.panel();
		assert_eq!(panel.total, 10);
		assert!(panel.show_search);
	}

	#[test]
	fn slots_keep_service_order() {
		let json = r#"{"suggestions": {"Power": [], "BNC": [{"ID": "C", "Name": "c"}], "Key": []}}"#;
		let resp: SuggestResponse = serde_json::from_str(json).unwrap();
		assert_eq!(
			resp.suggestions.slot_names().collect::<Vec<_>>(),
			vec!["Power", "BNC", "Key"]
		);
	}
}
