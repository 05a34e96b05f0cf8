//! Keyboard-driven creation of a manual connection between two parts.
//!
//! The operator hovers a part and confirms to arm it as the source, hovers a
//! second part and confirms again to capture the pair, then picks one of the
//! slots the compatibility service reports for either end. A successful
//! connection cannot be undone.

use serde::Serialize;

use super::model::NodeId;
use super::suggest::SuggestionSet;
use crate::error::{QuoteError, Result};

/// Slots offered for the captured pair.
#[derive(Clone, Debug, PartialEq)]
pub enum SlotOptions {
	/// Waiting for the compatibility service.
	Loading,
	/// Source slots first, then new target slots.
	Ready(Vec<String>),
	/// The lookup failed; the message is shown instead.
	Unavailable(String),
}

/// A captured source/target pair waiting for a slot.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingEdge {
	/// Armed first.
	pub source: NodeId,
	/// Captured second.
	pub target: NodeId,
	/// Slots to choose from.
	pub slots: SlotOptions,
	/// Last rejection from the service, shown inline.
	pub error: Option<String>,
	/// Slot whose connect request has not answered yet.
	pub in_flight: Option<String>,
}

/// Progress of a custom connection.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum EdgeDraft {
	/// Nothing in progress.
	#[default]
	Idle,
	/// A source is armed and waits for a target.
	SourceArmed {
		/// The armed node.
		source: NodeId,
	},
	/// A pair is captured and waits for a slot.
	AwaitingSlotChoice(PendingEdge),
}

/// Result of a confirm event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
	/// A source was armed.
	Armed(NodeId),
	/// A pair was captured.
	Captured {
		/// The armed source.
		source: NodeId,
		/// The hovered target.
		target: NodeId,
	},
	/// The armed source was dropped.
	Cancelled,
	/// Nothing changed.
	Ignored,
}

/// Body of a connect request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConnectRequest {
	/// Node the connection starts at.
	pub source: NodeId,
	/// Node the connection ends at.
	pub target: NodeId,
	/// Slot to connect through.
	pub slot: String,
}

/// Slot names of `first` followed by those of `second` not already listed.
pub fn union_slots(first: &SuggestionSet, second: &SuggestionSet) -> Vec<String> {
	let mut out: Vec<String> = Vec::new();
	for name in first.slot_names().chain(second.slot_names()) {
		if !out.iter().any(|s| s == name) {
			out.push(name.to_string());
		}
	}
	out
}

/// Hover tracking plus the [`EdgeDraft`] state machine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CustomEdgeWorkflow {
	state: EdgeDraft,
	hovered: Option<NodeId>,
}

impl CustomEdgeWorkflow {
	/// Current state.
	pub fn state(&self) -> &EdgeDraft {
		&self.state
	}

	/// Node under the pointer, or the last one while a source is armed.
	pub fn hovered(&self) -> Option<&str> {
		self.hovered.as_deref()
	}

	/// The armed source, if any.
	pub fn armed_source(&self) -> Option<&str> {
		match &self.state {
			EdgeDraft::SourceArmed { source } => Some(source),
			_ => None,
		}
	}

	/// The captured pair, if any.
	pub fn pending(&self) -> Option<&PendingEdge> {
		match &self.state {
			EdgeDraft::AwaitingSlotChoice(p) => Some(p),
			_ => None,
		}
	}

	fn pending_mut(&mut self) -> Option<&mut PendingEdge> {
		match &mut self.state {
			EdgeDraft::AwaitingSlotChoice(p) => Some(p),
			_ => None,
		}
	}

	/// Pointer or focus entered `id`.
	pub fn hover(&mut self, id: &str) {
		self.hovered = Some(id.to_string());
	}

	/// Pointer or focus left a node. An armed source keeps the last hover.
	pub fn blur(&mut self) {
		if self.armed_source().is_none() {
			self.hovered = None;
		}
	}

	/// Advance on Enter.
	pub fn confirm(&mut self) -> ConfirmOutcome {
		match &self.state {
			EdgeDraft::Idle => match &self.hovered {
				Some(h) => {
					let source = h.clone();
					self.state = EdgeDraft::SourceArmed {
						source: source.clone(),
					};
					ConfirmOutcome::Armed(source)
				}
				None => ConfirmOutcome::Ignored,
			},
			EdgeDraft::SourceArmed { source } => match &self.hovered {
				Some(h) if h != source => {
					let (source, target) = (source.clone(), h.clone());
					self.state = EdgeDraft::AwaitingSlotChoice(PendingEdge {
						source: source.clone(),
						target: target.clone(),
						slots: SlotOptions::Loading,
						error: None,
						in_flight: None,
					});
					ConfirmOutcome::Captured { source, target }
				}
				_ => {
					self.state = EdgeDraft::Idle;
					ConfirmOutcome::Cancelled
				}
			},
			EdgeDraft::AwaitingSlotChoice(_) => ConfirmOutcome::Ignored,
		}
	}

	fn is_pending_pair(&self, source: &str, target: &str) -> bool {
		self.pending()
			.is_some_and(|p| p.source == source && p.target == target)
	}

	/// Install the slot union for `source`/`target`. Ignored unless that pair
	/// is still pending.
	pub fn slot_options(
		&mut self,
		source: &str,
		target: &str,
		from_source: &SuggestionSet,
		from_target: &SuggestionSet,
	) -> bool {
		if !self.is_pending_pair(source, target) {
			return false;
		}
		if let Some(p) = self.pending_mut() {
			p.slots = SlotOptions::Ready(union_slots(from_source, from_target));
		}
		true
	}

	/// Record a failed slot lookup. Ignored unless that pair is still pending.
	pub fn slot_options_failed(&mut self, source: &str, target: &str, message: String) -> bool {
		if !self.is_pending_pair(source, target) {
			return false;
		}
		if let Some(p) = self.pending_mut() {
			p.slots = SlotOptions::Unavailable(message);
		}
		true
	}

	/// Pick `slot` and produce the connect request to send.
	pub fn choose_slot(&mut self, slot: &str) -> Result<ConnectRequest> {
		let p = self
			.pending_mut()
			.ok_or(QuoteError::Workflow("no connection is pending"))?;
		if p.in_flight.is_some() {
			return Err(QuoteError::Workflow("a connection request is already running"));
		}
		if let SlotOptions::Ready(slots) = &p.slots {
			if !slots.iter().any(|s| s == slot) {
				return Err(QuoteError::Workflow("slot is not offered for this pair"));
			}
		}
		p.error = None;
		p.in_flight = Some(slot.to_string());
		Ok(ConnectRequest {
			source: p.source.clone(),
			target: p.target.clone(),
			slot: slot.to_string(),
		})
	}

	/// Whether `request` is the one in flight for the pending pair.
	fn is_in_flight(&self, request: &ConnectRequest) -> bool {
		self.pending().is_some_and(|p| {
			p.source == request.source
				&& p.target == request.target
				&& p.in_flight.as_deref() == Some(request.slot.as_str())
		})
	}

	/// The service accepted `request`. Returns false when the reply belongs
	/// to a pair that is no longer pending.
	pub fn connect_succeeded(&mut self, request: &ConnectRequest) -> bool {
		if !self.is_in_flight(request) {
			return false;
		}
		self.state = EdgeDraft::Idle;
		true
	}

	/// The service refused `request`; stay open for another slot or a
	/// dismissal.
	pub fn connect_failed(&mut self, request: &ConnectRequest, message: String) -> bool {
		if !self.is_in_flight(request) {
			return false;
		}
		match self.pending_mut() {
			Some(p) => {
				p.in_flight = None;
				p.error = Some(message);
				true
			}
			None => false,
		}
	}

	/// Abandon whatever is in progress. Nothing is sent.
	pub fn dismiss(&mut self) {
		self.state = EdgeDraft::Idle;
	}

	/// Back to idle with no hover.
	pub fn reset(&mut self) {
		*self = Self::default();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::suggest::Candidate;

	fn slots(names: &[&str]) -> SuggestionSet {
		names
			.iter()
			.map(|n| (n.to_string(), vec![Candidate::new("x", "x")]))
			.collect()
	}

	fn captured(a: &str, b: &str) -> CustomEdgeWorkflow {
		let mut wf = CustomEdgeWorkflow::default();
		wf.hover(a);
		wf.confirm();
		wf.hover(b);
		wf.confirm();
		wf
	}

	#[test]
	fn confirm_sequence_arms_then_captures() {
		let mut wf = CustomEdgeWorkflow::default();
		wf.hover("A");
		assert_eq!(wf.confirm(), ConfirmOutcome::Armed("A".into()));
		assert_eq!(wf.armed_source(), Some("A"));

		wf.hover("B");
		assert_eq!(
			wf.confirm(),
			ConfirmOutcome::Captured {
				source: "A".into(),
				target: "B".into()
			}
		);
		let p = wf.pending().unwrap();
		assert_eq!((p.source.as_str(), p.target.as_str()), ("A", "B"));
		assert_eq!(p.slots, SlotOptions::Loading);
	}

	#[test]
	fn confirming_on_the_source_cancels() {
		let mut wf = CustomEdgeWorkflow::default();
		wf.hover("A");
		wf.confirm();
		assert_eq!(wf.confirm(), ConfirmOutcome::Cancelled);
		assert_eq!(wf.state(), &EdgeDraft::Idle);
	}

	#[test]
	fn confirm_without_hover_does_nothing_when_idle() {
		let mut wf = CustomEdgeWorkflow::default();
		assert_eq!(wf.confirm(), ConfirmOutcome::Ignored);
		assert_eq!(wf.state(), &EdgeDraft::Idle);
	}

	#[test]
	fn blur_keeps_hover_only_while_armed() {
		let mut wf = CustomEdgeWorkflow::default();
		wf.hover("A");
		wf.blur();
		assert_eq!(wf.hovered(), None);

		wf.hover("A");
		wf.confirm();
		wf.blur();
		assert_eq!(wf.hovered(), Some("A"));
		// The kept hover is the source itself, so this cancels.
		assert_eq!(wf.confirm(), ConfirmOutcome::Cancelled);
	}

	#[test]
	fn slot_union_keeps_source_order_then_new_target_slots() {
		let mut wf = captured("A", "B");
		assert!(!wf.slot_options("A", "C", &slots(&["x"]), &slots(&[])));
		assert!(wf.slot_options("A", "B", &slots(&["Power", "BNC"]), &slots(&["BNC", "Key"])));
		assert_eq!(
			wf.pending().unwrap().slots,
			SlotOptions::Ready(vec!["Power".into(), "BNC".into(), "Key".into()])
		);
	}

	#[test]
	fn failed_connect_stays_open_for_retry() {
		let mut wf = captured("A", "B");
		wf.slot_options("A", "B", &slots(&["Power", "BNC"]), &slots(&[]));

		let req = wf.choose_slot("Power").unwrap();
		assert_eq!(req.slot, "Power");
		assert!(matches!(wf.choose_slot("BNC"), Err(QuoteError::Workflow(_))));

		assert!(wf.connect_failed(&req, "Both nodes already have the slot".into()));
		let p = wf.pending().unwrap();
		assert_eq!(p.error.as_deref(), Some("Both nodes already have the slot"));
		assert!(p.in_flight.is_none());

		let retry = wf.choose_slot("BNC").unwrap();
		assert_eq!(retry.target, "B");
		assert!(wf.pending().unwrap().error.is_none());
		assert!(!wf.connect_succeeded(&req));
		assert!(wf.connect_succeeded(&retry));
		assert_eq!(wf.state(), &EdgeDraft::Idle);
	}

	#[test]
	fn unknown_slot_and_idle_choice_are_rejected() {
		let mut wf = CustomEdgeWorkflow::default();
		assert!(wf.choose_slot("Power").is_err());

		let mut wf = captured("A", "B");
		wf.slot_options("A", "B", &slots(&["Power"]), &slots(&[]));
		assert!(wf.choose_slot("Nope").is_err());
	}

	#[test]
	fn dismiss_discards_the_pair() {
		let mut wf = captured("A", "B");
		assert_eq!(wf.confirm(), ConfirmOutcome::Ignored);
		wf.dismiss();
		assert_eq!(wf.state(), &EdgeDraft::Idle);
		let late = ConnectRequest {
			source: "A".into(),
			target: "B".into(),
			slot: "Power".into(),
		};
		assert!(!wf.connect_failed(&late, "late".into()));
		assert!(!wf.slot_options("A", "B", &slots(&["x"]), &slots(&[])));
	}

	#[test]
	fn late_reply_for_a_dismissed_pair_leaves_the_new_pair_alone() {
		let mut wf = captured("A", "B");
		wf.slot_options("A", "B", &slots(&["Power"]), &slots(&[]));
		let stale = wf.choose_slot("Power").unwrap();
		wf.dismiss();

		wf.hover("C");
		wf.confirm();
		wf.hover("D");
		wf.confirm();
		wf.slot_options("C", "D", &slots(&["Power"]), &slots(&[]));

		assert!(!wf.connect_failed(&stale, "A-B slot full".into()));
		assert!(!wf.connect_succeeded(&stale));
		let p = wf.pending().unwrap();
		assert_eq!((p.source.as_str(), p.target.as_str()), ("C", "D"));
		assert!(p.error.is_none());
		assert!(p.in_flight.is_none());
	}
}
