//! Input events for the graph session, decoupled from where they come from.

use super::model::NodeId;

/// What the operator did, independent of the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
	/// Pointer or focus entered a node.
	Hover(NodeId),
	/// Pointer or focus left the node it was on.
	Blur,
	/// Enter: arm a source or capture a pair.
	Confirm,
	/// Escape: abandon the custom connection.
	Dismiss,
}

/// Key binding for the custom-connection workflow.
pub fn key_event(key: &str) -> Option<InputEvent> {
	match key {
		"Enter" => Some(InputEvent::Confirm),
		"Escape" => Some(InputEvent::Dismiss),
		_ => None,
	}
}

/// Something that delivers [`InputEvent`]s until unsubscribed. The browser
/// adapter listens on the window; tests push synthetic events.
pub trait InputSource {
	/// Handle that keeps the subscription alive.
	type Subscription;

	/// Deliver every event to `handler`.
	fn subscribe(&self, handler: Box<dyn FnMut(InputEvent)>) -> Self::Subscription;

	/// Stop delivering events.
	fn unsubscribe(&self, subscription: Self::Subscription);
}


#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::scripted::ScriptedInput;
	use super::*;

	#[test]
	fn keys_map_to_workflow_events() {
		assert_eq!(key_event("Enter"), Some(InputEvent::Confirm));
		assert_eq!(key_event("Escape"), Some(InputEvent::Dismiss));
		assert_eq!(key_event(" "), None);
	}

	#[test]
	fn unsubscribed_handlers_stop_receiving() {
		let source = ScriptedInput::default();
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = seen.clone();
		let sub = source.subscribe(Box::new(move |ev| sink.borrow_mut().push(ev)));

		source.emit(InputEvent::Confirm);
		source.unsubscribe(sub);
		source.emit(InputEvent::Dismiss);
		assert_eq!(*seen.borrow(), vec![InputEvent::Confirm]);
	}
}
