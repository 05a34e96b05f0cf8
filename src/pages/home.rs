use leptos::prelude::*;

use crate::components::controller::{Controller, KeyboardInput};
use crate::components::force_graph::ForceGraphCanvas;
use crate::components::quote_panel::{HelpPanel, SlotDialog, Sidebar, SuggestionsPanel, WarningsPanel};
use crate::graph::input::{InputEvent, InputSource};
use crate::graph::{LayoutSnapshot, NodeId};

/// The quote editor: item sidebar on the left, graph on the right.
#[component]
pub fn Home() -> impl IntoView {
	let ctrl = Controller::new();

	let keys = KeyboardInput.subscribe(Box::new(move |ev: InputEvent| ctrl.apply(|s| s.handle_input(ev))));
	on_cleanup(move || KeyboardInput.unsubscribe(keys));
	ctrl.start();

	let on_hover = move |id: Option<NodeId>| {
		let ev = match id {
			Some(id) => InputEvent::Hover(id),
			None => InputEvent::Blur,
		};
		ctrl.apply(|s| s.handle_input(ev));
	};
	let on_select = move |id: Option<NodeId>| match id {
		Some(id) => ctrl.apply(|s| s.select_node(&id)),
		None => ctrl.update(|s| s.clear_selection()),
	};
	let on_collapse = move |id: NodeId| ctrl.update(|s| s.collapse_dead_ends(&id));
	let on_settled = move |layout: LayoutSnapshot| ctrl.update(|s| s.on_layout_settled(layout));

	view! {
		<div class="quote-graph">
			<Sidebar ctrl=ctrl />
			<div class="graph-area">
				<ForceGraphCanvas
					data=ctrl.graph
					overlay=ctrl.overlay
					on_hover=on_hover
					on_select=on_select
					on_collapse=on_collapse
					on_settled=on_settled
				/>
				<div class="graph-overlay">
					<p class="subtitle">
						{move || {
							ctrl.view.with(|v| format!("{} parts, {} connections", v.node_count, v.edge_count))
						}}
					</p>
				</div>
				<SuggestionsPanel ctrl=ctrl />
				<WarningsPanel ctrl=ctrl />
				<HelpPanel />
			</div>
			<SlotDialog ctrl=ctrl />
		</div>
	}
}
