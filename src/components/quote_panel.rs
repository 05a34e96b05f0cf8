//! Side panels around the graph: quote items, suggestions, the slot dialog,
//! warnings and help.

use leptos::prelude::*;
use log::warn;

use super::controller::Controller;
use super::force_graph::legend;
use crate::graph::custom_edge::{EdgeDraft, SlotOptions};
use crate::graph::suggest::SuggestMode;
use crate::graph::visibility::GroupFilter;

/// Catalog search, filters, file actions and the list of quoted items.
#[component]
pub fn Sidebar(ctrl: Controller) -> impl IntoView {
	let session = ctrl.view;
	let query = move || session.with(|v| v.catalog_query.clone());
	let hits = move || session.with(|v| v.catalog_hits.clone());

	let filter_radio = move |group: GroupFilter| {
		view! {
			<label>
				<input
					type="radio"
					name="group-filter"
					prop:checked=move || session.with(|v| v.filter == group)
					on:click=move |_| ctrl.update(|s| s.toggle_filter(group))
				/>
				{group.label()}
			</label>
		}
	};

	view! {
		<aside class="sidebar">
			<div class="catalog-search">
				<input
					type="text"
					placeholder="Search or enter Item ID"
					prop:value=query
					on:input=move |ev| {
						let q = event_target_value(&ev);
						ctrl.update(|s| s.set_catalog_query(&q));
					}
					on:keydown=move |ev| {
						if ev.key() == "Enter" {
							let q = event_target_value(&ev);
							ctrl.apply(|s| s.add_item(&q));
						}
					}
				/>
				<Show when=move || !hits().is_empty()>
					<ul class="dropdown" role="listbox">
						<For each=hits key=|part| part.id.clone() let:part>
							<li role="option">
								<span>
									<strong>{part.id.clone()}</strong>
									": "
									{part.description.clone()}
								</span>
								<button on:click={
									let id = part.id.clone();
									move |_| ctrl.apply(|s| s.add_item(&id))
								}>"+"</button>
							</li>
						</For>
					</ul>
				</Show>
			</div>

			<div class="group-filters">
				{filter_radio(GroupFilter::Interlock)}
				{filter_radio(GroupFilter::Triggering)}
			</div>

			<div class="file-actions">
				<button on:click=move |_| ctrl.apply(|s| s.clear())>"Clear"</button>
				<button on:click=move |_| ctrl.save()>"Save"</button>
				<input
					type="file"
					accept=".pdf,.xls,.xlsx"
					on:change:target=move |ev| {
						if let Some(file) = ev.target().files().and_then(|f| f.get(0)) {
							ctrl.upload(file);
						}
					}
				/>
			</div>

			<ul class="items">
				<For
					each=move || session.with(|v| v.items.clone())
					key=|item| item.id.clone()
					let:item
				>
					<li class="item">
						<span>
							<strong>{item.id.clone()}</strong>
							": "
							{item.description.clone()}
						</span>
						<button on:click={
							let id = item.id.clone();
							move |_| ctrl.apply(|s| s.remove_item(&id))
						}>"X"</button>
					</li>
					{item
						.ghosts
						.iter()
						.map(|g| {
							view! {
								<li class="item ghost">
									<span>
										<strong>{g.id.clone()}</strong>
										": "
										{g.description.clone()}
									</span>
								</li>
							}
						})
						.collect_view()}
				</For>
			</ul>

			<div class="status">{move || session.with(|v| v.status_message.clone())}</div>
		</aside>
	}
}

/// Suggestions for the selected part, grouped by slot.
#[component]
pub fn SuggestionsPanel(ctrl: Controller) -> impl IntoView {
	let session = ctrl.view;
	let selected = move || session.with(|v| v.selected.clone());

	view! {
		<Show when=move || selected().is_some()>
			<div class="panel suggestions">
				<div class="panel-header">
					<button class="close" on:click=move |_| ctrl.update(|s| s.clear_selection())>
						"×"
					</button>
					<h4>
						"Suggestions for "
						{move || selected().map(|n| n.label).unwrap_or_default()}
					</h4>
				</div>
				<div class="panel-body">
					<Show when=move || session.with(|v| v.suggestions.show_search)>
						<input
							type="text"
							placeholder="Search suggestions..."
							prop:value=move || session.with(|v| v.suggestions.query.clone())
							on:input=move |ev| {
								let q = event_target_value(&ev);
								ctrl.update(|s| s.set_suggestion_query(&q));
							}
						/>
					</Show>

					<label class="toggle">
						<input
							type="checkbox"
							prop:checked=move || selected().is_some_and(|n| n.active)
							on:change=move |_| ctrl.apply(|s| s.toggle_selected_active())
						/>
						{move || {
							if selected().is_some_and(|n| n.active) { "Active" } else { "Inactive" }
						}}
					</label>

					<label class="toggle">
						<input
							type="checkbox"
							prop:checked=move || {
								session.with(|v| v.suggestions.mode == SuggestMode::MissingParts)
							}
							on:change=move |ev| {
								let mode = if event_target_checked(&ev) {
									SuggestMode::MissingParts
								} else {
									SuggestMode::AllParts
								};
								ctrl.apply(|s| s.set_suggestion_mode(mode));
							}
						/>
						{move || {
							match session.with(|v| v.suggestions.mode) {
								SuggestMode::MissingParts => "Missing Parts",
								SuggestMode::AllParts => "All Parts",
							}
						}}
					</label>

					{move || {
						let panel = session.with(|v| v.suggestions.clone());
						if panel.loading {
							return view! { <p>"Loading suggestions..."</p> }.into_any();
						}
						if panel.slots.is_empty() {
							return view! { <p>"No suggestions available."</p> }.into_any();
						}
						panel
							.slots
							.iter()
							.map(|(slot, parts)| {
								view! {
									<div class="slot">
										<h5>{slot.to_string()}</h5>
										<ul>
											{parts
												.iter()
												.map(|part| {
													let id = part.id.clone();
													view! {
														<li>
															<button on:click=move |_| {
																ctrl.apply(|s| {
																	s.clear_selection();
																	s.add_item(&id)
																})
															}>"+"</button>
															<span>
																<strong>{part.id.clone()}</strong>
																" - "
																{part.name.clone()}
															</span>
														</li>
													}
												})
												.collect_view()}
										</ul>
									</div>
								}
							})
							.collect_view()
							.into_any()
					}}
				</div>
			</div>
		</Show>
	}
}

/// Slot choice for a captured custom connection.
#[component]
pub fn SlotDialog(ctrl: Controller) -> impl IntoView {
	let session = ctrl.view;
	let pending = move || {
		session.with(|v| match &v.edge {
			EdgeDraft::AwaitingSlotChoice(p) => Some(p.clone()),
			_ => None,
		})
	};

	view! {
		<Show when=move || pending().is_some()>
			<div class="modal">
				<div class="panel slot-dialog">
					<div class="panel-header">
						<h3>"Select a Slot to Connect"</h3>
						<button class="close" on:click=move |_| ctrl.update(|s| s.dismiss_edge())>
							"×"
						</button>
					</div>
					<div class="panel-body">
						{move || {
							let Some(p) = pending() else {
								return ().into_any();
							};
							let slots = match p.slots {
								SlotOptions::Loading => view! { <li>"Loading slots..."</li> }.into_any(),
								SlotOptions::Unavailable(msg) => {
									view! { <li class="error">{msg}</li> }.into_any()
								}
								SlotOptions::Ready(slots) if slots.is_empty() => {
									view! { <li>"No available slots found."</li> }.into_any()
								}
								SlotOptions::Ready(slots) => {
									let busy = p.in_flight.is_some();
									slots
										.into_iter()
										.map(|slot| {
											let chosen = slot.clone();
											view! {
												<li>
													<button
														disabled=busy
														on:click=move |_| {
															let mut commands = Vec::new();
															ctrl.update(|s| match s.choose_slot(&chosen) {
																Ok(c) => commands = c,
																Err(err) => warn!("{err}"),
															});
															ctrl.dispatch(commands);
														}
													>
														"+"
													</button>
													<span>{slot}</span>
												</li>
											}
										})
										.collect_view()
										.into_any()
								}
							};
							view! {
								<p>
									"Connect " <strong>{p.source.clone()}</strong> " to "
									<strong>{p.target.clone()}</strong> " through one of these slots."
								</p>
								<p class="warning">"WARNING: this connection cannot be undone."</p>
								{p.error.map(|e| view! { <p class="error">{e}</p> })}
								<ul>{slots}</ul>
							}
								.into_any()
						}}
					</div>
				</div>
			</div>
		</Show>
	}
}

/// Warning icon that opens the list of load warnings.
#[component]
pub fn WarningsPanel(ctrl: Controller) -> impl IntoView {
	let session = ctrl.view;
	let (open, set_open) = signal(false);
	let warnings = move || session.with(|v| v.warnings.clone());

	view! {
		<Show when=move || !warnings().is_empty()>
			<button class="warning-icon" on:click=move |_| set_open.set(true)>"⚠"</button>
		</Show>
		<Show when=move || open.get()>
			<div class="panel warnings">
				<div class="panel-header">
					<button class="close" on:click=move |_| set_open.set(false)>"×"</button>
					<h4>"Warnings"</h4>
				</div>
				<ul>
					{move || {
						warnings()
							.into_iter()
							.map(|w| {
								view! {
									<li>
										<span>{w.text}</span>
										{w
											.part_id
											.map(|id| {
												view! {
													<button on:click=move |_| {
														ctrl.apply(|s| s.add_item(&id))
													}>"+"</button>
												}
											})}
									</li>
								}
							})
							.collect_view()
					}}
				</ul>
			</div>
		</Show>
	}
}

/// Color legend and usage notes.
#[component]
pub fn HelpPanel() -> impl IntoView {
	let (open, set_open) = signal(false);

	view! {
		<button class="help-icon" on:click=move |_| set_open.update(|o| *o = !*o)>"?"</button>
		<Show when=move || open.get()>
			<div class="modal">
				<div class="panel help">
					<div class="panel-header">
						<button class="close" on:click=move |_| set_open.set(false)>"×"</button>
						<h2>"Help & Information"</h2>
					</div>
					<div class="panel-body">
						<p>
							<strong>"Node Colors:"</strong>
						</p>
						<ul>
							{legend()
								.into_iter()
								.map(|(class, text)| {
									view! {
										<li>
											<span class="swatch" style:background-color=class.color()></span>
											{text}
										</li>
									}
								})
								.collect_view()}
						</ul>
						<p>
							<strong>"Ghost parts: "</strong>
							"parts bundled with another part. They are drawn with a dashed border."
						</p>
						<p>
							<strong>"Search: "</strong>
							"find parts by ID or description and add them with the + button."
						</p>
						<p>
							<strong>"Suggestions: "</strong>
							"click a part to list compatible parts for each of its slots."
						</p>
						<p>
							<strong>"Hiding parts: "</strong>
							"right click a part to hide or show the dead-end parts connected to it."
						</p>
						<p>
							<strong>"Custom connections: "</strong>
							"hover a part and press Enter, then hover a second part and press Enter again. "
							"Escape cancels. This cannot be undone."
						</p>
					</div>
				</div>
			</div>
		</Show>
	}
}
