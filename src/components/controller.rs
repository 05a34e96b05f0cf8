//! Glue between the [`QuoteSession`] and the browser: runs its commands
//! against the quote service and republishes its view-models as signals.

use std::cell::RefCell;

use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, info};
use wasm_bindgen::JsCast;
use web_sys::{Blob, File, HtmlAnchorElement, HtmlElement, KeyboardEvent, Url};

use super::force_graph::GraphData;
use crate::api;
use crate::error::{QuoteError, Result};
use crate::graph::input::{InputEvent, InputSource, key_event};
use crate::graph::suggest::SuggestMode;
use crate::graph::{Command, GraphOverlay, GraphSnapshot, QuoteSession, SessionView};

const SAVE_FILE_NAME: &str = "notebook.txt";

#[derive(Clone, Copy)]
pub struct Controller {
	session: StoredValue<QuoteSession>,
	pub view: RwSignal<SessionView>,
	pub overlay: RwSignal<GraphOverlay>,
	pub graph: RwSignal<GraphData>,
}

impl Controller {
	pub fn new() -> Self {
		Self {
			session: StoredValue::new(QuoteSession::default()),
			view: RwSignal::new(SessionView::default()),
			overlay: RwSignal::new(GraphOverlay::default()),
			graph: RwSignal::new(GraphData::default()),
		}
	}

	/// Kick off the initial graph and catalog fetches.
	pub fn start(self) {
		self.apply(|s| s.start());
	}

	/// Run one session mutation, publish the result, then run its commands.
	pub fn apply(self, f: impl FnOnce(&mut QuoteSession) -> Vec<Command>) {
		let mut commands = Vec::new();
		self.session.update_value(|s| commands = f(s));
		self.refresh();
		self.dispatch(commands);
	}

	/// Like [`Controller::apply`] for mutations that issue no requests.
	pub fn update(self, f: impl FnOnce(&mut QuoteSession)) {
		self.apply(|s| {
			f(s);
			Vec::new()
		});
	}

	fn refresh(self) {
		self.session.with_value(|s| {
			self.view.set(s.view());
			self.overlay.set(s.overlay());
		});
	}

	fn load_graph(self, snapshot: GraphSnapshot) {
		let mut data = None;
		self.session.update_value(|s| {
			let plan = s.on_graph_loaded(snapshot);
			data = Some(GraphData::new(s.node_styles(), &s.snapshot().edges, plan));
		});
		if let Some(data) = data {
			self.graph.set(data);
		}
		self.refresh();
	}

	fn graph_result(self, result: Result<GraphSnapshot>) {
		match result {
			Ok(snapshot) => self.load_graph(snapshot),
			Err(err) => self.session.with_value(|s| s.on_graph_failed(&err)),
		}
	}

	pub fn dispatch(self, commands: Vec<Command>) {
		for command in commands {
			self.run(command);
		}
	}

	fn run(self, command: Command) {
		spawn_local(async move {
			match command {
				Command::FetchGraph => self.graph_result(api::fetch_graph().await),
				Command::FetchCatalog => match api::fetch_parts().await {
					Ok(parts) => self.update(|s| s.on_catalog_loaded(parts)),
					Err(err) => error!("error fetching parts catalog: {err}"),
				},
				Command::FetchSuggestions { ticket, node, mode } => {
					let result = api::suggest_parts(&node, mode).await;
					self.update(|s| s.on_suggestions(ticket, result));
				}
				Command::FetchSlotOptions { source, target } => {
					let result = async {
						let first = api::suggest_parts(&source, SuggestMode::AllParts).await?;
						let second = api::suggest_parts(&target, SuggestMode::AllParts).await?;
						Ok::<_, QuoteError>((first, second))
					}
					.await;
					self.update(|s| s.on_slot_options(&source, &target, result));
				}
				Command::Connect(request) => {
					let result = api::connect_custom(&request).await;
					self.apply(|s| s.on_connect_result(&request, result));
				}
				Command::AddItem(id) => self.graph_result(api::add_item(&id).await),
				Command::RemoveItem(id) => self.graph_result(api::remove_item(&id).await),
				Command::ToggleActive { uid, active } => {
					self.graph_result(api::toggle_active(&uid, active).await)
				}
				Command::ClearAll => self.graph_result(api::clear_all().await),
			}
		});
	}

	/// Upload a quote file; the session starts over with whatever it holds.
	pub fn upload(self, file: File) {
		self.update(|s| s.begin_file_load());
		info!("uploading {}", file.name());
		spawn_local(async move {
			self.graph_result(api::load_file(&file).await);
		});
	}

	pub fn save(self) {
		spawn_local(async move {
			match api::save_snapshot().await {
				Ok(bytes) => {
					if let Err(err) = download(&bytes, SAVE_FILE_NAME) {
						error!("error saving quote: {err}");
					}
				}
				Err(err) => error!("error saving quote: {err}"),
			}
		});
	}
}

fn js_err(value: wasm_bindgen::JsValue) -> QuoteError {
	QuoteError::Transport(format!("{value:?}"))
}

/// Hand `bytes` to the browser as a file download.
fn download(bytes: &[u8], name: &str) -> Result<()> {
	let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
	let blob = Blob::new_with_u8_array_sequence(&parts).map_err(js_err)?;
	let url = Url::create_object_url_with_blob(&blob).map_err(js_err)?;
	let anchor: HtmlAnchorElement = document()
		.create_element("a")
		.map_err(js_err)?
		.dyn_into()
		.map_err(|el| js_err(el.into()))?;
	anchor.set_href(&url);
	anchor.set_download(name);
	anchor.click();
	Url::revoke_object_url(&url).map_err(js_err)
}

/// Enter and Escape on the window, except while typing in a form field.
pub struct KeyboardInput;

fn typing_in_field(ev: &KeyboardEvent) -> bool {
	ev.target()
		.and_then(|t| t.dyn_into::<HtmlElement>().ok())
		.is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT"))
}

impl InputSource for KeyboardInput {
	type Subscription = WindowListenerHandle;

	fn subscribe(&self, handler: Box<dyn FnMut(InputEvent)>) -> WindowListenerHandle {
		let handler = RefCell::new(handler);
		window_event_listener(ev::keydown, move |ev: KeyboardEvent| {
			if typing_in_field(&ev) {
				return;
			}
			let Some(event) = key_event(&ev.key()) else {
				return;
			};
			if event == InputEvent::Confirm {
				ev.prevent_default();
			}
			(handler.borrow_mut())(event);
		})
	}

	fn unsubscribe(&self, subscription: WindowListenerHandle) {
		subscription.remove();
	}
}
