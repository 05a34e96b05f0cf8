//! Same-origin JSON calls to the quote service.

use gloo_net::http::{Request, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use web_sys::{File, FormData};

use crate::error::{QuoteError, Result};
use crate::graph::catalog::Part;
use crate::graph::custom_edge::ConnectRequest;
use crate::graph::model::GraphSnapshot;
use crate::graph::suggest::{SuggestMode, SuggestResponse, SuggestionSet};

#[derive(Deserialize)]
struct ErrorBody {
	#[serde(default)]
	error: String,
}

async fn rejection(resp: &Response) -> QuoteError {
	let status = resp.status();
	let message = match resp.json::<ErrorBody>().await {
		Ok(body) if !body.error.is_empty() => body.error,
		_ => format!("{} {}", status, resp.status_text()),
	};
	QuoteError::Rejected { status, message }
}

async fn read<T: DeserializeOwned>(resp: Response) -> Result<T> {
	if !resp.ok() {
		return Err(rejection(&resp).await);
	}
	Ok(resp.json::<T>().await?)
}

async fn post_json<T: DeserializeOwned>(url: &str, body: &serde_json::Value) -> Result<T> {
	let resp = Request::post(url).json(body)?.send().await?;
	read(resp).await
}

pub async fn fetch_graph() -> Result<GraphSnapshot> {
	read(Request::get("/api/graph").send().await?).await
}

pub async fn fetch_parts() -> Result<Vec<Part>> {
	read(Request::get("/api/parts").send().await?).await
}

pub async fn add_item(id: &str) -> Result<GraphSnapshot> {
	post_json("/api/add_item", &json!({ "item": id })).await
}

pub async fn remove_item(id: &str) -> Result<GraphSnapshot> {
	post_json("/api/remove_item", &json!({ "item": id })).await
}

pub async fn toggle_active(uid: &[serde_json::Value], active: bool) -> Result<GraphSnapshot> {
	post_json("/api/toggle_item", &json!({ "uid": uid, "active": active })).await
}

pub async fn suggest_parts(node: &str, mode: SuggestMode) -> Result<SuggestionSet> {
	let resp: SuggestResponse = post_json(
		"/api/suggest_parts",
		&json!({ "node_name": node, "suggestion_type": mode }),
	)
	.await?;
	Ok(resp.suggestions)
}

/// The service answers with the updated graph, but callers reload anyway.
pub async fn connect_custom(request: &ConnectRequest) -> Result<()> {
	let resp = Request::post("/api/connect_custom")
		.json(request)?
		.send()
		.await?;
	if !resp.ok() {
		return Err(rejection(&resp).await);
	}
	Ok(())
}

pub async fn clear_all() -> Result<GraphSnapshot> {
	let resp = Request::post("/api/clear").send().await?;
	read(resp).await
}

/// Upload a PDF or spreadsheet quote.
pub async fn load_file(file: &File) -> Result<GraphSnapshot> {
	let form = FormData::new().map_err(|e| QuoteError::Transport(format!("{e:?}")))?;
	form.append_with_blob("file", file)
		.map_err(|e| QuoteError::Transport(format!("{e:?}")))?;
	let resp = Request::post("/api/load_pdf").body(form)?.send().await?;
	read(resp).await
}

/// The saved quote as an opaque download.
pub async fn save_snapshot() -> Result<Vec<u8>> {
	let resp = Request::post("/api/save").send().await?;
	if !resp.ok() {
		return Err(rejection(&resp).await);
	}
	Ok(resp.binary().await?)
}
