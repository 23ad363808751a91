use crate::apps::Dashboard;
use crate::controls::ControlValue;
use crate::ir::{OutputId, OutputValue};
use crate::page::{render_output, render_page};
use crate::runtime::DispatchError;
use crate::RenderOptions;
use anyhow::Result;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

const MAX_BODY_BYTES: u64 = 64 * 1024;

/// One dashboard behind a lock: every event is handled to completion before the next
pub struct AppState {
    dashboard: Mutex<Dashboard>,
    render: RenderOptions,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(dashboard: Dashboard, render: RenderOptions) -> SharedState {
        Arc::new(Self {
            dashboard: Mutex::new(dashboard),
            render,
        })
    }

    // A panicking handler must not take the server down with it
    fn lock(&self) -> MutexGuard<'_, Dashboard> {
        self.dashboard.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub changes: BTreeMap<String, ControlValue>,
}

#[derive(Debug, Serialize)]
struct WireOutput {
    id: String,
    property: String,
    value: Value,
}

pub fn routes(state: SharedState) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    let with_state = warp::any().map(move || state.clone());

    let index = warp::path::end()
        .and(warp::get())
        .and(with_state.clone())
        .map(handle_index);

    let layout = warp::path("_dash-layout")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state.clone())
        .map(handle_layout);

    let initial = warp::path("_dash-initial")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state.clone())
        .map(handle_initial);

    let update = warp::path("_dash-update")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_state)
        .map(handle_update);

    index.or(layout).or(initial).or(update)
}

/// Serve the dashboard until the process is stopped
pub async fn serve(state: SharedState, addr: SocketAddr) {
    {
        let dashboard = state.lock();
        info!("Serving '{}' on http://{}", dashboard.title, addr);
    }
    warp::serve(routes(state)).run(addr).await;
}

fn handle_index(state: SharedState) -> Response {
    let dashboard = state.lock();
    match render_page(&dashboard) {
        Ok(html) => warp::reply::html(html).into_response(),
        Err(e) => {
            error!("Failed to render page: {:#}", e);
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, &format!("{:#}", e))
        }
    }
}

fn handle_layout(state: SharedState) -> Response {
    let dashboard = state.lock();
    let controls: Vec<_> = dashboard.dispatcher.registry().iter().collect();
    let outputs: Vec<&OutputId> = dashboard.dispatcher.outputs().collect();
    warp::reply::json(&json!({
        "title": dashboard.title,
        "controls": controls,
        "regions": dashboard.regions(),
        "outputs": outputs,
    }))
    .into_response()
}

fn handle_initial(state: SharedState) -> Response {
    let mut dashboard = state.lock();
    let outputs = dashboard.dispatcher.initial();
    reply_outputs(outputs, &state.render)
}

fn handle_update(request: UpdateRequest, state: SharedState) -> Response {
    let changes: Vec<(String, ControlValue)> = request.changes.into_iter().collect();
    let mut dashboard = state.lock();
    let outputs = dashboard.dispatcher.apply(&changes);
    reply_outputs(outputs, &state.render)
}

fn reply_outputs(
    outputs: std::result::Result<Vec<(OutputId, OutputValue)>, DispatchError>,
    render: &RenderOptions,
) -> Response {
    let outputs = match outputs {
        Ok(outputs) => outputs,
        Err(DispatchError::Rejected(e)) if e.is_client_error() => {
            warn!("Rejected event: {}", e);
            return error_reply(StatusCode::BAD_REQUEST, &e.to_string());
        }
        Err(e) => {
            error!("{}", e);
            return error_reply(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    match encode_outputs(&outputs, render) {
        Ok(wire) => warp::reply::json(&json!({ "outputs": wire })).into_response(),
        Err(e) => {
            error!("Failed to render outputs: {:#}", e);
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, &format!("{:#}", e))
        }
    }
}

fn encode_outputs(outputs: &[(OutputId, OutputValue)], render: &RenderOptions) -> Result<Vec<WireOutput>> {
    outputs
        .iter()
        .map(|(output, value)| -> Result<WireOutput> {
            Ok(WireOutput {
                id: output.id.clone(),
                property: output.property.clone(),
                value: render_output(value, render)?,
            })
        })
        .collect()
}

fn error_reply(status: StatusCode, message: &str) -> Response {
    warp::reply::with_status(warp::reply::json(&json!({ "error": message })), status).into_response()
}
