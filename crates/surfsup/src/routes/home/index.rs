use std::sync::Arc;

use axum::{extract::State, Json};
use hyper::{header::HOST, HeaderMap};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Route templates advertised by `GET /`, relative to the URL root.
pub const ROUTE_TEMPLATES: [&str; 5] = [
    "precipitation",
    "stations",
    "tobs",
    "<start>",
    "<start>/<end>",
];

#[derive(Debug, Serialize, Deserialize)]
pub struct Routes {
    pub routes: Vec<String>,
}

/// Handler for the route listing (GET /)
pub async fn index_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<Routes> {
    let base_url = url_root(&headers, &state.remote_url);
    Json(Routes {
        routes: ROUTE_TEMPLATES
            .iter()
            .map(|route| format!("{}{}", base_url, route))
            .collect(),
    })
}

/// `scheme://host/` of the incoming request, falling back to the configured
/// public URL when the client sent no `Host` header.
pub fn url_root(headers: &HeaderMap, remote_url: &str) -> String {
    let host = headers
        .get(HOST)
        .and_then(|host| host.to_str().ok())
        .filter(|host| !host.is_empty());

    match host {
        Some(host) => format!("http://{}/", host),
        None => format!("{}/", remote_url.trim_end_matches('/')),
    }
}
