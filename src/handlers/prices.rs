use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::AppState;
use crate::error::AppError;
use crate::metrics;
use crate::pricing::{resolve, Resolved};

/// `GET /all`
pub async fn all_prices(State(state): State<AppState>) -> Response {
    answer(&state, "all", None, None)
}

/// `GET /{region}`
pub async fn region_prices(State(state): State<AppState>, Path(region): Path<String>) -> Response {
    answer(&state, "region", Some(&region), None)
}

/// `GET /{region}/{instance_type}`
pub async fn instance_price(
    State(state): State<AppState>,
    Path((region, instance_type)): Path<(String, String)>,
) -> Response {
    answer(&state, "instance", Some(&region), Some(&instance_type))
}

/// Resolve a lookup against one snapshot of the store and render it
fn answer(state: &AppState, route: &str, region: Option<&str>, instance_type: Option<&str>) -> Response {
    let table = state.store.current_table();

    let response = match resolve(&table, region, instance_type).and_then(render) {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    metrics::record_request(route, response.status().as_u16());
    response
}

fn render(resolved: Resolved<'_>) -> Result<Response, AppError> {
    match resolved {
        Resolved::Table(table) => json_response(table),
        Resolved::Region(prices) => json_response(prices),
        Resolved::Price(price) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=UTF-8")],
            format!("{}\n", price),
        )
            .into_response()),
    }
}

fn json_response<T: Serialize>(value: &T) -> Result<Response, AppError> {
    let body = to_indented_json(value)
        .map_err(|e| AppError::InternalError(format!("Failed to encode prices: {}", e)))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json; charset=UTF-8")],
        body,
    )
        .into_response())
}

/// Pretty JSON with four-space indentation and a trailing newline
fn to_indented_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}
