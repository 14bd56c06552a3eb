use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use log::error;
use serde::{Deserialize, Serialize};

use crate::{
    climate,
    db::{format_date, Precipitation, TemperatureObservation, TemperatureStats},
    AppState,
};

/// `[low, high, avg]`, `null` entries when no observations matched
pub type TemperatureSummary = (Option<f64>, Option<f64>, Option<f64>);

#[derive(Debug, Serialize, Deserialize)]
pub struct Stations {
    /// Each identifier wrapped in its own single-element array
    pub stations: Vec<(String,)>,
}

/// Handler for the trailing year of precipitation (GET /precipitation)
pub async fn precipitation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, f64>>, (StatusCode, String)> {
    let series = state
        .climate
        .precipitation_series()
        .await
        .map_err(error_response)?;

    Ok(Json(precipitation_by_date(series)))
}

/// Handler for the station list (GET /stations)
pub async fn stations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Stations>, (StatusCode, String)> {
    let station_ids = state.climate.station_ids().await.map_err(error_response)?;

    Ok(Json(Stations {
        stations: station_ids.into_iter().map(|id| (id,)).collect(),
    }))
}

/// Handler for the trailing year of temperatures at the most active station (GET /tobs)
pub async fn tobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, f64>>, (StatusCode, String)> {
    let series = state
        .climate
        .temperature_series()
        .await
        .map_err(error_response)?;

    Ok(Json(temperature_by_date(series)))
}

/// Handler for temperature stats from a date onwards (GET /{start})
pub async fn temperature_from(
    State(state): State<Arc<AppState>>,
    Path(start): Path<String>,
) -> Result<Json<Vec<TemperatureSummary>>, (StatusCode, String)> {
    let stats = state
        .climate
        .temperature_stats(&start, None)
        .await
        .map_err(error_response)?;

    Ok(Json(vec![summary(stats)]))
}

/// Handler for temperature stats over a date range (GET /{start}/{end})
pub async fn temperature_between(
    State(state): State<Arc<AppState>>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<Vec<TemperatureSummary>>, (StatusCode, String)> {
    let stats = state
        .climate
        .temperature_stats(&start, Some(end.as_str()))
        .await
        .map_err(error_response)?;

    Ok(Json(vec![summary(stats)]))
}

/// Later readings overwrite earlier ones sharing a date.
pub fn precipitation_by_date(series: Vec<Precipitation>) -> BTreeMap<String, f64> {
    series
        .into_iter()
        .map(|reading| (format_date(reading.date), reading.prcp))
        .collect()
}

/// Later readings overwrite earlier ones sharing a date.
pub fn temperature_by_date(series: Vec<TemperatureObservation>) -> BTreeMap<String, f64> {
    series
        .into_iter()
        .map(|reading| (format_date(reading.date), reading.tobs))
        .collect()
}

fn summary(stats: TemperatureStats) -> TemperatureSummary {
    (stats.low, stats.high, stats.avg)
}

fn error_response(err: climate::Error) -> (StatusCode, String) {
    match err {
        climate::Error::InvalidDateFormat { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        _ => {
            error!("error querying climate data: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to query climate data: {}", err),
            )
        }
    }
}
