mod sqlite;

pub use sqlite::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description, Date};

/// Format used for dates in the database, in path parameters and in JSON keys.
pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to query sqlite: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Climate database unavailable: {0}")]
    Unavailable(String),
    #[error("Stored date '{value}' is not a valid date: {source}")]
    StoredDate {
        value: String,
        source: time::error::Parse,
    },
}

/// One row of the `measurement` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Measurement {
    pub id: i64,
    pub station: String,
    pub date: String,
    pub prcp: Option<f64>,
    pub tobs: f64,
}

/// One row of the `station` table. Only the identifier matters to the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Station {
    pub id: i64,
    pub station: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Precipitation {
    pub date: Date,
    pub prcp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureObservation {
    pub date: Date,
    pub tobs: f64,
}

/// Aggregates over a filtered set of temperature observations.
///
/// Every field is `None` when the filter matched no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperatureStats {
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub avg: Option<f64>,
}

impl TemperatureStats {
    pub fn is_empty(&self) -> bool {
        self.low.is_none() && self.high.is_none() && self.avg.is_none()
    }
}

/// Inclusive date range used to filter measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

#[async_trait]
pub trait ClimateData: Sync + Send {
    /// Latest date present in `measurement`, `None` when the table is empty
    async fn most_recent_date(&self) -> Result<Option<Date>, Error>;
    /// Station with the most measurement rows, ties go to the smallest identifier
    async fn most_active_station(&self) -> Result<Option<String>, Error>;
    async fn temperature_stats(&self, station: &str, range: DateRange)
        -> Result<TemperatureStats, Error>;
    /// Non-null precipitation readings of every station in range, ordered by date
    async fn precipitation(&self, range: DateRange) -> Result<Vec<Precipitation>, Error>;
    /// Temperature readings of one station in range, ordered by date
    async fn temperature_observations(
        &self,
        station: &str,
        range: DateRange,
    ) -> Result<Vec<TemperatureObservation>, Error>;
    /// Distinct station identifiers referenced by `measurement`, ordered
    async fn station_ids(&self) -> Result<Vec<String>, Error>;
}

pub fn parse_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value, DATE_FORMAT)
}

pub fn format_date(date: Date) -> String {
    // DATE_FORMAT only has numeric components, so formatting cannot fail
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

fn parse_stored_date(value: String) -> Result<Date, Error> {
    parse_date(&value).map_err(|source| Error::StoredDate { value, source })
}
