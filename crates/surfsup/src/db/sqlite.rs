use async_trait::async_trait;
use log::{debug, info};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::{str::FromStr, time::Duration};
use surfsup_core::is_file;
use time::Date;

use super::{
    format_date, parse_stored_date, ClimateData, DateRange, Error, Measurement, Precipitation,
    Station, TemperatureObservation, TemperatureStats,
};

/// Read-only access to the climate database (`measurement` and `station` tables).
#[derive(Clone)]
pub struct ClimateAccess {
    pool: SqlitePool,
}

impl ClimateAccess {
    /// Opens the database file read-only and checks it has the expected schema.
    ///
    /// The file is never created or migrated; a missing file is an error.
    pub async fn new(db_path: &str) -> Result<Self, Error> {
        if !is_file(db_path) {
            return Err(Error::Unavailable(format!(
                "no database file at {}",
                db_path
            )));
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))?
            .read_only(true)
            .create_if_missing(false)
            .pragma("busy_timeout", "5000")
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "MEMORY");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(|e| Error::Unavailable(format!("failed to open {}: {}", db_path, e)))?;

        let access = Self::from_pool(pool);
        access.verify_schema().await?;
        info!("Climate database opened read-only at: {}", db_path);

        Ok(access)
    }

    /// Wraps an existing pool without any checks.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Probes both tables through the typed record structs so a database with a
    /// different layout is rejected at startup instead of on the first request.
    pub async fn verify_schema(&self) -> Result<(), Error> {
        sqlx::query_as::<_, Measurement>(
            "SELECT id, station, date, prcp, tobs FROM measurement LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Unavailable(format!("measurement table check failed: {}", e)))?;

        sqlx::query_as::<_, Station>(
            "SELECT id, station, name, latitude, longitude, elevation FROM station LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Unavailable(format!("station table check failed: {}", e)))?;

        Ok(())
    }

    pub async fn station_count(&self) -> Result<i64, Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM station")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn measurement_count(&self) -> Result<i64, Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM measurement")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl ClimateData for ClimateAccess {
    async fn most_recent_date(&self) -> Result<Option<Date>, Error> {
        let latest: Option<String> = sqlx::query_scalar("SELECT MAX(date) FROM measurement")
            .fetch_one(&self.pool)
            .await?;

        latest.map(parse_stored_date).transpose()
    }

    async fn most_active_station(&self) -> Result<Option<String>, Error> {
        let row = sqlx::query(
            "SELECT station, COUNT(*) AS observations
             FROM measurement
             GROUP BY station
             ORDER BY observations DESC, station ASC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let station: String = row.get("station");
            let observations: i64 = row.get("observations");
            debug!(
                "most active station {} has {} observations",
                station, observations
            );
            station
        }))
    }

    async fn temperature_stats(
        &self,
        station: &str,
        range: DateRange,
    ) -> Result<TemperatureStats, Error> {
        let row = sqlx::query(
            "SELECT CAST(MIN(tobs) AS REAL) AS low,
                    CAST(MAX(tobs) AS REAL) AS high,
                    CAST(AVG(tobs) AS REAL) AS avg
             FROM measurement
             WHERE station = ? AND date BETWEEN ? AND ?",
        )
        .bind(station)
        .bind(format_date(range.start))
        .bind(format_date(range.end))
        .fetch_one(&self.pool)
        .await?;

        Ok(TemperatureStats {
            low: row.get("low"),
            high: row.get("high"),
            avg: row.get("avg"),
        })
    }

    async fn precipitation(&self, range: DateRange) -> Result<Vec<Precipitation>, Error> {
        let rows = sqlx::query(
            "SELECT date, CAST(prcp AS REAL) AS prcp
             FROM measurement
             WHERE date BETWEEN ? AND ? AND prcp IS NOT NULL
             ORDER BY date ASC, id ASC",
        )
        .bind(format_date(range.start))
        .bind(format_date(range.end))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Precipitation {
                    date: parse_stored_date(row.get("date"))?,
                    prcp: row.get("prcp"),
                })
            })
            .collect()
    }

    async fn temperature_observations(
        &self,
        station: &str,
        range: DateRange,
    ) -> Result<Vec<TemperatureObservation>, Error> {
        let rows = sqlx::query(
            "SELECT date, CAST(tobs AS REAL) AS tobs
             FROM measurement
             WHERE station = ? AND date BETWEEN ? AND ?
             ORDER BY date ASC, id ASC",
        )
        .bind(station)
        .bind(format_date(range.start))
        .bind(format_date(range.end))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(TemperatureObservation {
                    date: parse_stored_date(row.get("date"))?,
                    tobs: row.get("tobs"),
                })
            })
            .collect()
    }

    async fn station_ids(&self) -> Result<Vec<String>, Error> {
        let stations: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT station FROM measurement ORDER BY station ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(stations)
    }
}
