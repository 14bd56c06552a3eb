use log::{debug, info};
use std::sync::Arc;
use time::{Date, Duration};

use crate::db::{
    self, format_date, parse_date, ClimateData, DateRange, Precipitation, TemperatureObservation,
    TemperatureStats,
};

/// Length of the trailing window served by `/precipitation` and `/tobs`.
pub const TRAILING_WINDOW_DAYS: i64 = 365;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid date '{input}', expected YYYY-MM-DD: {source}")]
    InvalidDateFormat {
        input: String,
        source: time::error::Parse,
    },
    #[error("The measurement table has no rows")]
    EmptyDataset,
    #[error(transparent)]
    DataStore(#[from] db::Error),
}

/// Query layer over the climate data.
///
/// The most recent date, the start of the trailing year and the most active
/// station are resolved once in [`Climate::load`] and never change afterwards.
pub struct Climate {
    data: Arc<dyn ClimateData>,
    most_recent_date: Date,
    date_one_year_ago: Date,
    most_active_station: String,
}

impl Climate {
    pub async fn load(data: Arc<dyn ClimateData>) -> Result<Self, Error> {
        let most_recent_date = data.most_recent_date().await?.ok_or(Error::EmptyDataset)?;
        let most_active_station = data
            .most_active_station()
            .await?
            .ok_or(Error::EmptyDataset)?;
        let date_one_year_ago =
            most_recent_date.saturating_sub(Duration::days(TRAILING_WINDOW_DAYS));

        info!(
            "Climate data spans up to {}, trailing year starts {}, most active station {}",
            format_date(most_recent_date),
            format_date(date_one_year_ago),
            most_active_station
        );

        Ok(Self {
            data,
            most_recent_date,
            date_one_year_ago,
            most_active_station,
        })
    }

    pub fn most_recent_date(&self) -> Date {
        self.most_recent_date
    }

    pub fn date_one_year_ago(&self) -> Date {
        self.date_one_year_ago
    }

    pub fn most_active_station(&self) -> &str {
        &self.most_active_station
    }

    fn trailing_year(&self) -> DateRange {
        DateRange::new(self.date_one_year_ago, self.most_recent_date)
    }

    /// Min, max and mean temperature at the most active station between `start`
    /// and `end` inclusive. A missing `end` means the most recent date.
    pub async fn temperature_stats(
        &self,
        start: &str,
        end: Option<&str>,
    ) -> Result<TemperatureStats, Error> {
        let start = parse_input_date(start)?;
        let end = match end {
            Some(end) => parse_input_date(end)?,
            None => self.most_recent_date,
        };

        let stats = self
            .data
            .temperature_stats(&self.most_active_station, DateRange::new(start, end))
            .await?;
        if stats.is_empty() {
            debug!(
                "no observations for {} between {} and {}",
                self.most_active_station,
                format_date(start),
                format_date(end)
            );
        }
        Ok(stats)
    }

    pub async fn precipitation_series(&self) -> Result<Vec<Precipitation>, Error> {
        Ok(self.data.precipitation(self.trailing_year()).await?)
    }

    pub async fn temperature_series(&self) -> Result<Vec<TemperatureObservation>, Error> {
        Ok(self
            .data
            .temperature_observations(&self.most_active_station, self.trailing_year())
            .await?)
    }

    pub async fn station_ids(&self) -> Result<Vec<String>, Error> {
        Ok(self.data.station_ids().await?)
    }
}

fn parse_input_date(input: &str) -> Result<Date, Error> {
    parse_date(input).map_err(|source| Error::InvalidDateFormat {
        input: input.to_owned(),
        source,
    })
}
