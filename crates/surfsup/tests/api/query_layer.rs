use crate::helpers::{
    fixture_rows, fixture_stations, memory_pool, seeded_access, seeded_file, LESS_ACTIVE,
    MOST_ACTIVE, REMOTE_URL,
};
use std::sync::Arc;
use surfsup::{build_app_state, Climate, ClimateAccess, ClimateData, DateRange, Error};
use time::macros::date;

async fn fixture_climate() -> Climate {
    let access = seeded_access(&fixture_stations(), &fixture_rows()).await;
    Climate::load(Arc::new(access)).await.unwrap()
}

#[tokio::test]
async fn derived_values_come_from_the_data() {
    let climate = fixture_climate().await;

    assert_eq!(climate.most_recent_date(), date!(2017 - 08 - 23));
    assert_eq!(climate.date_one_year_ago(), date!(2016 - 08 - 23));
    assert_eq!(climate.most_active_station(), MOST_ACTIVE);
}

#[tokio::test]
async fn stats_match_the_two_day_scenario() {
    let access = seeded_access(
        &["STA"],
        &[
            ("STA", "2017-08-22", Some(0.0), 79.0),
            ("STA", "2017-08-23", Some(0.5), 76.0),
        ],
    )
    .await;
    let climate = Climate::load(Arc::new(access)).await.unwrap();

    let stats = climate
        .temperature_stats("2017-08-22", Some("2017-08-23"))
        .await
        .unwrap();

    assert_eq!(stats.low, Some(76.0));
    assert_eq!(stats.high, Some(79.0));
    assert_eq!(stats.avg, Some(77.5));
}

#[tokio::test]
async fn stats_are_ordered_low_avg_high() {
    let climate = fixture_climate().await;

    for (start, end) in [
        ("2016-08-22", "2017-08-23"),
        ("2016-08-23", "2016-08-23"),
        ("2017-08-22", "2017-08-23"),
        ("2010-01-01", "2017-08-22"),
    ] {
        let stats = climate.temperature_stats(start, Some(end)).await.unwrap();
        let (low, avg, high) = (
            stats.low.unwrap(),
            stats.avg.unwrap(),
            stats.high.unwrap(),
        );
        assert!(low <= avg && avg <= high, "{start}..{end}: {stats:?}");
    }
}

#[tokio::test]
async fn open_ended_stats_stop_at_most_recent_date() {
    let climate = fixture_climate().await;

    let open = climate.temperature_stats("2016-08-23", None).await.unwrap();
    let closed = climate
        .temperature_stats("2016-08-23", Some("2017-08-23"))
        .await
        .unwrap();

    assert_eq!(open, closed);
}

#[tokio::test]
async fn stats_only_use_most_active_station() {
    let climate = fixture_climate().await;

    // LESS_ACTIVE has 82.0 and 81.0 in this range
    let stats = climate
        .temperature_stats("2017-08-21", Some("2017-08-23"))
        .await
        .unwrap();

    assert_eq!(stats.high, Some(79.0));
}

#[tokio::test]
async fn empty_range_has_no_aggregates() {
    let climate = fixture_climate().await;

    let stats = climate.temperature_stats("2020-01-01", None).await.unwrap();

    assert!(stats.is_empty());
}

#[tokio::test]
async fn series_are_sorted_and_complete() {
    let climate = fixture_climate().await;

    let precipitation = climate.precipitation_series().await.unwrap();
    assert!(precipitation.windows(2).all(|w| w[0].date <= w[1].date));
    assert!(precipitation
        .iter()
        .all(|p| p.date >= climate.date_one_year_ago() && p.date <= climate.most_recent_date()));
    assert_eq!(precipitation.len(), 4);

    let temperatures = climate.temperature_series().await.unwrap();
    assert!(temperatures.windows(2).all(|w| w[0].date <= w[1].date));
    assert_eq!(
        temperatures.iter().map(|t| t.tobs).collect::<Vec<_>>(),
        vec![77.0, 79.0, 76.0]
    );
}

#[tokio::test]
async fn precipitation_drops_missing_readings() {
    let access = seeded_access(
        &["A"],
        &[
            ("A", "2017-01-01", None, 70.0),
            ("A", "2017-01-02", Some(0.2), 71.0),
            ("A", "2017-01-03", None, 72.0),
        ],
    )
    .await;
    let climate = Climate::load(Arc::new(access)).await.unwrap();

    let precipitation = climate.precipitation_series().await.unwrap();

    assert_eq!(precipitation.len(), 1);
    assert_eq!(precipitation[0].date, date!(2017 - 01 - 02));
    assert_eq!(precipitation[0].prcp, 0.2);
}

#[tokio::test]
async fn station_ids_are_distinct() {
    let climate = fixture_climate().await;

    let stations = climate.station_ids().await.unwrap();

    assert_eq!(stations, vec![LESS_ACTIVE.to_string(), MOST_ACTIVE.to_string()]);
}

#[tokio::test]
async fn most_active_ties_go_to_smallest_identifier() {
    let access = seeded_access(
        &["USC002", "USC001"],
        &[
            ("USC002", "2017-01-01", Some(0.0), 70.0),
            ("USC002", "2017-01-02", Some(0.0), 70.0),
            ("USC001", "2017-01-01", Some(0.0), 70.0),
            ("USC001", "2017-01-02", Some(0.0), 70.0),
        ],
    )
    .await;

    assert_eq!(
        access.most_active_station().await.unwrap(),
        Some(String::from("USC001"))
    );
}

#[tokio::test]
async fn range_filter_is_inclusive() {
    let access = seeded_access(&fixture_stations(), &fixture_rows()).await;

    let observations = access
        .temperature_observations(
            MOST_ACTIVE,
            DateRange::new(date!(2016 - 08 - 23), date!(2017 - 08 - 22)),
        )
        .await
        .unwrap();

    assert_eq!(observations.len(), 2);
    assert_eq!(observations[0].date, date!(2016 - 08 - 23));
    assert_eq!(observations[1].date, date!(2017 - 08 - 22));
}

#[tokio::test]
async fn empty_measurement_table_fails_to_load() {
    let access = seeded_access(&fixture_stations(), &[]).await;

    assert_eq!(access.most_recent_date().await.unwrap(), None);
    assert!(Climate::load(Arc::new(access)).await.is_err());
}

#[tokio::test]
async fn schema_check_rejects_missing_tables() {
    let access = ClimateAccess::from_pool(memory_pool().await);

    let err = access.verify_schema().await.unwrap_err();

    assert!(matches!(err, Error::Unavailable(_)));
}

#[tokio::test]
async fn missing_database_file_is_unavailable() {
    let result = ClimateAccess::new("/nonexistent/surfsup/hawaii.sqlite").await;

    assert!(matches!(result, Err(Error::Unavailable(_))));
    assert!(build_app_state(
        String::from(REMOTE_URL),
        String::from("/nonexistent/surfsup/hawaii.sqlite")
    )
    .await
    .is_err());
}

#[tokio::test]
async fn opens_database_file_read_only() {
    let path = seeded_file(&fixture_stations(), &fixture_rows()).await;

    let access = ClimateAccess::new(&path).await.unwrap();
    assert_eq!(access.measurement_count().await.unwrap(), 6);
    assert_eq!(access.station_count().await.unwrap(), 2);
    assert!(sqlx::query("DELETE FROM measurement")
        .execute(access.pool())
        .await
        .is_err());

    let state = build_app_state(String::from(REMOTE_URL), path.clone())
        .await
        .unwrap();
    assert_eq!(state.climate.most_active_station(), MOST_ACTIVE);

    access.pool().close().await;
    let _ = std::fs::remove_file(&path);
}
