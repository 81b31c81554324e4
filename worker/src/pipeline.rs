//! Batch driver: enriches activities one at a time, fully or not at all.

use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Result};
use uuid::Uuid;
use weather_engine::{interpolate_track, HourBucketIndex, Location, Track, WeatherResult};

use crate::config::BatchConfig;
use crate::db;
use crate::error::ActivityError;
use crate::open_meteo::WeatherSource;
use crate::repos::{activities, activity_streams, weather_results, weather_results::WeatherTable};

/// Per-invocation context carried into every log line of the run.
#[derive(Clone, Debug)]
pub struct RunContext {
    pub run_id: Uuid,
}

impl RunContext {
    pub fn new() -> Self {
        Self { run_id: Uuid::new_v4() }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Worker<S> {
    pub pool: db::Pool,
    pub source: S,
    pub table: WeatherTable,
    pub batch: BatchConfig,
}

#[derive(Debug, Default, PartialEq)]
pub struct Summary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// What the driver does after an activity failed.
#[derive(Debug, PartialEq)]
pub enum Next {
    Continue,
    RetryAfter(Duration),
    Halt,
}

pub fn after_failure(err: &ActivityError, cooldown: Option<Duration>, retried: bool) -> Next {
    if !err.is_rate_limited() {
        return Next::Continue;
    }
    match cooldown {
        Some(pause) if !retried => Next::RetryAfter(pause),
        _ => Next::Halt,
    }
}

/// Fetches weather along `track` and estimates it at every timestamp.
///
/// Identical sample locations are fetched once, since they resolve to the same grid cell.
pub async fn enrich<S: WeatherSource>(
    source: &S,
    activity_id: i64,
    track: &Track,
    sample_count: usize,
) -> Result<WeatherResult, ActivityError> {
    let (start, end) = track.weather_window();
    let mut fetched: Vec<Location> = Vec::new();
    let mut series = Vec::new();

    for location in track.sample_locations(sample_count) {
        if fetched.contains(&location) {
            continue;
        }
        let s = source
            .history(location, start, end)
            .await
            .map_err(|source| ActivityError::UpstreamUnavailable { location, source })?;
        fetched.push(location);
        series.push(s);
    }

    let index = HourBucketIndex::build(&series)?;
    let points = interpolate_track(track, &index)?;
    Ok(WeatherResult::assemble(activity_id, &points))
}

pub async fn process_activity<S: WeatherSource>(
    ctx: &RunContext,
    worker: &Worker<S>,
    activity_id: i64,
) -> Result<(), ActivityError> {
    let (activity, streams) = {
        let conn = worker.pool.get().await?;
        let activity = activities::get(&conn, activity_id)
            .await?
            .ok_or(ActivityError::NotFound(activity_id))?;
        let streams = activity_streams::by_activity(&conn, activity_id)
            .await?
            .ok_or_else(|| ActivityError::incomplete(activity_id, "no streams"))?;
        (activity, streams)
    };

    let track = streams.track(activity.start_date)?;
    log::info!(
        "[run {}] activity {}: {} timestamps, {} locations",
        ctx.run_id,
        activity_id,
        track.len(),
        track.locations().len()
    );

    let result = enrich(&worker.source, activity_id, &track, worker.batch.sample_count).await?;

    let mut conn = worker.pool.get().await?;
    weather_results::replace(&mut conn, &worker.table, &result).await?;
    Ok(())
}

/// Processes `ids` in order with the worker's store and weather source.
pub async fn run<S: WeatherSource>(ctx: &RunContext, worker: &Worker<S>, ids: &[i64]) -> Result<Summary> {
    run_batch(ctx, ids, worker.batch.rate_limit_cooldown(), |id| {
        process_activity(ctx, worker, id)
    })
    .await
}

/// Runs `process` for each of `ids` in order. A failed activity is logged and the
/// batch moves on, except on a rate limit, which pauses or halts the run depending
/// on `cooldown`.
pub async fn run_batch<F, Fut>(
    ctx: &RunContext,
    ids: &[i64],
    cooldown: Option<Duration>,
    mut process: F,
) -> Result<Summary>
where
    F: FnMut(i64) -> Fut,
    Fut: Future<Output = Result<(), ActivityError>>,
{
    let mut summary = Summary::default();
    let total = ids.len();

    for (i, &id) in ids.iter().enumerate() {
        log::info!("[run {}] handling activity {} ({}/{})", ctx.run_id, id, i + 1, total);
        let mut retried = false;

        loop {
            let err = match process(id).await {
                Ok(()) => {
                    log::info!("[run {}] activity {}: weather stored", ctx.run_id, id);
                    summary.processed += 1;
                    break;
                }
                Err(err) => err,
            };

            if err.is_skip() {
                log::warn!("[run {}] activity {} skipped: {}", ctx.run_id, id, err);
                summary.skipped += 1;
                break;
            }

            log::error!("[run {}] activity {} failed: {}", ctx.run_id, id, err);
            match after_failure(&err, cooldown, retried) {
                Next::Continue => {
                    summary.failed += 1;
                    break;
                }
                Next::RetryAfter(pause) => {
                    log::info!("[run {}] rate limited, pausing {:?}", ctx.run_id, pause);
                    tokio::time::sleep(pause).await;
                    retried = true;
                }
                Next::Halt => {
                    summary.failed += 1;
                    log_summary(ctx, &summary);
                    bail!(
                        "rate limited by weather API; halted with {} of {} activities left",
                        total - i - 1,
                        total
                    );
                }
            }
        }
    }

    log_summary(ctx, &summary);
    Ok(summary)
}

pub async fn run_pending<S: WeatherSource>(ctx: &RunContext, worker: &Worker<S>, limit: i64) -> Result<Summary> {
    let ids: Vec<i64> = {
        let conn = worker.pool.get().await?;
        activities::list_pending(&conn, &worker.table, limit)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect()
    };
    log::info!("[run {}] {} pending activities", ctx.run_id, ids.len());
    run(ctx, worker, &ids).await
}

fn log_summary(ctx: &RunContext, summary: &Summary) {
    log::info!(
        "[run {}] done: {} processed, {} skipped, {} failed",
        ctx.run_id,
        summary.processed,
        summary.skipped,
        summary.failed
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open_meteo::FetchError;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use std::sync::Mutex;
    use weather_engine::{EngineError, HourlySeries, Observation};

    /// Serves a fixed series per query, shifted onto a grid cell next to the query.
    struct FakeSource {
        hours: Vec<(NaiveDateTime, f64)>,
        calls: Mutex<Vec<(Location, NaiveDate, NaiveDate)>>,
        fail: Option<fn() -> FetchError>,
    }

    impl FakeSource {
        fn new(hours: Vec<(NaiveDateTime, f64)>) -> Self {
            Self {
                hours,
                calls: Mutex::new(Vec::new()),
                fail: None,
            }
        }
    }

    impl WeatherSource for FakeSource {
        async fn history(&self, location: Location, start: NaiveDate, end: NaiveDate) -> Result<HourlySeries, FetchError> {
            self.calls.lock().unwrap().push((location, start, end));
            if let Some(fail) = self.fail {
                return Err(fail());
            }
            Ok(HourlySeries {
                grid_cell: Location::new(location.lat + 0.01, location.lon),
                observations: self
                    .hours
                    .iter()
                    .map(|(time, temperature)| Observation {
                        time: *time,
                        temperature: *temperature,
                        apparent_temperature: *temperature,
                        relative_humidity: 50.0,
                        surface_pressure: 1013.0,
                        wind_speed: 10.0,
                        wind_direction: 270.0,
                        weather_code: 2,
                    })
                    .collect(),
            })
        }
    }

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 20)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn track(elapsed: Vec<i64>, n_locations: usize) -> Track {
        let locations = (0..n_locations)
            .map(|i| Location::new(51.9 + i as f64 * 0.001, 4.2))
            .collect();
        Track::new(at(14), elapsed, locations).unwrap()
    }

    // =========================================================================
    // enrich
    // =========================================================================

    #[tokio::test]
    async fn test_enrich_produces_one_value_per_timestamp() {
        let source = FakeSource::new(vec![(at(14), 20.0), (at(15), 26.0)]);
        let t = track(vec![0, 900, 1800, 2700, 3600], 40);

        let result = enrich(&source, 5, &t, 10).await.unwrap();
        assert_eq!(result.activity_id, 5);
        assert_eq!(result.temp, "20.0, 21.5, 23.0, 24.5, 26.0");
        assert_eq!(result.wind_direction.split(", ").count(), 5);

        let calls = source.calls.lock().unwrap();
        assert_eq!(calls.len(), 10);
        assert!(calls.iter().all(|(_, start, end)| {
            *start == NaiveDate::from_ymd_opt(2024, 7, 20).unwrap() && *end == NaiveDate::from_ymd_opt(2024, 7, 21).unwrap()
        }));
    }

    #[tokio::test]
    async fn test_enrich_fetches_repeated_samples_once() {
        let source = FakeSource::new(vec![(at(14), 20.0), (at(15), 26.0)]);
        // Fewer locations than samples: every sample is the first location
        let t = track(vec![0, 60, 120], 3);

        enrich(&source, 5, &t, 10).await.unwrap();
        assert_eq!(source.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_enrich_reports_missing_hour() {
        let source = FakeSource::new(vec![(at(14), 20.0)]);
        let t = track(vec![0, 1800], 2);

        let err = enrich(&source, 5, &t, 10).await.unwrap_err();
        assert!(matches!(
            err,
            ActivityError::Engine(EngineError::MissingHourBucket { hour }) if hour == at(15)
        ));
        assert!(!err.is_skip());
    }

    #[tokio::test]
    async fn test_enrich_surfaces_upstream_failure() {
        let mut source = FakeSource::new(vec![(at(14), 20.0), (at(15), 26.0)]);
        source.fail = Some(|| FetchError::RateLimited);
        let t = track(vec![0, 1800], 2);

        let err = enrich(&source, 5, &t, 10).await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_enrich_reports_numeric_error() {
        let source = FakeSource::new(vec![(at(14), 20.0), (at(15), 26.0)]);
        let t = Track::new(at(14) + TimeDelta::minutes(5), vec![0], vec![Location::new(51.9, 4.2)]).unwrap();

        struct BadHumidity(FakeSource);
        impl WeatherSource for BadHumidity {
            async fn history(&self, location: Location, start: NaiveDate, end: NaiveDate) -> Result<HourlySeries, FetchError> {
                let mut series = self.0.history(location, start, end).await?;
                series.observations[1].relative_humidity = -30.0;
                Ok(series)
            }
        }

        let err = enrich(&BadHumidity(source), 5, &t, 10).await.unwrap_err();
        assert!(matches!(
            err,
            ActivityError::Engine(EngineError::NumericError { time, .. }) if time == at(15)
        ));
    }

    // =========================================================================
    // Batch loop
    // =========================================================================

    fn rate_limited() -> ActivityError {
        ActivityError::UpstreamUnavailable {
            location: Location::new(51.9, 4.2),
            source: FetchError::RateLimited,
        }
    }

    /// Runs a batch where each attempt's outcome comes from `outcome(id, attempt)`,
    /// returning the summary and every `(id, attempt)` processed.
    async fn run_with(
        ids: &[i64],
        cooldown: Option<Duration>,
        outcome: impl Fn(i64, usize) -> Result<(), ActivityError>,
    ) -> (Result<Summary>, Vec<(i64, usize)>) {
        let calls = Mutex::new(Vec::<(i64, usize)>::new());
        let result = run_batch(&RunContext::new(), ids, cooldown, |id| {
            let mut calls = calls.lock().unwrap();
            let attempt = calls.iter().filter(|(c, _)| *c == id).count();
            calls.push((id, attempt));
            let res = outcome(id, attempt);
            async move { res }
        })
        .await;
        (result, calls.into_inner().unwrap())
    }

    #[tokio::test]
    async fn test_batch_continues_after_skips_and_failures() {
        let (result, calls) = run_with(&[1, 2, 3, 4], None, |id, _| match id {
            2 => Err(ActivityError::incomplete(2, "no streams")),
            3 => Err(ActivityError::Engine(EngineError::MissingHourBucket { hour: at(15) })),
            _ => Ok(()),
        })
        .await;

        assert_eq!(
            result.unwrap(),
            Summary {
                processed: 2,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(calls, vec![(1, 0), (2, 0), (3, 0), (4, 0)]);
    }

    #[tokio::test]
    async fn test_batch_halts_on_rate_limit_without_cooldown() {
        let (result, calls) = run_with(&[1, 2, 3], None, |id, _| match id {
            2 => Err(rate_limited()),
            _ => Ok(()),
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("1 of 3 activities left"), "{err}");
        assert_eq!(calls, vec![(1, 0), (2, 0)]);
    }

    #[tokio::test]
    async fn test_batch_retries_once_after_cooldown() {
        let cooldown = Some(Duration::from_millis(1));
        let (result, calls) = run_with(&[1, 2], cooldown, |id, attempt| match (id, attempt) {
            (1, 0) => Err(rate_limited()),
            _ => Ok(()),
        })
        .await;

        assert_eq!(result.unwrap().processed, 2);
        assert_eq!(calls, vec![(1, 0), (1, 1), (2, 0)]);

        let (result, calls) = run_with(&[1, 2], cooldown, |_, _| Err(rate_limited())).await;
        assert!(result.is_err());
        assert_eq!(calls, vec![(1, 0), (1, 1)]);
    }

    // =========================================================================
    // Failure policy
    // =========================================================================

    #[test]
    fn test_after_failure() {
        let rate_limited = ActivityError::UpstreamUnavailable {
            location: Location::new(51.9, 4.2),
            source: FetchError::RateLimited,
        };
        let cooldown = Some(Duration::from_secs(900));

        assert_eq!(after_failure(&rate_limited, None, false), Next::Halt);
        assert_eq!(
            after_failure(&rate_limited, cooldown, false),
            Next::RetryAfter(Duration::from_secs(900))
        );
        assert_eq!(after_failure(&rate_limited, cooldown, true), Next::Halt);

        let gap = ActivityError::Engine(EngineError::MissingHourBucket { hour: at(15) });
        assert_eq!(after_failure(&gap, None, false), Next::Continue);
    }
}
