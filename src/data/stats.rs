//! Descriptive statistics over a [`FilteredView`].
//!
//! The four groups (travel times, stations, durations, users) are
//! independent and each makes a single pass over the view. Every "most
//! common" value breaks ties by first occurrence in view order, so results
//! are deterministic for a given input.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use chrono::Weekday;
use serde::Serialize;

use super::filter::FilteredView;
use super::model::City;

// ---------------------------------------------------------------------------
// Counting helpers
// ---------------------------------------------------------------------------

/// A value together with how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally<T> {
    pub value: T,
    pub count: usize,
}

impl<T> Tally<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> Tally<U> {
        Tally {
            value: f(self.value),
            count: self.count,
        }
    }
}

/// Occurrence counts in first-seen order.
fn tally<T, I>(values: I) -> Vec<Tally<T>>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut slots: HashMap<T, usize> = HashMap::new();
    let mut counts: Vec<Tally<T>> = Vec::new();
    for value in values {
        match slots.get(&value) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                slots.insert(value.clone(), counts.len());
                counts.push(Tally { value, count: 1 });
            }
        }
    }
    counts
}

/// Most frequent value; the earliest one wins a tie. `None` on no input.
pub fn mode<T, I>(values: I) -> Option<Tally<T>>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    tally(values)
        .into_iter()
        .fold(None, |best: Option<Tally<T>>, candidate| match best {
            Some(b) if b.count >= candidate.count => Some(b),
            _ => Some(candidate),
        })
}

/// Counts ordered by frequency, ties in first-seen order.
pub fn value_counts<T, I>(values: I) -> Vec<Tally<T>>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut counts = tally(values);
    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

// ---------------------------------------------------------------------------
// Availability – optional per-city columns
// ---------------------------------------------------------------------------

/// Result for a column the city may not publish at all.
///
/// `Unavailable` means the column does not exist in this city's data, which
/// is different from an available column with no values in the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Availability<T> {
    Available(T),
    Unavailable,
}

impl<T> Availability<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }

    pub fn available(self) -> Option<T> {
        match self {
            Availability::Available(v) => Some(v),
            Availability::Unavailable => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Time of travel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeStats {
    /// Calendar month number, 1..=12.
    pub month: Tally<u32>,
    pub day_of_week: Tally<Weekday>,
    /// Start hour, 0..=23.
    pub hour: Tally<u32>,
}

/// Most common month, weekday and start hour. `None` for an empty view.
pub fn time_stats(view: &FilteredView<'_>) -> Option<TimeStats> {
    let mut months = Vec::with_capacity(view.len());
    let mut days = Vec::with_capacity(view.len());
    let mut hours = Vec::with_capacity(view.len());
    for trip in view.iter() {
        months.push(trip.month);
        days.push(trip.day_of_week);
        hours.push(trip.hour);
    }

    Some(TimeStats {
        month: mode(months)?,
        day_of_week: mode(days)?,
        hour: mode(hours)?,
    })
}

// ---------------------------------------------------------------------------
// Stations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StationPair {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationStats {
    pub start_station: Tally<String>,
    pub end_station: Tally<String>,
    pub trip: Tally<StationPair>,
}

/// Most used start station, end station and start/end combination.
/// `None` for an empty view.
pub fn station_stats(view: &FilteredView<'_>) -> Option<StationStats> {
    let mut starts = Vec::with_capacity(view.len());
    let mut ends = Vec::with_capacity(view.len());
    let mut pairs = Vec::with_capacity(view.len());
    for trip in view.iter() {
        let start = trip.start_station.as_str();
        let end = trip.end_station.as_str();
        starts.push(start);
        ends.push(end);
        pairs.push((start, end));
    }

    Some(StationStats {
        start_station: mode(starts)?.map(str::to_string),
        end_station: mode(ends)?.map(str::to_string),
        trip: mode(pairs)?.map(|(start, end)| StationPair {
            start: start.to_string(),
            end: end.to_string(),
        }),
    })
}

// ---------------------------------------------------------------------------
// Trip duration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub trip_count: usize,
    /// Sum of trip durations in seconds; zero for an empty view.
    pub total_seconds: f64,
    /// Mean trip duration in seconds; `None` for an empty view.
    pub mean_seconds: Option<f64>,
}

pub fn duration_stats(view: &FilteredView<'_>) -> DurationStats {
    let (trip_count, total_seconds) = view
        .iter()
        .fold((0usize, 0.0f64), |(n, sum), trip| (n + 1, sum + trip.trip_duration));
    let mean_seconds = (trip_count > 0).then(|| total_seconds / trip_count as f64);
    DurationStats {
        trip_count,
        total_seconds,
        mean_seconds,
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BirthYearStats {
    pub earliest: i32,
    pub latest: i32,
    pub most_common: Tally<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    /// Trips per user type, most frequent first. Blank cells are not counted.
    pub user_types: Vec<Tally<String>>,
    pub gender: Availability<Vec<Tally<String>>>,
    /// `Available(None)` when the column exists but the view holds no years.
    pub birth_year: Availability<Option<BirthYearStats>>,
}

/// User type counts plus gender and birth-year figures where the city
/// publishes them.
pub fn user_stats(view: &FilteredView<'_>) -> UserStats {
    let schema = view.schema();

    let user_types = value_counts(view.iter().filter_map(|t| t.user_type.as_deref()))
        .into_iter()
        .map(|t| t.map(str::to_string))
        .collect();

    let gender = if schema.has_gender {
        Availability::Available(
            value_counts(view.iter().filter_map(|t| t.gender.as_deref()))
                .into_iter()
                .map(|t| t.map(str::to_string))
                .collect(),
        )
    } else {
        Availability::Unavailable
    };

    let birth_year = if schema.has_birth_year {
        Availability::Available(birth_year_stats(view))
    } else {
        Availability::Unavailable
    };

    UserStats {
        user_types,
        gender,
        birth_year,
    }
}

fn birth_year_stats(view: &FilteredView<'_>) -> Option<BirthYearStats> {
    let years: Vec<i32> = view.iter().filter_map(|t| t.birth_year).collect();
    let earliest = *years.iter().min()?;
    let latest = *years.iter().max()?;
    let most_common = mode(years)?;
    Some(BirthYearStats {
        earliest,
        latest,
        most_common,
    })
}

// ---------------------------------------------------------------------------
// Summary – all groups at once
// ---------------------------------------------------------------------------

/// Wall time spent computing each group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Timings {
    pub time_seconds: f64,
    pub stations_seconds: f64,
    pub duration_seconds: f64,
    pub users_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub city: City,
    pub trip_count: usize,
    pub time: Option<TimeStats>,
    pub stations: Option<StationStats>,
    pub duration: DurationStats,
    pub users: UserStats,
    pub timings: Timings,
}

impl Summary {
    pub fn compute(view: &FilteredView<'_>) -> Self {
        let (time, t_time) = timed(|| time_stats(view));
        let (stations, t_stations) = timed(|| station_stats(view));
        let (duration, t_duration) = timed(|| duration_stats(view));
        let (users, t_users) = timed(|| user_stats(view));
        Summary {
            city: view.dataset().city(),
            trip_count: view.len(),
            time,
            stations,
            duration,
            users,
            timings: Timings {
                time_seconds: t_time.as_secs_f64(),
                stations_seconds: t_stations.as_secs_f64(),
                duration_seconds: t_duration.as_secs_f64(),
                users_seconds: t_users.as_secs_f64(),
            },
        }
    }
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let started = Instant::now();
    let out = f();
    (out, started.elapsed())
}
