use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDateTime, Timelike};

use super::model::{City, CityDataset, RowIssue, SchemaFlags, Trip};
use super::source::{RawTable, RowSource};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Source column names
// ---------------------------------------------------------------------------

pub const START_TIME: &str = "Start Time";
pub const END_TIME: &str = "End Time";
pub const TRIP_DURATION: &str = "Trip Duration";
pub const START_STATION: &str = "Start Station";
pub const END_STATION: &str = "End Station";
pub const USER_TYPE: &str = "User Type";
pub const GENDER: &str = "Gender";
pub const BIRTH_YEAR: &str = "Birth Year";

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

// ---------------------------------------------------------------------------
// Load options
// ---------------------------------------------------------------------------

/// What to do with a row whose required fields do not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedRowPolicy {
    /// Fail the whole load with [`Error::MalformedRow`].
    #[default]
    Abort,
    /// Drop the row and record it in [`CityDataset::skipped_rows`].
    Skip,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub on_malformed: MalformedRowPolicy,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a city's trips with the default (abort) policy.
pub fn load(source: &dyn RowSource, city: City) -> Result<CityDataset> {
    load_with(source, city, LoadOptions::default())
}

/// Load a city given as free text; unknown names fail with [`Error::UnknownCity`].
pub fn load_named(source: &dyn RowSource, name: &str) -> Result<CityDataset> {
    let city: City = name.parse()?;
    load(source, city)
}

pub fn load_with(source: &dyn RowSource, city: City, options: LoadOptions) -> Result<CityDataset> {
    let table = source.read_table(city)?;
    let dataset = from_table(city, &table, options)?;
    log::info!(
        "loaded {} trips for {city} (gender: {}, birth year: {})",
        dataset.len(),
        dataset.schema().has_gender,
        dataset.schema().has_birth_year
    );
    if !dataset.skipped_rows().is_empty() {
        log::warn!(
            "skipped {} malformed rows for {city}",
            dataset.skipped_rows().len()
        );
    }
    Ok(dataset)
}

/// Build a dataset from an already-read table.
pub fn from_table(city: City, table: &RawTable, options: LoadOptions) -> Result<CityDataset> {
    let layout = Layout::resolve(city, table)?;
    let mut trips = Vec::with_capacity(table.rows.len());
    let mut skipped = Vec::new();

    for (i, row) in table.rows.iter().enumerate() {
        // Header is line 1.
        let line = i + 2;
        let parsed = match table.rejection(i) {
            Some(reason) => Err(Error::UndecodableRow {
                line,
                reason: reason.to_string(),
            }),
            None => layout.parse_row(line, row),
        };
        match parsed {
            Ok(trip) => trips.push(trip),
            Err(err) => match options.on_malformed {
                MalformedRowPolicy::Abort => return Err(err),
                MalformedRowPolicy::Skip => {
                    log::debug!("skipping row: {err}");
                    skipped.push(RowIssue {
                        line,
                        message: err.to_string(),
                    });
                }
            },
        }
    }

    Ok(CityDataset::new(city, trips, layout.schema(), skipped))
}

// ---------------------------------------------------------------------------
// Column layout
// ---------------------------------------------------------------------------

/// Resolved column positions for one table.
struct Layout {
    start_time: usize,
    end_time: Option<usize>,
    trip_duration: usize,
    start_station: usize,
    end_station: usize,
    user_type: Option<usize>,
    gender: Option<usize>,
    birth_year: Option<usize>,
}

impl Layout {
    fn resolve(city: City, table: &RawTable) -> Result<Self> {
        let required = |column: &'static str| {
            table.column_index(column).ok_or_else(|| Error::MissingColumn {
                city: city.to_string(),
                column,
            })
        };
        Ok(Layout {
            start_time: required(START_TIME)?,
            end_time: table.column_index(END_TIME),
            trip_duration: required(TRIP_DURATION)?,
            start_station: required(START_STATION)?,
            end_station: required(END_STATION)?,
            user_type: table.column_index(USER_TYPE),
            gender: table.column_index(GENDER),
            birth_year: table.column_index(BIRTH_YEAR),
        })
    }

    fn schema(&self) -> SchemaFlags {
        SchemaFlags {
            has_gender: self.gender.is_some(),
            has_birth_year: self.birth_year.is_some(),
        }
    }

    /// Cells past the end of a short row read as blank.
    fn parse_row(&self, line: usize, row: &[String]) -> Result<Trip> {
        let cell = move |idx: usize| row.get(idx).map_or("", |c| c.trim());
        let optional = move |idx: Option<usize>| idx.map(cell).filter(|s| !s.is_empty());
        let malformed = |column: &'static str, value: &str| Error::MalformedRow {
            line,
            column,
            value: value.to_string(),
        };

        let raw_start = cell(self.start_time);
        let start_time = parse_timestamp(raw_start).ok_or_else(|| malformed(START_TIME, raw_start))?;

        let end_time = match optional(self.end_time) {
            Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| malformed(END_TIME, raw))?),
            None => None,
        };

        let raw_duration = cell(self.trip_duration);
        let trip_duration = raw_duration
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| malformed(TRIP_DURATION, raw_duration))?;

        let station = |idx: usize, column: &'static str| {
            let name = cell(idx);
            if name.is_empty() {
                Err(malformed(column, name))
            } else {
                Ok(name.to_string())
            }
        };
        let start_station = station(self.start_station, START_STATION)?;
        let end_station = station(self.end_station, END_STATION)?;

        let birth_year = match optional(self.birth_year) {
            Some(raw) => Some(parse_year(raw).ok_or_else(|| malformed(BIRTH_YEAR, raw))?),
            None => None,
        };

        Ok(Trip {
            start_time,
            end_time,
            trip_duration,
            start_station,
            end_station,
            user_type: optional(self.user_type).map(str::to_string),
            gender: optional(self.gender).map(str::to_string),
            birth_year,
            month: start_time.month(),
            day_of_week: start_time.weekday(),
            hour: start_time.hour(),
        })
    }
}

/// Parse a trip timestamp in any of the accepted layouts.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Plausible birth years; anything outside is a malformed cell.
const BIRTH_YEARS: RangeInclusive<i32> = 1800..=2100;

/// Birth years are stored as floats in some files ("1992.0"); fractions
/// are truncated.
fn parse_year(s: &str) -> Option<i32> {
    let year = match s.parse::<i32>() {
        Ok(year) => year,
        Err(_) => {
            let y = s.parse::<f64>().ok().filter(|y| y.is_finite())?.trunc();
            if y < f64::from(i32::MIN) || y > f64::from(i32::MAX) {
                return None;
            }
            y as i32
        }
    };
    BIRTH_YEARS.contains(&year).then_some(year)
}
