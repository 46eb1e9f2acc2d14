use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, Weekday};
use serde::Serialize;

use crate::error::Error;

// ---------------------------------------------------------------------------
// City – the supported datasets
// ---------------------------------------------------------------------------

/// One of the three cities with published trip data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum City {
    Chicago,
    NewYorkCity,
    Washington,
}

impl City {
    pub const ALL: [City; 3] = [City::Chicago, City::NewYorkCity, City::Washington];

    /// File name stem of the city's trip file (`chicago.csv`, ...).
    pub fn file_stem(self) -> &'static str {
        match self {
            City::Chicago => "chicago",
            City::NewYorkCity => "new_york_city",
            City::Washington => "washington",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            City::Chicago => "Chicago",
            City::NewYorkCity => "New York City",
            City::Washington => "Washington",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for City {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "chicago" => Ok(City::Chicago),
            "new york city" | "new_york_city" | "new-york-city" | "new york" | "nyc" => {
                Ok(City::NewYorkCity)
            }
            "washington" => Ok(City::Washington),
            _ => Err(Error::UnknownCity(s.trim().to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Month / day filters
// ---------------------------------------------------------------------------

/// Months covered by the published data. The trip files only span
/// January to June, so the filter does not offer later months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    January = 1,
    February,
    March,
    April,
    May,
    June,
}

impl Month {
    pub const ALL: [Month; 6] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
    ];

    /// Calendar month number, January = 1.
    pub fn number(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        month_name(self.number()).unwrap_or_default()
    }
}

/// English name for a calendar month number in 1..=12.
pub fn month_name(month: u32) -> Option<&'static str> {
    u8::try_from(month)
        .ok()
        .and_then(|m| chrono::Month::try_from(m).ok())
        .map(|m| m.name())
}

/// Full English name of a weekday ("Monday", ...).
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Month filter: everything, or one month of January..June.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MonthFilter {
    #[default]
    All,
    Only(Month),
}

impl MonthFilter {
    pub fn matches(self, month: u32) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Only(m) => m.number() == month,
        }
    }
}

impl FromStr for MonthFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        if key == "all" {
            return Ok(MonthFilter::All);
        }
        Month::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(&key))
            .map(MonthFilter::Only)
            .ok_or_else(|| Error::UnknownMonth(s.trim().to_string()))
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthFilter::All => f.write_str("all months"),
            MonthFilter::Only(m) => f.write_str(m.name()),
        }
    }
}

/// Day-of-week filter: everything, or a single weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DayFilter {
    #[default]
    All,
    Only(Weekday),
}

impl DayFilter {
    pub fn matches(self, day: Weekday) -> bool {
        match self {
            DayFilter::All => true,
            DayFilter::Only(d) => d == day,
        }
    }
}

impl FromStr for DayFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const DAYS: [Weekday; 7] = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ];
        let key = normalize(s);
        if key == "all" {
            return Ok(DayFilter::All);
        }
        DAYS.into_iter()
            .find(|d| weekday_name(*d).eq_ignore_ascii_case(&key))
            .map(DayFilter::Only)
            .ok_or_else(|| Error::UnknownDay(s.trim().to_string()))
    }
}

impl fmt::Display for DayFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayFilter::All => f.write_str("all days"),
            DayFilter::Only(d) => f.write_str(weekday_name(*d)),
        }
    }
}

/// A validated city/month/day choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub city: City,
    pub month: MonthFilter,
    pub day: DayFilter,
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Trip – one row of a city dataset
// ---------------------------------------------------------------------------

/// A single bike-share trip with its derived time buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    /// Trip length in seconds.
    pub trip_duration: f64,
    pub start_station: String,
    pub end_station: String,
    pub user_type: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
    /// Calendar month of `start_time`, 1..=12.
    pub month: u32,
    pub day_of_week: Weekday,
    /// Hour of `start_time`, 0..=23.
    pub hour: u32,
}

// ---------------------------------------------------------------------------
// CityDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Which optional columns the city's source carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SchemaFlags {
    pub has_gender: bool,
    pub has_birth_year: bool,
}

/// A row dropped under [`MalformedRowPolicy::Skip`](super::loader::MalformedRowPolicy::Skip).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    /// 1-based line in the source, counting the header as line 1.
    pub line: usize,
    pub message: String,
}

/// All trips for one city. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct CityDataset {
    city: City,
    trips: Vec<Trip>,
    schema: SchemaFlags,
    skipped: Vec<RowIssue>,
}

impl CityDataset {
    pub fn new(city: City, trips: Vec<Trip>, schema: SchemaFlags, skipped: Vec<RowIssue>) -> Self {
        CityDataset {
            city,
            trips,
            schema,
            skipped,
        }
    }

    pub fn city(&self) -> City {
        self.city
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn schema(&self) -> SchemaFlags {
        self.schema
    }

    /// Rows dropped while loading; always empty under the abort policy.
    pub fn skipped_rows(&self) -> &[RowIssue] {
        &self.skipped
    }

    /// Number of trips.
    pub fn len(&self) -> usize {
        self.trips.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_lookup_is_case_insensitive() {
        assert_eq!("CHICAGO".parse::<City>().unwrap(), City::Chicago);
        assert_eq!(" New York City ".parse::<City>().unwrap(), City::NewYorkCity);
        assert_eq!("nyc".parse::<City>().unwrap(), City::NewYorkCity);
        assert!(matches!(
            "boston".parse::<City>(),
            Err(Error::UnknownCity(name)) if name == "boston"
        ));
    }

    #[test]
    fn month_filter_stops_at_june() {
        assert_eq!(
            "March".parse::<MonthFilter>().unwrap(),
            MonthFilter::Only(Month::March)
        );
        assert_eq!("ALL".parse::<MonthFilter>().unwrap(), MonthFilter::All);
        assert!("july".parse::<MonthFilter>().is_err());
        assert!("december".parse::<MonthFilter>().is_err());
    }

    #[test]
    fn day_filter_accepts_full_names() {
        assert_eq!(
            "sunday".parse::<DayFilter>().unwrap(),
            DayFilter::Only(Weekday::Sun)
        );
        assert_eq!("All".parse::<DayFilter>().unwrap(), DayFilter::All);
        assert!("sun".parse::<DayFilter>().is_err());
    }

    #[test]
    fn month_names_cover_full_year() {
        assert_eq!(Month::June.name(), "June");
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn filters_match_derived_fields() {
        assert!(MonthFilter::All.matches(9));
        assert!(MonthFilter::Only(Month::February).matches(2));
        assert!(!MonthFilter::Only(Month::February).matches(3));
        assert!(DayFilter::Only(Weekday::Fri).matches(Weekday::Fri));
        assert!(!DayFilter::Only(Weekday::Fri).matches(Weekday::Sat));
    }
}
