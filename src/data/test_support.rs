use super::loader::parse_timestamp;
use super::model::{City, CityDataset, SchemaFlags, Trip};
use chrono::{Datelike, Timelike};

/// A trip starting at `start` with neutral values everywhere else.
pub fn trip(start: &str) -> Trip {
    let start_time = parse_timestamp(start).expect("valid test timestamp");
    Trip {
        start_time,
        end_time: None,
        trip_duration: 60.0,
        start_station: "Canal St".into(),
        end_station: "Clark St".into(),
        user_type: Some("Subscriber".into()),
        gender: None,
        birth_year: None,
        month: start_time.month(),
        day_of_week: start_time.weekday(),
        hour: start_time.hour(),
    }
}

pub fn trips_at(city: City, starts: &[&str]) -> CityDataset {
    dataset(city, starts.iter().map(|s| trip(s)).collect(), SchemaFlags::default())
}

pub fn dataset(city: City, trips: Vec<Trip>, schema: SchemaFlags) -> CityDataset {
    CityDataset::new(city, trips, schema, Vec::new())
}
