//! Bike-share trip analytics: load a city's trips, filter them by month
//! and weekday, and summarise travel times, stations, durations and users.

pub mod data;
pub mod error;
pub mod report;

pub use error::{Error, Result};
