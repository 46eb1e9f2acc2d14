//! Console rendering of statistics and raw-data pages.

use std::fmt::Write as _;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use crate::data::loader::{
    BIRTH_YEAR, END_STATION, END_TIME, GENDER, START_STATION, START_TIME, TRIP_DURATION, USER_TYPE,
};
use crate::data::model::{month_name, weekday_name, SchemaFlags, Selection};
use crate::data::pager::Page;
use crate::data::stats::{
    Availability, DurationStats, StationStats, Summary, Tally, TimeStats, UserStats,
};

const RULE: &str = "----------------------------------------";
const NO_DATA: &str = "No trips match the selected filters.";

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

pub fn selection_banner(selection: &Selection, trip_count: usize) -> String {
    format!(
        "{} – {} – {}: {trip_count} trips\n{RULE}",
        selection.city, selection.month, selection.day
    )
}

/// Every section of the summary, in display order.
pub fn render_summary(summary: &Summary) -> String {
    let t = &summary.timings;
    [
        section(
            "Calculating The Most Frequent Times of Travel...",
            &time_lines(summary.time.as_ref()),
            t.time_seconds,
        ),
        section(
            "Calculating The Most Popular Stations and Trip...",
            &station_lines(summary.stations.as_ref()),
            t.stations_seconds,
        ),
        section(
            "Calculating Trip Duration...",
            &duration_lines(&summary.duration),
            t.duration_seconds,
        ),
        section(
            "Calculating User Stats...",
            &user_lines(&summary.users),
            t.users_seconds,
        ),
    ]
    .concat()
}

pub fn render_json(summary: &Summary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}

fn section(title: &str, body: &str, elapsed: f64) -> String {
    format!("\n{title}\n\n{body}\nThis took {elapsed:.6} seconds.\n{RULE}\n")
}

fn time_lines(stats: Option<&TimeStats>) -> String {
    let Some(stats) = stats else {
        return format!("{NO_DATA}\n");
    };
    let month = month_name(stats.month.value).unwrap_or("Unknown");
    format!(
        "The most common month: {month} ({} trips)\n\
         The most common day of the week: {} ({} trips)\n\
         The most common start hour: {} ({} trips)\n",
        stats.month.count,
        weekday_name(stats.day_of_week.value),
        stats.day_of_week.count,
        stats.hour.value,
        stats.hour.count,
    )
}

fn station_lines(stats: Option<&StationStats>) -> String {
    let Some(stats) = stats else {
        return format!("{NO_DATA}\n");
    };
    format!(
        "The most commonly used start station: {} ({} trips)\n\
         The most commonly used end station: {} ({} trips)\n\
         The most frequent combination of start station and end station trip:\n  {} -> {} ({} trips)\n",
        stats.start_station.value,
        stats.start_station.count,
        stats.end_station.value,
        stats.end_station.count,
        stats.trip.value.start,
        stats.trip.value.end,
        stats.trip.count,
    )
}

fn duration_lines(stats: &DurationStats) -> String {
    let mut out = format!(
        "The total travel duration is {:.1} seconds ({})\n",
        stats.total_seconds,
        human_duration(stats.total_seconds)
    );
    match stats.mean_seconds {
        Some(mean) => {
            let _ = writeln!(
                out,
                "The average travel duration is {mean:.1} seconds ({})",
                human_duration(mean)
            );
        }
        None => out.push_str("The average travel duration is undefined (no trips).\n"),
    }
    out
}

fn user_lines(stats: &UserStats) -> String {
    let mut out = String::from("The counts of user types are as below:\n");
    counts_table(&mut out, &stats.user_types);

    match &stats.gender {
        Availability::Available(counts) => {
            out.push_str("\nThe counts of gender are as below:\n");
            counts_table(&mut out, counts);
        }
        Availability::Unavailable => {
            out.push_str("\nThere is no gender information in the data for this city.\n");
        }
    }

    match &stats.birth_year {
        Availability::Available(Some(years)) => {
            let _ = writeln!(out, "\nThe earliest year of birth is {}", years.earliest);
            let _ = writeln!(out, "The most recent year of birth is {}", years.latest);
            let _ = writeln!(
                out,
                "The most common year of birth is {} ({} trips)",
                years.most_common.value, years.most_common.count
            );
        }
        Availability::Available(None) => {
            out.push_str("\nNo birth years are recorded for the selected trips.\n");
        }
        Availability::Unavailable => {
            out.push_str("\nThere is no birth year information in the data for this city.\n");
        }
    }
    out
}

fn counts_table(out: &mut String, counts: &[Tally<String>]) {
    if counts.is_empty() {
        out.push_str("  (none)\n");
        return;
    }
    let width = counts.iter().map(|t| t.value.len()).max().unwrap_or(0);
    for t in counts {
        let _ = writeln!(out, "  {:<width$}  {}", t.value, t.count);
    }
}

/// `3725.0` → `"1h 2m 5s"`.
fn human_duration(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    let (days, rem) = (total / 86_400, total % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let (minutes, secs) = (rem / 60, rem % 60);
    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{secs}s"));
    }
    parts.join(" ")
}

// ---------------------------------------------------------------------------
// Raw data pages
// ---------------------------------------------------------------------------

/// Render a page of raw trips as a bordered table. Gender and birth-year
/// columns appear only when the city publishes them.
pub fn render_page(page: &Page<'_>, schema: SchemaFlags) -> Result<String, ArrowError> {
    if page.is_empty() {
        return Ok("No more rows to display.".to_string());
    }
    let batch = page_batch(page, schema)?;
    Ok(pretty_format_batches(&[batch])?.to_string())
}

fn page_batch(page: &Page<'_>, schema: SchemaFlags) -> Result<RecordBatch, ArrowError> {
    let rows = &page.rows;
    let mut fields = vec![
        Field::new("#", DataType::UInt64, false),
        Field::new(START_TIME, DataType::Utf8, false),
        Field::new(END_TIME, DataType::Utf8, true),
        Field::new(TRIP_DURATION, DataType::Float64, false),
        Field::new(START_STATION, DataType::Utf8, false),
        Field::new(END_STATION, DataType::Utf8, false),
        Field::new(USER_TYPE, DataType::Utf8, true),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from_iter_values(
            (0..rows.len()).map(|i| (page.offset + i) as u64),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|t| t.start_time.to_string()),
        )),
        Arc::new(StringArray::from_iter(
            rows.iter().map(|t| t.end_time.map(|e| e.to_string())),
        )),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|t| t.trip_duration),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|t| t.start_station.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|t| t.end_station.as_str()),
        )),
        Arc::new(StringArray::from_iter(
            rows.iter().map(|t| t.user_type.as_deref()),
        )),
    ];

    if schema.has_gender {
        fields.push(Field::new(GENDER, DataType::Utf8, true));
        columns.push(Arc::new(StringArray::from_iter(
            rows.iter().map(|t| t.gender.as_deref()),
        )));
    }
    if schema.has_birth_year {
        fields.push(Field::new(BIRTH_YEAR, DataType::Int32, true));
        columns.push(Arc::new(Int32Array::from_iter(
            rows.iter().map(|t| t.birth_year),
        )));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::*;
    use crate::data::filter::FilteredView;
    use crate::data::model::{City, DayFilter, MonthFilter};
    use crate::data::pager::RawDataCursor;
    use crate::data::test_support::trips_at;

    #[test]
    fn human_durations() {
        assert_eq!(human_duration(0.0), "0s");
        assert_eq!(human_duration(3725.0), "1h 2m 5s");
        assert_eq!(human_duration(90_000.0), "1d 1h");
    }

    #[test]
    fn summary_mentions_missing_columns() {
        let ds = trips_at(City::Washington, &["2017-01-01 08:00:00"]);
        let summary = Summary::compute(&FilteredView::all(&ds));
        let text = render_summary(&summary);
        assert!(text.contains("The most common month: January (1 trips)"));
        assert!(text.contains("The most common day of the week: Sunday"));
        assert!(text.contains("There is no gender information in the data for this city."));
        assert!(text.contains("There is no birth year information in the data for this city."));
    }

    #[test]
    fn empty_summary_renders_without_values() {
        let ds = trips_at(City::Chicago, &["2017-01-01 08:00:00"]);
        let view = FilteredView::all(&ds).refine(MonthFilter::All, DayFilter::Only(Weekday::Mon));
        let text = render_summary(&Summary::compute(&view));
        assert!(text.contains(NO_DATA));
        assert!(text.contains("The average travel duration is undefined"));
        assert!(text.contains("The total travel duration is 0.0 seconds"));
    }

    #[test]
    fn json_marks_unavailable_columns() {
        let ds = trips_at(City::Washington, &["2017-01-01 08:00:00"]);
        let json = render_json(&Summary::compute(&FilteredView::all(&ds))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["users"]["gender"]["status"], "unavailable");
        assert_eq!(value["city"], "washington");
        assert_eq!(value["duration"]["trip_count"], 1);
    }

    #[test]
    fn page_table_lists_rows() {
        let ds = trips_at(City::Chicago, &["2017-01-01 08:00:00", "2017-01-02 09:00:00"]);
        let view = FilteredView::all(&ds);
        let mut cursor = RawDataCursor::new(&view);
        let page = cursor.next_page();
        let table = render_page(&page, ds.schema()).unwrap();
        assert!(table.contains("Start Time"));
        assert!(table.contains("2017-01-02 09:00:00"));
        assert!(table.contains("Canal St"));
        assert!(!table.contains("Gender"));

        let done = render_page(&cursor.next_page(), ds.schema()).unwrap();
        assert_eq!(done, "No more rows to display.");
    }
}
