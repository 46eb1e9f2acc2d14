use chrono::Weekday;
use proptest::prelude::*;

use bikeshare_explorer::data::filter::{filter, FilteredView};
use bikeshare_explorer::data::loader::load;
use bikeshare_explorer::data::model::{City, CityDataset, DayFilter, Month, MonthFilter};
use bikeshare_explorer::data::pager::{RawDataCursor, PAGE_SIZE};
use bikeshare_explorer::data::source::{MemorySource, RawTable};
use bikeshare_explorer::data::stats::{duration_stats, station_stats, time_stats, user_stats};

const DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// (month, day of month, hour, station) per row.
fn rows_strategy() -> impl Strategy<Value = Vec<(u32, u32, u32, usize)>> {
    prop::collection::vec((1u32..=6, 1u32..=28, 0u32..24, 0usize..4), 0..60)
}

fn month_strategy() -> impl Strategy<Value = MonthFilter> {
    prop_oneof![
        Just(MonthFilter::All),
        prop::sample::select(Month::ALL.to_vec()).prop_map(MonthFilter::Only),
    ]
}

fn day_strategy() -> impl Strategy<Value = DayFilter> {
    prop_oneof![
        Just(DayFilter::All),
        prop::sample::select(DAYS.to_vec()).prop_map(DayFilter::Only),
    ]
}

fn source_for(rows: &[(u32, u32, u32, usize)]) -> MemorySource {
    let columns = ["Start Time", "Trip Duration", "Start Station", "End Station", "User Type"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    let cells = rows
        .iter()
        .map(|&(month, day, hour, station)| {
            vec![
                format!("2017-{month:02}-{day:02} {hour:02}:15:00"),
                format!("{}", 60 * (station + 1)),
                format!("Station {station}"),
                format!("Station {}", (station + 1) % 4),
                "Subscriber".to_string(),
            ]
        })
        .collect();
    MemorySource::new().with_table(City::Chicago, RawTable::new(columns, cells))
}

fn load_rows(rows: &[(u32, u32, u32, usize)]) -> CityDataset {
    load(&source_for(rows), City::Chicago).expect("generated rows are valid")
}

proptest! {
    #[test]
    fn load_then_filter_is_deterministic(
        rows in rows_strategy(),
        month in month_strategy(),
        day in day_strategy(),
    ) {
        let first = load_rows(&rows);
        let second = load_rows(&rows);
        let a = filter(&first, month, day);
        let b = filter(&second, month, day);
        prop_assert_eq!(a.indices(), b.indices());
        prop_assert_eq!(first.trips(), second.trips());
    }

    #[test]
    fn filtering_everything_is_identity(rows in rows_strategy()) {
        let ds = load_rows(&rows);
        let view = filter(&ds, MonthFilter::All, DayFilter::All);
        let expected: Vec<usize> = (0..ds.len()).collect();
        prop_assert_eq!(view.indices(), expected.as_slice());
    }

    #[test]
    fn month_then_day_equals_both_at_once(
        rows in rows_strategy(),
        month in month_strategy(),
        day in day_strategy(),
    ) {
        let ds = load_rows(&rows);
        let staged = filter(&ds, month, DayFilter::All).refine(MonthFilter::All, day);
        let reversed = filter(&ds, MonthFilter::All, day).refine(month, DayFilter::All);
        let direct = filter(&ds, month, day);
        prop_assert_eq!(staged.indices(), direct.indices());
        prop_assert_eq!(reversed.indices(), direct.indices());
    }

    #[test]
    fn every_kept_trip_matches_the_selection(
        rows in rows_strategy(),
        month in month_strategy(),
        day in day_strategy(),
    ) {
        let ds = load_rows(&rows);
        let view = filter(&ds, month, day);
        for trip in view.iter() {
            prop_assert!(month.matches(trip.month));
            prop_assert!(day.matches(trip.day_of_week));
        }
    }

    #[test]
    fn pages_cover_the_view_exactly_once(rows in rows_strategy()) {
        let ds = load_rows(&rows);
        let view = FilteredView::all(&ds);
        let mut cursor = RawDataCursor::new(&view);
        let mut pages = 0;
        let mut seen = 0;
        while cursor.has_more() {
            let page = cursor.next_page();
            prop_assert!(!page.is_empty());
            prop_assert!(page.len() <= PAGE_SIZE);
            prop_assert_eq!(page.offset, seen);
            seen += page.len();
            pages += 1;
        }
        prop_assert_eq!(pages, view.len().div_ceil(PAGE_SIZE));
        prop_assert_eq!(seen, view.len());
        prop_assert!(cursor.next_page().is_empty());
    }

    #[test]
    fn statistics_never_fail(
        rows in rows_strategy(),
        month in month_strategy(),
        day in day_strategy(),
    ) {
        let ds = load_rows(&rows);
        let view = filter(&ds, month, day);
        let duration = duration_stats(&view);
        prop_assert_eq!(duration.trip_count, view.len());
        prop_assert_eq!(duration.mean_seconds.is_none(), view.is_empty());
        prop_assert_eq!(time_stats(&view).is_none(), view.is_empty());
        prop_assert_eq!(station_stats(&view).is_none(), view.is_empty());
        let users = user_stats(&view);
        let counted: usize = users.user_types.iter().map(|t| t.count).sum();
        prop_assert_eq!(counted, view.len());
    }
}
