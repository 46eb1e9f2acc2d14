use super::model::{CityDataset, DayFilter, MonthFilter, SchemaFlags, Trip};

// ---------------------------------------------------------------------------
// FilteredView – a read-only subset of a dataset
// ---------------------------------------------------------------------------

/// Trips of a [`CityDataset`] that passed a month/day filter, kept as row
/// indices into the borrowed dataset in their original order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a CityDataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// A view over every trip.
    pub fn all(dataset: &'a CityDataset) -> Self {
        FilteredView {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    pub fn dataset(&self) -> &'a CityDataset {
        self.dataset
    }

    pub fn schema(&self) -> SchemaFlags {
        self.dataset.schema()
    }

    /// Row positions in the source dataset.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The `n`-th trip of the view.
    pub fn get(&self, n: usize) -> Option<&'a Trip> {
        let dataset = self.dataset;
        self.indices.get(n).map(|&i| &dataset.trips()[i])
    }

    /// Trips in view order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Trip> + '_ {
        let trips = self.dataset.trips();
        self.indices.iter().map(move |&i| &trips[i])
    }

    /// Narrow this view further. Filters compose with AND semantics.
    pub fn refine(&self, month: MonthFilter, day: DayFilter) -> FilteredView<'a> {
        let trips = self.dataset.trips();
        let indices = self
            .indices
            .iter()
            .copied()
            .filter(|&i| passes(&trips[i], month, day))
            .collect();
        FilteredView {
            dataset: self.dataset,
            indices,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Apply the month and day filters to a dataset.
///
/// `MonthFilter::All` and `DayFilter::All` impose no constraint; an empty
/// result is a valid view.
pub fn filter(dataset: &CityDataset, month: MonthFilter, day: DayFilter) -> FilteredView<'_> {
    let view = FilteredView::all(dataset).refine(month, day);
    log::debug!(
        "{} of {} {} trips match {month} / {day}",
        view.len(),
        dataset.len(),
        dataset.city()
    );
    view
}

fn passes(trip: &Trip, month: MonthFilter, day: DayFilter) -> bool {
    month.matches(trip.month) && day.matches(trip.day_of_week)
}
