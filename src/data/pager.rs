use super::filter::FilteredView;
use super::model::Trip;

/// Rows revealed per request.
pub const PAGE_SIZE: usize = 5;

/// One window of raw rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    /// Position of the first row within the view.
    pub offset: usize,
    pub rows: Vec<&'a Trip>,
}

impl Page<'_> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Forward-only cursor handing out fixed-size windows of a view.
#[derive(Debug, Clone)]
pub struct RawDataCursor<'v, 'a> {
    view: &'v FilteredView<'a>,
    offset: usize,
    page_size: usize,
}

impl<'v, 'a> RawDataCursor<'v, 'a> {
    pub fn new(view: &'v FilteredView<'a>) -> Self {
        Self::with_page_size(view, PAGE_SIZE)
    }

    /// A page size of zero is treated as one.
    pub fn with_page_size(view: &'v FilteredView<'a>, page_size: usize) -> Self {
        RawDataCursor {
            view,
            offset: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Rows already handed out.
    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn has_more(&self) -> bool {
        self.offset < self.view.len()
    }

    /// The next window. Short or empty once the view is exhausted.
    pub fn next_page(&mut self) -> Page<'a> {
        let start = self.offset.min(self.view.len());
        let end = (start + self.page_size).min(self.view.len());
        let rows = (start..end).filter_map(|n| self.view.get(n)).collect();
        self.offset = end;
        Page { offset: start, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::City;
    use crate::data::test_support::trips_at;

    fn starts(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("2017-01-{:02} 08:00:00", i % 28 + 1))
            .collect()
    }

    #[test]
    fn twelve_rows_make_three_pages() {
        let owned = starts(12);
        let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
        let ds = trips_at(City::Chicago, &refs);
        let view = FilteredView::all(&ds);
        let mut cursor = RawDataCursor::new(&view);

        let mut sizes = Vec::new();
        while cursor.has_more() {
            sizes.push(cursor.next_page().len());
        }
        assert_eq!(sizes, vec![5, 5, 2]);
        assert!(!cursor.has_more());
        assert!(cursor.next_page().is_empty());
    }

    #[test]
    fn pages_follow_view_order() {
        let ds = trips_at(
            City::Chicago,
            &["2017-01-01 01:00:00", "2017-01-01 02:00:00", "2017-01-01 03:00:00"],
        );
        let view = FilteredView::all(&ds);
        let mut cursor = RawDataCursor::with_page_size(&view, 2);
        let first = cursor.next_page();
        assert_eq!(first.offset, 0);
        assert_eq!(first.rows[1].hour, 2);
        let second = cursor.next_page();
        assert_eq!(second.offset, 2);
        assert_eq!(second.rows[0].hour, 3);
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn empty_view_has_nothing_to_show() {
        let ds = trips_at(City::Washington, &[]);
        let view = FilteredView::all(&ds);
        let mut cursor = RawDataCursor::new(&view);
        assert!(!cursor.has_more());
        assert!(cursor.next_page().is_empty());
    }
}
