//! Sort, filter and paginate helpers shared by every region's list view.
//!
//! All functions here are pure and know nothing about the record types they
//! work on.

use std::cmp::Ordering;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest first
    Asc,
    /// Largest first
    #[default]
    Desc,
}

impl SortDirection {
    /// The other direction
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Current sort of a list view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<F> {
    /// Field being sorted on
    pub field: F,
    /// Direction
    pub direction: SortDirection,
}

impl<F: Copy + PartialEq> SortSpec<F> {
    /// Sort on `field`, descending
    pub const fn new(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }

    /// Header-click semantics: the same field flips, a new field starts descending
    #[must_use]
    pub fn toggle(self, field: F) -> Self {
        if self.field == field {
            Self {
                field,
                direction: self.direction.flipped(),
            }
        } else {
            Self::new(field)
        }
    }
}

/// Stable sort; equal keys keep their relative order in both directions
pub fn sort<T, C>(items: &mut [T], direction: SortDirection, compare: C)
where
    C: Fn(&T, &T) -> Ordering,
{
    match direction {
        SortDirection::Asc => items.sort_by(|a, b| compare(a, b)),
        SortDirection::Desc => items.sort_by(|a, b| compare(b, a)),
    }
}

/// Case-insensitive substring search over extracted fields, ANDed with a predicate.
///
/// A blank search matches everything.
pub fn filter<'a, T, P>(
    items: &'a [T],
    search: &str,
    search_fields: &[fn(&T) -> &str],
    predicate: P,
) -> Vec<&'a T>
where
    P: Fn(&T) -> bool,
{
    let needle = search.trim().to_lowercase();

    items
        .iter()
        .filter(|item| predicate(item))
        .filter(|item| {
            needle.is_empty()
                || search_fields
                    .iter()
                    .any(|field| field(item).to_lowercase().contains(&needle))
        })
        .collect()
}

/// One entry of the page-number strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    /// A clickable page number
    Page(usize),
    /// Skipped pages
    Ellipsis,
}

/// One page of a list view
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Current page, 1-based and always within `1..=total_pages`
    pub page: usize,
    /// At least 1, even for an empty list
    pub total_pages: usize,
    /// Items across all pages
    pub total_items: usize,
    /// Index of the first item on this page
    pub start_index: usize,
    /// One past the last item on this page
    pub end_index: usize,
    /// Page strip for navigation
    pub page_numbers: Vec<PageMarker>,
}

/// Number of pages for `count` items; never zero
#[must_use]
pub const fn total_pages(count: usize, page_size: usize) -> usize {
    let page_size = if page_size == 0 { 1 } else { page_size };
    let pages = count.div_ceil(page_size);
    if pages == 0 { 1 } else { pages }
}

/// Cut one page out of `items`, clamping the requested page into range.
///
/// `window` is how many leading (or trailing) page numbers are listed
/// before the strip collapses into ellipses.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page_size: usize, page: usize, window: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_pages(total_items, page_size);
    let page = page.clamp(1, total_pages);

    let start_index = (page - 1) * page_size;
    let end_index = (start_index + page_size).min(total_items);

    let items = items
        .into_iter()
        .skip(start_index)
        .take(end_index - start_index)
        .collect();

    Page {
        items,
        page,
        total_pages,
        total_items,
        start_index,
        end_index,
        page_numbers: page_numbers(page, total_pages, window),
    }
}

/// Ellipsis-compressed page strip. Only visible numbers are materialised.
#[must_use]
pub fn page_numbers(current: usize, total: usize, window: usize) -> Vec<PageMarker> {
    let window = window.max(3);

    let visible: Vec<usize> = if total <= window + 2 {
        (1..=total).collect()
    } else if current < window {
        (1..=window).chain(std::iter::once(total)).collect()
    } else if current > total - window + 1 {
        std::iter::once(1).chain(total - window + 1..=total).collect()
    } else {
        vec![1, current - 1, current, current + 1, total]
    };

    let mut markers = Vec::with_capacity(visible.len() + 2);
    let mut previous = 0;
    for page in visible {
        if page > previous + 1 && previous != 0 {
            markers.push(PageMarker::Ellipsis);
        }
        markers.push(PageMarker::Page(page));
        previous = page;
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ellipses(markers: &[PageMarker]) -> usize {
        markers
            .iter()
            .filter(|m| matches!(m, PageMarker::Ellipsis))
            .count()
    }

    #[test]
    fn test_empty_list_is_one_empty_page() {
        let page = paginate(Vec::<u32>::new(), 15, 3, 5);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
        assert_eq!(page.page_numbers, vec![PageMarker::Page(1)]);
    }

    #[test]
    fn test_page_past_the_end_returns_last_page() {
        let page = paginate((1..=32).collect(), 15, 9, 5);
        assert_eq!(page.page, 3);
        assert_eq!(page.items, vec![31, 32]);
        assert_eq!((page.start_index, page.end_index), (30, 32));
    }

    #[test]
    fn test_small_strip_lists_every_page() {
        let strip = page_numbers(2, 7, 5);
        assert_eq!(strip.len(), 7);
        assert_eq!(ellipses(&strip), 0);
    }

    #[test]
    fn test_strip_near_start() {
        let strip = page_numbers(1, 10, 5);
        assert_eq!(ellipses(&strip), 1);
        assert_eq!(strip.first(), Some(&PageMarker::Page(1)));
        assert_eq!(strip.last(), Some(&PageMarker::Page(10)));
        assert!(strip.contains(&PageMarker::Page(4)));
    }

    #[test]
    fn test_strip_in_the_middle() {
        let strip = page_numbers(5, 10, 5);
        assert_eq!(ellipses(&strip), 2);
        assert_eq!(
            strip,
            vec![
                PageMarker::Page(1),
                PageMarker::Ellipsis,
                PageMarker::Page(4),
                PageMarker::Page(5),
                PageMarker::Page(6),
                PageMarker::Ellipsis,
                PageMarker::Page(10),
            ]
        );
    }

    #[test]
    fn test_strip_near_end() {
        let strip = page_numbers(10, 10, 5);
        assert_eq!(ellipses(&strip), 1);
        assert_eq!(strip.first(), Some(&PageMarker::Page(1)));
        assert!(strip.contains(&PageMarker::Page(6)));
    }

    #[test]
    fn test_toggle_sort() {
        let spec = SortSpec::new("gmv");
        assert_eq!(spec.direction, SortDirection::Desc);

        let flipped = spec.toggle("gmv");
        assert_eq!(flipped.direction, SortDirection::Asc);

        let other = flipped.toggle("name");
        assert_eq!(other, SortSpec::new("name"));
    }

    #[test]
    fn test_filter_ands_search_with_predicate() {
        #[derive(Debug, PartialEq)]
        struct Row {
            name: String,
            gmv: i32,
        }
        let row = |name: &str, gmv| Row {
            name: name.to_string(),
            gmv,
        };

        let rows = vec![row("Alice", 10), row("alfred", 0), row("Bob", 5)];
        let fields: [fn(&Row) -> &str; 1] = [|r| r.name.as_str()];

        let hits = filter(&rows, "AL", &fields, |r| r.gmv > 0);
        assert_eq!(hits, vec![&rows[0]]);

        let all = filter(&rows, "  ", &fields, |_| true);
        assert_eq!(all.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_paginate_never_returns_empty_page_for_nonempty_input(
            len in 1usize..200,
            size in 1usize..40,
            page in 0usize..50,
        ) {
            let result = paginate((0..len).collect::<Vec<_>>(), size, page, 5);
            prop_assert!(!result.items.is_empty());
            prop_assert!(result.page >= 1 && result.page <= result.total_pages);
            prop_assert!(result.items.len() <= size);
        }

        #[test]
        fn prop_strip_starts_at_one_and_ends_at_total(
            total in 1usize..500,
            current in 1usize..500,
            window in 0usize..9,
        ) {
            let current = current.min(total);
            let strip = page_numbers(current, total, window);
            prop_assert_eq!(strip.first(), Some(&PageMarker::Page(1)));
            prop_assert_eq!(strip.last(), Some(&PageMarker::Page(total)));
            prop_assert!(strip.contains(&PageMarker::Page(current)));
        }

        #[test]
        fn prop_sort_is_stable(keys in proptest::collection::vec(0u8..4, 0..60), asc in any::<bool>()) {
            let mut rows: Vec<(u8, usize)> = keys.into_iter().enumerate().map(|(i, k)| (k, i)).collect();
            let direction = if asc { SortDirection::Asc } else { SortDirection::Desc };
            sort(&mut rows, direction, |a, b| a.0.cmp(&b.0));

            for pair in rows.windows(2) {
                if pair[0].0 == pair[1].0 {
                    prop_assert!(pair[0].1 < pair[1].1);
                }
            }
        }
    }
}
