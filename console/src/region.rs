//! Generic region state machine.
//!
//! ```text
//! Idle ──fetch──▶ Loading ──ok──▶ Ready ──mutation──▶ Saving
//!                   ▲  │                                 │
//!                   │  └──err──▶ Error ──retry──┐        │
//!                   └───────────────────────────┴── ok ──┘
//! ```
//!
//! Every fetch is tagged with a [`RequestToken`]. Only the latest token
//! issued by a region is applied; anything else is a stale response and is
//! dropped.

use crate::combinators::{self, Page, SortSpec};
use crate::error::ConsoleError;
use std::cmp::Ordering;
use std::fmt;

/// Which region an event or request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionId {
    /// User directory
    Users,
    /// Product catalog
    Products,
    /// Order ledger
    Orders,
    /// Security alert feed
    Security,
}

impl RegionId {
    /// Every region, in load order
    pub const ALL: [Self; 4] = [Self::Users, Self::Products, Self::Orders, Self::Security];

    /// Regions whose data depends on the period filter
    pub const PERIOD_BOUND: [Self; 3] = [Self::Users, Self::Products, Self::Orders];

    /// Lowercase name, used as a metrics label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Products => "products",
            Self::Orders => "orders",
            Self::Security => "security",
        }
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionStatus {
    /// Never fetched
    #[default]
    Idle,
    /// A fetch is in flight
    Loading,
    /// Data is loaded
    Ready,
    /// A confirmed mutation targeting this region is in flight
    Saving,
    /// The last fetch failed
    Error,
}

/// Tag of one fetch; strictly increasing per region
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Raw value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// A record type that can live in a region
pub trait RegionItem: Clone + 'static {
    /// Identifier used for selection and request targets
    type Id: Clone + PartialEq + fmt::Debug + fmt::Display;
    /// Sortable columns
    type SortField: Copy + PartialEq + fmt::Debug;
    /// Structured filter
    type Filter: Clone + Default + PartialEq + fmt::Debug;

    /// Fields the free-text search looks at
    const SEARCH_FIELDS: &'static [fn(&Self) -> &str];

    /// Sort applied before the user picks one
    const DEFAULT_SORT: Self::SortField;

    /// Identifier of this record
    fn id(&self) -> &Self::Id;

    /// Compare two records on a column, ascending
    fn compare(a: &Self, b: &Self, field: Self::SortField) -> Ordering;

    /// Whether this record passes the structured filter
    fn matches(&self, filter: &Self::Filter) -> bool;
}

/// Local, synchronous list-view events
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent<T: RegionItem> {
    /// Replace the structured filter (resets to page 1)
    SetFilter(T::Filter),
    /// Replace the free-text search (resets to page 1)
    SetSearch(String),
    /// Set sort explicitly
    SetSort(SortSpec<T::SortField>),
    /// Column-header click
    ToggleSort(T::SortField),
    /// Go to a page; clamped into range
    SetPage(usize),
    /// Select a record, or clear the selection
    Select(Option<T::Id>),
}

/// What happened to a fetch result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Applied to the region
    Applied,
    /// Dropped because a newer fetch was issued
    Stale,
}

/// One independently-evolving slice of console state
#[derive(Debug, Clone)]
pub struct Region<T: RegionItem> {
    status: RegionStatus,
    items: Vec<T>,
    error: Option<ConsoleError>,
    filter: T::Filter,
    search: String,
    sort: SortSpec<T::SortField>,
    page: usize,
    page_size: usize,
    page_window: usize,
    selection: Option<T::Id>,
    last_token: u64,
    in_flight: Option<RequestToken>,
    refetch_on_settle: bool,
}

impl<T: RegionItem> Region<T> {
    /// Empty, idle region
    #[must_use]
    pub fn new(page_size: usize, page_window: usize) -> Self {
        Self {
            status: RegionStatus::Idle,
            items: Vec::new(),
            error: None,
            filter: T::Filter::default(),
            search: String::new(),
            sort: SortSpec::new(T::DEFAULT_SORT),
            page: 1,
            page_size: page_size.max(1),
            page_window,
            selection: None,
            last_token: 0,
            in_flight: None,
            refetch_on_settle: false,
        }
    }

    /// Current status
    #[must_use]
    pub const fn status(&self) -> RegionStatus {
        self.status
    }

    /// Whether a fetch is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == RegionStatus::Loading
    }

    /// Loaded records, unfiltered
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Failure of the last fetch, if it failed
    #[must_use]
    pub const fn error(&self) -> Option<&ConsoleError> {
        self.error.as_ref()
    }

    /// Structured filter
    #[must_use]
    pub const fn filter(&self) -> &T::Filter {
        &self.filter
    }

    /// Free-text search
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Current sort
    #[must_use]
    pub const fn sort(&self) -> SortSpec<T::SortField> {
        self.sort
    }

    /// Requested page
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Selected record id
    #[must_use]
    pub const fn selection(&self) -> Option<&T::Id> {
        self.selection.as_ref()
    }

    /// Selected record
    #[must_use]
    pub fn selected(&self) -> Option<&T> {
        self.selection.as_ref().and_then(|id| self.find(id))
    }

    /// Token of the fetch in flight
    #[must_use]
    pub const fn in_flight(&self) -> Option<RequestToken> {
        self.in_flight
    }

    /// Whether `token` is the one the region is waiting for
    #[must_use]
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.in_flight == Some(token)
    }

    /// Look up a loaded record
    #[must_use]
    pub fn find(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Whether local view events and requests are accepted
    #[must_use]
    pub const fn accepts_local_events(&self) -> bool {
        matches!(self.status, RegionStatus::Ready | RegionStatus::Saving)
    }

    fn issue_token(&mut self) -> RequestToken {
        self.last_token += 1;
        let token = RequestToken(self.last_token);
        self.in_flight = Some(token);
        self.status = RegionStatus::Loading;
        self.refetch_on_settle = false;
        token
    }

    /// Start a fetch unless one is already running.
    ///
    /// Returns `None` while loading or saving; the region is not re-entered.
    pub fn begin_fetch(&mut self) -> Option<RequestToken> {
        match self.status {
            RegionStatus::Loading | RegionStatus::Saving => None,
            RegionStatus::Idle | RegionStatus::Ready | RegionStatus::Error => {
                Some(self.issue_token())
            },
        }
    }

    /// Start a fetch that replaces any in flight; the older response becomes stale
    pub fn supersede_fetch(&mut self) -> RequestToken {
        self.issue_token()
    }

    /// Start a fetch again after a failure
    pub fn retry(&mut self) -> Option<RequestToken> {
        (self.status == RegionStatus::Error).then(|| self.issue_token())
    }

    /// Apply a fetch result if it answers the latest request
    pub fn apply_fetch(
        &mut self,
        token: RequestToken,
        result: Result<Vec<T>, ConsoleError>,
    ) -> FetchOutcome {
        if !self.is_current(token) {
            return FetchOutcome::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(items) => {
                self.items = items;
                self.error = None;
                self.status = RegionStatus::Ready;

                if self.selected().is_none() {
                    self.selection = None;
                }
                let page = self.view().page;
                self.page = page;
            },
            Err(error) => {
                self.error = Some(error);
                self.status = RegionStatus::Error;
            },
        }
        FetchOutcome::Applied
    }

    /// Mark a confirmed mutation as in flight; only from `Ready`
    pub fn begin_mutation(&mut self) -> bool {
        if self.status == RegionStatus::Ready {
            self.status = RegionStatus::Saving;
            true
        } else {
            false
        }
    }

    /// Note that the loaded list went out of date while saving.
    ///
    /// The next [`Region::finish_mutation`] refetches even if the mutation
    /// failed. Ignored outside `Saving`.
    pub fn invalidate_while_saving(&mut self) {
        if self.status == RegionStatus::Saving {
            self.refetch_on_settle = true;
        }
    }

    /// Leave `Saving`. Success refetches; failure keeps the loaded list
    /// unless it was invalidated meanwhile.
    pub fn finish_mutation(&mut self, succeeded: bool) -> Option<RequestToken> {
        if self.status != RegionStatus::Saving {
            return None;
        }
        if succeeded || self.refetch_on_settle {
            Some(self.supersede_fetch())
        } else {
            self.status = RegionStatus::Ready;
            None
        }
    }

    /// Apply a list-view event. Rejected unless data is loaded.
    pub fn apply_view(&mut self, event: ViewEvent<T>) -> bool {
        if !self.accepts_local_events() {
            return false;
        }

        match event {
            ViewEvent::SetFilter(filter) => {
                self.filter = filter;
                self.page = 1;
            },
            ViewEvent::SetSearch(search) => {
                self.search = search;
                self.page = 1;
            },
            ViewEvent::SetSort(sort) => self.sort = sort,
            ViewEvent::ToggleSort(field) => self.sort = self.sort.toggle(field),
            ViewEvent::SetPage(page) => {
                self.page = page;
                let clamped = self.view().page;
                self.page = clamped;
            },
            ViewEvent::Select(id) => {
                self.selection = id.filter(|id| self.find(id).is_some());
            },
        }
        true
    }

    /// Filtered, sorted and paginated view of the loaded records
    #[must_use]
    pub fn view(&self) -> Page<&T> {
        let mut rows = combinators::filter(&self.items, &self.search, T::SEARCH_FIELDS, |item| {
            item.matches(&self.filter)
        });
        let field = self.sort.field;
        combinators::sort(&mut rows, self.sort.direction, |a, b| T::compare(a, b, field));
        combinators::paginate(rows, self.page_size, self.page, self.page_window)
    }
}

/// Fetch and mutation lifecycle of a region, whatever it holds.
///
/// Lets the reducer drive any region by [`RegionId`] without knowing its
/// record type.
pub trait Lifecycle {
    /// Current status
    fn status(&self) -> RegionStatus;
    /// See [`Region::begin_fetch`]
    fn begin_fetch(&mut self) -> Option<RequestToken>;
    /// See [`Region::supersede_fetch`]
    fn supersede_fetch(&mut self) -> RequestToken;
    /// See [`Region::retry`]
    fn retry(&mut self) -> Option<RequestToken>;
    /// See [`Region::begin_mutation`]
    fn begin_mutation(&mut self) -> bool;
    /// See [`Region::invalidate_while_saving`]
    fn invalidate_while_saving(&mut self);
    /// See [`Region::finish_mutation`]
    fn finish_mutation(&mut self, succeeded: bool) -> Option<RequestToken>;
}

impl<T: RegionItem> Lifecycle for Region<T> {
    fn status(&self) -> RegionStatus {
        Region::status(self)
    }

    fn begin_fetch(&mut self) -> Option<RequestToken> {
        Region::begin_fetch(self)
    }

    fn supersede_fetch(&mut self) -> RequestToken {
        Region::supersede_fetch(self)
    }

    fn retry(&mut self) -> Option<RequestToken> {
        Region::retry(self)
    }

    fn begin_mutation(&mut self) -> bool {
        Region::begin_mutation(self)
    }

    fn invalidate_while_saving(&mut self) {
        Region::invalidate_while_saving(self);
    }

    fn finish_mutation(&mut self, succeeded: bool) -> Option<RequestToken> {
        Region::finish_mutation(self, succeeded)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::combinators::SortDirection;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: String,
        name: String,
        score: u32,
        flagged: bool,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum RowField {
        Name,
        Score,
    }

    fn row_name(row: &Row) -> &str {
        &row.name
    }

    impl RegionItem for Row {
        type Id = String;
        type SortField = RowField;
        type Filter = Option<bool>;

        const SEARCH_FIELDS: &'static [fn(&Self) -> &str] = &[row_name];
        const DEFAULT_SORT: RowField = RowField::Score;

        fn id(&self) -> &String {
            &self.id
        }

        fn compare(a: &Self, b: &Self, field: RowField) -> Ordering {
            match field {
                RowField::Name => a.name.cmp(&b.name),
                RowField::Score => a.score.cmp(&b.score),
            }
        }

        fn matches(&self, filter: &Option<bool>) -> bool {
            filter.is_none_or(|flagged| self.flagged == flagged)
        }
    }

    fn rows(n: u32) -> Vec<Row> {
        (1..=n)
            .map(|i| Row {
                id: format!("r-{i}"),
                name: format!("row {i}"),
                score: i,
                flagged: i % 2 == 0,
            })
            .collect()
    }

    fn loaded(n: u32) -> Region<Row> {
        let mut region = Region::new(5, 5);
        if let Some(token) = region.begin_fetch() {
            region.apply_fetch(token, Ok(rows(n)));
        }
        region
    }

    #[test]
    fn test_refresh_while_loading_is_noop() {
        let mut region: Region<Row> = Region::new(5, 5);
        let first = region.begin_fetch();
        assert!(first.is_some());
        assert_eq!(region.begin_fetch(), None);
        assert_eq!(region.in_flight(), first);
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let mut region: Region<Row> = Region::new(5, 5);
        let Some(old) = region.begin_fetch() else {
            panic!("fetch should start");
        };
        let new = region.supersede_fetch();

        assert_eq!(region.apply_fetch(new, Ok(rows(2))), FetchOutcome::Applied);
        assert_eq!(region.apply_fetch(old, Ok(rows(9))), FetchOutcome::Stale);
        assert_eq!(region.items().len(), 2);
        assert_eq!(region.status(), RegionStatus::Ready);
    }

    #[test]
    fn test_failure_then_retry() {
        let mut region: Region<Row> = Region::new(5, 5);
        let Some(token) = region.begin_fetch() else {
            panic!("fetch should start");
        };
        region.apply_fetch(token, Err(ConsoleError::network("offline")));
        assert_eq!(region.status(), RegionStatus::Error);
        assert!(region.error().is_some());

        assert!(region.retry().is_some());
        assert_eq!(region.status(), RegionStatus::Loading);
    }

    #[test]
    fn test_view_events_need_loaded_data() {
        let mut region: Region<Row> = Region::new(5, 5);
        assert!(!region.apply_view(ViewEvent::SetPage(2)));

        let mut region = loaded(12);
        assert!(region.apply_view(ViewEvent::SetPage(2)));
        assert_eq!(region.page(), 2);
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut region = loaded(12);
        region.apply_view(ViewEvent::SetPage(3));
        region.apply_view(ViewEvent::SetFilter(Some(true)));

        assert_eq!(region.page(), 1);
        let view = region.view();
        assert_eq!(view.total_items, 6);
        assert!(view.items.iter().all(|r| r.flagged));
    }

    #[test]
    fn test_default_sort_is_descending() {
        let region = loaded(12);
        let view = region.view();
        assert_eq!(region.sort().direction, SortDirection::Desc);
        assert_eq!(view.items.first().map(|r| r.score), Some(12));
    }

    #[test]
    fn test_page_clamped_after_shrinking_reload() {
        let mut region = loaded(12);
        region.apply_view(ViewEvent::SetPage(3));
        let token = region.supersede_fetch();
        region.apply_fetch(token, Ok(rows(4)));
        assert_eq!(region.page(), 1);
    }

    #[test]
    fn test_selection_dropped_when_record_disappears() {
        let mut region = loaded(3);
        region.apply_view(ViewEvent::Select(Some("r-3".to_string())));
        assert_eq!(region.selected().map(|r| r.score), Some(3));

        let token = region.supersede_fetch();
        region.apply_fetch(token, Ok(rows(2)));
        assert_eq!(region.selection(), None);
    }

    #[test]
    fn test_mutation_cycle() {
        let mut region = loaded(3);
        assert!(region.begin_mutation());
        assert_eq!(region.status(), RegionStatus::Saving);
        assert_eq!(region.begin_fetch(), None);

        assert_eq!(region.finish_mutation(false), None);
        assert_eq!(region.status(), RegionStatus::Ready);
        assert_eq!(region.items().len(), 3);

        assert!(region.begin_mutation());
        assert!(region.finish_mutation(true).is_some());
        assert!(region.is_loading());
    }

    #[test]
    fn test_invalidated_region_refetches_after_failed_mutation() {
        let mut region = loaded(3);
        region.invalidate_while_saving();
        assert_eq!(region.status(), RegionStatus::Ready);

        assert!(region.begin_mutation());
        region.invalidate_while_saving();
        let Some(token) = region.finish_mutation(false) else {
            panic!("failed mutation should refetch");
        };
        assert_eq!(region.in_flight(), Some(token));
        assert!(region.is_loading());

        // the flag is spent once the refetch is issued
        region.apply_fetch(token, Ok(rows(2)));
        assert!(region.begin_mutation());
        assert_eq!(region.finish_mutation(false), None);
    }
}
