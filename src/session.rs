use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::api::{CatalogClient, RawBook};
use crate::catalog::{self, Catalog};
use crate::domain::{Book, PublisherFilter, YearRange};
use crate::error::ShelfError;
use crate::filter::{self, FilterDomain, FilterState};
use crate::supplement::SupplementIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPhase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Load/error signal exposed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct LoadStatus {
    pub phase: LoadPhase,
    pub fetched_at: Option<String>,
    pub error: Option<String>,
    pub total: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Owns the canonical catalog, the derived filter domain, the user-editable
/// filter state, and the cached filtered view. Filter mutations re-evaluate
/// only the view; the domain is re-derived only when a new catalog lands,
/// and the fetcher runs only for an explicitly requested load.
#[derive(Debug)]
pub struct CatalogSession {
    catalog: Catalog,
    domain: FilterDomain,
    state: FilterState,
    view: Vec<Book>,
    supplement: SupplementIndex,
    phase: LoadPhase,
    fetched_at: Option<String>,
    last_error: Option<String>,
    rejected: usize,
    load_requested: bool,
    in_flight: bool,
}

impl CatalogSession {
    pub fn new(supplement: SupplementIndex) -> Self {
        Self {
            catalog: Catalog::default(),
            domain: FilterDomain::default(),
            state: FilterState::default(),
            view: Vec::new(),
            supplement,
            phase: LoadPhase::Idle,
            fetched_at: None,
            last_error: None,
            rejected: 0,
            // The initial load is armed exactly once at construction.
            load_requested: true,
            in_flight: false,
        }
    }

    // -- load gating ------------------------------------------------------

    /// Arm the one-shot load trigger. Only explicit refresh actions call
    /// this; filter mutations never do.
    pub fn request_load(&mut self) {
        self.load_requested = true;
    }

    /// Consume the trigger. Returns true at most once per request.
    pub fn take_load_request(&mut self) -> bool {
        std::mem::take(&mut self.load_requested)
    }

    /// Single-flight gate. False means a fetch is already pending and this
    /// attempt must be suppressed.
    pub fn begin_load(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        self.phase = LoadPhase::Loading;
        true
    }

    /// Finish a load begun with `begin_load`. A failure keeps the previous
    /// catalog (the empty one, on first load) in effect.
    pub fn complete_load(&mut self, outcome: Result<Vec<RawBook>, ShelfError>) -> LoadStatus {
        self.in_flight = false;
        match outcome {
            Ok(raw) => self.apply_fetched(raw),
            Err(err) => self.record_failure(&err),
        }
        self.status()
    }

    /// Synchronous load: begin + fetch + complete. Returns the fetch error
    /// after recording it, so one-shot callers can propagate while
    /// long-lived front ends keep serving the previous view.
    pub fn load(
        &mut self,
        client: &dyn CatalogClient,
        sink: &dyn ProgressSink,
    ) -> Result<LoadStatus, ShelfError> {
        if !self.begin_load() {
            return Ok(self.status());
        }
        sink.event(ProgressEvent {
            message: "phase=Fetch; requesting catalog".to_string(),
        });
        let start = Instant::now();
        match client.fetch_books() {
            Ok(raw) => {
                sink.event(ProgressEvent {
                    message: format!("catalog.response latency_ms={}", start.elapsed().as_millis()),
                });
                sink.event(ProgressEvent {
                    message: "phase=Merge; joining cover index".to_string(),
                });
                Ok(self.complete_load(Ok(raw)))
            }
            Err(err) => {
                self.in_flight = false;
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    fn apply_fetched(&mut self, raw: Vec<RawBook>) {
        let total = raw.len();
        let (books, rejections) = catalog::ingest_records(raw);
        let merged = catalog::merge_with_covers(books, &self.supplement);
        self.apply_catalog(merged);
        self.rejected = rejections.len();
        self.fetched_at = Some(chrono::Utc::now().to_rfc3339());
        self.last_error = None;
        self.phase = LoadPhase::Ready;
        info!(total, rejected = self.rejected, "catalog loaded");
    }

    fn record_failure(&mut self, err: &ShelfError) {
        warn!(error = %err, "catalog load failed; keeping previous catalog");
        self.last_error = Some(err.to_string());
        self.phase = LoadPhase::Failed;
    }

    fn apply_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
        // Derived here and only here: filter mutators cannot reach the
        // domain deriver.
        self.domain = FilterDomain::derive(&self.catalog);
        if self.state.year_range.is_none() {
            // First successful load: the range starts at the full bounds
            // and is never silently reset afterward.
            self.state.year_range = self.domain.year_bounds;
        }
        self.refresh_view();
    }

    // -- filter mutators --------------------------------------------------

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.state.search = term.into();
        self.refresh_view();
    }

    pub fn clear_search(&mut self) {
        self.state.search.clear();
        self.refresh_view();
    }

    /// Accepts the sentinel or any publisher present in the domain.
    pub fn set_publisher(&mut self, selector: PublisherFilter) -> Result<(), ShelfError> {
        if let PublisherFilter::Named(name) = &selector {
            if !self.domain.knows_publisher(name) {
                return Err(ShelfError::UnknownPublisher(name.clone()));
            }
        }
        self.state.publisher = selector;
        self.refresh_view();
        Ok(())
    }

    /// Endpoints are normalized before being committed; an inverted pair
    /// can never be stored in reversed form.
    pub fn set_year_range(&mut self, a: i32, b: i32) {
        self.state.year_range = Some(YearRange::new(a, b));
        self.refresh_view();
    }

    fn refresh_view(&mut self) {
        self.view = filter::apply(&self.catalog, &self.state, &self.domain);
    }

    // -- presentation boundary --------------------------------------------

    pub fn view(&self) -> &[Book] {
        &self.view
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn domain(&self) -> &FilterDomain {
        &self.domain
    }

    pub fn filter(&self) -> &FilterState {
        &self.state
    }

    pub fn status(&self) -> LoadStatus {
        LoadStatus {
            phase: self.phase,
            fetched_at: self.fetched_at.clone(),
            error: self.last_error.clone(),
            total: self.catalog.len(),
            rejected: self.rejected,
        }
    }
}
