//! One dashboard session: metadata, the current filter and the response cache.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::api::{ApiSource, DEFAULT_CASES_LIMIT, Memoized, fetch_cases, fetch_metadata, fetch_summary};
use crate::error::{FilterError, Result};
use crate::filter::FilterState;
use crate::metadata::Metadata;
use crate::view::{Dashboard, compose};

/// Shown when the session cannot even load its metadata.
pub const UNREACHABLE_HINT: &str =
    "API is unreachable. Make sure the API server is running and the base URL is correct.";

/// Shown when metadata loaded but offers nothing that can be selected.
pub const NO_SELECTION_HINT: &str =
    "The API metadata lists no level with any location, so there is nothing to select.";

/// Holds everything that lives for the duration of one session.
///
/// Filter mutators take `&mut self` and [`Session::evaluate`] borrows the
/// session for the whole pass, so passes are strictly serialized: a filter
/// change can only happen between passes. Dropping the session drops its
/// cache.
pub struct Session<A> {
    api: Memoized<A>,
    metadata: Metadata,
    filter: FilterState,
    cases_limit: usize,
}

impl<A: ApiSource> Session<A> {
    /// Loads metadata and derives the default filter. Any failure here is
    /// fatal for the session.
    #[tracing::instrument(skip(api))]
    pub async fn start(api: A) -> Result<Self> {
        let api = Memoized::new(api);
        let metadata = fetch_metadata(&api).await.inspect_err(|e| {
            warn!(error = %e, "Metadata fetch failed");
        })?;
        let filter = FilterState::from_metadata(&metadata)?;
        info!(
            level = filter.level(),
            location = filter.location(),
            "Session started"
        );

        Ok(Self {
            api,
            metadata,
            filter,
            cases_limit: DEFAULT_CASES_LIMIT,
        })
    }

    pub fn with_cases_limit(mut self, limit: usize) -> Self {
        self.cases_limit = limit;
        self
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn api(&self) -> &Memoized<A> {
        &self.api
    }

    pub fn set_level(&mut self, level: &str) -> std::result::Result<(), FilterError> {
        self.filter.set_level(&self.metadata, level)
    }

    pub fn set_location(&mut self, location: &str) -> std::result::Result<(), FilterError> {
        self.filter.set_location(&self.metadata, location)
    }

    pub fn set_date_range(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::result::Result<(), FilterError> {
        self.filter.set_date_range(&self.metadata, start, end)
    }

    /// One pass: summary, cases, normalize, then compose the views.
    ///
    /// A failed request aborts the pass; nothing partial is returned.
    #[tracing::instrument(
        skip(self),
        fields(level = self.filter.level(), location = self.filter.location())
    )]
    pub async fn evaluate(&self, today: NaiveDate) -> Result<Dashboard> {
        let summary = fetch_summary(&self.api, &self.filter).await?;
        let table = fetch_cases(&self.api, &self.filter, self.cases_limit).await?;

        let dashboard = compose(&self.filter, &summary, &table, today)?;
        match &dashboard {
            Dashboard::NoData { .. } => info!("No data for selection"),
            Dashboard::Ready(sections) => info!(
                rows = table.len(),
                quality = %sections.governance.quality.status,
                "Dashboard ready"
            ),
        }
        Ok(dashboard)
    }
}
