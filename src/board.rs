//! Board session.
//!
//! Ties the pieces together for one open scheduling board: fetches trips
//! and resources through the API traits, runs assignments through the
//! engine, sends the resulting patches, and reloads when the realtime
//! monitor says the board is stale.
//!
//! Local state changes only after the backend accepted a patch; a failed
//! command leaves the board as it was.
//!
//! # Settings
//! Resolved settings pick the dates, the grid rows and the stored pool
//! query. Only the rows' trips are loaded, so bindings are accepted only
//! on a row; a resource filtered off the grid reads as not found.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{QuerySequencer, TripCommands, TripListQuery, TripQueries};
use crate::config::BoardConfig;
use crate::engine::{
    AssignOutcome, AssignRequest, AssignmentEngine, BoardState, EditScope, UnassignOutcome,
};
use crate::error::{BoardError, Result};
use crate::models::{DateRange, Resource, ResourceAssignment, ResourceKind, ResourceRegistry, Trip};
use crate::pool::{Page, PageRequest, PoolFilterQuery, PoolQuery, UnplannedPool};
use crate::realtime::{run_reload_loop, BoardKind, Reloadable, ReloadMonitor, SharedMonitor};
use crate::views::ResolvedSettings;

const TRIPS_QUERY: &str = "scheduler.trips";
const POOL_QUERY: &str = "unplanned.trips";

/// One open scheduling board.
pub struct BoardSession<A> {
    api: Arc<A>,
    engine: AssignmentEngine,
    pool: UnplannedPool,
    scope: EditScope,
    dates: DateRange,
    settings: ResolvedSettings,
    trip_filter: PoolFilterQuery,
    fetch_page_size: u32,
    reload_interval: Duration,
    state: BoardState,
    sequencer: QuerySequencer,
    monitor: SharedMonitor,
    editing: bool,
}

impl<A> BoardSession<A>
where
    A: TripQueries + TripCommands,
{
    /// Creates an empty session; call [`refresh`](Self::refresh) to load.
    pub fn new(
        api: Arc<A>,
        config: &BoardConfig,
        scope: EditScope,
        dates: DateRange,
    ) -> Result<Self> {
        Ok(Self {
            api,
            engine: AssignmentEngine::from_config(config),
            pool: UnplannedPool::from_config(config)?,
            scope,
            dates,
            settings: ResolvedSettings::default(),
            trip_filter: PoolFilterQuery::default(),
            fetch_page_size: config.max_page_size,
            reload_interval: config.reload_interval(),
            state: BoardState::default(),
            sequencer: QuerySequencer::new(),
            monitor: Arc::new(Mutex::new(ReloadMonitor::new(BoardKind::Scheduler))),
            editing: false,
        })
    }

    /// Applies resolved settings (builder form).
    pub fn with_settings(mut self, settings: &ResolvedSettings) -> Self {
        self.apply_settings(settings);
        self
    }

    /// Takes dates, rows and pool query from settings; refresh afterwards.
    ///
    /// Stored dates replace the current ones; without stored dates the
    /// current ones stay.
    pub fn apply_settings(&mut self, settings: &ResolvedSettings) {
        self.dates = settings.dates_or(self.dates);
        self.settings = settings.clone();
    }

    pub fn settings(&self) -> &ResolvedSettings {
        &self.settings
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn scope(&self) -> &EditScope {
        &self.scope
    }

    pub fn dates(&self) -> DateRange {
        self.dates
    }

    /// Monitor to hand to the event pump and reload loop.
    pub fn monitor(&self) -> SharedMonitor {
        self.monitor.clone()
    }

    /// Switches the extended view; the board must be refreshed afterwards.
    pub fn set_extended_view(&mut self, active: bool) {
        self.scope = self.scope.clone().with_extended_view(active);
    }

    pub fn set_dates(&mut self, dates: DateRange) {
        self.dates = dates;
    }

    /// Narrows the unplanned trips loaded with the grid.
    pub fn set_trip_filter(&mut self, filter: PoolFilterQuery) {
        self.trip_filter = filter;
    }

    /// Marks a drag or edit in progress; reloads are deferred meanwhile.
    pub fn set_editing(&mut self, editing: bool) {
        self.editing = editing;
    }

    /// Grid rows of the loaded registry.
    pub fn rows(&self) -> Vec<&Resource> {
        self.settings
            .resource_filters
            .select(self.state.registry(), self.settings.resource_ordering)
    }

    /// Refetches resources, then every page of trips for the current rows
    /// and dates.
    ///
    /// A refresh superseded by a newer one fails with
    /// [`BoardError::StaleQuery`] and leaves the state alone.
    pub async fn refresh(&mut self) -> Result<()> {
        let api = self.api.clone();
        let settings = self.settings.clone();
        let dates = self.dates;
        let filter = self.trip_filter.clone();
        let extended = self.scope.extended_view();
        let page_size = self.fetch_page_size;

        let (registry, trips) = self
            .sequencer
            .run(TRIPS_QUERY, |_| async move {
                let registry = ResourceRegistry::from_resources(api.list_resources().await?)?;
                let query = settings
                    .trip_list_query(&registry, dates)
                    .with_filter(filter)
                    .with_extended_view(extended);
                let trips = fetch_all_trips(&*api, query, page_size).await?;
                Ok::<_, BoardError>((registry, trips))
            })
            .await?;

        self.state = BoardState::new(trips, registry)?;
        info!(trips = self.state.len(), "board refreshed");
        Ok(())
    }

    /// Assigns locally, then sends the patch.
    pub async fn assign(&mut self, request: AssignRequest) -> Result<AssignOutcome> {
        self.check_row(&request.resource_uid)?;
        let outcome = self.engine.assign(&self.state, &self.scope, request)?;
        if outcome.is_noop() {
            return Ok(outcome);
        }
        let stored = self
            .api
            .patch_trip_assignment(&outcome.assignment.trip_uid, &outcome.patch)
            .await?;
        self.state = outcome.state.clone();
        self.check_echo(&outcome.assignment.trip_uid, &stored).await;
        Ok(outcome)
    }

    /// Unassigns locally, then sends the patch.
    pub async fn unassign(
        &mut self,
        trip_uid: &str,
        kind: ResourceKind,
    ) -> Result<UnassignOutcome> {
        let outcome = self.engine.unassign(&self.state, &self.scope, trip_uid, kind)?;
        if outcome.patch.is_empty() {
            return Ok(outcome);
        }
        let stored = self.api.patch_trip_assignment(trip_uid, &outcome.patch).await?;
        self.state = outcome.state.clone();
        self.check_echo(trip_uid, &stored).await;
        Ok(outcome)
    }

    /// Trips a binding would overlap.
    pub fn conflicts(
        &self,
        trip_uid: &str,
        kind: ResourceKind,
        resource_uid: &str,
    ) -> Result<Vec<String>> {
        self.check_row(resource_uid)?;
        self.engine.conflicts(&self.state, trip_uid, kind, resource_uid)
    }

    /// Pool query stored in the settings, sized by config.
    pub fn pool_query(&self) -> PoolQuery {
        self.settings.pool_query(self.pool.default_page_size())
    }

    /// Queries the unplanned trips of the loaded board.
    pub fn pool(&self, query: &PoolQuery) -> Result<Page<Trip>> {
        self.pool.query(&self.state, &self.scope, query)
    }

    /// Queries the unplanned trips from the backend.
    pub async fn fetch_pool(&self, query: &PoolQuery) -> Result<Page<Trip>> {
        let extended = self.scope.extended_view();
        self.sequencer
            .run(POOL_QUERY, |_| self.api.list_unplanned_trips(query, extended))
            .await
    }

    /// Whether the caller may edit a loaded trip.
    pub fn can_edit(&self, trip_uid: &str) -> bool {
        self.state
            .trip(trip_uid)
            .is_some_and(|t| self.engine.can_edit(t, &self.scope))
    }

    /// Runs the reload loop at the configured interval until `cancel`
    /// fires. Returns the number of reloads.
    pub async fn run_reloads(&mut self, cancel: CancellationToken) -> usize {
        let monitor = self.monitor.clone();
        let period = self.reload_interval;
        run_reload_loop(monitor, self, period, cancel).await
    }

    fn check_row(&self, resource_uid: &str) -> Result<()> {
        match self.state.registry().get(resource_uid) {
            Some(resource) if !self.settings.resource_filters.matches(resource) => {
                debug!(resource = %resource_uid, "resource is not a grid row");
                Err(BoardError::ResourceNotFound(resource_uid.to_owned()))
            }
            _ => Ok(()),
        }
    }

    async fn check_echo(&self, trip_uid: &str, stored: &ResourceAssignment) {
        let local = self.state.trip(trip_uid).map(|t| &t.assignment);
        if local != Some(stored) {
            debug!(trip = %trip_uid, "backend stored different bindings, reload pending");
            self.monitor.lock().await.mark_stale();
        }
    }
}

/// Walks `list_trips` pages until the last one.
///
/// A trip repeated on a later page (the backend shifted under the walk) is
/// kept once.
async fn fetch_all_trips<A>(api: &A, query: TripListQuery, page_size: u32) -> Result<Vec<Trip>>
where
    A: TripQueries + ?Sized,
{
    let mut query = query.with_page(PageRequest::first(page_size));
    let mut seen = HashSet::new();
    let mut trips = Vec::new();
    loop {
        let page = api.list_trips(&query).await?;
        let more = page.has_next() && !page.items.is_empty();
        for trip in page.items {
            if seen.insert(trip.uid.clone()) {
                trips.push(trip);
            } else {
                warn!(trip = %trip.uid, page = query.page.page, "trip repeated across pages");
            }
        }
        if !more {
            break;
        }
        query.page.page += 1;
    }
    debug!(pages = query.page.page, trips = trips.len(), "trip pages fetched");
    Ok(trips)
}

#[async_trait]
impl<A> Reloadable for BoardSession<A>
where
    A: TripQueries + TripCommands,
{
    fn can_reload(&self) -> bool {
        !self.editing
    }

    async fn reload(&mut self) -> Result<()> {
        self.refresh().await
    }
}
