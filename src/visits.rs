//! # Visit Aggregation
//!
//! Turns per-activity visit detections into one row per catalog summit.
//!
//! ## Pipeline
//!
//! 1. Each activity's track is resampled to
//!    `floor(distance × samples_per_threshold / proximity)` points.
//! 2. Summits approached within the proximity threshold are found with
//!    [`find_visited_summits`], one [`VisitRecord`] per distinct summit.
//! 3. All records are collected before aggregation starts.
//! 4. [`VisitAggregator`] takes the latest date per summit and left-joins it
//!    onto the full, unwindowed catalog.
//!
//! Aggregation is order-independent, so step 2 may run per activity in
//! parallel (`parallel` feature) as long as step 4 runs once at the end.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};
use serde::Serialize;

use crate::interpolate::resample_for_proximity;
use crate::locator::find_visited_summits;
use crate::store::{SummitRecord, SummitReference};
use crate::{Activity, Result, SummitError, VisitConfig};

/// One summit visited by one activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord {
    pub activity_id: u64,
    pub date: DateTime<Utc>,
    pub summit_number: u32,
}

/// A catalog summit with the date it was last visited, if ever.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitedSummit {
    #[serde(flatten)]
    pub summit: SummitRecord,
    pub latest_visit: Option<NaiveDate>,
}

impl VisitedSummit {
    pub fn is_visited(&self) -> bool {
        self.latest_visit.is_some()
    }
}

/// Every catalog summit exactly once, in catalog order, each with its latest
/// visit date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VisitedSummitDataset {
    rows: Vec<VisitedSummit>,
}

impl VisitedSummitDataset {
    pub fn rows(&self) -> &[VisitedSummit] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<VisitedSummit> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a summit by its catalog number.
    pub fn get(&self, number: u32) -> Option<&VisitedSummit> {
        self.rows.iter().find(|r| r.summit.number == number)
    }

    pub fn visited(&self) -> impl Iterator<Item = &VisitedSummit> {
        self.rows.iter().filter(|r| r.is_visited())
    }

    pub fn unvisited(&self) -> impl Iterator<Item = &VisitedSummit> {
        self.rows.iter().filter(|r| !r.is_visited())
    }

    pub fn visited_count(&self) -> usize {
        self.visited().count()
    }
}

/// Collects visit records and reduces them to a latest date per summit.
#[derive(Debug, Clone, Default)]
pub struct VisitAggregator {
    records: Vec<VisitRecord>,
}

impl VisitAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: VisitRecord) {
        self.records.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = VisitRecord>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[VisitRecord] {
        &self.records
    }

    /// Latest visit date for every summit that appears in a record.
    pub fn latest_visits(&self) -> HashMap<u32, NaiveDate> {
        let mut latest: HashMap<u32, DateTime<Utc>> = HashMap::new();
        for record in &self.records {
            latest
                .entry(record.summit_number)
                .and_modify(|d| *d = (*d).max(record.date))
                .or_insert(record.date);
        }
        latest
            .into_iter()
            .map(|(number, date)| (number, date.date_naive()))
            .collect()
    }

    /// Left-join latest visits onto `catalog`, keyed by summit number.
    ///
    /// Produces one row per catalog record, in catalog order. Records that
    /// name a summit absent from the catalog are dropped.
    pub fn merge_into_catalog(&self, catalog: Vec<SummitRecord>) -> VisitedSummitDataset {
        let latest = self.latest_visits();
        let rows = catalog
            .into_iter()
            .map(|summit| VisitedSummit {
                latest_visit: latest.get(&summit.number).copied(),
                summit,
            })
            .collect();
        VisitedSummitDataset { rows }
    }
}

/// Visits for a single activity.
///
/// Tracks that resample to nothing (too short for a single sample, or fewer
/// than two distinct points) produce no visits. A recorded distance that
/// would need more than
/// [`MAX_RESAMPLED_POINTS`](crate::interpolate::MAX_RESAMPLED_POINTS) samples
/// fails with [`SummitError::InvalidActivity`].
pub fn visits_for_activity<S>(
    activity: &Activity,
    store: &S,
    config: &VisitConfig,
) -> Result<Vec<VisitRecord>>
where
    S: SummitReference + ?Sized,
{
    let sampled = resample_for_proximity(&activity.track, activity.distance, config).map_err(
        |err| match err {
            SummitError::InvalidActivity { message } => SummitError::InvalidActivity {
                message: format!("activity {}: {}", activity.id, message),
            },
            other => other,
        },
    )?;
    if sampled.is_empty() {
        debug!("Activity {}: nothing to match, skipping", activity.id);
        return Ok(Vec::new());
    }

    let visited = find_visited_summits(store, &sampled, config)?;
    debug!(
        "Activity {}: {} samples, {} summits visited",
        activity.id,
        sampled.len(),
        visited.len()
    );

    Ok(visited
        .into_iter()
        .map(|summit| VisitRecord {
            activity_id: activity.id,
            date: activity.start_date,
            summit_number: summit.number,
        })
        .collect())
}

/// Visits for every activity, in activity order. Any store failure aborts
/// the whole collection.
pub fn collect_visits<S>(
    activities: &[Activity],
    store: &S,
    config: &VisitConfig,
) -> Result<Vec<VisitRecord>>
where
    S: SummitReference + ?Sized,
{
    let mut visits = Vec::new();
    for activity in activities {
        visits.extend(visits_for_activity(activity, store, config)?);
    }
    Ok(visits)
}

/// Parallel version of [`collect_visits`], one rayon task per activity.
///
/// The store is shared between tasks, so it must be `Sync`;
/// [`PersistentLocalFileSummitReference`](crate::PersistentLocalFileSummitReference)
/// guards its first read and is safe here.
#[cfg(feature = "parallel")]
pub fn collect_visits_parallel<S>(
    activities: &[Activity],
    store: &S,
    config: &VisitConfig,
) -> Result<Vec<VisitRecord>>
where
    S: SummitReference + Sync + ?Sized,
{
    use rayon::prelude::*;

    let per_activity: Vec<Vec<VisitRecord>> = activities
        .par_iter()
        .map(|activity| visits_for_activity(activity, store, config))
        .collect::<Result<_>>()?;
    Ok(per_activity.into_iter().flatten().collect())
}

/// Compute the latest visit to every catalog summit across `activities`.
///
/// # Example
/// ```no_run
/// use summit_locator::{calculate_summit_history, PersistentLocalFileSummitReference, VisitConfig};
///
/// let store = PersistentLocalFileSummitReference::new("summits.json");
/// let dataset = calculate_summit_history(&[], &store, &VisitConfig::default()).unwrap();
/// assert_eq!(dataset.visited_count(), 0);
/// ```
pub fn calculate_summit_history<S>(
    activities: &[Activity],
    store: &S,
    config: &VisitConfig,
) -> Result<VisitedSummitDataset>
where
    S: SummitReference + ?Sized,
{
    config.validate()?;
    let start = Instant::now();

    let visits = collect_visits(activities, store, config)?;
    let dataset = aggregate(visits, store)?;

    info!(
        "Summit history: {} activities, {} of {} summits visited in {:?}",
        activities.len(),
        dataset.visited_count(),
        dataset.len(),
        start.elapsed()
    );
    Ok(dataset)
}

/// [`calculate_summit_history`] with visits collected in parallel.
#[cfg(feature = "parallel")]
pub fn calculate_summit_history_parallel<S>(
    activities: &[Activity],
    store: &S,
    config: &VisitConfig,
) -> Result<VisitedSummitDataset>
where
    S: SummitReference + Sync + ?Sized,
{
    config.validate()?;
    let start = Instant::now();

    let visits = collect_visits_parallel(activities, store, config)?;
    let dataset = aggregate(visits, store)?;

    info!(
        "Summit history (parallel): {} activities, {} of {} summits visited in {:?}",
        activities.len(),
        dataset.visited_count(),
        dataset.len(),
        start.elapsed()
    );
    Ok(dataset)
}

fn aggregate<S>(visits: Vec<VisitRecord>, store: &S) -> Result<VisitedSummitDataset>
where
    S: SummitReference + ?Sized,
{
    let mut aggregator = VisitAggregator::new();
    aggregator.extend(visits);
    Ok(aggregator.merge_into_catalog(store.load(None, None)?))
}
