// Rental directory - sorted, searchable list of rentals
use crate::domain::error::{TrackingError, TrackingResult};
use crate::domain::rental::{RentalRecord, RentalStatus};
use serde::Serialize;

/// Result of applying a refresh to the directory.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Applied(usize),
    /// A newer refresh already landed; this one was dropped.
    Stale,
    Failed(TrackingError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub ongoing: usize,
    pub upcoming: usize,
    pub completed: usize,
    pub other: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RentalDirectory {
    records: Vec<RentalRecord>,
    last_error: Option<TrackingError>,
    loaded: bool,
    issued_seq: u64,
    applied_seq: u64,
}

impl RentalDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable sort by status priority; ties keep fetch order.
    pub fn sort(mut records: Vec<RentalRecord>) -> Vec<RentalRecord> {
        records.sort_by_key(|r| r.status.priority());
        records
    }

    /// Tag an outgoing refresh. Pair with [`RentalDirectory::apply`].
    pub fn begin_refresh(&mut self) -> u64 {
        self.issued_seq += 1;
        self.issued_seq
    }

    pub fn apply(&mut self, seq: u64, result: TrackingResult<Vec<RentalRecord>>) -> RefreshOutcome {
        if seq <= self.applied_seq {
            return RefreshOutcome::Stale;
        }

        match result {
            Ok(records) => {
                self.applied_seq = seq;
                self.records = Self::sort(records);
                self.last_error = None;
                self.loaded = true;
                RefreshOutcome::Applied(self.records.len())
            }
            Err(err) => {
                // Keep whatever list we had
                self.last_error = Some(err.clone());
                RefreshOutcome::Failed(err)
            }
        }
    }

    pub fn records(&self) -> &[RentalRecord] {
        &self.records
    }

    pub fn find(&self, rental_id: &str) -> Option<&RentalRecord> {
        self.records.iter().find(|r| r.rental_id == rental_id)
    }

    /// Case-insensitive search over id, renter and vehicle. Blank queries match all.
    pub fn filter(&self, query: &str) -> Vec<&RentalRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.records.iter().collect();
        }

        self.records
            .iter()
            .filter(|r| {
                r.rental_id.to_lowercase().contains(&needle)
                    || r.renter_name.to_lowercase().contains(&needle)
                    || r.vehicle_descriptor.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for record in &self.records {
            match record.status {
                RentalStatus::Ongoing => counts.ongoing += 1,
                RentalStatus::Upcoming => counts.upcoming += 1,
                RentalStatus::Completed => counts.completed += 1,
                RentalStatus::Canceled | RentalStatus::Other(_) => counts.other += 1,
            }
        }
        counts
    }

    pub fn last_error(&self) -> Option<&TrackingError> {
        self.last_error.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::rental_repository::mock::record;

    fn ids(records: &[RentalRecord]) -> Vec<&str> {
        records.iter().map(|r| r.rental_id.as_str()).collect()
    }

    #[test]
    fn test_sort_by_status_priority() {
        let sorted = RentalDirectory::sort(vec![
            record("1", "Completed"),
            record("2", "Ongoing"),
            record("3", "Upcoming"),
        ]);
        assert_eq!(ids(&sorted), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_sort_is_stable_and_unknown_last() {
        let sorted = RentalDirectory::sort(vec![
            record("a", "archived"),
            record("b", "Completed"),
            record("c", "Ongoing"),
            record("d", "Completed"),
            record("e", "Ongoing"),
            record("f", "canceled"),
            record("g", "Upcoming"),
        ]);
        assert_eq!(ids(&sorted), vec!["c", "e", "g", "b", "d", "a", "f"]);
    }

    #[test]
    fn test_failed_refresh_keeps_previous_list() {
        let mut directory = RentalDirectory::new();
        let seq = directory.begin_refresh();
        directory.apply(seq, Ok(vec![record("1", "Ongoing")]));

        let seq = directory.begin_refresh();
        let outcome = directory.apply(seq, Err(TrackingError::Network("refused".into())));

        assert!(matches!(outcome, RefreshOutcome::Failed(_)));
        assert_eq!(ids(directory.records()), vec!["1"]);
        assert!(directory.last_error().is_some());
    }

    #[test]
    fn test_stale_refresh_is_discarded() {
        let mut directory = RentalDirectory::new();
        let older = directory.begin_refresh();
        let newer = directory.begin_refresh();

        assert_eq!(
            directory.apply(newer, Ok(vec![record("2", "Ongoing")])),
            RefreshOutcome::Applied(1)
        );
        assert_eq!(
            directory.apply(older, Ok(vec![record("1", "Completed")])),
            RefreshOutcome::Stale
        );
        assert_eq!(ids(directory.records()), vec!["2"]);
    }

    #[test]
    fn test_filter_is_case_insensitive_and_sorted() {
        let mut directory = RentalDirectory::new();
        let seq = directory.begin_refresh();
        let mut vios = record("10", "Completed");
        vios.vehicle_descriptor = "Toyota Vios".into();
        let mut hilux = record("11", "Ongoing");
        hilux.vehicle_descriptor = "Toyota Hilux".into();
        let mut city = record("12", "Upcoming");
        city.vehicle_descriptor = "Honda City".into();
        directory.apply(seq, Ok(vec![vios, hilux, city]));

        let hits: Vec<&str> = directory
            .filter("TOYOTA")
            .iter()
            .map(|r| r.rental_id.as_str())
            .collect();
        assert_eq!(hits, vec!["11", "10"]);
        assert_eq!(directory.filter("   ").len(), 3);
    }

    #[test]
    fn test_status_counts() {
        let mut directory = RentalDirectory::new();
        let seq = directory.begin_refresh();
        directory.apply(
            seq,
            Ok(vec![
                record("1", "Ongoing"),
                record("2", "Ongoing"),
                record("3", "Completed"),
                record("4", "canceled"),
            ]),
        );
        assert_eq!(
            directory.status_counts(),
            StatusCounts {
                ongoing: 2,
                upcoming: 0,
                completed: 1,
                other: 1
            }
        );
    }
}
