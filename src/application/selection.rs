// Status classifier - maps a selected rental to what the view should do
use crate::domain::rental::{RentalRecord, RentalStatus};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", content = "rental_id", rename_all = "snake_case")]
pub enum SelectionEffect {
    ShowBlockedNotice,
    StartPolling(String),
    FetchSummaryOnce(String),
    /// Canceled or unrecognised status: nothing to show or fetch
    NoAction,
}

pub const BLOCKED_NOTICE: &str = "This trip has not started yet. Tracking is available once the rental is ongoing.";

pub fn classify(record: &RentalRecord) -> SelectionEffect {
    match record.status {
        RentalStatus::Upcoming => SelectionEffect::ShowBlockedNotice,
        RentalStatus::Ongoing => SelectionEffect::StartPolling(record.rental_id.clone()),
        RentalStatus::Completed => SelectionEffect::FetchSummaryOnce(record.rental_id.clone()),
        RentalStatus::Canceled | RentalStatus::Other(_) => SelectionEffect::NoAction,
    }
}
