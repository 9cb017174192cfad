// View composer - renders tracking state into the console's view model
use crate::application::directory::StatusCounts;
use crate::application::tracking_service::{Detail, TrackingSnapshot};
use crate::domain::location::Viewport;
use crate::domain::rental::{RentalRecord, RentalStatus};
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingView {
    pub directory: DirectoryView,
    pub map: MapView,
    pub detail: DetailView,
    /// Directory refresh failure, shown above the list
    pub banner: Option<String>,
    pub notice: Option<String>,
    /// Selection generation; lets clients drop out-of-order responses
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DirectoryView {
    Loading,
    Empty,
    Ready {
        counts: StatusCounts,
        cards: Vec<RentalCard>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RentalCard {
    pub rental_id: String,
    pub renter_name: String,
    pub vehicle_descriptor: String,
    pub rent_period: String,
    pub status_label: String,
    pub badge_color: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub viewport: Viewport,
    pub marker: Option<Marker>,
    /// Rental the map is following live
    pub following: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub longitude: f64,
    pub latitude: f64,
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailView {
    Idle,
    Notice {
        message: String,
    },
    NoDataYet {
        rental_id: String,
    },
    Live {
        rental_id: String,
        speed: String,
        fuel: String,
        distance: String,
    },
    Summary {
        rental_id: String,
        total_distance: String,
        total_fuel: String,
    },
    Unavailable {
        message: String,
    },
    Error {
        message: String,
    },
}

pub fn badge_color(status: &RentalStatus) -> &'static str {
    match status {
        RentalStatus::Ongoing => "orange",
        RentalStatus::Upcoming => "blue",
        RentalStatus::Completed => "green",
        RentalStatus::Canceled => "red",
        RentalStatus::Other(_) => "gray",
    }
}

pub fn format_date(date: &NaiveDateTime) -> String {
    date.format("%b %d, %Y").to_string()
}

/// Render a snapshot. `query` narrows the card list without touching state.
pub fn compose(snapshot: &TrackingSnapshot, query: Option<&str>) -> TrackingView {
    let selected_id = snapshot.selected.as_ref().map(|r| r.rental_id.as_str());

    let directory = if !snapshot.directory.is_loaded() {
        DirectoryView::Loading
    } else if snapshot.directory.records().is_empty() {
        DirectoryView::Empty
    } else {
        let cards = snapshot
            .directory
            .filter(query.unwrap_or(""))
            .into_iter()
            .map(|r| card(r, selected_id == Some(r.rental_id.as_str())))
            .collect();
        DirectoryView::Ready {
            counts: snapshot.directory.status_counts(),
            cards,
        }
    };

    let rental_id = selected_id.unwrap_or_default().to_string();
    let marker = match &snapshot.detail {
        Detail::Live(sample) => Some(Marker {
            longitude: sample.longitude,
            latitude: sample.latitude,
            popup: format!("Rental {} - {:.1} km/h", rental_id, sample.speed),
        }),
        _ => None,
    };

    let detail = match &snapshot.detail {
        Detail::Idle => DetailView::Idle,
        Detail::Notice(message) => DetailView::Notice {
            message: message.clone(),
        },
        Detail::Pending => DetailView::NoDataYet { rental_id },
        Detail::Live(sample) => DetailView::Live {
            rental_id,
            speed: format!("{:.1} km/h", sample.speed),
            fuel: format!("{:.2} L", sample.cumulative_fuel),
            distance: format!("{:.2} km", sample.cumulative_distance),
        },
        Detail::Summary(summary) => DetailView::Summary {
            rental_id,
            total_distance: format!("{} km", summary.total_distance),
            total_fuel: format!("{} L", summary.total_fuel),
        },
        Detail::Unavailable(message) => DetailView::Unavailable {
            message: message.clone(),
        },
        Detail::Failed(message) => DetailView::Error {
            message: message.clone(),
        },
    };

    TrackingView {
        directory,
        map: MapView {
            viewport: snapshot.viewport,
            marker,
            following: snapshot.polling.clone(),
        },
        detail,
        banner: snapshot
            .directory
            .last_error()
            .map(|e| format!("Could not refresh rentals: {}", e)),
        notice: snapshot.notice.as_ref().map(|n| n.message.clone()),
        generation: snapshot.generation,
    }
}

fn card(record: &RentalRecord, selected: bool) -> RentalCard {
    RentalCard {
        rental_id: record.rental_id.clone(),
        renter_name: record.renter_name.clone(),
        vehicle_descriptor: record.vehicle_descriptor.clone(),
        rent_period: format!(
            "{} to {}",
            format_date(&record.pickup_date),
            format_date(&record.dropoff_date)
        ),
        status_label: record.status.as_str().to_uppercase(),
        badge_color: badge_color(&record.status),
        selected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::directory::RentalDirectory;
    use crate::application::rental_repository::mock::{record, sample};
    use crate::domain::error::TrackingError;
    use crate::domain::location::TripSummary;

    fn snapshot(records: Option<Vec<RentalRecord>>) -> TrackingSnapshot {
        let mut directory = RentalDirectory::new();
        if let Some(records) = records {
            let seq = directory.begin_refresh();
            directory.apply(seq, Ok(records));
        }
        TrackingSnapshot {
            directory,
            selected: None,
            detail: Detail::Idle,
            viewport: Viewport::default(),
            notice: None,
            polling: None,
            generation: 0,
        }
    }

    #[test]
    fn test_loading_and_empty_are_distinct() {
        assert_eq!(compose(&snapshot(None), None).directory, DirectoryView::Loading);
        assert_eq!(compose(&snapshot(Some(vec![])), None).directory, DirectoryView::Empty);
    }

    #[test]
    fn test_cards_formatting_and_badges() {
        let mut state = snapshot(Some(vec![record("1", "Completed"), record("2", "Ongoing")]));
        state.selected = Some(record("2", "Ongoing"));

        let view = compose(&state, None);
        let DirectoryView::Ready { cards, counts } = view.directory else {
            panic!("expected cards");
        };

        assert_eq!(counts.ongoing, 1);
        assert_eq!(cards[0].rental_id, "2");
        assert_eq!(cards[0].status_label, "ONGOING");
        assert_eq!(cards[0].badge_color, "orange");
        assert!(cards[0].selected);
        assert_eq!(cards[1].badge_color, "green");
        assert_eq!(cards[1].rent_period, "Nov 20, 2024 to Nov 22, 2024");
    }

    #[test]
    fn test_no_data_yet_differs_from_error() {
        let mut state = snapshot(Some(vec![record("2", "Ongoing")]));
        state.selected = Some(record("2", "Ongoing"));

        state.detail = Detail::Pending;
        assert_eq!(
            compose(&state, None).detail,
            DetailView::NoDataYet {
                rental_id: "2".into()
            }
        );

        state.detail = Detail::Failed("Could not load".into());
        assert_eq!(
            compose(&state, None).detail,
            DetailView::Error {
                message: "Could not load".into()
            }
        );
    }

    #[test]
    fn test_live_sample_places_marker() {
        let mut state = snapshot(Some(vec![record("2", "Ongoing")]));
        state.selected = Some(record("2", "Ongoing"));
        state.detail = Detail::Live(sample(121.05, 14.6));
        state.polling = Some("2".into());

        let view = compose(&state, None);
        assert_eq!(view.map.following.as_deref(), Some("2"));
        let marker = view.map.marker.unwrap();
        assert_eq!((marker.longitude, marker.latitude), (121.05, 14.6));
        assert_eq!(marker.popup, "Rental 2 - 40.0 km/h");
    }

    #[test]
    fn test_summary_values_rendered() {
        let mut state = snapshot(Some(vec![record("1", "Completed")]));
        state.selected = Some(record("1", "Completed"));
        state.detail = Detail::Summary(TripSummary {
            total_distance: 120.0,
            total_fuel: 15.0,
        });

        let view = compose(&state, None);
        assert_eq!(
            view.detail,
            DetailView::Summary {
                rental_id: "1".into(),
                total_distance: "120 km".into(),
                total_fuel: "15 L".into(),
            }
        );
        assert!(view.map.marker.is_none());
    }

    #[test]
    fn test_banner_from_refresh_error() {
        let mut state = snapshot(Some(vec![record("1", "Completed")]));
        let seq = state.directory.begin_refresh();
        state
            .directory
            .apply(seq, Err(TrackingError::Network("refused".into())));

        let view = compose(&state, None);
        assert_eq!(
            view.banner.as_deref(),
            Some("Could not refresh rentals: network error: refused")
        );
        assert!(matches!(view.directory, DirectoryView::Ready { .. }));
    }

    #[test]
    fn test_query_filters_cards() {
        let state = snapshot(Some(vec![record("1", "Completed"), record("2", "Ongoing")]));
        let view = compose(&state, Some("renter 1"));
        let DirectoryView::Ready { cards, .. } = view.directory else {
            panic!("expected cards");
        };
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].rental_id, "1");
    }
}
