//! Scheduling board domain models.
//!
//! Provides the value types the rest of the crate works on: time windows,
//! resources, trips and their activities, and the trip-resource binding
//! projection.
//!
//! # Domain Mappings
//!
//! | trip-board | Carrier planning | Generic scheduling |
//! |------------|------------------|--------------------|
//! | Trip | Tour / Trip | Job |
//! | Activity | Loading / Unloading stop | Operation |
//! | Resource | Driver, Truck, Trailer | Machine / Worker |
//! | ResourceAssignment | Planned crew of a trip | Job-resource binding |

mod activity;
mod assignment;
mod resource;
mod time_window;
mod transport;
mod trip;

pub use activity::{Activity, ActivityCategory, Site};
pub use assignment::{Assignment, ResourceAssignment};
pub use resource::{Resource, ResourceKind, ResourceRegistry};
pub use time_window::{DateRange, TimeWindow};
pub use transport::Transport;
pub use trip::Trip;

/// Company identifier as issued by the backend.
pub type CompanyId = i64;

/// Tag identifier (e.g. "frozen", "urgent").
pub type TagId = String;

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by unit tests across modules.

    use chrono::{DateTime, NaiveDate, Utc};

    use super::{Activity, ActivityCategory, Site, TimeWindow, Transport, Trip};

    /// 2024-03-04 at `hour:minute` UTC.
    pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
            .and_utc()
    }

    /// Implicit trip of company 1: loading in the first half of the window,
    /// unloading in the second half.
    pub fn trip_at(uid: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Trip {
        let mid = start + (end - start) / 2;
        let transport_uid = format!("TR-{uid}");
        let delivery = format!("D-{uid}");
        Trip::implicit(uid, Transport::new(&transport_uid, 1), 1)
            .with_activity(
                Activity::new(
                    format!("{uid}-L"),
                    ActivityCategory::Loading,
                    Site::named("Origin"),
                    TimeWindow::new(start, mid).unwrap(),
                )
                .for_transport(&transport_uid)
                .for_delivery(&delivery),
            )
            .with_activity(
                Activity::new(
                    format!("{uid}-U"),
                    ActivityCategory::Unloading,
                    Site::named("Destination"),
                    TimeWindow::new(mid, end).unwrap(),
                )
                .for_transport(&transport_uid)
                .for_delivery(&delivery),
            )
    }

    /// [`trip_at`] with whole hours.
    pub fn trip_between(uid: &str, from_hour: u32, to_hour: u32) -> Trip {
        trip_at(uid, at(from_hour, 0), at(to_hour, 0))
    }
}
