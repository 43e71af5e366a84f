//! Pure booking rules: interval conflict detection, the customer
//! cancellation window, and loyalty point computation. Everything here
//! is storage-free so the rules stay unit-testable; every mutation
//! path (create, reschedule) goes through the same conflict predicate.

use chrono::{DateTime, Duration, Utc};

/// Slot length assumed when an appointment's service can no longer be
/// resolved. A policy, not an error.
pub const DEFAULT_DURATION_MIN: i64 = 30;

pub const CANCELLATION_WINDOW_HOURS: i64 = 2;

/// A booked interval on a barber's calendar. `duration_minutes` is
/// `None` when the referenced service row is gone.
#[derive(Debug, Clone)]
pub struct BookedSlot {
    pub start: DateTime<Utc>,
    pub duration_minutes: Option<i64>,
}

impl BookedSlot {
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(self.duration_minutes.unwrap_or(DEFAULT_DURATION_MIN))
    }
}

/// Half-open interval intersection: [a_start, a_end) and
/// [b_start, b_end) overlap iff a_start < b_end and a_end > b_start.
/// A slot ending exactly when another starts does not conflict.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// True when the candidate interval collides with any booked slot.
pub fn has_conflict(existing: &[BookedSlot], start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    existing
        .iter()
        .any(|slot| overlaps(slot.start, slot.end(), start, end))
}

/// Customers may cancel only while at least two hours remain before
/// the appointment. Exactly two hours is still allowed.
pub fn cancellable_by_customer(scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    scheduled_at - now >= Duration::hours(CANCELLATION_WINDOW_HOURS)
}

/// One loyalty point per 10 spent, rounded down.
pub fn loyalty_points_for(total_price: f64) -> i64 {
    (total_price / 10.0).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, min, 0).unwrap()
    }

    fn slot(hour: u32, min: u32, duration: i64) -> BookedSlot {
        BookedSlot {
            start: at(hour, min),
            duration_minutes: Some(duration),
        }
    }

    #[test]
    fn overlapping_intervals_conflict() {
        // Existing 10:00-11:00, candidate 10:30-11:30.
        assert!(overlaps(at(10, 0), at(11, 0), at(10, 30), at(11, 30)));
        // Candidate fully inside.
        assert!(overlaps(at(10, 0), at(11, 0), at(10, 15), at(10, 45)));
        // Candidate covering.
        assert!(overlaps(at(10, 15), at(10, 45), at(10, 0), at(11, 0)));
    }

    #[test]
    fn touching_intervals_do_not_conflict() {
        assert!(!overlaps(at(10, 0), at(11, 0), at(11, 0), at(12, 0)));
        assert!(!overlaps(at(11, 0), at(12, 0), at(10, 0), at(11, 0)));
    }

    #[test]
    fn candidate_against_booked_calendar() {
        let existing = vec![slot(10, 0, 60)];

        // 10:30 with a 60-minute service is rejected.
        assert!(has_conflict(&existing, at(10, 30), at(11, 30)));
        // 11:00 back-to-back is allowed.
        assert!(!has_conflict(&existing, at(11, 0), at(12, 0)));
        // 09:00 ending exactly at 10:00 is allowed.
        assert!(!has_conflict(&existing, at(9, 0), at(10, 0)));
    }

    #[test]
    fn unresolvable_service_falls_back_to_thirty_minutes() {
        let existing = vec![BookedSlot {
            start: at(10, 0),
            duration_minutes: None,
        }];

        assert!(has_conflict(&existing, at(10, 15), at(10, 45)));
        assert!(!has_conflict(&existing, at(10, 30), at(11, 0)));
    }

    #[test]
    fn cancellation_window_boundary() {
        let now = at(8, 0);
        assert!(cancellable_by_customer(at(10, 0), now)); // exactly 2h
        assert!(cancellable_by_customer(at(11, 0), now));
        assert!(!cancellable_by_customer(at(9, 30), now)); // 90 minutes out
        assert!(!cancellable_by_customer(at(7, 0), now)); // already past
    }

    #[test]
    fn loyalty_points_round_down() {
        assert_eq!(loyalty_points_for(150.0), 15);
        assert_eq!(loyalty_points_for(159.99), 15);
        assert_eq!(loyalty_points_for(9.99), 0);
        assert_eq!(loyalty_points_for(0.0), 0);
    }
}
