// =============================================================================
// status.rs — THE LIFECYCLE ORACLE
// =============================================================================
//
// One function. Four answers. Zero state.
//
// An IPO's lifecycle is pure date arithmetic against the market clock:
// bidding opens at 9:30 AM IST, closes at 3:30 PM IST, and listing trades
// from 10:00 AM IST. We evaluate everything in UTC at fixed cutover times so
// the answer doesn't depend on which continent the server woke up on.
//
// The classifier takes `now` as an argument instead of calling Utc::now()
// itself. That single decision is the difference between "testable pure
// function" and "function that's right twice a day."
// =============================================================================

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::models::IpoStatus;

// Cutover times, in UTC. IST is UTC+5:30, so:
//   listing  10:00 IST = 04:30 UTC
//   close    15:30 IST = 10:00 UTC
//   open     09:30 IST = 04:00 UTC
const LISTING_CUTOVER_UTC: (u32, u32) = (4, 30);
const CLOSE_CUTOVER_UTC: (u32, u32) = (10, 0);
const OPEN_CUTOVER_UTC: (u32, u32) = (4, 0);

fn cutover(date: NaiveDate, (hour, minute): (u32, u32)) -> DateTime<Utc> {
    // Hard-coded hour/minute pairs above are always valid clock times.
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
    Utc.from_utc_datetime(&date.and_time(time))
}

/// Classify an IPO's lifecycle state at instant `now`.
///
/// Checks run top-down and short-circuit: a reached listing cutover answers
/// Listed without ever consulting the close or open dates. Absent dates
/// simply skip their rung. A record with no dates at all is Upcoming, which
/// is the politest thing you can say about a row with three empty cells.
pub fn status_at(
    open_date: Option<NaiveDate>,
    close_date: Option<NaiveDate>,
    listing_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> IpoStatus {
    if let Some(listing) = listing_date {
        if cutover(listing, LISTING_CUTOVER_UTC) <= now {
            return IpoStatus::Listed;
        }
    }
    if let Some(close) = close_date {
        if cutover(close, CLOSE_CUTOVER_UTC) <= now {
            return IpoStatus::Closed;
        }
    }
    if let Some(open) = open_date {
        if cutover(open, OPEN_CUTOVER_UTC) <= now {
            return IpoStatus::Open;
        }
    }
    IpoStatus::Upcoming
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn at(y: i32, m: u32, day: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, day, h, min, 0).unwrap()
    }

    #[test]
    fn test_no_dates_is_upcoming() {
        assert_eq!(status_at(None, None, None, at(2026, 2, 20, 12, 0)), IpoStatus::Upcoming);
    }

    #[test]
    fn test_open_cutover_boundary() {
        let open = Some(d(2026, 2, 23));
        // 03:59 UTC on open day: still Upcoming. 04:00: Open.
        assert_eq!(status_at(open, None, None, at(2026, 2, 23, 3, 59)), IpoStatus::Upcoming);
        assert_eq!(status_at(open, None, None, at(2026, 2, 23, 4, 0)), IpoStatus::Open);
    }

    #[test]
    fn test_close_cutover_boundary() {
        let open = Some(d(2026, 2, 23));
        let close = Some(d(2026, 2, 25));
        assert_eq!(status_at(open, close, None, at(2026, 2, 25, 9, 59)), IpoStatus::Open);
        assert_eq!(status_at(open, close, None, at(2026, 2, 25, 10, 0)), IpoStatus::Closed);
    }

    #[test]
    fn test_listing_cutover_boundary() {
        let close = Some(d(2026, 2, 25));
        let listing = Some(d(2026, 3, 2));
        assert_eq!(
            status_at(None, close, listing, at(2026, 3, 2, 4, 29)),
            IpoStatus::Closed
        );
        assert_eq!(
            status_at(None, close, listing, at(2026, 3, 2, 4, 30)),
            IpoStatus::Listed
        );
    }

    #[test]
    fn test_never_listed_before_listing_cutover() {
        // Open and close are long past, listing is tomorrow: Closed, not
        // Listed, no matter how eager the grey market is.
        let status = status_at(
            Some(d(2026, 2, 10)),
            Some(d(2026, 2, 12)),
            Some(d(2026, 3, 2)),
            at(2026, 2, 20, 12, 0),
        );
        assert_eq!(status, IpoStatus::Closed);
    }

    #[test]
    fn test_pure_function_same_instant_same_answer() {
        let now = at(2026, 2, 24, 6, 0);
        let a = status_at(Some(d(2026, 2, 23)), Some(d(2026, 2, 25)), None, now);
        let b = status_at(Some(d(2026, 2, 23)), Some(d(2026, 2, 25)), None, now);
        assert_eq!(a, b);
        assert_eq!(a, IpoStatus::Open);
    }

    #[test]
    fn test_missing_middle_rung_is_skipped() {
        // No close date: evaluation falls through listing → open.
        let status = status_at(Some(d(2026, 2, 23)), None, Some(d(2026, 3, 2)), at(2026, 2, 24, 12, 0));
        assert_eq!(status, IpoStatus::Open);
    }
}
