//! Pure schedule computation for the driver. Cadences key off a minute
//! index; the daily wake/night triggers fire when a tick crosses the
//! configured local time. Keeping this free of I/O keeps it testable.

use crate::kind::PulseKind;
use chrono::{NaiveDateTime, NaiveTime};

/// Pulse kinds due at a given minute. Takt beats every minute; build,
/// ship, and monitor every 5; research every 15.
pub fn cadence_due(minute_index: u64) -> Vec<PulseKind> {
    let mut due = vec![PulseKind::Takt];
    if minute_index % 5 == 0 {
        due.extend([PulseKind::Build, PulseKind::Ship, PulseKind::Monitor]);
    }
    if minute_index % 15 == 0 {
        due.push(PulseKind::Research);
    }
    due
}

/// True when the window (prev, now] crosses today's `at`. A driver booted
/// after `at` does not fire until the next day's crossing.
pub fn daily_due(prev: NaiveDateTime, now: NaiveDateTime, at: NaiveTime) -> bool {
    let target = now.date().and_time(at);
    prev < target && target <= now
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn takt_every_minute() {
        for minute in [0, 1, 2, 7, 59, 61] {
            assert!(cadence_due(minute).contains(&PulseKind::Takt));
        }
    }

    #[test]
    fn five_minute_cells() {
        let due = cadence_due(5);
        assert!(due.contains(&PulseKind::Build));
        assert!(due.contains(&PulseKind::Ship));
        assert!(due.contains(&PulseKind::Monitor));
        assert!(!due.contains(&PulseKind::Research));

        assert_eq!(cadence_due(7), vec![PulseKind::Takt]);
    }

    #[test]
    fn research_every_fifteen() {
        assert!(cadence_due(15).contains(&PulseKind::Research));
        assert!(cadence_due(30).contains(&PulseKind::Research));
        assert!(!cadence_due(20).contains(&PulseKind::Research));
        // Minute 0 is everything at once.
        assert_eq!(cadence_due(0).len(), 5);
    }

    #[test]
    fn daily_fires_exactly_on_crossing() {
        let wake = t(6, 0);
        assert!(!daily_due(dt(2, 5, 58), dt(2, 5, 59), wake));
        assert!(daily_due(dt(2, 5, 59), dt(2, 6, 0), wake));
        assert!(!daily_due(dt(2, 6, 0), dt(2, 6, 1), wake));
    }

    #[test]
    fn daily_fires_once_after_midnight_rollover() {
        let night = t(21, 0);
        // 23:59 → 00:00 does not re-fire yesterday's 21:00.
        assert!(!daily_due(dt(2, 23, 59), dt(3, 0, 0), night));
        // The next day's crossing fires.
        assert!(daily_due(dt(3, 20, 59), dt(3, 21, 0), night));
    }

    #[test]
    fn boot_after_target_waits_for_next_day() {
        let wake = t(6, 0);
        // Driver started at 10:00; prev is initialized to now.
        assert!(!daily_due(dt(2, 10, 0), dt(2, 10, 1), wake));
        // It fires the following morning.
        assert!(daily_due(dt(3, 5, 59), dt(3, 6, 0), wake));
    }

    #[test]
    fn skipped_minutes_still_fire() {
        // A stalled driver that jumps from 05:55 to 06:07 must not lose the
        // 06:00 wake.
        assert!(daily_due(dt(2, 5, 55), dt(2, 6, 7), t(6, 0)));
    }
}
