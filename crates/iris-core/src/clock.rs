use chrono::{DateTime, FixedOffset, Local, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Time source for temporal logic.
///
/// Returns the current instant with the process-local UTC offset attached,
/// so time-of-day schedules follow the server's wall clock. Swappable so
/// scheduler ticks can be driven in tests without real waits.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall-clock time in the local timezone.
#[derive(Debug, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = Local::now();
        now.with_timezone(now.offset())
    }
}

/// Manually advanced clock, for tests.
#[derive(Debug)]
pub struct ManualClock {
    offset: FixedOffset,
    unix_secs: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            offset: start.timezone(),
            unix_secs: AtomicI64::new(start.timestamp()),
        }
    }

    pub fn set(&self, to: DateTime<FixedOffset>) {
        self.unix_secs.store(to.timestamp(), Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.unix_secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let secs = self.unix_secs.load(Ordering::SeqCst);
        DateTime::<Utc>::from_timestamp(secs, 0)
            .expect("timestamp in range")
            .with_timezone(&self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_advance() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let start = offset.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance_secs(300);
        assert_eq!(clock.now(), start + chrono::Duration::minutes(5));
        // Offset survives the round trip.
        assert_eq!(clock.now().timezone(), offset);
    }
}
