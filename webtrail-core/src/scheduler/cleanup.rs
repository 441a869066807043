use chrono::{DateTime, Local, NaiveDate, Timelike};

/// Gates the retention cleanup to at most once per calendar day, inside the
/// configured local maintenance hour. Owned by the scheduler rather than
/// being process-global state, so tests can drive it with fixed clocks.
///
/// The very first cycle after startup cleans regardless of the hour; a
/// service that was down through its maintenance window catches up
/// immediately instead of waiting another day.
#[derive(Debug)]
pub struct CleanupState {
    maintenance_hour: u32,
    last_cleanup: Option<NaiveDate>,
}

impl CleanupState {
    pub fn new(maintenance_hour: u32) -> Self {
        Self {
            maintenance_hour,
            last_cleanup: None,
        }
    }

    pub fn should_run(&self, now: DateTime<Local>) -> bool {
        match self.last_cleanup {
            None => true,
            Some(last) => now.hour() == self.maintenance_hour && last != now.date_naive(),
        }
    }

    pub fn mark_done(&mut self, date: NaiveDate) {
        self.last_cleanup = Some(date);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, 15, 0).unwrap()
    }

    #[test]
    fn first_run_cleans_regardless_of_hour() {
        let state = CleanupState::new(2);

        assert!(state.should_run(at(2026, 8, 25, 14)));
    }

    #[test]
    fn runs_again_only_in_the_maintenance_hour() {
        // Arrange
        let mut state = CleanupState::new(2);
        state.mark_done(at(2026, 8, 24, 2).date_naive());

        // Assert
        assert!(!state.should_run(at(2026, 8, 25, 14)));
        assert!(state.should_run(at(2026, 8, 25, 2)));
    }

    #[test]
    fn runs_at_most_once_per_day() {
        // Arrange
        let mut state = CleanupState::new(2);
        let today_0215 = at(2026, 8, 25, 2);
        state.mark_done(today_0215.date_naive());

        // Assert
        assert!(!state.should_run(today_0215));
        assert!(state.should_run(at(2026, 8, 26, 2)));
    }
}
