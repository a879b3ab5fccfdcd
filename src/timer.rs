use std::time::Duration;

/// Default length of a quiz attempt
pub const QUIZ_SECONDS: u64 = 600;

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Countdown clock that ticks once per second while running and expires exactly once.
///
/// A fresh instance is needed to restart; there is no reset.
#[derive(Debug, Clone)]
pub struct Countdown {
    starting_secs: u64,
    remaining_secs: u64,
    running: bool,
    expired_fired: bool,
    carry: Duration,
}

impl Countdown {
    pub fn new(starting_secs: u64) -> Self {
        Self {
            starting_secs,
            remaining_secs: starting_secs,
            running: true,
            expired_fired: false,
            carry: Duration::ZERO,
        }
    }

    pub fn starting_secs(&self) -> u64 {
        self.starting_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running && self.remaining_secs > 0
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    /// Advance by one second. Returns true only on the tick that reaches zero
    /// (or on the first tick of a zero-length countdown).
    pub fn tick(&mut self) -> bool {
        if !self.running || self.expired_fired {
            return false;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.expired_fired = true;
            return true;
        }
        false
    }

    /// Feed wall-clock time from the event loop. Sub-second remainders are
    /// carried over so that ticks stay aligned to whole seconds.
    /// Returns true if this call fired the expiry.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if !self.running || self.expired_fired {
            return false;
        }
        self.carry += elapsed;
        let mut fired = false;
        while self.carry >= ONE_SECOND && !self.expired_fired {
            self.carry -= ONE_SECOND;
            fired |= self.tick();
        }
        fired
    }

    /// `m:ss` display, e.g. `9:05`
    pub fn display(&self) -> String {
        format!("{}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_exactly_once_after_starting_ticks() {
        let mut countdown = Countdown::new(3);
        let fired: Vec<bool> = (0..3).map(|_| countdown.tick()).collect();
        assert_eq!(fired, vec![false, false, true]);
        assert_eq!(countdown.remaining_secs(), 0);

        for _ in 0..5 {
            assert!(!countdown.tick());
        }
        assert_eq!(countdown.remaining_secs(), 0);
        assert!(countdown.is_expired());
    }

    #[test]
    fn paused_countdown_freezes() {
        let mut countdown = Countdown::new(2);
        countdown.set_running(false);
        assert!(!countdown.tick());
        assert!(!countdown.advance(Duration::from_secs(10)));
        assert_eq!(countdown.remaining_secs(), 2);

        countdown.toggle();
        assert!(!countdown.tick());
        assert!(countdown.tick());
    }

    #[test]
    fn zero_length_countdown_fires_on_first_tick() {
        let mut countdown = Countdown::new(0);
        assert!(countdown.tick());
        assert!(!countdown.tick());
    }

    #[test]
    fn advance_accumulates_sub_second_ticks() {
        let mut countdown = Countdown::new(5);
        for _ in 0..9 {
            countdown.advance(Duration::from_millis(100));
        }
        assert_eq!(countdown.remaining_secs(), 5);

        countdown.advance(Duration::from_millis(100));
        assert_eq!(countdown.remaining_secs(), 4);

        assert!(countdown.advance(Duration::from_millis(4500)));
        assert_eq!(countdown.remaining_secs(), 0);
        assert!(!countdown.advance(Duration::from_secs(3)));
    }

    #[test]
    fn display_formats_minutes_and_seconds() {
        assert_eq!(Countdown::new(QUIZ_SECONDS).display(), "10:00");
        assert_eq!(Countdown::new(65).display(), "1:05");
        assert_eq!(Countdown::new(9).display(), "0:09");
    }
}
