use std::time::Duration;

use time::OffsetDateTime;

/// Fallback inter-sample interval, also used when no time band matches.
pub const DEFAULT_SLEEP_SECS: f64 = 30.0;

const DIM_LUX: i64 = 10;
const BRIGHT_LUX: i64 = 80;

#[derive(Debug, Clone)]
pub enum SleepPolicy {
    Fixed(f64),
    LuxAdaptive { base: f64 },
    TimeOfDayBanded(Vec<TimeBand>),
}

/// A sleep duration tied to one or more half-open local-hour ranges
/// `[start, end)`. Ranges may be disjoint and unordered; the first band
/// containing the current hour wins.
#[derive(Debug, Clone)]
pub struct TimeBand {
    pub secs: f64,
    pub hours: Vec<(u8, u8)>,
}

impl TimeBand {
    fn contains(&self, hour: u8) -> bool {
        self.hours.iter().any(|&(start, end)| start <= hour && hour < end)
    }
}

/// Seconds to wait before the next sample, given the just-obtained reading.
/// Fractional durations are preserved so `LuxAdaptive` really does sample
/// twice as often under bright light.
pub fn next_delay(policy: &SleepPolicy, last_lux: i64) -> Duration {
    Duration::from_secs_f64(next_delay_secs(policy, last_lux, local_hour()))
}

fn next_delay_secs(policy: &SleepPolicy, last_lux: i64, hour: u8) -> f64 {
    match policy {
        SleepPolicy::Fixed(secs) => *secs,
        SleepPolicy::TimeOfDayBanded(bands) => bands
            .iter()
            .find(|band| band.contains(hour))
            .map(|band| band.secs)
            .unwrap_or(DEFAULT_SLEEP_SECS),
        SleepPolicy::LuxAdaptive { base } => {
            let mut secs = *base;
            if last_lux <= DIM_LUX {
                secs = base * 2.0;
            }
            // Evaluated after the dim check so a bright reading always wins.
            if last_lux >= BRIGHT_LUX {
                secs = base * 0.5;
            }
            secs
        }
    }
}

fn local_hour() -> u8 {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .hour()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banded() -> SleepPolicy {
        SleepPolicy::TimeOfDayBanded(vec![
            TimeBand {
                secs: 300.0,
                hours: vec![(0, 6), (20, 23)],
            },
            TimeBand {
                secs: 15.0,
                hours: vec![(12, 15)],
            },
        ])
    }

    #[test]
    fn fixed_policy_ignores_lux_and_hour() {
        let policy = SleepPolicy::Fixed(45.0);
        for lux in [0, 50, 100] {
            for hour in 0..24 {
                assert_eq!(next_delay_secs(&policy, lux, hour), 45.0);
            }
        }
    }

    #[test]
    fn banded_policy_picks_first_matching_band() {
        let policy = banded();
        assert_eq!(next_delay_secs(&policy, 50, 13), 15.0);
        assert_eq!(next_delay_secs(&policy, 50, 22), 300.0);
    }

    #[test]
    fn banded_policy_falls_back_to_default() {
        let policy = banded();
        assert_eq!(next_delay_secs(&policy, 50, 17), DEFAULT_SLEEP_SECS);
        // Half-open upper bounds: 23 is outside [20, 23).
        assert_eq!(next_delay_secs(&policy, 50, 23), DEFAULT_SLEEP_SECS);
        assert_eq!(next_delay_secs(&policy, 50, 6), DEFAULT_SLEEP_SECS);
    }

    #[test]
    fn lux_adaptive_doubles_when_dim() {
        let policy = SleepPolicy::LuxAdaptive { base: 30.0 };
        assert_eq!(next_delay_secs(&policy, 0, 12), 60.0);
        assert_eq!(next_delay_secs(&policy, 10, 12), 60.0);
        assert_eq!(next_delay_secs(&policy, 11, 12), 30.0);
    }

    #[test]
    fn lux_adaptive_halves_when_bright() {
        let policy = SleepPolicy::LuxAdaptive { base: 30.0 };
        assert_eq!(next_delay_secs(&policy, 79, 12), 30.0);
        assert_eq!(next_delay_secs(&policy, 80, 12), 15.0);
        assert_eq!(next_delay_secs(&policy, 100, 12), 15.0);
    }

    #[test]
    fn fractional_base_survives_into_duration() {
        let policy = SleepPolicy::LuxAdaptive { base: 15.0 };
        let delay = Duration::from_secs_f64(next_delay_secs(&policy, 90, 12));
        assert_eq!(delay, Duration::from_millis(7500));
    }
}
