//! Wakeup policy engine
//!
//! Pure decision logic for a single idle check:
//! - Idle thresholding over the 1/5/15 minute load averages
//! - Next wakeup hour selection (weekday vs weekend hour sets)
//! - Top-level suspend decision (lock, idle, recent wakeup)
//!
//! Nothing in here touches the OS; callers feed in the sample and the clock.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::metrics::LoadSample;

const SECS_PER_HOUR: u32 = 3_600;
const SECS_PER_DAY: u32 = 86_400;

pub const DEFAULT_WEEKDAY_HOURS: [u8; 6] = [9, 12, 20, 21, 22, 23];

/// True iff every load average is strictly below `threshold`.
pub fn is_idle(sample: &LoadSample, threshold: f64) -> bool {
    sample.one < threshold && sample.five < threshold && sample.fifteen < threshold
}

/// Full top-level policy.
pub fn should_suspend(locked: bool, idle: bool, recently_woke: bool) -> bool {
    !locked && idle && !recently_woke
}

/// Sorted, deduplicated, non-empty set of wakeup hours (0-23)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourSet(BTreeSet<u8>);

impl HourSet {
    pub fn new(hours: impl IntoIterator<Item = u8>) -> Result<Self> {
        let set: BTreeSet<u8> = hours.into_iter().collect();
        if set.is_empty() {
            return Err(Error::Config("wakeup hour set is empty".to_string()));
        }
        if let Some(bad) = set.iter().find(|h| **h > 23) {
            return Err(Error::Config(format!("wakeup hour {} is out of range 0-23", bad)));
        }
        Ok(Self(set))
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    fn earliest(&self) -> u8 {
        // never empty once constructed
        self.0.first().copied().unwrap_or(0)
    }
}

/// Allowed wakeup hours, split by day of week
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeupSchedule {
    weekday: HourSet,
    weekend: HourSet,
}

impl WakeupSchedule {
    pub fn new(weekday: HourSet, weekend: HourSet) -> Self {
        Self { weekday, weekend }
    }

    /// Saturday and Sunday use the weekend set, every other day the weekday set.
    pub fn hours_for(&self, day: Weekday) -> &HourSet {
        match day {
            Weekday::Sat | Weekday::Sun => &self.weekend,
            _ => &self.weekday,
        }
    }
}

impl Default for WakeupSchedule {
    fn default() -> Self {
        Self {
            weekday: HourSet(DEFAULT_WEEKDAY_HOURS.into_iter().collect()),
            weekend: HourSet((9..=23).collect()),
        }
    }
}

/// Chosen wakeup hour and the delay until it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WakeupTarget {
    pub hour: u8,
    pub seconds: u64,
}

/// Why a run decided to stay awake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Locked,
    Busy,
    RecentlyWoke,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::Locked => "suspension is locked",
            SkipReason::Busy => "load is above the idle threshold",
            SkipReason::RecentlyWoke => "machine woke up recently",
        };
        f.write_str(text)
    }
}

/// Outcome of one policy evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Suspend { hour: u8, seconds_until_wake: u64 },
    DoNotSuspend { reason: SkipReason },
}

#[derive(Debug, Clone)]
pub struct PolicyEngine {
    load_threshold: f64,
    lookahead_secs: u32,
    schedule: WakeupSchedule,
}

impl PolicyEngine {
    pub fn new(load_threshold: f64, lookahead_minutes: u32, schedule: WakeupSchedule) -> Self {
        Self {
            load_threshold,
            lookahead_secs: lookahead_minutes.saturating_mul(60),
            schedule,
        }
    }

    pub fn load_threshold(&self) -> f64 {
        self.load_threshold
    }

    pub fn is_idle(&self, sample: &LoadSample) -> bool {
        is_idle(sample, self.load_threshold)
    }

    /// Seconds from `now` (local wall clock) until the next wakeup hour.
    ///
    /// The result is always in `(0, 86400]`.
    pub fn time_to_next_wakeup(&self, now: NaiveDateTime) -> u64 {
        self.next_wakeup(now).seconds
    }

    /// Picks the first configured hour strictly after `now + lookahead`
    /// (wrapped to the day), falling back to the earliest hour tomorrow.
    pub fn next_wakeup(&self, now: NaiveDateTime) -> WakeupTarget {
        let hours = self.schedule.hours_for(now.weekday());
        let now_secs = now.num_seconds_from_midnight();
        let margin = (now_secs + self.lookahead_secs % SECS_PER_DAY) % SECS_PER_DAY;

        let hour = hours
            .iter()
            .find(|h| u32::from(*h) * SECS_PER_HOUR > margin)
            .unwrap_or_else(|| hours.earliest());

        let target = u32::from(hour) * SECS_PER_HOUR;
        let seconds = if target > now_secs {
            target - now_secs
        } else {
            target + (SECS_PER_DAY - now_secs)
        };

        WakeupTarget {
            hour,
            seconds: u64::from(seconds),
        }
    }

    /// Combines idle thresholding, the suspend policy and wakeup selection.
    pub fn evaluate(
        &self,
        sample: &LoadSample,
        now: NaiveDateTime,
        locked: bool,
        recently_woke: bool,
    ) -> Decision {
        let idle = self.is_idle(sample);
        if should_suspend(locked, idle, recently_woke) {
            let target = self.next_wakeup(now);
            return Decision::Suspend {
                hour: target.hour,
                seconds_until_wake: target.seconds,
            };
        }

        let reason = if locked {
            SkipReason::Locked
        } else if !idle {
            SkipReason::Busy
        } else {
            SkipReason::RecentlyWoke
        };
        Decision::DoNotSuspend { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    fn engine() -> PolicyEngine {
        PolicyEngine::new(0.5, 5, WakeupSchedule::default())
    }

    fn sample(one: f64, five: f64, fifteen: f64) -> LoadSample {
        LoadSample { one, five, fifteen }
    }

    #[test]
    fn test_saturday_late_evening_wraps_to_morning() {
        // 2020-05-30 is a Saturday
        let target = engine().next_wakeup(at(2020, 5, 30, 22, 55, 12));
        assert_eq!(target.hour, 9);
        assert_eq!(target.seconds, 36_288);
    }

    #[test]
    fn test_hour_just_outside_margin_is_selected() {
        // Monday, six minutes before 09:00
        let target = engine().next_wakeup(at(2020, 6, 1, 8, 54, 0));
        assert_eq!(target.hour, 9);
        assert_eq!(target.seconds, 360);
    }

    #[test]
    fn test_hour_inside_margin_is_skipped() {
        let weekday = engine().next_wakeup(at(2020, 6, 1, 8, 56, 0));
        assert_eq!(weekday.hour, 12);
        assert_eq!(weekday.seconds, 11_040);

        let weekend = engine().next_wakeup(at(2020, 5, 30, 8, 56, 0));
        assert_eq!(weekend.hour, 10);
        assert_eq!(weekend.seconds, 3_840);
    }

    #[test]
    fn test_smaller_margin_keeps_near_hour() {
        let engine = PolicyEngine::new(0.5, 3, WakeupSchedule::default());
        let target = engine.next_wakeup(at(2020, 6, 1, 8, 56, 0));
        assert_eq!(target.hour, 9);
        assert_eq!(target.seconds, 240);
    }

    #[test]
    fn test_after_last_hour_wraps_to_next_day() {
        let target = engine().next_wakeup(at(2020, 6, 1, 23, 30, 0));
        assert_eq!(target.hour, 9);
        assert_eq!(target.seconds, 34_200);

        // margin itself crosses midnight
        let target = engine().next_wakeup(at(2020, 6, 1, 23, 57, 0));
        assert_eq!(target.hour, 9);
        assert_eq!(target.seconds, 32_580);
    }

    #[test]
    fn test_weekday_and_weekend_sets() {
        let schedule = WakeupSchedule::default();
        let weekend: Vec<u8> = schedule.hours_for(Weekday::Sun).iter().collect();
        assert_eq!(weekend, (9..=23).collect::<Vec<u8>>());
        for day in [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri] {
            let hours: Vec<u8> = schedule.hours_for(day).iter().collect();
            assert_eq!(hours, DEFAULT_WEEKDAY_HOURS.to_vec());
        }

        // Wednesday afternoon waits for the evening, Saturday for the next hour
        assert_eq!(engine().next_wakeup(at(2020, 6, 3, 13, 0, 0)).hour, 20);
        assert_eq!(engine().next_wakeup(at(2020, 6, 6, 13, 0, 0)).hour, 14);
    }

    #[test]
    fn test_duration_always_within_one_day() {
        let engine = engine();
        let mut now = at(2020, 6, 1, 0, 0, 0);
        let end = now + Duration::days(7);
        while now < end {
            let seconds = engine.time_to_next_wakeup(now);
            assert!(seconds > 0 && seconds <= 86_400, "{} -> {}", now, seconds);
            now += Duration::seconds(7 * 60 + 13);
        }
    }

    #[test]
    fn test_single_hour_at_exact_hour_waits_full_day() {
        let hours = HourSet::new([9]).unwrap();
        let engine = PolicyEngine::new(0.5, 5, WakeupSchedule::new(hours.clone(), hours));
        assert_eq!(engine.time_to_next_wakeup(at(2020, 6, 1, 9, 0, 0)), 86_400);
    }

    #[test]
    fn test_hour_set_dedups_and_validates() {
        let set = HourSet::new([23, 9, 12, 9]).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![9, 12, 23]);
        assert!(HourSet::new([]).is_err());
        assert!(HourSet::new([9, 24]).is_err());
    }

    #[test]
    fn test_idle_requires_all_loads_below_threshold() {
        assert!(is_idle(&sample(0.1, 0.2, 0.3), 0.5));
        assert!(!is_idle(&sample(0.5, 0.2, 0.3), 0.5));
        assert!(!is_idle(&sample(0.1, 0.7, 0.3), 0.5));
        assert!(!is_idle(&sample(0.1, 0.2, 1.3), 0.5));
    }

    #[test]
    fn test_should_suspend_truth_table() {
        assert!(should_suspend(false, true, false));
        assert!(!should_suspend(true, true, false));
        assert!(!should_suspend(false, false, false));
        assert!(!should_suspend(false, true, true));
    }

    #[test]
    fn test_evaluate_reports_first_blocking_condition() {
        let engine = engine();
        let now = at(2020, 5, 30, 22, 55, 12);
        let idle = sample(0.0, 0.0, 0.0);
        let busy = sample(2.0, 0.1, 0.1);

        assert_eq!(
            engine.evaluate(&idle, now, false, false),
            Decision::Suspend { hour: 9, seconds_until_wake: 36_288 }
        );
        assert_eq!(
            engine.evaluate(&busy, now, true, true),
            Decision::DoNotSuspend { reason: SkipReason::Locked }
        );
        assert_eq!(
            engine.evaluate(&busy, now, false, true),
            Decision::DoNotSuspend { reason: SkipReason::Busy }
        );
        assert_eq!(
            engine.evaluate(&idle, now, false, true),
            Decision::DoNotSuspend { reason: SkipReason::RecentlyWoke }
        );
    }
}
