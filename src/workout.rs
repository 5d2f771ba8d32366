//! Per-day workout assignment.
//!
//! Each day is drawn independently: weekends get a light session, weekdays a
//! moderate or high one. All randomness comes from the caller's `Rng`, so a
//! seeded generator reproduces the same schedule.

use std::fmt;
use std::ops::RangeInclusive;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::debug;

use crate::profile::{Activity, Goal};

/// Exercise used when the user listed no preferences.
pub const DEFAULT_ACTIVITY: Activity = Activity::Walking;

pub const WEEKEND_MINUTES: RangeInclusive<u32> = 30..=45;
pub const WEEKDAY_MINUTES: RangeInclusive<u32> = 45..=75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Intensity {
    Light,
    Moderate,
    High,
}

impl Intensity {
    pub fn label(self) -> &'static str {
        match self {
            Intensity::Light => "Light",
            Intensity::Moderate => "Moderate",
            Intensity::High => "High",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

/// One scheduled session, before weight projection is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkoutDay {
    pub day_index: u32,
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub exercise: Activity,
    pub duration_minutes: u32,
    pub intensity: Intensity,
}

/// Build `duration_days` sessions starting at `start_date`.
///
/// `goal` and `limitations` are part of the contract but do not currently
/// influence selection. Returns an empty schedule when `duration_days` is 0;
/// the plan assembler rejects that case.
pub fn build_workout_plan<R: Rng + ?Sized>(
    preferences: &[Activity],
    duration_days: u32,
    goal: Goal,
    limitations: &str,
    start_date: NaiveDate,
    rng: &mut R,
) -> Vec<WorkoutDay> {
    if !limitations.trim().is_empty() {
        debug!(
            goal = goal.label(),
            limitations_len = limitations.len(),
            "limitations recorded but not applied to exercise selection"
        );
    }

    let mut days = Vec::with_capacity(duration_days as usize);
    for offset in 0..duration_days {
        let Some(date) = start_date.checked_add_days(Days::new(u64::from(offset))) else {
            break;
        };
        let weekday = date.weekday();

        let (intensity, duration_minutes) = if is_weekend(weekday) {
            (Intensity::Light, rng.gen_range(WEEKEND_MINUTES))
        } else {
            let intensity = if rng.gen_bool(0.5) {
                Intensity::Moderate
            } else {
                Intensity::High
            };
            (intensity, rng.gen_range(WEEKDAY_MINUTES))
        };

        let exercise = preferences.choose(rng).copied().unwrap_or(DEFAULT_ACTIVITY);

        days.push(WorkoutDay {
            day_index: offset,
            date,
            weekday,
            exercise,
            duration_minutes,
            intensity,
        });
    }
    days
}
