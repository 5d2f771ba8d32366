//! Plan assembly: energy profile plus a dated, per-day schedule.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, Weekday};
use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::error::PlanError;
use crate::metabolic::{self, ActivityTable};
use crate::nutrition::{self, MacroTargets};
use crate::profile::{Activity, Profile};
use crate::projection::project_weight;
use crate::workout::{self, Intensity, WorkoutDay};

/// Energy metrics derived once per profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyProfile {
    pub bmr: f64,
    pub tdee: f64,
    pub target_calories: f64,
    pub macros: MacroTargets,
}

/// One row of the plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanDay {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub exercise: Activity,
    pub duration_minutes: u32,
    pub intensity: Intensity,
    pub projected_weight_kg: f64,
}

/// An assembled plan. Built only through [`assemble_plan`], which checks the
/// structural invariants; there is no way to mutate it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    days: Vec<PlanDay>,
    energy: EnergyProfile,
}

/// Initial vs projected weight at some point in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub initial_weight_kg: f64,
    pub projected_weight_kg: f64,
    pub change_kg: f64,
}

impl Plan {
    pub fn days(&self) -> &[PlanDay] {
        &self.days
    }

    pub fn energy(&self) -> &EnergyProfile {
        &self.energy
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Always false for a plan returned by [`assemble_plan`].
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.days[0].date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.days[self.days.len() - 1].date
    }

    /// Number of sessions per exercise.
    pub fn exercise_distribution(&self) -> BTreeMap<Activity, usize> {
        let mut counts = BTreeMap::new();
        for d in &self.days {
            *counts.entry(d.exercise).or_insert(0) += 1;
        }
        counts
    }

    /// Number of sessions per intensity.
    pub fn intensity_distribution(&self) -> BTreeMap<Intensity, usize> {
        let mut counts = BTreeMap::new();
        for d in &self.days {
            *counts.entry(d.intensity).or_insert(0) += 1;
        }
        counts
    }

    pub fn total_minutes(&self) -> u32 {
        self.days.iter().map(|d| d.duration_minutes).sum()
    }

    /// Progress at `day_index`, clamped to the last day of the plan.
    pub fn progress_at(&self, initial_weight_kg: f64, day_index: usize) -> Progress {
        let day = &self.days[day_index.min(self.days.len() - 1)];
        Progress {
            initial_weight_kg,
            projected_weight_kg: day.projected_weight_kg,
            change_kg: ((day.projected_weight_kg - initial_weight_kg) * 100.0).round() / 100.0,
        }
    }
}

/// BMR → TDEE → macro allocation for a validated profile.
pub fn compute_energy_profile(
    profile: &Profile,
    table: &ActivityTable,
) -> Result<EnergyProfile, PlanError> {
    let bmr = metabolic::compute_bmr(
        profile.weight_kg,
        profile.height_cm,
        profile.age,
        profile.sex,
    );
    let tdee = metabolic::compute_tdee(bmr, profile.activity_level, table)?;
    let macros = nutrition::allocate_macros(tdee, profile.goal);
    Ok(EnergyProfile {
        bmr,
        tdee,
        target_calories: macros.target_calories,
        macros,
    })
}

/// Join workout days with the weight projection and attach `energy`.
///
/// Fails with [`PlanError::EmptyPlan`] when the requested duration is zero,
/// and with [`PlanError::InvalidPlan`] when `workout_days` does not cover the
/// requested duration one calendar day at a time.
pub fn assemble_plan(
    profile: &Profile,
    energy: EnergyProfile,
    workout_days: Vec<WorkoutDay>,
) -> Result<Plan, PlanError> {
    let expected = profile.plan_duration_days as usize;
    if expected == 0 {
        return Err(PlanError::EmptyPlan {
            duration_days: i64::from(profile.plan_duration_days),
        });
    }
    if workout_days.len() != expected {
        return Err(PlanError::InvalidPlan {
            detail: format!("expected {expected} days, got {}", workout_days.len()),
        });
    }
    for pair in workout_days.windows(2) {
        if pair[0].date.checked_add_days(Days::new(1)) != Some(pair[1].date) {
            return Err(PlanError::InvalidPlan {
                detail: format!("{} is not the day after {}", pair[1].date, pair[0].date),
            });
        }
    }

    let days = workout_days
        .into_iter()
        .enumerate()
        .map(|(i, w)| PlanDay {
            date: w.date,
            weekday: w.weekday,
            exercise: w.exercise,
            duration_minutes: w.duration_minutes,
            intensity: w.intensity,
            projected_weight_kg: project_weight(profile.weight_kg, profile.goal, i as u32),
        })
        .collect();

    Ok(Plan { days, energy })
}

/// Full pipeline for one submission: energy profile, workout schedule,
/// assembly. Inputs are checked before any schedule is drawn.
pub fn generate_plan<R: Rng + ?Sized>(
    profile: &Profile,
    table: &ActivityTable,
    start_date: NaiveDate,
    rng: &mut R,
) -> Result<Plan, PlanError> {
    if profile.plan_duration_days == 0 {
        return Err(PlanError::EmptyPlan { duration_days: 0 });
    }
    let energy = compute_energy_profile(profile, table)?;
    let workout_days = workout::build_workout_plan(
        &profile.preferred_activities(),
        profile.plan_duration_days,
        profile.goal,
        &profile.limitations,
        start_date,
        rng,
    );
    let plan = assemble_plan(profile, energy, workout_days)?;

    info!(
        goal = profile.goal.label(),
        duration_days = plan.len(),
        bmr = energy.bmr,
        tdee = energy.tdee,
        target_calories = energy.target_calories,
        "plan generated"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ActivityLevel, Goal};
    use crate::profile::tests::sample_profile;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn plan_for(profile: &Profile, seed: u64) -> Plan {
        generate_plan(
            profile,
            &ActivityTable::default(),
            start(),
            &mut StdRng::seed_from_u64(seed),
        )
        .unwrap()
    }

    #[test]
    fn energy_profile_for_reference_profile() {
        let e = compute_energy_profile(&sample_profile(), &ActivityTable::default()).unwrap();
        assert!((e.bmr - 1671.672).abs() < 0.01, "bmr {}", e.bmr);
        assert!((e.tdee - 2591.0916).abs() < 0.01, "tdee {}", e.tdee);
        assert!((e.target_calories - (e.tdee - 500.0)).abs() < 1e-9);
        assert_eq!(e.macros.protein_g, 156.8);
        assert_eq!(e.macros.carbs_g, 209.1);
        assert_eq!(e.macros.fats_g, 69.7);
    }

    #[test]
    fn plan_length_and_dates_are_consistent() {
        for duration in [7, 14, 21, 30] {
            let mut profile = sample_profile();
            profile.plan_duration_days = duration;
            let plan = plan_for(&profile, u64::from(duration));
            assert_eq!(plan.len(), duration as usize);
            assert_eq!(plan.start_date(), start());
            for pair in plan.days().windows(2) {
                assert_eq!(
                    pair[0].date.checked_add_days(Days::new(1)),
                    Some(pair[1].date)
                );
            }
        }
    }

    #[test]
    fn zero_duration_is_empty_plan() {
        let mut profile = sample_profile();
        profile.plan_duration_days = 0;
        let energy = compute_energy_profile(&profile, &ActivityTable::default()).unwrap();
        let err = assemble_plan(&profile, energy, Vec::new()).unwrap_err();
        assert!(matches!(err, PlanError::EmptyPlan { duration_days: 0 }), "got: {err:?}");

        let err = generate_plan(
            &profile,
            &ActivityTable::default(),
            start(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::EmptyPlan { .. }));
    }

    #[test]
    fn mismatched_length_is_rejected() {
        let profile = sample_profile();
        let energy = compute_energy_profile(&profile, &ActivityTable::default()).unwrap();
        let days = workout::build_workout_plan(
            &[],
            3,
            Goal::WeightLoss,
            "",
            start(),
            &mut StdRng::seed_from_u64(0),
        );
        let err = assemble_plan(&profile, energy, days).unwrap_err();
        assert!(matches!(err, PlanError::InvalidPlan { .. }), "got: {err:?}");
    }

    #[test]
    fn gaps_between_dates_are_rejected() {
        let mut profile = sample_profile();
        profile.plan_duration_days = 7;
        let energy = compute_energy_profile(&profile, &ActivityTable::default()).unwrap();
        let mut days = workout::build_workout_plan(
            &[],
            7,
            Goal::WeightLoss,
            "",
            start(),
            &mut StdRng::seed_from_u64(0),
        );
        days[4].date = days[4].date.checked_add_days(Days::new(1)).unwrap();
        let err = assemble_plan(&profile, energy, days).unwrap_err();
        assert!(err.to_string().contains("is not the day after"), "got: {err}");
    }

    #[test]
    fn projected_weight_follows_goal() {
        let profile = sample_profile();
        let plan = plan_for(&profile, 9);
        assert_eq!(plan.days()[0].projected_weight_kg, profile.weight_kg);
        assert_eq!(plan.days()[7].projected_weight_kg, profile.weight_kg - 0.5);
        for pair in plan.days().windows(2) {
            assert!(pair[1].projected_weight_kg <= pair[0].projected_weight_kg);
        }
    }

    #[test]
    fn distributions_cover_every_day() {
        let profile = sample_profile();
        let plan = plan_for(&profile, 17);
        let by_exercise: usize = plan.exercise_distribution().values().sum();
        let by_intensity: usize = plan.intensity_distribution().values().sum();
        assert_eq!(by_exercise, plan.len());
        assert_eq!(by_intensity, plan.len());
        assert!(
            plan.exercise_distribution()
                .keys()
                .all(|a| profile.physical_preferences.contains(a))
        );
        let minutes: u32 = plan.days().iter().map(|d| d.duration_minutes).sum();
        assert_eq!(plan.total_minutes(), minutes);
    }

    #[test]
    fn progress_reports_signed_change() {
        let profile = sample_profile();
        let plan = plan_for(&profile, 2);
        let p = plan.progress_at(profile.weight_kg, 7);
        assert_eq!(p.projected_weight_kg, 69.5);
        assert_eq!(p.change_kg, -0.5);

        let last = plan.progress_at(profile.weight_kg, 10_000);
        assert_eq!(last.projected_weight_kg, plan.days()[plan.len() - 1].projected_weight_kg);
    }

    #[test]
    fn missing_activity_factor_fails_before_scheduling() {
        let profile = sample_profile();
        let table: ActivityTable = std::iter::empty::<(ActivityLevel, f64)>().collect();
        let err = generate_plan(&profile, &table, start(), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, PlanError::UnknownActivityLevel { .. }));
    }
}
