//! Basal metabolic rate and total daily energy expenditure.
//!
//! BMR uses the Harris-Benedict equations (revised coefficients):
//!
//! - male:   `88.362 + 13.397 × weight + 4.799 × height − 5.677 × age`
//! - female: `447.593 + 9.247 × weight + 3.098 × height − 4.330 × age`
//!
//! TDEE is BMR scaled by an activity multiplier taken from an
//! [`ActivityTable`] supplied by the caller (usually from configuration).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::profile::{ActivityLevel, Sex};

struct HarrisBenedict {
    constant: f64,
    weight: f64,
    height: f64,
    age: f64,
}

const MALE: HarrisBenedict = HarrisBenedict {
    constant: 88.362,
    weight: 13.397,
    height: 4.799,
    age: 5.677,
};

const FEMALE: HarrisBenedict = HarrisBenedict {
    constant: 447.593,
    weight: 9.247,
    height: 3.098,
    age: 4.330,
};

/// Basal metabolic rate in kcal/day.
pub fn compute_bmr(weight_kg: f64, height_cm: u32, age_years: u32, sex: Sex) -> f64 {
    let c = match sex {
        Sex::Male => &MALE,
        Sex::Female => &FEMALE,
    };
    c.constant + c.weight * weight_kg + c.height * f64::from(height_cm)
        - c.age * f64::from(age_years)
}

/// Read-only activity multiplier table.
///
/// Deserializes from a TOML table keyed by snake_case level names
/// (`sedentary`, `lightly_active`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityTable(BTreeMap<ActivityLevel, f64>);

impl Default for ActivityTable {
    fn default() -> Self {
        Self(BTreeMap::from([
            (ActivityLevel::Sedentary, 1.2),
            (ActivityLevel::LightlyActive, 1.375),
            (ActivityLevel::ModeratelyActive, 1.55),
            (ActivityLevel::VeryActive, 1.725),
            (ActivityLevel::ExtremelyActive, 1.9),
        ]))
    }
}

impl FromIterator<(ActivityLevel, f64)> for ActivityTable {
    fn from_iter<I: IntoIterator<Item = (ActivityLevel, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl ActivityTable {
    pub fn multiplier(&self, level: ActivityLevel) -> Option<f64> {
        self.0.get(&level).copied()
    }

    /// Return a copy of `self` with the entries of `overrides` replacing
    /// the matching levels.
    pub fn overlay(&self, overrides: &ActivityTable) -> ActivityTable {
        let mut merged = self.0.clone();
        merged.extend(overrides.0.iter().map(|(k, v)| (*k, *v)));
        ActivityTable(merged)
    }

    /// Every multiplier must be finite and positive.
    pub fn validate(&self) -> Result<(), PlanError> {
        for (level, &value) in &self.0 {
            if !value.is_finite() || value <= 0.0 {
                return Err(PlanError::InvalidActivityFactor {
                    level: level.key().to_owned(),
                    value,
                });
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActivityLevel, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

/// Total daily energy expenditure in kcal/day.
///
/// Fails with [`PlanError::UnknownActivityLevel`] when `table` has no entry
/// for `level`; there is no fallback multiplier.
pub fn compute_tdee(
    bmr: f64,
    activity_level: ActivityLevel,
    table: &ActivityTable,
) -> Result<f64, PlanError> {
    let multiplier =
        table
            .multiplier(activity_level)
            .ok_or_else(|| PlanError::UnknownActivityLevel {
                value: activity_level.label().to_owned(),
                expected: table
                    .iter()
                    .map(|(l, _)| l.label())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;
    Ok(bmr * multiplier)
}
