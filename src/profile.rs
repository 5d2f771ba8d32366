//! User profile: typed fields, tag parsing and eager validation.
//!
//! Raw input (from a TOML profile file or CLI flags) lands in
//! [`ProfileInput`], where every field is optional and untyped. Converting it
//! with [`ProfileInput::into_profile`] checks every field before anything is
//! computed, so a plan is never derived from a half-valid profile.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

pub const MIN_AGE: i64 = 18;
pub const MAX_AGE: i64 = 100;
pub const MIN_HEIGHT_CM: i64 = 100;
pub const MAX_HEIGHT_CM: i64 = 250;
pub const MIN_WEIGHT_KG: f64 = 30.0;
pub const MAX_WEIGHT_KG: f64 = 300.0;

/// Plan lengths offered to the user.
pub const PLAN_DURATIONS: [u32; 4] = [7, 14, 21, 30];
const DEFAULT_PLAN_DURATION: u32 = 30;

/// Lowercase, collapse whitespace, and treat `-` / `_` as spaces so that
/// "Lightly-active", "lightly_active" and "Lightly active" compare equal.
fn normalize_tag(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '-' | '_' => ' ',
            c => c.to_ascii_lowercase(),
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn label_list<T: Copy>(items: &[T], label: fn(T) -> &'static str) -> String {
    items
        .iter()
        .map(|&i| label(i))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

impl FromStr for Sex {
    type Err = PlanError;

    /// Only the two coefficient sets exist; anything else is rejected rather
    /// than silently mapped to one of them.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_tag(s).as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            _ => Err(PlanError::invalid_profile(
                "sex",
                format!("'{s}' is not recognized (expected Male or Female)"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtremelyActive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::LightlyActive,
        ActivityLevel::ModeratelyActive,
        ActivityLevel::VeryActive,
        ActivityLevel::ExtremelyActive,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Sedentary",
            ActivityLevel::LightlyActive => "Lightly active",
            ActivityLevel::ModeratelyActive => "Moderately active",
            ActivityLevel::VeryActive => "Very active",
            ActivityLevel::ExtremelyActive => "Extremely active",
        }
    }

    /// Key used in the `[activity_factors]` config table.
    pub fn key(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::LightlyActive => "lightly_active",
            ActivityLevel::ModeratelyActive => "moderately_active",
            ActivityLevel::VeryActive => "very_active",
            ActivityLevel::ExtremelyActive => "extremely_active",
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_tag(s);
        ActivityLevel::ALL
            .into_iter()
            .find(|l| normalize_tag(l.label()) == wanted)
            .ok_or_else(|| PlanError::UnknownActivityLevel {
                value: s.to_owned(),
                expected: label_list(&ActivityLevel::ALL, ActivityLevel::label),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Goal {
    WeightLoss,
    MuscleGain,
    Maintenance,
    Performance,
}

impl Goal {
    pub const ALL: [Goal; 4] = [
        Goal::WeightLoss,
        Goal::MuscleGain,
        Goal::Maintenance,
        Goal::Performance,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Goal::WeightLoss => "Weight loss",
            Goal::MuscleGain => "Muscle gain",
            Goal::Maintenance => "Maintenance",
            Goal::Performance => "Performance",
        }
    }
}

impl FromStr for Goal {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_tag(s);
        Goal::ALL
            .into_iter()
            .find(|g| normalize_tag(g.label()) == wanted)
            .ok_or_else(|| PlanError::UnknownGoal {
                value: s.to_owned(),
                expected: label_list(&Goal::ALL, Goal::label),
            })
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DietaryRestriction {
    Vegetarian,
    Vegan,
    GlutenFree,
    LactoseFree,
    LowCarb,
    NutAllergy,
    SeafoodAllergy,
}

impl DietaryRestriction {
    pub const ALL: [DietaryRestriction; 7] = [
        DietaryRestriction::Vegetarian,
        DietaryRestriction::Vegan,
        DietaryRestriction::GlutenFree,
        DietaryRestriction::LactoseFree,
        DietaryRestriction::LowCarb,
        DietaryRestriction::NutAllergy,
        DietaryRestriction::SeafoodAllergy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DietaryRestriction::Vegetarian => "Vegetarian",
            DietaryRestriction::Vegan => "Vegan",
            DietaryRestriction::GlutenFree => "Gluten-free",
            DietaryRestriction::LactoseFree => "Lactose-free",
            DietaryRestriction::LowCarb => "Low-carb",
            DietaryRestriction::NutAllergy => "Nut allergy",
            DietaryRestriction::SeafoodAllergy => "Seafood allergy",
        }
    }
}

/// Parse a restriction tag. `"None"` is the explicit "no restrictions"
/// marker and yields `Ok(None)`.
fn parse_restriction(raw: &str) -> Result<Option<DietaryRestriction>, PlanError> {
    let wanted = normalize_tag(raw);
    if wanted == "none" {
        return Ok(None);
    }
    DietaryRestriction::ALL
        .into_iter()
        .find(|r| normalize_tag(r.label()) == wanted)
        .map(Some)
        .ok_or_else(|| {
            PlanError::invalid_profile(
                "dietary_restrictions",
                format!(
                    "'{raw}' is not recognized (expected None or one of: {})",
                    label_list(&DietaryRestriction::ALL, DietaryRestriction::label)
                ),
            )
        })
}

/// Physical activity a user may prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Walking,
    Running,
    Swimming,
    Cycling,
    WeightTraining,
    Yoga,
    Pilates,
    TeamSports,
    Dance,
    MartialArts,
}

impl Activity {
    pub const ALL: [Activity; 10] = [
        Activity::Walking,
        Activity::Running,
        Activity::Swimming,
        Activity::Cycling,
        Activity::WeightTraining,
        Activity::Yoga,
        Activity::Pilates,
        Activity::TeamSports,
        Activity::Dance,
        Activity::MartialArts,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Activity::Walking => "Walking",
            Activity::Running => "Running",
            Activity::Swimming => "Swimming",
            Activity::Cycling => "Cycling",
            Activity::WeightTraining => "Weight training",
            Activity::Yoga => "Yoga",
            Activity::Pilates => "Pilates",
            Activity::TeamSports => "Team sports",
            Activity::Dance => "Dance",
            Activity::MartialArts => "Martial arts",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Activity {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_tag(s);
        Activity::ALL
            .into_iter()
            .find(|a| normalize_tag(a.label()) == wanted)
            .ok_or_else(|| {
                PlanError::invalid_profile(
                    "physical_preferences",
                    format!(
                        "'{s}' is not recognized (expected one of: {})",
                        label_list(&Activity::ALL, Activity::label)
                    ),
                )
            })
    }
}

/// A validated user profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub age: u32,
    pub sex: Sex,
    pub height_cm: u32,
    pub weight_kg: f64,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
    pub dietary_restrictions: BTreeSet<DietaryRestriction>,
    pub physical_preferences: BTreeSet<Activity>,
    pub notes: String,
    /// Physical limitations as free text. Accepted and echoed into the
    /// narrative prompt, but workout selection does not consult it.
    pub limitations: String,
    pub plan_duration_days: u32,
}

impl Profile {
    /// Preferences in a stable order, as consumed by the workout assigner.
    pub fn preferred_activities(&self) -> Vec<Activity> {
        self.physical_preferences.iter().copied().collect()
    }
}

/// Unvalidated profile fields. All optional so that a profile file and CLI
/// flags can each supply a subset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileInput {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub sex: Option<String>,
    pub height_cm: Option<i64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<String>,
    pub goal: Option<String>,
    pub dietary_restrictions: Option<Vec<String>>,
    pub physical_preferences: Option<Vec<String>>,
    pub notes: Option<String>,
    pub limitations: Option<String>,
    pub plan_duration_days: Option<i64>,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, PlanError> {
    value.ok_or_else(|| PlanError::invalid_profile(field, "is required"))
}

impl ProfileInput {
    /// Read a profile from a TOML file.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let contents = fs::read_to_string(path).map_err(|e| PlanError::ProfileFileFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| PlanError::ProfileFileFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    /// Overlay `overrides` on top of `self`; any field set in `overrides` wins.
    pub fn merge(self, overrides: ProfileInput) -> ProfileInput {
        ProfileInput {
            name: overrides.name.or(self.name),
            age: overrides.age.or(self.age),
            sex: overrides.sex.or(self.sex),
            height_cm: overrides.height_cm.or(self.height_cm),
            weight_kg: overrides.weight_kg.or(self.weight_kg),
            activity_level: overrides.activity_level.or(self.activity_level),
            goal: overrides.goal.or(self.goal),
            dietary_restrictions: overrides.dietary_restrictions.or(self.dietary_restrictions),
            physical_preferences: overrides.physical_preferences.or(self.physical_preferences),
            notes: overrides.notes.or(self.notes),
            limitations: overrides.limitations.or(self.limitations),
            plan_duration_days: overrides.plan_duration_days.or(self.plan_duration_days),
        }
    }

    /// Validate every field and produce a [`Profile`].
    pub fn into_profile(self) -> Result<Profile, PlanError> {
        let name = required(self.name, "name")?.trim().to_owned();
        if name.is_empty() {
            return Err(PlanError::invalid_profile("name", "must not be empty"));
        }

        let age = required(self.age, "age")?;
        if !(MIN_AGE..=MAX_AGE).contains(&age) {
            return Err(PlanError::invalid_profile(
                "age",
                format!("{age} is outside {MIN_AGE}..={MAX_AGE}"),
            ));
        }

        let sex: Sex = required(self.sex, "sex")?.parse()?;

        let height_cm = required(self.height_cm, "height_cm")?;
        if !(MIN_HEIGHT_CM..=MAX_HEIGHT_CM).contains(&height_cm) {
            return Err(PlanError::invalid_profile(
                "height_cm",
                format!("{height_cm} is outside {MIN_HEIGHT_CM}..={MAX_HEIGHT_CM}"),
            ));
        }

        let weight_kg = required(self.weight_kg, "weight_kg")?;
        if !(MIN_WEIGHT_KG..=MAX_WEIGHT_KG).contains(&weight_kg) {
            return Err(PlanError::invalid_profile(
                "weight_kg",
                format!("{weight_kg} is outside {MIN_WEIGHT_KG}..={MAX_WEIGHT_KG}"),
            ));
        }

        let activity_level: ActivityLevel =
            required(self.activity_level, "activity_level")?.parse()?;
        let goal: Goal = required(self.goal, "goal")?.parse()?;

        let mut dietary_restrictions = BTreeSet::new();
        for raw in self.dietary_restrictions.unwrap_or_default() {
            if let Some(r) = parse_restriction(&raw)? {
                dietary_restrictions.insert(r);
            }
        }

        let physical_preferences = self
            .physical_preferences
            .unwrap_or_default()
            .iter()
            .map(|raw| raw.parse::<Activity>())
            .collect::<Result<BTreeSet<_>, _>>()?;

        let plan_duration_days = self
            .plan_duration_days
            .unwrap_or(i64::from(DEFAULT_PLAN_DURATION));
        if plan_duration_days <= 0 {
            return Err(PlanError::EmptyPlan {
                duration_days: plan_duration_days,
            });
        }
        let plan_duration_days = u32::try_from(plan_duration_days)
            .ok()
            .filter(|d| PLAN_DURATIONS.contains(d))
            .ok_or_else(|| {
                PlanError::invalid_profile(
                    "plan_duration_days",
                    format!("{plan_duration_days} is not one of {PLAN_DURATIONS:?}"),
                )
            })?;

        Ok(Profile {
            name,
            // Range checks above guarantee these fit.
            age: age as u32,
            sex,
            height_cm: height_cm as u32,
            weight_kg,
            activity_level,
            goal,
            dietary_restrictions,
            physical_preferences,
            notes: self.notes.unwrap_or_default().trim().to_owned(),
            limitations: self.limitations.unwrap_or_default().trim().to_owned(),
            plan_duration_days,
        })
    }
}
