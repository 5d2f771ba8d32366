//! Goal-driven calorie target and macronutrient split.

use serde::Serialize;

use crate::profile::Goal;

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Calorie adjustment and percentage split for one goal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalProfile {
    pub calorie_adjustment: f64,
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fats_pct: f64,
}

/// The single canonical goal table.
pub fn goal_profile(goal: Goal) -> GoalProfile {
    let (calorie_adjustment, protein_pct, carbs_pct, fats_pct) = match goal {
        Goal::WeightLoss => (-500.0, 30.0, 40.0, 30.0),
        Goal::MuscleGain => (500.0, 35.0, 50.0, 15.0),
        Goal::Maintenance => (0.0, 25.0, 50.0, 25.0),
        Goal::Performance => (300.0, 30.0, 55.0, 15.0),
    };
    GoalProfile {
        calorie_adjustment,
        protein_pct,
        carbs_pct,
        fats_pct,
    }
}

/// Daily targets. Gram values are rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroTargets {
    pub target_calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
}

/// Calories contributed by each macronutrient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroCalories {
    pub protein_kcal: f64,
    pub carbs_kcal: f64,
    pub fats_kcal: f64,
}

impl MacroCalories {
    pub fn total(&self) -> f64 {
        self.protein_kcal + self.carbs_kcal + self.fats_kcal
    }
}

impl MacroTargets {
    pub fn calories(&self) -> MacroCalories {
        MacroCalories {
            protein_kcal: self.protein_g * KCAL_PER_G_PROTEIN,
            carbs_kcal: self.carbs_g * KCAL_PER_G_CARBS,
            fats_kcal: self.fats_g * KCAL_PER_G_FAT,
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub fn allocate_macros(tdee: f64, goal: Goal) -> MacroTargets {
    let gp = goal_profile(goal);
    let target_calories = tdee + gp.calorie_adjustment;
    let grams = |pct: f64, kcal_per_g: f64| round1(target_calories * pct / 100.0 / kcal_per_g);

    MacroTargets {
        target_calories,
        protein_g: grams(gp.protein_pct, KCAL_PER_G_PROTEIN),
        carbs_g: grams(gp.carbs_pct, KCAL_PER_G_CARBS),
        fats_g: grams(gp.fats_pct, KCAL_PER_G_FAT),
    }
}
