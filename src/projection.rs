//! Linear body-weight projection.
//!
//! An illustrative trend, not a forecast: weekly rates are applied
//! fractionally per day with no plateau or adherence modelling.

use crate::profile::Goal;

/// kg lost per week under [`Goal::WeightLoss`].
pub const WEEKLY_LOSS_KG: f64 = 0.5;
/// kg gained per week under [`Goal::MuscleGain`].
pub const WEEKLY_GAIN_KG: f64 = 0.25;

/// Projected weight on `day_index` (0 = start date), rounded to 2 decimals.
pub fn project_weight(initial_weight_kg: f64, goal: Goal, day_index: u32) -> f64 {
    let weeks = f64::from(day_index) / 7.0;
    let projected = match goal {
        Goal::WeightLoss => initial_weight_kg - WEEKLY_LOSS_KG * weeks,
        Goal::MuscleGain => initial_weight_kg + WEEKLY_GAIN_KG * weeks,
        Goal::Maintenance | Goal::Performance => initial_weight_kg,
    };
    (projected * 100.0).round() / 100.0
}
