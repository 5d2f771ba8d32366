//! Narrative request construction.
//!
//! The prompt sent to the text-generation service is built here and nowhere
//! else, so there is one place to review the wording that reaches the model.
//!
//! # Injection risk
//!
//! Name, notes and limitations are user-authored free text. Each is fenced
//! in a `---TAG---` pair so the model can tell data from instructions. The
//! delimiters are static; a payload containing the exact delimiter line may
//! still confuse the model.

use crate::plan::EnergyProfile;
use crate::profile::Profile;

const NAME_DELIMITER: &str = "---NAME---";
const NOTES_DELIMITER: &str = "---NOTES---";
const LIMITATIONS_DELIMITER: &str = "---LIMITATIONS---";

/// Section headings, in the order they appear.
pub const SECTIONS: [&str; 4] = [
    "## Profile summary",
    "## Nutrition request",
    "## Exercise request",
    "## Motivation and strategy request",
];

fn join_or<I>(items: I, empty: &str) -> String
where
    I: IntoIterator<Item = &'static str>,
{
    let joined = items.into_iter().collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        empty.to_owned()
    } else {
        joined
    }
}

fn fenced(delimiter: &str, body: &str) -> String {
    let body = if body.is_empty() { "(none)" } else { body };
    format!("{delimiter}\n{body}\n{delimiter}")
}

/// Build the narrative prompt for `profile` and its computed metrics.
pub fn build_prompt(profile: &Profile, energy: &EnergyProfile) -> String {
    let restrictions = join_or(
        profile.dietary_restrictions.iter().map(|r| r.label()),
        "none",
    );
    let preferences = join_or(
        profile.physical_preferences.iter().map(|a| a.label()),
        "no preference (default: Walking)",
    );
    let m = &energy.macros;

    format!(
        "You are a wellness coach. Write practical, encouraging recommendations \
         for the person below. The figures are illustrative estimates, not medical advice.\n\n\
         {profile_h}\n\
         Name:\n\
         {name}\n\
         - Age: {age} years\n\
         - Sex: {sex}\n\
         - Height: {height} cm\n\
         - Weight: {weight:.1} kg\n\
         - Activity level: {activity}\n\
         - Goal: {goal}\n\
         - Plan length: {days} days\n\
         - BMR: {bmr:.0} kcal/day\n\
         - TDEE: {tdee:.0} kcal/day\n\n\
         Notes from the user:\n\
         {notes}\n\n\
         {nutrition_h}\n\
         Propose a daily meal plan (breakfast, lunch, dinner and two snacks) of about \
         {target:.0} kcal with roughly {protein:.1} g protein, {carbs:.1} g carbohydrates \
         and {fats:.1} g fat. Dietary restrictions: {restrictions}.\n\n\
         {exercise_h}\n\
         Suggest how to structure training around these preferred activities: {preferences}. \
         Weekend sessions are light (30-45 min), weekday sessions moderate to high (45-75 min). \
         Physical limitations reported by the user:\n\
         {limitations}\n\n\
         {motivation_h}\n\
         Give three habits and one strategy for staying consistent toward the goal \"{goal}\".",
        profile_h = SECTIONS[0],
        nutrition_h = SECTIONS[1],
        exercise_h = SECTIONS[2],
        motivation_h = SECTIONS[3],
        name = fenced(NAME_DELIMITER, &profile.name),
        age = profile.age,
        sex = profile.sex.label(),
        height = profile.height_cm,
        weight = profile.weight_kg,
        activity = profile.activity_level.label(),
        goal = profile.goal.label(),
        days = profile.plan_duration_days,
        bmr = energy.bmr,
        tdee = energy.tdee,
        notes = fenced(NOTES_DELIMITER, &profile.notes),
        target = energy.target_calories,
        protein = m.protein_g,
        carbs = m.carbs_g,
        fats = m.fats_g,
        restrictions = restrictions,
        preferences = preferences,
        limitations = fenced(LIMITATIONS_DELIMITER, &profile.limitations),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic::ActivityTable;
    use crate::plan::compute_energy_profile;
    use crate::profile::tests::sample_profile;

    fn prompt_for(profile: &Profile) -> String {
        let energy = compute_energy_profile(profile, &ActivityTable::default()).unwrap();
        build_prompt(profile, &energy)
    }

    #[test]
    fn sections_appear_in_order() {
        let p = prompt_for(&sample_profile());
        let positions: Vec<usize> = SECTIONS
            .iter()
            .map(|s| p.find(s).unwrap_or_else(|| panic!("missing section {s}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn embeds_profile_and_metrics() {
        let p = prompt_for(&sample_profile());
        assert!(p.contains("Goal: Weight loss"));
        assert!(p.contains("BMR: 1672 kcal/day"), "{p}");
        assert!(p.contains("about 2091 kcal"), "{p}");
        assert!(p.contains("156.8 g protein"));
        assert!(p.contains("Dietary restrictions: Vegetarian."));
        assert!(p.contains("Running, Yoga"));
    }

    #[test]
    fn free_text_is_fenced() {
        let p = prompt_for(&sample_profile());
        assert!(p.contains("Name:\n---NAME---\nAna\n---NAME---"), "{p}");
        assert!(p.contains("---NOTES---\nPrefers mornings\n---NOTES---"));
        assert!(p.contains("---LIMITATIONS---\nKnee pain\n---LIMITATIONS---"));
    }

    #[test]
    fn empty_fields_have_placeholders() {
        let mut profile = sample_profile();
        profile.notes.clear();
        profile.dietary_restrictions.clear();
        profile.physical_preferences.clear();
        let p = prompt_for(&profile);
        assert!(p.contains("---NOTES---\n(none)\n---NOTES---"));
        assert!(p.contains("Dietary restrictions: none."));
        assert!(p.contains("default: Walking"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let profile = sample_profile();
        assert_eq!(prompt_for(&profile), prompt_for(&profile));
    }
}
