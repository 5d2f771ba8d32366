//! Plan summary: build and write a JSON overview of a generated plan.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::error::PlanError;
use crate::nutrition::MacroCalories;
use crate::plan::{EnergyProfile, Plan};
use crate::profile::Profile;

#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub name: String,
    pub goal: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: usize,
    pub energy: EnergyProfile,
    /// kcal contributed by each macronutrient at the target grams.
    pub macro_calories: MacroCalories,
    /// Sessions per exercise label.
    pub exercise_distribution: BTreeMap<String, usize>,
    /// Sessions per intensity label.
    pub intensity_distribution: BTreeMap<String, usize>,
    pub total_minutes: u32,
    pub initial_weight_kg: f64,
    pub final_projected_weight_kg: f64,
    pub weight_change_kg: f64,
    /// RFC 3339 timestamp of when the summary was built.
    pub generated_at: String,
}

pub fn build_summary(profile: &Profile, plan: &Plan) -> PlanSummary {
    let progress = plan.progress_at(profile.weight_kg, plan.len() - 1);

    PlanSummary {
        name: profile.name.clone(),
        goal: profile.goal.label().to_owned(),
        start_date: plan.start_date(),
        end_date: plan.end_date(),
        days: plan.len(),
        energy: *plan.energy(),
        macro_calories: plan.energy().macros.calories(),
        exercise_distribution: plan
            .exercise_distribution()
            .into_iter()
            .map(|(a, n)| (a.label().to_owned(), n))
            .collect(),
        intensity_distribution: plan
            .intensity_distribution()
            .into_iter()
            .map(|(i, n)| (i.label().to_owned(), n))
            .collect(),
        total_minutes: plan.total_minutes(),
        initial_weight_kg: progress.initial_weight_kg,
        final_projected_weight_kg: progress.projected_weight_kg,
        weight_change_kg: progress.change_kg,
        generated_at: Utc::now().to_rfc3339(),
    }
}

/// Write `summary` as pretty JSON. Creates parent directories; writes a
/// temp file and renames it into place, falling back to a direct write when
/// the rename fails.
pub fn write_summary(summary: &PlanSummary, path: &Path) -> Result<(), PlanError> {
    let fail = |detail: String| PlanError::SummaryWriteFailed {
        path: path.to_path_buf(),
        detail,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| fail(format!("failed to create directory: {e}")))?;
        }
    }

    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| fail(format!("failed to serialize: {e}")))?;

    let tmp_path = path.with_extension("json.tmp");
    let written = (|| -> std::io::Result<()> {
        let mut f = fs::File::create(&tmp_path)?;
        f.write_all(json.as_bytes())?;
        f.sync_all()?;
        Ok(())
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(fail(format!("failed to write temp file: {e}")));
    }

    if fs::rename(&tmp_path, path).is_err() {
        let _ = fs::remove_file(&tmp_path);
        fs::write(path, &json).map_err(|e| fail(e.to_string()))?;
    }
    tracing::debug!(path = %path.display(), "plan summary written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic::ActivityTable;
    use crate::plan::generate_plan;
    use crate::profile::tests::sample_profile;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn summary() -> PlanSummary {
        let profile = sample_profile();
        let plan = generate_plan(
            &profile,
            &ActivityTable::default(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            &mut StdRng::seed_from_u64(8),
        )
        .unwrap();
        build_summary(&profile, &plan)
    }

    #[test]
    fn summary_reflects_plan() {
        let s = summary();
        assert_eq!(s.name, "Ana");
        assert_eq!(s.goal, "Weight loss");
        assert_eq!(s.days, 14);
        assert_eq!(s.start_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(s.end_date, NaiveDate::from_ymd_opt(2024, 2, 14).unwrap());
        assert_eq!(s.exercise_distribution.values().sum::<usize>(), 14);
        assert_eq!(s.intensity_distribution.values().sum::<usize>(), 14);
        assert_eq!(s.initial_weight_kg, 70.0);
        assert!(s.weight_change_kg < 0.0);
        assert!((s.macro_calories.total() - s.energy.target_calories).abs() <= 3.0);
    }

    #[test]
    fn writes_json_creating_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("summary.json");
        write_summary(&summary(), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["days"], 14);
        assert_eq!(value["start_date"], "2024-02-01");
        assert!(value["energy"]["macros"]["protein_g"].is_number());
        assert!(value["generated_at"].is_string());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn overwrites_existing_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        fs::write(&path, "stale").unwrap();
        write_summary(&summary(), &path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with('{'));
    }
}
