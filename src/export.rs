//! CSV export of an assembled plan.
//!
//! Column order and header names are a stable contract; presentation
//! layers stream the output as a file download.

use std::io::Write;

use crate::error::PlanError;
use crate::plan::Plan;
use crate::workout::weekday_name;

pub const CSV_HEADER: [&str; 6] = [
    "Date",
    "Weekday",
    "Exercise",
    "Duration",
    "Intensity",
    "ProjectedWeight",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

fn export_err(e: impl std::fmt::Display) -> PlanError {
    PlanError::ExportFailed {
        detail: e.to_string(),
    }
}

/// Write `plan` as CSV (header plus one row per day) to `writer`.
pub fn write_csv<W: Write>(plan: &Plan, writer: W) -> Result<(), PlanError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER).map_err(export_err)?;
    for day in plan.days() {
        wtr.write_record([
            day.date.format(DATE_FORMAT).to_string(),
            weekday_name(day.weekday).to_owned(),
            day.exercise.label().to_owned(),
            day.duration_minutes.to_string(),
            day.intensity.label().to_owned(),
            format!("{:.2}", day.projected_weight_kg),
        ])
        .map_err(export_err)?;
    }
    wtr.flush().map_err(export_err)?;
    Ok(())
}

pub fn to_csv_string(plan: &Plan) -> Result<String, PlanError> {
    let mut buf = Vec::new();
    write_csv(plan, &mut buf)?;
    String::from_utf8(buf).map_err(export_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic::ActivityTable;
    use crate::plan::generate_plan;
    use crate::profile::tests::sample_profile;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample_plan() -> Plan {
        let mut profile = sample_profile();
        profile.plan_duration_days = 7;
        generate_plan(
            &profile,
            &ActivityTable::default(),
            NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap()
    }

    #[test]
    fn header_is_stable() {
        let csv = to_csv_string(&sample_plan()).unwrap();
        let first = csv.lines().next().unwrap();
        assert_eq!(first, "Date,Weekday,Exercise,Duration,Intensity,ProjectedWeight");
    }

    #[test]
    fn one_row_per_day() {
        let plan = sample_plan();
        let csv = to_csv_string(&plan).unwrap();
        assert_eq!(csv.lines().count(), plan.len() + 1);
    }

    #[test]
    fn rows_parse_back_with_expected_values() {
        let plan = sample_plan();
        let csv = to_csv_string(&plan).unwrap();
        let mut rdr = csv::Reader::from_reader(csv.as_bytes());
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();

        // 2024-01-06 is a Saturday.
        assert_eq!(&rows[0][0], "2024-01-06");
        assert_eq!(&rows[0][1], "Saturday");
        assert_eq!(&rows[0][4], "Light");
        assert_eq!(&rows[0][5], "70.00");
        assert_eq!(&rows[6][0], "2024-01-12");

        for (row, day) in rows.iter().zip(plan.days()) {
            assert_eq!(&row[2], day.exercise.label());
            assert_eq!(row[3].parse::<u32>().unwrap(), day.duration_minutes);
        }
    }

    #[test]
    fn multi_word_labels_are_not_split() {
        let mut profile = sample_profile();
        profile.plan_duration_days = 7;
        profile.physical_preferences = [crate::profile::Activity::WeightTraining].into();
        let plan = generate_plan(
            &profile,
            &ActivityTable::default(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            &mut StdRng::seed_from_u64(4),
        )
        .unwrap();
        let csv = to_csv_string(&plan).unwrap();
        let second = csv.lines().nth(1).unwrap();
        assert_eq!(second.split(',').count(), CSV_HEADER.len());
        assert!(second.contains("Weight training"));
    }
}
