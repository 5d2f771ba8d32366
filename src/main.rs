use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info, warn};

use fitplan::cli::{Cli, Commands, PlanArgs, PromptArgs};
use fitplan::config::{self, PlannerConfig};
use fitplan::error::PlanError;
use fitplan::export;
use fitplan::narrative::CommandNarrator;
use fitplan::plan;
use fitplan::prompt;
use fitplan::session::Session;
use fitplan::summary;

/// Exit code for rejected profile input.
const EXIT_INVALID_INPUT: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            match e.downcast_ref::<PlanError>() {
                Some(pe) if pe.is_validation() => ExitCode::from(EXIT_INVALID_INPUT),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Plan(args) => run_plan(&args),
        Commands::Prompt(args) => run_prompt(&args),
    }
}

fn run_plan(args: &PlanArgs) -> anyhow::Result<()> {
    let config = PlannerConfig::load(args.config.as_deref(), Some(args))?;

    fitplan::logging::init(config.log_level.as_deref(), config.log_file.as_deref())?;

    config.validate()?;

    let profile = config::resolve_profile(&args.profile)?;
    let start_date = args.start_date.unwrap_or_else(|| Local::now().date_naive());
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(
        name = %profile.name,
        goal = profile.goal.label(),
        days = profile.plan_duration_days,
        start = %start_date,
        seeded = config.seed.is_some(),
        "plan requested"
    );

    let mut session = Session::new();
    let plan = session.submit(profile.clone(), &config.activity_factors, start_date, &mut rng)?;

    match &config.output_path {
        Some(path) => {
            create_parent_dir(path)?;
            let file = fs::File::create(path)
                .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", path.display()))?;
            export::write_csv(plan, file)?;
            info!(path = %path.display(), rows = plan.len(), "plan exported");
        }
        None => export::write_csv(plan, io::stdout().lock())?,
    }

    if let Some(path) = &config.summary_path {
        summary::write_summary(&summary::build_summary(&profile, plan), path)?;
        info!(path = %path.display(), "summary written");
    }

    if args.narrate {
        narrate(&mut session, &config);
    }

    Ok(())
}

/// Narration is best effort: failures are logged and the exported plan
/// stands.
fn narrate(session: &mut Session, config: &PlannerConfig) {
    let Some(command) = config.narrative_cmd.as_deref() else {
        warn!("--narrate given but no narrative_cmd is configured; skipping");
        return;
    };
    let narrator = match CommandNarrator::from_command_line(command, config.narrative_timeout()) {
        Ok(n) => n,
        Err(e) => {
            warn!(err = %e, "narrative skipped");
            return;
        }
    };
    let text = match session.narrate(&narrator) {
        Ok(text) => text,
        Err(_) => return,
    };

    // With CSV on stdout the narrative goes to stderr to keep the CSV clean.
    let written = if config.output_path.is_some() {
        writeln!(io::stdout().lock(), "{text}")
    } else {
        writeln!(io::stderr().lock(), "\n{text}")
    };
    if let Err(e) = written {
        warn!(err = %e, "failed to print narrative");
    }
}

fn run_prompt(args: &PromptArgs) -> anyhow::Result<()> {
    let config = PlannerConfig::load(args.config.as_deref(), None)?;

    fitplan::logging::init(config.log_level.as_deref(), config.log_file.as_deref())?;

    config.validate()?;

    let profile = config::resolve_profile(&args.profile)?;
    let energy = plan::compute_energy_profile(&profile, &config.activity_factors)?;
    let text = prompt::build_prompt(&profile, &energy);

    match &args.output {
        Some(path) => {
            create_parent_dir(path)?;
            fs::write(path, &text)
                .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn create_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_flags() -> Vec<&'static str> {
        vec![
            "--name",
            "Ana",
            "--age",
            "30",
            "--sex",
            "male",
            "--height-cm",
            "170",
            "--weight-kg",
            "70",
            "--activity-level",
            "Moderately active",
            "--goal",
            "Weight loss",
            "--prefer",
            "Running",
            "--days",
            "7",
        ]
    }

    fn plan_cli(extra: &[&str]) -> Cli {
        let mut argv = vec!["fitplan", "plan"];
        argv.extend(profile_flags());
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn plan_writes_csv_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out").join("plan.csv");
        let summary_path = dir.path().join("summary.json");

        let cli = plan_cli(&[
            "--start-date",
            "2024-01-01",
            "--seed",
            "5",
            "--output",
            out.to_str().unwrap(),
            "--summary",
            summary_path.to_str().unwrap(),
        ]);
        run(cli).expect("plan should succeed");

        let csv = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 8, "header plus seven days");
        assert_eq!(lines[0], "Date,Weekday,Exercise,Duration,Intensity,ProjectedWeight");
        assert!(lines[1].starts_with("2024-01-01,Monday,Running,"), "{}", lines[1]);
        assert!(lines[7].starts_with("2024-01-07,Sunday,"), "{}", lines[7]);

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&summary_path).unwrap()).unwrap();
        assert_eq!(summary["days"], 7);
    }

    #[test]
    fn same_seed_gives_same_csv() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        for path in [&a, &b] {
            let cli = plan_cli(&[
                "--start-date",
                "2024-03-04",
                "--seed",
                "11",
                "--output",
                path.to_str().unwrap(),
            ]);
            run(cli).unwrap();
        }
        assert_eq!(fs::read_to_string(&a).unwrap(), fs::read_to_string(&b).unwrap());
    }

    #[test]
    fn invalid_profile_is_validation_error() {
        let mut argv = vec!["fitplan", "plan"];
        argv.extend(
            profile_flags()
                .into_iter()
                .map(|a| if a == "30" { "12" } else { a }),
        );
        let cli = Cli::try_parse_from(argv).unwrap();

        let err = run(cli).unwrap_err();
        let pe = err.downcast_ref::<PlanError>().expect("PlanError");
        assert!(pe.is_validation(), "{pe:?}");
        assert!(format!("{err}").contains("age"), "{err}");
    }

    #[test]
    fn unknown_goal_is_rejected() {
        let mut argv = vec!["fitplan", "plan"];
        argv.extend(
            profile_flags()
                .into_iter()
                .map(|a| if a == "Weight loss" { "Flexibility" } else { a }),
        );
        let err = run(Cli::try_parse_from(argv).unwrap()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlanError>(),
            Some(PlanError::UnknownGoal { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn narration_failure_does_not_fail_run() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plan.csv");
        let cli = plan_cli(&[
            "--seed",
            "1",
            "--output",
            out.to_str().unwrap(),
            "--narrate",
            "--narrative-cmd",
            "false",
        ]);
        run(cli).expect("plan should succeed even when narration fails");
        assert!(out.exists());
    }

    #[test]
    fn prompt_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("prompt.txt");
        let mut argv = vec!["fitplan", "prompt"];
        argv.extend(profile_flags());
        argv.extend(["--output", out.to_str().unwrap()]);

        run(Cli::try_parse_from(argv).unwrap()).unwrap();

        let text = fs::read_to_string(&out).unwrap();
        for section in prompt::SECTIONS {
            assert!(text.contains(section), "missing {section}");
        }
        assert!(text.contains("---NAME---\nAna\n---NAME---"));
    }
}
