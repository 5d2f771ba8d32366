use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// fitplan: wellness plan generator.
///
/// Computes BMR, TDEE and macro targets for a profile, schedules workouts
/// with a projected weight trend, and exports the plan as CSV.
#[derive(Debug, Parser)]
#[command(name = "fitplan", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a plan for a profile and export it as CSV.
    Plan(PlanArgs),

    /// Print the narrative request prompt for a profile.
    Prompt(PromptArgs),
}

/// Profile fields. `--profile` loads a TOML file; any flag given here
/// overrides the corresponding file value.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ProfileArgs {
    /// Path to a TOML profile file.
    #[arg(long)]
    pub profile: Option<PathBuf>,

    #[arg(long)]
    pub name: Option<String>,

    /// Age in years (18-100).
    #[arg(long)]
    pub age: Option<i64>,

    /// "male" or "female".
    #[arg(long)]
    pub sex: Option<String>,

    /// Height in centimetres (100-250).
    #[arg(long)]
    pub height_cm: Option<i64>,

    /// Weight in kilograms (30-300).
    #[arg(long)]
    pub weight_kg: Option<f64>,

    /// e.g. "Sedentary", "Moderately active".
    #[arg(long)]
    pub activity_level: Option<String>,

    /// "Weight loss", "Muscle gain", "Maintenance" or "Performance".
    #[arg(long)]
    pub goal: Option<String>,

    /// Dietary restriction (repeatable), e.g. "Vegan".
    #[arg(long = "restriction")]
    pub restrictions: Vec<String>,

    /// Preferred activity (repeatable), e.g. "Running".
    #[arg(long = "prefer")]
    pub preferences: Vec<String>,

    /// Free-text notes passed to the narrative prompt.
    #[arg(long)]
    pub notes: Option<String>,

    /// Physical limitations (free text; recorded, not used for selection).
    #[arg(long)]
    pub limitations: Option<String>,

    /// Plan length in days: 7, 14, 21 or 30.
    #[arg(long)]
    pub days: Option<i64>,
}

/// Arguments for the `plan` subcommand.
///
/// Settings other than the profile can also come from a config file or
/// `FITPLAN_*` env vars. Precedence: CLI > env > file.
#[derive(Debug, Clone, clap::Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Path to a TOML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// First day of the plan (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Seed for workout selection; omit for a random schedule.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the CSV plan here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Also write a JSON plan summary to this path.
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Request narrative recommendations from the configured generator.
    #[arg(long, default_value_t = false)]
    pub narrate: bool,

    /// Text-generation command; the prompt is written to its stdin.
    #[arg(long)]
    pub narrative_cmd: Option<String>,

    /// Timeout for the narrative command in seconds (0 = no timeout).
    #[arg(long)]
    pub narrative_timeout_sec: Option<u64>,

    /// Log level filter (default: "info"). Overridden by FITPLAN_LOG.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Append structured JSON logs to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Arguments for the `prompt` subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct PromptArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Path to a TOML configuration file (for activity factors).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the prompt to this file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}
