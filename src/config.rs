use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::{PlanArgs, ProfileArgs};
use crate::error::PlanError;
use crate::metabolic::ActivityTable;
use crate::profile::{ActivityLevel, Profile, ProfileInput};

// Precedence: CLI > env > file > defaults.

const DEFAULT_NARRATIVE_TIMEOUT_SEC: u64 = 120;

const ENV_PREFIX: &str = "FITPLAN_";

/// Resolved planner configuration.
///
/// Built from three layers with precedence CLI > env > file > defaults.
/// `activity_factors` is merged per level rather than replaced wholesale: a
/// file or env entry for one level leaves the other defaults in place.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub activity_factors: ActivityTable,
    /// Command line of the text-generation program. None disables narration.
    pub narrative_cmd: Option<String>,
    /// 0 means wait indefinitely.
    pub narrative_timeout_sec: u64,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    /// CSV destination. None writes to stdout.
    pub output_path: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
    /// Fixed RNG seed for reproducible workout schedules.
    pub seed: Option<u64>,
}

/// TOML-deserializable config file representation. All fields optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    activity_factors: Option<ActivityTable>,
    narrative_cmd: Option<String>,
    narrative_timeout_sec: Option<u64>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
    output_path: Option<PathBuf>,
    summary_path: Option<PathBuf>,
    seed: Option<u64>,
}

/// Intermediate layer where every field is optional, used to merge sources.
#[derive(Debug, Default)]
struct ConfigLayer {
    activity_factors: Option<ActivityTable>,
    narrative_cmd: Option<String>,
    narrative_timeout_sec: Option<u64>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
    output_path: Option<PathBuf>,
    summary_path: Option<PathBuf>,
    seed: Option<u64>,
}

impl PlannerConfig {
    /// Load configuration with precedence: CLI > env > file > defaults.
    ///
    /// `cli_args` is None for subcommands that carry no config flags.
    pub fn load(config_path: Option<&Path>, cli_args: Option<&PlanArgs>) -> anyhow::Result<Self> {
        Self::load_with_env(config_path, cli_args, real_env_var)
    }

    /// Check values that the type system cannot: every activity factor must
    /// be a positive finite number.
    pub fn validate(&self) -> Result<(), PlanError> {
        self.activity_factors.validate()
    }

    pub fn narrative_timeout(&self) -> Option<Duration> {
        match self.narrative_timeout_sec {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Internal constructor that accepts an env-var lookup function,
    /// enabling deterministic testing without process-global mutation.
    fn load_with_env(
        config_path: Option<&Path>,
        cli_args: Option<&PlanArgs>,
        env_fn: fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let file_layer = match config_path {
            Some(path) => load_file_layer(path)?,
            None => ConfigLayer::default(),
        };
        let env_layer = load_env_layer(env_fn)?;
        let cli_layer = cli_args.map(cli_layer_from).unwrap_or_default();

        let merged = merge_layers(file_layer, env_layer, cli_layer);

        Ok(PlannerConfig {
            activity_factors: merged.activity_factors.unwrap_or_default(),
            narrative_cmd: merged.narrative_cmd,
            narrative_timeout_sec: merged
                .narrative_timeout_sec
                .unwrap_or(DEFAULT_NARRATIVE_TIMEOUT_SEC),
            log_level: merged.log_level,
            log_file: merged.log_file,
            output_path: merged.output_path,
            summary_path: merged.summary_path,
            seed: merged.seed,
        })
    }
}

/// Build the validated profile for a run: the `--profile` file (if any)
/// with individual flags layered on top.
pub fn resolve_profile(args: &ProfileArgs) -> Result<Profile, PlanError> {
    let base = match &args.profile {
        Some(path) => ProfileInput::load(path)?,
        None => ProfileInput::default(),
    };
    let profile = base.merge(profile_layer_from(args)).into_profile()?;
    tracing::debug!(
        name = %profile.name,
        days = profile.plan_duration_days,
        limitations = %profile.limitations,
        "profile resolved"
    );
    Ok(profile)
}

fn profile_layer_from(args: &ProfileArgs) -> ProfileInput {
    let non_empty = |v: &Vec<String>| (!v.is_empty()).then(|| v.clone());
    ProfileInput {
        name: args.name.clone(),
        age: args.age,
        sex: args.sex.clone(),
        height_cm: args.height_cm,
        weight_kg: args.weight_kg,
        activity_level: args.activity_level.clone(),
        goal: args.goal.clone(),
        dietary_restrictions: non_empty(&args.restrictions),
        physical_preferences: non_empty(&args.preferences),
        notes: args.notes.clone(),
        limitations: args.limitations.clone(),
        plan_duration_days: args.days,
    }
}

fn load_file_layer(path: &Path) -> anyhow::Result<ConfigLayer> {
    let contents = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
    let fc: FileConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?;
    Ok(ConfigLayer {
        activity_factors: fc.activity_factors,
        narrative_cmd: fc.narrative_cmd,
        narrative_timeout_sec: fc.narrative_timeout_sec,
        log_level: fc.log_level,
        log_file: fc.log_file,
        output_path: fc.output_path,
        summary_path: fc.summary_path,
        seed: fc.seed,
    })
}

fn real_env_var(suffix: &str) -> Option<String> {
    let key = format!("{ENV_PREFIX}{suffix}");
    env::var(&key).ok().filter(|v| !v.is_empty())
}

fn load_env_layer(env_fn: fn(&str) -> Option<String>) -> Result<ConfigLayer, PlanError> {
    Ok(ConfigLayer {
        activity_factors: parse_env_activity_factors(env_fn, "ACTIVITY_FACTORS")?,
        narrative_cmd: env_fn("NARRATIVE_CMD"),
        narrative_timeout_sec: parse_env_u64(env_fn, "NARRATIVE_TIMEOUT_SEC")?,
        log_level: env_fn("LOG_LEVEL"),
        log_file: env_fn("LOG_FILE").map(PathBuf::from),
        output_path: env_fn("OUTPUT_PATH").map(PathBuf::from),
        summary_path: env_fn("SUMMARY_PATH").map(PathBuf::from),
        seed: parse_env_u64(env_fn, "SEED")?,
    })
}

fn parse_env_u64(
    env_fn: fn(&str) -> Option<String>,
    suffix: &str,
) -> Result<Option<u64>, PlanError> {
    match env_fn(suffix) {
        Some(s) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| PlanError::ConfigEnvParseError {
                var: format!("{ENV_PREFIX}{suffix}"),
                detail: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Parse `FITPLAN_ACTIVITY_FACTORS`: comma-separated `level=factor` pairs,
/// e.g. "sedentary=1.25,very_active=1.8". Any malformed entry fails the
/// whole variable.
fn parse_env_activity_factors(
    env_fn: fn(&str) -> Option<String>,
    suffix: &str,
) -> Result<Option<ActivityTable>, PlanError> {
    let Some(raw) = env_fn(suffix) else {
        return Ok(None);
    };
    let fail = |detail: String| PlanError::ConfigEnvParseError {
        var: format!("{ENV_PREFIX}{suffix}"),
        detail,
    };

    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (level, factor) = entry
                .split_once('=')
                .ok_or_else(|| fail(format!("expected level=factor, got '{entry}'")))?;
            let level: ActivityLevel = level
                .trim()
                .parse()
                .map_err(|e: PlanError| fail(e.to_string()))?;
            let factor: f64 = factor
                .trim()
                .parse()
                .map_err(|e| fail(format!("bad factor for '{}': {e}", level.key())))?;
            Ok((level, factor))
        })
        .collect::<Result<ActivityTable, PlanError>>()
        .map(Some)
}

fn cli_layer_from(args: &PlanArgs) -> ConfigLayer {
    ConfigLayer {
        activity_factors: None,
        narrative_cmd: args.narrative_cmd.clone(),
        narrative_timeout_sec: args.narrative_timeout_sec,
        log_level: args.log_level.clone(),
        log_file: args.log_file.clone(),
        output_path: args.output.clone(),
        summary_path: args.summary.clone(),
        seed: args.seed,
    }
}

/// Merge three layers. For each field, pick CLI first, then env, then file.
/// Activity factors stack: defaults, then file entries, then env entries.
fn merge_layers(file: ConfigLayer, env: ConfigLayer, cli: ConfigLayer) -> ConfigLayer {
    let activity_factors = [file.activity_factors, env.activity_factors, cli.activity_factors]
        .into_iter()
        .flatten()
        .fold(ActivityTable::default(), |acc, layer| acc.overlay(&layer));

    ConfigLayer {
        activity_factors: Some(activity_factors),
        narrative_cmd: cli.narrative_cmd.or(env.narrative_cmd).or(file.narrative_cmd),
        narrative_timeout_sec: cli
            .narrative_timeout_sec
            .or(env.narrative_timeout_sec)
            .or(file.narrative_timeout_sec),
        log_level: cli.log_level.or(env.log_level).or(file.log_level),
        log_file: cli.log_file.or(env.log_file).or(file.log_file),
        output_path: cli.output_path.or(env.output_path).or(file.output_path),
        summary_path: cli.summary_path.or(env.summary_path).or(file.summary_path),
        seed: cli.seed.or(env.seed).or(file.seed),
    }
}
