use std::{
    io::Write,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use digital_diet_features::{FormAnswers, Gender, Location, Slider, controls};
use tracing_subscriber::EnvFilter;

use crate::{Assessment, MODEL_PATH, Outcome, model, render, run_form};

#[derive(Parser, Debug)]
#[command(name = "digital-diet")]
#[command(about = render::PAGE_TITLE, long_about = render::INTRO)]
pub struct Cli {
    #[arg(long, value_name = "HOURS", help = controls::SCREEN_TIME.label)]
    #[arg(default_value_t = controls::SCREEN_TIME.default, value_parser = parse_screen_time)]
    pub screen_time: f32,

    #[arg(long, value_name = "1-10", help = controls::SLEEP_QUALITY.label)]
    #[arg(default_value_t = controls::SLEEP_QUALITY.default)]
    #[arg(value_parser = whole_step_parser(&controls::SLEEP_QUALITY))]
    pub sleep_quality: u8,

    #[arg(long, value_name = "HOURS", help = controls::SOCIAL_MEDIA.label)]
    #[arg(default_value_t = controls::SOCIAL_MEDIA.default, value_parser = parse_social_media)]
    pub social_media: f32,

    #[arg(long, value_name = "SCORE", help = controls::DEPRESSION.label)]
    #[arg(default_value_t = controls::DEPRESSION.default, value_parser = parse_depression)]
    pub depression: f32,

    #[arg(long, value_name = "SCORE", help = controls::ANXIETY.label)]
    #[arg(default_value_t = controls::ANXIETY.default, value_parser = parse_anxiety)]
    pub anxiety: f32,

    #[arg(long, value_name = "LEVEL", help = controls::STRESS.label)]
    #[arg(default_value_t = controls::STRESS.default, value_parser = parse_stress)]
    pub stress: f32,

    #[arg(long, value_name = "YEARS", help = controls::AGE.label)]
    #[arg(default_value_t = controls::AGE.default)]
    #[arg(value_parser = whole_step_parser(&controls::AGE))]
    pub age: u8,

    #[arg(long, help = Gender::LABEL, value_enum, ignore_case = true)]
    #[arg(default_value_t = Gender::Male)]
    pub gender: Gender,

    #[arg(long, help = Location::LABEL, value_enum, ignore_case = true)]
    #[arg(default_value_t = Location::Urban)]
    pub location: Location,

    /// Assess every form in a JSON array of answers instead of the flags
    #[arg(long, value_name = "PATH")]
    pub answers: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Show how the model works
    #[arg(long)]
    pub explain: bool,

    /// Verbose mode (debug logs and inference time)
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// How a run of the form ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Halted,
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Completed => Self::SUCCESS,
            RunStatus::Halted => Self::FAILURE,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Risk level, probabilities and headings (default)
    Human,
    /// Features, class and probabilities as JSON
    Json,
    /// Just the class label (0 or 1)
    Class,
    /// Just P(at-risk) as a float 0-1
    Probability,
}

impl Cli {
    /// Form answers set by the control flags.
    #[must_use]
    pub fn form_answers(&self) -> FormAnswers {
        FormAnswers::default()
            .with_screen_time(self.screen_time)
            .with_sleep_quality(self.sleep_quality)
            .with_social_media(self.social_media)
            .with_depression(self.depression)
            .with_anxiety(self.anxiety)
            .with_stress(self.stress)
            .with_age(self.age)
            .with_gender(self.gender)
            .with_location(self.location)
    }
}

fn parse_on_track(raw: &str, slider: &Slider<f32>) -> Result<f32, String> {
    let value: f32 = raw
        .parse()
        .map_err(|_| format!("`{raw}` is not a number"))?;
    if slider.contains(value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in {}..={}", slider.min, slider.max))
    }
}

fn whole_step_parser(slider: &Slider<u8>) -> clap::builder::RangedI64ValueParser<u8> {
    clap::value_parser!(u8).range(i64::from(slider.min)..=i64::from(slider.max))
}

fn parse_screen_time(raw: &str) -> Result<f32, String> {
    parse_on_track(raw, &controls::SCREEN_TIME)
}

fn parse_social_media(raw: &str) -> Result<f32, String> {
    parse_on_track(raw, &controls::SOCIAL_MEDIA)
}

fn parse_depression(raw: &str) -> Result<f32, String> {
    parse_on_track(raw, &controls::DEPRESSION)
}

fn parse_anxiety(raw: &str) -> Result<f32, String> {
    parse_on_track(raw, &controls::ANXIETY)
}

fn parse_stress(raw: &str) -> Result<f32, String> {
    parse_on_track(raw, &controls::STRESS)
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the form against the model at [`MODEL_PATH`], writing to stdout.
pub fn run(cli: &Cli) -> Result<ExitCode> {
    let stdout = std::io::stdout();
    execute(cli, Path::new(MODEL_PATH), &mut stdout.lock()).map(ExitCode::from)
}

/// Run the form against the model at `model_path`, writing results to `out`.
///
/// A missing or unusable model is reported on stderr and yields
/// [`RunStatus::Halted`] without reading any answers.
pub fn execute<W: Write>(cli: &Cli, model_path: &Path, out: &mut W) -> Result<RunStatus> {
    if cli.no_color {
        colored::control::set_override(false);
    }
    let start = cli.verbose.then(Instant::now);

    let outcome = run_form(|| model::load(model_path), || collect_answers(cli))?;

    if let Some(line) = timing_line(&outcome, start) {
        eprintln!("{line}");
    }
    match outcome {
        Outcome::Halted(err) => {
            eprintln!("{}", err.to_string().as_str().red().bold());
            Ok(RunStatus::Halted)
        }
        Outcome::Completed(assessments) => {
            output_results(&assessments, cli, out)?;
            Ok(RunStatus::Completed)
        }
    }
}

/// Elapsed time for `--verbose`; nothing when the run halted before inference.
fn timing_line(outcome: &Outcome, start: Option<Instant>) -> Option<String> {
    match (outcome, start) {
        (Outcome::Completed(_), Some(start_time)) => Some(format!(
            "Load and inference time: {:?}",
            start_time.elapsed()
        )),
        _ => None,
    }
}

/// Answers come from `--answers` when given, otherwise from the control flags.
fn collect_answers(cli: &Cli) -> Result<Vec<FormAnswers>> {
    let Some(path) = &cli.answers else {
        return Ok(vec![cli.form_answers()]);
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read answers file: {}", path.display()))?;
    let answers: Vec<FormAnswers> = serde_json::from_str(&contents)
        .with_context(|| "Failed to parse answers as a JSON array of forms")?;
    Ok(answers.into_iter().map(FormAnswers::clamped).collect())
}

fn assessment_json(assessment: &Assessment) -> serde_json::Value {
    serde_json::json!({
        "features": assessment.features,
        "class": i64::from(assessment.level),
        "class_label": assessment.level.label(),
        "probabilities": {
            "low_risk": assessment.probabilities.low_risk(),
            "high_risk": assessment.probabilities.at_risk(),
        },
    })
}

fn output_results<W: Write>(assessments: &[Assessment], cli: &Cli, out: &mut W) -> Result<()> {
    match cli.format {
        OutputFormat::Json => {
            let json = match assessments {
                [single] if cli.answers.is_none() => assessment_json(single),
                many => serde_json::Value::Array(many.iter().map(assessment_json).collect()),
            };
            writeln!(out, "{}", serde_json::to_string(&json)?)?;
        }
        OutputFormat::Class => {
            for assessment in assessments {
                writeln!(out, "{}", i64::from(assessment.level))?;
            }
        }
        OutputFormat::Probability => {
            for assessment in assessments {
                writeln!(out, "{:.4}", assessment.probabilities.at_risk())?;
            }
        }
        OutputFormat::Human => {
            writeln!(out, "{}", render::TITLE.bold())?;
            writeln!(out, "{}", render::INTRO)?;
            writeln!(out, "{}", render::CREDIT.italic())?;
            for assessment in assessments {
                writeln!(out)?;
                output_human(assessment, out)?;
            }
            if cli.explain {
                writeln!(out)?;
                writeln!(out, "{}", render::EXPLAIN_HEADING.bold())?;
                writeln!(out, "{}", render::EXPLANATION)?;
            }
        }
    }
    Ok(())
}

fn output_human<W: Write>(assessment: &Assessment, out: &mut W) -> Result<()> {
    let [result_heading, verdict, probability_heading, low_risk, high_risk] =
        render::result_lines(assessment);
    let verdict = if assessment.level.is_at_risk() {
        verdict.as_str().red().bold()
    } else {
        verdict.as_str().green().bold()
    };
    writeln!(out, "{}", result_heading.as_str().cyan().bold())?;
    writeln!(out, "{verdict}")?;
    writeln!(out, "{}", probability_heading.as_str().cyan().bold())?;
    writeln!(out, "{low_risk}")?;
    writeln!(out, "{high_risk}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_controls() {
        let cli = Cli::try_parse_from(["digital-diet"]).expect("defaults parse");
        assert_eq!(cli.form_answers(), FormAnswers::default());
        assert_eq!(cli.format, OutputFormat::Human);
    }

    #[test]
    fn test_scenario_flags() {
        let cli = Cli::try_parse_from([
            "digital-diet",
            "--screen-time",
            "8.0",
            "--sleep-quality",
            "3",
            "--social-media",
            "4.0",
            "--depression",
            "7.0",
            "--anxiety",
            "6.0",
            "--stress",
            "8.0",
            "--age",
            "19",
            "--gender",
            "female",
            "--location",
            "urban",
        ])
        .expect("scenario parses");
        let row = cli.form_answers().to_features().to_row();
        assert_eq!(row, [8.0, 3.0, 4.0, 7.0, 6.0, 8.0, 19.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_out_of_range_flags_are_rejected() {
        for args in [
            ["digital-diet", "--screen-time", "15.5"],
            ["digital-diet", "--social-media", "-1"],
            ["digital-diet", "--stress", "11"],
            ["digital-diet", "--sleep-quality", "0"],
            ["digital-diet", "--age", "12"],
            ["digital-diet", "--age", "66"],
            ["digital-diet", "--depression", "abc"],
        ] {
            assert!(Cli::try_parse_from(args).is_err(), "{args:?} should be rejected");
        }
    }

    #[test]
    fn test_range_edges_are_accepted() {
        let cli = Cli::try_parse_from([
            "digital-diet",
            "--screen-time",
            "15",
            "--social-media",
            "0",
            "--age",
            "65",
            "--sleep-quality",
            "1",
        ])
        .expect("edges parse");
        assert!((cli.screen_time - 15.0).abs() < f32::EPSILON);
        assert_eq!(cli.age, 65);
    }

    #[test]
    fn test_timing_only_reported_after_inference() {
        let start = Some(Instant::now());
        let halted = Outcome::Halted(model::LoadError::NotFound {
            path: PathBuf::from(MODEL_PATH),
        });
        assert_eq!(timing_line(&halted, start), None);

        let completed = Outcome::Completed(Vec::new());
        let line = timing_line(&completed, start).expect("timing after inference");
        assert!(line.starts_with("Load and inference time:"));
        assert_eq!(timing_line(&completed, None), None);
    }

    #[test]
    fn test_missing_model_halts_with_failure() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cli = Cli::try_parse_from(["digital-diet"]).expect("defaults parse");
        let mut out = Vec::new();
        let status =
            execute(&cli, &dir.path().join(MODEL_PATH), &mut out).expect("halt is not an error");
        assert_eq!(status, RunStatus::Halted);
        assert!(out.is_empty());
    }
}
