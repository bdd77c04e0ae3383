//! sfweights CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use sf_io::{DEFAULT_PT_KEY, DEFAULT_SCORE_KEY, ProcessOptions};
use sf_lookup::{CalibrationField, Sample, ScaleFactorCorrector, WeightConvention};

mod apply;

#[derive(Parser)]
#[command(name = "sfweights")]
#[command(about = "sfweights - Jet-tagger scale factors for event files")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add SF_TXbb, SF_TXbb_up and SF_TXbb_down to event files
    Apply {
        /// Directory holding `<dataset>.parquet` inputs
        #[arg(long)]
        input_dir: PathBuf,

        /// Datasets to process, in order
        #[arg(long, alias = "signal-types", num_args = 1.., required = true)]
        datasets: Vec<String>,

        /// Directory receiving `<dataset>.parquet` outputs
        #[arg(long)]
        output_dir: PathBuf,

        /// Directory holding global_cfg.json and sf_eff_values.json
        #[arg(long, default_value = "jsons")]
        json_dir: PathBuf,

        /// Jet pt column
        #[arg(long, default_value = DEFAULT_PT_KEY)]
        pt_key: String,

        /// Tagger score column
        #[arg(long, default_value = DEFAULT_SCORE_KEY)]
        score_key: String,

        /// Real data: all weights are 1
        #[arg(long)]
        is_data: bool,

        /// Events per batch (-1 = whole file)
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        chunk_size: i64,

        /// Trusted score range `LO:HI`; events outside get SF = 1
        #[arg(long, value_name = "LO:HI", allow_hyphen_values = true)]
        score_range: Option<String>,

        /// Trusted pt range `LO:HI`; events outside get SF = 1
        #[arg(long, value_name = "LO:HI", allow_hyphen_values = true)]
        pt_range: Option<String>,

        /// How SF_TXbb_up / SF_TXbb_down are built
        #[arg(long, value_enum, default_value_t = ConventionArg::Stacked)]
        convention: ConventionArg,
    },

    /// Look up the calibration of a single (score, pt) pair (pretty JSON)
    Query {
        /// Directory holding global_cfg.json and sf_eff_values.json
        #[arg(long, default_value = "jsons")]
        json_dir: PathBuf,

        /// Tagger score
        #[arg(long, allow_negative_numbers = true)]
        score: f64,

        /// Jet pt
        #[arg(long, allow_negative_numbers = true)]
        pt: f64,

        /// Calibration field
        #[arg(long, value_enum, default_value_t = VariationArg::Final)]
        variation: VariationArg,

        /// Also report the tagging efficiency of this sample
        #[arg(long, value_enum)]
        efficiency: Option<SampleArg>,

        /// Efficiency key: `final` or a mode name
        #[arg(long, default_value = sf_lookup::FINAL_EFFICIENCY)]
        eff_key: String,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print working-point and pt boundaries (pretty JSON)
    Boundaries {
        /// Directory holding global_cfg.json and sf_eff_values.json
        #[arg(long, default_value = "jsons")]
        json_dir: PathBuf,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConventionArg {
    /// SF ± restricted (central ± delta)
    Stacked,
    /// SF ± restricted delta
    Delta,
}

impl From<ConventionArg> for WeightConvention {
    fn from(c: ConventionArg) -> Self {
        match c {
            ConventionArg::Stacked => WeightConvention::Stacked,
            ConventionArg::Delta => WeightConvention::Delta,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariationArg {
    Final,
    Jer,
    Jes,
}

impl From<VariationArg> for CalibrationField {
    fn from(v: VariationArg) -> Self {
        match v {
            VariationArg::Final => CalibrationField::Final,
            VariationArg::Jer => CalibrationField::Jer,
            VariationArg::Jes => CalibrationField::Jes,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SampleArg {
    Mc,
    Data,
}

impl From<SampleArg> for Sample {
    fn from(s: SampleArg) -> Self {
        match s {
            SampleArg::Mc => Sample::Mc,
            SampleArg::Data => Sample::Data,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Apply {
            input_dir,
            datasets,
            output_dir,
            json_dir,
            pt_key,
            score_key,
            is_data,
            chunk_size,
            score_range,
            pt_range,
            convention,
        } => {
            let options = ProcessOptions {
                score_key,
                pt_key,
                is_data,
                chunk_size: apply::parse_chunk_size(chunk_size)?,
                weights: apply::weight_options(
                    score_range.as_deref(),
                    pt_range.as_deref(),
                    convention.into(),
                )?,
            };
            apply::cmd_apply(apply::ApplyArgs {
                input_dir: &input_dir,
                output_dir: &output_dir,
                json_dir: &json_dir,
                datasets: &datasets,
                options,
            })
        }
        Commands::Query { json_dir, score, pt, variation, efficiency, eff_key, output } => {
            cmd_query(
                &json_dir,
                score,
                pt,
                variation.into(),
                efficiency.map(Into::into),
                &eff_key,
                output.as_ref(),
            )
        }
        Commands::Boundaries { json_dir, output } => cmd_boundaries(&json_dir, output.as_ref()),
    }
}

fn load_corrector(json_dir: &Path) -> Result<ScaleFactorCorrector> {
    ScaleFactorCorrector::from_json_dir(json_dir)
        .with_context(|| format!("loading scale factors from {}", json_dir.display()))
}

fn cmd_query(
    json_dir: &Path,
    score: f64,
    pt: f64,
    field: CalibrationField,
    sample: Option<Sample>,
    eff_key: &str,
    output: Option<&PathBuf>,
) -> Result<()> {
    let corrector = load_corrector(json_dir)?;
    let binning = corrector.binning();
    let key = binning.resolve(score, pt)?;
    let v = corrector.variation_at(key, field.as_str())?;

    let mut out = serde_json::json!({
        "score": score,
        "pt": pt,
        "key": binning.key_name(key),
        "variation": field.as_str(),
        "central": v.central,
        "high": v.high,
        "low": v.low,
        "up": v.up(),
        "down": v.down(),
    });
    if let Some(sample) = sample {
        let eff = corrector.efficiency_at(key, sample, eff_key)?;
        out["efficiency"] = serde_json::json!({
            "sample": sample.as_str(),
            "key": eff_key,
            "value": eff,
        });
    }
    write_json(output, out)
}

fn cmd_boundaries(json_dir: &Path, output: Option<&PathBuf>) -> Result<()> {
    let corrector = load_corrector(json_dir)?;
    let wps: Vec<serde_json::Value> = corrector
        .wp_boundaries()
        .iter()
        .map(|wp| serde_json::json!({"name": wp.name, "low": wp.low, "high": wp.high}))
        .collect();
    let pts: Vec<serde_json::Value> = corrector
        .pt_boundaries()
        .bins()
        .map(|bin| {
            serde_json::json!({
                "key": bin.key(),
                "low": bin.low,
                "high": bin.high,
                "open_ended": bin.open_ended,
            })
        })
        .collect();
    write_json(output, serde_json::json!({"working_points": wps, "pt_bins": pts}))
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
