//! `sfweights apply`: add scale-factor weights to event files.

use anyhow::{Context, Result};
use std::path::Path;

use sf_io::{ProcessOptions, process_dataset};
use sf_lookup::{InputRange, ScaleFactorLookup, WeightConvention, WeightOptions};

/// Parse a `lo:hi` range argument.
pub fn parse_range(s: &str) -> Result<InputRange> {
    let Some((lo, hi)) = s.split_once(':') else {
        anyhow::bail!("invalid range '{s}': expected 'low:high'");
    };
    let lo: f64 = lo.trim().parse().context(format!("bad low bound in '{s}'"))?;
    let hi: f64 = hi.trim().parse().context(format!("bad high bound in '{s}'"))?;
    if lo.is_nan() || hi.is_nan() || lo > hi {
        anyhow::bail!("invalid range '{s}': low bound above high bound");
    }
    Ok(InputRange::new(lo, hi))
}

/// `-1` → whole file, `N > 0` → batches of `N` rows.
pub fn parse_chunk_size(n: i64) -> Result<Option<usize>> {
    match n {
        -1 => Ok(None),
        n if n > 0 => Ok(Some(usize::try_from(n).context("chunk size too large")?)),
        n => anyhow::bail!("invalid --chunk-size {n}: expected -1 or a positive row count"),
    }
}

/// Arguments of one `apply` run, already parsed.
pub struct ApplyArgs<'a> {
    pub input_dir: &'a Path,
    pub output_dir: &'a Path,
    pub json_dir: &'a Path,
    pub datasets: &'a [String],
    pub options: ProcessOptions,
}

pub fn cmd_apply(args: ApplyArgs<'_>) -> Result<()> {
    if args.datasets.is_empty() {
        anyhow::bail!("at least one dataset is required");
    }

    // data mode never reads the table
    let lookup = if args.options.is_data {
        None
    } else {
        Some(
            ScaleFactorLookup::from_json_dir(args.json_dir).with_context(|| {
                format!("loading scale factors from {}", args.json_dir.display())
            })?,
        )
    };

    for dataset in args.datasets {
        let summary = process_dataset(
            args.input_dir,
            args.output_dir,
            dataset,
            lookup.as_ref(),
            &args.options,
        )
        .with_context(|| format!("processing dataset '{dataset}'"))?;

        tracing::info!(
            dataset = %dataset,
            entries = summary.entries,
            batches = summary.batches,
            "dataset done"
        );
    }
    Ok(())
}

pub fn weight_options(
    score_range: Option<&str>,
    pt_range: Option<&str>,
    convention: WeightConvention,
) -> Result<WeightOptions> {
    Ok(WeightOptions {
        score_range: score_range.map(parse_range).transpose().context("--score-range")?,
        pt_range: pt_range.map(parse_range).transpose().context("--pt-range")?,
        convention,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_parse() {
        let r = parse_range("0.9:1.0").unwrap();
        assert_eq!((r.min, r.max), (0.9, 1.0));
        let r = parse_range("-0.5: 2").unwrap();
        assert_eq!((r.min, r.max), (-0.5, 2.0));
        assert!(parse_range("0.9").is_err());
        assert!(parse_range("a:1").is_err());
        assert!(parse_range("1:0").is_err());
    }

    #[test]
    fn chunk_sizes_parse() {
        assert_eq!(parse_chunk_size(-1).unwrap(), None);
        assert_eq!(parse_chunk_size(500).unwrap(), Some(500));
        assert!(parse_chunk_size(0).is_err());
        assert!(parse_chunk_size(-3).is_err());
    }
}
