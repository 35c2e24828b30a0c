mod tracing_init;

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;

use ff_config::{ConnectConfig, HumanDuration, LoggingConfig, TimeSpec};
use ff_core::{
    CopyRun, LogReporter, MeasurementSelector, NameMapper, PointTransformer, QueryTemplate,
    RunMode, TagFilter, TagInjector, TagValueMapper, WindowPlan,
};
use ff_influx::InfluxClient;

/// Copy time-series points between InfluxDB 2.x buckets over a bounded time
/// range, optionally renaming measurements/fields and remapping or injecting
/// tags along the way.
///
/// Re-running the same range re-copies it in full: the copy is idempotent
/// only insofar as the destination overwrites points with an identical
/// measurement, tag set, field, and timestamp. That overwrite behavior is an
/// assumption about the destination store, not something this tool enforces.
#[derive(Debug, Parser)]
#[command(name = "fluxferry", version)]
struct Cli {
    /// Path to the source .influx.toml credentials file.
    #[arg(long, value_name = "FILE")]
    src_config: PathBuf,

    /// Path to the destination .influx.toml credentials file.
    #[arg(long, value_name = "FILE")]
    dst_config: PathBuf,

    #[arg(long)]
    src_bucket: String,

    #[arg(long)]
    dst_bucket: String,

    /// Range start: RFC3339, relative like "-4d", or "now()".
    #[arg(long)]
    start: String,

    /// Range stop; defaults to now.
    #[arg(long)]
    stop: Option<String>,

    /// Copy only this measurement; repeatable.
    #[arg(long = "measurement", value_name = "NAME")]
    measurements: Vec<String>,

    /// Copy measurements matching this regex instead of an explicit list.
    #[arg(long, value_name = "REGEX")]
    measurement_regex: Option<String>,

    /// Copy only this field; repeatable.
    #[arg(long = "field", value_name = "NAME")]
    fields: Vec<String>,

    /// Source tag filter, "key=value" or "key=~/regex/"; repeatable.
    #[arg(long = "tag", value_name = "FILTER")]
    tags: Vec<String>,

    /// Window length for chunked queries, e.g. "30m", "6h", "1d".
    #[arg(long, default_value = "6h")]
    window: String,

    /// Points buffered before each destination write.
    #[arg(long, default_value_t = 5000)]
    batch_size: usize,

    /// Tag value rewrite, "key=PATTERN->REPLACEMENT"; repeatable.
    #[arg(long = "tag-map", value_name = "RULE")]
    tag_maps: Vec<String>,

    /// Measurement rename, "FROM->TO"; repeatable.
    #[arg(long = "measurement-map", value_name = "RULE")]
    measurement_maps: Vec<String>,

    /// Field rename, "FROM->TO"; repeatable.
    #[arg(long = "field-map", value_name = "RULE")]
    field_maps: Vec<String>,

    /// Tag injection, "key=value" or "key=src:PATTERN->REPLACEMENT"; repeatable.
    #[arg(long = "tag-inject", value_name = "RULE")]
    tag_injects: Vec<String>,

    /// Count source records per window; no transform, no write.
    #[arg(long)]
    verify: bool,

    /// Transform and report points without writing them.
    #[arg(long)]
    dry_run: bool,

    /// Debug-level logging.
    #[arg(long, short)]
    verbose: bool,

    /// Also write logs to this file.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("fluxferry: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let logging = LoggingConfig::from_flags(cli.verbose, cli.log_file.clone());
    let _guard = tracing_init::init_tracing(&logging)?;

    // Everything below must fail before the first query does.
    let mode = resolve_mode(cli.verify, cli.dry_run)?;
    let selector = resolve_measurements(&cli.measurements, cli.measurement_regex.as_deref())?;
    let (start, stop) = resolve_range(&cli.start, cli.stop.as_deref(), Utc::now())?;
    let window: HumanDuration = cli
        .window
        .parse()
        .map_err(|e| anyhow::anyhow!("--window: {e}"))?;
    if cli.batch_size == 0 {
        anyhow::bail!("--batch-size must be positive");
    }
    let plan = WindowPlan::new(start, stop, window.as_duration())
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let tag_filters = cli
        .tags
        .iter()
        .map(|s| s.parse::<TagFilter>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow::anyhow!("--tag: {e}"))?;
    let transformer = PointTransformer::new(
        NameMapper::parse_all(&cli.measurement_maps)
            .map_err(|e| anyhow::anyhow!("--measurement-map: {e}"))?,
        NameMapper::parse_all(&cli.field_maps).map_err(|e| anyhow::anyhow!("--field-map: {e}"))?,
        TagValueMapper::parse_all(&cli.tag_maps).map_err(|e| anyhow::anyhow!("--tag-map: {e}"))?,
        TagInjector::parse_all(&cli.tag_injects)
            .map_err(|e| anyhow::anyhow!("--tag-inject: {e}"))?,
    );

    let src_cfg = ConnectConfig::load(&cli.src_config)?;
    let dst_cfg = ConnectConfig::load(&cli.dst_config)?;
    let source =
        InfluxClient::connect(&src_cfg).map_err(|e| anyhow::anyhow!("source client: {e}"))?;
    let destination =
        InfluxClient::connect(&dst_cfg).map_err(|e| anyhow::anyhow!("destination client: {e}"))?;

    tracing::info!(
        domain = "sys",
        start = %start.to_rfc3339(),
        stop = %stop.to_rfc3339(),
        window = %window,
        mode = ?mode,
        src_bucket = %cli.src_bucket,
        dst_bucket = %cli.dst_bucket,
        "starting copy"
    );

    let template = QueryTemplate {
        bucket: cli.src_bucket,
        measurements: selector,
        tag_filters,
        fields: cli.fields,
    };
    let copy = CopyRun::new(
        &source,
        &destination,
        &transformer,
        template,
        cli.dst_bucket,
        mode,
        cli.batch_size,
    )
    .map_err(|e| anyhow::anyhow!("{e}"))?;
    let report = copy
        .run(plan, &mut LogReporter)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    match mode {
        RunMode::Verify => tracing::info!(
            domain = "sys",
            records = report.records,
            windows = report.windows,
            "verify complete"
        ),
        RunMode::DryRun => tracing::info!(
            domain = "sys",
            records = report.records,
            skipped = report.skipped,
            "dry-run complete; nothing written"
        ),
        RunMode::Write => tracing::info!(
            domain = "sys",
            written = report.written,
            skipped = report.skipped,
            windows = report.windows,
            "done"
        ),
    }
    Ok(())
}

fn resolve_mode(verify: bool, dry_run: bool) -> Result<RunMode> {
    match (verify, dry_run) {
        (true, true) => anyhow::bail!("--verify and --dry-run are mutually exclusive"),
        (true, false) => Ok(RunMode::Verify),
        (false, true) => Ok(RunMode::DryRun),
        (false, false) => Ok(RunMode::Write),
    }
}

fn resolve_measurements(names: &[String], regex: Option<&str>) -> Result<MeasurementSelector> {
    match (names.is_empty(), regex) {
        (false, Some(_)) => {
            anyhow::bail!("--measurement and --measurement-regex are mutually exclusive")
        }
        (true, Some(body)) => MeasurementSelector::from_regex(body)
            .map_err(|e| anyhow::anyhow!("--measurement-regex: {e}")),
        (false, None) => Ok(MeasurementSelector::Names(names.to_vec())),
        (true, None) => Ok(MeasurementSelector::All),
    }
}

fn resolve_range(
    start: &str,
    stop: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = start
        .parse::<TimeSpec>()
        .map_err(|e| anyhow::anyhow!("--start: {e}"))?
        .resolve(now);
    let stop = match stop {
        Some(s) => s
            .parse::<TimeSpec>()
            .map_err(|e| anyhow::anyhow!("--stop: {e}"))?
            .resolve(now),
        None => now,
    };
    Ok((start, stop))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
