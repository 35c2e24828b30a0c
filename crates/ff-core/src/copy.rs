use chrono::{DateTime, SecondsFormat, Utc};
use orion_error::prelude::*;

use crate::contract::{SeriesReader, SeriesWriter};
use crate::error::{CopyReason, CopyResult};
use crate::query::QueryTemplate;
use crate::record::OutputPoint;
use crate::rule::PointTransformer;
use crate::window::{TimeWindow, WindowPlan};

// ---------------------------------------------------------------------------
// RunMode / counters
// ---------------------------------------------------------------------------

/// How transformed points leave the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Batch and write to the destination bucket.
    Write,
    /// Transform and report each point; write nothing.
    DryRun,
    /// Count source records per window; no transform, no write.
    Verify,
}

/// Counters for one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowStats {
    /// Records pulled from the source stream.
    pub records: u64,
    /// Points flushed to the destination.
    pub written: u64,
    /// Records rejected as malformed.
    pub skipped: u64,
}

/// Whole-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub windows: usize,
    pub records: u64,
    pub written: u64,
    pub skipped: u64,
}

impl CopyReport {
    fn absorb(&mut self, stats: WindowStats) {
        self.windows += 1;
        self.records += stats.records;
        self.written += stats.written;
        self.skipped += stats.skipped;
    }
}

// ---------------------------------------------------------------------------
// Reporter — run-scoped progress sink
// ---------------------------------------------------------------------------

/// Run-scoped progress sink. Window progress and dry-run output flow through
/// this instead of global logger state, so tests can capture them.
pub trait Reporter {
    fn window_begin(&mut self, index: usize, window: &TimeWindow);
    fn dry_run_point(&mut self, point: &OutputPoint);
    fn window_end(&mut self, index: usize, stats: WindowStats, total: &CopyReport);
}

/// Production reporter: forwards progress to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

fn short_rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl Reporter for LogReporter {
    fn window_begin(&mut self, index: usize, window: &TimeWindow) {
        log::info!(
            "[window {index}] {} -> {}",
            short_rfc3339(window.start),
            short_rfc3339(window.end),
        );
    }

    fn dry_run_point(&mut self, point: &OutputPoint) {
        log::info!("dry-run: {point}");
    }

    fn window_end(&mut self, index: usize, stats: WindowStats, total: &CopyReport) {
        log::info!(
            "[window {index}] {} records, {} written, {} skipped (run total: {} records, {} written)",
            stats.records,
            stats.written,
            stats.skipped,
            total.records,
            total.written,
        );
    }
}

// ---------------------------------------------------------------------------
// CopyRun — the windowed orchestrator
// ---------------------------------------------------------------------------

/// Drives one copy run: for each planned window, builds a query spec, streams
/// source records, transforms them, and routes the output to the mode's sink.
///
/// Windows are processed strictly in time order, one record at a time. Memory
/// stays bounded by `batch_size`: points are flushed as soon as the batch
/// fills, never accumulated for a whole window. A transport error aborts the
/// run; windows flushed before the abort stay written.
pub struct CopyRun<'a> {
    reader: &'a dyn SeriesReader,
    writer: &'a dyn SeriesWriter,
    transformer: &'a PointTransformer,
    template: QueryTemplate,
    dst_bucket: String,
    mode: RunMode,
    batch_size: usize,
}

impl<'a> CopyRun<'a> {
    pub fn new(
        reader: &'a dyn SeriesReader,
        writer: &'a dyn SeriesWriter,
        transformer: &'a PointTransformer,
        template: QueryTemplate,
        dst_bucket: String,
        mode: RunMode,
        batch_size: usize,
    ) -> CopyResult<Self> {
        if batch_size == 0 {
            return StructError::from(CopyReason::RunConfig)
                .with_detail("batch size must be positive".to_string())
                .err();
        }
        Ok(Self {
            reader,
            writer,
            transformer,
            template,
            dst_bucket,
            mode,
            batch_size,
        })
    }

    pub fn run(&self, plan: WindowPlan, reporter: &mut dyn Reporter) -> CopyResult<CopyReport> {
        let mut report = CopyReport::default();
        for (index, window) in plan.enumerate() {
            let index = index + 1;
            reporter.window_begin(index, &window);
            let stats = self.copy_window(window, reporter)?;
            report.absorb(stats);
            reporter.window_end(index, stats, &report);
        }
        Ok(report)
    }

    fn copy_window(
        &self,
        window: TimeWindow,
        reporter: &mut dyn Reporter,
    ) -> CopyResult<WindowStats> {
        let spec = self.template.for_window(window);
        let stream = self.reader.open_stream(&spec)?;
        let mut stats = WindowStats::default();

        match self.mode {
            RunMode::Verify => {
                for record in stream {
                    record?;
                    stats.records += 1;
                }
            }
            RunMode::DryRun => {
                for record in stream {
                    let record = record?;
                    stats.records += 1;
                    match self.transformer.transform(record) {
                        Some(point) => reporter.dry_run_point(&point),
                        None => stats.skipped += 1,
                    }
                }
            }
            RunMode::Write => {
                let mut batch: Vec<OutputPoint> = Vec::with_capacity(self.batch_size);
                for record in stream {
                    let record = record?;
                    stats.records += 1;
                    match self.transformer.transform(record) {
                        Some(point) => {
                            batch.push(point);
                            if batch.len() >= self.batch_size {
                                self.flush(&mut batch, &mut stats)?;
                            }
                        }
                        None => stats.skipped += 1,
                    }
                }
                self.flush(&mut batch, &mut stats)?;
            }
        }

        Ok(stats)
    }

    fn flush(&self, batch: &mut Vec<OutputPoint>, stats: &mut WindowStats) -> CopyResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        log::debug!("flushing {} points to {:?}", batch.len(), self.dst_bucket);
        self.writer.write_batch(&self.dst_bucket, batch)?;
        stats.written += batch.len() as u64;
        batch.clear();
        Ok(())
    }
}
