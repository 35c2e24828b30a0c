use crate::error::CopyResult;
use crate::query::QuerySpec;
use crate::record::{OutputPoint, SourceRecord};

/// Lazy, forward-only, non-restartable record stream. The consumer blocks on
/// each pull until the capability yields the next record or ends the stream.
/// An `Err` item signals a transport or decode failure and aborts the run.
pub type RecordStream<'a> = Box<dyn Iterator<Item = CopyResult<SourceRecord>> + 'a>;

/// Source-side query capability.
pub trait SeriesReader {
    fn open_stream(&self, spec: &QuerySpec) -> CopyResult<RecordStream<'_>>;
}

/// Destination-side write capability. A batch either lands fully or the run
/// aborts; there is no partial-batch recovery and no retry.
pub trait SeriesWriter {
    fn write_batch(&self, bucket: &str, points: &[OutputPoint]) -> CopyResult<()>;
}
