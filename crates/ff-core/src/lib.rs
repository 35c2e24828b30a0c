pub mod contract;
pub mod copy;
pub mod error;
pub mod query;
pub mod record;
pub mod rule;
pub mod window;

pub use contract::{RecordStream, SeriesReader, SeriesWriter};
pub use copy::{CopyReport, CopyRun, LogReporter, Reporter, RunMode, WindowStats};
pub use error::{CopyError, CopyReason, CopyResult};
pub use query::{MeasurementSelector, QuerySpec, QueryTemplate, TagFilter, TagPredicate};
pub use record::{FieldValue, OutputPoint, SourceRecord, is_tag_column};
pub use rule::{
    InjectRule, NameMapper, NameRule, PointTransformer, TagInjector, TagRule, TagValueMapper,
    ValueMatcher,
};
pub use window::{TimeWindow, WindowPlan};
