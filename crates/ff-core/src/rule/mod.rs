mod inject;
mod matcher;
mod name_map;
mod tag_map;
mod transform;

pub use inject::{InjectRule, TagInjector};
pub use matcher::ValueMatcher;
pub use name_map::{NameMapper, NameRule};
pub use tag_map::{TagRule, TagValueMapper};
pub use transform::PointTransformer;
