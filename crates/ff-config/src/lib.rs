pub mod influx;
pub mod logging;
pub mod types;

pub use influx::ConnectConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use types::{HumanDuration, TimeSpec};
