use derive_more::From;
use orion_error::{ErrorCode, StructError, UvsReason};

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum CopyReason {
    #[error("window plan error")]
    WindowPlan,
    #[error("rule parse error")]
    RuleParse,
    #[error("run config error")]
    RunConfig,
    #[error("source read error")]
    SourceRead,
    #[error("sink write error")]
    SinkWrite,
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for CopyReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::WindowPlan => 1001,
            Self::RuleParse => 1002,
            Self::RunConfig => 1003,
            Self::SourceRead => 1004,
            Self::SinkWrite => 1005,
            Self::Uvs(u) => u.error_code(),
        }
    }
}

pub type CopyError = StructError<CopyReason>;
pub type CopyResult<T> = Result<T, CopyError>;
