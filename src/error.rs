//! Error types.
//!
//! Two layers:
//!
//! - [`PipelineError`]: the taxonomy of the fetch → parse → align → chart pipeline.
//!   Library callers match on it.
//! - [`AppError`]: what the `entsoe` binary reports (message + process exit code).

use thiserror::Error;

/// Failures of the market-data pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Network/HTTP failure reaching the upstream API.
    #[error("transport error: {0}")]
    Transport(String),

    /// A document arrived but is not a recognizable time-series document.
    #[error("document parse error: {0}")]
    DocumentParse(String),

    /// Bad point position or resolution input.
    #[error("malformed resolution: {0}")]
    MalformedResolution(String),

    /// Missing credentials or a required parameter.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A comparison request without any dataset.
    #[error("no datasets configured")]
    NoDatasets,
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let exit_code = match err {
            PipelineError::Configuration(_) => 2,
            PipelineError::Transport(_) => 3,
            PipelineError::DocumentParse(_)
            | PipelineError::MalformedResolution(_)
            | PipelineError::NoDatasets => 4,
        };
        Self::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_exit_codes() {
        let cases = [
            (PipelineError::Configuration("no key".to_string()), 2),
            (PipelineError::Transport("timeout".to_string()), 3),
            (PipelineError::DocumentParse("bad root".to_string()), 4),
            (PipelineError::NoDatasets, 4),
        ];
        for (err, code) in cases {
            let message = err.to_string();
            let app: AppError = err.into();
            assert_eq!(app.exit_code(), code);
            assert_eq!(app.to_string(), message);
        }
    }
}
