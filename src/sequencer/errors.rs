//! Sequencer, adapter and spec errors

use thiserror::Error;

/// Result type for sequencer operations
pub type SequencerResult<T> = Result<T, SequencerError>;

/// Error returned by a chart adapter
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    #[error("Adapter rejected stage {stage}: {message}")]
    Rejected { stage: String, message: String },

    #[error("Adapter failure: {0}")]
    Failed(String),
}

impl AdapterError {
    pub fn failed(message: impl Into<String>) -> Self {
        AdapterError::Failed(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            AdapterError::Rejected { .. } => "CHARTSTEP_ADAPTER_REJECTED",
            AdapterError::Failed(_) => "CHARTSTEP_ADAPTER_FAILED",
        }
    }
}

/// Error parsing an operation spec
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("Invalid operation spec: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Operation spec stage {0} has no operations list")]
    StageNotAList(String),
}

impl SpecError {
    pub fn code(&self) -> &'static str {
        match self {
            SpecError::Parse(_) => "CHARTSTEP_SPEC_INVALID",
            SpecError::StageNotAList(_) => "CHARTSTEP_SPEC_STAGE_INVALID",
        }
    }
}

/// Error returned by `StageSequencer`
#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("A stage is already running")]
    AlreadyRunning,

    #[error("All stages have been presented")]
    Exhausted,

    #[error("Sequencer halted after stage {stage} failed")]
    Halted { stage: String },

    #[error("Adapter failed during stage {stage}: {source}")]
    Adapter {
        stage: String,
        #[source]
        source: AdapterError,
    },
}

impl SequencerError {
    pub fn code(&self) -> &'static str {
        match self {
            SequencerError::AlreadyRunning => "CHARTSTEP_ALREADY_RUNNING",
            SequencerError::Exhausted => "CHARTSTEP_EXHAUSTED",
            SequencerError::Halted { .. } => "CHARTSTEP_HALTED",
            SequencerError::Adapter { .. } => "CHARTSTEP_ADAPTER_FAILED",
        }
    }

    /// Returns true if advancing again could succeed after a restart
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SequencerError::AlreadyRunning)
    }
}
