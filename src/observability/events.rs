//! Observable events
//!
//! Every lifecycle log line carries one of these names, so transcripts can
//! be grepped without knowing which module emitted them.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Execution lifecycle
    /// A new operation-spec execution started (store cleared)
    ExecutionBegin,
    /// The terminal stage was presented
    ExecutionComplete,
    /// The sequencer returned to idle
    ExecutionReset,
    /// An advance was rejected (already running or exhausted)
    AdvanceRejected,

    // Operations
    /// One operation produced an output
    OperationApplied,
    /// Operation kind not recognized; input passed through
    OperationUnsupported,
    /// A lookup or scope matched nothing
    NoMatch,
    /// Filter operator not recognized; result is empty
    FilterOperatorUnknown,

    // Result store
    /// A stage result was cached
    ResultStored,
    /// A stage result normalized to nothing and its key was removed
    ResultDropped,

    // Adapter
    /// The chart adapter returned an error
    AdapterFailed,

    // Configuration and input
    /// Engine configuration loaded
    ConfigLoaded,
    /// Operation spec parsed
    SpecLoaded,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ExecutionBegin => "EXECUTION_BEGIN",
            Event::ExecutionComplete => "EXECUTION_COMPLETE",
            Event::ExecutionReset => "EXECUTION_RESET",
            Event::AdvanceRejected => "ADVANCE_REJECTED",

            Event::OperationApplied => "OPERATION_APPLIED",
            Event::OperationUnsupported => "OPERATION_UNSUPPORTED",
            Event::NoMatch => "NO_MATCH",
            Event::FilterOperatorUnknown => "FILTER_OPERATOR_UNKNOWN",

            Event::ResultStored => "RESULT_STORED",
            Event::ResultDropped => "RESULT_DROPPED",

            Event::AdapterFailed => "ADAPTER_FAILED",

            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SpecLoaded => "SPEC_LOADED",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::OperationApplied | Event::ResultStored | Event::ResultDropped => {
                Severity::Trace
            }
            Event::OperationUnsupported
            | Event::NoMatch
            | Event::FilterOperatorUnknown
            | Event::AdvanceRejected => Severity::Warn,
            Event::AdapterFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
