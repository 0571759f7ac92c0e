//! Stage sequencing
//!
//! Parses operation specs and runs them stage by stage through a
//! `ChartAdapter`, caching each stage's result for the terminal stage.

mod adapter;
mod context;
mod errors;
#[allow(clippy::module_inception)]
mod sequencer;
mod spec;
mod terminal;

pub use adapter::{AdapterCall, AdapterFuture, ChartAdapter, PassthroughAdapter, RecordingAdapter};
pub use context::StageContext;
pub use errors::{AdapterError, SequencerError, SequencerResult, SpecError};
pub use sequencer::{SequencerOptions, SequencerState, StageReport, StageSequencer};
pub use spec::{OperationSpec, Stage, DEFAULT_TERMINAL_KEY};
pub use terminal::{build_terminal_dataset, DEFAULT_LABEL_SEPARATOR};
