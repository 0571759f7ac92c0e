//! chartstep - a deterministic, step-by-step interpreter for chart
//! explanation operations
//!
//! An operation spec is an ordered set of stages, each a list of
//! operations over a normalized dataset. Stages run one at a time; each
//! stage's result is cached so the terminal stage can compare and combine
//! earlier results.
//!
//! ```ignore
//! use std::sync::Arc;
//! use chartstep::sequencer::{OperationSpec, PassthroughAdapter, StageSequencer};
//!
//! let spec: OperationSpec = serde_json::from_str(spec_json)?;
//! let sequencer = StageSequencer::new(spec, base, Arc::new(PassthroughAdapter));
//! let reports = sequencer.run_all().await?;
//! ```

pub mod cli;
pub mod config;
pub mod datum;
pub mod observability;
pub mod operations;
pub mod predicate;
pub mod sequencer;
pub mod store;
