//! Stage sequencer
//!
//! Runs an operation spec one stage per `advance`. Stage results are cached
//! in a `ResultStore` for the terminal stage, which runs against the
//! assembled store instead of the base dataset.
//!
//! State machine:
//!
//! ```text
//! Idle -> Running(0) -> Presented(0) -> Running(1) -> ... -> Complete
//!              \                              \
//!               `-> Halted(i) on adapter error `-> Halted(i)
//! ```
//!
//! `advance` while a stage is running fails with `AlreadyRunning`; nothing
//! about the running stage changes. `restart` returns to `Idle` from any
//! state except `Running`.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use uuid::Uuid;

use crate::datum::BaseDataset;
use crate::observability::{log_event, Event, ObservationScope};
use crate::operations::{Interpreter, OpOutput};
use crate::store::{make_key, ResultStore};

use super::adapter::ChartAdapter;
use super::context::StageContext;
use super::errors::{AdapterError, SequencerError, SequencerResult};
use super::spec::{OperationSpec, Stage, DEFAULT_TERMINAL_KEY};
use super::terminal::{build_terminal_dataset, DEFAULT_LABEL_SEPARATOR};

/// Sequencer lifecycle state. Indexes are positions in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum SequencerState {
    Idle,
    Running(usize),
    Presented(usize),
    Complete,
    Halted(usize),
}

/// Sequencer settings
#[derive(Debug, Clone, PartialEq)]
pub struct SequencerOptions {
    /// Key of the stage that runs last against the result store
    pub terminal_stage_key: String,
    /// Separator between a terminal label and its group
    pub label_separator: String,
    /// Passed through to adapters in `StageContext`
    pub chart_id: Option<String>,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            terminal_stage_key: DEFAULT_TERMINAL_KEY.to_string(),
            label_separator: DEFAULT_LABEL_SEPARATOR.to_string(),
            chart_id: None,
        }
    }
}

/// What one `advance` presented
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub execution_id: Uuid,
    pub stage: String,
    pub index: usize,
    pub is_last: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub output: OpOutput,
}

struct Inner {
    state: SequencerState,
    store: ResultStore,
    execution_id: Uuid,
}

/// Drives an operation spec through a chart adapter, one stage at a time
pub struct StageSequencer {
    spec: OperationSpec,
    base: BaseDataset,
    adapter: Arc<dyn ChartAdapter>,
    interpreter: Interpreter,
    options: SequencerOptions,
    inner: Mutex<Inner>,
}

impl StageSequencer {
    pub fn new(spec: OperationSpec, base: BaseDataset, adapter: Arc<dyn ChartAdapter>) -> Self {
        Self {
            spec,
            base,
            adapter,
            interpreter: Interpreter::default(),
            options: SequencerOptions::default(),
            inner: Mutex::new(Inner {
                state: SequencerState::Idle,
                store: ResultStore::new(),
                execution_id: Uuid::new_v4(),
            }),
        }
    }

    /// Apply options. A non-default terminal key re-orders the spec.
    pub fn with_options(mut self, options: SequencerOptions) -> Self {
        self.spec = self.spec.with_terminal_key(&options.terminal_stage_key);
        self.options = options;
        self
    }

    pub fn with_interpreter(mut self, interpreter: Interpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn spec(&self) -> &OperationSpec {
        &self.spec
    }

    pub fn options(&self) -> &SequencerOptions {
        &self.options
    }

    pub fn state(&self) -> SequencerState {
        self.lock().state
    }

    /// ID of the current (or most recent) execution
    pub fn execution_id(&self) -> Uuid {
        self.lock().execution_id
    }

    /// Snapshot of the result store
    pub fn store(&self) -> ResultStore {
        self.lock().store.clone()
    }

    /// Run the next stage and present its output.
    ///
    /// The first advance after `Idle` clears the store and starts a new
    /// execution.
    pub async fn advance(&self) -> SequencerResult<StageReport> {
        let (index, execution_id) = self.begin_stage()?;
        let guard = RunGuard {
            sequencer: self,
            index,
            armed: true,
        };

        let stage = &self.spec.stages()[index];
        match self.run_stage(stage, index, execution_id).await {
            Ok(report) => {
                if index + 1 == self.spec.len() {
                    guard.finish(SequencerState::Complete);
                    let id = execution_id.to_string();
                    log_event(Event::ExecutionComplete, &[("execution_id", id.as_str())]);
                } else {
                    guard.finish(SequencerState::Presented(index));
                }
                Ok(report)
            }
            Err(source) => {
                guard.finish(SequencerState::Halted(index));
                log_event(
                    Event::AdapterFailed,
                    &[("stage", stage.key.as_str()), ("code", source.code())],
                );
                Err(SequencerError::Adapter {
                    stage: stage.key.clone(),
                    source,
                })
            }
        }
    }

    /// Run every remaining stage
    pub async fn run_all(&self) -> SequencerResult<Vec<StageReport>> {
        let mut reports = Vec::with_capacity(self.spec.len());
        if self.spec.is_empty() {
            return Ok(reports);
        }
        while self.state() != SequencerState::Complete {
            reports.push(self.advance().await?);
        }
        Ok(reports)
    }

    /// Return to `Idle` and clear the store. Fails while a stage runs.
    pub fn restart(&self) -> SequencerResult<()> {
        let mut inner = self.lock();
        if matches!(inner.state, SequencerState::Running(_)) {
            drop(inner);
            return Err(self.reject(SequencerError::AlreadyRunning));
        }

        inner.state = SequencerState::Idle;
        inner.store.reset();
        let id = inner.execution_id.to_string();
        drop(inner);

        log_event(Event::ExecutionReset, &[("execution_id", id.as_str())]);
        Ok(())
    }

    fn begin_stage(&self) -> SequencerResult<(usize, Uuid)> {
        let mut inner = self.lock();
        let state = inner.state;
        let next = match state {
            SequencerState::Running(_) => {
                drop(inner);
                return Err(self.reject(SequencerError::AlreadyRunning));
            }
            SequencerState::Complete => {
                drop(inner);
                return Err(self.reject(SequencerError::Exhausted));
            }
            SequencerState::Halted(i) => {
                drop(inner);
                let stage = self.spec.stage(i).map(|s| s.key.clone()).unwrap_or_default();
                return Err(self.reject(SequencerError::Halted { stage }));
            }
            SequencerState::Idle => 0,
            SequencerState::Presented(i) => i + 1,
        };

        if next >= self.spec.len() {
            drop(inner);
            return Err(self.reject(SequencerError::Exhausted));
        }

        if next == 0 {
            inner.store.reset();
            inner.execution_id = Uuid::new_v4();
            let id = inner.execution_id.to_string();
            let stages = self.spec.len().to_string();
            log_event(
                Event::ExecutionBegin,
                &[("execution_id", id.as_str()), ("stages", stages.as_str())],
            );
        }

        inner.state = SequencerState::Running(next);
        Ok((next, inner.execution_id))
    }

    async fn run_stage(&self, stage: &Stage, index: usize, execution_id: Uuid) -> Result<StageReport, AdapterError> {
        let is_last = stage.key == self.options.terminal_stage_key;
        let ctx = StageContext::new(execution_id, stage.key.as_str(), index, self.spec.len())
            .with_chart_id(self.options.chart_id.clone())
            .with_caption(stage.caption.clone())
            .terminal(is_last);

        let id = execution_id.to_string();
        let position = index.to_string();
        let scope = ObservationScope::with_fields(
            "STAGE",
            &[
                ("stage", stage.key.as_str()),
                ("index", position.as_str()),
                ("execution_id", id.as_str()),
            ],
        );

        match self.stage_body(&ctx, stage).await {
            Ok(output) => {
                let items = output.datum_count().to_string();
                scope.complete_with_fields(&[("kind", output.kind()), ("items", items.as_str())]);
                Ok(StageReport {
                    execution_id,
                    stage: stage.key.clone(),
                    index,
                    is_last,
                    caption: stage.caption.clone(),
                    output,
                })
            }
            Err(e) => {
                scope.fail(&e.to_string());
                Err(e)
            }
        }
    }

    async fn stage_body(&self, ctx: &StageContext, stage: &Stage) -> Result<OpOutput, AdapterError> {
        self.adapter.on_reset(ctx).await?;

        let mut input = if ctx.is_last {
            let stored = self.lock().store.flatten();
            build_terminal_dataset(&stored, &self.options.label_separator)
        } else {
            self.base.to_datums()
        };

        let mut output = OpOutput::Data(input.clone());
        for op in &stage.operations {
            let computed = self.interpreter.apply(&input, op, ctx.is_last);
            let drawn = self.adapter.apply(ctx, op, &input, computed).await?;
            input = drawn.clone().into_next_input(input);
            output = drawn;
        }

        if !ctx.is_last {
            backfill_ids(&mut output, &stage.key);
            self.lock().store.store(&stage.key, &output);
        }

        self.adapter.present(ctx, &output).await?;
        if ctx.is_final() {
            self.adapter.on_complete(ctx).await?;
        }
        Ok(output)
    }

    fn reject(&self, err: SequencerError) -> SequencerError {
        log_event(Event::AdvanceRejected, &[("code", err.code())]);
        err
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Give unidentified Datums the id `"<stage>_<position>"`
fn backfill_ids(output: &mut OpOutput, stage: &str) {
    match output {
        OpOutput::Data(items) => {
            for (i, d) in items.iter_mut().enumerate() {
                if d.id.is_none() {
                    d.id = Some(make_key(stage, i));
                }
            }
        }
        OpOutput::Datum(d) => {
            if d.id.is_none() {
                d.id = Some(make_key(stage, 0));
            }
        }
        _ => {}
    }
}

/// Leaves the sequencer `Halted` if a running stage is dropped before it
/// finishes
struct RunGuard<'a> {
    sequencer: &'a StageSequencer,
    index: usize,
    armed: bool,
}

impl RunGuard<'_> {
    fn finish(mut self, state: SequencerState) {
        self.armed = false;
        self.sequencer.lock().state = state;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.sequencer.lock().state = SequencerState::Halted(self.index);
        }
    }
}
