//! Chart adapter seam
//!
//! The sequencer calls the adapter once per stage to reset the chart, once
//! per operation with the computed output, and once to present the stage
//! result. Every method has a no-op default so an adapter only overrides
//! the hooks it draws.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use serde::Serialize;

use crate::datum::Datum;
use crate::operations::{OpOutput, Operation};

use super::context::StageContext;
use super::errors::AdapterError;

/// Boxed future returned by adapter hooks
pub type AdapterFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AdapterError>> + Send + 'a>>;

/// Rendering side of a sequencer
pub trait ChartAdapter: Send + Sync {
    /// Restore the chart's base state before a stage runs
    fn on_reset<'a>(&'a self, _ctx: &'a StageContext) -> AdapterFuture<'a, ()> {
        Box::pin(async { Ok::<(), AdapterError>(()) })
    }

    /// Draw one operation. Returns the output threaded to the next
    /// operation, which is normally `output` unchanged.
    fn apply<'a>(
        &'a self,
        _ctx: &'a StageContext,
        _op: &'a Operation,
        _input: &'a [Datum],
        output: OpOutput,
    ) -> AdapterFuture<'a, OpOutput> {
        Box::pin(async move { Ok::<_, AdapterError>(output) })
    }

    /// Show the stage's final output
    fn present<'a>(&'a self, _ctx: &'a StageContext, _output: &'a OpOutput) -> AdapterFuture<'a, ()> {
        Box::pin(async { Ok::<(), AdapterError>(()) })
    }

    /// Called once after the final stage has been presented
    fn on_complete<'a>(&'a self, _ctx: &'a StageContext) -> AdapterFuture<'a, ()> {
        Box::pin(async { Ok::<(), AdapterError>(()) })
    }
}

/// Adapter that draws nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughAdapter;

impl ChartAdapter for PassthroughAdapter {}

/// One recorded adapter call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum AdapterCall {
    Reset { stage: String },
    Apply { stage: String, op: String, input_len: usize, output: OpOutput },
    Present { stage: String, caption: Option<String>, output: OpOutput },
    Complete { stage: String },
}

impl AdapterCall {
    pub fn stage(&self) -> &str {
        match self {
            AdapterCall::Reset { stage }
            | AdapterCall::Apply { stage, .. }
            | AdapterCall::Present { stage, .. }
            | AdapterCall::Complete { stage } => stage,
        }
    }
}

/// Adapter that records every call
///
/// Optionally yields to the runtime inside each hook, and can be told to
/// fail when presenting a given stage.
#[derive(Debug, Default)]
pub struct RecordingAdapter {
    calls: Mutex<Vec<AdapterCall>>,
    yield_in_hooks: bool,
    fail_stage: Option<String>,
}

impl RecordingAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yield to the scheduler inside every hook
    pub fn yielding(mut self) -> Self {
        self.yield_in_hooks = true;
        self
    }

    /// Return an error from `present` for `stage`
    pub fn failing_on(mut self, stage: impl Into<String>) -> Self {
        self.fail_stage = Some(stage.into());
        self
    }

    /// Snapshot of calls so far
    pub fn calls(&self) -> Vec<AdapterCall> {
        self.lock().clone()
    }

    /// Stage keys passed to `present`, in order
    pub fn presented(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|c| matches!(c, AdapterCall::Present { .. }))
            .map(|c| c.stage().to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AdapterCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: AdapterCall) {
        self.lock().push(call);
    }

    async fn pause(&self) {
        if self.yield_in_hooks {
            tokio::task::yield_now().await;
        }
    }
}

impl ChartAdapter for RecordingAdapter {
    fn on_reset<'a>(&'a self, ctx: &'a StageContext) -> AdapterFuture<'a, ()> {
        Box::pin(async move {
            self.pause().await;
            self.record(AdapterCall::Reset {
                stage: ctx.stage_key.clone(),
            });
            Ok::<(), AdapterError>(())
        })
    }

    fn apply<'a>(
        &'a self,
        ctx: &'a StageContext,
        op: &'a Operation,
        input: &'a [Datum],
        output: OpOutput,
    ) -> AdapterFuture<'a, OpOutput> {
        Box::pin(async move {
            self.pause().await;
            self.record(AdapterCall::Apply {
                stage: ctx.stage_key.clone(),
                op: op.name().to_string(),
                input_len: input.len(),
                output: output.clone(),
            });
            Ok::<_, AdapterError>(output)
        })
    }

    fn present<'a>(&'a self, ctx: &'a StageContext, output: &'a OpOutput) -> AdapterFuture<'a, ()> {
        Box::pin(async move {
            self.pause().await;
            if self.fail_stage.as_deref() == Some(ctx.stage_key.as_str()) {
                return Err(AdapterError::Rejected {
                    stage: ctx.stage_key.clone(),
                    message: "present failed".to_string(),
                });
            }
            self.record(AdapterCall::Present {
                stage: ctx.stage_key.clone(),
                caption: ctx.caption.clone(),
                output: output.clone(),
            });
            Ok(())
        })
    }

    fn on_complete<'a>(&'a self, ctx: &'a StageContext) -> AdapterFuture<'a, ()> {
        Box::pin(async move {
            self.pause().await;
            self.record(AdapterCall::Complete {
                stage: ctx.stage_key.clone(),
            });
            Ok::<(), AdapterError>(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::{CountOp, Operation};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_passthrough_returns_output() {
        let ctx = StageContext::new(Uuid::new_v4(), "ops", 0, 1);
        let adapter = PassthroughAdapter;
        let output = OpOutput::Null;
        let op = Operation::Count(CountOp::default());
        let returned = adapter.apply(&ctx, &op, &[], output.clone()).await.unwrap();
        assert_eq!(returned, output);
        adapter.present(&ctx, &returned).await.unwrap();
    }

    #[tokio::test]
    async fn test_recording_adapter() {
        let ctx = StageContext::new(Uuid::new_v4(), "ops", 0, 1);
        let adapter = RecordingAdapter::new().yielding();
        adapter.on_reset(&ctx).await.unwrap();
        adapter.present(&ctx, &OpOutput::Null).await.unwrap();

        let calls = adapter.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(adapter.presented(), vec!["ops".to_string()]);
    }

    #[tokio::test]
    async fn test_recording_adapter_failure() {
        let ctx = StageContext::new(Uuid::new_v4(), "bad", 0, 1);
        let adapter = RecordingAdapter::new().failing_on("bad");
        let err = adapter.present(&ctx, &OpOutput::Null).await.unwrap_err();
        assert_eq!(err.code(), "CHARTSTEP_ADAPTER_REJECTED");
        assert!(adapter.presented().is_empty());
    }
}
