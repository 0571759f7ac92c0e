//! Stage Context
//!
//! Context handed to the chart adapter for each stage.

use std::time::Instant;

use uuid::Uuid;

/// Context carried through one stage
#[derive(Debug, Clone)]
pub struct StageContext {
    /// Execution ID, fixed from the first stage until restart
    pub execution_id: Uuid,

    /// Chart the spec runs against, if configured
    pub chart_id: Option<String>,

    /// Stage key in the operation spec
    pub stage_key: String,

    /// Position in execution order
    pub stage_index: usize,

    /// Number of stages in the spec
    pub stage_count: usize,

    /// True for the terminal stage
    pub is_last: bool,

    /// Narration for the stage
    pub caption: Option<String>,

    started_at: Instant,
}

impl StageContext {
    pub fn new(execution_id: Uuid, stage_key: impl Into<String>, stage_index: usize, stage_count: usize) -> Self {
        Self {
            execution_id,
            chart_id: None,
            stage_key: stage_key.into(),
            stage_index,
            stage_count,
            is_last: false,
            caption: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_chart_id(mut self, chart_id: Option<String>) -> Self {
        self.chart_id = chart_id;
        self
    }

    pub fn with_caption(mut self, caption: Option<String>) -> Self {
        self.caption = caption;
        self
    }

    pub fn terminal(mut self, is_last: bool) -> Self {
        self.is_last = is_last;
        self
    }

    /// True for the final stage in execution order
    pub fn is_final(&self) -> bool {
        self.stage_index + 1 == self.stage_count
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }
}
