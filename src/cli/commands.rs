//! CLI command implementations
//!
//! Each command loads configuration first, sets the log level from it, and
//! writes its results as JSON lines to stdout. Logs go to stderr.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::datum::BaseDataset;
use crate::observability::{log_event, Event, Logger, Severity};
use crate::operations::{Interpreter, Operation};
use crate::sequencer::{OperationSpec, RecordingAdapter, StageSequencer};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_file, read_json_file, write_line, write_response};

/// Dispatch a parsed command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Run {
            config,
            spec,
            data,
            captions,
            transcript,
        } => run(config.as_deref(), &spec, &data, captions.as_deref(), transcript),
        Command::Check { config, spec } => check(config.as_deref(), &spec),
        Command::Apply { config, data, op } => apply(config.as_deref(), &data, &op),
    }
}

/// Load configuration, or defaults when no path is given
pub fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    Logger::set_min_severity(config.severity().unwrap_or(Severity::Info));
    log_event(
        Event::ConfigLoaded,
        &[
            ("terminal_stage_key", config.terminal_stage_key.as_str()),
            ("log_level", config.log_level.as_str()),
        ],
    );
    Ok(config)
}

/// Parse an operation spec file, keeping the file's stage order
pub fn load_spec(path: &Path, config: &EngineConfig) -> CliResult<OperationSpec> {
    let text = read_file(path)?;
    let spec = OperationSpec::from_json_str(&text, &config.terminal_stage_key)?;

    let stages = spec.len().to_string();
    log_event(Event::SpecLoaded, &[("stages", stages.as_str())]);
    Ok(spec)
}

/// Parse a base dataset file
pub fn load_dataset(path: &Path) -> CliResult<BaseDataset> {
    let raw = read_json_file(path)?;
    serde_json::from_value(raw)
        .map_err(|e| CliError::input_error(format!("Invalid base dataset {}: {}", path.display(), e)))
}

fn load_captions(path: &Path) -> CliResult<Vec<(String, String)>> {
    match read_json_file(path)? {
        Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(key, caption)| caption.as_str().map(|c| (key, c.to_string())))
            .collect()),
        _ => Err(CliError::input_error(format!(
            "Captions file {} must be a JSON object",
            path.display()
        ))),
    }
}

/// Run every stage headlessly, one JSON line per presented stage
pub fn run(
    config_path: Option<&Path>,
    spec_path: &Path,
    data_path: &Path,
    captions_path: Option<&Path>,
    transcript: bool,
) -> CliResult<()> {
    let config = load_config(config_path)?;
    let mut spec = load_spec(spec_path, &config)?;
    let base = load_dataset(data_path)?;

    if let Some(path) = captions_path {
        let captions = load_captions(path)?;
        spec = spec.with_captions(captions.iter().map(|(k, c)| (k.as_str(), c.as_str())));
    }

    let adapter = Arc::new(RecordingAdapter::new());
    let sequencer = StageSequencer::new(spec, base, adapter.clone())
        .with_options(config.sequencer_options())
        .with_interpreter(Interpreter::new(config.filter_engine()));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::io_error(format!("Failed to start runtime: {}", e)))?;

    runtime.block_on(async {
        for _ in 0..sequencer.spec().len() {
            let report = sequencer.advance().await?;
            write_line(&report)?;
        }
        Ok::<(), CliError>(())
    })?;

    if transcript {
        for call in adapter.calls() {
            write_line(&call)?;
        }
    }

    Ok(())
}

/// List stages and operations of a spec
pub fn check(config_path: Option<&Path>, spec_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let spec = load_spec(spec_path, &config)?;

    let stages: Vec<Value> = spec
        .stages()
        .iter()
        .map(|stage| {
            let operations: Vec<&str> = stage.operations.iter().map(|op| op.name()).collect();
            let unsupported: Vec<&str> = stage
                .operations
                .iter()
                .filter(|op| !op.is_supported())
                .map(|op| op.name())
                .collect();
            json!({
                "stage": stage.key,
                "terminal": stage.key == config.terminal_stage_key,
                "operations": operations,
                "unsupported": unsupported,
            })
        })
        .collect();

    write_response(json!({
        "stages": stages,
        "unsupported": spec.unsupported().len(),
    }))
}

/// Apply one operation to the base dataset
pub fn apply(config_path: Option<&Path>, data_path: &Path, op_json: &str) -> CliResult<()> {
    let config = load_config(config_path)?;
    let base = load_dataset(data_path)?;

    let raw: Value = serde_json::from_str(op_json)
        .map_err(|e| CliError::input_error(format!("Invalid operation JSON: {}", e)))?;
    let op = Operation::from_value(raw)
        .map_err(|e| CliError::input_error(format!("Invalid operation: {}", e)))?;

    let interpreter = Interpreter::new(config.filter_engine());
    let output = interpreter.apply(&base.to_datums(), &op, false);
    write_response(serde_json::to_value(&output)?)
}
