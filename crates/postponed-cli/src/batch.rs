//! Batch files: a JSON array of calls in, a JSON array of outcomes out.
//!
//! ```json
//! [
//!   {"function": "double", "args": [3]},
//!   {"function": "multiply", "kwargs": {"a": 1.0, "b": 2.5}}
//! ]
//! ```

use std::path::Path;

use anyhow::{Context, Result, bail};
use postponed_core::typed::WireTask;
use postponed_core::{BatchResults, DeferredTask, FunctionRegistry, Postponed};
use serde_json::{Value, json};

/// One entry has the same shape as a task on the worker wire.
pub type Call = WireTask;

pub fn read_calls(path: &Path) -> Result<Vec<Call>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read batch file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid batch file {}", path.display()))
}

/// Bind every call, stopping at the first one that cannot be bound.
pub fn bind_calls(
    registry: &FunctionRegistry,
    calls: Vec<Call>,
    check_inputs: bool,
) -> Result<Vec<DeferredTask>> {
    let mut tasks = Vec::with_capacity(calls.len());
    for (index, call) in calls.into_iter().enumerate() {
        let Some(function) = registry.get(&call.function) else {
            bail!(
                "call #{index}: unknown function '{}' (known: {})",
                call.function,
                registry.names().join(", ")
            );
        };
        let task = Postponed::new(function.clone(), check_inputs)
            .bind(call.args)
            .with_context(|| format!("call #{index}"))?;
        tasks.push(task);
    }
    Ok(tasks)
}

pub fn render(results: &BatchResults) -> Value {
    results
        .iter()
        .map(|result| match result {
            Ok(value) => json!({ "ok": value }),
            Err(e) => json!({ "error": e.to_string() }),
        })
        .collect()
}
