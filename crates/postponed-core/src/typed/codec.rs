//! Codec - DeferredTask と wire 表現の相互変換
//!
//! # プロセス境界の契約
//! - 関数は **名前** で運ぶ（anonymous は `TransportError::NotTransferable`）
//! - 引数と結果は `serde_json::Value` なのでそのまま運べる
//! - ワーカー側は `FunctionRegistry` から名前で実体を引く
//!   （見つからなければ `TransportError::UnknownFunction`）
//!
//! # メッセージ
//! 1 行 1 JSON（改行区切り）。
//! - request: `{"id": 0, "task": {"function": "double", "args": [3], "kwargs": {}}}`
//! - response: `{"id": 0, "outcome": {"ok": 6.0}}`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::registry::FunctionRegistry;
use crate::domain::args::Arguments;
use crate::domain::errors::{InvocationError, TaskError, TransportError};
use crate::domain::task::DeferredTask;

/// A task as it travels to a worker process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireTask {
    pub function: String,
    #[serde(flatten)]
    pub args: Arguments,
}

/// What a worker sends back for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireOutcome {
    Ok(Value),
    Error(InvocationError),
    Panicked(String),
    Transport(TransportError),
}

impl From<WireOutcome> for Result<Value, TaskError> {
    fn from(outcome: WireOutcome) -> Self {
        match outcome {
            WireOutcome::Ok(value) => Ok(value),
            WireOutcome::Error(e) => Err(TaskError::Invocation(e)),
            WireOutcome::Panicked(msg) => Err(TaskError::Panicked(msg)),
            WireOutcome::Transport(e) => Err(TaskError::Transport(e)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub task: WireTask,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    pub outcome: WireOutcome,
}

/// Turn a task into its wire form. Fails for functions that have no name.
pub fn encode(task: &DeferredTask) -> Result<WireTask, TransportError> {
    let function = task.function();
    let name = function.name().ok_or_else(|| TransportError::NotTransferable {
        function: function.display_name().to_string(),
    })?;
    Ok(WireTask {
        function: name.to_string(),
        args: task.arguments().clone(),
    })
}

/// Rebuild a task on the receiving side from the registry.
pub fn decode(wire: WireTask, registry: &FunctionRegistry) -> Result<DeferredTask, TransportError> {
    let function = registry
        .get(&wire.function)
        .cloned()
        .ok_or(TransportError::UnknownFunction {
            name: wire.function,
        })?;
    Ok(DeferredTask::new(function, wire.args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signature::{ParamType, Signature};
    use crate::typed::function::Function;
    use serde_json::json;

    fn registry() -> FunctionRegistry {
        let sig = Signature::builder()
            .required("a", ParamType::Float)
            .required("b", ParamType::Float)
            .build()
            .unwrap();
        FunctionRegistry::new()
            .with(Function::named("multiply", sig, |args| {
                Ok(Value::from(args.f64("a")? * args.f64("b")?))
            }))
            .unwrap()
    }

    #[test]
    fn encode_then_decode_runs_the_same_call() {
        let registry = registry();
        let f = registry.get("multiply").unwrap().clone();
        let task = DeferredTask::new(f, Arguments::new().kwarg("a", 3.0).kwarg("b", 4.0));

        let wire = encode(&task).unwrap();
        let line = serde_json::to_string(&wire).unwrap();
        let back: WireTask = serde_json::from_str(&line).unwrap();
        let rebuilt = decode(back, &registry).unwrap();

        assert_eq!(rebuilt.invoke(), task.invoke());
        // 受信側では別のタスクとして作り直される
        assert_ne!(rebuilt.id(), task.id());
    }

    #[test]
    fn wire_task_shape() {
        let wire = WireTask {
            function: "double".to_string(),
            args: Arguments::positional([3]),
        };
        assert_eq!(
            serde_json::to_value(&wire).unwrap(),
            json!({"function": "double", "args": [3], "kwargs": {}})
        );
    }

    #[test]
    fn anonymous_function_is_not_transferable() {
        let f = Function::anonymous(Signature::empty(), |_| Ok(json!(null)));
        let task = DeferredTask::new(f, Arguments::new());
        assert_eq!(
            encode(&task),
            Err(TransportError::NotTransferable {
                function: "<anonymous>".to_string()
            })
        );
    }

    #[test]
    fn unknown_function_fails_to_decode() {
        let wire = WireTask {
            function: "missing".to_string(),
            args: Arguments::new(),
        };
        assert!(matches!(
            decode(wire, &registry()),
            Err(TransportError::UnknownFunction { name }) if name == "missing"
        ));
    }

    #[test]
    fn outcome_maps_to_task_result() {
        let ok: Result<Value, TaskError> = WireOutcome::Ok(json!(6.0)).into();
        assert_eq!(ok, Ok(json!(6.0)));

        let err: Result<Value, TaskError> = WireOutcome::Transport(TransportError::WorkerLost).into();
        assert_eq!(err, Err(TaskError::Transport(TransportError::WorkerLost)));

        let v = serde_json::to_value(Response {
            id: 2,
            outcome: WireOutcome::Error(InvocationError::failed("x")),
        })
        .unwrap();
        assert_eq!(v, json!({"id": 2, "outcome": {"error": {"kind": "failed", "message": "x"}}}));
    }
}
