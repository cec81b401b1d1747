//! Errors - エラー型と分類
//!
//! # 分類
//! - **Rejection / BindError**: bind 時の検査エラー（タスクは作られない）
//! - **InvocationError**: 関数実行時のエラー（そのまま呼び出し元へ）
//! - **TransportError**: プロセス境界を越えられなかった（使い方・互換性の問題）
//! - **TaskError**: バッチ内の 1 スロット分の失敗
//! - **BatchError**: プール自体を確保できなかった（バッチ全体の失敗）
//!
//! InvocationError と TransportError はワーカープロセスから JSON で
//! 返ってくるので serde で (de)serialize できるようにしています。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::signature::ParamType;

/// Why an argument set was refused at bind time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("argument '{0}' is provided twice")]
    DuplicateArgument(String),

    #[error("argument '{0}' not expected")]
    UnexpectedArgument(String),

    #[error("missing required argument '{0}'")]
    MissingRequiredArgument(String),

    #[error("argument '{name}' expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: ParamType,
        actual: Value,
    },

    /// More positional values than declared parameters.
    ///
    /// Pairing positionals with parameter names alone would drop the surplus
    /// silently and leave the failure to call time; this rejects it at bind
    /// time instead, checked right after the positional/keyword merge.
    #[error("takes {expected} positional arguments but {given} were given")]
    TooManyPositional { expected: usize, given: usize },
}

impl Rejection {
    /// The offending parameter, when the rejection is about one.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Rejection::DuplicateArgument(name)
            | Rejection::UnexpectedArgument(name)
            | Rejection::MissingRequiredArgument(name)
            | Rejection::TypeMismatch { name, .. } => Some(name),
            Rejection::TooManyPositional { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("cannot bind {function}: {rejection}")]
    Rejected {
        function: String,
        rejection: Rejection,
    },
}

impl BindError {
    pub fn rejection(&self) -> &Rejection {
        match self {
            BindError::Rejected { rejection, .. } => rejection,
        }
    }
}

/// Error raised by a function while it runs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvocationError {
    /// The bound arguments do not fit the function's parameters.
    #[error("{function}() {message}")]
    BadCall { function: String, message: String },

    /// An argument had the wrong shape for what the body asked of it.
    #[error("argument '{name}': {message}")]
    BadArgument { name: String, message: String },

    #[error("{message}")]
    Failed { message: String },
}

impl InvocationError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    pub fn bad_argument(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadArgument {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Failure to move a task or its result across the process boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportError {
    #[error("function {function} is not registered by name and cannot cross a process boundary")]
    NotTransferable { function: String },

    #[error("worker has no function named '{name}'")]
    UnknownFunction { name: String },

    #[error("encode failed: {message}")]
    Encode { message: String },

    #[error("decode failed: {message}")]
    Decode { message: String },

    #[error("io: {message}")]
    Io { message: String },

    #[error("worker exited before answering")]
    WorkerLost,

    #[error("worker answered request {got}, expected {expected}")]
    UnexpectedResponse { expected: u64, got: u64 },
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            message: e.to_string(),
        }
    }
}

/// Failure of one task slot in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("transport: {0}")]
    Transport(#[from] TransportError),
}

/// Failure of a whole batch: the worker pool could not be used at all.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("max_workers must be positive, got {0}")]
    InvalidWorkerCount(usize),

    #[error("failed to start worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("cannot build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("worker pool join failed: {0}")]
    Join(String),
}
