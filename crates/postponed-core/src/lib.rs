//! postponed-core
//!
//! Deferred function calls and bounded batch execution.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, signature, args, validation, errors, task）
//! - **typed**: 呼び出せる関数（Function, CallArgs, FunctionRegistry, wire codec）
//! - **app**: 束縛とバッチ実行（postponed, ThreadExecutor, ProcessExecutor, config）
//! - **impls**: 実装（line transport, built-in functions）
//! - **worker**: ワーカープロセス側のループ
//!
//! # 使用例
//! ```ignore
//! let tasks = postponed(double).bind_many([3, 3, 4, 6].map(|v| Arguments::positional([v])))?;
//! let results = run_threaded(&tasks, 2)?;
//! assert_eq!(results.into_values()?, vec![json!(6), json!(6), json!(8), json!(12)]);
//! ```

pub mod domain;
pub mod typed;
pub mod app;
pub mod impls;
pub mod worker;

pub use app::{
    BatchExecutor, BatchResults, ConfigError, PoolConfig, Postponed, ProcessExecutor,
    ThreadExecutor, WorkerCommand, postponed, run_isolated, run_threaded,
};
pub use domain::{
    Arguments, BatchError, BindError, DeferredTask, InvocationError, ParamSpec, ParamType,
    Rejection, Signature, SignatureError, TaskError, TaskId, TransportError, validate,
};
pub use impls::builtins::builtin_registry;
pub use typed::{CallArgs, Function, FunctionRegistry, RegistryError};
