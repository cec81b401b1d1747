//! Built-in functions - デモ・テスト・CLI ワーカー用の関数セット
//!
//! 親プロセスとワーカープロセスが同じ `builtin_registry()` を使うので、
//! ここに並んだ関数はプロセス実行できます。

use std::thread;
use std::time::Duration;

use serde_json::Value;

use crate::domain::errors::InvocationError;
use crate::domain::signature::{ParamType, Signature, SignatureError};
use crate::typed::function::Function;
use crate::typed::registry::{FunctionRegistry, RegistryError};

#[derive(Debug, thiserror::Error)]
pub enum BuiltinError {
    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// `double(v: float) -> float`. Integers stay integers: `double(3) == 6`.
pub fn double() -> Result<Function, SignatureError> {
    let sig = Signature::builder().required("v", ParamType::Float).build()?;
    Ok(Function::named("double", sig, |args| {
        match args.get("v")?.as_i64().and_then(|v| v.checked_mul(2)) {
            Some(doubled) => Ok(Value::from(doubled)),
            None => Ok(Value::from(2.0 * args.f64("v")?)),
        }
    }))
}

/// `multiply(a: float, b: float) -> float`
pub fn multiply() -> Result<Function, SignatureError> {
    let sig = Signature::builder()
        .required("a", ParamType::Float)
        .required("b", ParamType::Float)
        .build()?;
    Ok(Function::named("multiply", sig, |args| {
        Ok(Value::from(args.f64("a")? * args.f64("b")?))
    }))
}

/// `repeat_string(s: str, n: int) -> str`
pub fn repeat_string() -> Result<Function, SignatureError> {
    let sig = Signature::builder()
        .required("s", ParamType::Str)
        .required("n", ParamType::Int)
        .build()?;
    Ok(Function::named("repeat_string", sig, |args| {
        let s = args.str("s")?;
        let n = usize::try_from(args.i64("n")?).unwrap_or(0);
        Ok(Value::from(s.repeat(n)))
    }))
}

/// `sleep_echo(ms: int, value: any = null) -> any`, sleeps then returns `value`.
pub fn sleep_echo() -> Result<Function, SignatureError> {
    let sig = Signature::builder()
        .required("ms", ParamType::Int)
        .optional("value", ParamType::Any, Value::Null)
        .build()?;
    Ok(Function::named("sleep_echo", sig, |args| {
        let ms = u64::try_from(args.i64("ms")?)
            .map_err(|_| InvocationError::bad_argument("ms", "must not be negative"))?;
        thread::sleep(Duration::from_millis(ms));
        Ok(args.get("value")?.clone())
    }))
}

/// `fail(message: str)`, always raises.
pub fn fail() -> Result<Function, SignatureError> {
    let sig = Signature::builder().required("message", ParamType::Str).build()?;
    Ok(Function::named("fail", sig, |args| {
        Err(InvocationError::failed(args.str("message")?))
    }))
}

/// Every built-in, by name.
pub fn builtin_registry() -> Result<FunctionRegistry, BuiltinError> {
    let mut registry = FunctionRegistry::new();
    for function in [double()?, multiply()?, repeat_string()?, sleep_echo()?, fail()?] {
        registry.register(function)?;
    }
    Ok(registry)
}
