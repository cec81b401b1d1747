//! DeferredTask - 関数と引数を固定した「あとで呼ぶ」オブジェクト
//!
//! 構築は純粋なデータの取り込みで、検査はしません（検査は `Postponed` の役目）。
//! 構築後はどのフィールドも変わりません。`invoke()` は何度呼んでもよく、
//! 毎回関数を実行し直します（メモ化しない）。

use std::sync::Arc;

use serde_json::Value;

use super::args::Arguments;
use super::errors::InvocationError;
use super::ids::TaskId;
use crate::typed::function::Function;

/// An immutable binding of a function and its arguments.
///
/// Clones share the snapshot and the id. Two separate `new` calls always get
/// different ids, even with identical arguments.
#[derive(Debug, Clone)]
pub struct DeferredTask {
    id: TaskId,
    function: Function,
    args: Arc<Arguments>,
}

impl DeferredTask {
    pub fn new(function: Function, args: Arguments) -> Self {
        Self {
            id: TaskId::generate(),
            function,
            args: Arc::new(args),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn arguments(&self) -> &Arguments {
        &self.args
    }

    /// Run the function with the bound arguments. Errors come back exactly as
    /// the function raised them.
    pub fn invoke(&self) -> Result<Value, InvocationError> {
        self.function.call(&self.args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signature::{ParamType, Signature};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn double() -> Function {
        let sig = Signature::builder().required("v", ParamType::Float).build().unwrap();
        Function::named("double", sig, |args| Ok(Value::from(2.0 * args.f64("v")?)))
    }

    #[test]
    fn invoke_matches_direct_call() {
        let f = double();
        let args = Arguments::positional([5.0]);
        let task = DeferredTask::new(f.clone(), args.clone());
        assert_eq!(task.invoke(), f.call(&args));
        assert_eq!(task.invoke().unwrap(), json!(10.0));
    }

    #[test]
    fn invoke_is_not_memoized() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&counter);
        let f = Function::anonymous(Signature::empty(), move |_| {
            Ok(json!(c.fetch_add(1, Ordering::SeqCst)))
        });
        let task = DeferredTask::new(f, Arguments::new());

        assert_eq!(task.invoke().unwrap(), json!(0));
        assert_eq!(task.invoke().unwrap(), json!(1));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn construction_never_validates() {
        // 型が合わなくても作れる。失敗するのは invoke のとき
        let task = DeferredTask::new(double(), Arguments::positional(["x"]));
        assert!(matches!(
            task.invoke(),
            Err(InvocationError::BadArgument { name, .. }) if name == "v"
        ));
    }

    #[test]
    fn errors_propagate_unchanged() {
        let f = Function::anonymous(Signature::empty(), |_| Err(InvocationError::failed("nope")));
        let task = DeferredTask::new(f, Arguments::new());
        assert_eq!(task.invoke(), Err(InvocationError::failed("nope")));
    }

    #[test]
    fn clones_share_identity() {
        let task = DeferredTask::new(double(), Arguments::positional([1]));
        let clone = task.clone();
        assert_eq!(task.id(), clone.id());
        assert_eq!(clone.arguments(), task.arguments());
    }
}
