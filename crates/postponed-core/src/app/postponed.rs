//! Postponed - 関数を包んで DeferredTask を作るファクトリ
//!
//! # Fail-fast 設計
//! - `check_inputs = true`（デフォルト）なら bind 時に `validate` を走らせる
//! - 検査に落ちたらタスクは作られず、その場で `BindError` を返す
//! - `check_inputs = false` なら検査は省略。引数の問題は invoke 時に
//!   関数自身のエラーとして表に出る
//!
//! # 使用例
//! ```ignore
//! let task = postponed(multiply()).bind(Arguments::new().kwarg("a", 1.0).kwarg("b", 2.0))?;
//! assert_eq!(task.invoke()?, json!(2.0));
//! ```

use tracing::debug;

use crate::domain::args::Arguments;
use crate::domain::errors::BindError;
use crate::domain::task::DeferredTask;
use crate::domain::validation::validate;
use crate::typed::function::Function;

/// Wrap `function` with input checking enabled.
pub fn postponed(function: Function) -> Postponed {
    Postponed::new(function, true)
}

/// Deferred version of a function. Each `bind` yields a new, independent task.
#[derive(Debug, Clone)]
pub struct Postponed {
    function: Function,
    check_inputs: bool,
}

impl Postponed {
    pub fn new(function: Function, check_inputs: bool) -> Self {
        Self {
            function,
            check_inputs,
        }
    }

    pub fn with_check_inputs(mut self, check_inputs: bool) -> Self {
        self.check_inputs = check_inputs;
        self
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn checks_inputs(&self) -> bool {
        self.check_inputs
    }

    /// Bind `args` into a task, checking them first when enabled.
    pub fn bind(&self, args: Arguments) -> Result<DeferredTask, BindError> {
        if self.check_inputs
            && let Err(rejection) = validate(self.function.signature(), &args)
        {
            debug!(
                function = self.function.display_name(),
                parameter = rejection.parameter(),
                %rejection,
                "binding rejected"
            );
            return Err(BindError::Rejected {
                function: self.function.display_name().to_string(),
                rejection,
            });
        }
        let task = DeferredTask::new(self.function.clone(), args);
        debug!(function = self.function.display_name(), task_id = %task.id(), "task bound");
        Ok(task)
    }

    /// Bind every argument set, stopping at the first rejection.
    pub fn bind_many<I>(&self, arg_sets: I) -> Result<Vec<DeferredTask>, BindError>
    where
        I: IntoIterator<Item = Arguments>,
    {
        arg_sets.into_iter().map(|args| self.bind(args)).collect()
    }
}
