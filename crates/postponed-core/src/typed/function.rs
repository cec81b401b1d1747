//! Function - 引数の宣言と本体をひとまとめにした呼び出し可能オブジェクト
//!
//! # 二種類の Function
//! - **named**: 名前で登録できる。ワーカープロセス側も同じ名前で引けるので
//!   プロセス境界を越えられる
//! - **anonymous**: 任意の closure。スレッド実行はできるがプロセス実行はできない
//!
//! # 呼び出しの流れ
//! 1. `CallArgs::bind` で位置引数・キーワード引数を仮引数に割り当てる
//!    （足りない・多すぎる・二重指定はここで `InvocationError::BadCall`）
//! 2. デフォルト値を埋める
//! 3. 本体を実行。本体は `CallArgs::f64("a")?` のように値を取り出す

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::args::Arguments;
use crate::domain::errors::InvocationError;
use crate::domain::signature::Signature;

type Body = dyn Fn(&CallArgs) -> Result<Value, InvocationError> + Send + Sync;

/// A callable with a declared signature.
///
/// Cheap to clone; the signature and the body are shared.
#[derive(Clone)]
pub struct Function {
    name: Option<Arc<str>>,
    signature: Arc<Signature>,
    body: Arc<Body>,
}

impl Function {
    /// A function addressable by `name`. Only named functions can run in a
    /// worker process.
    pub fn named<F>(name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        F: Fn(&CallArgs) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        let name: String = name.into();
        Self {
            name: Some(Arc::from(name)),
            signature: Arc::new(signature),
            body: Arc::new(body),
        }
    }

    /// A closure without a name. Runs on threads only.
    pub fn anonymous<F>(signature: Signature, body: F) -> Self
    where
        F: Fn(&CallArgs) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        Self {
            name: None,
            signature: Arc::new(signature),
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for messages; anonymous functions show as `<anonymous>`.
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or("<anonymous>")
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Call with native argument binding. Nothing is checked beyond what
    /// binding needs; value types are the body's business.
    pub fn call(&self, args: &Arguments) -> Result<Value, InvocationError> {
        let bound = CallArgs::bind(self, args)?;
        (self.body)(&bound)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.display_name())
            .field("signature", &self.signature.to_string())
            .finish()
    }
}

/// Arguments matched to parameter names, defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct CallArgs {
    values: Map<String, Value>,
}

impl CallArgs {
    /// Bind `args` to the parameters of `function` the way a plain call would.
    pub fn bind(function: &Function, args: &Arguments) -> Result<Self, InvocationError> {
        let signature = function.signature();
        let bad_call = |message: String| InvocationError::BadCall {
            function: function.display_name().to_string(),
            message,
        };

        if args.positional.len() > signature.len() {
            return Err(bad_call(format!(
                "takes {} positional arguments but {} were given",
                signature.len(),
                args.positional.len()
            )));
        }

        let mut values = Map::new();
        for (name, value) in signature.names().zip(&args.positional) {
            values.insert(name.to_string(), value.clone());
        }

        for (name, value) in &args.keyword {
            if !signature.contains(name) {
                return Err(bad_call(format!(
                    "got an unexpected keyword argument '{name}'"
                )));
            }
            if values.contains_key(name) {
                return Err(bad_call(format!("got multiple values for argument '{name}'")));
            }
            values.insert(name.clone(), value.clone());
        }

        let mut ordered = Map::new();
        for param in signature.params() {
            match values.remove(&param.name).or_else(|| param.default.clone()) {
                Some(value) => {
                    ordered.insert(param.name.clone(), value);
                }
                None => {
                    return Err(bad_call(format!(
                        "missing required argument: '{}'",
                        param.name
                    )));
                }
            }
        }

        Ok(Self { values: ordered })
    }

    pub fn get(&self, name: &str) -> Result<&Value, InvocationError> {
        self.values
            .get(name)
            .ok_or_else(|| InvocationError::bad_argument(name, "no such parameter"))
    }

    pub fn f64(&self, name: &str) -> Result<f64, InvocationError> {
        let value = self.get(name)?;
        value.as_f64().ok_or_else(|| mismatch(name, "float", value))
    }

    pub fn i64(&self, name: &str) -> Result<i64, InvocationError> {
        let value = self.get(name)?;
        value.as_i64().ok_or_else(|| mismatch(name, "int", value))
    }

    pub fn str(&self, name: &str) -> Result<&str, InvocationError> {
        let value = self.get(name)?;
        value.as_str().ok_or_else(|| mismatch(name, "str", value))
    }

    pub fn bool(&self, name: &str) -> Result<bool, InvocationError> {
        let value = self.get(name)?;
        value.as_bool().ok_or_else(|| mismatch(name, "bool", value))
    }

    pub fn array(&self, name: &str) -> Result<&[Value], InvocationError> {
        let value = self.get(name)?;
        value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| mismatch(name, "list", value))
    }

    /// All bound values in declared parameter order.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

fn mismatch(name: &str, expected: &str, got: &Value) -> InvocationError {
    InvocationError::bad_argument(name, format!("expected {expected}, got {got}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signature::ParamType;
    use serde_json::json;

    fn repeat_string() -> Function {
        let sig = Signature::builder()
            .required("s", ParamType::Str)
            .required("n", ParamType::Int)
            .optional("sep", ParamType::Str, "")
            .build()
            .unwrap();
        Function::named("repeat_string", sig, |args| {
            let s = args.str("s")?;
            let n = args.i64("n")?;
            let sep = args.str("sep")?;
            let parts = vec![s; n.max(0) as usize];
            Ok(Value::from(parts.join(sep)))
        })
    }

    #[test]
    fn call_binds_positional_and_keyword() {
        let f = repeat_string();
        let out = f.call(&Arguments::new().arg("ab").kwarg("n", 3)).unwrap();
        assert_eq!(out, json!("ababab"));

        let out = f
            .call(&Arguments::new().kwarg("sep", "-").kwarg("n", 2).kwarg("s", "x"))
            .unwrap();
        assert_eq!(out, json!("x-x"));
    }

    #[test]
    fn call_reports_binding_problems_natively() {
        let f = repeat_string();

        let err = f.call(&Arguments::positional(["a"])).unwrap_err();
        assert_eq!(
            err,
            InvocationError::BadCall {
                function: "repeat_string".to_string(),
                message: "missing required argument: 'n'".to_string(),
            }
        );

        let err = f.call(&Arguments::new().arg("a").kwarg("s", "b")).unwrap_err();
        assert!(err.to_string().contains("multiple values for argument 's'"));

        let err = f
            .call(&Arguments::new().arg("a").arg(1).kwarg("x", 0))
            .unwrap_err();
        assert!(err.to_string().contains("unexpected keyword argument 'x'"));

        let err = f.call(&Arguments::positional([json!("a"), json!(1), json!(""), json!(0)]));
        assert!(err.unwrap_err().to_string().contains("takes 3 positional arguments but 4"));
    }

    #[test]
    fn body_accessors_report_bad_argument() {
        let f = repeat_string();
        let err = f.call(&Arguments::new().kwarg("s", 1).kwarg("n", "a")).unwrap_err();
        assert_eq!(err, InvocationError::bad_argument("s", "expected str, got 1"));
    }

    #[test]
    fn call_args_are_in_declared_order_with_defaults() {
        let f = repeat_string();
        let bound = CallArgs::bind(&f, &Arguments::new().kwarg("n", 1).kwarg("s", "z")).unwrap();
        assert_eq!(bound.values().keys().collect::<Vec<_>>(), vec!["s", "n", "sep"]);
        assert_eq!(bound.get("sep").unwrap(), &json!(""));
    }

    #[test]
    fn anonymous_functions_have_no_name() {
        let f = Function::anonymous(Signature::empty(), |_| Ok(json!(42)));
        assert_eq!(f.name(), None);
        assert_eq!(f.display_name(), "<anonymous>");
        assert_eq!(f.call(&Arguments::new()).unwrap(), json!(42));
    }
}
