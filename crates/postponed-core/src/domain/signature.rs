//! Signature - 関数の仮引数の宣言
//!
//! 関数ごとに 1 度だけ組み立てる静的な記述です。リフレクションは使わず、
//! 関数を定義する側が明示的に `ParamSpec` を並べます。
//!
//! # 学習ポイント
//! - Builder パターン（`Signature::builder()`）
//! - 閉じた enum による型表現（`ParamType`）
//! - 不変条件（名前の一意性）を build 時に検査する

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Declared type of a parameter.
///
/// A closed set of shapes. `Any` always conforms; containers check their
/// elements recursively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum ParamType {
    Any,
    None,
    Bool,
    Int,
    /// Any JSON number. Integers widen to float.
    Float,
    Str,
    List(Box<ParamType>),
    /// Fixed-length array, element-wise.
    Tuple(Vec<ParamType>),
    /// Object with string keys; values checked against the inner type.
    Dict(Box<ParamType>),
    Optional(Box<ParamType>),
    Union(Vec<ParamType>),
}

impl ParamType {
    pub fn list(inner: ParamType) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn dict(inner: ParamType) -> Self {
        Self::Dict(Box::new(inner))
    }

    pub fn optional(inner: ParamType) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Whether `value` conforms to this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::Any => true,
            ParamType::None => value.is_null(),
            ParamType::Bool => value.is_boolean(),
            ParamType::Int => value.is_i64() || value.is_u64(),
            ParamType::Float => value.is_number(),
            ParamType::Str => value.is_string(),
            ParamType::List(inner) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| inner.accepts(item))),
            ParamType::Tuple(types) => value.as_array().is_some_and(|items| {
                items.len() == types.len()
                    && types.iter().zip(items).all(|(ty, item)| ty.accepts(item))
            }),
            ParamType::Dict(inner) => value
                .as_object()
                .is_some_and(|map| map.values().all(|item| inner.accepts(item))),
            ParamType::Optional(inner) => value.is_null() || inner.accepts(value),
            ParamType::Union(types) => types.iter().any(|ty| ty.accepts(value)),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Any => write!(f, "any"),
            ParamType::None => write!(f, "None"),
            ParamType::Bool => write!(f, "bool"),
            ParamType::Int => write!(f, "int"),
            ParamType::Float => write!(f, "float"),
            ParamType::Str => write!(f, "str"),
            ParamType::List(inner) => write!(f, "list[{inner}]"),
            ParamType::Tuple(types) => {
                write!(f, "tuple[")?;
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{ty}")?;
                }
                write!(f, "]")
            }
            ParamType::Dict(inner) => write!(f, "dict[str, {inner}]"),
            ParamType::Optional(inner) => write!(f, "Optional[{inner}]"),
            ParamType::Union(types) => {
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{ty}")?;
                }
                Ok(())
            }
        }
    }
}

/// One formal parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ParamType,
    /// Default value. `Some` means the parameter may be omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    /// Create a required parameter.
    pub fn required(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    /// Create an optional parameter with a default value.
    pub fn optional(name: impl Into<String>, ty: ParamType, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            ty,
            default: Some(default.into()),
        }
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("parameter '{0}' is declared twice")]
    DuplicateParameter(String),
}

/// Signature は関数の仮引数を宣言順に保持する
///
/// # 不変条件
/// - 名前は一意（`build()` で検査）
/// - 構築後は変更できない
///
/// # 使用例
/// ```ignore
/// let sig = Signature::builder()
///     .required("a", ParamType::Float)
///     .optional("b", ParamType::Float, 1.0)
///     .build()?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    params: Vec<ParamSpec>,
}

impl Signature {
    /// A signature with no parameters.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> SignatureBuilder {
        SignatureBuilder::default()
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", p.name, p.ty)?;
            if let Some(default) = &p.default {
                write!(f, " = {default}")?;
            }
        }
        write!(f, ")")
    }
}

impl TryFrom<Vec<ParamSpec>> for Signature {
    type Error = SignatureError;

    fn try_from(params: Vec<ParamSpec>) -> Result<Self, Self::Error> {
        for (i, p) in params.iter().enumerate() {
            if params[..i].iter().any(|q| q.name == p.name) {
                return Err(SignatureError::DuplicateParameter(p.name.clone()));
            }
        }
        Ok(Self { params })
    }
}

#[derive(Debug, Default)]
pub struct SignatureBuilder {
    params: Vec<ParamSpec>,
}

impl SignatureBuilder {
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn required(self, name: impl Into<String>, ty: ParamType) -> Self {
        self.param(ParamSpec::required(name, ty))
    }

    pub fn optional(self, name: impl Into<String>, ty: ParamType, default: impl Into<Value>) -> Self {
        self.param(ParamSpec::optional(name, ty, default))
    }

    pub fn build(self) -> Result<Signature, SignatureError> {
        Signature::try_from(self.params)
    }
}
