//! Validation - bind 時の引数検査（fail-fast）
//!
//! 検査の順番はエラーメッセージの決定性のために固定です。
//!
//! 1. 位置引数を宣言順の名前に zip し、キーワード引数とマージ（二重指定 → `DuplicateArgument`）
//! 2. 宣言より多い位置引数 → `TooManyPositional`（zip だけだと黙って捨てられる余りを bind 時に弾く）
//! 3. 宣言にないキーワード引数 → `UnexpectedArgument`
//! 4. デフォルトのない引数の欠落 → `MissingRequiredArgument`
//! 5. マージ結果の各値の型 → `TypeMismatch`
//!
//! I/O も副作用もありません。

use serde_json::{Map, Value};

use super::args::Arguments;
use super::errors::Rejection;
use super::signature::Signature;

/// Check `args` against `signature`.
///
/// Returns the first problem found, in the order listed in the module docs.
pub fn validate(signature: &Signature, args: &Arguments) -> Result<(), Rejection> {
    let mut merged: Map<String, Value> = args.keyword.clone();
    for (name, value) in signature.names().zip(&args.positional) {
        if merged.contains_key(name) {
            return Err(Rejection::DuplicateArgument(name.to_string()));
        }
        merged.insert(name.to_string(), value.clone());
    }

    if args.positional.len() > signature.len() {
        return Err(Rejection::TooManyPositional {
            expected: signature.len(),
            given: args.positional.len(),
        });
    }

    if let Some(name) = args.keyword.keys().find(|name| !signature.contains(name)) {
        return Err(Rejection::UnexpectedArgument(name.clone()));
    }

    if let Some(param) = signature
        .params()
        .iter()
        .find(|p| !p.has_default() && !merged.contains_key(&p.name))
    {
        return Err(Rejection::MissingRequiredArgument(param.name.clone()));
    }

    for (name, value) in &merged {
        // every merged name is a declared parameter at this point
        let Some(param) = signature.get(name) else {
            return Err(Rejection::UnexpectedArgument(name.clone()));
        };
        if !param.ty.accepts(value) {
            return Err(Rejection::TypeMismatch {
                name: name.clone(),
                expected: param.ty.clone(),
                actual: value.clone(),
            });
        }
    }

    Ok(())
}
