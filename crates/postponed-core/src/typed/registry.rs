//! FunctionRegistry - 名前付き Function の登録と管理
//!
//! 親プロセスとワーカープロセスは同じ登録内容を持つ前提です。
//! タスクは関数そのものではなく「名前」でプロセス境界を越え、
//! ワーカー側がこの registry から実体を引きます。
//!
//! # 学習ポイント
//! - HashMap での型消去された callable の管理
//! - 二重登録は登録時にエラー（Fail-fast）

use std::collections::HashMap;

use super::function::Function;

/// FunctionRegistry は名前 → Function の表
///
/// # 使用例
/// ```ignore
/// let mut registry = FunctionRegistry::new();
/// registry.register(double())?;
/// let f = registry.get("double");
/// ```
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, Function>,
}

/// RegistryError は FunctionRegistry の操作エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("function '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("anonymous functions cannot be registered")]
    Anonymous,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    pub fn register(&mut self, function: Function) -> Result<(), RegistryError> {
        let name = function.name().ok_or(RegistryError::Anonymous)?.to_string();
        if self.functions.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        self.functions.insert(name, function);
        Ok(())
    }

    /// Builder-style registration.
    pub fn with(mut self, function: Function) -> Result<Self, RegistryError> {
        self.register(function)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signature::Signature;
    use serde_json::json;

    fn constant(name: &str) -> Function {
        Function::named(name, Signature::empty(), |_| Ok(json!(1)))
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = FunctionRegistry::new();
        registry.register(constant("one")).unwrap();

        let retrieved = registry.get("one");
        assert!(retrieved.is_some());
        assert!(registry.get("two").is_none());
    }

    #[test]
    fn test_double_registration() {
        let mut registry = FunctionRegistry::new();
        registry.register(constant("one")).unwrap();
        let result = registry.register(constant("one"));
        assert_eq!(result, Err(RegistryError::AlreadyRegistered("one".to_string())));
    }

    #[test]
    fn test_anonymous_rejected() {
        let mut registry = FunctionRegistry::new();
        let f = Function::anonymous(Signature::empty(), |_| Ok(json!(null)));
        assert_eq!(registry.register(f), Err(RegistryError::Anonymous));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_names_are_sorted() {
        let registry = FunctionRegistry::new()
            .with(constant("b"))
            .unwrap()
            .with(constant("a"))
            .unwrap();
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
    }
}
