//! Domain identifiers (strongly-typed IDs).
//!
//! ULID ベースの ID を Phantom type パターンで型付けしています。
//!
//! ## なぜ ID が必要か
//! DeferredTask は「同じ関数・同じ引数」で何度でも作れます。中身が等しくても
//! 別々に bind されたタスクは別物なので、生成ごとに新しい `TaskId` を振って
//! identity を区別します。`BatchId` は 1 回の `run` をログ上で追跡するためのものです。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"task-", "batch-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は PhantomData で、実行時にはメモリを消費しません。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// 新しい ID を生成（現在時刻 + ランダム）
    pub fn generate() -> Self {
        Self {
            ulid: Ulid::new(),
            _marker: PhantomData,
        }
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// DeferredTask のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// Batch（1 回の executor 実行）のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Batch {}

impl IdMarker for Batch {
    fn prefix() -> &'static str {
        "batch-"
    }
}

/// Identity of one bound deferred task.
pub type TaskId = Id<Task>;

/// Identity of one executor run.
pub type BatchId = Id<Batch>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_have_prefixes() {
        let task = TaskId::generate();
        let batch = BatchId::generate();

        assert!(task.to_string().starts_with("task-"));
        assert!(batch.to_string().starts_with("batch-"));

        // let _: TaskId = batch; // <- does not compile
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = TaskId::generate();
        let b = TaskId::generate();
        assert_ne!(a, b);
    }
}
