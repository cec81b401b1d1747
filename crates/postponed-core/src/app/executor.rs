//! BatchExecutor - バッチ実行の共通インターフェース
//!
//! 実装は 2 つ:
//! - **ThreadExecutor**: 同じプロセス内のワーカースレッド
//! - **ProcessExecutor**: 分離されたワーカープロセス
//!
//! どちらも
//! - 同時実行数は `max_workers` 以下
//! - 結果は投入順（完了順ではない）
//! - プールは `run` の間だけ存在し、成功でも失敗でも返る前に片付ける
//! - 1 つのタスクの失敗で他のタスクは止まらない

use async_trait::async_trait;

use super::results::BatchResults;
use crate::domain::errors::BatchError;
use crate::domain::task::DeferredTask;

#[async_trait]
pub trait BatchExecutor: Send + Sync {
    async fn run(&self, tasks: Vec<DeferredTask>) -> Result<BatchResults, BatchError>;

    fn max_workers(&self) -> usize;
}

pub(crate) fn check_worker_count(max_workers: usize) -> Result<(), BatchError> {
    if max_workers == 0 {
        return Err(BatchError::InvalidWorkerCount(max_workers));
    }
    Ok(())
}
