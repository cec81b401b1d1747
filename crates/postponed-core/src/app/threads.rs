//! ThreadExecutor - 共有メモリのワーカースレッドでバッチを実行
//!
//! # 実装
//! - `run` ごとに `min(max_workers, タスク数)` 本の rayon `ThreadPool` を作る
//! - `pool.install` の中で `par_iter` を回す。`collect` は入力順を保つので
//!   完了順に関係なく結果は投入順
//! - panic はタスクごとに `catch_unwind` で捕まえ、そのスロットだけの失敗にする
//! - pool は `run` を抜けると drop される（プールは run の中だけで完結）
//!
//! ユーザー関数の副作用に対する同期は一切しません。

use std::panic::{self, AssertUnwindSafe};

use async_trait::async_trait;
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info};

use super::executor::{BatchExecutor, check_worker_count};
use super::results::BatchResults;
use crate::domain::errors::{BatchError, TaskError};
use crate::domain::ids::BatchId;
use crate::domain::task::DeferredTask;
use crate::worker::panic_message;

/// Bounded pool of worker threads, created per `run`.
#[derive(Debug, Clone)]
pub struct ThreadExecutor {
    max_workers: usize,
}

impl ThreadExecutor {
    pub fn new(max_workers: usize) -> Self {
        Self { max_workers }
    }

    /// Run `tasks` on the calling thread's behalf and block until all are done.
    pub fn run_blocking(&self, tasks: &[DeferredTask]) -> Result<BatchResults, BatchError> {
        check_worker_count(self.max_workers)?;
        if tasks.is_empty() {
            return Ok(BatchResults::new(Vec::new()));
        }

        let batch_id = BatchId::generate();
        let workers = self.max_workers.min(tasks.len());
        info!(%batch_id, tasks = tasks.len(), workers, "thread batch started");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("postponed-worker-{i}"))
            .build()?;
        let results: Vec<Result<Value, TaskError>> =
            pool.install(|| tasks.par_iter().enumerate().map(run_one).collect());

        let results = BatchResults::new(results);
        info!(
            %batch_id,
            succeeded = results.successes().count(),
            failed = results.failures().count(),
            "thread batch finished"
        );
        Ok(results)
    }
}

#[async_trait]
impl BatchExecutor for ThreadExecutor {
    async fn run(&self, tasks: Vec<DeferredTask>) -> Result<BatchResults, BatchError> {
        let executor = self.clone();
        tokio::task::spawn_blocking(move || executor.run_blocking(&tasks))
            .await
            .map_err(|e| BatchError::Join(e.to_string()))?
    }

    fn max_workers(&self) -> usize {
        self.max_workers
    }
}

/// Run `tasks` on at most `max_workers` threads; results in input order.
pub fn run_threaded(tasks: &[DeferredTask], max_workers: usize) -> Result<BatchResults, BatchError> {
    ThreadExecutor::new(max_workers).run_blocking(tasks)
}

fn run_one((index, task): (usize, &DeferredTask)) -> Result<Value, TaskError> {
    debug!(
        worker = rayon::current_thread_index(),
        index,
        task_id = %task.id(),
        "task started"
    );
    let result = match panic::catch_unwind(AssertUnwindSafe(|| task.invoke())) {
        Ok(result) => result.map_err(TaskError::from),
        Err(payload) => Err(TaskError::Panicked(panic_message(payload))),
    };
    debug!(index, ok = result.is_ok(), "task finished");
    result
}
