//! ProcessExecutor - 分離されたワーカープロセスでバッチを実行
//!
//! # フロー
//! 1. 全タスクを `WireTask` に encode（名前のない関数はここでそのスロットだけ失敗）
//! 2. `min(max_workers, 送れるタスク数)` 個のワーカープロセスを起動
//! 3. ワーカーごとに 1 つの tokio task が共有キューから取り出し、
//!    request を 1 行送って response を 1 行待つ
//! 4. キューが空になったら stdin を閉じる → ワーカーは終了 → wait で回収
//! 5. index で並べ直して返す
//!
//! # 失敗の扱い
//! - 関数のエラー・panic はそのスロットだけの失敗（他のタスクは続行）
//! - ワーカーとの通信が壊れたら、処理中だったスロットだけが transport エラー。
//!   そのワーカーは kill し、キューが残っていれば同じ command で新しいワーカーを起動する
//! - 代わりのワーカーも起動できず誰にも実行されなかったスロットは `TransportError::WorkerLost`
//! - 子プロセスは `kill_on_drop` なので、どの経路で抜けても残らない

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::executor::{BatchExecutor, check_worker_count};
use super::results::BatchResults;
use crate::domain::errors::{BatchError, TaskError, TransportError};
use crate::domain::ids::BatchId;
use crate::domain::task::DeferredTask;
use crate::impls::transport::Transport;
use crate::typed::codec::{self, Request, Response, WireOutcome};

/// How to start one worker process.
///
/// The program must answer the line protocol of [`crate::worker::serve`]
/// with the same functions registered as the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCommand {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The running executable, started again with `args`.
    pub fn current_exe<I, S>(args: I) -> std::io::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            program: std::env::current_exe()?,
            args: args.into_iter().map(Into::into).collect(),
        })
    }

    fn spawn(&self) -> std::io::Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
    }
}

/// Bounded pool of worker processes, created per `run`.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    max_workers: usize,
    command: WorkerCommand,
}

impl ProcessExecutor {
    pub fn new(max_workers: usize, command: WorkerCommand) -> Self {
        Self {
            max_workers,
            command,
        }
    }

    pub fn command(&self) -> &WorkerCommand {
        &self.command
    }
}

#[async_trait]
impl BatchExecutor for ProcessExecutor {
    async fn run(&self, tasks: Vec<DeferredTask>) -> Result<BatchResults, BatchError> {
        check_worker_count(self.max_workers)?;
        let batch_id = BatchId::generate();

        let mut slots: Vec<Option<Result<Value, TaskError>>> = vec![None; tasks.len()];
        let mut pending = VecDeque::with_capacity(tasks.len());
        for (index, task) in tasks.iter().enumerate() {
            match codec::encode(task) {
                Ok(wire) => pending.push_back(Request {
                    id: index as u64,
                    task: wire,
                }),
                Err(e) => {
                    warn!(%batch_id, index, error = %e, "task cannot be sent to a worker");
                    slots[index] = Some(Err(e.into()));
                }
            }
        }

        let workers = self.max_workers.min(pending.len());
        info!(
            %batch_id,
            tasks = tasks.len(),
            workers,
            program = %self.command.program.display(),
            "process batch started"
        );

        // 1 つでも起動に失敗したら、起動済みの子は drop で kill される
        let mut children = Vec::with_capacity(workers);
        for _ in 0..workers {
            children.push(self.command.spawn().map_err(BatchError::Spawn)?);
        }

        let queue = Arc::new(Mutex::new(pending));
        let command = Arc::new(self.command.clone());
        let mut drivers = JoinSet::new();
        for (worker_id, child) in children.into_iter().enumerate() {
            drivers.spawn(drive_worker(
                worker_id,
                child,
                Arc::clone(&command),
                Arc::clone(&queue),
            ));
        }
        while let Some(joined) = drivers.join_next().await {
            match joined {
                Ok(done) => {
                    for (index, result) in done {
                        slots[index] = Some(result);
                    }
                }
                Err(e) => warn!(%batch_id, error = %e, "worker driver failed"),
            }
        }

        let results = BatchResults::new(
            slots
                .into_iter()
                .map(|slot| slot.unwrap_or(Err(TaskError::Transport(TransportError::WorkerLost))))
                .collect(),
        );
        info!(
            %batch_id,
            succeeded = results.successes().count(),
            failed = results.failures().count(),
            "process batch finished"
        );
        Ok(results)
    }

    fn max_workers(&self) -> usize {
        self.max_workers
    }
}

/// Run `tasks` on at most `max_workers` processes started from `command`;
/// results in input order.
pub async fn run_isolated(
    tasks: Vec<DeferredTask>,
    max_workers: usize,
    command: &WorkerCommand,
) -> Result<BatchResults, BatchError> {
    ProcessExecutor::new(max_workers, command.clone()).run(tasks).await
}

/// How one worker process stopped serving the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// Queue is empty.
    Drained,
    /// Lost contact while a request was in flight.
    Lost,
    /// Started without piped stdio; nothing was taken from the queue.
    Unusable,
}

/// Serve the shared queue with `child`, replacing it every time it is lost
/// while work remains.
async fn drive_worker(
    worker_id: usize,
    mut child: Child,
    command: Arc<WorkerCommand>,
    queue: Arc<Mutex<VecDeque<Request>>>,
) -> Vec<(usize, Result<Value, TaskError>)> {
    let mut done = Vec::new();
    loop {
        let stop = serve_queue(worker_id, &mut child, &queue, &mut done).await;
        reap(worker_id, child, stop).await;

        if stop != Stop::Lost || lock(&queue).is_empty() {
            break;
        }
        match command.spawn() {
            Ok(fresh) => {
                info!(worker_id, "replacing lost worker");
                child = fresh;
            }
            Err(e) => {
                warn!(worker_id, error = %e, "cannot replace lost worker");
                break;
            }
        }
    }
    done
}

async fn serve_queue(
    worker_id: usize,
    child: &mut Child,
    queue: &Mutex<VecDeque<Request>>,
    done: &mut Vec<(usize, Result<Value, TaskError>)>,
) -> Stop {
    let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
        warn!(worker_id, "worker started without piped stdio");
        return Stop::Unusable;
    };

    // transport が drop されると stdin が閉じ、ワーカーは終了する
    let mut transport = Transport::new(stdout, stdin);
    loop {
        let next = lock(queue).pop_front();
        let Some(request) = next else {
            return Stop::Drained;
        };
        let index = request.id as usize;

        match exchange(&mut transport, &request).await {
            Ok(outcome) => {
                debug!(worker_id, index, "task answered");
                done.push((index, outcome.into()));
            }
            Err(e) => {
                warn!(worker_id, index, error = %e, "lost contact with worker");
                done.push((index, Err(e.into())));
                return Stop::Lost;
            }
        }
    }
}

async fn reap(worker_id: usize, mut child: Child, stop: Stop) {
    let broken = stop != Stop::Drained;
    if broken && let Err(e) = child.start_kill() {
        debug!(worker_id, error = %e, "kill failed, worker already gone");
    }
    match child.wait().await {
        Ok(status) if status.success() || broken => debug!(worker_id, %status, "worker exited"),
        Ok(status) => warn!(worker_id, %status, "worker exited with failure"),
        Err(e) => warn!(worker_id, error = %e, "failed to wait for worker"),
    }
}

async fn exchange<R, W>(
    transport: &mut Transport<R, W>,
    request: &Request,
) -> Result<WireOutcome, TransportError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    transport.send(request).await?;
    match transport.recv::<Response>().await? {
        None => Err(TransportError::WorkerLost),
        Some(response) if response.id != request.id => Err(TransportError::UnexpectedResponse {
            expected: request.id,
            got: response.id,
        }),
        Some(response) => Ok(response.outcome),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
