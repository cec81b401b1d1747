//! postponed CLI
//!
//! # Commands
//! - `worker`: 組み込み関数を stdin/stdout で提供する（ProcessExecutor が起動する）
//! - `run <FILE>`: JSON のバッチファイルを実行して結果を JSON で出力
//! - `demo`: `double` を [3, 3, 4, 6] に対してスレッド・プロセスの両方で実行
//!
//! stdout は worker の通信路なので、ログは必ず stderr に出します。
//!
//! # 終了コード
//! - 0: 全タスク成功
//! - 1: 失敗したタスクがある
//! - 2: 使い方・束縛・プール起動のエラー

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use postponed_core::impls::builtins;
use postponed_core::{
    Arguments, BatchExecutor, PoolConfig, ProcessExecutor, ThreadExecutor, WorkerCommand,
    builtin_registry, postponed,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

mod batch;

#[derive(Parser)]
#[command(name = "postponed")]
#[command(version)]
#[command(about = "Run deferred function calls on bounded thread or process pools")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the built-in functions on stdin/stdout
    Worker,
    /// Run a batch file
    Run {
        /// JSON array of {"function", "args", "kwargs"}
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = Mode::Threads)]
        mode: Mode,

        /// Overrides the config file
        #[arg(long)]
        max_workers: Option<usize>,

        /// Skip argument validation when binding
        #[arg(long)]
        no_check: bool,

        /// PoolConfig as JSON
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Double [3, 3, 4, 6] on both executors
    Demo {
        #[arg(long, default_value_t = 2)]
        max_workers: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Threads,
    Processes,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let outcome = match cli.command {
        Commands::Worker => worker().await,
        Commands::Run {
            file,
            mode,
            max_workers,
            no_check,
            config,
        } => run(file, mode, max_workers, no_check, config).await,
        Commands::Demo { max_workers } => demo(max_workers).await,
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(2)
        }
    }
}

async fn worker() -> Result<ExitCode> {
    let registry = builtin_registry()?;
    postponed_core::worker::serve_stdio(&registry)
        .await
        .context("worker transport failed")?;
    Ok(ExitCode::SUCCESS)
}

async fn run(
    file: PathBuf,
    mode: Mode,
    max_workers: Option<usize>,
    no_check: bool,
    config: Option<PathBuf>,
) -> Result<ExitCode> {
    let mut config = match config {
        Some(path) => PoolConfig::from_json_file(path)?,
        None => PoolConfig::default(),
    };
    if let Some(n) = max_workers {
        config.max_workers = n;
    }
    if no_check {
        config.check_inputs = false;
    }

    let registry = builtin_registry()?;
    let calls = batch::read_calls(&file)?;
    let tasks = batch::bind_calls(&registry, calls, config.check_inputs)?;
    info!(tasks = tasks.len(), ?mode, max_workers = config.max_workers, "running batch file");

    let executor: Box<dyn BatchExecutor> = match mode {
        Mode::Threads => Box::new(ThreadExecutor::new(config.max_workers)),
        Mode::Processes => Box::new(ProcessExecutor::new(
            config.max_workers,
            worker_command(config.worker)?,
        )),
    };
    let results = executor.run(tasks).await?;

    println!("{}", serde_json::to_string_pretty(&batch::render(&results))?);
    Ok(if results.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn demo(max_workers: usize) -> Result<ExitCode> {
    let double = postponed(builtins::double()?);
    let tasks = double.bind_many([3, 3, 4, 6].map(|v| Arguments::positional([v])))?;

    let threaded = ThreadExecutor::new(max_workers).run(tasks.clone()).await?;
    println!("threads:   {}", batch::render(&threaded));

    let isolated = ProcessExecutor::new(max_workers, worker_command(None)?)
        .run(tasks)
        .await?;
    println!("processes: {}", batch::render(&isolated));

    Ok(if threaded.all_succeeded() && isolated.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Configured worker, or this binary started as `postponed worker`.
fn worker_command(configured: Option<WorkerCommand>) -> Result<WorkerCommand> {
    match configured {
        Some(command) => Ok(command),
        None => WorkerCommand::current_exe(["worker"]).context("cannot locate own executable"),
    }
}
