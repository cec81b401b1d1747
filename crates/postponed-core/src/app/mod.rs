//! App - 束縛とバッチ実行
//!
//! # 主要コンポーネント
//! - **Postponed**: 関数に引数を束縛して DeferredTask を作る（既定で検証あり）
//! - **BatchExecutor**: バッチ実行の共通インターフェース
//! - **ThreadExecutor**: ワーカースレッドで実行
//! - **ProcessExecutor**: ワーカープロセスで実行
//! - **PoolConfig**: JSON で渡すプール設定

pub mod postponed;
pub mod executor;
pub mod results;
pub mod threads;
pub mod processes;
pub mod config;

pub use self::config::{ConfigError, PoolConfig};
pub use self::executor::BatchExecutor;
pub use self::postponed::{Postponed, postponed};
pub use self::processes::{ProcessExecutor, WorkerCommand, run_isolated};
pub use self::results::BatchResults;
pub use self::threads::{ThreadExecutor, run_threaded};
