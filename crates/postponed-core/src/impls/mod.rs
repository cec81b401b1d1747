//! Impls - 実装
//!
//! # 含まれる実装
//! - **Transport**: 改行区切り JSON の送受信（ワーカープロセスとの通信路）
//! - **builtins**: CLI とワーカーが共有する組み込み関数

pub mod transport;
pub mod builtins;

pub use self::builtins::{BuiltinError, builtin_registry};
pub use self::transport::Transport;
