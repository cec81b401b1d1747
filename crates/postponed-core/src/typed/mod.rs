//! Typed - 呼び出せる関数とその登録
//!
//! # 二層構造
//! - **Function**: シグネチャ付きのクロージャ（同じプロセス内ならどれでも実行できる）
//! - **FunctionRegistry + codec**: 名前で引ける関数だけがプロセス境界を越えられる

pub mod function;
pub mod registry;
pub mod codec;

pub use self::function::{CallArgs, Function};
pub use self::registry::{FunctionRegistry, RegistryError};
pub use self::codec::{Request, Response, WireOutcome, WireTask};
