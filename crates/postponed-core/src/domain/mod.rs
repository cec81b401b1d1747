//! Domain model (ids, signatures, arguments, validation, errors, tasks).

pub mod ids;
pub mod signature;
pub mod args;
pub mod validation;
pub mod errors;
pub mod task;

pub use self::args::Arguments;
pub use self::errors::{BatchError, BindError, InvocationError, Rejection, TaskError, TransportError};
pub use self::ids::{BatchId, TaskId};
pub use self::signature::{ParamSpec, ParamType, Signature, SignatureBuilder, SignatureError};
pub use self::task::DeferredTask;
pub use self::validation::validate;
