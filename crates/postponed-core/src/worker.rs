//! Worker side of the process executor.
//!
//! A worker process reads [`Request`]s line by line, rebuilds each task from
//! its [`FunctionRegistry`], runs it and writes one [`Response`] per request,
//! in order. It stops when its input closes.
//!
//! stdout is the protocol channel: anything the worker logs must go to stderr.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::domain::errors::TransportError;
use crate::impls::transport::Transport;
use crate::typed::codec::{Request, Response, WireOutcome, decode};
use crate::typed::registry::FunctionRegistry;

/// Serve requests from `read`, answering on `write`, until EOF.
pub async fn serve<R, W>(registry: &FunctionRegistry, read: R, write: W) -> Result<(), TransportError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut transport = Transport::new(read, write);
    loop {
        let Some(request) = transport.recv::<Request>().await? else {
            debug!("input closed, worker exiting");
            return Ok(());
        };

        let outcome = run_one(registry, request.clone()).await;
        transport
            .send(&Response {
                id: request.id,
                outcome,
            })
            .await?;
    }
}

/// Serve on this process's stdin/stdout.
pub async fn serve_stdio(registry: &FunctionRegistry) -> Result<(), TransportError> {
    serve(registry, tokio::io::stdin(), tokio::io::stdout()).await
}

async fn run_one(registry: &FunctionRegistry, request: Request) -> WireOutcome {
    let task = match decode(request.task, registry) {
        Ok(task) => task,
        Err(e) => {
            warn!(id = request.id, error = %e, "cannot rebuild task");
            return WireOutcome::Transport(e);
        }
    };

    debug!(id = request.id, function = task.function().display_name(), "running task");
    // 関数本体は同期処理なので blocking スレッドで実行する。panic もここで捕まえる
    match tokio::task::spawn_blocking(move || task.invoke()).await {
        Ok(Ok(value)) => WireOutcome::Ok(value),
        Ok(Err(e)) => WireOutcome::Error(e),
        Err(join) if join.is_panic() => WireOutcome::Panicked(panic_message(join.into_panic())),
        Err(join) => WireOutcome::Panicked(join.to_string()),
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
