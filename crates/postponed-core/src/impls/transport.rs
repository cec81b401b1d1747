//! Line transport - 改行区切り JSON でメッセージをやり取りする
//!
//! 親プロセス側（子の stdin/stdout）とワーカー側（自分の stdin/stdout）の
//! 両方で同じ型を使います。

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

use crate::domain::errors::TransportError;

/// A Transport carries JSON messages to and fro over [`AsyncRead`] and [`AsyncWrite`].
pub struct Transport<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> {
    framed_read: FramedRead<R, LinesCodec>,
    framed_write: FramedWrite<W, LinesCodec>,
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> Transport<R, W> {
    pub fn new(read: R, write: W) -> Self {
        Self {
            framed_read: FramedRead::new(read, LinesCodec::new()),
            framed_write: FramedWrite::new(write, LinesCodec::new()),
        }
    }

    /// Read one message, `None` on EOF.
    pub async fn recv<M: DeserializeOwned>(&mut self) -> Result<Option<M>, TransportError> {
        match self.framed_read.next().await {
            None => Ok(None),
            Some(Ok(line)) => serde_json::from_str(&line)
                .map(Some)
                .map_err(|e| TransportError::Decode {
                    message: e.to_string(),
                }),
            Some(Err(e)) => Err(codec_error(e)),
        }
    }

    /// Write one message and flush it.
    pub async fn send<M: Serialize>(&mut self, msg: &M) -> Result<(), TransportError> {
        let line = serde_json::to_string(msg).map_err(|e| TransportError::Encode {
            message: e.to_string(),
        })?;
        self.framed_write.send(line).await.map_err(codec_error)
    }

    /// Give back the writer, e.g. to close a child's stdin.
    pub fn into_parts(self) -> (R, W) {
        (self.framed_read.into_inner(), self.framed_write.into_inner())
    }
}

fn codec_error(e: LinesCodecError) -> TransportError {
    match e {
        LinesCodecError::Io(io) => io.into(),
        LinesCodecError::MaxLineLengthExceeded => TransportError::Decode {
            message: "line too long".to_string(),
        },
    }
}
