use crate::error::NetconfClientResult;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, DuplexStream};

#[cfg(feature = "async-ssh2-lite")]
pub mod ssh;

/// Byte stream carrying one NETCONF session.
///
/// Framing lives in the session, so a transport only moves bytes. Anything
/// that is `AsyncRead + AsyncWrite` qualifies; `close` lets transports with
/// an outer connection (an SSH session around the channel) tear it down.
#[async_trait]
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + 'static {
    async fn close(&mut self) -> NetconfClientResult<()> {
        self.shutdown().await?;
        Ok(())
    }

    /// Exit status reported by the remote end once the stream has ended.
    fn exit_status(&self) -> Option<i32> {
        None
    }

    /// Name of the signal that terminated the remote end, if any.
    async fn exit_signal(&mut self) -> Option<String> {
        None
    }

    /// Diagnostic output sent beside the session stream. Called once, when
    /// the connection starts.
    fn stderr(&mut self) -> Option<StderrStream> {
        None
    }
}

pub type StderrStream = Box<dyn AsyncRead + Send + Unpin>;

#[async_trait]
impl Transport for DuplexStream {}
