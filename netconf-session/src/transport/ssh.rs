use crate::config::{timeout_millis, Authentication, SessionConfig};
use crate::error::{NetconfClientError, NetconfClientResult};
use crate::transport::{StderrStream, Transport};
use async_ssh2_lite::{ssh2, AsyncChannel, AsyncSession, SessionConfiguration};
use async_trait::async_trait;
use log::debug;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// NETCONF over SSH ([RFC6242]): the `netconf` subsystem of an SSH channel.
///
/// [RFC6242]: https://www.rfc-editor.org/rfc/rfc6242.html
pub struct SSHTransport {
    session: AsyncSession<TcpStream>,
    channel: AsyncChannel<TcpStream>,
}

impl SSHTransport {
    /// Opens the `netconf` subsystem on an already authenticated session.
    pub async fn new_with_session(
        session: AsyncSession<TcpStream>,
    ) -> NetconfClientResult<SSHTransport> {
        if !session.authenticated() {
            return Err(NetconfClientError::new(
                "ssh session is not authenticated".to_string(),
            ));
        }
        let mut channel = session.channel_session().await?;
        channel.subsystem("netconf").await?;
        debug!("Opened netconf subsystem");
        Ok(SSHTransport { session, channel })
    }

    pub async fn connect(config: &SessionConfig) -> NetconfClientResult<SSHTransport> {
        let address = (config.address.as_str(), config.port);
        let stream = timeout(config.connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| {
                NetconfClientError::Io(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connecting to {}:{} timed out", config.address, config.port),
                ))
            })??;

        let mut configuration = SessionConfiguration::new();
        configuration.set_timeout(timeout_millis(config.connect_timeout));
        let mut session = AsyncSession::new(stream, configuration)?;
        session.handshake().await?;
        authenticate(&session, &config.username, &config.authentication).await?;
        SSHTransport::new_with_session(session).await
    }
}

pub async fn authenticate(
    session: &AsyncSession<TcpStream>,
    username: &str,
    authentication: &Authentication,
) -> NetconfClientResult<()> {
    match authentication {
        Authentication::Password(password) => {
            session.userauth_password(username, password).await?;
        }
        Authentication::PrivateKey { path, passphrase } => {
            debug!("Authenticating with private key '{}'", path.display());
            session
                .userauth_pubkey_file(username, None, path, passphrase.as_deref())
                .await?;
        }
    }
    Ok(())
}

#[async_trait]
impl Transport for SSHTransport {
    async fn close(&mut self) -> NetconfClientResult<()> {
        self.channel.send_eof().await?;
        self.channel.close().await?;
        self.session
            .disconnect(Some(ssh2::ByApplication), "Shutdown", None)
            .await?;
        Ok(())
    }

    fn exit_status(&self) -> Option<i32> {
        self.channel.exit_status().ok()
    }

    async fn exit_signal(&mut self) -> Option<String> {
        self.channel
            .exit_signal()
            .await
            .ok()
            .and_then(|signal| signal.exit_signal)
    }

    fn stderr(&mut self) -> Option<StderrStream> {
        Some(Box::new(self.channel.stderr()))
    }
}

impl AsyncRead for SSHTransport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().channel).poll_read(cx, buf)
    }
}

impl AsyncWrite for SSHTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().channel).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().channel).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().channel).poll_shutdown(cx)
    }
}
