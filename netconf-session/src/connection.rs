use crate::error::{NetconfClientError, NetconfClientResult};
use crate::message::{
    Datastore, DefaultOperation, Filter, Hello, Notification, RpcOperation, RpcReply,
    WithDefaultsValue,
};
use crate::session::Session;
use crate::transport::{StderrStream, Transport};
use crate::xml::Element;
use bytes::Bytes;
use log::{debug, info, trace, warn};
use std::io;
use time::OffsetDateTime;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::select;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;

const READ_BUFFER_SIZE: usize = 16 * 1024;
const STDERR_BUFFER_SIZE: usize = 1024;

enum Command {
    Rpc {
        content: Element,
        action: bool,
        reply: oneshot::Sender<Option<RpcReply>>,
    },
    Close {
        done: oneshot::Sender<()>,
    },
}

/// Channels a [`Connection`] reports to besides request replies.
#[derive(Debug, Default)]
pub struct ConnectionOptions {
    /// Receives every `<notification>`.
    pub notifications: Option<UnboundedSender<Notification>>,
    /// Receives diagnostics such as transport stderr output and dropped
    /// messages. They are logged at `warn` either way.
    pub diagnostics: Option<UnboundedSender<String>>,
}

/// Async NETCONF client connection.
///
/// A background task owns the transport and the [`Session`]; requests are
/// handed to it over a channel, so any number of them can be outstanding at
/// once. Dropping the connection sends `<close-session>` and closes the
/// transport.
pub struct Connection {
    commands: UnboundedSender<Command>,
    session_id: Option<u64>,
    capabilities: Vec<String>,
}

impl Connection {
    /// Exchanges hello messages over `transport` and returns once the
    /// session is established.
    pub async fn new<T>(transport: T) -> NetconfClientResult<Connection>
    where
        T: Transport,
    {
        Connection::new_with_options(transport, ConnectionOptions::default()).await
    }

    /// Like [`Connection::new`], forwarding every `<notification>` to `sender`.
    pub async fn new_with_notifications<T>(
        transport: T,
        sender: UnboundedSender<Notification>,
    ) -> NetconfClientResult<Connection>
    where
        T: Transport,
    {
        let options = ConnectionOptions {
            notifications: Some(sender),
            ..ConnectionOptions::default()
        };
        Connection::new_with_options(transport, options).await
    }

    pub async fn new_with_options<T>(
        mut transport: T,
        options: ConnectionOptions,
    ) -> NetconfClientResult<Connection>
    where
        T: Transport,
    {
        let (established, mut hello) = mpsc::unbounded_channel::<NetconfClientResult<Hello>>();
        let failed = established.clone();
        let mut session = Session::new(
            move |hello: &Hello| {
                let _ = established.send(Ok(hello.clone()));
            },
            move |err| {
                let _ = failed.send(Err(err));
            },
        );
        if let Some(sender) = options.notifications {
            session = session.with_notification_handler(move |notification| {
                if sender.send(notification).is_err() {
                    trace!("Notification receiver dropped");
                }
            });
        }
        if let Some(sender) = options.diagnostics {
            session = session.with_diagnostics(move |message| {
                let _ = sender.send(message.to_string());
            });
        }

        let stderr = transport.stderr();
        let (commands, receiver) = mpsc::unbounded_channel();
        tokio::spawn(drive(transport, stderr, session, receiver));

        let hello = hello
            .recv()
            .await
            .ok_or(NetconfClientError::SessionClosed)??;
        info!(
            "Started netconf session with session-id: {:?}",
            hello.session_id()
        );
        Ok(Connection {
            commands,
            session_id: hello.session_id(),
            capabilities: hello.capabilities(),
        })
    }

    pub fn session_id(&self) -> Option<u64> {
        self.session_id
    }

    /// Capabilities advertised by the server.
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|cap| cap == capability)
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Sends `content` as an rpc and waits for its reply. A reply carrying
    /// `<rpc-error>` is returned as [`NetconfClientError::Netconf`].
    pub async fn rpc(&self, content: Element) -> NetconfClientResult<RpcReply> {
        self.request(content, false).await
    }

    /// Invokes a YANG 1.1 action; `content` is the path to the action node.
    pub async fn rpc_action(&self, content: Element) -> NetconfClientResult<RpcReply> {
        self.request(content, true).await
    }

    pub async fn operation(&self, operation: RpcOperation) -> NetconfClientResult<RpcReply> {
        self.rpc(operation.to_element()?).await
    }

    /// GetConfig implements the `<get-config>` rpc operation defined in [RFC6241 7.1].
    /// `source` is the datastore to query.
    ///
    /// [RFC6241 7.1]: https://www.rfc-editor.org/rfc/rfc6241.html#section-7.1
    pub async fn get_config(
        &self,
        source: Datastore,
        filter: Option<Filter>,
        defaults: Option<WithDefaultsValue>,
    ) -> NetconfClientResult<RpcReply> {
        self.operation(RpcOperation::new_get_config(source, filter, defaults))
            .await
    }

    pub async fn get(
        &self,
        filter: Option<Filter>,
        defaults: Option<WithDefaultsValue>,
    ) -> NetconfClientResult<RpcReply> {
        self.operation(RpcOperation::new_get(filter, defaults)).await
    }

    pub async fn edit_config(
        &self,
        target: Datastore,
        config: Vec<Element>,
        default_operation: Option<DefaultOperation>,
    ) -> NetconfClientResult<RpcReply> {
        self.operation(RpcOperation::new_edit_config(
            target,
            config,
            default_operation,
        ))
        .await
    }

    pub async fn validate(&self, source: Datastore) -> NetconfClientResult<RpcReply> {
        self.operation(RpcOperation::Validate { source }).await
    }

    pub async fn commit(&self) -> NetconfClientResult<RpcReply> {
        self.operation(RpcOperation::new_commit(false, None, None, None))
            .await
    }

    /// Confirmed commit, [RFC6241 8.4](https://www.rfc-editor.org/rfc/rfc6241.html#section-8.4).
    pub async fn confirmed_commit(
        &self,
        confirm_timeout: Option<u32>,
        persist: Option<String>,
        persist_id: Option<String>,
    ) -> NetconfClientResult<RpcReply> {
        self.operation(RpcOperation::new_commit(
            true,
            confirm_timeout,
            persist,
            persist_id,
        ))
        .await
    }

    pub async fn discard_changes(&self) -> NetconfClientResult<RpcReply> {
        self.operation(RpcOperation::DiscardChanges).await
    }

    pub async fn lock(&self, target: Datastore) -> NetconfClientResult<RpcReply> {
        self.operation(RpcOperation::Lock { target }).await
    }

    pub async fn unlock(&self, target: Datastore) -> NetconfClientResult<RpcReply> {
        self.operation(RpcOperation::Unlock { target }).await
    }

    /// Issues the `<create-subscription>` operation as defined in [RFC5277 2.1.1](https://www.rfc-editor.org/rfc/rfc5277.html#section-2.1.1)
    /// for initiating an event notification subscription that will send asynchronous event notifications to the initiator.
    ///
    /// This requires the device to support the [notification capability](https://www.rfc-editor.org/rfc/rfc5277.html#section-3.1.1)
    ///
    /// Notifications are only delivered to connections created with
    /// [`Connection::new_with_notifications`].
    pub async fn create_subscription(
        &self,
        stream: Option<&str>,
        filter: Option<Filter>,
        start_time: Option<OffsetDateTime>,
        stop_time: Option<OffsetDateTime>,
    ) -> NetconfClientResult<RpcReply> {
        self.operation(RpcOperation::new_create_subscription(
            stream, filter, start_time, stop_time,
        ))
        .await
    }

    pub async fn kill_session(&self, session_id: u64) -> NetconfClientResult<RpcReply> {
        self.operation(RpcOperation::KillSession { session_id })
            .await
    }

    /// Sends `<close-session>`, then closes the transport.
    pub async fn close_session(&self) -> NetconfClientResult<RpcReply> {
        let reply = self.operation(RpcOperation::CloseSession).await;
        self.close().await;
        reply
    }

    /// Cancels outstanding requests and closes the transport without
    /// notifying the server.
    pub async fn close(&self) {
        let (done, closed) = oneshot::channel();
        if self.commands.send(Command::Close { done }).is_ok() {
            let _ = closed.await;
        }
    }

    async fn request(&self, content: Element, action: bool) -> NetconfClientResult<RpcReply> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Rpc {
                content,
                action,
                reply,
            })
            .map_err(|_| NetconfClientError::SessionClosed)?;

        let reply = response
            .await
            .ok()
            .flatten()
            .ok_or(NetconfClientError::SessionClosed)?;
        if reply.has_errors() {
            return Err(NetconfClientError::Netconf(reply));
        }
        Ok(reply)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.commands.is_closed() {
            return;
        }
        debug!("Closing netconf session {:?} on drop", self.session_id);
        if let Ok(content) = RpcOperation::CloseSession.to_element() {
            let (reply, _) = oneshot::channel();
            let _ = self.commands.send(Command::Rpc {
                content,
                action: false,
                reply,
            });
        }
        let (done, _) = oneshot::channel();
        let _ = self.commands.send(Command::Close { done });
    }
}

async fn drive<T: Transport>(
    mut transport: T,
    mut stderr: Option<StderrStream>,
    mut session: Session,
    mut commands: UnboundedReceiver<Command>,
) {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut stderr_buf = vec![0u8; STDERR_BUFFER_SIZE];
    let mut closing = Vec::new();
    loop {
        if let Err(err) = flush(&mut transport, &mut session).await {
            session.transport_failed(err);
        }
        if session.is_closed() {
            break;
        }

        select! {
            read = transport.read(&mut buf) => match read {
                Ok(0) => {
                    let code = transport.exit_status();
                    let signal = transport.exit_signal().await;
                    session.transport_exited(code, signal);
                }
                Ok(n) => session.receive(Bytes::copy_from_slice(&buf[..n])),
                Err(err) => session.transport_failed(err.into()),
            },
            read = read_stderr(&mut stderr, &mut stderr_buf) => match read {
                Ok(0) => stderr = None,
                Ok(n) => session.receive_stderr(&stderr_buf[..n]),
                Err(err) => {
                    debug!("Stopped reading transport stderr: {}", err);
                    stderr = None;
                }
            },
            command = commands.recv() => match command {
                Some(Command::Rpc { content, action, reply }) => {
                    let callback = move |response| {
                        let _ = reply.send(response);
                    };
                    let sent = if action {
                        session.rpc_action(content, callback)
                    } else {
                        session.rpc(content, callback)
                    };
                    if let Err(err) = sent {
                        warn!("Failed to send rpc: {}", err);
                    }
                }
                Some(Command::Close { done }) => {
                    closing.push(done);
                    session.close();
                }
                None => session.close(),
            },
        }
    }

    if let Err(err) = transport.close().await {
        debug!("Error closing transport: {}", err);
    }
    drop(commands);
    for done in closing {
        let _ = done.send(());
    }
}

async fn read_stderr(stderr: &mut Option<StderrStream>, buf: &mut [u8]) -> io::Result<usize> {
    match stderr {
        Some(stream) => stream.read(buf).await,
        None => std::future::pending().await,
    }
}

async fn flush<T: Transport>(transport: &mut T, session: &mut Session) -> NetconfClientResult<()> {
    if session.has_outbound() {
        let outbound = session.take_outbound();
        transport.write_all(&outbound).await?;
        transport.flush().await?;
    }
    Ok(())
}
