//! Transport independent NETCONF client session.
//!
//! A [`Session`] owns the inbound [`Buffer`], the [`Framer`] and the table of
//! requests waiting for a reply. It never performs I/O: the owner feeds it
//! bytes read from the transport with [`Session::receive`] and writes out
//! whatever [`Session::take_outbound`] returns. All callbacks run inline on
//! the caller's thread, one event at a time, so no state is shared.
//!
//! The client hello is queued as soon as the session is created, framed with
//! `]]>]]>` since the peer's capabilities are not known yet.

use crate::buffer::Buffer;
use crate::error::{NetconfClientError, NetconfClientResult};
use crate::framer::{Framer, FramingMode};
use crate::message::{
    action_envelope, rpc_envelope, Datastore, Filter, Hello, Message, Notification,
    RpcOperation, RpcReply, WithDefaultsValue,
};
use crate::xml::{self, Element};
use crate::NETCONF_BASE_11_CAP;
use bytes::{Bytes, BytesMut};
use log::{debug, info, trace, warn};
use std::collections::HashMap;

pub type ReplyCallback = Box<dyn FnOnce(Option<RpcReply>) + Send>;
pub type NotificationCallback = Box<dyn FnMut(Notification) + Send>;
pub type EstablishedCallback = Box<dyn FnOnce(&Hello) + Send>;
pub type ErrorCallback = Box<dyn FnOnce(NetconfClientError) + Send>;
pub type DiagnosticSink = Box<dyn FnMut(&str) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingHello,
    Established,
    Closed,
}

pub struct Session {
    buffer: Buffer,
    framer: Framer,
    outbound: BytesMut,
    state: SessionState,

    session_id: Option<u64>,
    capabilities: Vec<String>,
    next_message_id: u64,
    pending: HashMap<String, ReplyCallback>,

    on_established: Option<EstablishedCallback>,
    on_error: Option<ErrorCallback>,
    on_notification: Option<NotificationCallback>,
    diagnostics: Option<DiagnosticSink>,
}

impl Session {
    /// `on_established` runs once the peer hello has been processed,
    /// `on_error` once if the session becomes defunct.
    pub fn new<E, F>(on_established: E, on_error: F) -> Session
    where
        E: FnOnce(&Hello) + Send + 'static,
        F: FnOnce(NetconfClientError) + Send + 'static,
    {
        let mut session = Session {
            buffer: Buffer::new(),
            framer: Framer::new(),
            outbound: BytesMut::new(),
            state: SessionState::AwaitingHello,
            session_id: None,
            capabilities: Vec::new(),
            next_message_id: 1,
            pending: HashMap::new(),
            on_established: Some(Box::new(on_established)),
            on_error: Some(Box::new(on_error)),
            on_notification: None,
            diagnostics: None,
        };
        session.send_hello();
        session
    }

    /// Without a handler, notifications are dropped.
    pub fn with_notification_handler<N>(mut self, handler: N) -> Session
    where
        N: FnMut(Notification) + Send + 'static,
    {
        self.on_notification = Some(Box::new(handler));
        self
    }

    pub fn with_diagnostics<D>(mut self, sink: D) -> Session
    where
        D: FnMut(&str) + Send + 'static,
    {
        self.diagnostics = Some(Box::new(sink));
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    pub fn session_id(&self) -> Option<u64> {
        self.session_id
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub fn framing_mode(&self) -> FramingMode {
        self.framer.mode()
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    pub fn has_outbound(&self) -> bool {
        !self.outbound.is_empty()
    }

    /// Framed bytes queued for the transport since the last call.
    pub fn take_outbound(&mut self) -> Bytes {
        self.outbound.split().freeze()
    }

    /// Feeds bytes read from the transport. Every complete message is
    /// dispatched before returning.
    pub fn receive(&mut self, data: impl Into<Bytes>) {
        if self.is_closed() {
            debug!("Ignoring data received on closed session");
            return;
        }
        self.buffer.write(data);
        loop {
            match self.framer.decode(&mut self.buffer) {
                Ok(Some(message)) => self.dispatch(message),
                Ok(None) => break,
                Err(err) => {
                    self.defunct(err);
                    break;
                }
            }
        }
    }

    /// Bytes from the transport's diagnostic channel (SSH stderr).
    pub fn receive_stderr(&mut self, data: &[u8]) {
        let text = String::from_utf8_lossy(data);
        let text = text.trim_end();
        if !text.is_empty() {
            self.diagnostic(&format!("transport stderr: {}", text));
        }
    }

    pub fn transport_exited(&mut self, code: Option<i32>, signal: Option<String>) {
        self.defunct(NetconfClientError::TransportClosed { code, signal });
    }

    pub fn transport_failed(&mut self, err: NetconfClientError) {
        self.defunct(err);
    }

    /// Sends `content` wrapped in an `<rpc>` envelope and returns the
    /// message-id it was given. `callback` receives the reply, or `None` if
    /// the session closes first.
    pub fn rpc<F>(&mut self, content: Element, callback: F) -> NetconfClientResult<String>
    where
        F: FnOnce(Option<RpcReply>) + Send + 'static,
    {
        let message_id = self.next_message_id.to_string();
        self.next_message_id += 1;
        if self.is_closed() {
            return Err(NetconfClientError::SessionClosed);
        }

        let rpc = xml::encode(&rpc_envelope(&message_id, content))?;
        debug!("RPC:\n{}", rpc);
        self.pending.insert(message_id.clone(), Box::new(callback));
        self.framer.encode(rpc.as_bytes(), &mut self.outbound);
        Ok(message_id)
    }

    /// Like [`Session::rpc`], with `content` inside a YANG 1.1 `<action>`.
    pub fn rpc_action<F>(&mut self, content: Element, callback: F) -> NetconfClientResult<String>
    where
        F: FnOnce(Option<RpcReply>) + Send + 'static,
    {
        self.rpc(action_envelope(content), callback)
    }

    pub fn operation<F>(
        &mut self,
        operation: &RpcOperation,
        callback: F,
    ) -> NetconfClientResult<String>
    where
        F: FnOnce(Option<RpcReply>) + Send + 'static,
    {
        self.rpc(operation.to_element()?, callback)
    }

    /// GetConfig implements the `<get-config>` rpc operation defined in [RFC6241 7.1].
    ///
    /// [RFC6241 7.1]: https://www.rfc-editor.org/rfc/rfc6241.html#section-7.1
    pub fn get_config<F>(
        &mut self,
        source: Datastore,
        filter: Option<Filter>,
        defaults: Option<WithDefaultsValue>,
        callback: F,
    ) -> NetconfClientResult<String>
    where
        F: FnOnce(Option<RpcReply>) + Send + 'static,
    {
        let operation = RpcOperation::new_get_config(source, filter, defaults);
        self.operation(&operation, callback)
    }

    pub fn edit_config<F>(
        &mut self,
        target: Datastore,
        config: Vec<Element>,
        callback: F,
    ) -> NetconfClientResult<String>
    where
        F: FnOnce(Option<RpcReply>) + Send + 'static,
    {
        let operation = RpcOperation::new_edit_config(target, config, None);
        self.operation(&operation, callback)
    }

    pub fn commit<F>(&mut self, callback: F) -> NetconfClientResult<String>
    where
        F: FnOnce(Option<RpcReply>) + Send + 'static,
    {
        let operation = RpcOperation::new_commit(false, None, None, None);
        self.operation(&operation, callback)
    }

    pub fn discard_changes<F>(&mut self, callback: F) -> NetconfClientResult<String>
    where
        F: FnOnce(Option<RpcReply>) + Send + 'static,
    {
        self.operation(&RpcOperation::DiscardChanges, callback)
    }

    /// Stops the session and cancels every request still waiting for a reply.
    /// Calling it again has no effect.
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        info!(
            "Closing netconf session {:?} with {} pending requests",
            self.session_id,
            self.pending.len()
        );
        self.state = SessionState::Closed;
        self.outbound.clear();
        self.buffer = Buffer::new();
        for (message_id, callback) in self.pending.drain() {
            trace!("Cancelling request {}", message_id);
            callback(None);
        }
    }

    fn send_hello(&mut self) {
        match xml::encode(&Hello::new().to_element()) {
            Ok(hello) => {
                debug!("Hello:\n{}", hello);
                self.framer.encode(hello.as_bytes(), &mut self.outbound);
            }
            Err(err) => self.defunct(err),
        }
    }

    fn defunct(&mut self, err: NetconfClientError) {
        if self.is_closed() {
            debug!("Session already closed, ignoring: {}", err);
            return;
        }
        self.close();
        self.diagnostic(&format!("netconf session failed: {}", err));
        if let Some(on_error) = self.on_error.take() {
            on_error(err);
        }
    }

    fn diagnostic(&mut self, message: &str) {
        warn!("{}", message);
        if let Some(sink) = self.diagnostics.as_mut() {
            sink(message);
        }
    }

    fn dispatch(&mut self, message: Bytes) {
        let text = match std::str::from_utf8(&message) {
            Ok(text) => text,
            Err(err) => {
                self.diagnostic(&format!("Dropping message that is not utf-8: {}", err));
                return;
            }
        };
        trace!("Received:\n{}", text);
        match Message::decode(text) {
            Ok(Message::Hello(hello)) => self.handle_hello(hello),
            Ok(Message::RpcReply(reply)) => self.handle_reply(reply),
            Ok(Message::Notification(notification)) => self.handle_notification(notification),
            Ok(Message::Unrecognized(root)) => {
                self.diagnostic(&format!("Ignoring message with root element <{}>", root.name));
            }
            Err(err) => self.diagnostic(&format!("Dropping undecodable message: {}", err)),
        }
    }

    fn handle_hello(&mut self, hello: Hello) {
        for skipped in hello.skipped() {
            self.diagnostic(&format!("Hello: {}", skipped));
        }
        if self.state == SessionState::Established {
            debug!("Received another hello, replacing capabilities");
        }
        if hello.session_id().is_some() {
            self.session_id = hello.session_id();
        }
        self.capabilities = hello.capabilities();
        if hello.has_capability(NETCONF_BASE_11_CAP) {
            self.framer.upgrade();
        }
        self.state = SessionState::Established;
        info!(
            "Established netconf session {:?} ({:?} framing)",
            self.session_id,
            self.framer.mode()
        );
        if let Some(on_established) = self.on_established.take() {
            on_established(&hello);
        }
    }

    fn handle_reply(&mut self, reply: RpcReply) {
        let Some(message_id) = reply.message_id().map(str::to_string) else {
            self.diagnostic("Ignoring rpc-reply without message-id");
            return;
        };
        match self.pending.remove(&message_id) {
            Some(callback) => {
                debug!("Reply to request {}", message_id);
                callback(Some(reply));
            }
            None => self.diagnostic(&format!(
                "Ignoring rpc-reply with unknown message-id {}",
                message_id
            )),
        }
    }

    fn handle_notification(&mut self, notification: Notification) {
        match self.on_notification.as_mut() {
            Some(handler) => handler(notification),
            None => trace!("No notification handler, dropping notification"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    const HELLO_10: &str = r#"<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><capabilities><capability>urn:ietf:params:netconf:base:1.0</capability></capabilities><session-id>7</session-id></hello>]]>]]>"#;
    const HELLO_11: &str = r#"<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><capabilities><capability>urn:ietf:params:netconf:base:1.0</capability><capability>urn:ietf:params:netconf:base:1.1</capability><capability>urn:ietf:params:netconf:capability:candidate:1.0</capability></capabilities><session-id>42</session-id></hello>]]>]]>"#;

    #[derive(Clone, Default)]
    struct Events(Arc<Mutex<Vec<String>>>);

    impl Events {
        fn push(&self, event: String) {
            self.0.lock().unwrap().push(event);
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }

        fn reply_callback(&self) -> impl FnOnce(Option<RpcReply>) + Send + 'static {
            let events = self.clone();
            move |reply| match reply {
                Some(reply) => events.push(format!(
                    "reply {} ok={}",
                    reply.message_id().unwrap_or("-"),
                    reply.is_ok()
                )),
                None => events.push("cancelled".to_string()),
            }
        }
    }

    fn new_session() -> (Session, Events) {
        let events = Events::default();
        let established = events.clone();
        let failed = events.clone();
        let notified = events.clone();
        let diagnostics = events.clone();
        let session = Session::new(
            move |hello| established.push(format!("established {:?}", hello.session_id())),
            move |err| failed.push(format!("error {}", err)),
        )
        .with_notification_handler(move |notification| {
            let names: Vec<_> = notification.content().map(|e| e.name.clone()).collect();
            notified.push(format!("notification {}", names.join(",")))
        })
        .with_diagnostics(move |message| diagnostics.push(format!("diagnostic {}", message)));
        (session, events)
    }

    fn established(hello: &str) -> (Session, Events) {
        let (mut session, events) = new_session();
        session.take_outbound();
        session.receive(hello.as_bytes().to_vec());
        events.take();
        (session, events)
    }

    fn chunked(message: &str) -> Vec<u8> {
        let mut framer = Framer::new();
        framer.upgrade();
        let mut out = BytesMut::new();
        framer.encode(message.as_bytes(), &mut out);
        out.to_vec()
    }

    fn ok_reply(message_id: &str) -> String {
        format!(
            r#"<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0" message-id="{}"><ok/></rpc-reply>"#,
            message_id
        )
    }

    #[test]
    fn test_hello_is_queued_on_creation() {
        let (mut session, events) = new_session();
        assert_eq!(session.state(), SessionState::AwaitingHello);
        let outbound = session.take_outbound();
        assert_eq!(
            std::str::from_utf8(&outbound).unwrap(),
            r#"<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><capabilities><capability>urn:ietf:params:netconf:base:1.0</capability><capability>urn:ietf:params:netconf:base:1.1</capability></capabilities></hello>]]>]]>"#
        );
        assert!(!session.has_outbound());
        assert!(events.take().is_empty());
    }

    #[test]
    fn test_hello_with_base_11_switches_to_chunked() {
        let (mut session, events) = new_session();
        session.take_outbound();
        session.receive(HELLO_11.as_bytes().to_vec());

        assert_eq!(events.take(), vec!["established Some(42)".to_string()]);
        assert_eq!(session.state(), SessionState::Established);
        assert_eq!(session.session_id(), Some(42));
        assert_eq!(session.capabilities().len(), 3);
        assert_eq!(session.framing_mode(), FramingMode::Chunked);

        session.commit(events.reply_callback()).unwrap();
        let outbound = session.take_outbound();
        let expected = r#"<rpc xmlns="urn:ietf:params:xml:ns:netconf:base:1.0" message-id="1"><commit/></rpc>"#;
        assert_eq!(outbound.as_ref(), chunked(expected).as_slice());

        session.receive(chunked(&ok_reply("1")));
        assert_eq!(events.take(), vec!["reply 1 ok=true".to_string()]);
        assert_eq!(session.pending_requests(), 0);
    }

    #[test]
    fn test_hello_without_base_11_keeps_end_of_message_framing() {
        let (mut session, events) = established(HELLO_10);
        assert_eq!(session.framing_mode(), FramingMode::EndOfMessage);
        assert_eq!(session.session_id(), Some(7));

        session.discard_changes(events.reply_callback()).unwrap();
        let outbound = session.take_outbound();
        assert_eq!(
            std::str::from_utf8(&outbound).unwrap(),
            r#"<rpc xmlns="urn:ietf:params:xml:ns:netconf:base:1.0" message-id="1"><discard-changes/></rpc>]]>]]>"#
        );
        session.receive(format!("{}]]>]]>", ok_reply("1")).into_bytes());
        assert_eq!(events.take(), vec!["reply 1 ok=true".to_string()]);
    }

    #[test]
    fn test_fragmented_hello_and_reply_in_one_read() {
        let (mut session, events) = new_session();
        let mut input = HELLO_11.as_bytes().to_vec();
        input.extend(chunked(&ok_reply("1")));

        session.commit(events.reply_callback()).unwrap();
        for byte in input {
            session.receive(vec![byte]);
        }
        assert_eq!(
            events.take(),
            vec![
                "established Some(42)".to_string(),
                "reply 1 ok=true".to_string()
            ]
        );
    }

    #[test]
    fn test_mode_switch_applies_to_rest_of_buffer() {
        let (mut session, events) = new_session();
        session.commit(events.reply_callback()).unwrap();
        let mut input = HELLO_11.as_bytes().to_vec();
        input.extend(chunked(&ok_reply("1")));
        session.receive(input);
        assert_eq!(events.take().len(), 2);
        assert!(!session.is_closed());
    }

    #[test]
    fn test_message_ids_are_sequential() {
        let (mut session, events) = established(HELLO_11);
        let ids: Vec<String> = (0..5)
            .map(|_| session.commit(events.reply_callback()).unwrap())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(session.pending_requests(), 5);

        let outbound = String::from_utf8(session.take_outbound().to_vec()).unwrap();
        for id in ids {
            assert!(outbound.contains(&format!("message-id=\"{}\"", id)));
        }
    }

    #[test]
    fn test_reply_is_delivered_at_most_once() {
        let (mut session, events) = established(HELLO_11);
        session.commit(events.reply_callback()).unwrap();
        session.receive(chunked(&ok_reply("1")));
        session.receive(chunked(&ok_reply("1")));
        assert_eq!(
            events.take(),
            vec![
                "reply 1 ok=true".to_string(),
                "diagnostic Ignoring rpc-reply with unknown message-id 1".to_string()
            ]
        );
        assert!(!session.is_closed());
    }

    #[test]
    fn test_replies_complete_out_of_order() {
        let (mut session, events) = established(HELLO_11);
        session.commit(events.reply_callback()).unwrap();
        session.discard_changes(events.reply_callback()).unwrap();
        let error = r#"<rpc-reply message-id="1"><rpc-error><error-type>application</error-type><error-tag>operation-failed</error-tag><error-severity>error</error-severity></rpc-error></rpc-reply>"#;
        let mut input = chunked(&ok_reply("2"));
        input.extend(chunked(error));
        session.receive(input);
        assert_eq!(
            events.take(),
            vec!["reply 2 ok=true".to_string(), "reply 1 ok=false".to_string()]
        );
    }

    #[test]
    fn test_prefixed_message_id_and_missing_message_id() {
        let (mut session, events) = established(HELLO_11);
        session.commit(events.reply_callback()).unwrap();
        session.receive(chunked(
            r#"<nc:rpc-reply xmlns:nc="urn:ietf:params:xml:ns:netconf:base:1.0" nc:message-id="1"><nc:ok/></nc:rpc-reply>"#,
        ));
        session.receive(chunked("<rpc-reply><ok/></rpc-reply>"));
        assert_eq!(
            events.take(),
            vec![
                "reply 1 ok=true".to_string(),
                "diagnostic Ignoring rpc-reply without message-id".to_string()
            ]
        );
    }

    #[test]
    fn test_close_cancels_pending_requests() {
        let (mut session, events) = established(HELLO_11);
        for _ in 0..3 {
            session.commit(events.reply_callback()).unwrap();
        }
        session.close();
        assert_eq!(events.take(), vec!["cancelled".to_string(); 3]);
        assert!(session.is_closed());
        assert_eq!(session.pending_requests(), 0);
        assert!(!session.has_outbound());

        session.close();
        assert!(events.take().is_empty());

        assert!(matches!(
            session.commit(events.reply_callback()),
            Err(NetconfClientError::SessionClosed)
        ));
        session.receive(chunked(&ok_reply("1")));
        assert!(events.take().is_empty());
    }

    #[test]
    fn test_framing_violation_makes_session_defunct() {
        let (mut session, events) = established(HELLO_11);
        session.commit(events.reply_callback()).unwrap();
        session.commit(events.reply_callback()).unwrap();
        session.receive(b"\n#12x\n".to_vec());

        let events = events.take();
        assert_eq!(events.len(), 4);
        assert_eq!(&events[..2], &["cancelled".to_string(), "cancelled".to_string()]);
        assert_eq!(
            events[2],
            "diagnostic netconf session failed: invalid chunk size \"12x\""
        );
        assert_eq!(events[3], "error invalid chunk size \"12x\"");
        assert!(session.is_closed());

        session.transport_exited(Some(0), None);
        assert!(!session.has_outbound());
    }

    #[test]
    fn test_transport_exit_reports_error_once() {
        let (mut session, events) = established(HELLO_10);
        session.commit(events.reply_callback()).unwrap();
        session.transport_exited(Some(255), None);
        session.transport_failed(NetconfClientError::SessionClosed);
        let events = events.take();
        assert_eq!(events.first().map(String::as_str), Some("cancelled"));
        assert_eq!(
            events.last().map(String::as_str),
            Some("error transport exited (code Some(255), signal None)")
        );
        assert_eq!(events.iter().filter(|e| e.starts_with("error")).count(), 1);
    }

    #[test]
    fn test_undecodable_message_is_dropped() {
        let (mut session, events) = established(HELLO_11);
        session.commit(events.reply_callback()).unwrap();
        let mut input = chunked("<rpc-reply message-id=\"1\">");
        input.extend(chunked(&ok_reply("1")));
        session.receive(input);

        let events = events.take();
        assert_eq!(events.len(), 2);
        assert!(events[0].starts_with("diagnostic Dropping undecodable message"));
        assert_eq!(events[1], "reply 1 ok=true");
        assert!(!session.is_closed());
    }

    #[test]
    fn test_notifications_and_unknown_messages() {
        let (mut session, events) = established(HELLO_11);
        let notification = r#"<notification xmlns="urn:ietf:params:xml:ns:netconf:notification:1.0"><eventTime>2024-05-01T10:00:00Z</eventTime><netconf-config-change/></notification>"#;
        session.receive(chunked(notification));
        session.receive(chunked("<rpc message-id=\"9\"/>"));
        assert_eq!(
            events.take(),
            vec![
                "notification netconf-config-change".to_string(),
                "diagnostic Ignoring message with root element <rpc>".to_string()
            ]
        );
        assert_eq!(session.pending_requests(), 0);
    }

    #[test]
    fn test_notification_without_handler_is_dropped() {
        let mut session = Session::new(|_| {}, |_| {});
        session.receive(HELLO_11.as_bytes().to_vec());
        session.receive(chunked("<notification><event/></notification>"));
        assert!(!session.is_closed());
    }

    #[test]
    fn test_second_hello_replaces_capabilities() {
        let (mut session, events) = established(HELLO_11);
        session.receive(chunked(
            r#"<hello><capabilities><capability>urn:example:only</capability><capability/></capabilities></hello>"#,
        ));
        assert_eq!(session.capabilities(), &["urn:example:only".to_string()]);
        assert_eq!(session.session_id(), Some(42));
        assert_eq!(session.framing_mode(), FramingMode::Chunked);
        assert_eq!(
            events.take(),
            vec!["diagnostic Hello: empty capability element".to_string()]
        );
    }

    #[test]
    fn test_rpc_action_and_get_config() {
        let (mut session, events) = established(HELLO_10);
        session
            .rpc_action(Element::new("restart").with_namespace("urn:x"), events.reply_callback())
            .unwrap();
        session
            .get_config(Datastore::Running, None, None, events.reply_callback())
            .unwrap();
        let config = xml::decode_fragment("<hostname xmlns=\"urn:x\">r1</hostname>").unwrap();
        session
            .edit_config(Datastore::Candidate, config, events.reply_callback())
            .unwrap();
        let outbound = String::from_utf8(session.take_outbound().to_vec()).unwrap();
        assert_eq!(
            outbound,
            concat!(
                r#"<rpc xmlns="urn:ietf:params:xml:ns:netconf:base:1.0" message-id="1"><action xmlns="urn:ietf:params:xml:ns:yang:1"><restart xmlns="urn:x"/></action></rpc>]]>]]>"#,
                r#"<rpc xmlns="urn:ietf:params:xml:ns:netconf:base:1.0" message-id="2"><get-config><source><running/></source></get-config></rpc>]]>]]>"#,
                r#"<rpc xmlns="urn:ietf:params:xml:ns:netconf:base:1.0" message-id="3"><edit-config><target><candidate/></target><config><hostname xmlns="urn:x">r1</hostname></config></edit-config></rpc>]]>]]>"#,
            )
        );
    }

    #[test]
    fn test_stderr_is_forwarded_to_diagnostics() {
        let (mut session, events) = established(HELLO_11);
        session.receive_stderr(b"warning: banner\n");
        session.receive_stderr(b"\n");
        assert_eq!(
            events.take(),
            vec!["diagnostic transport stderr: warning: banner".to_string()]
        );
    }
}
