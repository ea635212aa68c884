use crate::error::{self, NetconfClientError, NetconfClientResult};
use crate::xml::{self, Element};
use crate::{
    NETCONF_BASE_10_CAP, NETCONF_BASE_11_CAP, NETCONF_NOTIFICATION_URN, NETCONF_URN,
    WITH_DEFAULTS_URN, YANG_1_URN,
};
use core::fmt;
use core::fmt::Display;
use core::str::FromStr;
use serde::de::value::StrDeserializer;
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde_derive::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Inbound message, classified once by the local name of its root element.
#[derive(Debug)]
pub enum Message {
    Hello(Hello),
    RpcReply(RpcReply),
    Notification(Notification),
    Unrecognized(Element),
}

impl Message {
    pub fn decode(text: &str) -> NetconfClientResult<Message> {
        Ok(Message::from_element(xml::decode(text)?))
    }

    pub fn from_element(root: Element) -> Message {
        match root.local_name() {
            "hello" => Message::Hello(Hello::from_element(&root)),
            "rpc-reply" => Message::RpcReply(RpcReply::from_element(root)),
            "notification" => Message::Notification(Notification { element: root }),
            _ => Message::Unrecognized(root),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hello {
    session_id: Option<u64>,
    capabilities: Vec<String>,
    skipped: Vec<String>,
}

impl Hello {
    /// Hello sent by this client: base:1.0 and base:1.1.
    pub fn new() -> Hello {
        Hello {
            session_id: None,
            capabilities: vec![
                NETCONF_BASE_10_CAP.to_string(),
                NETCONF_BASE_11_CAP.to_string(),
            ],
            skipped: Vec::new(),
        }
    }

    pub fn from_element(element: &Element) -> Hello {
        let mut hello = Hello::default();
        if let Some(id) = element.child_text("session-id") {
            match id.trim().parse() {
                Ok(id) => hello.session_id = Some(id),
                Err(_) => hello.skipped.push(format!("invalid session-id {:?}", id)),
            }
        }

        let Some(capabilities) = element.child("capabilities") else {
            hello.skipped.push("hello has no capabilities element".to_string());
            return hello;
        };
        for child in &capabilities.children {
            if child.local_name() != "capability" {
                hello
                    .skipped
                    .push(format!("unexpected element <{}> in capabilities", child.name));
                continue;
            }
            match child.text().map(str::trim) {
                Some(uri) if !uri.is_empty() => hello.capabilities.push(uri.to_string()),
                _ => hello.skipped.push("empty capability element".to_string()),
            }
        }
        hello
    }

    pub fn to_element(&self) -> Element {
        let capabilities = self
            .capabilities
            .iter()
            .map(|capability| Element::new("capability").with_text(capability.as_str()));
        let mut hello = Element::new("hello")
            .with_namespace(NETCONF_URN)
            .with_child(Element::new("capabilities").with_children(capabilities));
        if let Some(session_id) = self.session_id {
            hello = hello.with_child(Element::new("session-id").with_text(session_id.to_string()));
        }
        hello
    }

    pub fn capabilities(&self) -> Vec<String> {
        self.capabilities.to_vec()
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|cap| cap == capability)
    }

    pub fn session_id(&self) -> Option<u64> {
        self.session_id
    }

    /// Diagnostics for malformed parts that were ignored while parsing.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcReply {
    message_id: Option<String>,
    element: Element,
}

impl RpcReply {
    pub fn from_element(element: Element) -> RpcReply {
        RpcReply {
            message_id: element.attribute("message-id").map(str::to_string),
            element,
        }
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn is_ok(&self) -> bool {
        self.element.child("ok").is_some() && !self.has_errors()
    }

    pub fn has_errors(&self) -> bool {
        self.element.child("rpc-error").is_some()
    }

    pub fn errors(&self) -> Vec<RpcError> {
        self.element
            .children_named("rpc-error")
            .map(RpcError::from_element)
            .collect()
    }

    /// Content of `<data>`, present for `get` and `get-config`.
    pub fn data(&self) -> Option<&Element> {
        self.element.child("data")
    }

    pub fn element(&self) -> &Element {
        &self.element
    }
}

impl Display for RpcReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.element)
    }
}

impl std::error::Error for RpcReply {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorType {
    Transport,
    Rpc,
    Protocol,
    Application,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorTag {
    InUse,
    InvalidValue,
    TooBig,
    MissingAttribute,
    BadAttribute,
    UnknownAttribute,
    MissingElement,
    BadElement,
    UnknownElement,
    UnknownNamespace,
    AccessDenied,
    LockDenied,
    ResourceDenied,
    RollbackFailed,
    DataExists,
    DataMissing,
    OperationNotSupported,
    OperationFailed,
    PartialOperation,
    MalformedMessage,
}

/// View of one `<rpc-error>`; enumerated fields are `None` when the peer
/// sent a value outside RFC 6241.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    pub error_type: Option<ErrorType>,
    pub error_tag: Option<ErrorTag>,
    pub error_severity: Option<ErrorSeverity>,
    pub error_app_tag: Option<String>,
    pub error_path: Option<String>,
    pub error_message: Option<String>,
    pub error_info: Option<Element>,
}

impl RpcError {
    fn from_element(element: &Element) -> RpcError {
        let text = |name: &str| element.child_text(name).map(|t| t.trim().to_string());
        RpcError {
            error_type: text("error-type").and_then(|t| parse_enum(&t)),
            error_tag: text("error-tag").and_then(|t| parse_enum(&t)),
            error_severity: text("error-severity").and_then(|t| parse_enum(&t)),
            error_app_tag: text("error-app-tag"),
            error_path: text("error-path"),
            error_message: text("error-message"),
            error_info: element.child("error-info").cloned(),
        }
    }
}

fn parse_enum<T: DeserializeOwned>(value: &str) -> Option<T> {
    let deserializer: StrDeserializer<'_, serde::de::value::Error> = value.into_deserializer();
    T::deserialize(deserializer).ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    element: Element,
}

impl Notification {
    pub fn event_time(&self) -> Option<OffsetDateTime> {
        let time = self.element.child_text("eventTime")?;
        OffsetDateTime::parse(time.trim(), &Rfc3339).ok()
    }

    /// Event payload, i.e. every child except `<eventTime>`.
    pub fn content(&self) -> impl Iterator<Item = &Element> {
        self.element
            .children
            .iter()
            .filter(|child| child.local_name() != "eventTime")
    }

    pub fn element(&self) -> &Element {
        &self.element
    }
}

impl Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.element)
    }
}

/// `<rpc message-id=".." xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">`
pub fn rpc_envelope(message_id: &str, content: Element) -> Element {
    Element::new("rpc")
        .with_namespace(NETCONF_URN)
        .with_attribute("message-id", message_id)
        .with_child(content)
}

/// `<action xmlns="urn:ietf:params:xml:ns:yang:1">`, RFC 7950 section 7.15.
pub fn action_envelope(content: Element) -> Element {
    Element::new("action")
        .with_namespace(YANG_1_URN)
        .with_child(content)
}

#[derive(Debug, Clone)]
pub enum RpcOperation {
    CloseSession,
    KillSession { session_id: u64 },
    Validate { source: Datastore },
    GetConfig(GetConfig),
    Get(Get),
    EditConfig(EditConfig),
    Commit(Commit),
    DiscardChanges,
    Lock { target: Datastore },
    Unlock { target: Datastore },
    CreateSubscription(CreateSubscription),
}

impl RpcOperation {
    pub fn new_get_config(
        datastore: Datastore,
        filter: Option<Filter>,
        defaults: Option<WithDefaultsValue>,
    ) -> RpcOperation {
        RpcOperation::GetConfig(GetConfig {
            source: datastore,
            filter,
            with_defaults: defaults,
        })
    }

    pub fn new_get(filter: Option<Filter>, defaults: Option<WithDefaultsValue>) -> RpcOperation {
        RpcOperation::Get(Get {
            filter,
            with_defaults: defaults,
        })
    }

    pub fn new_edit_config(
        target: Datastore,
        config: Vec<Element>,
        default_operation: Option<DefaultOperation>,
    ) -> RpcOperation {
        RpcOperation::EditConfig(EditConfig {
            target,
            default_operation,
            config,
        })
    }

    pub fn new_commit(
        confirmed: bool,
        confirm_timeout: Option<u32>,
        persist: Option<String>,
        persist_id: Option<String>,
    ) -> RpcOperation {
        RpcOperation::Commit(Commit {
            confirmed,
            confirm_timeout,
            persist,
            persist_id,
        })
    }

    pub fn new_create_subscription(
        stream: Option<&str>,
        filter: Option<Filter>,
        start_time: Option<OffsetDateTime>,
        stop_time: Option<OffsetDateTime>,
    ) -> RpcOperation {
        RpcOperation::CreateSubscription(CreateSubscription {
            stream: stream.map(|s| s.to_string()),
            filter,
            start_time,
            stop_time,
        })
    }

    pub fn to_element(&self) -> NetconfClientResult<Element> {
        let element = match self {
            RpcOperation::CloseSession => Element::new("close-session"),
            RpcOperation::KillSession { session_id } => Element::new("kill-session")
                .with_child(Element::new("session-id").with_text(session_id.to_string())),
            RpcOperation::Validate { source } => {
                Element::new("validate").with_child(datastore_element("source", source))
            }
            RpcOperation::GetConfig(get_config) => {
                let source = datastore_element("source", &get_config.source);
                let mut element = Element::new("get-config").with_child(source);
                if let Some(filter) = &get_config.filter {
                    element = element.with_child(filter.to_element());
                }
                if let Some(defaults) = &get_config.with_defaults {
                    element = element.with_child(defaults.to_element());
                }
                element
            }
            RpcOperation::Get(get) => {
                let mut element = Element::new("get");
                if let Some(filter) = &get.filter {
                    element = element.with_child(filter.to_element());
                }
                if let Some(defaults) = &get.with_defaults {
                    element = element.with_child(defaults.to_element());
                }
                element
            }
            RpcOperation::EditConfig(edit) => {
                let target = datastore_element("target", &edit.target);
                let mut element = Element::new("edit-config").with_child(target);
                if let Some(operation) = edit.default_operation {
                    let operation = Element::new("default-operation").with_text(operation.as_str());
                    element = element.with_child(operation);
                }
                let config = Element::new("config").with_children(edit.config.iter().cloned());
                element.with_child(config)
            }
            RpcOperation::Commit(commit) => commit.to_element(),
            RpcOperation::DiscardChanges => Element::new("discard-changes"),
            RpcOperation::Lock { target } => {
                Element::new("lock").with_child(datastore_element("target", target))
            }
            RpcOperation::Unlock { target } => {
                Element::new("unlock").with_child(datastore_element("target", target))
            }
            RpcOperation::CreateSubscription(subscription) => subscription.to_element()?,
        };
        Ok(element)
    }
}

#[derive(Debug, Clone)]
pub struct Commit {
    confirmed: bool,
    confirm_timeout: Option<u32>,
    persist: Option<String>,
    persist_id: Option<String>,
}

impl Commit {
    fn to_element(&self) -> Element {
        let mut element = Element::new("commit");
        if self.confirmed {
            element = element.with_child(Element::new("confirmed"));
        }
        if let Some(timeout) = self.confirm_timeout {
            let timeout = Element::new("confirm-timeout").with_text(timeout.to_string());
            element = element.with_child(timeout);
        }
        if let Some(persist) = &self.persist {
            element = element.with_child(Element::new("persist").with_text(persist.as_str()));
        }
        if let Some(persist_id) = &self.persist_id {
            let persist_id = Element::new("persist-id").with_text(persist_id.as_str());
            element = element.with_child(persist_id);
        }
        element
    }
}

#[derive(Debug, Clone)]
pub struct Get {
    filter: Option<Filter>,
    with_defaults: Option<WithDefaultsValue>,
}

#[derive(Debug, Clone)]
pub struct GetConfig {
    source: Datastore,
    filter: Option<Filter>,
    with_defaults: Option<WithDefaultsValue>,
}

#[derive(Debug, Clone)]
pub struct EditConfig {
    target: Datastore,
    default_operation: Option<DefaultOperation>,
    config: Vec<Element>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultOperation {
    Merge,
    Replace,
    None,
}

impl DefaultOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefaultOperation::Merge => "merge",
            DefaultOperation::Replace => "replace",
            DefaultOperation::None => "none",
        }
    }
}

impl FromStr for DefaultOperation {
    type Err = error::NetconfClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merge" => Ok(DefaultOperation::Merge),
            "replace" => Ok(DefaultOperation::Replace),
            "none" => Ok(DefaultOperation::None),
            _ => Err(error::NetconfClientError::new(format!(
                "unknown default-operation value: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithDefaultsValue {
    ReportAll,
    ReportAllTagged,
    Trim,
    Explicit,
}

impl WithDefaultsValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithDefaultsValue::ReportAll => "report-all",
            WithDefaultsValue::ReportAllTagged => "report-all-tagged",
            WithDefaultsValue::Trim => "trim",
            WithDefaultsValue::Explicit => "explicit",
        }
    }

    fn to_element(self) -> Element {
        Element::new("with-defaults")
            .with_namespace(WITH_DEFAULTS_URN)
            .with_text(self.as_str())
    }
}

impl FromStr for WithDefaultsValue {
    type Err = error::NetconfClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let defaults = s.to_lowercase();
        match defaults.as_str() {
            "report-all" => Ok(WithDefaultsValue::ReportAll),
            "report-all-tagged" => Ok(WithDefaultsValue::ReportAllTagged),
            "trim" => Ok(WithDefaultsValue::Trim),
            "explicit" => Ok(WithDefaultsValue::Explicit),
            _ => Err(error::NetconfClientError::new(format!(
                "unknown with-defaults value: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datastore {
    Candidate,
    Running,
    Startup,
    Url(String),
}

fn datastore_element(wrapper: &str, datastore: &Datastore) -> Element {
    let datastore = match datastore {
        Datastore::Candidate => Element::new("candidate"),
        Datastore::Running => Element::new("running"),
        Datastore::Startup => Element::new("startup"),
        Datastore::Url(url) => Element::new("url").with_text(url.as_str()),
    };
    Element::new(wrapper).with_child(datastore)
}

impl FromStr for Datastore {
    type Err = error::NetconfClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let datastore = s.to_lowercase();
        match datastore.as_str() {
            "running" => Ok(Datastore::Running),
            "candidate" => Ok(Datastore::Candidate),
            "startup" => Ok(Datastore::Startup),
            _ => {
                if datastore.starts_with("http")
                    || datastore.starts_with("file")
                    || datastore.starts_with("ftp")
                {
                    Ok(Datastore::Url(s.to_string()))
                } else {
                    Err(error::NetconfClientError::UnknownDatastore {
                        expected: vec![
                            "running".to_string(),
                            "candidate".to_string(),
                            "startup".to_string(),
                            "ftp|http|file".to_string(),
                        ],
                        unknown: datastore,
                    })
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Subtree(Vec<Element>),
    XPath(String),
}

impl Filter {
    /// Subtree filter from XML text; backslash escapes as produced by shells
    /// are removed first.
    pub fn subtree(filter: &str) -> NetconfClientResult<Filter> {
        let filter = Filter::strip_slashes(filter).ok_or_else(|| {
            NetconfClientError::new("subtree filter ends with a dangling '\\'".to_string())
        })?;
        Ok(Filter::Subtree(xml::decode_fragment(filter.trim())?))
    }

    pub fn xpath(select: &str) -> Filter {
        Filter::XPath(select.to_string())
    }

    fn to_element(&self) -> Element {
        match self {
            Filter::Subtree(content) => Element::new("filter")
                .with_attribute("type", "subtree")
                .with_children(content.iter().cloned()),
            Filter::XPath(select) => Element::new("filter")
                .with_attribute("type", "xpath")
                .with_attribute("select", select.as_str()),
        }
    }

    fn strip_slashes(s: &str) -> Option<String> {
        let mut n = String::new();
        let mut chars = s.trim().chars();

        while let Some(c) = chars.next() {
            n.push(match c {
                '\\' => chars.next()?,
                c => c,
            });
        }

        Some(n)
    }
}

#[derive(Debug, Clone)]
pub struct CreateSubscription {
    stream: Option<String>,
    filter: Option<Filter>,
    start_time: Option<OffsetDateTime>,
    stop_time: Option<OffsetDateTime>,
}

impl CreateSubscription {
    fn to_element(&self) -> NetconfClientResult<Element> {
        let mut element =
            Element::new("create-subscription").with_namespace(NETCONF_NOTIFICATION_URN);
        if let Some(stream) = &self.stream {
            element = element.with_child(Element::new("stream").with_text(stream.as_str()));
        }
        if let Some(filter) = &self.filter {
            element = element.with_child(filter.to_element());
        }
        for (name, time) in [("startTime", self.start_time), ("stopTime", self.stop_time)] {
            if let Some(time) = time {
                let formatted = time
                    .format(&Rfc3339)
                    .map_err(|err| NetconfClientError::new(err.to_string()))?;
                element = element.with_child(Element::new(name).with_text(formatted));
            }
        }
        Ok(element)
    }
}
