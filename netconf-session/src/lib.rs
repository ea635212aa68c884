//! # netconf-session
//!
//! ```toml
//! netconf-session = "^0.1.0"
//! ```
//!
//! Client side of a NETCONF session: end-of-message and chunked framing
//! ([RFC6242]), hello exchange and capability negotiation, and correlation of
//! `rpc-reply` messages with outstanding requests ([RFC6241]).
//!
//! [`session::Session`] is the transport independent state machine. It is fed
//! inbound bytes and hands out the bytes to write back. [`connection::Connection`]
//! drives one over any async byte stream, e.g. the SSH `netconf` subsystem
//! provided by [`transport::ssh::SSHTransport`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use netconf_session::config::{Authentication, SessionConfig};
//! use netconf_session::connection::Connection;
//! use netconf_session::message::Datastore;
//! use netconf_session::transport::ssh::SSHTransport;
//!
//! # async fn run() -> netconf_session::error::NetconfClientResult<()> {
//! let config = SessionConfig::from_host(
//!     "192.0.2.1:830",
//!     "admin",
//!     Authentication::Password("admin".to_string()),
//! )?;
//! let transport = SSHTransport::connect(&config).await?;
//! let connection = Connection::new(transport).await?;
//! let reply = connection.get_config(Datastore::Running, None, None).await?;
//! println!("{}", reply);
//! connection.close_session().await?;
//! # Ok(())
//! # }
//! ```
//!
//! [RFC6242]: https://www.rfc-editor.org/rfc/rfc6242.html
//! [RFC6241]: https://www.rfc-editor.org/rfc/rfc6241.html
pub mod buffer;
pub mod config;
#[cfg(all(feature = "tokio", feature = "async-trait"))]
pub mod connection;
pub mod error;
pub mod framer;
pub mod message;
pub mod session;
#[cfg(all(feature = "tokio", feature = "async-trait"))]
pub mod transport;
pub mod xml;

pub const NETCONF_URN: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";
pub const NETCONF_NOTIFICATION_URN: &str = "urn:ietf:params:xml:ns:netconf:notification:1.0";
pub const WITH_DEFAULTS_URN: &str = "urn:ietf:params:xml:ns:yang:ietf-netconf-with-defaults";
pub const YANG_1_URN: &str = "urn:ietf:params:xml:ns:yang:1";
pub const NETCONF_BASE_10_CAP: &str = "urn:ietf:params:netconf:base:1.0";
pub const NETCONF_BASE_11_CAP: &str = "urn:ietf:params:netconf:base:1.1";
