use crate::message;
use thiserror::Error;

pub type NetconfClientResult<T> = Result<T, NetconfClientError>;

#[derive(Debug, Error)]
pub enum NetconfClientError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "async-ssh2-lite")]
    #[error(transparent)]
    Ssh(#[from] async_ssh2_lite::Error),
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error("malformed xml document: {0}")]
    MalformedXml(String),
    #[error("message is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("remote procedure call failed:\n{0}")]
    Netconf(#[from] message::RpcReply),
    #[error("unknown datastore {}, (expected {:?})", unknown, expected)]
    UnknownDatastore {
        expected: Vec<String>,
        unknown: String,
    },
    #[error("malformed message chunk: {0}")]
    MalformedChunk(String),
    #[error("invalid chunk size {0:?}")]
    InvalidChunkSize(String),
    #[error("netconf session is closed")]
    SessionClosed,
    #[error("transport exited (code {code:?}, signal {signal:?})")]
    TransportClosed {
        code: Option<i32>,
        signal: Option<String>,
    },
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl NetconfClientError {
    pub fn new(msg: String) -> Self {
        NetconfClientError::Anyhow(anyhow::Error::msg(msg))
    }

    /// Framing violations and transport failures leave the session unusable.
    pub fn is_session_defunct(&self) -> bool {
        matches!(
            self,
            NetconfClientError::MalformedChunk(_)
                | NetconfClientError::InvalidChunkSize(_)
                | NetconfClientError::TransportClosed { .. }
                | NetconfClientError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_display() {
        assert_eq!(
            NetconfClientError::InvalidChunkSize("12a".to_string()).to_string(),
            "invalid chunk size \"12a\""
        );
        assert_eq!(
            NetconfClientError::TransportClosed {
                code: Some(255),
                signal: None
            }
            .to_string(),
            "transport exited (code Some(255), signal None)"
        );
        assert_eq!(
            NetconfClientError::new("boom".to_string()).to_string(),
            "boom"
        );
    }

    #[test]
    fn test_defunct_classification() {
        assert!(NetconfClientError::MalformedChunk("x".to_string()).is_session_defunct());
        assert!(!NetconfClientError::SessionClosed.is_session_defunct());
        assert!(!NetconfClientError::MalformedXml("x".to_string()).is_session_defunct());
    }
}
