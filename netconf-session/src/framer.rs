//! NETCONF message framing.
//! See [RFC6242](https://tools.ietf.org/html/rfc6242#section-4.1)
//!
//! A session starts with end-of-message framing (`]]>]]>` separator, base:1.0)
//! and switches to chunked framing once both peers advertise base:1.1.

use crate::buffer::{Buffer, Incomplete};
use crate::error::{NetconfClientError, NetconfClientResult};
use bytes::{BufMut, Bytes, BytesMut};
use log::{debug, trace};

pub const NETCONF_1_0_TERMINATOR: &str = "]]>]]>";
pub const CHUNK_PREFIX: &[u8] = b"\n#";
pub const END_OF_CHUNKS: &[u8] = b"\n##\n";
pub const MAX_CHUNK_SIZE: u64 = 4_294_967_295;

/// Longest size token: the ten digits of [`MAX_CHUNK_SIZE`].
const MAX_CHUNK_SIZE_DIGITS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingMode {
    /// `]]>]]>` delimited, protocol version 1.0.
    EndOfMessage,
    /// Length prefixed chunks, protocol version 1.1.
    Chunked,
}

enum Step {
    Incomplete,
    Violation(NetconfClientError),
}

impl From<Incomplete> for Step {
    fn from(_: Incomplete) -> Self {
        Step::Incomplete
    }
}

impl From<NetconfClientError> for Step {
    fn from(err: NetconfClientError) -> Self {
        Step::Violation(err)
    }
}

#[derive(Debug)]
pub struct Framer {
    mode: FramingMode,
    /// Payload of the chunked message being assembled.
    accumulator: BytesMut,
    /// Bytes past the commit point already searched for the separator.
    scanned: usize,
    max_chunk_size: usize,
}

impl Default for Framer {
    fn default() -> Self {
        Framer::new()
    }
}

impl Framer {
    pub fn new() -> Framer {
        Framer {
            mode: FramingMode::EndOfMessage,
            accumulator: BytesMut::new(),
            scanned: 0,
            max_chunk_size: usize::try_from(MAX_CHUNK_SIZE).unwrap_or(usize::MAX),
        }
    }

    /// Caps outbound chunk payloads at `size` bytes, clamped to `1..=MAX_CHUNK_SIZE`.
    pub fn with_max_chunk_size(mut self, size: usize) -> Framer {
        let limit = usize::try_from(MAX_CHUNK_SIZE).unwrap_or(usize::MAX);
        self.max_chunk_size = size.clamp(1, limit);
        self
    }

    pub fn mode(&self) -> FramingMode {
        self.mode
    }

    /// Switches to chunked framing. There is no way back.
    pub fn upgrade(&mut self) {
        if self.mode != FramingMode::Chunked {
            debug!("Switching to chunked framing");
            self.mode = FramingMode::Chunked;
            self.scanned = 0;
        }
    }

    /// Extracts the next complete message from `buffer`.
    ///
    /// Returns `Ok(None)` when more input is needed; the buffer is rewound to
    /// its last commit point so the attempt can be repeated verbatim.
    pub fn decode(&mut self, buffer: &mut Buffer) -> NetconfClientResult<Option<Bytes>> {
        let step = match self.mode {
            FramingMode::EndOfMessage => self.decode_end_of_message(buffer),
            FramingMode::Chunked => self.decode_chunked(buffer),
        };
        match step {
            Ok(message) => Ok(Some(message)),
            Err(Step::Incomplete) => {
                buffer.rewind();
                Ok(None)
            }
            Err(Step::Violation(err)) => Err(err),
        }
    }

    pub fn encode(&self, message: &[u8], out: &mut BytesMut) {
        match self.mode {
            FramingMode::EndOfMessage => {
                out.reserve(message.len() + NETCONF_1_0_TERMINATOR.len());
                out.put_slice(message);
                out.put_slice(NETCONF_1_0_TERMINATOR.as_bytes());
            }
            FramingMode::Chunked => {
                for chunk in message.chunks(self.max_chunk_size) {
                    out.put_slice(format!("\n#{}\n", chunk.len()).as_bytes());
                    out.put_slice(chunk);
                }
                out.put_slice(END_OF_CHUNKS);
            }
        }
    }

    fn decode_end_of_message(&mut self, buffer: &mut Buffer) -> Result<Bytes, Step> {
        let terminator = NETCONF_1_0_TERMINATOR.as_bytes();
        let end = match buffer.find_from(terminator, self.scanned) {
            Ok(end) => end,
            Err(Incomplete) => {
                // a separator may still begin in the last few unread bytes
                self.scanned = buffer
                    .available()
                    .saturating_sub(terminator.len() - 1)
                    .max(self.scanned);
                return Err(Step::Incomplete);
            }
        };
        self.scanned = 0;
        let message = buffer.read(end)?;
        buffer.skip(terminator.len())?;
        buffer.consume();
        Ok(message)
    }

    fn decode_chunked(&mut self, buffer: &mut Buffer) -> Result<Bytes, Step> {
        loop {
            if !buffer.match_bytes(CHUNK_PREFIX)? {
                return Err(NetconfClientError::MalformedChunk(
                    "expected chunk header starting with \"\\n#\"".to_string(),
                )
                .into());
            }

            let end = match buffer.find(b"\n") {
                Ok(end) => end,
                Err(Incomplete) if buffer.available() > MAX_CHUNK_SIZE_DIGITS => {
                    return Err(NetconfClientError::MalformedChunk(
                        "chunk size is not terminated by a newline".to_string(),
                    )
                    .into());
                }
                Err(Incomplete) => return Err(Step::Incomplete),
            };
            if end > MAX_CHUNK_SIZE_DIGITS {
                return Err(NetconfClientError::MalformedChunk(
                    "chunk size has too many digits".to_string(),
                )
                .into());
            }
            let token = buffer.read(end)?;
            buffer.skip(1)?;

            if token.as_ref() == b"#" {
                buffer.consume();
                let message = self.accumulator.split().freeze();
                trace!("Assembled chunked message of {} bytes", message.len());
                return Ok(message);
            }

            let size = parse_chunk_size(&token)?;
            let payload = buffer.read(size)?;
            self.accumulator.extend_from_slice(&payload);
            buffer.consume();
        }
    }
}

fn parse_chunk_size(token: &[u8]) -> NetconfClientResult<usize> {
    let invalid =
        || NetconfClientError::InvalidChunkSize(String::from_utf8_lossy(token).into_owned());
    // chunk-size = 1*DIGIT1 0*9DIGIT
    if token.is_empty() || token[0] == b'0' || !token.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }
    let size: u64 = std::str::from_utf8(token)
        .ok()
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(invalid)?;
    if size == 0 || size > MAX_CHUNK_SIZE {
        return Err(invalid());
    }
    usize::try_from(size).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode_all(framer: &mut Framer, buffer: &mut Buffer) -> Vec<String> {
        let mut messages = Vec::new();
        while let Some(message) = framer.decode(buffer).unwrap() {
            messages.push(String::from_utf8(message.to_vec()).unwrap());
        }
        messages
    }

    #[test]
    fn test_chunked_framer() {
        let rpc_error = r#"
#38
<?xml version="1.0" encoding="UTF-8"?>
#1


#10
<rpc-reply
#50
 message-id="8ddd59e5-96fc-4a55-a75f-a3fae2d9f712"
#48
 xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"
#1
>
#1


#14
    <rpc-error
#1
>
#1


#41
        <error-type>protocol</error-type>
#1


#42
        <error-tag>bad-element</error-tag>
#1


#16
    </rpc-error>
#1


#12
</rpc-reply>
##
"#;
        let mut buffer = Buffer::new();
        buffer.write(Bytes::from(rpc_error.as_bytes().to_vec()));
        let mut framer = Framer::new();
        framer.upgrade();

        let messages = decode_all(&mut framer, &mut buffer);
        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<rpc-reply message-id="8ddd59e5-96fc-4a55-a75f-a3fae2d9f712" xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
    <rpc-error>
        <error-type>protocol</error-type>
        <error-tag>bad-element</error-tag>
    </rpc-error>
</rpc-reply>"#;
        assert_eq!(messages, vec![expected.to_string()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_eof_framer() {
        let input = "<hello/>]]>]]><rpc-reply message-id=\"1\"><ok/></rpc-reply>]]>]]><partial";
        let mut buffer = Buffer::new();
        buffer.write(Bytes::from(input.as_bytes().to_vec()));
        let mut framer = Framer::new();

        let messages = decode_all(&mut framer, &mut buffer);
        assert_eq!(
            messages,
            vec![
                "<hello/>".to_string(),
                "<rpc-reply message-id=\"1\"><ok/></rpc-reply>".to_string()
            ]
        );
        assert_eq!(buffer.available(), "<partial".len());
    }

    #[test]
    fn test_byte_at_a_time_delivery() {
        let input = b"\n#4\n<r/>\n#3\n<a/\n#1\n>\n##\n\n#2\nxy\n##\n";
        let mut buffer = Buffer::new();
        let mut framer = Framer::new();
        framer.upgrade();
        let mut messages = Vec::new();
        for byte in input.iter() {
            buffer.write(Bytes::copy_from_slice(&[*byte]));
            messages.extend(decode_all(&mut framer, &mut buffer));
        }
        assert_eq!(messages, vec!["<r/><a/>".to_string(), "xy".to_string()]);
        assert_eq!(buffer.segments(), 0);
    }

    #[test]
    fn test_single_chunk_scenario() {
        let mut buffer = Buffer::new();
        buffer.write(Bytes::from_static(b"\n#4\n<r/>"));
        let mut framer = Framer::new();
        framer.upgrade();
        assert!(framer.decode(&mut buffer).unwrap().is_none());
        assert_eq!(framer.accumulator.as_ref(), b"<r/>");

        buffer.write(Bytes::from_static(b"\n##\n"));
        let message = framer.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(message.as_ref(), b"<r/>");
        assert!(framer.accumulator.is_empty());
    }

    #[test]
    fn test_chunked_encode_decode() {
        for payload in [&b""[..], b"x", b"<rpc message-id=\"1\"><commit/></rpc>"] {
            let mut framer = Framer::new().with_max_chunk_size(8);
            framer.upgrade();
            let mut out = BytesMut::new();
            framer.encode(payload, &mut out);

            let mut buffer = Buffer::new();
            buffer.write(out.freeze());
            let message = framer.decode(&mut buffer).unwrap().unwrap();
            assert_eq!(message.as_ref(), payload);
        }
    }

    #[test]
    fn test_encode_wire_format() {
        let mut framer = Framer::new().with_max_chunk_size(3);
        let mut out = BytesMut::new();
        framer.encode(b"<a/>", &mut out);
        assert_eq!(out.as_ref(), b"<a/>]]>]]>");

        framer.upgrade();
        let mut out = BytesMut::new();
        framer.encode(b"<a/>", &mut out);
        assert_eq!(out.as_ref(), b"\n#3\n<a/\n#1\n>\n##\n");

        let mut out = BytesMut::new();
        framer.encode(b"", &mut out);
        assert_eq!(out.as_ref(), b"\n##\n");
    }

    #[test]
    fn test_framing_violations() {
        for input in [
            &b"<rpc-reply/>"[..],
            b"\n#abc\n",
            b"\n#0\n",
            b"\n#-1\n",
            b"\n#4294967296\n",
            b"\n#12345678901",
            b"\n#01\n<",
            b"\n#00000000001",
        ] {
            let mut buffer = Buffer::new();
            buffer.write(Bytes::copy_from_slice(input));
            let mut framer = Framer::new();
            framer.upgrade();
            let err = framer.decode(&mut buffer).unwrap_err();
            assert!(err.is_session_defunct(), "{:?} -> {}", input, err);
        }
    }

    #[test]
    fn test_parse_chunk_size() {
        assert_eq!(parse_chunk_size(b"1").unwrap(), 1);
        assert_eq!(parse_chunk_size(b"4294967295").unwrap(), 4_294_967_295);
        assert!(parse_chunk_size(b"").is_err());
        assert!(parse_chunk_size(b"+1").is_err());
        assert!(parse_chunk_size(b"0").is_err());
        assert!(parse_chunk_size(b"01").is_err());
        assert!(parse_chunk_size(b"0000000001").is_err());
    }

    #[test]
    fn test_large_message_in_small_reads() {
        let segment = Bytes::from(vec![b'a'; 16 * 1024]);
        let segments = 512;
        let mut buffer = Buffer::new();
        let mut framer = Framer::new();
        let started = std::time::Instant::now();
        for _ in 0..segments {
            buffer.write(segment.clone());
            assert!(framer.decode(&mut buffer).unwrap().is_none());
            assert_eq!(framer.scanned, buffer.available() - 5);
        }
        buffer.write(Bytes::from_static(b"]]>"));
        assert!(framer.decode(&mut buffer).unwrap().is_none());
        buffer.write(Bytes::from_static(b"]]><next/>"));
        let message = framer.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(message.len(), segments * segment.len());
        assert_eq!(framer.scanned, 0);
        assert!(framer.decode(&mut buffer).unwrap().is_none());
        assert_eq!(buffer.available(), "<next/>".len());
        assert!(
            started.elapsed() < std::time::Duration::from_secs(10),
            "took {:?}",
            started.elapsed()
        );
    }
}
