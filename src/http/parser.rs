use bytes::{Buf, BytesMut};

use crate::http::request::Method;

#[derive(Debug)]
pub enum ParseError {
    InvalidRequest,
    InvalidMethod,
    InvalidHeader,
    InvalidContentLength,
    /// Declared Content-Length exceeds the configured request size limit
    BodyTooLarge(usize),
}

/// Receiver for parser events, one method per event.
///
/// Events for a single message arrive in a fixed order: `on_url`, then
/// `on_header` per header line, `on_headers_complete`, `on_body` per body
/// chunk, and finally `on_message_complete`. Returning an error from any
/// method aborts the parse; the error surfaces from [`HttpParser::feed`].
pub trait ParseSink {
    fn on_url(&mut self, url: &[u8]) -> Result<(), ParseError>;
    fn on_header(&mut self, name: &str, value: &str) -> Result<(), ParseError>;
    fn on_headers_complete(&mut self, method: Method, version: &str) -> Result<(), ParseError>;
    fn on_body(&mut self, chunk: &[u8]) -> Result<(), ParseError>;
    fn on_message_complete(&mut self) -> Result<(), ParseError>;
}

#[derive(Debug, Clone, Copy)]
enum ParseState {
    RequestLine,
    Headers,
    Body { remaining: usize },
    Complete,
}

/// Incremental HTTP/1.1 request parser.
///
/// Consumes bytes from the front of a buffer as complete tokens become
/// available and emits events to a [`ParseSink`]. Incomplete lines stay in
/// the buffer until more data arrives, so the transport may deliver chunks
/// split at arbitrary byte boundaries. Once the message is complete the
/// parser stops consuming; bytes of a follow-up request are left untouched
/// for the next cycle.
///
/// Body framing is Content-Length only. Chunked transfer-encoding is not
/// supported.
pub struct HttpParser {
    state: ParseState,
    method: Option<Method>,
    version: String,
    keep_alive_hint: Option<bool>,
    content_length: usize,
}

impl HttpParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::RequestLine,
            method: None,
            version: String::new(),
            keep_alive_hint: None,
            content_length: 0,
        }
    }

    /// HTTP version of the request line, "1.0" or "1.1".
    pub fn http_version(&self) -> &str {
        &self.version
    }

    /// Whether the message is fully parsed.
    pub fn is_complete(&self) -> bool {
        matches!(self.state, ParseState::Complete)
    }

    /// Whether the transport may be reused for another request.
    ///
    /// An explicit Connection header wins; otherwise HTTP/1.1 defaults to
    /// keep-alive and HTTP/1.0 to close.
    pub fn should_keep_alive(&self) -> bool {
        match self.keep_alive_hint {
            Some(hint) => hint,
            None => self.version != "1.0",
        }
    }

    /// Feeds buffered bytes through the state machine.
    ///
    /// Consumes from the front of `buf` and fires sink events for every
    /// complete token. Returns without error when out of usable input;
    /// call again once more bytes have been appended.
    pub fn feed(&mut self, buf: &mut BytesMut, sink: &mut impl ParseSink) -> Result<(), ParseError> {
        loop {
            match self.state {
                ParseState::RequestLine => {
                    let Some(line) = take_line(buf) else {
                        return Ok(());
                    };
                    self.parse_request_line(&line, sink)?;
                    self.state = ParseState::Headers;
                }

                ParseState::Headers => {
                    let Some(line) = take_line(buf) else {
                        return Ok(());
                    };

                    if line.is_empty() {
                        let method = self.method.clone().ok_or(ParseError::InvalidRequest)?;
                        sink.on_headers_complete(method, &self.version)?;
                        if self.content_length == 0 {
                            sink.on_message_complete()?;
                            self.state = ParseState::Complete;
                        } else {
                            self.state = ParseState::Body {
                                remaining: self.content_length,
                            };
                        }
                        continue;
                    }

                    self.parse_header_line(&line, sink)?;
                }

                ParseState::Body { remaining } => {
                    if buf.is_empty() {
                        return Ok(());
                    }
                    let take = remaining.min(buf.len());
                    let chunk = buf.split_to(take);
                    sink.on_body(&chunk)?;
                    if take == remaining {
                        sink.on_message_complete()?;
                        self.state = ParseState::Complete;
                    } else {
                        self.state = ParseState::Body {
                            remaining: remaining - take,
                        };
                        return Ok(());
                    }
                }

                ParseState::Complete => return Ok(()),
            }
        }
    }

    fn parse_request_line(&mut self, line: &[u8], sink: &mut impl ParseSink) -> Result<(), ParseError> {
        let line = std::str::from_utf8(line).map_err(|_| ParseError::InvalidRequest)?;
        let mut parts = line.split_whitespace();

        let method = parts.next().ok_or(ParseError::InvalidRequest)?;
        let target = parts.next().ok_or(ParseError::InvalidRequest)?;
        let proto = parts.next().ok_or(ParseError::InvalidRequest)?;
        if parts.next().is_some() {
            return Err(ParseError::InvalidRequest);
        }

        self.method = Some(Method::from_str(method).ok_or(ParseError::InvalidMethod)?);

        let version = proto
            .strip_prefix("HTTP/")
            .ok_or(ParseError::InvalidRequest)?;
        if version != "1.0" && version != "1.1" {
            return Err(ParseError::InvalidRequest);
        }
        self.version = version.to_string();

        sink.on_url(target.as_bytes())
    }

    fn parse_header_line(&mut self, line: &[u8], sink: &mut impl ParseSink) -> Result<(), ParseError> {
        let line = std::str::from_utf8(line).map_err(|_| ParseError::InvalidHeader)?;
        let (name, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
        let name = name.trim();
        let value = value.trim();

        if name.eq_ignore_ascii_case("content-length") {
            self.content_length = value.parse().map_err(|_| ParseError::InvalidContentLength)?;
        } else if name.eq_ignore_ascii_case("connection") {
            if value.eq_ignore_ascii_case("keep-alive") {
                self.keep_alive_hint = Some(true);
            } else if value.eq_ignore_ascii_case("close") {
                self.keep_alive_hint = Some(false);
            }
        }

        sink.on_header(name, value)
    }
}

impl Default for HttpParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits one CRLF-terminated line off the front of the buffer, without the
/// terminator. Returns None when no complete line is buffered yet.
fn take_line(buf: &mut BytesMut) -> Option<BytesMut> {
    let pos = buf.windows(2).position(|w| w == b"\r\n")?;
    let line = buf.split_to(pos);
    buf.advance(2);
    Some(line)
}
