//! Strict quote checking for the CSV stream
//!
//! The CSV reader accepts stray quotes without complaint: an unterminated
//! quoted field swallows the following rows, and `"COFFEE" SHOP` is read as
//! `COFFEE SHOP`. [`QuoteGuard`] sits between the object body and the reader
//! and fails the stream at the first quoting violation:
//!
//! - a `"` inside a field that did not start with one
//! - anything other than `"`, a delimiter or a line break after a closing `"`
//! - end of input inside a quoted field
//!
//! Bytes before the offending byte are passed through, so rows that precede
//! the malformed one are still delivered to the reader.

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use thiserror::Error;
use tokio::io::{AsyncRead, ReadBuf};

const QUOTE: u8 = b'"';
const DELIMITER: u8 = b',';

/// A quoting violation, with the 1-based line of the offending field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedQuote {
    #[error("bare \" in non-quoted field on line {line}")]
    BareQuote { line: u64 },

    #[error("extraneous \" in quoted field starting on line {line}")]
    ExtraneousQuote { line: u64 },

    #[error("quoted field starting on line {line} is never closed")]
    Unterminated { line: u64 },
}

impl MalformedQuote {
    pub fn line(&self) -> u64 {
        match self {
            MalformedQuote::BareQuote { line }
            | MalformedQuote::ExtraneousQuote { line }
            | MalformedQuote::Unterminated { line } => *line,
        }
    }

    fn to_io_error(&self) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, self.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    /// Just saw a `"` inside a quoted field: either an escape or the close
    QuoteInQuoted,
}

/// `AsyncRead` adapter that rejects malformed quoting
pub struct QuoteGuard<R> {
    inner: R,
    state: State,
    line: u64,
    field_line: u64,
    failed: Option<MalformedQuote>,
}

impl<R> QuoteGuard<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            state: State::FieldStart,
            line: 1,
            field_line: 1,
            failed: None,
        }
    }

    /// Advance over `bytes`, returning the offset of the first bad byte
    fn scan(&mut self, bytes: &[u8]) -> Result<(), (usize, MalformedQuote)> {
        for (offset, &byte) in bytes.iter().enumerate() {
            let next = match (self.state, byte) {
                (State::Quoted, QUOTE) => State::QuoteInQuoted,
                (State::Quoted, _) => State::Quoted,
                (State::QuoteInQuoted, QUOTE) => State::Quoted,
                (State::FieldStart, QUOTE) => {
                    self.field_line = self.line;
                    State::Quoted
                },
                (State::Unquoted, QUOTE) => {
                    return Err((offset, MalformedQuote::BareQuote { line: self.line }));
                },
                (_, DELIMITER | b'\n' | b'\r') => State::FieldStart,
                (State::QuoteInQuoted, _) => {
                    let line = self.field_line;
                    return Err((offset, MalformedQuote::ExtraneousQuote { line }));
                },
                (_, _) => State::Unquoted,
            };

            if byte == b'\n' {
                self.line += 1;
            }
            self.state = next;
        }

        Ok(())
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for QuoteGuard<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if let Some(failed) = &this.failed {
            return Poll::Ready(Err(failed.to_io_error()));
        }
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        let start = buf.filled().len();
        ready!(Pin::new(&mut this.inner).poll_read(cx, buf))?;
        let end = buf.filled().len();

        if start == end {
            if this.state == State::Quoted {
                let failed = MalformedQuote::Unterminated {
                    line: this.field_line,
                };
                let err = failed.to_io_error();
                this.failed = Some(failed);
                return Poll::Ready(Err(err));
            }
            return Poll::Ready(Ok(()));
        }

        if let Err((offset, failed)) = this.scan(&buf.filled()[start..end]) {
            let err = failed.to_io_error();
            this.failed = Some(failed);
            if offset == 0 {
                return Poll::Ready(Err(err));
            }
            buf.set_filled(start + offset);
        }

        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    async fn read_all(input: &str) -> Result<String, MalformedQuote> {
        let mut guard = QuoteGuard::new(input.as_bytes());
        let mut out = String::new();
        match guard.read_to_string(&mut out).await {
            Ok(_) => Ok(out),
            Err(e) => Err(e
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<MalformedQuote>())
                .cloned()
                .unwrap()),
        }
    }

    #[tokio::test]
    async fn test_well_formed_quoting_passes_through() {
        let input = "a,\"b, c\",\"say \"\"hi\"\"\"\r\n\"multi\nline\",,\"\"\n";
        assert_eq!(read_all(input).await.unwrap(), input);
    }

    #[tokio::test]
    async fn test_unterminated_quote_at_end_of_input() {
        let err = read_all("h\n1,2\n3,\"oops\n4,5\n").await.unwrap_err();
        assert_eq!(err, MalformedQuote::Unterminated { line: 3 });
    }

    #[tokio::test]
    async fn test_text_after_closing_quote() {
        let err = read_all("h\n\"COFFEE\" SHOP,1\n").await.unwrap_err();
        assert_eq!(err, MalformedQuote::ExtraneousQuote { line: 2 });
    }

    #[tokio::test]
    async fn test_unterminated_last_field_pairs_with_next_quote() {
        let err = read_all("h\n1,\"oops\n2,\"x, y\"\n").await.unwrap_err();
        assert_eq!(err, MalformedQuote::ExtraneousQuote { line: 2 });
    }

    #[tokio::test]
    async fn test_bare_quote_in_unquoted_field() {
        let err = read_all("h\nJOE\"S DINER,1\n").await.unwrap_err();
        assert_eq!(err, MalformedQuote::BareQuote { line: 2 });
    }

    #[tokio::test]
    async fn test_bytes_before_violation_are_delivered() {
        let mut guard = QuoteGuard::new("a,b\nc,d\"e\n".as_bytes());
        let mut buf = [0u8; 64];

        let n = guard.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"a,b\nc,d");
        assert!(guard.read(&mut buf).await.is_err());
    }
}
