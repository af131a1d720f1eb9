//! SMTP client
//!
//! `SmtpConnection` allows manually sending SMTP commands.
//!
//! ```rust,no_run
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use mailsender::transport::smtp::{
//!     client::{NetworkStream, SmtpConnection},
//!     extension::ClientId,
//!     SMTP_PORT,
//! };
//!
//! let stream = NetworkStream::connect(("localhost", SMTP_PORT), None, None)?;
//! let mut client = SmtpConnection::from_stream(stream, None, &ClientId::default())?;
//! client.mail("user@example.com")?;
//! client.rcpt("user@example.org")?;
//! client.data()?;
//! client.write_data(b"Subject: test\r\n\r\nTest email")?;
//! client.end_data()?;
//! client.quit()?;
//! # Ok(())
//! # }
//! ```

pub use self::{
    connection::SmtpConnection,
    net::NetworkStream,
    tls::{TlsParameters, TlsParametersBuilder},
};

mod connection;
#[cfg(test)]
pub(crate) mod mock;
mod net;
mod tls;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinePosition {
    /// Nothing written yet on the current line
    Start,
    /// Inside a line
    Middle,
    /// Right after a `\r`
    CarriageReturn,
}

/// The codec used for transparency
///
/// Doubles every `.` found at the start of a line
/// ([RFC 5321, section 4.5.2](https://tools.ietf.org/html/rfc5321#section-4.5.2)),
/// keeping its state between chunks.
#[derive(Debug, Clone, Copy)]
pub struct ClientCodec {
    position: LinePosition,
}

impl Default for ClientCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientCodec {
    /// Creates a new client codec, positioned at the start of a line
    pub fn new() -> Self {
        ClientCodec {
            position: LinePosition::Start,
        }
    }

    /// Adds transparency
    pub fn encode(&mut self, frame: &[u8], buf: &mut Vec<u8>) {
        let mut start = 0;
        for (idx, &byte) in frame.iter().enumerate() {
            if byte == b'.' && self.position == LinePosition::Start {
                buf.extend_from_slice(&frame[start..idx]);
                buf.push(b'.');
                start = idx;
            }
            self.position = match (self.position, byte) {
                (_, b'\r') => LinePosition::CarriageReturn,
                (LinePosition::CarriageReturn, b'\n') => LinePosition::Start,
                _ => LinePosition::Middle,
            };
        }
        buf.extend_from_slice(&frame[start..]);
    }

    /// Writes the end of data marker, completing the current line first
    pub fn finish(&mut self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(match self.position {
            LinePosition::Start => b".\r\n",
            LinePosition::CarriageReturn => b"\n.\r\n",
            LinePosition::Middle => b"\r\n.\r\n",
        });
        self.position = LinePosition::Start;
    }
}

/// Returns the string replacing all the CRLF with "\<CRLF\>"
///
/// Used for debug displays
fn escape_crlf(string: &str) -> String {
    string.replace("\r\n", "<CRLF>")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_codec() {
        let mut codec = ClientCodec::new();
        let mut buf: Vec<u8> = vec![];

        codec.encode(b"test\r\n", &mut buf);
        codec.encode(b".\r\n", &mut buf);
        codec.encode(b"\r\ntest", &mut buf);
        codec.encode(b"te\r\n.\r\nst", &mut buf);
        codec.encode(b"test", &mut buf);
        codec.encode(b"test.", &mut buf);
        codec.encode(b"test\n", &mut buf);
        codec.encode(b".test\n", &mut buf);
        codec.encode(b"test", &mut buf);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "test\r\n..\r\n\r\ntestte\r\n..\r\nsttesttest.test\n.test\ntest"
        );
    }

    #[test]
    fn test_codec_leading_dot_and_blank_lines() {
        let mut codec = ClientCodec::new();
        let mut buf: Vec<u8> = vec![];

        codec.encode(b".hidden\r\n\r\n.also\r", &mut buf);
        codec.encode(b"\n.", &mut buf);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "..hidden\r\n\r\n..also\r\n.."
        );
    }

    #[test]
    fn test_codec_finish() {
        let mut buf: Vec<u8> = vec![];
        ClientCodec::new().finish(&mut buf);
        assert_eq!(buf, b".\r\n");

        let mut codec = ClientCodec::new();
        let mut buf: Vec<u8> = vec![];
        codec.encode(b"body\r\n", &mut buf);
        codec.finish(&mut buf);
        assert_eq!(buf, b"body\r\n.\r\n");

        let mut codec = ClientCodec::new();
        let mut buf: Vec<u8> = vec![];
        codec.encode(b"body", &mut buf);
        codec.finish(&mut buf);
        assert_eq!(buf, b"body\r\n.\r\n");
    }

    #[test]
    fn test_escape_crlf() {
        assert_eq!(escape_crlf("\r\n"), "<CRLF>");
        assert_eq!(escape_crlf("EHLO my_name\r\n"), "EHLO my_name<CRLF>");
        assert_eq!(
            escape_crlf("EHLO my_name\r\nSIZE 42\r\n"),
            "EHLO my_name<CRLF>SIZE 42<CRLF>"
        );
    }
}
