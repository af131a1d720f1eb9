//! The message handed to [`MailSender::send`](crate::MailSender::send)
//!
//! A [`Message`] is a subject, an ordered list of recipients and a body, plain
//! text or HTML. It is formatted as a header block, an empty line and the
//! body:
//!
//! ```rust
//! use mailsender::Message;
//!
//! let message = Message::new("Hi", vec!["b@example.com".to_owned()], "Hello");
//! assert_eq!(
//!     message.formatted("a@example.com"),
//!     b"To: b@example.com\r\n\
//!       From: a@example.com\r\n\
//!       Subject: Hi\r\n\
//!       Content-Type: text/plain; charset=UTF-8\r\n\
//!       \r\n\
//!       Hello"
//! );
//! ```

use serde::{Deserialize, Serialize};

pub mod header;

use self::header::{ContentType, Headers};

/// An email to send
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// `Subject` header, written verbatim
    #[serde(default)]
    pub subject: String,
    /// Recipients, in order; all of them get the same message
    #[serde(rename = "to", default)]
    pub recipients: Vec<String>,
    /// Body, written after the headers
    #[serde(rename = "content", default)]
    pub body: String,
    /// Whether the body is HTML rather than plain text
    #[serde(default)]
    pub is_html: bool,
}

impl Message {
    /// Creates a plain text message
    pub fn new<S, B>(subject: S, recipients: Vec<String>, body: B) -> Self
    where
        S: Into<String>,
        B: Into<String>,
    {
        Message {
            subject: subject.into(),
            recipients,
            body: body.into(),
            is_html: false,
        }
    }

    /// Marks the body as HTML
    pub fn html(mut self, is_html: bool) -> Self {
        self.is_html = is_html;
        self
    }

    /// Type of the body
    pub fn content_type(&self) -> ContentType {
        ContentType::for_body(self.is_html)
    }

    /// The header block, `To`, `From`, `Subject` and `Content-Type` in that
    /// order
    pub fn headers(&self, from: &str) -> Headers {
        let mut headers = Headers::with_capacity(4);
        headers.set_raw("To", self.recipients.join(","));
        headers.set_raw("From", from.to_owned());
        headers.set_raw("Subject", self.subject.clone());
        headers.set_raw(ContentType::NAME, self.content_type().to_string());
        headers
    }

    /// Get message content formatted for SMTP
    pub fn formatted(&self, from: &str) -> Vec<u8> {
        let headers = self.headers(from).to_string();
        let mut out = Vec::with_capacity(headers.len() + 2 + self.body.len());
        out.extend_from_slice(headers.as_bytes());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(self.body.as_bytes());
        out
    }
}
