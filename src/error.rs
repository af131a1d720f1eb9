//! Error type returned by [`MailSender::send`](crate::MailSender::send)

use std::{error::Error as StdError, fmt};

use crate::{
    transport::smtp::{self, response::Code},
    BoxError,
};

/// A failed send, naming the step that failed
///
/// The underlying SMTP error, if any, is available through
/// [`source`](StdError::source).
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Kind {
    /// The message cannot be sent as is
    Envelope,
    /// TCP connection or TLS handshake failed
    TlsDial,
    /// Greeting or EHLO failed on the encrypted connection
    ClientCreation,
    /// The server refused the credentials
    Auth,
    /// The envelope sender was refused
    MailFrom,
    /// A recipient was refused, later recipients were not tried
    Rcpt(String),
    /// `DATA` was refused
    DataOpen,
    /// The message content could not be written
    DataWrite,
    /// The server refused the message content
    DataClose,
    /// `QUIT` failed
    Quit,
    /// Any failure of the plain SMTP transaction
    Transport,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                source: source.map(Into::into),
            }),
        }
    }

    /// Returns true if the message was rejected before any connection
    pub fn is_envelope(&self) -> bool {
        matches!(self.inner.kind, Kind::Envelope)
    }

    /// Returns true if the TLS connection could not be established
    pub fn is_tls_dial(&self) -> bool {
        matches!(self.inner.kind, Kind::TlsDial)
    }

    /// Returns true if the SMTP session could not be started over TLS
    pub fn is_client_creation(&self) -> bool {
        matches!(self.inner.kind, Kind::ClientCreation)
    }

    /// Returns true if authentication failed
    pub fn is_auth(&self) -> bool {
        matches!(self.inner.kind, Kind::Auth)
    }

    /// Returns true if `MAIL FROM` failed
    pub fn is_mail_from(&self) -> bool {
        matches!(self.inner.kind, Kind::MailFrom)
    }

    /// Returns true if a `RCPT TO` failed
    pub fn is_rcpt(&self) -> bool {
        matches!(self.inner.kind, Kind::Rcpt(_))
    }

    /// Returns true if `DATA` failed
    pub fn is_data_open(&self) -> bool {
        matches!(self.inner.kind, Kind::DataOpen)
    }

    /// Returns true if writing the message content failed
    pub fn is_data_write(&self) -> bool {
        matches!(self.inner.kind, Kind::DataWrite)
    }

    /// Returns true if the server refused the message content
    pub fn is_data_close(&self) -> bool {
        matches!(self.inner.kind, Kind::DataClose)
    }

    /// Returns true if `QUIT` failed
    pub fn is_quit(&self) -> bool {
        matches!(self.inner.kind, Kind::Quit)
    }

    /// Returns true if the plain transaction failed
    pub fn is_transport(&self) -> bool {
        matches!(self.inner.kind, Kind::Transport)
    }

    /// The recipient refused by the server, for `RCPT TO` failures
    pub fn recipient(&self) -> Option<&str> {
        match self.inner.kind {
            Kind::Rcpt(ref recipient) => Some(recipient),
            _ => None,
        }
    }

    /// The SMTP error this error wraps, if any
    pub fn smtp(&self) -> Option<&smtp::Error> {
        self.inner
            .source
            .as_ref()
            .and_then(|source| source.downcast_ref::<smtp::Error>())
    }

    /// Returns the status code, if the error was generated from a negative
    /// reply
    pub fn status(&self) -> Option<Code> {
        self.smtp().and_then(smtp::Error::status)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("mailsender::Error");

        builder.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::Envelope => f.write_str("invalid envelope")?,
            Kind::TlsDial => f.write_str("tls dial error")?,
            Kind::ClientCreation => f.write_str("smtp client error")?,
            Kind::Auth => f.write_str("smtp client auth error")?,
            Kind::MailFrom => f.write_str("smtp client mail error")?,
            Kind::Rcpt(ref recipient) => write!(f, "smtp client rcpt error for {recipient}")?,
            Kind::DataOpen => f.write_str("smtp client data error")?,
            Kind::DataWrite => f.write_str("smtp client write body error")?,
            Kind::DataClose => f.write_str("smtp client close body error")?,
            Kind::Quit => f.write_str("smtp client quit error")?,
            Kind::Transport => f.write_str("send error")?,
        };

        if let Some(ref e) = self.inner.source {
            write!(f, ": {e}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| {
            let r: &(dyn std::error::Error + 'static) = &**e;
            r
        })
    }
}

pub(crate) fn envelope<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Envelope, Some(e))
}

pub(crate) fn stage(kind: Kind) -> impl FnOnce(smtp::Error) -> Error {
    move |e| Error::new(kind, Some(e))
}
