//! Network capabilities used by the sender
//!
//! A [`Connector`] opens streams and turns them into [`Session`]s, which speak
//! the SMTP command protocol. [`smtp::SmtpConnector`] is the implementation
//! over real TCP (and TLS) sockets; tests substitute their own.

use std::time::Duration;

use self::smtp::{
    authentication::Credentials, client::TlsParameters, extension::ClientId, response::Response,
    Error,
};

pub mod smtp;

/// Something able to reach an SMTP server
pub trait Connector {
    /// An open, possibly encrypted, byte stream
    type Stream;
    /// The SMTP session spoken over a `Stream`
    type Session: Session;

    /// Opens a connection to `host:port`, performing the TLS handshake
    /// when `tls_parameters` is given
    fn dial(
        &self,
        host: &str,
        port: u16,
        timeout: Option<Duration>,
        tls_parameters: Option<&TlsParameters>,
    ) -> Result<Self::Stream, Error>;

    /// Reads the server greeting and introduces the client as `hello_name`
    fn open_session(
        &self,
        stream: Self::Stream,
        timeout: Option<Duration>,
        hello_name: &ClientId,
    ) -> Result<Self::Session, Error>;
}

/// An established SMTP session
///
/// Every method maps to one step of a mail transaction. Negative replies are
/// returned as errors.
pub trait Session {
    /// Whether the server advertised `AUTH`
    fn supports_auth(&self) -> bool;

    /// Whether the session can still be upgraded with STARTTLS
    fn supports_starttls(&self) -> bool;

    /// Whether the underlying stream is encrypted
    fn is_encrypted(&self) -> bool;

    /// Upgrades the session with STARTTLS and greets the server again
    fn starttls(
        &mut self,
        tls_parameters: &TlsParameters,
        hello_name: &ClientId,
    ) -> Result<(), Error>;

    /// Authenticates with the best mechanism both sides support
    fn authenticate(&mut self, credentials: &Credentials) -> Result<Response, Error>;

    /// `MAIL FROM`
    fn set_sender(&mut self, from: &str) -> Result<Response, Error>;

    /// `RCPT TO`
    fn add_recipient(&mut self, to: &str) -> Result<Response, Error>;

    /// `DATA`
    fn open_data_stream(&mut self) -> Result<Response, Error>;

    /// Sends part of the message content
    fn write_data(&mut self, chunk: &[u8]) -> Result<(), Error>;

    /// Ends the message content; the server accepts or refuses the message
    fn close_data_stream(&mut self) -> Result<Response, Error>;

    /// `QUIT`
    fn quit(&mut self) -> Result<Response, Error>;

    /// Releases the connection
    fn close(&mut self);
}
