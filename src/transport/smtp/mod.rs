//! The SMTP transport sends emails using the SMTP protocol.
//!
//! This SMTP client follows [RFC 5321](https://tools.ietf.org/html/rfc5321),
//! and is designed to efficiently send a single message per connection.
//!
//! It implements the following extensions:
//!
//! * 8BITMIME ([RFC 6152](https://tools.ietf.org/html/rfc6152))
//! * AUTH ([RFC 4954](https://tools.ietf.org/html/rfc4954)) with PLAIN and LOGIN mechanisms
//! * STARTTLS ([RFC 2487](https://tools.ietf.org/html/rfc2487))
//! * SMTPUTF8 ([RFC 6531](https://tools.ietf.org/html/rfc6531))
//!
//! [`send_mail`] runs a whole transaction in one call: connect, EHLO,
//! STARTTLS when offered, AUTH, MAIL, RCPT, DATA and QUIT.

use std::{net::IpAddr, time::Duration};

pub use self::error::Error;
use self::{
    authentication::{Credentials, DEFAULT_MECHANISMS},
    client::{NetworkStream, SmtpConnection, TlsParameters},
    extension::ClientId,
    response::Response,
};
use crate::transport::{Connector, Session};

pub mod authentication;
pub mod client;
pub mod commands;
pub(crate) mod error;
pub mod extension;
pub mod response;

/// Default smtp port
pub const SMTP_PORT: u16 = 25;
/// Default submission port
pub const SUBMISSION_PORT: u16 = 587;
/// Default submission over TLS port
///
/// Defined in [RFC8314](https://tools.ietf.org/html/rfc8314)
pub const SUBMISSIONS_PORT: u16 = 465;

/// Where and how to reach an SMTP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    /// Server host name, also used as TLS domain
    pub host: String,
    /// Server port
    pub port: u16,
    /// Read, write and connect timeout, none by default
    pub timeout: Option<Duration>,
    /// Name sent with EHLO
    pub hello_name: ClientId,
}

impl Relay {
    /// Whether `host` names this machine
    fn is_loopback(&self) -> bool {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        host.eq_ignore_ascii_case("localhost")
            || host
                .parse::<IpAddr>()
                .is_ok_and(|address| address.is_loopback())
    }
}

/// Connects to real servers over TCP, with `native-tls` for encryption
#[derive(Debug, Default, Clone, Copy)]
pub struct SmtpConnector;

impl Connector for SmtpConnector {
    type Stream = NetworkStream;
    type Session = SmtpConnection;

    fn dial(
        &self,
        host: &str,
        port: u16,
        timeout: Option<Duration>,
        tls_parameters: Option<&TlsParameters>,
    ) -> Result<NetworkStream, Error> {
        tracing::debug!(
            "connecting to {host}:{port}{}",
            if tls_parameters.is_some() { " over TLS" } else { "" }
        );
        NetworkStream::connect((host, port), timeout, tls_parameters)
    }

    fn open_session(
        &self,
        stream: NetworkStream,
        timeout: Option<Duration>,
        hello_name: &ClientId,
    ) -> Result<SmtpConnection, Error> {
        SmtpConnection::from_stream(stream, timeout, hello_name)
    }
}

impl Session for SmtpConnection {
    fn supports_auth(&self) -> bool {
        self.server_info().supports_auth()
    }

    fn supports_starttls(&self) -> bool {
        self.can_starttls()
    }

    fn is_encrypted(&self) -> bool {
        SmtpConnection::is_encrypted(self)
    }

    fn starttls(
        &mut self,
        tls_parameters: &TlsParameters,
        hello_name: &ClientId,
    ) -> Result<(), Error> {
        SmtpConnection::starttls(self, tls_parameters, hello_name)
    }

    fn authenticate(&mut self, credentials: &Credentials) -> Result<Response, Error> {
        self.auth(DEFAULT_MECHANISMS, credentials)
    }

    fn set_sender(&mut self, from: &str) -> Result<Response, Error> {
        self.mail(from)
    }

    fn add_recipient(&mut self, to: &str) -> Result<Response, Error> {
        self.rcpt(to)
    }

    fn open_data_stream(&mut self) -> Result<Response, Error> {
        self.data()
    }

    fn write_data(&mut self, chunk: &[u8]) -> Result<(), Error> {
        SmtpConnection::write_data(self, chunk)
    }

    fn close_data_stream(&mut self) -> Result<Response, Error> {
        self.end_data()
    }

    fn quit(&mut self) -> Result<Response, Error> {
        SmtpConnection::quit(self)
    }

    fn close(&mut self) {
        SmtpConnection::close(self)
    }
}

/// Sends `payload` from `from` to every address of `to` in one plain
/// connection
///
/// The connection is upgraded with STARTTLS when the server offers it and
/// `starttls` is given. When `credentials` are given the server must
/// advertise `AUTH`, and the connection must be encrypted unless the relay is
/// on this machine. The first failing step aborts the transaction; the
/// connection is closed on every path. Returns the server reply to the
/// message content.
pub fn send_mail<C: Connector>(
    connector: &C,
    relay: &Relay,
    starttls: Option<&TlsParameters>,
    credentials: Option<&Credentials>,
    from: &str,
    to: &[String],
    payload: &[u8],
) -> Result<Response, Error> {
    let stream = connector.dial(&relay.host, relay.port, relay.timeout, None)?;
    let mut session = connector.open_session(stream, relay.timeout, &relay.hello_name)?;

    let result = transaction(&mut session, relay, starttls, credentials, from, to, payload);
    session.close();
    result
}

fn transaction<S: Session>(
    session: &mut S,
    relay: &Relay,
    starttls: Option<&TlsParameters>,
    credentials: Option<&Credentials>,
    from: &str,
    to: &[String],
    payload: &[u8],
) -> Result<Response, Error> {
    if let Some(tls_parameters) = starttls {
        if session.supports_starttls() {
            session.starttls(tls_parameters, &relay.hello_name)?;
        }
    }

    if let Some(credentials) = credentials {
        if !session.supports_auth() {
            return Err(error::client("server doesn't support AUTH"));
        }
        if !session.is_encrypted() && !relay.is_loopback() {
            return Err(error::client("unencrypted connection"));
        }
        session.authenticate(credentials)?;
    }

    session.set_sender(from)?;
    for recipient in to {
        session.add_recipient(recipient)?;
    }

    session.open_data_stream()?;
    session.write_data(payload)?;
    let response = session.close_data_stream()?;

    session.quit()?;
    Ok(response)
}
