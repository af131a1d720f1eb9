use std::{
    fmt::Display,
    io::{self, BufRead, BufReader, Write},
    net::Shutdown,
    time::Duration,
};

use super::{escape_crlf, ClientCodec, NetworkStream, TlsParameters};
use crate::transport::smtp::{
    authentication::{Credentials, Mechanism},
    commands::{Auth, Data, Ehlo, Helo, Mail, Quit, Rcpt, Starttls},
    error::{self, Error},
    extension::{ClientId, Extension, MailBodyParameter, MailParameter, ServerInfo},
    response::{parse_response, Response},
};

/// Structure that implements the SMTP client
pub struct SmtpConnection {
    /// TCP stream between client and server
    stream: BufReader<NetworkStream>,
    /// Whether QUIT has been sent
    sent_quit: bool,
    /// Set once a read or write failed, or a reply could not be parsed
    broken: bool,
    /// Information about the server
    server_info: ServerInfo,
    /// Transparency state, only present between `DATA` and the end of data
    data: Option<ClientCodec>,
}

impl SmtpConnection {
    /// Get information about the server
    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Starts an SMTP session over an already opened stream
    ///
    /// Reads the greeting, sends EHLO and parses server information
    pub fn from_stream(
        stream: NetworkStream,
        timeout: Option<Duration>,
        hello_name: &ClientId,
    ) -> Result<SmtpConnection, Error> {
        let mut conn = SmtpConnection {
            stream: BufReader::new(stream),
            sent_quit: false,
            broken: false,
            server_info: ServerInfo::default(),
            data: None,
        };
        conn.set_timeout(timeout).map_err(error::network)?;
        let greeting = conn.read_response()?;
        tracing::debug!("greeting: {}", greeting.first_line().unwrap_or_default());

        conn.ehlo(hello_name)?;

        tracing::debug!("server {}", conn.server_info);
        Ok(conn)
    }

    /// Whether the session is over, after QUIT or a failed exchange
    pub fn has_broken(&self) -> bool {
        self.sent_quit || self.broken
    }

    pub fn can_starttls(&self) -> bool {
        !self.is_encrypted() && self.server_info.supports_feature(Extension::StartTls)
    }

    /// Upgrades the connection with STARTTLS, then sends EHLO again
    pub fn starttls(
        &mut self,
        tls_parameters: &TlsParameters,
        hello_name: &ClientId,
    ) -> Result<(), Error> {
        if !self.server_info.supports_feature(Extension::StartTls) {
            return Err(error::client("STARTTLS is not supported on this server"));
        }

        self.command(Starttls)?;
        if let Err(err) = self.stream.get_mut().upgrade_tls(tls_parameters) {
            self.broken = true;
            return Err(err);
        }
        tracing::debug!("connection encrypted");
        self.ehlo(hello_name)
    }

    /// Send EHLO and update server info, falling back to HELO when the
    /// server rejects EHLO
    fn ehlo(&mut self, hello_name: &ClientId) -> Result<(), Error> {
        let response = match self.command(Ehlo::new(hello_name.clone())) {
            Ok(response) => response,
            Err(err) if err.is_permanent() => {
                tracing::debug!("EHLO rejected ({err}), trying HELO");
                self.command(Helo::new(hello_name.clone()))?
            }
            Err(err) => return Err(err),
        };
        self.server_info = ServerInfo::from_response(&response)?;
        Ok(())
    }

    /// Sends an AUTH command with the first mechanism of `mechanisms` the
    /// server supports, and answers the challenges
    pub fn auth(
        &mut self,
        mechanisms: &[Mechanism],
        credentials: &Credentials,
    ) -> Result<Response, Error> {
        let mechanism = self
            .server_info
            .get_auth_mechanism(mechanisms)
            .ok_or_else(|| error::client("No compatible authentication mechanism was found"))?;

        // Limit challenges to avoid blocking
        let mut challenges = 10;
        let mut response = self.command(Auth::new(mechanism, credentials)?)?;

        while challenges > 0 && response.has_code(334) {
            challenges -= 1;
            response = self.command(Auth::new_from_response(mechanism, credentials, &response)?)?;
        }

        if response.has_code(334) {
            Err(error::response("Unexpected number of challenges"))
        } else {
            Ok(response)
        }
    }

    /// Declares the envelope sender
    ///
    /// `BODY=8BITMIME` is added whenever the server offers it, `SMTPUTF8` when
    /// the address needs it.
    pub fn mail(&mut self, from: &str) -> Result<Response, Error> {
        let mut parameters = vec![];

        if self.server_info.supports_feature(Extension::EightBitMime) {
            parameters.push(MailParameter::Body(MailBodyParameter::EightBitMime));
        }
        if !from.is_ascii() {
            if !self.server_info.supports_feature(Extension::SmtpUtfEight) {
                return Err(error::client(
                    "Sender contains non-ascii chars but server does not support SMTPUTF8",
                ));
            }
            parameters.push(MailParameter::SmtpUtfEight);
        }

        let sender = (!from.is_empty()).then(|| from.to_owned());
        self.command(Mail::new(sender, parameters))
    }

    /// Declares one recipient
    pub fn rcpt(&mut self, to: &str) -> Result<Response, Error> {
        self.command(Rcpt::new(to.to_owned()))
    }

    /// Sends DATA; the message is then written with `write_data` and
    /// completed with `end_data`
    pub fn data(&mut self) -> Result<Response, Error> {
        let response = self.command(Data)?;
        self.data = Some(ClientCodec::new());
        Ok(response)
    }

    /// Writes a chunk of the message, adding transparency
    pub fn write_data(&mut self, chunk: &[u8]) -> Result<(), Error> {
        let codec = self
            .data
            .as_mut()
            .ok_or_else(|| error::client("DATA has not been accepted"))?;
        let mut out_buf = Vec::with_capacity(chunk.len());
        codec.encode(chunk, &mut out_buf);
        self.write(&out_buf)
    }

    /// Writes the end of data marker and reads the server verdict
    pub fn end_data(&mut self) -> Result<Response, Error> {
        let mut codec = self
            .data
            .take()
            .ok_or_else(|| error::client("DATA has not been accepted"))?;
        let mut out_buf = Vec::with_capacity(5);
        codec.finish(&mut out_buf);
        self.write(&out_buf)?;
        self.read_response()
    }

    pub fn quit(&mut self) -> Result<Response, Error> {
        self.sent_quit = true;
        self.command(Quit)
    }

    /// Closes the underlying socket, without sending QUIT
    pub fn close(&mut self) {
        if !self.has_broken() {
            tracing::debug!("closing without QUIT");
        }
        self.data = None;
        if let Err(err) = self.stream.get_ref().shutdown(Shutdown::Both) {
            tracing::trace!("shutdown failed: {err}");
        }
    }

    /// Tells if the underlying stream is currently encrypted
    pub fn is_encrypted(&self) -> bool {
        self.stream.get_ref().is_encrypted()
    }

    /// Set timeout
    pub fn set_timeout(&mut self, duration: Option<Duration>) -> io::Result<()> {
        self.stream.get_mut().set_read_timeout(duration)?;
        self.stream.get_mut().set_write_timeout(duration)
    }

    /// Sends an SMTP command
    pub fn command<C: Display>(&mut self, command: C) -> Result<Response, Error> {
        self.write(command.to_string().as_bytes())?;
        self.read_response()
    }

    /// Writes a string to the server
    fn write(&mut self, string: &[u8]) -> Result<(), Error> {
        let stream = self.stream.get_mut();
        if let Err(err) = stream.write_all(string).and_then(|()| stream.flush()) {
            self.broken = true;
            return Err(error::network(err));
        }

        tracing::debug!("Wrote: {}", escape_crlf(&String::from_utf8_lossy(string)));
        Ok(())
    }

    /// Gets the SMTP response
    pub fn read_response(&mut self) -> Result<Response, Error> {
        let mut buffer = String::with_capacity(100);

        loop {
            let read = match self.stream.read_line(&mut buffer) {
                Ok(read) => read,
                Err(err) => {
                    self.broken = true;
                    return Err(error::network(err));
                }
            };
            if read == 0 {
                break;
            }

            tracing::debug!("<< {}", escape_crlf(&buffer));
            match parse_response(&buffer) {
                Ok((_remaining, response)) => {
                    return if response.is_positive() {
                        Ok(response)
                    } else {
                        Err(error::code(
                            response.code(),
                            Some(response.message().collect::<Vec<_>>().join(" ")),
                        ))
                    };
                }
                Err(nom::Err::Incomplete(_)) => { /* read more */ }
                Err(nom::Err::Failure(e)) | Err(nom::Err::Error(e)) => {
                    self.broken = true;
                    return Err(error::response(e.to_string()));
                }
            }
        }

        self.broken = true;
        Err(error::response("incomplete response"))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::transport::smtp::client::mock::MockStream;

    const GREETING: &str = "220 mx.example.com ESMTP\r\n";

    fn connect(mock: &MockStream) -> Result<SmtpConnection, Error> {
        SmtpConnection::from_stream(
            NetworkStream::mock(mock.clone()),
            None,
            &ClientId::Domain("client.example.com".to_owned()),
        )
    }

    #[test]
    fn test_session() {
        let mock = MockStream::with_replies(&[
            GREETING,
            "250-mx.example.com\r\n250-8BITMIME\r\n250 AUTH LOGIN PLAIN\r\n",
            "235 2.7.0 Authentication successful\r\n",
            "250 2.1.0 Ok\r\n",
            "250 2.1.5 Ok\r\n",
            "354 End data with <CR><LF>.<CR><LF>\r\n",
            "250 2.0.0 Ok: queued\r\n",
            "221 2.0.0 Bye\r\n",
        ]);
        let mut conn = connect(&mock).unwrap();
        assert_eq!(conn.server_info().name(), "mx.example.com");

        let credentials = Credentials::new("user".to_owned(), "password".to_owned());
        conn.auth(&[Mechanism::Plain, Mechanism::Login], &credentials)
            .unwrap();
        conn.mail("user@example.com").unwrap();
        conn.rcpt("root@example.org").unwrap();
        conn.data().unwrap();
        conn.write_data(b"Subject: hi\r\n\r\n.dot\r\n").unwrap();
        conn.end_data().unwrap();
        assert!(conn.quit().unwrap().has_code(221));
        assert!(conn.has_broken());

        assert_eq!(
            mock.written(),
            "EHLO client.example.com\r\n\
             AUTH PLAIN AHVzZXIAcGFzc3dvcmQ=\r\n\
             MAIL FROM:<user@example.com> BODY=8BITMIME\r\n\
             RCPT TO:<root@example.org>\r\n\
             DATA\r\n\
             Subject: hi\r\n\r\n..dot\r\n.\r\n\
             QUIT\r\n"
        );
    }

    #[test]
    fn test_helo_fallback() {
        let mock = MockStream::with_replies(&[
            GREETING,
            "502 5.5.2 Command not recognized\r\n",
            "250 mx.example.com\r\n",
        ]);
        let conn = connect(&mock).unwrap();

        assert_eq!(conn.server_info().name(), "mx.example.com");
        assert!(!conn.server_info().supports_auth());
        assert_eq!(
            mock.written(),
            "EHLO client.example.com\r\nHELO client.example.com\r\n"
        );
    }

    #[test]
    fn test_login_challenges() {
        let mock = MockStream::with_replies(&[
            GREETING,
            "250-mx.example.com\r\n250 AUTH LOGIN\r\n",
            "334 VXNlcm5hbWU6\r\n",
            "334 UGFzc3dvcmQ6\r\n",
            "235 ok\r\n",
        ]);
        let mut conn = connect(&mock).unwrap();

        let credentials = Credentials::new("user".to_owned(), "password".to_owned());
        conn.auth(&[Mechanism::Plain, Mechanism::Login], &credentials)
            .unwrap();
        assert_eq!(
            mock.written(),
            "EHLO client.example.com\r\nAUTH LOGIN\r\ndXNlcg==\r\ncGFzc3dvcmQ=\r\n"
        );
    }

    fn login_session(challenges: usize) -> (MockStream, Result<Response, Error>) {
        let mut replies = vec![GREETING, "250-mx.example.com\r\n250 AUTH LOGIN\r\n"];
        replies.extend(std::iter::repeat("334 UGFzc3dvcmQ6\r\n").take(challenges));
        replies.push("235 ok\r\n");
        let mock = MockStream::with_replies(&replies);
        let mut conn = connect(&mock).unwrap();

        let credentials = Credentials::new("user".to_owned(), "password".to_owned());
        let result = conn.auth(&[Mechanism::Login], &credentials);
        (mock, result)
    }

    #[test]
    fn test_login_ten_challenges() {
        let (mock, result) = login_session(10);

        assert!(result.unwrap().has_code(235));
        assert_eq!(mock.written().matches("cGFzc3dvcmQ=\r\n").count(), 10);
    }

    #[test]
    fn test_login_too_many_challenges() {
        let (mock, result) = login_session(11);

        assert!(result.unwrap_err().is_response());
        assert_eq!(mock.written().matches("cGFzc3dvcmQ=\r\n").count(), 10);
    }

    #[test]
    fn test_negative_reply() {
        let mock = MockStream::with_replies(&[
            GREETING,
            "250 mx.example.com\r\n",
            "550-5.1.1 No such\r\n550 5.1.1 user\r\n",
        ]);
        let mut conn = connect(&mock).unwrap();

        let err = conn.rcpt("nobody@example.org").unwrap_err();
        assert!(err.is_permanent());
        assert_eq!(err.status().map(u16::from), Some(550));
        assert_eq!(err.to_string(), "permanent error (550): 5.1.1 No such 5.1.1 user");
        assert!(!conn.has_broken());
    }

    #[test]
    fn test_truncated_reply() {
        let mock = MockStream::with_replies(&[GREETING, "250-mx.example.com\r\n"]);
        let err = connect(&mock).err().unwrap();
        assert!(err.is_response());
    }

    #[test]
    fn test_write_data_requires_data() {
        let mock = MockStream::with_replies(&[GREETING, "250 mx.example.com\r\n"]);
        let mut conn = connect(&mock).unwrap();

        assert!(conn.write_data(b"body").unwrap_err().is_client());
        assert!(conn.end_data().unwrap_err().is_client());
    }

    #[test]
    fn test_starttls_not_offered() {
        let mock = MockStream::with_replies(&[GREETING, "250 mx.example.com\r\n"]);
        let mut conn = connect(&mock).unwrap();

        assert!(!conn.can_starttls());
        let tls = super::super::TlsParametersBuilder::new("mx.example.com".to_owned());
        if let Ok(tls) = tls.build() {
            assert!(conn
                .starttls(&tls, &ClientId::Domain("client".to_owned()))
                .unwrap_err()
                .is_client());
        }
    }
}
