//! SMTP commands

use std::fmt::{self, Display, Formatter};

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::transport::smtp::{
    authentication::{Credentials, Mechanism},
    error::{self, Error},
    extension::{ClientId, MailParameter},
    response::Response,
};

/// EHLO command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Ehlo {
    client_id: ClientId,
}

impl Display for Ehlo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "EHLO {}\r\n", self.client_id)
    }
}

impl Ehlo {
    /// Creates a EHLO command
    pub fn new(client_id: ClientId) -> Ehlo {
        Ehlo { client_id }
    }
}

/// HELO command, for servers that reject `EHLO`
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Helo {
    client_id: ClientId,
}

impl Display for Helo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "HELO {}\r\n", self.client_id)
    }
}

impl Helo {
    /// Creates a HELO command
    pub fn new(client_id: ClientId) -> Helo {
        Helo { client_id }
    }
}

/// STARTTLS command
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub struct Starttls;

impl Display for Starttls {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("STARTTLS\r\n")
    }
}

/// MAIL command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Mail {
    sender: Option<String>,
    parameters: Vec<MailParameter>,
}

impl Display for Mail {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MAIL FROM:<{}>", self.sender.as_deref().unwrap_or(""))?;
        for parameter in &self.parameters {
            write!(f, " {parameter}")?;
        }
        f.write_str("\r\n")
    }
}

impl Mail {
    /// Creates a MAIL command, `None` being the null reverse-path
    pub fn new(sender: Option<String>, parameters: Vec<MailParameter>) -> Mail {
        Mail { sender, parameters }
    }
}

/// RCPT command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Rcpt {
    recipient: String,
}

impl Display for Rcpt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "RCPT TO:<{}>\r\n", self.recipient)
    }
}

impl Rcpt {
    /// Creates an RCPT command
    pub fn new(recipient: String) -> Rcpt {
        Rcpt { recipient }
    }
}

/// DATA command
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub struct Data;

impl Display for Data {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("DATA\r\n")
    }
}

/// QUIT command
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub struct Quit;

impl Display for Quit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("QUIT\r\n")
    }
}

/// AUTH command, or the answer to an `AUTH` challenge
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Auth {
    mechanism: Mechanism,
    response: Option<String>,
}

impl Display for Auth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let encoded_response = self.response.as_ref().map(|r| STANDARD.encode(r));

        match (self.mechanism.supports_initial_response(), encoded_response) {
            (true, Some(response)) => write!(f, "AUTH {} {}", self.mechanism, response)?,
            (false, Some(response)) => f.write_str(&response)?,
            (_, None) => write!(f, "AUTH {}", self.mechanism)?,
        }
        f.write_str("\r\n")
    }
}

impl Auth {
    /// Creates the initial AUTH command for `mechanism`
    pub fn new(mechanism: Mechanism, credentials: &Credentials) -> Result<Auth, Error> {
        let response = if mechanism.supports_initial_response() {
            Some(mechanism.response(credentials, None)?)
        } else {
            None
        };
        Ok(Auth {
            mechanism,
            response,
        })
    }

    /// Answers a server challenge, which needs to be a 334 reply carrying a
    /// base64 encoded text
    pub fn new_from_response(
        mechanism: Mechanism,
        credentials: &Credentials,
        response: &Response,
    ) -> Result<Auth, Error> {
        if !response.has_code(334) {
            return Err(error::response("Expecting a challenge"));
        }

        let encoded_challenge = response
            .first_word()
            .ok_or_else(|| error::response("Could not read auth challenge"))?;
        tracing::debug!("auth encoded challenge: {encoded_challenge}");

        let decoded_challenge = STANDARD
            .decode(encoded_challenge)
            .map_err(error::response)
            .and_then(|bytes| String::from_utf8(bytes).map_err(error::response))?;
        tracing::debug!("auth decoded challenge: {decoded_challenge}");

        Ok(Auth {
            mechanism,
            response: Some(mechanism.response(credentials, Some(&decoded_challenge))?),
        })
    }
}
