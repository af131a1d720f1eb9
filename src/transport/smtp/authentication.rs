//! SASL mechanisms used for `AUTH`

use std::fmt::{self, Debug, Display, Formatter};

use crate::transport::smtp::error::{self, Error};

/// Mechanisms tried in order, PLAIN first
///
/// LOGIN is kept for servers that do not offer PLAIN.
pub const DEFAULT_MECHANISMS: &[Mechanism] = &[Mechanism::Plain, Mechanism::Login];

/// Contains user credentials
#[derive(PartialEq, Eq, Clone, Hash)]
pub struct Credentials {
    authentication_identity: String,
    secret: String,
}

impl Credentials {
    /// Create a `Credentials` struct from username and password
    pub fn new(username: String, password: String) -> Credentials {
        Credentials {
            authentication_identity: username,
            secret: password,
        }
    }

    /// The identity used to authenticate
    pub fn username(&self) -> &str {
        &self.authentication_identity
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.authentication_identity)
            .finish_non_exhaustive()
    }
}

/// Represents authentication mechanisms
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub enum Mechanism {
    /// PLAIN authentication mechanism, defined in
    /// [RFC 4616](https://tools.ietf.org/html/rfc4616)
    Plain,
    /// LOGIN authentication mechanism
    ///
    /// Defined in [draft-murchison-sasl-login-00](https://www.ietf.org/archive/id/draft-murchison-sasl-login-00.txt).
    Login,
}

impl Display for Mechanism {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Mechanism::Plain => "PLAIN",
            Mechanism::Login => "LOGIN",
        })
    }
}

impl Mechanism {
    /// Does the mechanism send its response along with the `AUTH` command
    pub fn supports_initial_response(self) -> bool {
        match self {
            Mechanism::Plain => true,
            Mechanism::Login => false,
        }
    }

    /// Returns the clear text to send to the server, answering `challenge` if the
    /// mechanism expects one
    pub fn response(
        self,
        credentials: &Credentials,
        challenge: Option<&str>,
    ) -> Result<String, Error> {
        match (self, challenge) {
            (Mechanism::Plain, None) => Ok(format!(
                "\u{0}{}\u{0}{}",
                credentials.authentication_identity, credentials.secret
            )),
            (Mechanism::Plain, Some(_)) => {
                Err(error::client("PLAIN does not expect a challenge"))
            }
            (Mechanism::Login, None) => Err(error::client("LOGIN expects a challenge")),
            (Mechanism::Login, Some(challenge)) => {
                match challenge.trim_end_matches(':').to_ascii_lowercase().as_str() {
                    "user name" | "username" => Ok(credentials.authentication_identity.clone()),
                    "password" => Ok(credentials.secret.clone()),
                    _ => Err(error::client(format!(
                        "unrecognized LOGIN challenge {challenge:?}"
                    ))),
                }
            }
        }
    }
}
