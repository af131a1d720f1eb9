//! Server settings for a [`MailSender`](crate::MailSender)

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::transport::smtp::{extension::ClientId, SMTP_PORT};

/// How to reach and log into the SMTP server
///
/// Usually deserialized from a JSON or form payload:
///
/// ```rust
/// use mailsender::ServerConfig;
///
/// let config: ServerConfig = serde_json::from_str(
///     r#"{"host": "smtp.example.com", "username": "a@example.com", "password": "p", "is_ssl": true}"#,
/// )
/// .unwrap();
/// assert_eq!(config.effective_port(), 25);
/// assert!(config.use_tls);
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host name, also used as TLS domain
    pub host: String,
    /// Server port, `0` means [`SMTP_PORT`]
    #[serde(default)]
    pub port: u16,
    /// Login, also used as envelope sender and `From` header.
    /// No authentication is attempted when empty.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Wrap the whole connection in TLS instead of speaking plain SMTP
    #[serde(rename = "is_ssl", alias = "use_tls", default)]
    pub use_tls: bool,
    /// Skip certificate and hostname verification
    #[serde(default)]
    pub allow_insecure_tls: bool,
    /// Name sent with `EHLO`, the local host name when missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hello_name: Option<String>,
    /// Connect, read and write timeout, written in (fractional) seconds.
    /// Missing or zero means no timeout.
    #[serde(
        default,
        with = "timeout_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
}

impl ServerConfig {
    /// Settings for `host` on the default port, plain SMTP, no login
    pub fn new<T: Into<String>>(host: T) -> Self {
        ServerConfig {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Set the port to use
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the login
    pub fn credentials<U: Into<String>, P: Into<String>>(
        mut self,
        username: U,
        password: P,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Use implicit TLS
    pub fn use_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Accept any certificate from the server
    ///
    /// # Warning
    ///
    /// The connection is then open to man-in-the-middle attacks.
    pub fn dangerous_allow_insecure_tls(mut self, allow_insecure_tls: bool) -> Self {
        self.allow_insecure_tls = allow_insecure_tls;
        self
    }

    /// Set the name sent with `EHLO`
    pub fn hello_name<T: Into<String>>(mut self, hello_name: T) -> Self {
        self.hello_name = Some(hello_name.into());
        self
    }

    /// Set the timeout, `Duration::ZERO` disables it
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// The port actually dialed
    pub fn effective_port(&self) -> u16 {
        match self.port {
            0 => SMTP_PORT,
            port => port,
        }
    }

    pub(crate) fn client_id(&self) -> ClientId {
        self.hello_name
            .as_ref()
            .map(|name| ClientId::Domain(name.clone()))
            .unwrap_or_default()
    }

    pub(crate) fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.filter(|t| !t.is_zero())
    }
}

mod timeout_seconds {
    use std::time::Duration;

    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(timeout: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match timeout {
            Some(timeout) => serializer.serialize_some(&timeout.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<f64>::deserialize(deserializer)? {
            None => Ok(None),
            Some(seconds) => Duration::try_from_secs_f64(seconds)
                .map(|timeout| Some(timeout).filter(|t| !t.is_zero()))
                .map_err(D::Error::custom),
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("use_tls", &self.use_tls)
            .field("allow_insecure_tls", &self.allow_insecure_tls)
            .field("hello_name", &self.hello_name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::ServerConfig;
    use crate::transport::smtp::{extension::ClientId, SUBMISSION_PORT};

    #[test]
    fn test_effective_port() {
        assert_eq!(ServerConfig::new("smtp.example.com").effective_port(), 25);
        assert_eq!(
            ServerConfig::new("smtp.example.com")
                .port(SUBMISSION_PORT)
                .effective_port(),
            587
        );
    }

    #[test]
    fn test_deserialize() {
        let config: ServerConfig = serde_json::from_str(
            r#"{
                "host": "smtp.example.com",
                "port": 465,
                "username": "a@example.com",
                "password": "p",
                "is_ssl": true,
                "allow_insecure_tls": true,
                "hello_name": "client.example.com",
                "timeout": 30
            }"#,
        )
        .unwrap();

        assert_eq!(
            config,
            ServerConfig::new("smtp.example.com")
                .port(465)
                .credentials("a@example.com", "p")
                .use_tls(true)
                .dangerous_allow_insecure_tls(true)
                .hello_name("client.example.com")
                .timeout(Some(Duration::from_secs(30)))
        );
        assert_eq!(
            config.client_id(),
            ClientId::Domain("client.example.com".to_owned())
        );
        assert_eq!(config.timeout_duration(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_subsecond_timeout() {
        let config = ServerConfig::new("localhost").timeout(Some(Duration::from_millis(500)));
        assert_eq!(config.timeout_duration(), Some(Duration::from_millis(500)));

        let config: ServerConfig =
            serde_json::from_str(r#"{"host": "localhost", "timeout": 0.25}"#).unwrap();
        assert_eq!(config.timeout_duration(), Some(Duration::from_millis(250)));
        assert_eq!(
            serde_json::to_value(&config).unwrap()["timeout"],
            serde_json::json!(0.25)
        );
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"host": "localhost", "timeout": 0}"#).unwrap();
        assert_eq!(config.timeout, None);
        assert_eq!(config.timeout_duration(), None);

        let config = ServerConfig::new("localhost").timeout(Some(Duration::ZERO));
        assert_eq!(config.timeout_duration(), None);

        let mut config = ServerConfig::new("localhost");
        config.timeout = Some(Duration::ZERO);
        assert_eq!(config.timeout_duration(), None);

        assert!(
            serde_json::from_str::<ServerConfig>(r#"{"host": "localhost", "timeout": -1}"#)
                .is_err()
        );
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: ServerConfig = serde_json::from_str(r#"{"host": "localhost"}"#).unwrap();

        assert_eq!(config.port, 0);
        assert_eq!(config.effective_port(), 25);
        assert!(config.username.is_empty());
        assert!(!config.use_tls);
        assert!(!config.allow_insecure_tls);
        assert_eq!(config.timeout_duration(), None);

        let aliased: ServerConfig =
            serde_json::from_str(r#"{"host": "localhost", "use_tls": true}"#).unwrap();
        assert!(aliased.use_tls);
    }

    #[test]
    fn test_debug_hides_password() {
        let config = ServerConfig::new("localhost").credentials("user", "hunter2");
        let debug = format!("{config:?}");

        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }
}
