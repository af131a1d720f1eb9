//! The mail sender

use std::ops::{Deref, DerefMut};

use crate::{
    config::ServerConfig,
    diagnostics::{DiagnosticSink, TracingSink},
    error::{self, Error, Kind},
    message::Message,
    transport::{
        smtp::{
            self, authentication::Credentials, client::TlsParameters, Relay, SmtpConnector,
        },
        Connector, Session,
    },
};

/// Sends messages through one SMTP server
///
/// Every [`send`](MailSender::send) opens its own connection, nothing is kept
/// between calls. With [`ServerConfig::use_tls`] the whole connection is
/// wrapped in TLS and every step of the transaction is reported separately;
/// otherwise the transaction runs over plain SMTP, upgraded with STARTTLS
/// when the server offers it.
///
/// ```rust,no_run
/// use mailsender::{MailSender, Message, ServerConfig};
///
/// let sender = MailSender::new(
///     ServerConfig::new("smtp.example.com")
///         .port(465)
///         .credentials("a@example.com", "password")
///         .use_tls(true),
/// );
/// let message = Message::new("Hi", vec!["b@example.com".to_owned()], "Hello");
///
/// if let Err(e) = sender.send(&message) {
///     eprintln!("could not send: {e}");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MailSender<C = SmtpConnector, D = TracingSink> {
    config: ServerConfig,
    relay: Relay,
    credentials: Option<Credentials>,
    connector: C,
    sink: D,
}

impl MailSender {
    /// Creates a sender reaching the network through TCP and logging failures
    /// with `tracing`
    pub fn new(config: ServerConfig) -> Self {
        Self::with_parts(config, SmtpConnector, TracingSink)
    }
}

impl<C, D> MailSender<C, D>
where
    C: Connector,
    D: DiagnosticSink,
{
    /// Creates a sender with its own network access and failure sink
    pub fn with_parts(mut config: ServerConfig, connector: C, sink: D) -> Self {
        config.port = config.effective_port();

        let relay = Relay {
            host: config.host.clone(),
            port: config.port,
            timeout: config.timeout_duration(),
            hello_name: config.client_id(),
        };
        let credentials = if config.username.is_empty() {
            None
        } else {
            Some(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
        };

        MailSender {
            config,
            relay,
            credentials,
            connector,
            sink,
        }
    }

    /// The settings in use, with the port resolved
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Sends `message` to all its recipients, from the configured username
    pub fn send(&self, message: &Message) -> Result<(), Error> {
        if message.recipients.is_empty() {
            return Err(error::envelope("no recipients"));
        }

        let payload = message.formatted(&self.config.username);

        if self.config.use_tls {
            self.send_tls(&message.recipients, &payload)
        } else {
            self.send_plain(&message.recipients, &payload)
                .map_err(|e| {
                    self.sink.send_failed(&e);
                    e
                })
        }
    }

    fn tls_parameters(&self) -> Result<TlsParameters, smtp::Error> {
        TlsParameters::builder(self.config.host.clone())
            .dangerous_accept_invalid_certs(self.config.allow_insecure_tls)
            .build()
    }

    fn send_plain(&self, recipients: &[String], payload: &[u8]) -> Result<(), Error> {
        let starttls = match self.tls_parameters() {
            Ok(tls_parameters) => Some(tls_parameters),
            Err(err) => {
                tracing::debug!("STARTTLS disabled: {err}");
                None
            }
        };

        smtp::send_mail(
            &self.connector,
            &self.relay,
            starttls.as_ref(),
            self.credentials.as_ref(),
            &self.config.username,
            recipients,
            payload,
        )
        .map(|_| ())
        .map_err(error::stage(Kind::Transport))
    }

    fn send_tls(&self, recipients: &[String], payload: &[u8]) -> Result<(), Error> {
        let tls_parameters = self.tls_parameters().map_err(error::stage(Kind::TlsDial))?;
        let stream = self
            .connector
            .dial(
                &self.relay.host,
                self.relay.port,
                self.relay.timeout,
                Some(&tls_parameters),
            )
            .map_err(error::stage(Kind::TlsDial))?;

        let session = self
            .connector
            .open_session(stream, self.relay.timeout, &self.relay.hello_name)
            .map_err(error::stage(Kind::ClientCreation))?;
        let mut session = ClosingSession(session);

        if let Some(ref credentials) = self.credentials {
            if session.supports_auth() {
                session
                    .authenticate(credentials)
                    .map_err(error::stage(Kind::Auth))?;
            } else {
                tracing::debug!("server does not advertise AUTH, sending unauthenticated");
            }
        }

        session
            .set_sender(&self.config.username)
            .map_err(error::stage(Kind::MailFrom))?;

        for recipient in recipients {
            session
                .add_recipient(recipient)
                .map_err(|e| Error::new(Kind::Rcpt(recipient.clone()), Some(e)))?;
        }

        session
            .open_data_stream()
            .map_err(error::stage(Kind::DataOpen))?;
        session
            .write_data(payload)
            .map_err(error::stage(Kind::DataWrite))?;
        session
            .close_data_stream()
            .map_err(error::stage(Kind::DataClose))?;

        session
            .quit()
            .map(|_| ())
            .map_err(error::stage(Kind::Quit))
    }
}

/// Closes the session when dropped
struct ClosingSession<S: Session>(S);

impl<S: Session> Deref for ClosingSession<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.0
    }
}

impl<S: Session> DerefMut for ClosingSession<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.0
    }
}

impl<S: Session> Drop for ClosingSession<S> {
    fn drop(&mut self) {
        self.0.close();
    }
}
