//! Mailsender sends simple emails through an SMTP server.
//!
//! A [`MailSender`] is built from a [`ServerConfig`] and sends [`Message`]s:
//! a subject, a list of recipients and a plain text or HTML body, with the
//! configured username as sender.
//!
//! ```rust,no_run
//! use mailsender::{MailSender, Message, ServerConfig};
//!
//! let config = ServerConfig::new("smtp.example.com")
//!     .port(587)
//!     .credentials("a@example.com", "password");
//! let message = Message::new(
//!     "Hi",
//!     vec!["b@example.com".to_owned()],
//!     "<p>Hello</p>",
//! )
//! .html(true);
//!
//! MailSender::new(config).send(&message)?;
//! # Ok::<(), mailsender::Error>(())
//! ```
//!
//! Messages go over plain SMTP, upgraded with STARTTLS when the server
//! offers it, or with [`ServerConfig::use_tls`] over implicit TLS. Failed
//! plain sends are reported to a [`DiagnosticSink`], [`TracingSink`] by
//! default.
//!
//! ## Features
//!
//! * **native-tls** (default): TLS through the system library
//! * **hostname** (default): use the local host name in `EHLO`

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod message;
pub mod sender;
pub mod transport;

pub use crate::{
    config::ServerConfig,
    diagnostics::{DiagnosticSink, TracingSink},
    error::Error,
    message::Message,
    sender::MailSender,
};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
