use std::fmt::{self, Debug};

#[cfg(feature = "native-tls")]
use native_tls::{Protocol, TlsConnector};

use crate::transport::smtp::{error, Error};

/// Parameters to use for secure clients
#[derive(Clone)]
pub struct TlsParameters {
    #[cfg(feature = "native-tls")]
    pub(super) connector: TlsConnector,
    /// The domain name which is expected in the TLS certificate from the server,
    /// also sent as SNI
    pub(super) domain: String,
    accept_invalid_certs: bool,
}

impl Debug for TlsParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsParameters")
            .field("domain", &self.domain)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish_non_exhaustive()
    }
}

impl TlsParameters {
    /// Creates verifying `TlsParameters` for `domain`
    pub fn new(domain: String) -> Result<Self, Error> {
        TlsParametersBuilder::new(domain).build()
    }

    /// Creates a new `TlsParameters` builder
    pub fn builder(domain: String) -> TlsParametersBuilder {
        TlsParametersBuilder::new(domain)
    }

    /// The domain the certificate is checked against
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Whether certificate and hostname checks are disabled
    pub fn accepts_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }
}

/// Builder for `TlsParameters`
#[derive(Debug, Clone)]
pub struct TlsParametersBuilder {
    domain: String,
    accept_invalid_certs: bool,
}

impl TlsParametersBuilder {
    /// Creates a new builder for `TlsParameters`
    pub fn new(domain: String) -> Self {
        Self {
            domain,
            accept_invalid_certs: false,
        }
    }

    /// Controls whether invalid certificates are accepted
    ///
    /// Defaults to `false`.
    ///
    /// # Warning
    ///
    /// If certificate verification is disabled, *any* certificate
    /// is trusted for use, including:
    ///
    /// * Self signed certificates
    /// * Certificates from different hostnames
    /// * Expired certificates
    ///
    /// The connection is then open to man-in-the-middle attacks.
    pub fn dangerous_accept_invalid_certs(mut self, accept_invalid_certs: bool) -> Self {
        self.accept_invalid_certs = accept_invalid_certs;
        self
    }

    /// Creates the `TlsParameters` with the enabled TLS backend
    pub fn build(self) -> Result<TlsParameters, Error> {
        #[cfg(feature = "native-tls")]
        {
            let connector = TlsConnector::builder()
                .danger_accept_invalid_certs(self.accept_invalid_certs)
                .danger_accept_invalid_hostnames(self.accept_invalid_certs)
                .min_protocol_version(Some(Protocol::Tlsv12))
                .build()
                .map_err(error::tls)?;

            Ok(TlsParameters {
                connector,
                domain: self.domain,
                accept_invalid_certs: self.accept_invalid_certs,
            })
        }
        #[cfg(not(feature = "native-tls"))]
        {
            Err(error::client(format!(
                "cannot reach {} over TLS: no TLS backend enabled",
                self.domain
            )))
        }
    }
}
