use std::{
    io::{self, Read, Write},
    mem,
    net::{Shutdown, TcpStream, ToSocketAddrs},
    time::Duration,
};

#[cfg(feature = "native-tls")]
use native_tls::TlsStream;

#[cfg(test)]
use super::mock::MockStream;
use super::TlsParameters;
use crate::transport::smtp::{error, Error};

/// A network stream
pub struct NetworkStream {
    inner: InnerNetworkStream,
}

/// Represents the different types of underlying network streams
#[allow(clippy::large_enum_variant)]
enum InnerNetworkStream {
    /// Plain TCP stream
    Tcp(TcpStream),
    /// Encrypted TCP stream
    #[cfg(feature = "native-tls")]
    NativeTls(TlsStream<TcpStream>),
    /// Scripted stream
    #[cfg(test)]
    Mock(MockStream),
    /// Left behind while the stream is being upgraded
    None,
}

impl NetworkStream {
    fn new(inner: InnerNetworkStream) -> Self {
        if let InnerNetworkStream::None = inner {
            debug_assert!(false, "InnerNetworkStream::None must never be built");
        }

        NetworkStream { inner }
    }

    #[cfg(test)]
    pub(crate) fn mock(stream: MockStream) -> Self {
        Self::new(InnerNetworkStream::Mock(stream))
    }

    /// Shutdowns the connection
    pub fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        match self.inner {
            InnerNetworkStream::Tcp(ref s) => s.shutdown(how),
            #[cfg(feature = "native-tls")]
            InnerNetworkStream::NativeTls(ref s) => s.get_ref().shutdown(how),
            #[cfg(test)]
            InnerNetworkStream::Mock(_) => Ok(()),
            InnerNetworkStream::None => Ok(()),
        }
    }

    /// Opens a TCP connection to `server`, wrapped in TLS when `tls_parameters`
    /// is given
    ///
    /// Every resolved address is tried in turn, the last failure is returned.
    pub fn connect<T: ToSocketAddrs>(
        server: T,
        timeout: Option<Duration>,
        tls_parameters: Option<&TlsParameters>,
    ) -> Result<NetworkStream, Error> {
        let addresses = server.to_socket_addrs().map_err(error::connection)?;

        let mut last_err = None;
        let mut tcp_stream = None;
        for address in addresses {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&address, timeout),
                None => TcpStream::connect(address),
            };
            match attempt {
                Ok(stream) => {
                    tcp_stream = Some(stream);
                    break;
                }
                Err(err) => {
                    tracing::debug!("could not connect to {address}: {err}");
                    last_err = Some(err);
                }
            }
        }

        let tcp_stream = match (tcp_stream, last_err) {
            (Some(stream), _) => stream,
            (None, Some(err)) => return Err(error::connection(err)),
            (None, None) => {
                return Err(error::connection("could not resolve to any address"))
            }
        };

        let mut stream = NetworkStream::new(InnerNetworkStream::Tcp(tcp_stream));
        if let Some(tls_parameters) = tls_parameters {
            stream.upgrade_tls(tls_parameters)?;
        }
        Ok(stream)
    }

    /// Performs the TLS handshake over the current plain connection
    ///
    /// Does nothing if the stream is already encrypted.
    pub fn upgrade_tls(&mut self, tls_parameters: &TlsParameters) -> Result<(), Error> {
        match mem::replace(&mut self.inner, InnerNetworkStream::None) {
            InnerNetworkStream::Tcp(tcp_stream) => {
                self.inner = Self::upgrade_tcp(tcp_stream, tls_parameters)?;
                Ok(())
            }
            other => {
                self.inner = other;
                Ok(())
            }
        }
    }

    #[cfg(feature = "native-tls")]
    fn upgrade_tcp(
        tcp_stream: TcpStream,
        tls_parameters: &TlsParameters,
    ) -> Result<InnerNetworkStream, Error> {
        let stream = tls_parameters
            .connector
            .connect(&tls_parameters.domain, tcp_stream)
            .map_err(|err| error::tls(err.to_string()))?;
        Ok(InnerNetworkStream::NativeTls(stream))
    }

    #[cfg(not(feature = "native-tls"))]
    fn upgrade_tcp(
        _tcp_stream: TcpStream,
        tls_parameters: &TlsParameters,
    ) -> Result<InnerNetworkStream, Error> {
        Err(error::client(format!(
            "cannot encrypt connection to {}: no TLS backend enabled",
            tls_parameters.domain
        )))
    }

    /// Tells if the stream is encrypted
    pub fn is_encrypted(&self) -> bool {
        match self.inner {
            InnerNetworkStream::Tcp(_) | InnerNetworkStream::None => false,
            #[cfg(feature = "native-tls")]
            InnerNetworkStream::NativeTls(_) => true,
            #[cfg(test)]
            InnerNetworkStream::Mock(_) => false,
        }
    }

    /// Sets the read timeout of the underlying socket
    pub fn set_read_timeout(&mut self, duration: Option<Duration>) -> io::Result<()> {
        match self.inner {
            InnerNetworkStream::Tcp(ref mut stream) => stream.set_read_timeout(duration),
            #[cfg(feature = "native-tls")]
            InnerNetworkStream::NativeTls(ref mut stream) => {
                stream.get_ref().set_read_timeout(duration)
            }
            #[cfg(test)]
            InnerNetworkStream::Mock(_) => Ok(()),
            InnerNetworkStream::None => Err(not_connected()),
        }
    }

    /// Sets the write timeout of the underlying socket
    pub fn set_write_timeout(&mut self, duration: Option<Duration>) -> io::Result<()> {
        match self.inner {
            InnerNetworkStream::Tcp(ref mut stream) => stream.set_write_timeout(duration),
            #[cfg(feature = "native-tls")]
            InnerNetworkStream::NativeTls(ref mut stream) => {
                stream.get_ref().set_write_timeout(duration)
            }
            #[cfg(test)]
            InnerNetworkStream::Mock(_) => Ok(()),
            InnerNetworkStream::None => Err(not_connected()),
        }
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "stream lost during TLS upgrade")
}

impl Read for NetworkStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner {
            InnerNetworkStream::Tcp(ref mut s) => s.read(buf),
            #[cfg(feature = "native-tls")]
            InnerNetworkStream::NativeTls(ref mut s) => s.read(buf),
            #[cfg(test)]
            InnerNetworkStream::Mock(ref mut s) => s.read(buf),
            InnerNetworkStream::None => Err(not_connected()),
        }
    }
}

impl Write for NetworkStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner {
            InnerNetworkStream::Tcp(ref mut s) => s.write(buf),
            #[cfg(feature = "native-tls")]
            InnerNetworkStream::NativeTls(ref mut s) => s.write(buf),
            #[cfg(test)]
            InnerNetworkStream::Mock(ref mut s) => s.write(buf),
            InnerNetworkStream::None => Err(not_connected()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner {
            InnerNetworkStream::Tcp(ref mut s) => s.flush(),
            #[cfg(feature = "native-tls")]
            InnerNetworkStream::NativeTls(ref mut s) => s.flush(),
            #[cfg(test)]
            InnerNetworkStream::Mock(ref mut s) => s.flush(),
            InnerNetworkStream::None => Err(not_connected()),
        }
    }
}
