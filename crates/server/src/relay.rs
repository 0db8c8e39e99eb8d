//! Bidirectional byte relay for non-GET requests.
//!
//! Requests the resolution chain does not handle (CONNECT tunnels, POSTs,
//! everything that is not a plain GET) are passed straight through: the
//! relay opens a connection to the origin, optionally wraps it in TLS,
//! forwards the buffered request head, and then pumps bytes both ways
//! until one side closes or nothing moves for the idle timeout.

use std::sync::Arc;
use std::time::Duration;

use evergreen_core::RequestTarget;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use tokio_rustls::rustls::crypto::CryptoProvider;
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{self, DigitallySignedStruct, SignatureScheme};

/// Relay failures.
///
/// These never reach the proxy client; the connector logs them and
/// reports the request as unhandled.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("upstream connect failed: {0}")]
    Connect(std::io::Error),

    #[error("TLS handshake failed: {0}")]
    Tls(std::io::Error),

    #[error("invalid upstream server name: {0}")]
    ServerName(String),

    #[error("relay I/O failed: {0}")]
    Io(std::io::Error),
}

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Copy-buffer size per direction.
    pub buffer_size: usize,
    /// Stop pumping once nothing moved for this long.
    pub idle_timeout: Duration,
    /// Skip upstream certificate verification on TLS connections.
    pub skip_tls_verify: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { buffer_size: 8192, idle_timeout: Duration::from_secs(1), skip_tls_verify: true }
    }
}

/// Accepts any certificate the upstream presents.
///
/// The relay is a debugging pass-through; whether to authenticate the
/// upstream is the operator's call via `relay_skip_tls_verify`.
#[derive(Debug)]
struct AcceptAnyCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self, _end_entity: &CertificateDer<'_>, _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>, _ocsp_response: &[u8], _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self, _message: &[u8], _cert: &CertificateDer<'_>, _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self, _message: &[u8], _cert: &CertificateDer<'_>, _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

fn tls_config(skip_verify: bool) -> rustls::ClientConfig {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());

    if skip_verify {
        rustls::ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .expect("default protocol versions are supported by the default provider")
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert { provider }))
            .with_no_client_auth()
    } else {
        let roots = rustls::RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .expect("default protocol versions are supported by the default provider")
            .with_root_certificates(roots)
            .with_no_client_auth()
    }
}

/// The non-GET pass-through.
pub struct Relay {
    config: RelayConfig,
    tls: TlsConnector,
}

impl Relay {
    pub fn new(config: RelayConfig) -> Self {
        let tls = TlsConnector::from(Arc::new(tls_config(config.skip_tls_verify)));
        Self { config, tls }
    }

    /// Connect to the target, forward the buffered request head, and pump
    /// bytes both ways until EOF or idle timeout.
    pub async fn run<C>(&self, client: &mut C, target: &RequestTarget, head: &[u8]) -> Result<(), RelayError>
    where
        C: AsyncRead + AsyncWrite + Unpin,
    {
        let upstream = TcpStream::connect((target.host.as_str(), target.port))
            .await
            .map_err(RelayError::Connect)?;

        if target.is_tls() {
            let name = ServerName::try_from(target.host.clone()).map_err(|e| RelayError::ServerName(e.to_string()))?;
            let mut upstream = self.tls.connect(name, upstream).await.map_err(RelayError::Tls)?;
            upstream.write_all(head).await.map_err(RelayError::Io)?;
            let (up, down) = pump(client, &mut upstream, self.config.buffer_size, self.config.idle_timeout).await;
            tracing::debug!("tls relay to {}:{} done ({} up, {} down)", target.host, target.port, up, down);
        } else {
            let mut upstream = upstream;
            upstream.write_all(head).await.map_err(RelayError::Io)?;
            let (up, down) = pump(client, &mut upstream, self.config.buffer_size, self.config.idle_timeout).await;
            tracing::debug!("relay to {}:{} done ({} up, {} down)", target.host, target.port, up, down);
        }

        Ok(())
    }
}

enum Pipe {
    FromClient(std::io::Result<usize>),
    FromUpstream(std::io::Result<usize>),
}

/// Copy bytes in both directions until either side reaches EOF, an I/O
/// error occurs, or nothing moves for `idle_timeout`.
///
/// Returns the byte counts moved client→upstream and upstream→client.
pub async fn pump<C, U>(client: &mut C, upstream: &mut U, buffer_size: usize, idle_timeout: Duration) -> (u64, u64)
where
    C: AsyncRead + AsyncWrite + Unpin,
    U: AsyncRead + AsyncWrite + Unpin,
{
    let mut client_buf = vec![0u8; buffer_size];
    let mut upstream_buf = vec![0u8; buffer_size];
    let mut sent: u64 = 0;
    let mut received: u64 = 0;

    loop {
        let event = tokio::time::timeout(idle_timeout, async {
            tokio::select! {
                r = client.read(&mut client_buf) => Pipe::FromClient(r),
                r = upstream.read(&mut upstream_buf) => Pipe::FromUpstream(r),
            }
        })
        .await;

        match event {
            Err(_) => break,
            Ok(Pipe::FromClient(Ok(0))) | Ok(Pipe::FromUpstream(Ok(0))) => break,
            Ok(Pipe::FromClient(Ok(n))) => {
                if upstream.write_all(&client_buf[..n]).await.is_err() {
                    break;
                }
                sent += n as u64;
            }
            Ok(Pipe::FromUpstream(Ok(n))) => {
                if client.write_all(&upstream_buf[..n]).await.is_err() {
                    break;
                }
                received += n as u64;
            }
            Ok(Pipe::FromClient(Err(e))) | Ok(Pipe::FromUpstream(Err(e))) => {
                tracing::debug!("relay read failed: {}", e);
                break;
            }
        }
    }

    (sent, received)
}
