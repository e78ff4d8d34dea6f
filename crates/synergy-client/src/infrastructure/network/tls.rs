//! TLS/mTLS transport setup for the Session control channel.
//!
//! Builds a `tokio_rustls::TlsConnector` from the client's [`TransportConfig`]:
//! plain path validation against the system trust store by default, a
//! client certificate + key loaded from `pem_path` for mTLS, and a
//! certificate-verification bypass (loudly logged) when
//! `trust_on_first_use` is set.

use std::sync::{Arc, Once};

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use thiserror::Error;
use tokio_rustls::TlsConnector;
use tracing::warn;

use crate::application::config::TransportConfig;

#[derive(Debug, Error)]
pub enum TlsSetupError {
    #[error("could not load system root certificates: {0}")]
    RootStore(std::io::Error),
    #[error("could not read PEM material at {path}: {source}")]
    PemIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("PEM file at {0} contains no certificates")]
    NoCertificates(String),
    #[error("PEM file at {0} contains no private key")]
    NoPrivateKey(String),
    #[error("invalid TLS client configuration: {0}")]
    Config(String),
}

/// Verifier that accepts any server certificate without checking it.
///
/// Used only when `trust_on_first_use` is configured. Every session
/// established through it logs a `warn` so the bypass is never silent.
#[derive(Debug)]
struct TrustOnFirstUseVerifier(rustls::crypto::CryptoProvider);

impl ServerCertVerifier for TrustOnFirstUseVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
        .map(|_| HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
        .map(|_| HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

fn load_pem_identity(pem_path: &str) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), TlsSetupError> {
    let bytes = std::fs::read(pem_path).map_err(|source| TlsSetupError::PemIo {
        path: pem_path.to_string(),
        source,
    })?;
    let mut reader = std::io::BufReader::new(bytes.as_slice());
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
        .collect::<Result<_, _>>()
        .map_err(|source| TlsSetupError::PemIo {
            path: pem_path.to_string(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsSetupError::NoCertificates(pem_path.to_string()));
    }

    let mut reader = std::io::BufReader::new(bytes.as_slice());
    let key = rustls_pemfile::private_key(&mut reader)
        .map_err(|source| TlsSetupError::PemIo {
            path: pem_path.to_string(),
            source,
        })?
        .ok_or_else(|| TlsSetupError::NoPrivateKey(pem_path.to_string()))?;

    Ok((certs, key))
}

static CRYPTO_PROVIDER_INIT: Once = Once::new();

/// Installs the process-wide default `CryptoProvider` the first time a TLS
/// connector is built. `rustls` 0.23's `ClientConfig::builder()` panics if
/// no default provider has been installed; reconnect attempts call
/// `build_connector` repeatedly, so this must be idempotent rather than a
/// one-shot call in `main`.
fn ensure_crypto_provider_installed() {
    CRYPTO_PROVIDER_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Builds a [`TlsConnector`] from the transport configuration.
///
/// `tls_trust` (here `trust_on_first_use`) bypasses peer certificate
/// verification with a loud warning; otherwise the system's native trust
/// store is used for standard path validation. mTLS additionally presents
/// a client certificate + key loaded from `pem_path`.
pub fn build_connector(cfg: &TransportConfig) -> Result<TlsConnector, TlsSetupError> {
    ensure_crypto_provider_installed();
    let builder = ClientConfig::builder();

    let wants_client_cert = if cfg.trust_on_first_use {
        warn!("TLS peer certificate verification is DISABLED (trust_on_first_use); the server identity is not authenticated");
        let provider = rustls::crypto::CryptoProvider::get_default()
            .cloned()
            .unwrap_or_else(|| Arc::new(rustls::crypto::ring::default_provider()));
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(TrustOnFirstUseVerifier((*provider).clone())))
    } else {
        let mut root_store = RootCertStore::empty();
        let native = rustls_native_certs::load_native_certs();
        for error in &native.errors {
            warn!(%error, "skipping unreadable system certificate");
        }
        if native.certs.is_empty() {
            return Err(TlsSetupError::RootStore(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no usable system root certificates found",
            )));
        }
        for cert in native.certs {
            let _ = root_store.add(cert);
        }
        builder.with_root_certificates(root_store)
    };

    let client_config = if cfg.mtls {
        let (certs, key) = load_pem_identity(&cfg.pem_path)?;
        wants_client_cert
            .with_client_auth_cert(certs, key)
            .map_err(|e| TlsSetupError::Config(e.to_string()))?
    } else {
        wants_client_cert.with_no_client_auth()
    };

    Ok(TlsConnector::from(Arc::new(client_config)))
}
