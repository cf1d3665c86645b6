//! Client-certificate material for mutual TLS.
//!
//! A [`CertificateBundle`] is what callers hand over: the PFX bytes and its
//! passphrase. The decoded key and chain only ever live inside a
//! `CertificateSession`, which is lent to a closure by
//! `CertificateSession::scoped` and wiped when the closure returns or
//! unwinds.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{Ordering, compiler_fence};

use crate::core::{GnreError, GnreResult};

/// Heap buffer that is overwritten with zeros when dropped.
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        live::acquire();
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Overwrite `buf` with zeros using volatile stores the optimizer cannot
/// elide.
pub(crate) fn wipe(buf: &mut [u8]) {
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, aligned, exclusive reference.
        unsafe { std::ptr::write_volatile(byte, 0) };
    }
    compiler_fence(Ordering::SeqCst);
}

impl Drop for SecretBytes {
    fn drop(&mut self) {
        wipe(&mut self.0);
        live::release();
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes([REDACTED; {}])", self.0.len())
    }
}


#[cfg(not(test))]
mod live {
    #[inline]
    pub(super) fn acquire() {}

    #[inline]
    pub(super) fn release() {}
}

/// PKCS#12 (PFX) file contents plus passphrase.
pub struct CertificateBundle {
    pfx: Vec<u8>,
    passphrase: Vec<u8>,
}

impl CertificateBundle {
    pub fn new(pfx: impl Into<Vec<u8>>, passphrase: impl Into<String>) -> Self {
        Self {
            pfx: pfx.into(),
            passphrase: passphrase.into().into_bytes(),
        }
    }

    /// Read a `.pfx`/`.p12` file.
    pub fn from_file(path: impl AsRef<Path>, passphrase: impl Into<String>) -> GnreResult<Self> {
        let path = path.as_ref();
        let pfx = std::fs::read(path).map_err(|e| {
            GnreError::Certificate(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(Self::new(pfx, passphrase))
    }

    pub fn pfx(&self) -> &[u8] {
        &self.pfx
    }

    #[cfg_attr(not(feature = "transport"), allow(dead_code))]
    pub(crate) fn passphrase(&self) -> GnreResult<&str> {
        std::str::from_utf8(&self.passphrase)
            .map_err(|_| GnreError::Certificate("passphrase is not valid UTF-8".into()))
    }
}

impl Drop for CertificateBundle {
    fn drop(&mut self) {
        wipe(&mut self.pfx);
        wipe(&mut self.passphrase);
    }
}

impl fmt::Debug for CertificateBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateBundle")
            .field("pfx", &format_args!("[{} bytes]", self.pfx.len()))
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

#[cfg(feature = "transport")]
pub use session::CertificateSession;

#[cfg(feature = "transport")]
mod session {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use tracing::debug;

    use super::{CertificateBundle, SecretBytes, wipe};
    use crate::core::{GnreError, GnreResult};

    /// Decoded private key (PKCS#8 DER) and certificate chain (DER, leaf
    /// first).
    #[derive(Debug)]
    pub struct CertificateSession {
        key: SecretBytes,
        chain: Vec<SecretBytes>,
    }

    impl CertificateSession {
        /// Decode `bundle`.
        ///
        /// # Errors
        ///
        /// `GnreError::Certificate` for an unreadable PFX, a wrong passphrase,
        /// or a PFX without a private key and certificate.
        pub fn materialize(bundle: &CertificateBundle) -> GnreResult<Self> {
            let keystore = p12_keystore::KeyStore::from_pkcs12(bundle.pfx(), bundle.passphrase()?)
                .map_err(|e| GnreError::Certificate(format!("invalid PFX or passphrase: {e}")))?;

            let (alias, chain) = keystore.private_key_chain().ok_or_else(|| {
                GnreError::Certificate("PFX has no private key entry".into())
            })?;
            if chain.chain().is_empty() {
                return Err(GnreError::Certificate(
                    "PFX private key has no certificate".into(),
                ));
            }

            debug!(alias, certificates = chain.chain().len(), "certificate loaded");
            Ok(Self {
                key: SecretBytes::new(chain.key().to_vec()),
                chain: chain
                    .chain()
                    .iter()
                    .map(|c| SecretBytes::new(c.as_der().to_vec()))
                    .collect(),
            })
        }

        /// Lend a freshly decoded session to `f`; it is wiped on every exit
        /// path, including unwinding.
        pub fn scoped<R>(
            bundle: &CertificateBundle,
            f: impl FnOnce(&CertificateSession) -> GnreResult<R>,
        ) -> GnreResult<R> {
            let session = Self::materialize(bundle)?;
            Self::run_scoped(session, f)
        }

        fn run_scoped<R>(
            session: Self,
            f: impl FnOnce(&CertificateSession) -> GnreResult<R>,
        ) -> GnreResult<R> {
            let out = f(&session);
            drop(session);
            out
        }

        #[cfg(test)]
        pub(crate) fn from_parts(key: Vec<u8>, chain: Vec<Vec<u8>>) -> Self {
            Self {
                key: SecretBytes::new(key),
                chain: chain.into_iter().map(SecretBytes::new).collect(),
            }
        }

        pub fn private_key_der(&self) -> &[u8] {
            self.key.as_bytes()
        }

        pub fn certificate_chain(&self) -> impl Iterator<Item = &[u8]> {
            self.chain.iter().map(SecretBytes::as_bytes)
        }

        /// PEM with the private key followed by the chain, as expected by
        /// `reqwest::Identity::from_pem`.
        pub fn to_identity_pem(&self) -> GnreResult<SecretBytes> {
            let mut out = Vec::new();
            push_pem(&mut out, "PRIVATE KEY", self.key.as_bytes())?;
            for cert in &self.chain {
                push_pem(&mut out, "CERTIFICATE", cert.as_bytes())?;
            }
            Ok(SecretBytes::new(out))
        }
    }

    fn push_pem(out: &mut Vec<u8>, label: &str, der: &[u8]) -> GnreResult<()> {
        let mut encoded = vec![0u8; der.len().div_ceil(3) * 4];
        let n = STANDARD
            .encode_slice(der, &mut encoded)
            .map_err(|e| GnreError::Certificate(format!("PEM encoding: {e}")))?;

        out.extend_from_slice(format!("-----BEGIN {label}-----\n").as_bytes());
        for line in encoded[..n].chunks(64) {
            out.extend_from_slice(line);
            out.push(b'\n');
        }
        out.extend_from_slice(format!("-----END {label}-----\n").as_bytes());
        wipe(&mut encoded);
        Ok(())
    }

}
