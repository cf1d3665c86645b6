use thiserror::Error;

/// Result alias used throughout the crate.
pub type GnreResult<T> = Result<T, GnreError>;

/// Lot status codes meaning "received, not processed yet".
pub(crate) const CODIGOS_EM_PROCESSAMENTO: &[&str] = &["400", "401"];

/// Errors that can occur while building, transmitting or interpreting a GNRE.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GnreError {
    /// The PFX bundle could not be opened (bad format, wrong passphrase, no key).
    #[error("certificate error: {0}")]
    Certificate(String),

    /// Malformed or incomplete XML (source NF-e or service response).
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid or missing fields for payload construction.
    #[error("build error: {0}")]
    Build(String),

    /// Unknown environment or other configuration mistake.
    #[error("config error: {0}")]
    Config(String),

    /// Network or TLS failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Business-level answer from the GNRE service: a rejection, or a lot
    /// that is not finished yet. Inspect `codigo` to tell them apart.
    #[error("GNRE {codigo}: {descricao}")]
    Service {
        /// Status code reported by the service.
        codigo: String,
        /// Description reported by the service.
        descricao: String,
        /// Receipt the answer refers to, when known.
        recibo: Option<String>,
    },
}

impl GnreError {
    pub(crate) fn service(
        codigo: impl Into<String>,
        descricao: impl Into<String>,
        recibo: Option<String>,
    ) -> Self {
        Self::Service {
            codigo: codigo.into(),
            descricao: descricao.into(),
            recibo,
        }
    }

    /// Service code, if this is a [`GnreError::Service`].
    pub fn codigo(&self) -> Option<&str> {
        match self {
            Self::Service { codigo, .. } => Some(codigo),
            _ => None,
        }
    }

    /// `true` when the service reported the lot as still being processed,
    /// i.e. the caller should poll again later.
    pub fn is_pending(&self) -> bool {
        self.codigo()
            .is_some_and(|c| CODIGOS_EM_PROCESSAMENTO.contains(&c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_display() {
        let err = GnreError::service("401", "Lote em processamento", Some("99".into()));
        assert_eq!(err.to_string(), "GNRE 401: Lote em processamento");
        assert!(err.is_pending());
    }

    #[test]
    fn non_service_is_never_pending() {
        assert!(!GnreError::Transport("timeout".into()).is_pending());
        assert!(GnreError::Parse("x".into()).codigo().is_none());
    }

    #[test]
    fn rejection_is_not_pending() {
        let err = GnreError::service("404", "Erro no processamento", None);
        assert_eq!(err.codigo(), Some("404"));
        assert!(!err.is_pending());
    }
}
