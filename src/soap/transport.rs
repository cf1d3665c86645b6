//! HTTP(S) delivery of SOAP envelopes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::certificate::CertificateBundle;
use super::envelope::Envelope;
use crate::core::GnreResult;

/// Posts an envelope and returns the raw response body.
///
/// Implemented by [`HttpTransport`] (feature `transport`); tests and hosts
/// with their own HTTP stack can provide another implementation.
pub trait Transport {
    fn post(
        &self,
        url: &str,
        envelope: &Envelope,
        bundle: &CertificateBundle,
    ) -> GnreResult<String>;
}

/// Timeouts of the HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Whole request, including reading the body.
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Longest body excerpt quoted in transport errors.
#[cfg(feature = "transport")]
const PREVIEW_CHARS: usize = 500;

#[cfg(feature = "transport")]
pub use http::HttpTransport;

#[cfg(feature = "transport")]
mod http {
    use reqwest::StatusCode;
    use reqwest::header::CONTENT_TYPE;
    use tracing::{debug, warn};

    use super::*;
    use crate::core::GnreError;
    use crate::soap::certificate::CertificateSession;
    use crate::soap::response::is_soap_fault;

    /// Blocking `reqwest` transport with client-certificate TLS.
    ///
    /// Every call decodes the certificate anew and drops it before
    /// returning. There are no retries.
    #[derive(Debug, Clone, Default)]
    pub struct HttpTransport {
        config: TransportConfig,
    }

    impl HttpTransport {
        pub fn new(config: TransportConfig) -> Self {
            Self { config }
        }

        pub fn config(&self) -> &TransportConfig {
            &self.config
        }

        fn client(&self, session: &CertificateSession) -> GnreResult<reqwest::blocking::Client> {
            let pem = session.to_identity_pem()?;
            let identity = reqwest::Identity::from_pem(pem.as_bytes())
                .map_err(|e| GnreError::Certificate(format!("TLS identity: {e}")))?;
            drop(pem);

            reqwest::blocking::Client::builder()
                .identity(identity)
                .timeout(self.config.timeout)
                .connect_timeout(self.config.connect_timeout)
                .build()
                .map_err(|e| GnreError::Transport(format!("HTTP client: {e}")))
        }
    }

    impl Transport for HttpTransport {
        fn post(
            &self,
            url: &str,
            envelope: &Envelope,
            bundle: &CertificateBundle,
        ) -> GnreResult<String> {
            CertificateSession::scoped(bundle, |session| {
                let client = self.client(session)?;

                debug!(
                    url,
                    operation = %envelope.operation,
                    bytes = envelope.xml.len(),
                    "posting SOAP request"
                );
                let response = client
                    .post(url)
                    .header(CONTENT_TYPE, "text/xml; charset=utf-8")
                    .header("SOAPAction", format!("\"{}\"", envelope.soap_action))
                    .body(envelope.xml.clone())
                    .send()
                    .map_err(|e| GnreError::Transport(format!("POST {url}: {e}")))?;

                let status = response.status();
                let body = response
                    .text()
                    .map_err(|e| GnreError::Transport(format!("reading response: {e}")))?;
                debug!(%status, bytes = body.len(), "SOAP response");

                classify(status, body)
            })
        }
    }

    /// 2xx bodies and SOAP faults go to the parsers; anything else is a
    /// transport failure.
    fn classify(status: StatusCode, body: String) -> GnreResult<String> {
        if status.is_success() || is_soap_fault(&body) {
            return Ok(body);
        }
        warn!(%status, "non-SOAP error response");
        Err(GnreError::Transport(format!(
            "HTTP {status}: {}",
            preview(&body)
        )))
    }

    fn preview(body: &str) -> String {
        let mut out: String = body.chars().take(PREVIEW_CHARS).collect();
        if body.chars().nth(PREVIEW_CHARS).is_some() {
            out.push_str("...");
        }
        out
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn preview_truncates() {
            assert_eq!(preview("short"), "short");
            let long = "x".repeat(PREVIEW_CHARS + 10);
            let p = preview(&long);
            assert_eq!(p.len(), PREVIEW_CHARS + 3);
            assert!(p.ends_with("..."));
        }

        #[test]
        fn fault_body_on_server_error_is_kept() {
            let fault = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><soap:Fault><faultcode>soap:Server</faultcode><faultstring>Erro interno</faultstring></soap:Fault></soap:Body></soap:Envelope>"#;
            let body = classify(StatusCode::INTERNAL_SERVER_ERROR, fault.to_string()).unwrap();
            assert_eq!(body, fault);
        }

        #[test]
        fn html_error_page_is_transport_error() {
            let err = classify(
                StatusCode::BAD_GATEWAY,
                "<html><body>502 Bad Gateway</body></html>".to_string(),
            )
            .unwrap_err();
            match err {
                GnreError::Transport(msg) => {
                    assert!(msg.starts_with("HTTP 502 Bad Gateway: "));
                    assert!(msg.contains("<html>"));
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn success_body_is_returned() {
            let body = classify(StatusCode::OK, "<ok/>".to_string()).unwrap();
            assert_eq!(body, "<ok/>");
        }

        #[test]
        fn bad_certificate_never_reaches_network() {
            let transport = HttpTransport::default();
            let envelope = crate::soap::wrap_batch_submission("<TLote_GNRE/>").unwrap();
            let bundle = CertificateBundle::new(vec![0u8; 8], "x");
            let err = transport
                .post("https://127.0.0.1:9/unused", &envelope, &bundle)
                .unwrap_err();
            assert!(matches!(err, GnreError::Certificate(_)));
        }
    }
}
