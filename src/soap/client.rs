use tracing::info;

use super::certificate::CertificateBundle;
use super::endpoints::Operation;
use super::envelope::{Envelope, wrap_batch_submission, wrap_operation};
use super::response::{parse_guide_result, parse_receipt, parse_status};
use super::transport::Transport;
use crate::core::*;
use crate::lote::{BatchPayload, ConsultaResultadoOptions, build_consulta_resultado_xml};

/// One environment, one transport, one certificate.
///
/// Each method is a single round trip; polling a lot until it completes is
/// left to the caller.
///
/// ```no_run
/// # #[cfg(feature = "transport")]
/// # fn demo(payload: gnre::lote::BatchPayload) -> gnre::GnreResult<()> {
/// use gnre::Environment;
/// use gnre::soap::{CertificateBundle, GnreClient, HttpTransport};
///
/// let bundle = CertificateBundle::from_file("empresa.pfx", "senha")?;
/// let client = GnreClient::new(Environment::Teste, HttpTransport::default(), bundle);
/// let recibo = client.submit(&payload)?;
/// let guia = client.guide(&recibo)?;
/// println!("{}", guia.linha_digitavel);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GnreClient<T: Transport> {
    environment: Environment,
    transport: T,
    bundle: CertificateBundle,
}

impl<T: Transport> GnreClient<T> {
    pub fn new(environment: Environment, transport: T, bundle: CertificateBundle) -> Self {
        Self {
            environment,
            transport,
            bundle,
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submit a batch and return its receipt.
    pub fn submit(&self, payload: &BatchPayload) -> GnreResult<Receipt> {
        let envelope = wrap_batch_submission(payload.as_str())?;
        let body = self.call(Operation::RecepcaoLote, &envelope)?;
        parse_receipt(&body)
    }

    /// Current processing status of a lot.
    pub fn status(&self, recibo: &Receipt) -> GnreResult<ResultStatus> {
        parse_status(&self.fetch_result(recibo)?)
    }

    /// Issued guide of a completed lot.
    ///
    /// A lot still being processed comes back as `GnreError::Service` with
    /// [`GnreError::is_pending`] set.
    pub fn guide(&self, recibo: &Receipt) -> GnreResult<GuideResult> {
        parse_guide_result(&self.fetch_result(recibo)?)
    }

    fn fetch_result(&self, recibo: &Receipt) -> GnreResult<String> {
        let xml = build_consulta_resultado_xml(
            self.environment,
            recibo,
            ConsultaResultadoOptions::default(),
        )?;
        let envelope = wrap_operation(Operation::ResultadoLote.soap_operation(), &xml)?;
        self.call(Operation::ResultadoLote, &envelope)
    }

    fn call(&self, operation: Operation, envelope: &Envelope) -> GnreResult<String> {
        let url = self.environment.endpoints().url(operation);
        info!(
            environment = self.environment.as_str(),
            operation = operation.soap_operation(),
            "calling GNRE"
        );
        self.transport.post(url, envelope, &self.bundle)
    }
}
