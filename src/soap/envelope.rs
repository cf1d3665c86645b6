use crate::core::GnreError;
use crate::lote::VERSAO_LAYOUT;
use crate::xml_utils::XmlWriter;

use super::endpoints::Operation;

/// SOAP 1.1 envelope namespace.
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Base of the per-operation SOAP namespaces.
pub const GNRE_WS_NS: &str = "http://www.gnre.pe.gov.br/webservice";

/// A SOAP request ready to be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Operation name, e.g. `GnreLoteRecepcao`.
    pub operation: String,
    /// Value of the `SOAPAction` header; equal to the header/body namespace.
    pub soap_action: String,
    pub xml: String,
}

/// Wrap a `TLote_GNRE` for `GnreLoteRecepcao`.
pub fn wrap_batch_submission(payload: &str) -> Result<Envelope, GnreError> {
    wrap_operation(Operation::RecepcaoLote.soap_operation(), payload)
}

/// Wrap `payload` for the named operation.
///
/// The service routes on the namespace and `SOAPAction`; both are derived
/// from `operation`, which must match the endpoint being called.
pub fn wrap_operation(operation: &str, payload: &str) -> Result<Envelope, GnreError> {
    let operation = operation.trim();
    if operation.is_empty() {
        return Err(GnreError::Build("SOAP operation name is empty".into()));
    }
    let ns = format!("{GNRE_WS_NS}/{operation}");

    let mut w = XmlWriter::with_declaration()?;
    w.start_element_with_attrs("soapenv:Envelope", &[("xmlns:soapenv", SOAP_ENV_NS)])?;
    w.start_element("soapenv:Header")?;
    w.start_element_with_attrs("gnreCabecMsg", &[("xmlns", ns.as_str())])?;
    w.text_element("versaoDados", VERSAO_LAYOUT)?;
    w.end_element("gnreCabecMsg")?;
    w.end_element("soapenv:Header")?;
    w.start_element("soapenv:Body")?;
    w.start_element_with_attrs("gnreDadosMsg", &[("xmlns", ns.as_str())])?;
    w.raw(payload.trim())?;
    w.end_element("gnreDadosMsg")?;
    w.end_element("soapenv:Body")?;
    w.end_element("soapenv:Envelope")?;

    Ok(Envelope {
        operation: operation.to_string(),
        soap_action: ns,
        xml: w.into_string()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_envelope_shape() {
        let env = wrap_batch_submission("<TLote_GNRE/>").unwrap();
        assert_eq!(env.operation, "GnreLoteRecepcao");
        assert_eq!(
            env.soap_action,
            "http://www.gnre.pe.gov.br/webservice/GnreLoteRecepcao"
        );
        assert!(env.xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(env.xml.contains(
            r#"<gnreCabecMsg xmlns="http://www.gnre.pe.gov.br/webservice/GnreLoteRecepcao"><versaoDados>2.00</versaoDados></gnreCabecMsg>"#
        ));
        assert!(env.xml.contains(
            r#"<gnreDadosMsg xmlns="http://www.gnre.pe.gov.br/webservice/GnreLoteRecepcao"><TLote_GNRE/></gnreDadosMsg>"#
        ));
    }

    #[test]
    fn generic_operation_names_action() {
        let env = wrap_operation("GnreResultadoLote", "<TConsLote_GNRE/>").unwrap();
        assert!(env.soap_action.ends_with("/GnreResultadoLote"));
        assert!(env.xml.contains("webservice/GnreResultadoLote\"><TConsLote_GNRE/>"));
    }

    #[test]
    fn empty_operation_rejected() {
        assert!(matches!(wrap_operation("  ", "<x/>"), Err(GnreError::Build(_))));
    }
}
