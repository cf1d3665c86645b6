//! Web-service endpoints per environment.

use std::str::FromStr;

use crate::core::{Environment, GnreError};

/// GNRE web-service operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Batch submission (phase 1).
    RecepcaoLote,
    /// Result of a submitted batch (phase 2).
    ResultadoLote,
    /// Submission of a guide lookup.
    RecepcaoConsulta,
    /// Result of a guide lookup.
    ResultadoConsulta,
    /// Per-state configuration.
    ConfigUf,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Self::RecepcaoLote,
        Self::ResultadoLote,
        Self::RecepcaoConsulta,
        Self::ResultadoConsulta,
        Self::ConfigUf,
    ];

    /// Registry key (`recepcao_lote`, `resultado_lote`, ...).
    pub fn key(self) -> &'static str {
        match self {
            Self::RecepcaoLote => "recepcao_lote",
            Self::ResultadoLote => "resultado_lote",
            Self::RecepcaoConsulta => "recepcao_consulta",
            Self::ResultadoConsulta => "resultado_consulta",
            Self::ConfigUf => "config_uf",
        }
    }

    /// SOAP service name; also the last path segment of the URL and of the
    /// SOAP namespace.
    pub fn soap_operation(self) -> &'static str {
        match self {
            Self::RecepcaoLote => "GnreLoteRecepcao",
            Self::ResultadoLote => "GnreResultadoLote",
            Self::RecepcaoConsulta => "GnreLoteRecepcaoConsulta",
            Self::ResultadoConsulta => "GnreResultadoLoteConsulta",
            Self::ConfigUf => "GnreConfigUF",
        }
    }
}

/// Immutable operation → URL table of one environment.
#[derive(Debug, PartialEq, Eq)]
pub struct EndpointSet {
    pub environment: Environment,
    pub recepcao_lote: &'static str,
    pub resultado_lote: &'static str,
    pub recepcao_consulta: &'static str,
    pub resultado_consulta: &'static str,
    pub config_uf: &'static str,
}

impl EndpointSet {
    pub fn url(&self, operation: Operation) -> &'static str {
        match operation {
            Operation::RecepcaoLote => self.recepcao_lote,
            Operation::ResultadoLote => self.resultado_lote,
            Operation::RecepcaoConsulta => self.recepcao_consulta,
            Operation::ResultadoConsulta => self.resultado_consulta,
            Operation::ConfigUf => self.config_uf,
        }
    }

    /// Look up by registry key.
    pub fn get(&self, key: &str) -> Option<&'static str> {
        Operation::ALL
            .into_iter()
            .find(|op| op.key() == key)
            .map(|op| self.url(op))
    }

    /// `(key, url)` pairs in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        Operation::ALL.into_iter().map(|op| (op.key(), self.url(op)))
    }
}

static PRODUCAO: EndpointSet = EndpointSet {
    environment: Environment::Producao,
    recepcao_lote: "https://www.gnre.pe.gov.br/gnreWS/services/GnreLoteRecepcao",
    resultado_lote: "https://www.gnre.pe.gov.br/gnreWS/services/GnreResultadoLote",
    recepcao_consulta: "https://www.gnre.pe.gov.br/gnreWS/services/GnreLoteRecepcaoConsulta",
    resultado_consulta: "https://www.gnre.pe.gov.br/gnreWS/services/GnreResultadoLoteConsulta",
    config_uf: "https://www.gnre.pe.gov.br/gnreWS/services/GnreConfigUF",
};

static TESTE: EndpointSet = EndpointSet {
    environment: Environment::Teste,
    recepcao_lote: "https://www.testegnre.pe.gov.br/gnreWS/services/GnreLoteRecepcao",
    resultado_lote: "https://www.testegnre.pe.gov.br/gnreWS/services/GnreResultadoLote",
    recepcao_consulta: "https://www.testegnre.pe.gov.br/gnreWS/services/GnreLoteRecepcaoConsulta",
    resultado_consulta: "https://www.testegnre.pe.gov.br/gnreWS/services/GnreResultadoLoteConsulta",
    config_uf: "https://www.testegnre.pe.gov.br/gnreWS/services/GnreConfigUF",
};

impl Environment {
    pub fn endpoints(self) -> &'static EndpointSet {
        match self {
            Self::Producao => &PRODUCAO,
            Self::Teste => &TESTE,
        }
    }
}

/// Endpoints for `"producao"` or `"teste"`.
///
/// # Errors
///
/// `GnreError::Config` for any other name.
pub fn get_endpoints(environment: &str) -> Result<&'static EndpointSet, GnreError> {
    Environment::from_str(environment).map(Environment::endpoints)
}
