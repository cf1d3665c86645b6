//! Decide whether an NF-e needs a GNRE, and for which revenue code.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::ExtractedInvoiceData;
use super::ufs::Uf;

/// Revenue code for ICMS DIFAL (consumer operations).
pub const RECEITA_DIFAL: &str = "100102";
/// Revenue code for ICMS tax substitution by operation.
pub const RECEITA_ST_OPERACAO: &str = "100099";
/// Revenue code for ICMS tax substitution by calculation period.
pub const RECEITA_ST_APURACAO: &str = "100048";

/// Outcome of [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeedStatus {
    NotRequired,
    Required,
    /// Destination state is not integrated with the web service.
    ManualRequired,
}

/// Amounts that go into the guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideAmounts {
    /// `valor tipo=11`.
    pub principal: Decimal,
    /// `valor tipo=27`: vFCPUFDest + vFCPST.
    pub fcp: Decimal,
    /// `valor tipo=21` and `valorGNRE`.
    pub total: Decimal,
}

/// Decision for one invoice together with the fields it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeedDecision {
    pub status: NeedStatus,
    /// Destination state of the invoice.
    pub uf_favorecida: Uf,
    /// Effective revenue code; `None` when manual or not derivable.
    pub receita: Option<String>,
    pub valores: GuideAmounts,
}

impl NeedDecision {
    pub fn is_required(&self) -> bool {
        self.status == NeedStatus::Required
    }
}

pub(crate) fn is_receita_code(code: &str) -> bool {
    code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
}

/// Revenue code implied by the invoice values: DIFAL first, then ST.
pub fn derive_receita(data: &ExtractedInvoiceData) -> Option<&'static str> {
    if data.valor_vicms_uf_dest > Decimal::ZERO {
        Some(RECEITA_DIFAL)
    } else if data.valor_vst > Decimal::ZERO {
        Some(RECEITA_ST_OPERACAO)
    } else {
        None
    }
}

/// Principal/FCP/total for the given revenue code.
pub fn compute_amounts(data: &ExtractedInvoiceData, receita: Option<&str>) -> GuideAmounts {
    let principal = match receita {
        Some(RECEITA_DIFAL) => data.valor_vicms_uf_dest,
        Some(RECEITA_ST_OPERACAO | RECEITA_ST_APURACAO) => data.valor_vst,
        _ => data.valor_vst + data.valor_vicms_uf_dest,
    };
    let fcp = data.valor_vfcp_uf_dest + data.valor_vfcpst;
    GuideAmounts {
        principal,
        fcp,
        total: principal + fcp,
    }
}

/// Decide whether `data` needs a GNRE.
///
/// - same issuer and destination state: not required;
/// - destination without web-service integration (SP, ES): manual when the
///   guide value is positive, otherwise not required;
/// - any other interstate operation: required.
///
/// `revenue_override` (6 digits; anything else is ignored) replaces the
/// derived revenue code in the returned decision but never changes `status`.
pub fn evaluate(data: &ExtractedInvoiceData, revenue_override: Option<&str>) -> NeedDecision {
    let derived = derive_receita(data);
    let override_code = revenue_override
        .map(str::trim)
        .filter(|r| is_receita_code(r));

    let status = if data.uf_emitente == data.uf_destinatario {
        NeedStatus::NotRequired
    } else if data.uf_destinatario.requires_manual_issuance() {
        if compute_amounts(data, derived).total > Decimal::ZERO {
            NeedStatus::ManualRequired
        } else {
            NeedStatus::NotRequired
        }
    } else {
        NeedStatus::Required
    };

    let effective = override_code.or(derived);
    NeedDecision {
        status,
        uf_favorecida: data.uf_destinatario.clone(),
        receita: match status {
            NeedStatus::ManualRequired => None,
            _ => effective.map(str::to_string),
        },
        valores: compute_amounts(data, effective),
    }
}
