//! Property-based tests for the GNRE need decision.

use chrono::NaiveDate;
use gnre::core::need::{RECEITA_DIFAL, RECEITA_ST_OPERACAO};
use gnre::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const STATES: &[&str] = &[
    "AC", "AL", "AM", "AP", "BA", "CE", "DF", "ES", "GO", "MA", "MG", "MS", "MT", "PA", "PB", "PE",
    "PI", "PR", "RJ", "RN", "RO", "RR", "RS", "SC", "SE", "SP", "TO",
];

const MANUAL: &[&str] = &["SP", "ES"];

fn invoice(emit: &str, dest: &str) -> ExtractedInvoiceData {
    ExtractedInvoiceData {
        chave_nfe: "3".repeat(44),
        numero_nf: "10".into(),
        data_emissao: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        uf_emitente: Uf::parse(emit).unwrap(),
        uf_destinatario: Uf::parse(dest).unwrap(),
        emitente_documento: Documento::Cnpj("11222333000181".into()),
        emitente_ie: None,
        emitente_nome: None,
        emitente_endereco: None,
        emitente_cod_mun: None,
        emitente_cep: None,
        emitente_telefone: None,
        destinatario_documento: None,
        destinatario_nome: None,
        destinatario_cod_mun: None,
        valor_vst: Decimal::ZERO,
        valor_vicms_uf_dest: Decimal::ZERO,
        valor_vfcp_uf_dest: Decimal::ZERO,
        valor_vfcpst: Decimal::ZERO,
    }
}

fn state() -> impl Strategy<Value = &'static str> {
    prop::sample::select(STATES)
}

fn cents() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|c| Decimal::new(c, 2))
}

fn values() -> impl Strategy<Value = [Decimal; 4]> {
    prop::array::uniform4(cents())
}

fn with_values(mut data: ExtractedInvoiceData, v: [Decimal; 4]) -> ExtractedInvoiceData {
    data.valor_vst = v[0];
    data.valor_vicms_uf_dest = v[1];
    data.valor_vfcp_uf_dest = v[2];
    data.valor_vfcpst = v[3];
    data
}

proptest! {
    #[test]
    fn same_state_never_requires(uf in state(), v in values()) {
        let d = evaluate(&with_values(invoice(uf, uf), v), None);
        prop_assert_eq!(d.status, NeedStatus::NotRequired);
    }

    #[test]
    fn manual_states_depend_on_value(
        emit in state(),
        dest in prop::sample::select(MANUAL),
        v in values(),
    ) {
        prop_assume!(emit != dest);
        let data = with_values(invoice(emit, dest), v);
        let d = evaluate(&data, None);
        if d.valores.total.is_zero() {
            prop_assert_eq!(d.status, NeedStatus::NotRequired);
        } else {
            prop_assert_eq!(d.status, NeedStatus::ManualRequired);
            prop_assert!(d.receita.is_none());
        }
    }

    #[test]
    fn other_interstate_always_required(
        emit in state(),
        dest in state(),
        v in values(),
    ) {
        prop_assume!(emit != dest && dest != "SP" && dest != "ES");
        let d = evaluate(&with_values(invoice(emit, dest), v), None);
        prop_assert_eq!(d.status, NeedStatus::Required);
        prop_assert_eq!(d.uf_favorecida.as_str(), dest);
    }

    #[test]
    fn total_is_principal_plus_fcp(v in values()) {
        let d = evaluate(&with_values(invoice("MG", "BA"), v), None);
        prop_assert_eq!(d.valores.total, d.valores.principal + d.valores.fcp);
        prop_assert!(d.valores.total >= Decimal::ZERO);
    }
}

#[test]
fn export_destination_is_required() {
    let mut data = invoice("PR", "RS");
    data.uf_destinatario = Uf::parse("EX").unwrap();
    assert_eq!(evaluate(&data, None).status, NeedStatus::Required);
}

#[test]
fn interstate_without_values_is_still_required() {
    let d = evaluate(&invoice("GO", "BA"), None);
    assert_eq!(d.status, NeedStatus::Required);
    assert!(d.receita.is_none());
    assert_eq!(d.valores.total, dec!(0));
}

#[test]
fn receita_follows_invoice_values() {
    let mut data = invoice("SC", "MG");
    data.valor_vicms_uf_dest = dec!(12.34);
    assert_eq!(evaluate(&data, None).receita.as_deref(), Some(RECEITA_DIFAL));

    let mut data = invoice("SC", "MG");
    data.valor_vst = dec!(3);
    assert_eq!(evaluate(&data, None).receita.as_deref(), Some(RECEITA_ST_OPERACAO));
}

#[test]
fn manual_with_zero_value_is_not_required() {
    assert_eq!(evaluate(&invoice("MG", "SP"), None).status, NeedStatus::NotRequired);
}
