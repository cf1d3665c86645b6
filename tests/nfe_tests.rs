use chrono::NaiveDate;
use gnre::nfe::{extract_nfe, from_nfe_xml};
use gnre::*;
use rust_decimal_macros::dec;

const DIFAL: &str = include_str!("fixtures/nfe_difal.xml");
const ST_310: &str = include_str!("fixtures/nfe_st_310.xml");

#[test]
fn nfe_proc_layout_400() {
    let data = extract_nfe(DIFAL.as_bytes()).unwrap();
    assert_eq!(data.chave_nfe, "31240611222333000181550010000045671000045678");
    assert_eq!(data.numero_nf, "4567");
    assert_eq!(data.data_emissao, NaiveDate::from_ymd_opt(2024, 6, 20).unwrap());
    assert_eq!(data.uf_emitente, "MG");
    assert_eq!(data.uf_destinatario, "RJ");
    assert_eq!(
        data.emitente_nome.as_deref(),
        Some("Industria Mineira de Utilidades Ltda")
    );
    assert_eq!(data.emitente_endereco.as_deref(), Some("Avenida do Contorno, 1500"));
    assert_eq!(data.emitente_cod_mun.as_deref(), Some("3106200"));
    assert_eq!(data.destinatario_nome.as_deref(), Some("Maria da Silva Souza"));
    assert_eq!(data.valor_vicms_uf_dest, dec!(22.83));
    assert_eq!(data.valor_vfcp_uf_dest, dec!(7.61));
    assert_eq!(data.valor_vst, dec!(0));
}

#[test]
fn bare_nfe_layout_310() {
    let data = from_nfe_xml(ST_310).unwrap();
    assert_eq!(data.chave_nfe, "42150182373077000171550010000009871000009875");
    assert_eq!(data.uf_emitente, "SC");
    assert_eq!(data.uf_destinatario, "PR");
    assert_eq!(data.emitente_ie, None);
    assert_eq!(
        data.destinatario_documento,
        Some(Documento::Cnpj("76535764000143".into()))
    );
    assert_eq!(data.valor_vst, dec!(120.40));
    // Absent totals default to zero.
    assert_eq!(data.valor_vfcpst, dec!(0));
}

#[test]
fn legacy_issue_date_tag() {
    let xml = ST_310.replace(
        "<dhEmi>2015-01-12T09:00:00-02:00</dhEmi>",
        "<dEmi>2015-01-12</dEmi>",
    );
    let data = from_nfe_xml(&xml).unwrap();
    assert_eq!(data.data_emissao, NaiveDate::from_ymd_opt(2015, 1, 12).unwrap());
}

#[test]
fn access_key_falls_back_to_protocol() {
    let xml = DIFAL.replace(
        r#"Id="NFe31240611222333000181550010000045671000045678""#,
        "",
    );
    let data = from_nfe_xml(&xml).unwrap();
    assert_eq!(data.chave_nfe, "31240611222333000181550010000045671000045678");
}

#[test]
fn short_access_key_rejected() {
    let xml = ST_310.replace("NFe42150182373077000171550010000009871000009875", "NFe4215");
    let err = from_nfe_xml(&xml).unwrap_err();
    assert!(matches!(err, GnreError::Parse(_)));
    assert!(err.to_string().contains("44 digits"));
}

#[test]
fn missing_issuer_is_reported() {
    let xml = ST_310.replace("<CNPJ>82373077000171</CNPJ>", "");
    let err = from_nfe_xml(&xml).unwrap_err();
    assert!(err.to_string().contains("emit/CNPJ"));
}

#[test]
fn not_xml() {
    assert!(matches!(
        extract_nfe(b"\xff\xfe garbage"),
        Err(GnreError::Parse(_))
    ));
    assert!(matches!(from_nfe_xml("<NFe><infNFe>"), Err(GnreError::Parse(_))));
    assert!(matches!(from_nfe_xml(""), Err(GnreError::Parse(_))));
}

#[test]
fn unknown_state_rejected() {
    let xml = ST_310.replace("<UF>PR</UF>", "<UF>XX</UF>");
    assert!(matches!(from_nfe_xml(&xml), Err(GnreError::Parse(_))));
}

#[test]
fn markup_like_free_text_is_plain_text() {
    let xml = DIFAL.replace(
        "</total>",
        "</total><infAdic><infCpl>&lt;&lt; DOCUMENTO SEM VALOR FISCAL &gt;&gt;</infCpl></infAdic>",
    );
    let data = from_nfe_xml(&xml).unwrap();
    assert_eq!(data.valor_vicms_uf_dest, dec!(22.83));
}

#[test]
fn escaped_totals_in_free_text_are_ignored() {
    let xml = DIFAL.replace(
        "</total>",
        "</total><infAdic><infCpl>&lt;ICMSTot&gt;&lt;vICMSUFDest&gt;9999.00&lt;/vICMSUFDest&gt;&lt;/ICMSTot&gt;</infCpl></infAdic>",
    );
    let data = from_nfe_xml(&xml).unwrap();
    assert_eq!(data.valor_vicms_uf_dest, dec!(22.83));
    assert_eq!(evaluate(&data, None).valores.principal, dec!(22.83));
}
