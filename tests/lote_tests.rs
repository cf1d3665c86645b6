use chrono::NaiveDate;
use gnre::lote::{
    ConsultaGuia, ConsultaResultadoOptions, LoteBuilder, build_consulta_config_uf_xml,
    build_consulta_resultado_xml, build_lote_consulta_xml, build_lote_xml,
};
use gnre::nfe::from_nfe_xml;
use gnre::*;
use rust_decimal_macros::dec;

const DIFAL: &str = include_str!("fixtures/nfe_difal.xml");
const ST_310: &str = include_str!("fixtures/nfe_st_310.xml");

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn position(xml: &str, needle: &str) -> usize {
    xml.find(needle)
        .unwrap_or_else(|| panic!("'{needle}' not found in {xml}"))
}

#[test]
fn difal_lot_from_decision() {
    let nota = from_nfe_xml(DIFAL).unwrap();
    let decision = evaluate(&nota, None);
    assert_eq!(decision.status, NeedStatus::Required);

    let lote = LoteBuilder::from_decision(&nota, &decision, date(2024, 7, 10))
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(lote.uf_favorecida, "RJ");
    assert_eq!(lote.receita, "100102");
    assert_eq!(lote.valor_total, dec!(30.44));

    let xml = lote.as_str();
    assert!(xml.starts_with(
        r#"<TLote_GNRE xmlns="http://www.gnre.pe.gov.br" versao="2.00"><guias><TDadosGNRE versao="2.00"><ufFavorecida>RJ</ufFavorecida><tipoGnre>0</tipoGnre>"#
    ));
    assert!(xml.contains(
        "<contribuinteEmitente><identificacao><CNPJ>11222333000181</CNPJ></identificacao>"
    ));
    assert!(xml.contains("<municipio>06200</municipio><uf>MG</uf><cep>30110000</cep>"));
    assert!(xml.contains(r#"<documentoOrigem tipo="10">4567</documentoOrigem>"#));
    assert!(xml.contains("<referencia><periodo>0</periodo><mes>07</mes><ano>2024</ano></referencia>"));
    assert!(xml.contains("<dataVencimento>2024-07-10</dataVencimento>"));
    assert!(xml.contains(r#"<valor tipo="11">22.83</valor><valor tipo="21">30.44</valor><valor tipo="27">7.61</valor>"#));
    assert!(xml.contains("<contribuinteDestinatario><identificacao><CPF>12345678909</CPF></identificacao><razaoSocial>Maria da Silva Souza</razaoSocial><municipio>04557</municipio></contribuinteDestinatario>"));
    assert!(xml.contains(
        "<campoExtra><codigo>107</codigo><valor>31240611222333000181550010000045671000045678</valor></campoExtra>"
    ));
    assert!(xml.ends_with("</itensGNRE><valorGNRE>30.44</valorGNRE></TDadosGNRE></guias></TLote_GNRE>"));
}

#[test]
fn item_elements_in_schema_order() {
    let nota = from_nfe_xml(DIFAL).unwrap();
    let xml = LoteBuilder::new(&nota, date(2024, 7, 10))
        .detalhamento_receita("000055")
        .produto("89")
        .data_pagamento(date(2024, 7, 5))
        .build()
        .unwrap()
        .xml;

    let order = [
        "<ufFavorecida>",
        "<contribuinteEmitente>",
        "<receita>",
        "<detalhamentoReceita>",
        "<documentoOrigem",
        "<produto>",
        "<referencia>",
        "<dataVencimento>",
        r#"<valor tipo="11">"#,
        "<contribuinteDestinatario>",
        "<camposExtras>",
        "<valorGNRE>",
        "<dataPagamento>2024-07-05</dataPagamento>",
    ];
    let positions: Vec<usize> = order.iter().map(|n| position(&xml, n)).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{xml}");
}

#[test]
fn st_lot_uses_st_revenue() {
    let nota = from_nfe_xml(ST_310).unwrap();
    let lote = build_lote_xml(&nota, None, None, date(2015, 2, 9), None).unwrap();
    assert_eq!(lote.receita, "100099");
    assert_eq!(lote.valor_total, dec!(120.40));
    assert!(lote.xml.contains(r#"<valor tipo="11">120.40</valor>"#));
    assert!(!lote.xml.contains(r#"tipo="27""#));
    assert!(lote.xml.contains("<ufFavorecida>PR</ufFavorecida>"));
}

#[test]
fn explicit_revenue_and_state() {
    let nota = from_nfe_xml(ST_310).unwrap();
    let lote = build_lote_xml(&nota, Some("sc"), Some("100048"), date(2015, 2, 9), None).unwrap();
    assert_eq!(lote.uf_favorecida, "SC");
    assert!(lote.xml.contains("<receita>100048</receita>"));
}

#[test]
fn invalid_inputs() {
    let nota = from_nfe_xml(DIFAL).unwrap();
    let venc = date(2024, 7, 10);

    let err = build_lote_xml(&nota, Some("ZZ"), None, venc, None).unwrap_err();
    assert!(matches!(err, GnreError::Build(_)));

    let err = build_lote_xml(&nota, Some("EX"), None, venc, None).unwrap_err();
    assert!(matches!(err, GnreError::Build(_)));

    let err = build_lote_xml(&nota, None, Some("12"), venc, None).unwrap_err();
    assert!(matches!(err, GnreError::Build(_)));

    let mut sem_valores = nota.clone();
    sem_valores.valor_vicms_uf_dest = dec!(0);
    sem_valores.valor_vfcp_uf_dest = dec!(0);
    let err = build_lote_xml(&sem_valores, None, None, venc, None).unwrap_err();
    assert!(err.to_string().contains("receita"));
}

#[test]
fn decision_must_be_required() {
    let mut nota = from_nfe_xml(DIFAL).unwrap();
    nota.uf_destinatario = Uf::parse("MG").unwrap();
    let decision = evaluate(&nota, None);
    assert_eq!(decision.status, NeedStatus::NotRequired);
    assert!(matches!(
        LoteBuilder::from_decision(&nota, &decision, date(2024, 7, 10)),
        Err(GnreError::Build(_))
    ));
}

#[test]
fn query_payloads() {
    let xml = build_consulta_resultado_xml(
        Environment::Producao,
        &Receipt::new("123456"),
        ConsultaResultadoOptions::default(),
    )
    .unwrap();
    assert!(xml.contains("<ambiente>1</ambiente><numeroRecibo>123456</numeroRecibo>"));

    let xml = build_lote_consulta_xml(&ConsultaGuia {
        uf: "RJ".into(),
        tipo_consulta: "N".into(),
        num_controle: Some("1234567890123456".into()),
        ..Default::default()
    })
    .unwrap();
    assert!(xml.starts_with(r#"<TLote_ConsultaGNRE xmlns="http://www.gnre.pe.gov.br" versao="2.00">"#));
    assert!(xml.contains("<numControle>1234567890123456</numControle><tipoConsulta>N</tipoConsulta>"));

    let xml = build_consulta_config_uf_xml(Environment::Teste, "RJ", None, None).unwrap();
    assert_eq!(
        xml,
        r#"<TConsultaConfigUf xmlns="http://www.gnre.pe.gov.br"><ambiente>2</ambiente><uf>RJ</uf></TConsultaConfigUf>"#
    );
    assert!(build_consulta_config_uf_xml(Environment::Teste, "XX", None, None).is_err());
}
