//! Issue the GNRE of one NF-e against the test environment.
//!
//! ```text
//! cargo run --example emitir_guia -- nota.xml empresa.pfx senha 2024-07-10
//! ```

use std::thread::sleep;
use std::time::Duration;

use chrono::NaiveDate;
use gnre::lote::LoteBuilder;
use gnre::soap::{CertificateBundle, GnreClient, HttpTransport, TransportConfig};
use gnre::{Environment, GnreError, GnreResult, NeedStatus, evaluate, nfe};

const TENTATIVAS: u32 = 10;

fn main() -> GnreResult<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 5 {
        eprintln!("uso: {} <nfe.xml> <certificado.pfx> <senha> <vencimento AAAA-MM-DD>", args[0]);
        std::process::exit(2);
    }

    let xml = std::fs::read(&args[1])
        .map_err(|e| GnreError::Config(format!("{}: {e}", args[1])))?;
    let vencimento = NaiveDate::parse_from_str(&args[4], "%Y-%m-%d")
        .map_err(|e| GnreError::Config(format!("vencimento: {e}")))?;

    let nota = nfe::extract_nfe(&xml)?;
    let decisao = evaluate(&nota, None);
    match decisao.status {
        NeedStatus::NotRequired => {
            println!("NF-e {}: GNRE não necessária", nota.numero_nf);
            return Ok(());
        }
        NeedStatus::ManualRequired => {
            println!(
                "NF-e {}: emitir manualmente no portal de {} (R$ {})",
                nota.numero_nf, decisao.uf_favorecida, decisao.valores.total
            );
            return Ok(());
        }
        NeedStatus::Required => {}
    }

    let lote = LoteBuilder::from_decision(&nota, &decisao, vencimento)?.build()?;
    let bundle = CertificateBundle::from_file(&args[2], args[3].as_str())?;
    let transport = HttpTransport::new(TransportConfig::default().timeout(Duration::from_secs(60)));
    let client = GnreClient::new(Environment::Teste, transport, bundle);

    let recibo = client.submit(&lote)?;
    println!("lote recebido, recibo {recibo}");

    for tentativa in 1..=TENTATIVAS {
        match client.guide(&recibo) {
            Ok(guia) => {
                println!("linha digitável: {}", guia.linha_digitavel);
                let pdf = guia.pdf_bytes()?;
                let destino = format!("gnre-{recibo}.pdf");
                std::fs::write(&destino, pdf)
                    .map_err(|e| GnreError::Config(format!("{destino}: {e}")))?;
                println!("PDF salvo em {destino}");
                return Ok(());
            }
            Err(e) if e.is_pending() => {
                println!("tentativa {tentativa}: {e}");
                sleep(Duration::from_secs(5));
            }
            Err(e) => return Err(e),
        }
    }
    Err(GnreError::Transport(format!(
        "lote {recibo} ainda em processamento após {TENTATIVAS} tentativas"
    )))
}
