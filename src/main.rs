use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;

use saml_cert_expiry::common::{MetadataResult, ROLE_ALL};
use saml_cert_expiry::fetcher::Fetcher;
use saml_cert_expiry::inspection::inspect;
use saml_cert_expiry::logging::{configure_logger, Verbosity};

#[derive(Parser)]
#[command(
    name = "saml-cert-expiry",
    about = "Reports the expiration of certificates embedded in SAML metadata",
    after_help = "EXAMPLES:\n\
                  \n  saml-cert-expiry --url https://idp.example.org/metadata\
                  \n  saml-cert-expiry --url metadata.xml --type signing\
                  \n  saml-cert-expiry --url metadata.xml --log check.log --verbose debug"
)]
struct Cli {
    /// Metadata URL or local file
    #[arg(short, long)]
    url: String,
    /// Certificate role to report, or "all"
    #[arg(short = 't', long = "type", default_value = ROLE_ALL)]
    cert_type: String,
    /// Log file, appended to
    #[arg(short, long)]
    log: Option<PathBuf>,
    /// Log verbosity
    #[arg(short, long, value_enum)]
    verbose: Option<Verbosity>,
}

fn run(cli: &Cli) -> MetadataResult<bool> {
    let tree = Fetcher::new(&cli.url).retrieve_tree()?;
    let reports = inspect(&tree, &cli.cert_type, Utc::now())?;
    let mut all_ok = true;
    for report in reports {
        match report.outcome {
            Ok((expiration_days, record)) => {
                println!("Type: {}", report.role);
                println!("Expiration Days: {expiration_days}");
                println!("{record}");
                println!();
            }
            Err(e) => {
                log::error!("Certificate of type {}: {e}", report.role);
                eprintln!("Certificate of type {}: {e}", report.role);
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = configure_logger(cli.log.as_deref(), cli.verbose) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
