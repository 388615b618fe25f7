use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use cryptoservice::CryptoServiceClient;
use cryptoservice::config::{ClientConfig, load_config};
use tracing_subscriber::EnvFilter;

/// Runs keygen → encrypt → decrypt → sign → verify against a cryptoservice server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base URL of the service, e.g. http://127.0.0.1:8080
    #[arg(long)]
    server_url: Option<String>,
    /// Key strength class passed to /keygen
    #[arg(long)]
    strength: Option<u32>,
    /// Plaintext to encrypt and sign
    #[arg(long)]
    message: Option<String>,
}

impl Args {
    /// Flags win over the config file
    fn apply(self, config: &mut ClientConfig) {
        if let Some(url) = self.server_url {
            config.server_url = url;
        }
        if let Some(strength) = self.strength {
            config.strength = strength;
        }
        if let Some(message) = self.message {
            config.message = message;
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match load_config(args.config.as_deref()) {
        Ok(config) => config.client,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut config);

    let report = match CryptoServiceClient::from_config(&config)
        .and_then(|client| client.run(config.strength, &config.message))
    {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Run against {} aborted: {}", config.server_url, e);
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Public key: {}, private key: {}",
        report.keys.public_key, report.keys.private_key
    );
    println!("\"{}\" encrypted: \"{}\"", config.message, report.ciphertext);
    println!("\"{}\" decrypted: \"{}\"", report.ciphertext, report.decrypted);
    println!("\"{}\" signed: \"{}\"", config.message, report.signature);
    println!("Signature verified: {}", report.verified);

    if report.verified {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
