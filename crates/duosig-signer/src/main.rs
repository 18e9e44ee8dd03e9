//! duosig signer: signs a transaction spending two-party cooperative
//! addresses and prints the result as JSON.
//!
//! # Usage
//!
//! ```bash
//! duosig-signer --request request.json
//! duosig-signer --request request.json --config duosig.toml
//! duosig-signer --request request.json --validate   # check inputs, don't sign
//! ```
//!
//! Environment variables `DUOSIG_LOG_LEVEL`, `DUOSIG_MAX_WORKERS` and
//! `DUOSIG_NETWORK` override the config file.

mod config;
mod request;

use anyhow::{Context, Result};
use clap::Parser;
use duosig_sign::SignOptions;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "duosig-signer", version, about = "Sign a duosig transaction")]
struct Cli {
    /// JSON signing request
    #[arg(short, long)]
    request: PathBuf,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate config and request, then exit without signing
    #[arg(long)]
    validate: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut signer_config = match &cli.config {
        Some(path) => config::SignerConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => config::SignerConfig::default(),
    };
    signer_config.apply_env_overrides();
    signer_config
        .validate()
        .context("Configuration validation failed")?;

    // Logs go to stderr, stdout carries the JSON result
    env_logger::Builder::new()
        .parse_filters(&signer_config.signer.log_level)
        .init();

    let network = signer_config.network()?;
    let sign_request = request::SignRequest::from_file(&cli.request)
        .with_context(|| format!("Failed to load request from {}", cli.request.display()))?;

    if cli.validate {
        let pst = sign_request.prepare(network)?;
        sign_request.user_key.master().context("Bad user key")?;
        sign_request.service_key.master().context("Bad service key")?;
        println!("Request is valid.");
        println!("  Network:     {}", network);
        println!("  Inputs:      {}", pst.transaction().input.len());
        println!("  Descriptors: {}", pst.input_count());
        println!("  Outputs:     {}", pst.transaction().output.len());
        return Ok(());
    }

    let options = SignOptions {
        max_workers: signer_config.signer.max_workers,
    };
    let response = sign_request.sign(network, &options)?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
