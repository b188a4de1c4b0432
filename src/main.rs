use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use mprov::cli::{Cli, Command};
use mprov::config;
use mprov::error::MprovError;
use mprov::logging::CommandLog;
use mprov::multipass::Multipass;
use mprov::provision;
use mprov::request::{ProvisionRequest, VmDescriptor};

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // All diagnostics go to stderr; stdout carries exactly one JSON line.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
            .add_directive("mprov=info".parse().expect("valid log directive"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let config = config::load_config(cli.config.as_deref())?;
    let log = CommandLog::new(config.log_path());
    let multipass = Multipass::new(config.multipass_bin.clone(), config.launch_timeout_s, log);

    let descriptor = match cli.command {
        Command::Provision => {
            let request = read_request().await?;
            provision::provision(&multipass, &config, &request).await?
        }
        Command::Find { name } => provision::find(&multipass, &name).await?,
    };

    println!("{}", render_output(descriptor.as_ref()));
    Ok(())
}

/// Read the request document from stdin (consumed once, to EOF).
async fn read_request() -> Result<ProvisionRequest, MprovError> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .map_err(|source| MprovError::RequestRead { source })?;
    ProvisionRequest::from_json(&input)
}

fn render_output(descriptor: Option<&VmDescriptor>) -> String {
    match descriptor {
        Some(d) => d.to_json(),
        None => "null".to_string(),
    }
}
