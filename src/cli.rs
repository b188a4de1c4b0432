use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mprov", about = "Multipass VM provisioning over JSON stdio")]
pub struct Cli {
    /// Path to config file (defaults to mprov.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a provisioning request from stdin, create the VM if needed,
    /// and print its descriptor as JSON
    Provision,

    /// Look up a VM by name and print its descriptor as JSON (or null)
    Find {
        /// VM name to look up
        name: String,
    },
}
