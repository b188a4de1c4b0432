use std::path::Path;
use std::process::Output;

use facet::Facet;
use tokio::process::Command;

use crate::error::MprovError;
use crate::logging::{CommandLog, render_command};

// ── CLI output shapes ────────────────────────────────────

/// One VM record as reported by `multipass list --format=json`. Multipass
/// emits more fields than these; extras are ignored, listed fields default
/// to empty when absent (a stopped VM reports an empty `ipv4` list).
#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct VmRecord {
    #[facet(default)]
    pub name: String,
    #[facet(default)]
    pub ipv4: Vec<String>,
    #[facet(default)]
    pub release: String,
    #[facet(default)]
    pub state: String,
}

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct VmList {
    #[facet(default)]
    pub list: Vec<VmRecord>,
}

/// Arguments for one `multipass launch` invocation. Sizing values are the
/// request's strings, passed through verbatim.
pub struct LaunchSpec<'a> {
    pub name: &'a str,
    pub cpus: &'a str,
    pub disk: &'a str,
    pub memory: &'a str,
    pub cloud_init: &'a Path,
    pub image: &'a str,
}

// ── Multipass wrapper ────────────────────────────────────

/// Shells out to the multipass binary. The binary path is configurable,
/// which is also the seam the end-to-end tests inject a fake through.
pub struct Multipass {
    bin: String,
    launch_timeout_s: u64,
    log: CommandLog,
}

impl Multipass {
    pub fn new(bin: impl Into<String>, launch_timeout_s: u64, log: CommandLog) -> Self {
        Self {
            bin: bin.into(),
            launch_timeout_s,
            log,
        }
    }

    /// `multipass list --format=json`, parsed into typed records.
    pub async fn list(&self) -> Result<Vec<VmRecord>, MprovError> {
        let command = self.command_vector(&["list", "--format=json"]);
        let output = self.run(&command).await?;
        check_status(&command, &output)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed: VmList =
            facet_json::from_str(&stdout).map_err(|e| MprovError::MalformedOutput {
                command: render_command(&command),
                message: e.to_string(),
            })?;

        tracing::debug!(count = parsed.list.len(), "listed VMs");
        Ok(parsed.list)
    }

    /// `multipass launch ...` for one VM. Every attempt, success or
    /// failure, appends the command vector and raw output to the command
    /// log before the result is reported.
    pub async fn launch(&self, spec: &LaunchSpec<'_>) -> Result<(), MprovError> {
        let timeout = self.launch_timeout_s.to_string();
        let cloud_init = spec.cloud_init.display().to_string();
        let command = self.command_vector(&[
            "launch",
            "--name",
            spec.name,
            "--cpus",
            spec.cpus,
            "--disk",
            spec.disk,
            "--memory",
            spec.memory,
            "--timeout",
            &timeout,
            "--cloud-init",
            &cloud_init,
            spec.image,
        ]);

        tracing::info!(name = spec.name, image = spec.image, "launching VM");
        let output = self.run(&command).await?;

        if output.status.success() {
            self.log
                .append(&command, &String::from_utf8_lossy(&output.stdout))?;
            Ok(())
        } else {
            self.log
                .append(&command, &String::from_utf8_lossy(&output.stderr))?;
            Err(command_failed(&command, &output))
        }
    }

    fn command_vector(&self, args: &[&str]) -> Vec<String> {
        let mut command = Vec::with_capacity(args.len() + 1);
        command.push(self.bin.clone());
        command.extend(args.iter().map(|s| s.to_string()));
        command
    }

    async fn run(&self, command: &[String]) -> Result<Output, MprovError> {
        Command::new(&command[0])
            .args(&command[1..])
            .output()
            .await
            .map_err(|source| MprovError::CommandSpawn {
                command: render_command(command),
                source,
            })
    }
}

fn check_status(command: &[String], output: &Output) -> Result<(), MprovError> {
    if output.status.success() {
        return Ok(());
    }
    Err(command_failed(command, output))
}

fn command_failed(command: &[String], output: &Output) -> MprovError {
    MprovError::CommandFailed {
        command: render_command(command),
        status: match output.status.code() {
            Some(code) => format!("status {code}"),
            None => "signal".to_string(),
        },
        stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
    }
}
