use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::MprovError;

// ── CommandLog ───────────────────────────────────────────

/// Append-only log of launch command invocations and their raw output.
///
/// Each `append` opens the file, writes one line, and closes it again, so
/// a line is on disk before the process can be torn down abruptly. The
/// file is created on first write and never rotated or truncated.
pub struct CommandLog {
    path: PathBuf,
}

impl CommandLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one `<command vector>: <raw output>` line.
    pub fn append(&self, command: &[String], output: &str) -> Result<(), MprovError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| MprovError::Io {
                context: format!("opening command log {}", self.path.display()),
                source,
            })?;

        writeln!(file, "{}: {}", render_command(command), output.trim_end()).map_err(|source| {
            MprovError::Io {
                context: format!("appending to command log {}", self.path.display()),
                source,
            }
        })
    }
}

/// Render a command vector as a list literal, e.g.
/// `["multipass", "launch", "--name", "dev1"]`.
pub fn render_command(command: &[String]) -> String {
    let quoted: Vec<String> = command.iter().map(|arg| format!("{arg:?}")).collect();
    format!("[{}]", quoted.join(", "))
}
