use crate::confirm::{ShellOutput, ShellRunner};
use anyhow::{Context, Result};
use std::process::{Command, Stdio};

/// Runs accepted commands through the user's shell (`<shell> -c <command>`),
/// capturing output rather than inheriting the terminal.
pub struct SystemShell {
    shell: String,
}

impl SystemShell {
    pub fn new(shell: String) -> Self {
        Self { shell }
    }
}

impl ShellRunner for SystemShell {
    fn run(&self, command: &str) -> Result<ShellOutput> {
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("Failed to execute command '{command}'"))?;

        Ok(ShellOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            exit_code: output.status.code(),
        })
    }
}
