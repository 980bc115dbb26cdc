use anyhow::{bail, Context, Result};
use tokio::process::Command;

use super::Announcer;

/// Speaks through an external engine (`espeak`, `say`, `spd-say` ...).
///
/// Each call spawns a fresh process and waits for it, so no engine state
/// survives between announcements and a crashed call leaves nothing behind.
#[derive(Debug, Clone)]
pub struct CommandAnnouncer {
    program: String,
    args: Vec<String>,
}

impl CommandAnnouncer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `"espeak -s 150"` -> program `espeak`, args `["-s", "150"]`.
    pub fn from_command_line(line: &str) -> Self {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "espeak".to_string());
        Self::new(program, parts.collect())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait::async_trait]
impl Announcer for CommandAnnouncer {
    async fn speak(&self, text: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .kill_on_drop(true)
            .status()
            .await
            .with_context(|| format!("spawning {}", self.program))?;

        if !status.success() {
            bail!("{} exited with {status}", self.program);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
