//! One-shot external script invocation shared by the subprocess adapters.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;

const STDERR_LIMIT: usize = 512;

#[derive(Debug)]
pub enum ScriptFailure {
    Spawn(std::io::Error),
    Exit { status: String, stderr: String },
}

/// `<program> <script> <args...>`. The child is killed if the caller drops
/// the future, so a gateway deadline also bounds the process lifetime.
#[derive(Debug, Clone)]
pub struct Script {
    program: String,
    path: PathBuf,
}

impl Script {
    pub fn new(program: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            path: path.into(),
        }
    }

    /// Run to completion and return stdout; a non-zero exit carries the
    /// first 512 characters of stderr.
    pub async fn run<I, S>(&self, args: I) -> Result<Vec<u8>, ScriptFailure>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.program)
            .arg(&self.path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(ScriptFailure::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScriptFailure::Exit {
                status: output.status.to_string(),
                stderr: stderr.chars().take(STDERR_LIMIT).collect(),
            });
        }
        Ok(output.stdout)
    }
}
