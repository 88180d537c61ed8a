//! Invocation executor
//!
//! Validates an invocation, launches the tool directly (no shell), waits
//! for it and checks that every declared output exists afterwards. Relative
//! paths resolve against the executor's working directory, which is also
//! the child's working directory.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use wait_timeout::ChildExt;

use crate::commands::RECON_NEONATAL_CORTEX;
use crate::config::ToolConfig;
use crate::error::WbError;
use crate::invocation::{resolve, Invocation};
use crate::recon_config;
use crate::render::RenderedCommand;
use crate::value::Value;

/// Files a finished invocation produced, plus the tool's captured output
#[derive(Debug, Clone, Default, Serialize)]
pub struct Outputs {
    pub files: BTreeMap<String, PathBuf>,
    pub stdout: String,
    pub stderr: String,
}

impl Outputs {
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.files.get(name).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }
}

/// Runs invocations as child processes
#[derive(Debug, Clone)]
pub struct Executor {
    /// Program name to executable path
    programs: BTreeMap<String, String>,
    working_dir: PathBuf,
    timeout: Option<Duration>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    /// Executor with no overrides, running in the current directory with
    /// no timeout
    pub fn new() -> Self {
        Self {
            programs: BTreeMap::new(),
            working_dir: PathBuf::from("."),
            timeout: None,
        }
    }

    pub fn from_config(config: &ToolConfig) -> Self {
        Self {
            programs: config.programs.clone(),
            working_dir: config
                .working_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
            timeout: config.timeout(),
        }
    }

    /// Run `path` wherever a command's prefix names `program`
    pub fn with_program(mut self, program: impl Into<String>, path: impl Into<String>) -> Self {
        self.programs.insert(program.into(), path.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Validate and render the command this executor would launch
    pub fn command(&self, invocation: &Invocation) -> Result<RenderedCommand, WbError> {
        invocation.validate_in(&self.working_dir)?;
        let mut rendered = invocation.assemble()?;
        if let Some(path) = self.programs.get(&rendered.program) {
            rendered.program = path.clone();
        }
        Ok(rendered)
    }

    /// Write any setup files a command needs before launch.
    ///
    /// Only `recon-neonatal-cortex` has one: its configuration file, written
    /// into the working directory when `config` is unset.
    pub fn prepare(&self, invocation: &mut Invocation) -> Result<(), WbError> {
        if std::ptr::eq(invocation.spec(), &RECON_NEONATAL_CORTEX) {
            if let Some(path) = recon_config::prepare(invocation, &self.working_dir)? {
                info!(config = %path.display(), "generated reconstruction config");
            }
        }
        Ok(())
    }

    /// Validate, run and check the outputs of one invocation.
    ///
    /// Nothing is launched when validation fails. With a timeout, the
    /// deadline covers both the tool's exit and the closing of its output
    /// pipes, so a background process still holding them cannot stall the
    /// caller.
    #[instrument(skip(self, invocation), fields(command = invocation.spec().name))]
    pub fn run(&self, invocation: &Invocation) -> Result<Outputs, WbError> {
        let rendered = self.command(invocation)?;
        info!(command = %rendered, "launching");

        let started = Instant::now();
        let mut child = Command::new(&rendered.program)
            .args(&rendered.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| WbError::Spawn {
                program: rendered.program.clone(),
                source,
            })?;

        // Drain both pipes while waiting so a chatty tool cannot block
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            Some(limit) => match child.wait_timeout(limit)? {
                Some(status) => status,
                None => {
                    let _ = child.kill();
                    let _ = child.wait(); // Reap the zombie
                    return Err(WbError::Timeout {
                        program: rendered.program,
                        limit,
                    });
                }
            },
            None => child.wait()?,
        };

        let deadline = self.timeout.map(|limit| started + limit);
        let (Some(stdout), Some(stderr)) = (collect(&stdout, deadline), collect(&stderr, deadline))
        else {
            warn!(program = %rendered.program, "output pipes still open at deadline");
            return Err(WbError::Timeout {
                program: rendered.program,
                limit: self.timeout.unwrap_or_default(),
            });
        };
        info!(%status, stdout_len = stdout.len(), stderr_len = stderr.len(), "exited");

        if !status.success() {
            warn!(program = %rendered.program, %status, "tool failed");
            return Err(WbError::Execution {
                program: rendered.program,
                status: describe(status),
                diagnostics: diagnostics(&stdout, &stderr),
            });
        }

        let mut files = BTreeMap::new();
        for output in invocation.spec().outputs {
            let path = invocation
                .effective(output.source)
                .and_then(|value| match value.as_ref() {
                    Value::Text(text) => Some(resolve(&self.working_dir, text)),
                    _ => None,
                })
                .unwrap_or_default();
            if path.as_os_str().is_empty() || !path.exists() {
                return Err(WbError::Postcondition {
                    output: output.name.to_string(),
                    path,
                });
            }
            debug!(output = output.name, path = %path.display(), "output present");
            files.insert(output.name.to_string(), path);
        }

        Ok(Outputs {
            files,
            stdout,
            stderr,
        })
    }
}

/// Read a pipe to its end on a helper thread
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    match pipe {
        Some(mut pipe) => {
            thread::spawn(move || {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf).ok();
                let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
            });
        }
        None => {
            let _ = tx.send(String::new());
        }
    }
    rx
}

/// Drained text, or `None` when the deadline passes first
fn collect(rx: &Receiver<String>, deadline: Option<Instant>) -> Option<String> {
    match deadline {
        Some(deadline) => {
            match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                Ok(text) => Some(text),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => Some(String::new()),
            }
        }
        None => Some(rx.recv().unwrap_or_default()),
    }
}

fn describe(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "termination by signal".to_string(),
    }
}

/// Tool output worth showing on failure: stderr first, then stdout
fn diagnostics(stdout: &str, stderr: &str) -> String {
    let parts: Vec<&str> = [stderr.trim(), stdout.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        "(no output)".to_string()
    } else {
        parts.join("\n")
    }
}
