//! Shell line execution
//!
//! Lines run through an interpreter (`sh -c` unless configured otherwise) with
//! inherited stdio. A running child is killed once the handler's context is
//! cancelled or its deadline passes.

use crate::cli::Context;
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{interpolate, interpolate_strict};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::{Child, Command as StdCommand, Stdio};
use std::thread;
use std::time::Duration;

/// How often a running child is checked against the context
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Where and how run lines execute
#[derive(Debug, Clone)]
pub struct Shell {
    /// Interpreter and its leading args (e.g., ["bash", "-c"])
    pub interpreter: Vec<String>,

    /// Working directory for every line
    pub working_dir: PathBuf,

    /// Variables for interpolation, also exported to the child environment
    pub vars: HashMap<String, String>,

    /// Reject lines with unresolved `${var}` references
    pub strict: bool,
}

impl Shell {
    /// Create a shell with default settings
    pub fn new() -> Self {
        Shell {
            interpreter: vec!["sh".to_string(), "-c".to_string()],
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            vars: HashMap::new(),
            strict: false,
        }
    }

    /// Set the interpreter
    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Set the working directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    /// Set variables
    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = vars;
        self
    }

    /// Set strict interpolation
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set a single variable
    pub fn set_var(&mut self, key: String, value: String) {
        self.vars.insert(key, value);
    }

    /// Run each line in order, stopping at the first failure
    pub fn execute_all(&self, ctx: &Context, lines: &[String]) -> ExecutionResult<()> {
        for line in lines {
            self.execute(ctx, line)?;
        }
        Ok(())
    }

    /// Run a single line
    pub fn execute(&self, ctx: &Context, line: &str) -> ExecutionResult<()> {
        ctx.check()?;

        let exec_str = if self.strict {
            interpolate_strict(line, &self.vars)?
        } else {
            interpolate(line, &self.vars)?
        };
        let (program, leading) = self
            .interpreter
            .split_first()
            .ok_or(ExecutionError::EmptyInterpreter)?;

        info!("[RUN] {}", exec_str);

        let mut command = StdCommand::new(program);
        // Own process group, so a stop reaches whatever the line starts
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);

        let child = command
            .args(leading)
            .arg(&exec_str)
            .current_dir(&self.working_dir)
            .envs(&self.vars)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| ExecutionError::Spawn {
                program: program.clone(),
                error: e.to_string(),
            })?;

        wait(child, program, ctx)
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for the child, killing it if the context ends first
fn wait(mut child: Child, program: &str, ctx: &Context) -> ExecutionResult<()> {
    loop {
        let status = child.try_wait().map_err(|e| ExecutionError::Spawn {
            program: program.to_string(),
            error: e.to_string(),
        })?;

        if let Some(status) = status {
            debug!("'{}' exited with {}", program, status);
            if !status.success() {
                return Err(ExecutionError::CommandFailed(status.code()));
            }
            return Ok(());
        }

        if let Some(reason) = ctx.err() {
            warn!("stopping '{}': {}", program, reason);
            kill(&mut child);
            // The child may have exited in between; either way it is reaped here.
            let _ = child.wait();
            return Err(ExecutionError::Interrupted(reason));
        }

        let nap = ctx
            .remaining()
            .map_or(POLL_INTERVAL, |left| left.min(POLL_INTERVAL));
        thread::sleep(nap);
    }
}

/// Kill the child's process group, or just the child if that fails
#[cfg(unix)]
fn kill(child: &mut Child) {
    let group = format!("-{}", child.id());
    let killed = StdCommand::new("kill")
        .args(["-KILL", "--", &group])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success());
    if !killed {
        debug!("could not signal process group {}", group);
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill(child: &mut Child) {
    let _ = child.kill();
}
