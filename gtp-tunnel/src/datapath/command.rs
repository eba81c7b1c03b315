use crate::Config;
use anyhow::{Context, Result, anyhow, bail};
use async_std::{future, task};
use async_trait::async_trait;
use slog::{Logger, error, o};
use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    // Exit code, or -1 if the command was killed by a signal.
    pub status: i32,
    pub stdout: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs the OVS tools and scripts that the datapath is provisioned with.
#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    /// Run `args[0]` with the remaining arguments.  An error means the command
    /// could not be run at all; a command that ran and failed returns its status.
    async fn run(&self, args: &[String]) -> Result<CommandOutput>;
}

/// Runs commands as child processes.  Arguments are passed straight to the
/// program, never through a shell.  Each command gets its own process group,
/// which is killed as a whole if the command times out.
pub struct ProcessRunner {
    sudo: bool,
    timeout: Option<Duration>,
    logger: Logger,
}

impl ProcessRunner {
    pub fn new(sudo: bool, timeout: Option<Duration>, logger: &Logger) -> Self {
        ProcessRunner {
            sudo,
            timeout,
            logger: logger.new(o!("component" => "commands")),
        }
    }

    pub fn from_config(config: &Config, logger: &Logger) -> Self {
        Self::new(config.use_sudo, config.command_timeout(), logger)
    }

    fn kill_process_group(&self, program: &str, pgid: libc::pid_t) {
        // SAFETY: kill(2) has no memory safety requirements.  A negative pid
        // addresses the process group.
        if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
            error!(
                self.logger,
                "Failed to kill {program} process group {pgid} - {}",
                io::Error::last_os_error()
            );
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, args: &[String]) -> Result<CommandOutput> {
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| anyhow!("Empty command line"))?;
        let mut command = if self.sudo {
            let mut c = Command::new("sudo");
            c.arg(program);
            c
        } else {
            Command::new(program)
        };
        command
            .args(rest)
            .process_group(0)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = command
            .spawn()
            .with_context(|| format!("Failed to run {program}"))?;
        let pgid = child.id() as libc::pid_t;
        let wait = task::spawn_blocking(move || child.wait_with_output());

        let output = match self.timeout {
            None => wait.await,
            Some(timeout) => match future::timeout(timeout, wait).await {
                Ok(output) => output,
                Err(_) => {
                    // The blocking waiter reaps the child once its group has died
                    // and the output pipes have closed.
                    self.kill_process_group(program, pgid);
                    bail!("{program} killed after {timeout:?}");
                }
            },
        }
        .with_context(|| format!("Failed to wait for {program}"))?;

        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Render a command line for logging.
pub fn command_line(args: &[String]) -> String {
    args.join(" ")
}

pub fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|x| x.to_string()).collect()
}
