use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::platform;

/// Exit status `ssh` itself uses for connection and authentication failures.
const SSH_TRANSPORT_EXIT: i32 = 255;
const STDERR_LOG_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub host: String,
    pub user: String,
    pub key_path: Option<PathBuf>,
    pub port: u16,
}

impl RemoteTarget {
    pub fn display(&self) -> String {
        format!("{}@{}:{}", self.user, self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandResult {
    pub succeeded: bool,
    pub stdout: String,
    pub stderr: String,
    /// `None` when the command never produced an exit status (spawn failure or timeout).
    pub exit_code: Option<i32>,
}

impl CommandResult {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
        }
    }

    pub fn transport_error(stderr: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: None,
        }
    }

    /// Distinguishes "the remote command ran and failed" from "we never reached it".
    pub fn is_transport_failure(&self) -> bool {
        matches!(self.exit_code, None | Some(SSH_TRANSPORT_EXIT))
    }

    /// Succeeded with something on stdout.
    pub fn has_output(&self) -> bool {
        self.succeeded && !self.stdout.is_empty()
    }
}

pub trait RemoteExecutor {
    /// Never fails: transport problems are folded into a non-succeeded result.
    fn execute(&self, command: &str, timeout: Duration) -> CommandResult;
}

impl<E: RemoteExecutor + ?Sized> RemoteExecutor for &E {
    fn execute(&self, command: &str, timeout: Duration) -> CommandResult {
        (**self).execute(command, timeout)
    }
}

#[derive(Debug, Clone)]
pub struct SshExecutor {
    target: RemoteTarget,
    program: String,
    connect_timeout: Duration,
}

impl SshExecutor {
    pub fn new(target: RemoteTarget, connect_timeout: Duration) -> Self {
        Self {
            target,
            program: "ssh".to_string(),
            connect_timeout,
        }
    }

    pub fn target(&self) -> &RemoteTarget {
        &self.target
    }

    pub fn ssh_args(&self, command: &str) -> Vec<String> {
        let mut args: Vec<String> = [
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
            "StrictHostKeyChecking=no".to_string(),
            "UserKnownHostsFile=/dev/null".to_string(),
            "LogLevel=ERROR".to_string(),
            "BatchMode=yes".to_string(),
        ]
        .into_iter()
        .flat_map(|opt| ["-o".to_string(), opt])
        .collect();

        if let Some(key) = &self.target.key_path {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }
        args.push("-p".to_string());
        args.push(self.target.port.to_string());
        args.push(format!("{}@{}", self.target.user, self.target.host));
        args.push(command.to_string());
        args
    }
}

impl RemoteExecutor for SshExecutor {
    fn execute(&self, command: &str, timeout: Duration) -> CommandResult {
        let started = Instant::now();
        let result = match platform::run_command(&self.program, &self.ssh_args(command), timeout) {
            Ok(output) => CommandResult {
                succeeded: output.exit_code == 0,
                stdout: output.stdout.trim().to_string(),
                stderr: output.stderr.trim().to_string(),
                exit_code: Some(output.exit_code),
            },
            Err(err) => CommandResult::transport_error(format!("{err:#}")),
        };

        debug!(
            command,
            exit_code = ?result.exit_code,
            elapsed_ms = started.elapsed().as_millis() as u64,
            stderr = %truncate(&result.stderr, STDERR_LOG_LIMIT),
            "remote command finished"
        );
        if result.is_transport_failure() {
            warn!(command, stderr = %truncate(&result.stderr, STDERR_LOG_LIMIT), "transport failure");
        }
        result
    }
}

/// Tries each `(command, timeout)` in order and returns the first success.
///
/// When every candidate fails the last failure is returned, or an empty
/// failure if `candidates` is empty.
pub fn first_success<E, I, S>(exec: &E, candidates: I) -> CommandResult
where
    E: RemoteExecutor + ?Sized,
    I: IntoIterator<Item = (S, Duration)>,
    S: AsRef<str>,
{
    first_matching(exec, candidates, |r| r.succeeded)
}

/// Like [`first_success`], but a candidate only wins when `accept` agrees.
pub fn first_matching<E, I, S, F>(exec: &E, candidates: I, accept: F) -> CommandResult
where
    E: RemoteExecutor + ?Sized,
    I: IntoIterator<Item = (S, Duration)>,
    S: AsRef<str>,
    F: Fn(&CommandResult) -> bool,
{
    let mut last = CommandResult::transport_error("no candidate commands");
    for (command, timeout) in candidates {
        let result = exec.execute(command.as_ref(), timeout);
        if accept(&result) {
            return result;
        }
        last = CommandResult {
            succeeded: false,
            ..result
        };
    }
    last
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::time::Duration;

    use super::{CommandResult, RemoteExecutor};

    /// In-memory executor: the first rule whose needle occurs in the command answers it.
    #[derive(Default)]
    pub struct ScriptedExecutor {
        rules: Vec<(String, CommandResult)>,
        fallback: Option<CommandResult>,
        calls: RefCell<Vec<(String, Duration)>>,
    }

    impl ScriptedExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on(mut self, needle: &str, result: CommandResult) -> Self {
            self.rules.push((needle.to_string(), result));
            self
        }

        pub fn ok(self, needle: &str, stdout: &str) -> Self {
            self.on(needle, CommandResult::ok(stdout))
        }

        pub fn fail(self, needle: &str) -> Self {
            self.on(needle, CommandResult::failed(1, "not found"))
        }

        pub fn otherwise(mut self, result: CommandResult) -> Self {
            self.fallback = Some(result);
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(c, _)| c.clone()).collect()
        }

        pub fn timeouts(&self) -> Vec<Duration> {
            self.calls.borrow().iter().map(|(_, t)| *t).collect()
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl RemoteExecutor for ScriptedExecutor {
        fn execute(&self, command: &str, timeout: Duration) -> CommandResult {
            self.calls.borrow_mut().push((command.to_string(), timeout));
            self.rules
                .iter()
                .find(|(needle, _)| command.contains(needle.as_str()))
                .map(|(_, r)| r.clone())
                .or_else(|| self.fallback.clone())
                .unwrap_or_else(|| CommandResult::failed(1, format!("unscripted: {command}")))
        }
    }
}
