use tracing::info;

use crate::probes::ProbeContext;

pub const CONNECTIVITY_TOKEN: &str = "SSH_OK";

/// Echoes a token over the transport. A login banner without the token does not count.
pub fn check_connectivity(ctx: &ProbeContext<'_>) -> Result<(), String> {
    let result = ctx.run(
        &format!("echo '{CONNECTIVITY_TOKEN}'"),
        ctx.profile.timeouts.connectivity(),
    );
    if result.succeeded && result.stdout.contains(CONNECTIVITY_TOKEN) {
        info!("ssh connection established");
        return Ok(());
    }

    let reason = if !result.stderr.is_empty() {
        result.stderr
    } else if result.succeeded {
        format!("remote shell did not echo {CONNECTIVITY_TOKEN}")
    } else {
        "ssh exited without a diagnostic".to_string()
    };
    Err(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;
    use crate::remote::CommandResult;
    use crate::remote::testing::ScriptedExecutor;

    #[test]
    fn token_in_stdout_is_success() {
        let exec = ScriptedExecutor::new().ok("echo", "Welcome to Ubuntu\nSSH_OK");
        let profile = Profile::default();
        assert!(check_connectivity(&ProbeContext::new(&exec, &profile)).is_ok());
        assert_eq!(exec.timeouts(), vec![profile.timeouts.connectivity()]);
    }

    #[test]
    fn zero_exit_without_token_is_failure() {
        let exec = ScriptedExecutor::new().ok("echo", "Welcome to Ubuntu");
        let profile = Profile::default();
        let err = check_connectivity(&ProbeContext::new(&exec, &profile)).expect_err("no token");
        assert!(err.contains("SSH_OK"));
    }

    #[test]
    fn transport_stderr_is_surfaced() {
        let exec = ScriptedExecutor::new().on(
            "echo",
            CommandResult::failed(255, "ssh: connect to host h port 22: Connection refused"),
        );
        let profile = Profile::default();
        let err = check_connectivity(&ProbeContext::new(&exec, &profile)).expect_err("refused");
        assert!(err.contains("Connection refused"));
    }
}
