use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ready,
    NotReady,
    InvalidArgs,
    CheckFailed,
    Cancelled,
}

impl ExitCode {
    pub const fn as_i32(self) -> i32 {
        match self {
            ExitCode::Ready => 0,
            ExitCode::NotReady
            | ExitCode::InvalidArgs
            | ExitCode::CheckFailed
            | ExitCode::Cancelled => 1,
        }
    }
}

#[derive(Debug)]
pub struct ExitError {
    pub code: ExitCode,
    pub err: anyhow::Error,
}

impl ExitError {
    pub fn new(code: ExitCode, err: anyhow::Error) -> Self {
        Self { code, err }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl std::error::Error for ExitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.err.as_ref())
    }
}

pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(exit) = err.downcast_ref::<ExitError>() {
        return exit.code.as_i32();
    }
    ExitCode::CheckFailed.as_i32()
}

/// True when the error only signals a negative verdict that was already reported.
pub fn is_silent(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ExitError>()
        .is_some_and(|e| e.code == ExitCode::NotReady)
}

pub fn invalid_args(message: impl Into<String>) -> anyhow::Error {
    ExitError::new(ExitCode::InvalidArgs, anyhow::anyhow!(message.into())).into()
}

pub fn invalid_args_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::InvalidArgs, err).into()
}

pub fn not_ready(message: impl Into<String>) -> anyhow::Error {
    ExitError::new(ExitCode::NotReady, anyhow::anyhow!(message.into())).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_failure_maps_to_one() {
        assert_eq!(ExitCode::Ready.as_i32(), 0);
        assert_eq!(exit_code(&invalid_args("x")), 1);
        assert_eq!(exit_code(&not_ready("x")), 1);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }

    #[test]
    fn not_ready_is_silent_but_invalid_args_is_not() {
        assert!(is_silent(&not_ready("cluster needs preparation")));
        assert!(!is_silent(&invalid_args("missing host")));
        assert!(!is_silent(&anyhow::anyhow!("boom")));
    }
}
