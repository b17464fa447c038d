use std::fmt;
use thiserror::Error;

/// Provisioning steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Connect,
    PreflightCheck,
    CreateUser,
    CreateCollections,
    CreateIndexes,
    InsertDevices,
    InsertReadings,
    Verify,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Connect => "connect",
            Step::PreflightCheck => "pre-flight check",
            Step::CreateUser => "create user",
            Step::CreateCollections => "create collections",
            Step::CreateIndexes => "create indexes",
            Step::InsertDevices => "insert devices",
            Step::InsertReadings => "insert sensor readings",
            Step::Verify => "verify",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("MongoDB error during {step}: {source}")]
    Step {
        step: Step,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("Database already provisioned: {0}")]
    AlreadyProvisioned(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Verification failed: {}", .0.join("; "))]
    Verification(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn step(&self) -> Option<Step> {
        match self {
            Error::Step { step, .. } => Some(*step),
            Error::AlreadyProvisioned(_) => Some(Step::PreflightCheck),
            Error::Verification(_) => Some(Step::Verify),
            Error::Validation(_) | Error::Config(_) => None,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::AlreadyProvisioned(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Tags driver errors with the step they happened in.
pub trait StepContext<T> {
    fn during(self, step: Step) -> Result<T>;
}

impl<T> StepContext<T> for std::result::Result<T, mongodb::error::Error> {
    fn during(self, step: Step) -> Result<T> {
        self.map_err(|source| Error::Step { step, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_provisioned_exit_code() {
        let err = Error::AlreadyProvisioned("user iot_user exists".to_string());
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.step(), Some(Step::PreflightCheck));
    }

    #[test]
    fn test_verification_message_lists_failures() {
        let err = Error::Verification(vec![
            "missing collection devices".to_string(),
            "missing device pico_002".to_string(),
        ]);
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            err.to_string(),
            "Verification failed: missing collection devices; missing device pico_002"
        );
    }

    #[test]
    fn test_validation_has_no_step() {
        let err = Error::Validation("Device ID cannot be empty".to_string());
        assert_eq!(err.step(), None);
    }

    #[test]
    fn test_step_display() {
        assert_eq!(Step::CreateIndexes.to_string(), "create indexes");
        assert_eq!(Step::InsertReadings.to_string(), "insert sensor readings");
    }
}
