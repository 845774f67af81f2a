use thiserror::Error;

use crate::target::Family;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Bad class value `{0}'")]
    BadClassValue(String),

    #[error("CLASSIFY: Can't specify --set-class twice")]
    SpecifiedTwice,

    #[error("CLASSIFY: Parameter --set-class is required")]
    MissingSetClass,

    #[error("Bad handle `{0}'")]
    BadHandle(String),

    #[error("unknown option `{0}'")]
    UnknownOption(String),

    #[error("option `{0}' requires an argument")]
    MissingArgument(String),

    #[error("option `{0}' is ambiguous")]
    AmbiguousOption(String),

    #[error("Payload size mismatch: expected {expected} bytes, got {actual}")]
    PayloadSize { expected: usize, actual: usize },

    #[error("Target {name} already registered for {family}")]
    DuplicateTarget { name: String, family: Family },

    #[error("Couldn't find target `{name}' for {family}")]
    TargetNotFound { name: String, family: Family },

    #[error("Serialization error: {0}")]
    SerializeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Process exit codes used by the firewall tools (`enum xtables_exittype`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    OtherProblem = 1,
    ParameterProblem = 2,
}

impl ExitStatus {
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl ClassifyError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            ClassifyError::BadClassValue(_)
            | ClassifyError::BadHandle(_)
            | ClassifyError::SpecifiedTwice
            | ClassifyError::MissingSetClass
            | ClassifyError::UnknownOption(_)
            | ClassifyError::MissingArgument(_)
            | ClassifyError::AmbiguousOption(_) => ExitStatus::ParameterProblem,
            _ => ExitStatus::OtherProblem,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClassifyError>;
