//! Error types for construction-time failures.
//!
//! Nothing that runs inside a tick returns an error: missing parts are
//! skipped and out-of-bounds bodies are reset. Only building the dummy and
//! parsing settings can fail.

/// The dummy could not be assembled from its descriptor table.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RagdollError {
    #[error("part '{part}' references bone '{bone}', which the skeleton does not have")]
    MissingBone { part: String, bone: String },

    #[error("no descriptor for required part '{0}'")]
    MissingDescriptor(String),

    #[error("joint '{joint}' references part '{part}', which has no descriptor")]
    UnknownJointPart { joint: String, part: String },

    #[error("part '{0}' has a non-positive mass")]
    InvalidMass(String),
}

/// Settings could not be read or written.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Any error the sandbox can report.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error(transparent)]
    Ragdoll(#[from] RagdollError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = SandboxError> = core::result::Result<T, E>;
