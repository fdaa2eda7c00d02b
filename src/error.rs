//! Error types for the network workflows.
//!
//! Failures are returned to the caller instead of being printed and dropped at
//! the call site. The layers map onto the enums below:
//! - [`ArmError`] - a call against Azure Resource Manager failed
//! - [`ConfigError`] - settings or scenario data are missing or invalid
//! - [`WorkflowError`] - a workflow step failed, with the step that failed

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while talking to Azure Resource Manager.
#[derive(Debug, Error)]
pub enum ArmError {
    /// The transport could not deliver the request (process spawn, network, token).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Authentication failed before the request was sent.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The resource does not exist.
    #[error("Resource not found: {id}")]
    NotFound {
        /// Full resource id that was requested.
        id: String,
    },

    /// ARM answered with a non-success status.
    #[error("ARM returned {status} ({code}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// ARM error code, e.g. `InvalidResourceReference`.
        code: String,
        /// Human readable message from ARM.
        message: String,
    },

    /// The long-running operation reached a failed terminal state.
    #[error("Provisioning of {id} ended in state {state}")]
    Provisioning {
        /// Full resource id.
        id: String,
        /// Final provisioning state reported by ARM.
        state: String,
    },

    /// The resource never reached a terminal state within the poll budget.
    #[error("Timed out waiting for {id} (last state {state})")]
    PollTimeout {
        /// Full resource id.
        id: String,
        /// Last provisioning state seen.
        state: String,
    },

    /// The request body could not be encoded.
    #[error("Error encoding request for {id}: {message}")]
    Encode {
        /// Full resource id.
        id: String,
        /// Serialiser message.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Error decoding response at path={path}: {message}")]
    Decode {
        /// JSON path of the failing field.
        path: String,
        /// Decoder message.
        message: String,
    },
}

impl ArmError {
    /// Whether the error means the resource is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArmError::NotFound { .. })
    }
}

/// Errors raised while assembling settings or scenario data.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the variable.
        name: String,
    },

    /// An environment variable holds a value we cannot use.
    #[error("Invalid value for {name}: {value}")]
    InvalidEnvVar {
        /// Name of the variable.
        name: String,
        /// The rejected value.
        value: String,
    },

    /// The scenario data file could not be read.
    #[error("Cannot read scenario file {path}: {message}")]
    ScenarioFile {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        message: String,
    },

    /// The scenario data file is not valid.
    #[error("Invalid scenario data at path={path}: {message}")]
    ScenarioParse {
        /// JSON path of the failing field.
        path: String,
        /// Decoder message.
        message: String,
    },

    /// The workflow needs a scenario section that is not present.
    #[error("Scenario data has no `{section}` section, required by the {workflow} workflow")]
    MissingSection {
        /// Section name in the scenario file.
        section: &'static str,
        /// Workflow that asked for it.
        workflow: &'static str,
    },
}

/// A workflow step failed.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The step could not be executed.
    #[error("Step '{step}' failed: {source}")]
    Step {
        /// Banner of the step that failed.
        step: String,
        /// Cause.
        #[source]
        source: ArmError,
    },

    /// The workflow could not be set up.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Parameter body could not be serialised.
    #[error("Cannot serialise parameters for '{step}': {message}")]
    Parameters {
        /// Step that was building the parameters.
        step: String,
        /// Serialiser message.
        message: String,
    },
}

/// Result alias for ARM calls.
pub type ArmResult<T> = std::result::Result<T, ArmError>;
