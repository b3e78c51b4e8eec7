//! Error types, one enum per domain.
//!
//! Collaborators return [`ArgusError`]; the scenario engine wraps stage
//! failures into the stage-specific [`ScenarioError`] variants so callers can
//! tell which lifecycle stage broke.

/// Top-level Argus error.
#[derive(Debug, thiserror::Error)]
pub enum ArgusError {
    /// Configuration error
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Remote command transport error
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Backend (instance lifecycle) error
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Recipe (instance preparation) error
    #[error("recipe error: {0}")]
    Recipe(#[from] RecipeError),

    /// Scenario composition or lifecycle error
    #[error("scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    /// A test assertion did not hold
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A collaborator call panicked or its task was cancelled
    #[error("collaborator task failed: {0}")]
    TaskFailed(String),
}

impl ArgusError {
    /// Build an assertion failure from anything printable.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// Config could not be parsed
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// Config value is invalid
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Remote command transport errors
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The transport process could not be started
    #[error("failed to spawn remote transport: {0}")]
    Spawn(String),

    /// The command did not finish in time
    #[error("command timed out after {secs}s: {command}")]
    Timeout { command: String, secs: u64 },

    /// The command ran but exited non-zero
    #[error("command '{command}' exited with {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// The requested protocol has no transport
    #[error("unsupported remote protocol: {0}")]
    UnsupportedProtocol(String),
}

/// Backend errors
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Instance could not be provisioned
    #[error("provisioning failed: {0}")]
    Provision(String),

    /// An operation needed a provisioned instance
    #[error("instance is not provisioned")]
    NotProvisioned,

    /// Instance output could not be fetched or saved
    #[error("instance output error: {0}")]
    Output(String),

    /// Instance resources could not be released
    #[error("cleanup failed: {0}")]
    Cleanup(String),
}

/// Recipe errors
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    /// A preparation step failed
    #[error("recipe step '{step}' failed: {reason}")]
    StepFailed { step: String, reason: String },
}

/// Scenario composition and lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// Two bound test methods resolved to the same final name
    #[error("composition defect in suite '{suite}': bound name '{name}' from group '{group}' is already taken")]
    CompositionDefect {
        suite: String,
        name: String,
        group: String,
    },

    /// The descriptor is missing required fields
    #[error("scenario '{suite}' is not final (missing: {missing})")]
    DescriptorNotFinal { suite: String, missing: String },

    /// The descriptor names a test group that was never registered
    #[error("unknown test group '{group}' in scenario '{suite}'")]
    UnknownTestGroup { suite: String, group: String },

    /// A test group with this name is already registered
    #[error("test group '{0}' is already registered")]
    DuplicateTestGroup(String),

    /// The descriptor names a collaborator variant that was never registered
    #[error("unknown {kind} variant '{name}'")]
    UnknownVariant { kind: &'static str, name: String },

    /// A collaborator variant with this name is already registered
    #[error("{kind} variant '{name}' is already registered")]
    DuplicateVariant { kind: &'static str, name: String },

    /// Provisioning stage failed
    #[error("provisioning failed for scenario '{suite}': {source}")]
    Provision {
        suite: String,
        #[source]
        source: Box<ArgusError>,
    },

    /// Preparation stage failed
    #[error("preparation failed for scenario '{suite}': {source}")]
    Prepare {
        suite: String,
        #[source]
        source: Box<ArgusError>,
    },

    /// Introspection setup stage failed
    #[error("introspection setup failed for scenario '{suite}': {source}")]
    IntrospectionSetup {
        suite: String,
        #[source]
        source: Box<ArgusError>,
    },

    /// Teardown failed
    #[error("cleanup failed for scenario '{suite}': {source}")]
    Cleanup {
        suite: String,
        #[source]
        source: Box<ArgusError>,
    },

    /// An operation was attempted in the wrong lifecycle state
    #[error("scenario '{suite}' is {actual}, expected {expected}")]
    InvalidState {
        suite: String,
        expected: String,
        actual: String,
    },
}

impl ScenarioError {
    /// The lifecycle stage this error belongs to, if any.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Self::Provision { .. } => Some("provisioning"),
            Self::Prepare { .. } => Some("preparing"),
            Self::IntrospectionSetup { .. } => Some("introspecting"),
            Self::Cleanup { .. } => Some("tearing-down"),
            _ => None,
        }
    }

    /// Whether this error came out of a setup stage.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            Self::Provision { .. } | Self::Prepare { .. } | Self::IntrospectionSetup { .. }
        )
    }
}
