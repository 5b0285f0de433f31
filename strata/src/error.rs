use snafu::Snafu;
use strata_core::ResourceError;
use strata_observability::{ErrorKind, ObservabilityError};
use strata_writer::SaveChangesError;

/// CLI error types.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CliError {
    #[snafu(display("Invalid {resource} name"))]
    InvalidResourceName {
        resource: &'static str,
        source: ResourceError,
    },
    #[snafu(display("Invalid {name} argument: {message}"))]
    InvalidArgument { name: &'static str, message: String },
    #[snafu(display("Invalid record on line {line}: {message}"))]
    InvalidRecord { line: usize, message: String },
    #[snafu(display("Failed to parse record on line {line}"))]
    JsonParse {
        line: usize,
        source: serde_json::Error,
    },
    #[snafu(display("Failed to read {path}"))]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("Object store error"))]
    ObjectStore { source: object_store::Error },
    #[snafu(display("Failed to save changes"))]
    SaveChanges { source: SaveChangesError },
    #[snafu(display("Failed to initialize observability"))]
    Observability { source: ObservabilityError },
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

impl CliError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidResourceName { .. }
            | Self::InvalidRecord { .. }
            | Self::JsonParse { .. } => ErrorKind::Validation,
            Self::InvalidArgument { .. } | Self::Observability { .. } => ErrorKind::Configuration,
            Self::Io { .. } | Self::ObjectStore { .. } => ErrorKind::Temporary,
            Self::SaveChanges { source } => source.kind(),
        }
    }
}
