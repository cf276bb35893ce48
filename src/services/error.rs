use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that abort a chain resolution.
///
/// No partial chain is ever returned alongside one of these.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Bad argument: {0}")]
    BadArgument(String),

    #[error("Failed to open {what}: {path}")]
    NotFound {
        what: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Machine descriptor contains no disk: {0}")]
    NoDiskFound(Utf8PathBuf),

    #[error("Can't find snapshot {0} in chain")]
    ChainBroken(String),

    #[error("Chain loops back to {0}")]
    CycleDetected(String),

    #[error("Too many {what}: limit is {limit}")]
    ResourceExceeded { what: &'static str, limit: usize },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`ChainError`], stable across messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainErrorKind {
    BadArgument,
    NotFound,
    NoDiskFound,
    ChainBroken,
    CycleDetected,
    ResourceExceeded,
    MalformedInput,
    Io,
}

impl ChainErrorKind {
    /// Process exit code reported by the command line tool.
    pub fn exit_code(self) -> i32 {
        match self {
            ChainErrorKind::BadArgument => 2,
            ChainErrorKind::NotFound => 3,
            ChainErrorKind::NoDiskFound => 4,
            ChainErrorKind::ChainBroken => 5,
            ChainErrorKind::CycleDetected => 6,
            ChainErrorKind::ResourceExceeded => 7,
            ChainErrorKind::MalformedInput => 8,
            ChainErrorKind::Io => 9,
        }
    }
}

impl ChainError {
    pub fn kind(&self) -> ChainErrorKind {
        match self {
            ChainError::BadArgument(_) => ChainErrorKind::BadArgument,
            ChainError::NotFound { .. } => ChainErrorKind::NotFound,
            ChainError::NoDiskFound(_) => ChainErrorKind::NoDiskFound,
            ChainError::ChainBroken(_) => ChainErrorKind::ChainBroken,
            ChainError::CycleDetected(_) => ChainErrorKind::CycleDetected,
            ChainError::ResourceExceeded { .. } => ChainErrorKind::ResourceExceeded,
            ChainError::MalformedInput(_) => ChainErrorKind::MalformedInput,
            ChainError::Io(_) => ChainErrorKind::Io,
        }
    }
}

pub type ChainResult<T> = Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_exit_code() {
        let err = ChainError::ResourceExceeded {
            what: "snapshot entries",
            limit: 20,
        };
        assert_eq!(err.kind(), ChainErrorKind::ResourceExceeded);
        assert_eq!(err.kind().exit_code(), 7);
        assert_eq!(err.to_string(), "Too many snapshot entries: limit is 20");
    }

    #[test]
    fn test_not_found_message_names_path() {
        let err = ChainError::NotFound {
            what: "disk image",
            path: Utf8PathBuf::from("vm/base.vmdk"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.to_string(), "Failed to open disk image: vm/base.vmdk");
        assert_eq!(err.kind().exit_code(), 3);
    }
}
