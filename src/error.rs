//! Common error types for SDK operations

use core::fmt;

/// A common error type for all SDK operations.
///
/// This enum defines the closed set of result codes that can occur when
/// building records, exchanging files with the transport agent, or managing
/// its process. Composite operations stop at the first failing step and
/// propagate its code unchanged.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// A numeric argument or index was outside its valid range.
    OutOfRange,
    /// An export was attempted without a mandatory field set.
    RequiredFieldMissing,
    /// A file or directory could not be opened or created.
    FileOpen,
    /// A file or directory exists but lacks read/write permission.
    FilePermission,
    /// A file could not be moved or copied into place.
    FileMove,
    /// A file or link could not be deleted.
    FileDelete,
    /// A symbolic link could not be created.
    SymlinkCreate,
    /// A source file was unreadable or not parseable as JSON.
    InvalidFormat,
    /// The base path is missing required structure (e.g. the device NUID file).
    InvalidBasePath,
    /// The transport agent is already running.
    AlreadyRunning,
    /// The transport agent is not running.
    NotRunning,
    /// The transport agent could not be started.
    SpawnFailed,
    /// The transport agent's run state could not be determined.
    ExecUndetermined,
    /// The transport agent could not be signalled.
    KillFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::OutOfRange => "argument out of range",
            Error::RequiredFieldMissing => "required field missing",
            Error::FileOpen => "file open error",
            Error::FilePermission => "file permission error",
            Error::FileMove => "file move error",
            Error::FileDelete => "file delete error",
            Error::SymlinkCreate => "symlink create error",
            Error::InvalidFormat => "invalid file format",
            Error::InvalidBasePath => "invalid base path",
            Error::AlreadyRunning => "transport agent already running",
            Error::NotRunning => "transport agent not running",
            Error::SpawnFailed => "transport agent could not be started",
            Error::ExecUndetermined => "transport agent state undetermined",
            Error::KillFailed => "transport agent could not be signalled",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for Error {}

/// Convenience alias used by every fallible operation in this crate.
pub type Result<T> = core::result::Result<T, Error>;
