//! Tagged error taxonomy shared by every component (spec §7).

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the accessor and its components.
///
/// Every variant that is meaningful with a path carries one; variants that
/// can recur during recursive enumeration are demoted to a `warn!` log line
/// at the call site rather than failing the whole traversal (see
/// [`crate::directory::DirectoryReader`]).
#[derive(Debug, Error)]
pub enum NtfsVaultError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("not an NTFS volume or boot sector unreadable: {0}")]
    InvalidVolume(String),

    #[error("device I/O failure reading sector(s) at lba {lba}: {source}")]
    DeviceIo {
        lba: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported reparse tag {tag:#010x} on {path}")]
    UnsupportedReparseTag { tag: u32, path: PathBuf },

    #[error("link recursion at {path} (depth {depth})")]
    LinkRecursion { path: PathBuf, depth: u32 },

    #[error("alternate data stream '{name}' on {path} cannot be opened: {reason}")]
    AdsOpen {
        path: PathBuf,
        name: String,
        reason: String,
    },

    #[error("attribute unreadable for {path}: {reason}")]
    AttributeRead { path: PathBuf, reason: String },

    #[error("destination write failure for {path}: {source}")]
    DestinationWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("destination already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("accessor has been disposed")]
    Disposed,

    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("invalid seek to negative or overflowing position: {0}")]
    InvalidSeek(i64),
}

pub type Result<T> = std::result::Result<T, NtfsVaultError>;

impl From<std::io::Error> for NtfsVaultError {
    fn from(source: std::io::Error) -> Self {
        NtfsVaultError::DeviceIo { lba: 0, source }
    }
}

impl From<ntfs::NtfsError> for NtfsVaultError {
    fn from(source: ntfs::NtfsError) -> Self {
        NtfsVaultError::InvalidVolume(source.to_string())
    }
}
