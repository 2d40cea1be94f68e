//! Read-only access to files, directories, and NTFS-specific metadata on a
//! live, mounted NTFS volume, parsed directly from a raw volume handle.
//!
//! The crate never opens a volume itself and never writes to one. Callers
//! supply a [`device::SectorDevice`] (a raw sector-read seam) and drive
//! everything else — metadata lookup, sparse-aware streaming, reparse-point
//! resolution, alternate-data-stream enumeration, and streamed copy — through
//! [`accessor::Accessor`].
//!
//! ```no_run
//! use ntfsvault::{Accessor, Options};
//! use ntfsvault::device::MockSectorDevice;
//!
//! # fn example(device: MockSectorDevice) -> ntfsvault::error::Result<()> {
//! let accessor = Accessor::open_with_options("C", device, Options::default())?;
//! let files = accessor.files()?;
//! if files.exists(r"C:\Windows\System32\config\SOFTWARE") {
//!     let info = files.file_info(r"C:\Windows\System32\config\SOFTWARE", true, accessor.options())?;
//!     println!("{} bytes, {} ADS", info.size, info.ads_names.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod accessor;
pub mod ads;
pub mod device;
pub mod directory;
pub mod error;
pub mod file;
pub mod interpreter;
pub mod model;
pub mod reparse;
pub mod sparse;
pub mod stream;

mod shared_fs;
mod volume;

pub use accessor::Accessor;
pub use ads::AdsHandler;
pub use directory::DirectoryReader;
pub use error::{NtfsVaultError, Result};
pub use file::{Destination, FileReader};
pub use model::{
    DataRegion, DirectoryRecord, FileAttributes, FileRecord, LinkTarget, Options, ReparseBuffer,
    ReparseKind, ReparseLayout,
};
pub use reparse::LinkResolver;
pub use sparse::SparseStream;
pub use stream::{ResidentStream, Stream};
pub use volume::VolumeStream;
