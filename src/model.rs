//! Data model (spec §3): records, options, and the small value types shared
//! across every component.

use std::path::PathBuf;
use std::time::SystemTime;

use bitflags::bitflags;

bitflags! {
    /// Windows/NTFS file attribute bits. Values match the standard
    /// `FILE_ATTRIBUTE_*` constants so a host adapter can pass them straight
    /// through to a native attribute-setting API.
    ///
    /// Grounded on the bit values enumerated in
    /// `RecRanger-carrot-ntfs-recovery::ntfs_logic` and the bitflags-backed
    /// `FileAttributes` used throughout `smb-fscc`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileAttributes: u32 {
        const READONLY            = 0x0000_0001;
        const HIDDEN               = 0x0000_0002;
        const SYSTEM               = 0x0000_0004;
        const DIRECTORY            = 0x0000_0010;
        const ARCHIVE              = 0x0000_0020;
        const DEVICE               = 0x0000_0040;
        const NORMAL               = 0x0000_0080;
        const TEMPORARY            = 0x0000_0100;
        const SPARSE_FILE          = 0x0000_0200;
        const REPARSE_POINT        = 0x0000_0400;
        const COMPRESSED           = 0x0000_0800;
        const OFFLINE              = 0x0000_1000;
        const NOT_CONTENT_INDEXED  = 0x0000_2000;
        const ENCRYPTED            = 0x0000_4000;
    }
}

impl FileAttributes {
    pub fn is_sparse(&self) -> bool {
        self.contains(FileAttributes::SPARSE_FILE)
    }

    pub fn is_compressed(&self) -> bool {
        self.contains(FileAttributes::COMPRESSED)
    }

    pub fn is_reparse_point(&self) -> bool {
        self.contains(FileAttributes::REPARSE_POINT)
    }

    pub fn is_directory(&self) -> bool {
        self.contains(FileAttributes::DIRECTORY)
    }
}

/// Tagged variant over reparse-point kinds (spec §9's closing note on
/// polymorphism: "a tagged variant over `{None, Junction, SymbolicFile,
/// SymbolicDirectory, HardLink}`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReparseKind {
    None,
    Junction,
    SymbolicFile,
    SymbolicDirectory,
    /// Never produced by the link resolver; reserved for the optional
    /// best-effort hard-link heuristic (spec §9).
    HardLink,
}

/// Which of the two candidate reparse-buffer header layouts (spec §6, §9)
/// decoded a given buffer. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReparseLayout {
    /// Tag/data-length/reserved header present before the payload.
    HeaderPresent,
    /// Header stripped by the supplier; payload starts immediately after
    /// the 4-byte tag.
    HeaderAbsent,
}

/// One contiguous allocated (non-sparse) byte range within a file.
///
/// Invariant: a `Vec<DataRegion>` returned by region discovery is
/// non-overlapping and sorted by `start_offset` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRegion {
    pub start_offset: u64,
    pub length: u64,
}

impl DataRegion {
    pub fn end_offset(&self) -> u64 {
        self.start_offset + self.length
    }
}

/// Resolved reparse-point payload (spec §3).
#[derive(Debug, Clone)]
pub struct ReparseBuffer {
    pub tag: u32,
    pub content: Vec<u8>,
}

/// Decoded link target for a reparse point (spec §4.5(a)).
#[derive(Debug, Clone)]
pub struct LinkTarget {
    pub kind: ReparseKind,
    pub raw_target: String,
    pub layout: ReparseLayout,
    /// Symbolic-link flags bit 0 (spec §4.5(a)/§6): `true` iff the reparse
    /// buffer itself declared the target relative. Always `false` for a
    /// junction, whose substitute name is always absolute by construction.
    pub relative: bool,
}

/// Per-resolved-file metadata (spec §3).
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub full_path: String,
    pub size: u64,
    pub creation_time: SystemTime,
    pub last_access_time: SystemTime,
    pub last_write_time: SystemTime,
    pub attributes: FileAttributes,
    /// Ordered, distinct, case-insensitive alternate-data-stream names.
    pub ads_names: Vec<String>,
    pub link_target: Option<LinkTarget>,
    /// Best-effort hard-link sibling paths; only populated when
    /// `Options::detect_hard_links` is set (spec §9, supplemental §11).
    pub hard_link_siblings: Vec<PathBuf>,
}

impl FileRecord {
    pub fn is_sparse(&self) -> bool {
        self.attributes.is_sparse()
    }

    pub fn is_compressed(&self) -> bool {
        self.attributes.is_compressed()
    }

    pub fn is_reparse_point(&self) -> bool {
        self.attributes.is_reparse_point()
    }
}

/// Per-directory metadata (spec §3): same as [`FileRecord`] minus `size` and
/// `ads_names`.
#[derive(Debug, Clone)]
pub struct DirectoryRecord {
    pub full_path: String,
    pub creation_time: SystemTime,
    pub last_access_time: SystemTime,
    pub last_write_time: SystemTime,
    pub attributes: FileAttributes,
    pub link_target: Option<LinkTarget>,
}

impl DirectoryRecord {
    pub fn is_reparse_point(&self) -> bool {
        self.attributes.is_reparse_point()
    }
}

/// Immutable per-accessor-session configuration (spec §3).
#[derive(Debug, Clone)]
pub struct Options {
    /// Byte chunk used for stream-to-stream copying and sparse-region
    /// scanning.
    pub buffer_size: usize,
    /// Cap on transitive link following.
    pub max_link_depth: u32,
    /// Whether relative-target reparse points are dereferenced.
    pub follow_relative_links: bool,
    /// Whether absolute-target reparse points are dereferenced.
    pub follow_absolute_links: bool,
    /// Opt-in best-effort hard-link detection (spec §9, §11). Never
    /// consulted by the link resolver.
    pub detect_hard_links: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            buffer_size: 4 * 1024 * 1024,
            max_link_depth: 10,
            follow_relative_links: true,
            follow_absolute_links: false,
            detect_hard_links: false,
        }
    }
}

impl Options {
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_max_link_depth(mut self, max_link_depth: u32) -> Self {
        self.max_link_depth = max_link_depth;
        self
    }

    pub fn with_follow_relative_links(mut self, follow: bool) -> Self {
        self.follow_relative_links = follow;
        self
    }

    pub fn with_follow_absolute_links(mut self, follow: bool) -> Self {
        self.follow_absolute_links = follow;
        self
    }

    pub fn with_detect_hard_links(mut self, detect: bool) -> Self {
        self.detect_hard_links = detect;
        self
    }
}
