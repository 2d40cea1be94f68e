//! C1 — Sector Device: raw sector-granular reads from the mounted volume.

use crate::error::{NtfsVaultError, Result};

/// Abstract raw-sector I/O seam (spec §4.1). The core never opens a volume
/// itself; callers supply an implementation of this trait.
///
/// Contract: `read_sectors` returns exactly `count * sector_size` bytes or
/// fails with [`NtfsVaultError::DeviceIo`] — no partial reads.
pub trait SectorDevice {
    /// Size of one sector, in bytes. Must be a power of two.
    fn sector_size(&self) -> u32;

    /// Total number of sectors on the volume.
    fn sector_count(&self) -> u64;

    /// Read `count` whole sectors starting at `first_lba`.
    fn read_sectors(&mut self, first_lba: u64, count: u64) -> Result<Vec<u8>>;
}

/// Deterministic in-memory [`SectorDevice`] used by tests and as a reference
/// implementation for hosts that already have the volume bytes in memory
/// (e.g. an image file).
pub struct MockSectorDevice {
    sector_size: u32,
    data: Vec<u8>,
}

impl MockSectorDevice {
    /// `data` is zero-padded up to a whole number of sectors.
    pub fn new(sector_size: u32, mut data: Vec<u8>) -> Self {
        let sector_size = sector_size as usize;
        let remainder = data.len() % sector_size;
        if remainder != 0 {
            data.resize(data.len() + (sector_size - remainder), 0);
        }
        Self {
            sector_size: sector_size as u32,
            data,
        }
    }
}

impl SectorDevice for MockSectorDevice {
    fn sector_size(&self) -> u32 {
        self.sector_size
    }

    fn sector_count(&self) -> u64 {
        self.data.len() as u64 / self.sector_size as u64
    }

    fn read_sectors(&mut self, first_lba: u64, count: u64) -> Result<Vec<u8>> {
        let start = first_lba
            .checked_mul(self.sector_size as u64)
            .ok_or_else(|| NtfsVaultError::InvalidArgument("lba overflow".into()))?;
        let len = count * self.sector_size as u64;
        let end = start + len;
        if end > self.data.len() as u64 {
            return Err(NtfsVaultError::DeviceIo {
                lba: first_lba,
                source: std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "read past end of mock device",
                ),
            });
        }
        Ok(self.data[start as usize..end as usize].to_vec())
    }
}

#[cfg(all(windows, feature = "windows-device"))]
pub mod windows_raw {
    //! Real raw-volume [`SectorDevice`] backed by `CreateFileW` with
    //! `FILE_FLAG_BACKUP_SEMANTICS`, the same access pattern used by
    //! `ultrasearch`'s `ntfs-watcher::open_volume_handle`, generalized from
    //! the teacher's plain `File::open(r"\\.\X:")`.
    //!
    //! Not part of the core: this is the host-adapter reference
    //! implementation exercised by `demos/windows_live.rs`.

    use super::*;
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStrExt;
    use std::os::windows::io::{FromRawHandle, OwnedHandle, RawHandle};

    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{GetLastError, SetFilePointerEx};
    use windows::Win32::Storage::FileSystem::{
        CreateFileW, ReadFile, FILE_BEGIN, FILE_FLAG_BACKUP_SEMANTICS, FILE_GENERIC_READ,
        FILE_SHARE_DELETE, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
    };

    pub struct RawVolumeDevice {
        handle: OwnedHandle,
        sector_size: u32,
        sector_count: u64,
    }

    impl RawVolumeDevice {
        /// `drive_letter` e.g. `'C'`. `sector_size`/`sector_count` are
        /// supplied by the caller (obtained via `GetDiskFreeSpace` or
        /// similar — out of scope for the core, per spec §1).
        pub fn open(drive_letter: char, sector_size: u32, sector_count: u64) -> Result<Self> {
            let volume_path = format!(r"\\.\{}:", drive_letter);
            let mut path_w: Vec<u16> = OsString::from(&volume_path).encode_wide().collect();
            path_w.push(0);

            let handle = unsafe {
                CreateFileW(
                    PCWSTR(path_w.as_ptr()),
                    FILE_GENERIC_READ.0,
                    FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE,
                    None,
                    OPEN_EXISTING,
                    FILE_FLAG_BACKUP_SEMANTICS,
                    None,
                )
            }
            .map_err(|e| NtfsVaultError::InvalidVolume(format!("CreateFileW failed: {e}")))?;

            let raw: RawHandle = handle.0 as RawHandle;
            // SAFETY: handle is valid (error already handled above) and
            // ownership is transferred to `OwnedHandle`.
            let handle = unsafe { OwnedHandle::from_raw_handle(raw) };

            Ok(Self {
                handle,
                sector_size,
                sector_count,
            })
        }
    }

    impl SectorDevice for RawVolumeDevice {
        fn sector_size(&self) -> u32 {
            self.sector_size
        }

        fn sector_count(&self) -> u64 {
            self.sector_count
        }

        fn read_sectors(&mut self, first_lba: u64, count: u64) -> Result<Vec<u8>> {
            use std::os::windows::io::AsRawHandle;
            use windows::Win32::Foundation::HANDLE;

            let handle = HANDLE(self.handle.as_raw_handle() as isize);
            let offset = first_lba as i64 * self.sector_size as i64;

            unsafe {
                SetFilePointerEx(handle, offset, None, FILE_BEGIN).map_err(|e| {
                    NtfsVaultError::DeviceIo {
                        lba: first_lba,
                        source: std::io::Error::other(e.to_string()),
                    }
                })?;
            }

            let mut buf = vec![0u8; (count * self.sector_size as u64) as usize];
            let mut read = 0u32;
            let ok = unsafe { ReadFile(handle, Some(&mut buf), Some(&mut read), None) };
            if let Err(e) = ok {
                return Err(NtfsVaultError::DeviceIo {
                    lba: first_lba,
                    source: std::io::Error::other(format!(
                        "ReadFile failed: {e} (GetLastError={:?})",
                        unsafe { GetLastError() }
                    )),
                });
            }
            if read as usize != buf.len() {
                return Err(NtfsVaultError::DeviceIo {
                    lba: first_lba,
                    source: std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "short raw-volume read",
                    ),
                });
            }
            Ok(buf)
        }
    }
}
