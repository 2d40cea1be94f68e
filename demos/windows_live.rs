//! Host-adapter demonstration: wires a real raw-volume `SectorDevice` to the
//! `Accessor` facade and copies one file, including every alternate data
//! stream, to local disk.
//!
//! Not part of the core library — privilege elevation, argument parsing, and
//! progress reporting are explicitly out of scope (spec §1) and left to a
//! real caller. This binary hard-codes its arguments to stay a minimal,
//! readable demonstration of the public API.
//!
//! Windows-only: `RawVolumeDevice` is only compiled under
//! `cfg(all(windows, feature = "windows-device"))`.
#![cfg(windows)]

use std::fs::{self, File};
use std::io::Write;
use std::time::SystemTime;

use ntfsvault::device::windows_raw::RawVolumeDevice;
use ntfsvault::error::Result;
use ntfsvault::file::Destination;
use ntfsvault::{Accessor, FileAttributes, Options};

/// Destination adapter backed by the local filesystem. ADS creation relies on
/// NTFS treating a colon-suffixed path as an alternate-stream open, so plain
/// `File::create` suffices — no extra Win32 call is needed on the host side.
struct LocalDestination;

impl Destination for LocalDestination {
    fn exists(&mut self, path: &str) -> std::io::Result<bool> {
        Ok(std::path::Path::new(path).exists())
    }

    fn ensure_parent_dir(&mut self, path: &str) -> std::io::Result<()> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn create_primary(&mut self, path: &str) -> std::io::Result<Box<dyn Write>> {
        Ok(Box::new(File::create(path)?))
    }

    fn create_ads(&mut self, path: &str, name: &str) -> std::io::Result<Box<dyn Write>> {
        Ok(Box::new(File::create(format!("{path}:{name}"))?))
    }

    fn set_times(
        &mut self,
        path: &str,
        creation: SystemTime,
        last_write: SystemTime,
        last_access: SystemTime,
    ) -> std::io::Result<()> {
        // `std::fs` has no stable creation-time setter; best-effort via the
        // times this platform does expose. A real host adapter would reach
        // for `SetFileTime` here.
        let file = File::options().write(true).open(path)?;
        file.set_modified(last_write)?;
        let _ = (creation, last_access);
        Ok(())
    }

    fn set_attributes(&mut self, path: &str, attributes: FileAttributes) -> std::io::Result<()> {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_readonly(attributes.contains(FileAttributes::READONLY));
        fs::set_permissions(path, perms)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let drive_letter = std::env::args().nth(1).unwrap_or_else(|| "C".to_string());
    let source = std::env::args()
        .nth(2)
        .unwrap_or_else(|| r"C:\Windows\System32\config\SOFTWARE".to_string());
    let dest = std::env::args().nth(3).unwrap_or_else(|| r"C:\Temp\SOFTWARE".to_string());

    // Real sector geometry is normally obtained via `GetDiskFreeSpace` or
    // similar; querying that API is out of scope for the core (spec §1), so
    // this demo hard-codes the common 4096-byte sector size and an
    // intentionally generous sector count so `VolumeStream`'s length-clamp
    // never truncates a real read before the underlying `ReadFile` call has
    // a chance to fail on its own.
    let device = RawVolumeDevice::open(drive_letter.chars().next().unwrap_or('C'), 4096, u32::MAX as u64)?;

    let accessor = Accessor::open(drive_letter, device)?;
    let files = accessor.files()?;

    let mut destination = LocalDestination;
    files.copy(&source, &mut destination, &dest, true, accessor.options())?;

    println!("copied {source} -> {dest}");
    accessor.dispose();
    Ok(())
}
