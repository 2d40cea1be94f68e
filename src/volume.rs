//! C2 — Volume Stream: a byte-addressable, seekable, read-only view over a
//! [`SectorDevice`] with sector-aligned batching (spec §4.2).

use std::io::{self, Read, Seek, SeekFrom};

use crate::device::SectorDevice;
use crate::error::NtfsVaultError;

/// Maximum number of whole sectors read in a single aligned batch. Amortizes
/// per-sector device overhead while staying well under typical raw-volume
/// I/O size caps.
const MAX_BATCH_SECTORS: u64 = 128;

/// Generalizes the teacher's `SectorReader<R: Read + Seek>` to operate over
/// the abstract [`SectorDevice`] trait instead of a concrete file handle
/// (spec §4.1/§4.2 require the core to depend on the seam, not a file).
pub struct VolumeStream<D: SectorDevice> {
    device: D,
    position: u64,
}

impl<D: SectorDevice> VolumeStream<D> {
    pub fn new(device: D) -> Self {
        Self { device, position: 0 }
    }

    pub fn sector_size(&self) -> u32 {
        self.device.sector_size()
    }

    /// Total addressable length of the volume, in bytes.
    pub fn volume_length(&self) -> u64 {
        self.device.sector_size() as u64 * self.device.sector_count()
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_device(self) -> D {
        self.device
    }

    fn read_impl(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let volume_length = self.volume_length();
        let remaining_volume = volume_length.saturating_sub(self.position);
        let want = (buf.len() as u64).min(remaining_volume) as usize;
        if want == 0 {
            return Ok(0);
        }

        let sector_size = self.device.sector_size() as u64;
        let mut filled = 0usize;
        let mut pos = self.position;

        while filled < want {
            let sector = pos / sector_size;
            let offset = (pos % sector_size) as usize;
            let remaining_after = want - filled;

            if offset != 0 {
                let sector_bytes = self
                    .device
                    .read_sectors(sector, 1)
                    .map_err(to_io_error)?;
                let available = sector_size as usize - offset;
                let n = available.min(remaining_after);
                buf[filled..filled + n].copy_from_slice(&sector_bytes[offset..offset + n]);
                filled += n;
                pos += n as u64;
                continue;
            }

            if remaining_after >= sector_size as usize {
                let full_sectors_needed = remaining_after as u64 / sector_size;
                let batch = full_sectors_needed.min(MAX_BATCH_SECTORS);
                let bytes = self
                    .device
                    .read_sectors(sector, batch)
                    .map_err(to_io_error)?;
                buf[filled..filled + bytes.len()].copy_from_slice(&bytes);
                filled += bytes.len();
                pos += bytes.len() as u64;
            } else {
                let sector_bytes = self
                    .device
                    .read_sectors(sector, 1)
                    .map_err(to_io_error)?;
                buf[filled..filled + remaining_after].copy_from_slice(&sector_bytes[..remaining_after]);
                filled += remaining_after;
                pos += remaining_after as u64;
            }
        }

        self.position = pos;
        Ok(filled)
    }
}

fn to_io_error(err: NtfsVaultError) -> io::Error {
    match err {
        NtfsVaultError::DeviceIo { source, .. } => source,
        other => io::Error::other(other.to_string()),
    }
}

impl<D: SectorDevice> Read for VolumeStream<D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_impl(buf)
    }
}

impl<D: SectorDevice> Seek for VolumeStream<D> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(n) => Some(n as i128),
            SeekFrom::End(n) => Some(self.volume_length() as i128 + n as i128),
            SeekFrom::Current(n) => Some(self.position as i128 + n as i128),
        };

        match new_pos {
            Some(n) if n >= 0 => {
                self.position = n as u64;
                Ok(self.position)
            }
            Some(n) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                NtfsVaultError::InvalidSeek(n as i64).to_string(),
            )),
            None => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MockSectorDevice;

    fn device_with_pattern(sector_size: u32, sectors: u64) -> MockSectorDevice {
        let mut data = vec![0u8; (sector_size as u64 * sectors) as usize];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }
        MockSectorDevice::new(sector_size, data)
    }

    #[test]
    fn unaligned_read_matches_source_bytes() {
        let dev = device_with_pattern(512, 4);
        let mut stream = VolumeStream::new(dev);
        stream.seek(SeekFrom::Start(10)).unwrap();
        let mut buf = [0u8; 20];
        let n = stream.read(&mut buf).unwrap();
        assert_eq!(n, 20);
        let expected: Vec<u8> = (10..30).map(|i| (i % 251) as u8).collect();
        assert_eq!(&buf[..], &expected[..]);
    }

    #[test]
    fn read_spanning_many_sectors_batches_correctly() {
        let dev = device_with_pattern(512, 300);
        let mut stream = VolumeStream::new(dev);
        let mut buf = vec![0u8; 512 * 200 + 17];
        let n = stream.read(&mut buf).unwrap();
        assert_eq!(n, buf.len());
        let expected: Vec<u8> = (0..buf.len()).map(|i| (i % 251) as u8).collect();
        assert_eq!(buf, expected);
    }

    #[test]
    fn read_clamps_to_volume_length() {
        let dev = device_with_pattern(512, 2);
        let mut stream = VolumeStream::new(dev);
        stream.seek(SeekFrom::Start(1000)).unwrap();
        let mut buf = [0u8; 100];
        let n = stream.read(&mut buf).unwrap();
        assert_eq!(n, 24); // 1024 - 1000
    }

    #[test]
    fn read_at_end_returns_zero() {
        let dev = device_with_pattern(512, 1);
        let mut stream = VolumeStream::new(dev);
        stream.seek(SeekFrom::Start(512)).unwrap();
        let mut buf = [0u8; 10];
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn negative_seek_fails() {
        let dev = device_with_pattern(512, 1);
        let mut stream = VolumeStream::new(dev);
        assert!(stream.seek(SeekFrom::Current(-1)).is_err());
    }
}
