//! C4 — Sparse Stream: a byte-addressable read-only view over a file's
//! allocated regions, skipping holes transparently (spec §4.3).
//!
//! The same engine also serves as the C3 "dense stream": a regular file's
//! extents cover `[0, size)` with no gaps, which is the zero-hole
//! degenerate case of this exact read state machine. There is no separate
//! dense implementation — see DESIGN.md.

use std::io::{self, Read, Seek, SeekFrom};

use crate::device::SectorDevice;
use crate::interpreter::PhysicalExtent;
use crate::model::DataRegion;
use crate::shared_fs::SharedFs;
use crate::stream::Stream;

#[derive(Debug, Clone, Copy)]
struct PresentRegion {
    logical_start: u64,
    volume_start: u64,
    length: u64,
}

impl PresentRegion {
    fn logical_end(&self) -> u64 {
        self.logical_start + self.length
    }
}

/// Volume-backed region-replay stream. Built from a file's (file-relative)
/// data-run extents (spec §4.3's "region discovery" fast path); present
/// regions only — holes are implicit gaps between them, never zero-filled.
pub struct SparseStream<D: SectorDevice> {
    shared_fs: SharedFs<D>,
    regions: Vec<PresentRegion>,
    length: u64,
    position: u64,
    current_region_index: usize,
}

impl<D: SectorDevice> SparseStream<D> {
    pub(crate) fn from_extents(
        shared_fs: SharedFs<D>,
        extents: &[PhysicalExtent],
        length: u64,
    ) -> Self {
        let mut regions = Vec::new();
        for extent in extents {
            if let Some(volume_start) = extent.volume_offset {
                if extent.length > 0 {
                    regions.push(PresentRegion {
                        logical_start: extent.file_offset,
                        volume_start,
                        length: extent.length,
                    });
                }
            }
        }
        Self {
            shared_fs,
            regions,
            length,
            position: 0,
            current_region_index: 0,
        }
    }

    /// The allocated regions backing this stream, exposed for testing
    /// (spec §8 property 3: disjoint, increasing, within `[0, size)`).
    pub fn regions(&self) -> Vec<DataRegion> {
        self.regions
            .iter()
            .map(|r| DataRegion {
                start_offset: r.logical_start,
                length: r.length,
            })
            .collect()
    }

    fn read_impl(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.position >= self.length {
                return Ok(0);
            }
            if self.current_region_index >= self.regions.len() {
                self.position = self.length;
                return Ok(0);
            }

            let region = self.regions[self.current_region_index];

            if self.position < region.logical_start {
                // Inside a hole: skip straight to the next region's start
                // and retry (spec §4.3 step 3 — "advance P ... and
                // recurse").
                self.position = region.logical_start.min(self.length);
                continue;
            }

            if self.position < region.logical_end() {
                let offset_in_region = self.position - region.logical_start;
                let region_remaining = region.logical_end() - self.position;
                let want = (buf.len() as u64).min(region_remaining) as usize;
                if want == 0 {
                    return Ok(0);
                }
                let volume_pos = region.volume_start + offset_in_region;
                {
                    let mut fs = self.shared_fs.borrow_mut();
                    fs.seek(SeekFrom::Start(volume_pos))?;
                    fs.read_exact(&mut buf[..want])?;
                }
                self.position += want as u64;
                if self.position == region.logical_end() {
                    self.current_region_index += 1;
                }
                return Ok(want);
            }

            self.current_region_index += 1;
        }
    }
}

impl<D: SectorDevice> Read for SparseStream<D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_impl(buf)
    }
}

impl<D: SectorDevice> Seek for SparseStream<D> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::End(n) => self.length as i128 + n as i128,
            SeekFrom::Current(n) => self.position as i128 + n as i128,
        };
        if new_pos < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                crate::error::NtfsVaultError::InvalidSeek(new_pos as i64).to_string(),
            ));
        }
        self.position = new_pos as u64;
        // Recompute current_region_index via binary search (spec §4.3:
        // "Seek must recompute current_region_index").
        self.current_region_index = self
            .regions
            .partition_point(|r| r.logical_end() <= self.position);
        Ok(self.position)
    }
}

impl<D: SectorDevice> Stream for SparseStream<D> {
    fn len(&self) -> u64 {
        self.length
    }
}

/// Degraded fallback region synthesis (spec §4.3, §9): used only when the
/// interpreter cannot produce data-run extents for a stream marked sparse.
/// Conflates genuine zero-valued allocated data with real holes — callers
/// must treat streams built from this path as lossier than the primary
/// extent-based path.
pub(crate) fn scan_fallback_regions<R: Read + Seek>(
    reader: &mut R,
    total_len: u64,
    chunk_size: usize,
) -> io::Result<Vec<DataRegion>> {
    reader.seek(SeekFrom::Start(0))?;
    let mut regions = Vec::new();
    let mut offset = 0u64;
    let mut run_start: Option<u64> = None;
    let mut buf = vec![0u8; chunk_size];

    while offset < total_len {
        let want = (buf.len() as u64).min(total_len - offset) as usize;
        reader.read_exact(&mut buf[..want])?;
        let is_all_zero = buf[..want].iter().all(|&b| b == 0);

        match (is_all_zero, run_start) {
            (false, None) => run_start = Some(offset),
            (true, Some(start)) => {
                regions.push(DataRegion {
                    start_offset: start,
                    length: offset - start,
                });
                run_start = None;
            }
            _ => {}
        }
        offset += want as u64;
    }
    if let Some(start) = run_start {
        regions.push(DataRegion {
            start_offset: start,
            length: offset - start,
        });
    }
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MockSectorDevice;
    use crate::volume::VolumeStream;
    use std::io::BufReader;

    fn make_stream(volume_bytes: Vec<u8>, extents: Vec<PhysicalExtent>, length: u64) -> SparseStream<MockSectorDevice> {
        let device = MockSectorDevice::new(512, volume_bytes);
        let fs = BufReader::new(VolumeStream::new(device));
        SparseStream::from_extents(SharedFs::new(fs), &extents, length)
    }

    #[test]
    fn reads_single_present_region_like_a_dense_file() {
        let mut volume = vec![0u8; 1024];
        for (i, b) in volume.iter_mut().enumerate() {
            *b = (i % 200) as u8;
        }
        let extents = vec![PhysicalExtent {
            file_offset: 0,
            volume_offset: Some(0),
            length: 1024,
        }];
        let mut stream = make_stream(volume.clone(), extents, 1024);
        let mut buf = vec![0u8; 1024];
        let mut total = 0;
        while total < buf.len() {
            let n = stream.read(&mut buf[total..]).unwrap();
            if n == 0 {
                break;
            }
            total += n;
        }
        assert_eq!(total, 1024);
        assert_eq!(buf, volume);
    }

    #[test]
    fn skips_holes_and_returns_fewer_bytes_than_requested() {
        let mut volume = vec![0u8; 2048];
        for b in volume[1024..1536].iter_mut() {
            *b = 0xAB;
        }
        // Logical layout: [0, 512) hole, [512, 1024) present (volume 1024..1536).
        let extents = vec![
            PhysicalExtent {
                file_offset: 0,
                volume_offset: None,
                length: 512,
            },
            PhysicalExtent {
                file_offset: 512,
                volume_offset: Some(1024),
                length: 512,
            },
        ];
        let mut stream = make_stream(volume, extents, 1024);
        let mut buf = vec![0u8; 1024];
        let n = stream.read(&mut buf).unwrap();
        assert!(n < 1024);
        assert_eq!(n, 512);
        assert_eq!(&buf[..512], &[0xABu8; 512][..]);
    }

    #[test]
    fn read_at_end_of_stream_returns_zero() {
        let extents = vec![PhysicalExtent {
            file_offset: 0,
            volume_offset: Some(0),
            length: 512,
        }];
        let mut stream = make_stream(vec![0u8; 512], extents, 512);
        stream.seek(SeekFrom::Start(512)).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn seek_recomputes_region_index() {
        let extents = vec![
            PhysicalExtent {
                file_offset: 0,
                volume_offset: Some(0),
                length: 512,
            },
            PhysicalExtent {
                file_offset: 1024,
                volume_offset: Some(512),
                length: 512,
            },
        ];
        let mut stream = make_stream(vec![0u8; 1024], extents, 1536);
        stream.seek(SeekFrom::Start(1100)).unwrap();
        assert_eq!(stream.current_region_index, 1);
    }

    #[test]
    fn fallback_scanner_synthesizes_regions_from_nonzero_runs() {
        let mut data = vec![0u8; 256];
        for b in data[64..128].iter_mut() {
            *b = 7;
        }
        let mut cursor = std::io::Cursor::new(data);
        let regions = scan_fallback_regions(&mut cursor, 256, 32).unwrap();
        assert_eq!(regions, vec![DataRegion { start_offset: 64, length: 64 }]);
    }
}
