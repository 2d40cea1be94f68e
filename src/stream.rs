//! The stream capability surface handed back to callers (spec §6, §9):
//! "polymorphism over 'is a stream' is a capability set `{len, position,
//! seek, read}`" — no trait object hierarchy beyond this single trait.

use std::io::{self, Cursor, Read, Seek, SeekFrom};

pub trait Stream: Read + Seek {
    /// Nominal length of the stream's content, independent of the current
    /// position.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stream over attribute data small enough to be resident in the MFT
/// record. Resident data is eagerly copied out (spec §3 ownership note:
/// "streams ... close independently") — there is no lifetime to manage
/// since it never touches the volume again.
pub struct ResidentStream {
    cursor: Cursor<Vec<u8>>,
    len: u64,
}

impl ResidentStream {
    pub(crate) fn new(data: Vec<u8>) -> Self {
        let len = data.len() as u64;
        Self {
            cursor: Cursor::new(data),
            len,
        }
    }
}

impl Read for ResidentStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for ResidentStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl Stream for ResidentStream {
    fn len(&self) -> u64 {
        self.len
    }
}
