//! Shared, interior-mutable handle to the buffered volume reader that
//! backs `ntfs::Ntfs`.
//!
//! The spec's concurrency model (§5) says streams "share the same
//! interpreter state" and a single accessor "MUST NOT be used from more
//! than one thread concurrently" — i.e. single-threaded, cooperative
//! aliasing rather than true concurrent access. `Rc<RefCell<_>>` encodes
//! exactly that: free sharing within one thread, and a borrow-checker panic
//! (rather than silent corruption) on the one misuse the spec forbids —
//! reentrant access to the reader from two streams at once.

use std::cell::{RefCell, RefMut};
use std::io::BufReader;
use std::rc::Rc;

use crate::device::SectorDevice;
use crate::volume::VolumeStream;

pub(crate) struct SharedFs<D: SectorDevice>(Rc<RefCell<BufReader<VolumeStream<D>>>>);

impl<D: SectorDevice> SharedFs<D> {
    pub(crate) fn new(fs: BufReader<VolumeStream<D>>) -> Self {
        Self(Rc::new(RefCell::new(fs)))
    }

    pub(crate) fn borrow_mut(&self) -> RefMut<'_, BufReader<VolumeStream<D>>> {
        self.0.borrow_mut()
    }
}

impl<D: SectorDevice> Clone for SharedFs<D> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}
