//! C5 — ADS Handler: enumerate and open alternate data streams (spec §4.4).

use crate::error::{NtfsVaultError, Result};
use crate::interpreter::FsBackend;
use crate::stream::Stream;

pub struct AdsHandler<'a, T: FsBackend> {
    interpreter: &'a T,
}

impl<'a, T: FsBackend> AdsHandler<'a, T> {
    pub(crate) fn new(interpreter: &'a T) -> Self {
        Self { interpreter }
    }

    /// Ordered, distinct alternate-data-stream names on `path`.
    pub fn enumerate(&self, path: &str) -> Result<Vec<String>> {
        if !self.interpreter.file_exists(path) {
            return Err(NtfsVaultError::NotFound { path: path.into() });
        }
        self.interpreter.alternate_data_streams(path)
    }

    /// Opens `"{path}:{ads_name}"` (spec §4.4). `is_sparse` comes from the
    /// base file's attributes, supplied by the caller (C7/C8) rather than
    /// re-derived here.
    pub fn open(&self, path: &str, ads_name: &str, is_sparse: bool) -> Result<Box<dyn Stream>> {
        if ads_name.is_empty() {
            return Err(NtfsVaultError::InvalidArgument(
                "alternate data stream name must not be empty".into(),
            ));
        }

        let _ = is_sparse;
        self.interpreter
            .open_stream(path, ads_name)
            .map_err(|e| NtfsVaultError::AdsOpen {
                path: path.into(),
                name: ads_name.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Read;

    use super::*;
    use crate::interpreter::{FakeEntry, FakeFs};

    #[test]
    fn enumerate_lists_named_streams_only() {
        let mut fs = FakeFs::new();
        fs.add_file(
            r"\a.txt",
            FakeEntry {
                streams: HashMap::from([
                    (String::new(), b"primary".to_vec()),
                    ("zone.identifier".to_string(), b"3".to_vec()),
                ]),
                ..FakeEntry::default()
            },
        );
        let handler = AdsHandler::new(&fs);
        assert_eq!(handler.enumerate(r"\a.txt").unwrap(), vec!["zone.identifier".to_string()]);
    }

    #[test]
    fn open_rejects_empty_stream_name() {
        let mut fs = FakeFs::new();
        fs.add_file(r"\a.txt", FakeEntry::default());
        let handler = AdsHandler::new(&fs);
        let err = handler.open(r"\a.txt", "", false).unwrap_err();
        assert!(matches!(err, NtfsVaultError::InvalidArgument(_)));
    }

    #[test]
    fn open_reads_named_stream_content() {
        let mut fs = FakeFs::new();
        fs.add_file(
            r"\a.txt",
            FakeEntry {
                streams: HashMap::from([("zone.identifier".to_string(), b"3".to_vec())]),
                ..FakeEntry::default()
            },
        );
        let handler = AdsHandler::new(&fs);
        let mut stream = handler.open(r"\a.txt", "zone.identifier", false).unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"3");
    }
}
