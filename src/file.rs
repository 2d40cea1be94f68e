//! C7 — File Reader: per-file metadata, stream selection, and whole-file
//! copy including ADS fan-out (spec §4.6).

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::SystemTime;

use log::warn;

use crate::ads::AdsHandler;
use crate::error::{NtfsVaultError, Result};
use crate::interpreter::{self, FsBackend};
use crate::model::{FileAttributes, FileRecord, Options};
use crate::reparse;
use crate::stream::Stream;

/// Host-provided destination sink (spec §1: "Destination-side writing ...
/// the core emits a sequence of stream-write commands that a host adapter
/// binds to its local file API, including creation of ADS on the
/// destination").
pub trait Destination {
    fn exists(&mut self, path: &str) -> io::Result<bool>;
    fn ensure_parent_dir(&mut self, path: &str) -> io::Result<()>;
    fn create_primary(&mut self, path: &str) -> io::Result<Box<dyn Write>>;
    fn create_ads(&mut self, path: &str, name: &str) -> io::Result<Box<dyn Write>>;
    fn set_times(
        &mut self,
        path: &str,
        creation: SystemTime,
        last_write: SystemTime,
        last_access: SystemTime,
    ) -> io::Result<()>;
    fn set_attributes(&mut self, path: &str, attributes: FileAttributes) -> io::Result<()>;
}

fn to_write_err(path: &str, source: io::Error) -> NtfsVaultError {
    NtfsVaultError::DestinationWrite {
        path: path.into(),
        source,
    }
}

fn copy_stream(
    source: &mut dyn Stream,
    dest: &mut dyn Write,
    dest_path: &str,
    buffer_size: usize,
) -> Result<()> {
    let mut buf = vec![0u8; buffer_size.max(4096)];
    loop {
        let n = source
            .read(&mut buf)
            .map_err(|e| NtfsVaultError::DeviceIo { lba: 0, source: e })?;
        if n == 0 {
            break;
        }
        dest.write_all(&buf[..n])
            .map_err(|e| to_write_err(dest_path, e))?;
    }
    Ok(())
}

pub struct FileReader<'a, T: FsBackend> {
    interpreter: &'a T,
    drive_id: &'a str,
}

impl<'a, T: FsBackend> FileReader<'a, T> {
    pub(crate) fn new(interpreter: &'a T, drive_id: &'a str) -> Self {
        Self {
            interpreter,
            drive_id,
        }
    }

    /// `exists(path) → bool` (spec §4.6): swallows interpreter errors.
    pub fn exists(&self, path: &str) -> bool {
        let (base, _) = interpreter::split_ads(path);
        let local = interpreter::strip_drive_prefix(base);
        self.interpreter.file_exists(local)
    }

    fn hard_link_siblings(&self, full_path: &str, size: u64, creation_time: SystemTime) -> Vec<PathBuf> {
        let parent = interpreter::parent_dir(full_path);
        let Ok(children) = self
            .interpreter
            .list_children(interpreter::strip_drive_prefix(parent))
        else {
            return Vec::new();
        };
        let self_name = interpreter::file_name(full_path);
        let mut siblings = Vec::new();
        for child in children {
            if child.is_directory || child.name.eq_ignore_ascii_case(self_name) {
                continue;
            }
            let sibling_path = interpreter::join(parent, &child.name);
            if let Ok(info) = self
                .interpreter
                .file_info(interpreter::strip_drive_prefix(&sibling_path))
            {
                if !info.is_directory && info.size == size && info.creation_time == creation_time {
                    siblings.push(PathBuf::from(sibling_path));
                }
            }
        }
        siblings
    }

    /// `file_info(path, resolve_links, options) → FileRecord` (spec §4.6).
    pub fn file_info(&self, path: &str, resolve_links: bool, options: &Options) -> Result<FileRecord> {
        let (base, ads) = interpreter::split_ads(path);
        let local = interpreter::strip_drive_prefix(base);
        if !self.interpreter.file_exists(local) {
            return Err(NtfsVaultError::NotFound { path: path.into() });
        }

        let raw = self.interpreter.file_info(local)?;
        let ads_names = self.interpreter.alternate_data_streams(local)?;
        let link_target = if raw.attributes.is_reparse_point() {
            reparse::link_target(self.interpreter, local, raw.is_directory, self.drive_id)?
        } else {
            None
        };

        if raw.attributes.is_reparse_point() && resolve_links {
            let resolved =
                reparse::resolve_target(self.interpreter, base, raw.is_directory, options, self.drive_id)?;
            if resolved != base {
                let full = if ads.is_empty() {
                    resolved
                } else {
                    format!("{resolved}:{ads}")
                };
                return self.file_info(&full, resolve_links, options);
            }
        }

        let hard_link_siblings = if options.detect_hard_links {
            self.hard_link_siblings(base, raw.size, raw.creation_time)
        } else {
            Vec::new()
        };

        Ok(FileRecord {
            full_path: path.to_string(),
            size: raw.size,
            creation_time: raw.creation_time,
            last_access_time: raw.last_access_time,
            last_write_time: raw.last_write_time,
            attributes: raw.attributes,
            ads_names,
            link_target,
            hard_link_siblings,
        })
    }

    /// `open(path, options) → stream` (spec §4.6).
    pub fn open(&self, path: &str, options: &Options) -> Result<Box<dyn Stream>> {
        let (base, ads) = interpreter::split_ads(path);
        let local = interpreter::strip_drive_prefix(base);
        if !self.interpreter.file_exists(local) {
            return Err(NtfsVaultError::NotFound { path: path.into() });
        }
        let raw = self.interpreter.file_info(local)?;

        if raw.attributes.is_reparse_point() {
            let resolved =
                reparse::resolve_target(self.interpreter, base, raw.is_directory, options, self.drive_id)?;
            if resolved != base {
                let full = if ads.is_empty() {
                    resolved
                } else {
                    format!("{resolved}:{ads}")
                };
                return self.open(&full, options);
            }
        }

        if !ads.is_empty() {
            return AdsHandler::new(self.interpreter).open(local, ads, raw.attributes.is_sparse());
        }

        self.interpreter.open_stream(local, "")
    }

    /// `copy(source, dest, overwrite, options)` (spec §4.6): streamed,
    /// never buffers the full file.
    pub fn copy<Dest: Destination>(
        &self,
        source: &str,
        dest: &mut Dest,
        dest_path: &str,
        overwrite: bool,
        options: &Options,
    ) -> Result<()> {
        if dest
            .exists(dest_path)
            .map_err(|e| to_write_err(dest_path, e))?
            && !overwrite
        {
            return Err(NtfsVaultError::AlreadyExists {
                path: dest_path.into(),
            });
        }
        dest.ensure_parent_dir(dest_path)
            .map_err(|e| to_write_err(dest_path, e))?;

        let (base, ads) = interpreter::split_ads(source);
        if !ads.is_empty() {
            let local = interpreter::strip_drive_prefix(base);
            let is_sparse = self.interpreter.file_info(local)?.attributes.is_sparse();
            let mut stream = AdsHandler::new(self.interpreter).open(local, ads, is_sparse)?;
            let mut writer = dest
                .create_primary(dest_path)
                .map_err(|e| to_write_err(dest_path, e))?;
            copy_stream(stream.as_mut(), writer.as_mut(), dest_path, options.buffer_size)?;
            return Ok(());
        }

        let record = self.file_info(source, true, options)?;
        let resolved_local = interpreter::strip_drive_prefix(&record.full_path);

        let mut primary = self.open(&record.full_path, options)?;
        let mut writer = dest
            .create_primary(dest_path)
            .map_err(|e| to_write_err(dest_path, e))?;
        copy_stream(primary.as_mut(), writer.as_mut(), dest_path, options.buffer_size)?;

        for name in &record.ads_names {
            let mut ads_stream =
                AdsHandler::new(self.interpreter).open(resolved_local, name, record.is_sparse())?;
            let mut ads_writer = dest
                .create_ads(dest_path, name)
                .map_err(|e| to_write_err(dest_path, e))?;
            copy_stream(ads_stream.as_mut(), ads_writer.as_mut(), dest_path, options.buffer_size)?;
        }

        if let Err(e) = dest.set_times(
            dest_path,
            record.creation_time,
            record.last_write_time,
            record.last_access_time,
        ) {
            warn!("failed to propagate timestamps to {dest_path}: {e}");
        }
        if let Err(e) = dest.set_attributes(dest_path, record.attributes) {
            warn!("failed to propagate attributes to {dest_path}: {e}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::*;
    use crate::interpreter::{FakeEntry, FakeFs};

    #[derive(Default)]
    struct MemDestination {
        files: Rc<RefCell<HashMap<String, Vec<u8>>>>,
        ads: Rc<RefCell<HashMap<(String, String), Vec<u8>>>>,
        attributes: HashMap<String, FileAttributes>,
    }

    impl MemDestination {
        fn new() -> Self {
            Self::default()
        }
    }

    struct SlotWriter<K> {
        map: Rc<RefCell<HashMap<K, Vec<u8>>>>,
        key: K,
    }

    impl<K: std::hash::Hash + Eq + Clone> Write for SlotWriter<K> {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.map
                .borrow_mut()
                .entry(self.key.clone())
                .or_default()
                .extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Destination for MemDestination {
        fn exists(&mut self, path: &str) -> io::Result<bool> {
            Ok(self.files.borrow().contains_key(path))
        }

        fn ensure_parent_dir(&mut self, _path: &str) -> io::Result<()> {
            Ok(())
        }

        fn create_primary(&mut self, path: &str) -> io::Result<Box<dyn Write>> {
            self.files.borrow_mut().insert(path.to_string(), Vec::new());
            Ok(Box::new(SlotWriter {
                map: Rc::clone(&self.files),
                key: path.to_string(),
            }))
        }

        fn create_ads(&mut self, path: &str, name: &str) -> io::Result<Box<dyn Write>> {
            self.ads
                .borrow_mut()
                .insert((path.to_string(), name.to_string()), Vec::new());
            Ok(Box::new(SlotWriter {
                map: Rc::clone(&self.ads),
                key: (path.to_string(), name.to_string()),
            }))
        }

        fn set_times(
            &mut self,
            _path: &str,
            _creation: SystemTime,
            _last_write: SystemTime,
            _last_access: SystemTime,
        ) -> io::Result<()> {
            Ok(())
        }

        fn set_attributes(&mut self, path: &str, attributes: FileAttributes) -> io::Result<()> {
            self.attributes.insert(path.to_string(), attributes);
            Ok(())
        }
    }

    fn reader<'a>(fs: &'a FakeFs) -> FileReader<'a, FakeFs> {
        FileReader::new(fs, "C")
    }

    #[test]
    fn exists_reflects_backend() {
        let mut fs = FakeFs::new();
        fs.add_file(
            r"\docs\a.txt",
            FakeEntry {
                streams: HashMap::from([(String::new(), b"hello".to_vec())]),
                ..FakeEntry::default()
            },
        );
        let files = reader(&fs);
        assert!(files.exists(r"C:\docs\a.txt"));
        assert!(!files.exists(r"C:\docs\missing.txt"));
    }

    #[test]
    fn file_info_reports_size_and_ads_names() {
        let mut fs = FakeFs::new();
        fs.add_file(
            r"\docs\a.txt",
            FakeEntry {
                streams: HashMap::from([
                    (String::new(), b"hello".to_vec()),
                    ("secret".to_string(), b"hidden".to_vec()),
                ]),
                ..FakeEntry::default()
            },
        );
        let files = reader(&fs);
        let info = files
            .file_info(r"C:\docs\a.txt", true, &Options::default())
            .unwrap();
        assert_eq!(info.size, 5);
        assert_eq!(info.ads_names, vec!["secret".to_string()]);
        assert!(info.link_target.is_none());
    }

    #[test]
    fn file_info_missing_path_is_not_found() {
        let fs = FakeFs::new();
        let files = reader(&fs);
        let err = files
            .file_info(r"C:\missing.txt", true, &Options::default())
            .unwrap_err();
        assert!(matches!(err, NtfsVaultError::NotFound { .. }));
    }

    #[test]
    fn open_reads_primary_stream_content() {
        let mut fs = FakeFs::new();
        fs.add_file(
            r"\docs\a.txt",
            FakeEntry {
                streams: HashMap::from([(String::new(), b"payload".to_vec())]),
                ..FakeEntry::default()
            },
        );
        let files = reader(&fs);
        let mut stream = files.open(r"C:\docs\a.txt", &Options::default()).unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"payload");
    }

    #[test]
    fn open_follows_a_symbolic_link_to_its_target() {
        let mut fs = FakeFs::new();
        fs.add_file(
            r"\real.txt",
            FakeEntry {
                streams: HashMap::from([(String::new(), b"target data".to_vec())]),
                ..FakeEntry::default()
            },
        );
        fs.add_file(
            r"\link.txt",
            FakeEntry {
                attributes: FileAttributes::REPARSE_POINT,
                reparse: Some(symlink_buffer(r"C:\real.txt")),
                ..FakeEntry::default()
            },
        );
        let files = reader(&fs);
        let options = Options::default().with_follow_absolute_links(true);
        let mut stream = files.open(r"C:\link.txt", &options).unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"target data");
    }

    #[test]
    fn copy_streams_primary_and_ads_into_destination() {
        let mut fs = FakeFs::new();
        fs.add_file(
            r"\docs\a.txt",
            FakeEntry {
                streams: HashMap::from([
                    (String::new(), b"primary".to_vec()),
                    ("note".to_string(), b"ads-data".to_vec()),
                ]),
                ..FakeEntry::default()
            },
        );
        let files = reader(&fs);
        let mut dest = MemDestination::new();
        files
            .copy(r"C:\docs\a.txt", &mut dest, r"D:\out\a.txt", false, &Options::default())
            .unwrap();
        assert_eq!(
            dest.files.borrow().get(r"D:\out\a.txt").map(Vec::as_slice),
            Some(b"primary".as_slice())
        );
        assert_eq!(
            dest.ads
                .borrow()
                .get(&(r"D:\out\a.txt".to_string(), "note".to_string()))
                .map(Vec::as_slice),
            Some(b"ads-data".as_slice())
        );
    }

    #[test]
    fn copy_refuses_overwrite_when_destination_exists_and_overwrite_false() {
        let mut fs = FakeFs::new();
        fs.add_file(
            r"\docs\a.txt",
            FakeEntry {
                streams: HashMap::from([(String::new(), b"primary".to_vec())]),
                ..FakeEntry::default()
            },
        );
        let files = reader(&fs);
        let mut dest = MemDestination::new();
        dest.files
            .borrow_mut()
            .insert(r"D:\out\a.txt".to_string(), Vec::new());
        let err = files
            .copy(r"C:\docs\a.txt", &mut dest, r"D:\out\a.txt", false, &Options::default())
            .unwrap_err();
        assert!(matches!(err, NtfsVaultError::AlreadyExists { .. }));
    }

    fn symlink_buffer(absolute_target: &str) -> crate::model::ReparseBuffer {
        const SYMLINK_TAG: u32 = 0xA000_000C;
        let mut buf = Vec::new();
        buf.extend_from_slice(&SYMLINK_TAG.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        let subst_utf16: Vec<u8> = absolute_target
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        let subst_len = subst_utf16.len() as u16;
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&subst_len.to_le_bytes());
        buf.extend_from_slice(&subst_len.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes()); // flags: absolute
        buf.extend_from_slice(&subst_utf16);
        crate::model::ReparseBuffer {
            tag: SYMLINK_TAG,
            content: buf,
        }
    }
}
