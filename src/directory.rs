//! C8 — Directory Reader: per-directory metadata, listing, and recursive
//! enumeration with link following (spec §4.7).

use log::warn;

use crate::error::{NtfsVaultError, Result};
use crate::file::FileReader;
use crate::interpreter::{self, FsBackend};
use crate::model::{DirectoryRecord, FileRecord, Options};
use crate::reparse;

pub struct DirectoryReader<'a, T: FsBackend> {
    interpreter: &'a T,
    drive_id: &'a str,
}

impl<'a, T: FsBackend> DirectoryReader<'a, T> {
    pub(crate) fn new(interpreter: &'a T, drive_id: &'a str) -> Self {
        Self {
            interpreter,
            drive_id,
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.interpreter.dir_exists(interpreter::strip_drive_prefix(path))
    }

    pub fn dir_info(&self, path: &str, resolve_links: bool, options: &Options) -> Result<DirectoryRecord> {
        let local = interpreter::strip_drive_prefix(path);
        if !self.interpreter.dir_exists(local) {
            return Err(NtfsVaultError::NotFound { path: path.into() });
        }

        let raw = self.interpreter.file_info(local)?;
        let link_target = if raw.attributes.is_reparse_point() {
            reparse::link_target(self.interpreter, local, true, self.drive_id)?
        } else {
            None
        };

        if raw.attributes.is_reparse_point() && resolve_links {
            let resolved = reparse::resolve_target(self.interpreter, path, true, options, self.drive_id)?;
            if resolved != path {
                return self.dir_info(&resolved, resolve_links, options);
            }
        }

        Ok(DirectoryRecord {
            full_path: path.to_string(),
            creation_time: raw.creation_time,
            last_access_time: raw.last_access_time,
            last_write_time: raw.last_write_time,
            attributes: raw.attributes,
            link_target,
        })
    }

    /// One-level target switch for the listing root only (spec §4.7: "not
    /// per-entry"). Returns the caller-facing path to actually list.
    fn resolve_listing_root(&self, path: &str, resolve_links: bool, options: &Options) -> Result<String> {
        let local = interpreter::strip_drive_prefix(path);
        if !self.interpreter.dir_exists(local) {
            return Err(NtfsVaultError::NotFound { path: path.into() });
        }
        let raw = self.interpreter.file_info(local)?;
        if raw.attributes.is_reparse_point() && resolve_links {
            return reparse::resolve_target(self.interpreter, path, true, options, self.drive_id);
        }
        Ok(path.to_string())
    }

    #[allow(clippy::too_many_arguments)]
    fn walk(
        &self,
        interp_dir: &str,
        caller_dir: &str,
        pattern: &str,
        recurse: bool,
        resolve_links: bool,
        options: &Options,
        want_files: bool,
        want_dirs: bool,
        files_out: &mut Vec<FileRecord>,
        dirs_out: &mut Vec<DirectoryRecord>,
    ) {
        let children = match self.interpreter.list_children(interp_dir) {
            Ok(c) => c,
            Err(e) => {
                warn!("failed to list {caller_dir}: {e}");
                return;
            }
        };

        // Preorder: this level's matches before any descent. Metadata is
        // fetched through `interp_dir` (already resolved past a followed
        // root-level reparse point, per the one-level target switch above),
        // never through the caller's unresolved `caller_dir` — `navigate`
        // does not dereference junctions mid-path, so re-navigating through
        // the original root would fail every entry beneath it. The record's
        // `full_path` is then rewritten back onto `caller_dir` so listings
        // stay rooted under the caller's input path (spec §4.7).
        for child in &children {
            if !interpreter::glob_match(pattern, &child.name) {
                continue;
            }
            let caller_path = interpreter::join(caller_dir, &child.name);
            let interp_path = interpreter::join(interp_dir, &child.name);
            if child.is_directory {
                if want_dirs {
                    match self.dir_info(&interp_path, resolve_links, options) {
                        Ok(mut record) => {
                            record.full_path = caller_path;
                            dirs_out.push(record);
                        }
                        Err(e) => warn!("skipping directory {caller_path}: {e}"),
                    }
                }
            } else if want_files {
                let file_reader = FileReader::new(self.interpreter, self.drive_id);
                match file_reader.file_info(&interp_path, resolve_links, options) {
                    Ok(mut record) => {
                        record.full_path = caller_path;
                        files_out.push(record);
                    }
                    Err(e) => warn!("skipping file {caller_path}: {e}"),
                }
            }
        }

        if !recurse {
            return;
        }

        for child in &children {
            if !child.is_directory {
                continue;
            }
            let caller_path = interpreter::join(caller_dir, &child.name);
            let interp_path = interpreter::join(interp_dir, &child.name);
            self.walk(
                &interp_path,
                &caller_path,
                pattern,
                recurse,
                resolve_links,
                options,
                want_files,
                want_dirs,
                files_out,
                dirs_out,
            );
        }
    }

    pub fn list_files(
        &self,
        path: &str,
        pattern: &str,
        recurse: bool,
        resolve_links: bool,
        options: &Options,
    ) -> Result<Vec<FileRecord>> {
        let root = self.resolve_listing_root(path, resolve_links, options)?;
        let interp_root = interpreter::strip_drive_prefix(&root).to_string();
        let mut files = Vec::new();
        let mut dirs = Vec::new();
        self.walk(
            &interp_root,
            path,
            pattern,
            recurse,
            resolve_links,
            options,
            true,
            false,
            &mut files,
            &mut dirs,
        );
        Ok(files)
    }

    pub fn list_dirs(
        &self,
        path: &str,
        pattern: &str,
        recurse: bool,
        resolve_links: bool,
        options: &Options,
    ) -> Result<Vec<DirectoryRecord>> {
        let root = self.resolve_listing_root(path, resolve_links, options)?;
        let interp_root = interpreter::strip_drive_prefix(&root).to_string();
        let mut files = Vec::new();
        let mut dirs = Vec::new();
        self.walk(
            &interp_root,
            path,
            pattern,
            recurse,
            resolve_links,
            options,
            false,
            true,
            &mut files,
            &mut dirs,
        );
        Ok(dirs)
    }
}
