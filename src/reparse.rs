//! C6 — Link Resolver: reparse-buffer parsing and iterative link
//! resolution (spec §4.5, §6, §9).

use std::collections::HashSet;

use log::warn;

use crate::error::{NtfsVaultError, Result};
use crate::interpreter::{self, FsBackend};
use crate::model::{LinkTarget, Options, ReparseKind, ReparseLayout};

const MOUNT_POINT_TAG: u32 = 0xA000_0003;
const SYMLINK_TAG: u32 = 0xA000_000C;

/// Public handle onto C6's two operations (spec §4.5(a)/(b)), exposed
/// directly off [`crate::accessor::Accessor`] alongside C4/C5/C7/C8 so a
/// caller can inspect or drive link resolution without going through a
/// file/directory lookup first.
pub struct LinkResolver<'a, T: FsBackend> {
    interpreter: &'a T,
    drive_id: &'a str,
}

impl<'a, T: FsBackend> LinkResolver<'a, T> {
    pub(crate) fn new(interpreter: &'a T, drive_id: &'a str) -> Self {
        Self { interpreter, drive_id }
    }

    /// spec §4.5(a): `link_target(path) → (kind, raw_target)`. `None` if
    /// `path` is not a reparse point.
    pub fn link_target(&self, path: &str, is_directory: bool) -> Result<Option<LinkTarget>> {
        let local = interpreter::strip_drive_prefix(path);
        link_target(self.interpreter, local, is_directory, self.drive_id)
    }

    /// spec §4.5(b): `resolve_target(path, options) → final_path`, iterating
    /// until a non-reparse target, a policy refusal, or a failure.
    pub fn resolve_target(&self, path: &str, is_directory_hint: bool, options: &Options) -> Result<String> {
        resolve_target(self.interpreter, path, is_directory_hint, options, self.drive_id)
    }
}

/// Per-call cycle/depth state (spec §3's `LinkResolutionState`):
/// "Created on entry to `resolve_target`, discarded on return" — this is
/// the spec-mandated elevation of what the source kept as instance fields
/// (spec §9's "Global visited-set in link resolver" note) into an ephemeral
/// value with no cross-call leakage.
struct LinkResolutionState {
    depth: u32,
    visited: HashSet<String>,
}

impl LinkResolutionState {
    fn new(seed_path: &str) -> Self {
        let mut visited = HashSet::new();
        visited.insert(seed_path.to_lowercase());
        Self { depth: 0, visited }
    }

    /// Checks the depth budget and the visited set for `candidate` *before*
    /// following the hop that produced it, then records the hop. Checking
    /// before incrementing (rather than after) is what makes a chain of
    /// `max_link_depth + 1` links fail reporting `depth == max_link_depth`
    /// (spec §8 scenario S6), instead of `max_link_depth + 1`.
    fn advance(&mut self, candidate: &str, options: &Options) -> Result<()> {
        if self.depth >= options.max_link_depth {
            return Err(NtfsVaultError::LinkRecursion {
                path: candidate.into(),
                depth: self.depth,
            });
        }
        self.depth += 1;
        if !self.visited.insert(candidate.to_lowercase()) {
            return Err(NtfsVaultError::LinkRecursion {
                path: candidate.into(),
                depth: self.depth,
            });
        }
        Ok(())
    }
}

fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

fn looks_like_a_path(s: &str) -> bool {
    !s.is_empty() && (s.contains('\\') || s.contains('/'))
}

struct DecodedPayload {
    raw_target: String,
    kind_hint: ReparseKindHint,
    layout: ReparseLayout,
}

enum ReparseKindHint {
    MountPoint,
    Symlink { relative: bool },
}

/// Decodes a MOUNT_POINT or SYMLINK payload at a given header offset,
/// returning `None` if the offsets fall outside the buffer or the decoded
/// substitute name doesn't look like a path (spec §6/§9: "probe both
/// layouts, prefer the layout with a syntactically valid path").
fn try_decode_at(buffer: &[u8], tag: u32, header_len: usize) -> Option<DecodedPayload> {
    let payload = buffer.get(header_len..)?;
    if payload.len() < 8 {
        return None;
    }
    let subst_off = u16::from_le_bytes([payload[0], payload[1]]) as usize;
    let subst_len = u16::from_le_bytes([payload[2], payload[3]]) as usize;

    let (path_buffer_start, kind_hint) = if tag == SYMLINK_TAG {
        if payload.len() < 12 {
            return None;
        }
        let flags = u32::from_le_bytes([payload[8], payload[9], payload[10], payload[11]]);
        (12, ReparseKindHint::Symlink {
            relative: flags & 1 != 0,
        })
    } else {
        (8, ReparseKindHint::MountPoint)
    };

    let path_buffer = payload.get(path_buffer_start..)?;
    let substitute_bytes = path_buffer.get(subst_off..subst_off + subst_len)?;
    let raw_target = decode_utf16le(substitute_bytes);
    if !looks_like_a_path(&raw_target) {
        return None;
    }

    Some(DecodedPayload {
        raw_target,
        kind_hint,
        layout: if header_len == 0 {
            ReparseLayout::HeaderAbsent
        } else {
            ReparseLayout::HeaderPresent
        },
    })
}

fn post_process_substitute_name(raw: &str, drive_id: &str) -> (String, bool /* same-volume */) {
    let stripped = raw.strip_prefix(r"\??\").unwrap_or(raw);

    if let Some(rest) = stripped.strip_prefix(r"Volume{") {
        // `\??\Volume{guid}\rest...`: cross-volume GUID targets cannot be
        // resolved without a volume-GUID lookup table (out of scope per
        // spec §1); terminate resolution and surface the raw target.
        let _ = rest;
        return (raw.replace('/', "\\"), false);
    }

    let normalized = stripped.replace('/', "\\");
    if normalized.len() >= 2 && normalized.as_bytes()[1] == b':' {
        // Already an absolute `X:\...` path.
        (normalized, true)
    } else if normalized.starts_with('\\') {
        (format!("{drive_id}:{normalized}"), true)
    } else {
        (normalized, true)
    }
}

/// (a) spec §4.5: `link_target(path) → (kind, raw_target)`.
pub(crate) fn link_target<T: FsBackend>(
    interpreter: &T,
    path: &str,
    is_directory: bool,
    drive_id: &str,
) -> Result<Option<LinkTarget>> {
    let Some(buffer) = interpreter.reparse_point(path)? else {
        return Ok(None);
    };

    let decoded = try_decode_at(&buffer.content, buffer.tag, 8)
        .or_else(|| try_decode_at(&buffer.content, buffer.tag, 0));

    let Some(decoded) = decoded else {
        return match buffer.tag {
            MOUNT_POINT_TAG | SYMLINK_TAG => Err(NtfsVaultError::AttributeRead {
                path: path.into(),
                reason: "reparse payload did not yield a valid path under either header layout"
                    .into(),
            }),
            other => Err(NtfsVaultError::UnsupportedReparseTag {
                tag: other,
                path: path.into(),
            }),
        };
    };

    let (kind, relative) = match decoded.kind_hint {
        ReparseKindHint::MountPoint => (ReparseKind::Junction, false),
        ReparseKindHint::Symlink { relative } => {
            let kind = if is_directory {
                ReparseKind::SymbolicDirectory
            } else {
                ReparseKind::SymbolicFile
            };
            (kind, relative)
        }
    };

    let (normalized, _same_volume) = post_process_substitute_name(&decoded.raw_target, drive_id);

    Ok(Some(LinkTarget {
        kind,
        raw_target: normalized,
        layout: decoded.layout,
        relative,
    }))
}

/// (b) spec §4.5: `resolve_target(path, options) → final_path`.
pub(crate) fn resolve_target<T: FsBackend>(
    interpreter: &T,
    path: &str,
    is_directory_hint: bool,
    options: &Options,
    drive_id: &str,
) -> Result<String> {
    let mut state = LinkResolutionState::new(path);
    let mut current = path.to_string();
    let mut current_is_dir = is_directory_hint;

    loop {
        let local = interpreter::strip_drive_prefix(&current);
        let Some(target) = link_target(interpreter, local, current_is_dir, drive_id)? else {
            return Ok(current);
        };

        let relative = target.relative;
        if (relative && !options.follow_relative_links)
            || (!relative && !options.follow_absolute_links)
        {
            return Ok(target.raw_target);
        }

        let candidate = if relative {
            // spec §4.5(b): "composed as canonicalize(parent_dir(link) +
            // target)" — collapse `.`/`..` before the existence check below,
            // since `navigate` treats `..` as an ordinary (non-matching)
            // path component rather than dereferencing it.
            interpreter::canonicalize(&interpreter::join(
                interpreter::parent_dir(&current),
                &target.raw_target,
            ))
        } else {
            target.raw_target.clone()
        };

        state.advance(&candidate, options)?;

        let candidate_local = interpreter::strip_drive_prefix(&candidate);
        if !interpreter.file_exists(candidate_local) && !interpreter.dir_exists(candidate_local) {
            warn!("link target {candidate} does not exist on this volume; stopping resolution");
            return Ok(candidate);
        }

        current_is_dir = interpreter.dir_exists(candidate_local);
        current = candidate;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::interpreter::{FakeEntry, FakeFs};
    use crate::model::ReparseBuffer;

    fn mount_point_buffer(header_len: usize, substitute: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        if header_len == 8 {
            buf.extend_from_slice(&MOUNT_POINT_TAG.to_le_bytes());
            buf.extend_from_slice(&0u16.to_le_bytes()); // data_length, unused
            buf.extend_from_slice(&0u16.to_le_bytes()); // reserved
        } else {
            buf.extend_from_slice(&MOUNT_POINT_TAG.to_le_bytes());
        }
        let subst_utf16: Vec<u8> = substitute
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        let subst_len = subst_utf16.len() as u16;
        buf.extend_from_slice(&0u16.to_le_bytes()); // subst_off
        buf.extend_from_slice(&subst_len.to_le_bytes());
        buf.extend_from_slice(&(subst_len).to_le_bytes()); // print_off (reuse)
        buf.extend_from_slice(&0u16.to_le_bytes()); // print_len
        buf.extend_from_slice(&subst_utf16);
        buf
    }

    fn symlink_buffer(substitute: &str, relative: bool) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&SYMLINK_TAG.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // data_length, unused
        buf.extend_from_slice(&0u16.to_le_bytes()); // reserved
        let subst_utf16: Vec<u8> = substitute
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        let subst_len = subst_utf16.len() as u16;
        buf.extend_from_slice(&0u16.to_le_bytes()); // subst_off
        buf.extend_from_slice(&subst_len.to_le_bytes());
        buf.extend_from_slice(&(subst_len).to_le_bytes()); // print_off (reuse)
        buf.extend_from_slice(&0u16.to_le_bytes()); // print_len
        buf.extend_from_slice(&(relative as u32).to_le_bytes()); // flags
        buf.extend_from_slice(&subst_utf16);
        buf
    }

    #[test]
    fn symlink_flags_bit0_drives_relative_not_path_shape() {
        // The substitute name itself looks absolute (starts with `\`), but
        // the authoritative signal is the flags bit, not the path's shape.
        let buf = symlink_buffer(r"\subdir\target.txt", true);
        let decoded = try_decode_at(&buf, SYMLINK_TAG, 8).unwrap();
        assert!(matches!(decoded.kind_hint, ReparseKindHint::Symlink { relative: true }));
    }

    #[test]
    fn symlink_flags_bit0_clear_means_absolute() {
        let buf = symlink_buffer(r"\??\C:\Users\target.txt", false);
        let decoded = try_decode_at(&buf, SYMLINK_TAG, 8).unwrap();
        assert!(matches!(decoded.kind_hint, ReparseKindHint::Symlink { relative: false }));
    }

    #[test]
    fn decodes_mount_point_with_header_present() {
        let buf = mount_point_buffer(8, r"\??\C:\Users");
        let decoded = try_decode_at(&buf, MOUNT_POINT_TAG, 8).unwrap();
        assert_eq!(decoded.raw_target, r"\??\C:\Users");
        assert!(matches!(decoded.layout, ReparseLayout::HeaderPresent));
    }

    #[test]
    fn decodes_mount_point_with_header_absent() {
        let buf = mount_point_buffer(0, r"\??\C:\Users");
        assert!(try_decode_at(&buf, MOUNT_POINT_TAG, 8).is_none());
        let decoded = try_decode_at(&buf, MOUNT_POINT_TAG, 0).unwrap();
        assert_eq!(decoded.raw_target, r"\??\C:\Users");
        assert!(matches!(decoded.layout, ReparseLayout::HeaderAbsent));
    }

    #[test]
    fn post_processing_strips_nt_prefix_and_keeps_absolute_path() {
        let (normalized, same_volume) = post_process_substitute_name(r"\??\C:\Users", "C");
        assert_eq!(normalized, r"C:\Users");
        assert!(same_volume);
    }

    #[test]
    fn post_processing_handles_volume_guid_as_cross_volume() {
        let (_normalized, same_volume) =
            post_process_substitute_name(r"\??\Volume{11111111-2222-3333-4444-555555555555}\foo", "C");
        assert!(!same_volume);
    }

    #[test]
    fn link_resolution_state_enforces_depth_cap() {
        let options = Options::default().with_max_link_depth(2);
        let mut state = LinkResolutionState::new("start");
        assert!(state.advance("a", &options).is_ok());
        assert!(state.advance("b", &options).is_ok());
        let err = state.advance("c", &options).unwrap_err();
        assert!(matches!(err, NtfsVaultError::LinkRecursion { depth: 2, .. }));
    }

    #[test]
    fn link_resolution_state_detects_revisit() {
        let options = Options::default();
        let mut state = LinkResolutionState::new("start");
        assert!(state.advance("a", &options).is_ok());
        assert!(state.advance("A", &options).is_err());
    }

    #[test]
    fn link_target_reads_through_fs_backend() {
        let mut fs = FakeFs::new();
        fs.add_file(
            r"\link.txt",
            FakeEntry {
                reparse: Some(ReparseBuffer {
                    tag: SYMLINK_TAG,
                    content: symlink_buffer(r"\??\C:\Users\target.txt", false),
                }),
                ..FakeEntry::default()
            },
        );
        let target = link_target(&fs, r"\link.txt", false, "C").unwrap().unwrap();
        assert!(matches!(target.kind, ReparseKind::SymbolicFile));
        assert_eq!(target.raw_target, r"C:\Users\target.txt");
        assert!(!target.relative);
    }

    #[test]
    fn resolve_target_follows_an_absolute_link_to_a_real_file() {
        let mut fs = FakeFs::new();
        fs.add_file(
            r"\link.txt",
            FakeEntry {
                reparse: Some(ReparseBuffer {
                    tag: SYMLINK_TAG,
                    content: symlink_buffer(r"C:\real.txt", false),
                }),
                ..FakeEntry::default()
            },
        );
        fs.add_file(
            r"\real.txt",
            FakeEntry {
                streams: HashMap::from([(String::new(), b"data".to_vec())]),
                ..FakeEntry::default()
            },
        );
        let options = Options::default().with_follow_absolute_links(true);
        let resolved = resolve_target(&fs, r"C:\link.txt", false, &options, "C").unwrap();
        assert_eq!(resolved, r"C:\real.txt");
    }

    #[test]
    fn resolve_target_respects_follow_absolute_links_false() {
        let mut fs = FakeFs::new();
        fs.add_file(
            r"\link.txt",
            FakeEntry {
                reparse: Some(ReparseBuffer {
                    tag: SYMLINK_TAG,
                    content: symlink_buffer(r"C:\real.txt", false),
                }),
                ..FakeEntry::default()
            },
        );
        let options = Options::default().with_follow_absolute_links(false);
        let resolved = resolve_target(&fs, r"C:\link.txt", false, &options, "C").unwrap();
        assert_eq!(resolved, r"C:\real.txt");
    }

    #[test]
    fn resolve_target_follows_a_relative_link_containing_dot_dot() {
        let mut fs = FakeFs::new();
        fs.add_dir(r"\linkdir");
        fs.add_file(
            r"\linkdir\link.txt",
            FakeEntry {
                reparse: Some(ReparseBuffer {
                    tag: SYMLINK_TAG,
                    content: symlink_buffer(r"..\sibling\target.txt", true),
                }),
                ..FakeEntry::default()
            },
        );
        fs.add_file(
            r"\sibling\target.txt",
            FakeEntry {
                streams: HashMap::from([(String::new(), b"data".to_vec())]),
                ..FakeEntry::default()
            },
        );
        let options = Options::default().with_follow_relative_links(true);
        let resolved = resolve_target(&fs, r"C:\linkdir\link.txt", false, &options, "C").unwrap();
        assert_eq!(resolved, r"C:\sibling\target.txt");
    }
}
