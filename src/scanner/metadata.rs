//! File metadata used by policy predicates.
//!
//! [`FileMeta`] is a plain snapshot: size, access / modify / change times,
//! permission bits, and owning user and group names. Reading it never
//! mutates anything. Owner and group fall back to the numeric id when the
//! name cannot be resolved.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use super::MetadataError;

/// Metadata snapshot for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMeta {
    /// File size in bytes
    pub size: u64,
    /// Last access time
    pub accessed: Option<DateTime<Utc>>,
    /// Last content modification time
    pub modified: Option<DateTime<Utc>>,
    /// Last metadata change time (creation time on non-Unix platforms)
    pub changed: Option<DateTime<Utc>>,
    /// Raw mode bits (Unix only)
    pub mode: Option<u32>,
    /// Owning user name
    pub owner: Option<String>,
    /// Owning group name
    pub group: Option<String>,
}

impl FileMeta {
    /// Permission bits rendered as a 3-digit octal string, e.g. `"644"`.
    #[must_use]
    pub fn permissions_octal(&self) -> Option<String> {
        self.mode.map(|mode| format!("{:03o}", mode & 0o777))
    }
}

/// Source of file metadata.
///
/// The policy engine reads metadata through this trait so that predicates
/// can be evaluated against synthetic metadata in tests.
pub trait MetadataAccessor {
    /// Read the metadata of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] if the file cannot be inspected.
    fn metadata(&self, path: &Path) -> Result<FileMeta, MetadataError>;
}

/// Reads metadata from the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMetadata;

impl MetadataAccessor for FsMetadata {
    fn metadata(&self, path: &Path) -> Result<FileMeta, MetadataError> {
        read_metadata(path)
    }
}

/// Read a [`FileMeta`] snapshot from the filesystem.
///
/// # Errors
///
/// Returns [`MetadataError`] if `stat` fails.
pub fn read_metadata(path: &Path) -> Result<FileMeta, MetadataError> {
    let meta = fs::metadata(path).map_err(|e| MetadataError::from_io(path, e))?;

    let mut info = FileMeta {
        size: meta.len(),
        accessed: meta.accessed().ok().map(DateTime::<Utc>::from),
        modified: meta.modified().ok().map(DateTime::<Utc>::from),
        ..FileMeta::default()
    };
    fill_platform_fields(&meta, &mut info);

    Ok(info)
}

/// Size of a file in bytes.
///
/// # Errors
///
/// Returns [`MetadataError`] if `stat` fails.
pub fn file_size(path: &Path) -> Result<u64, MetadataError> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| MetadataError::from_io(path, e))
}

#[cfg(unix)]
fn fill_platform_fields(meta: &fs::Metadata, info: &mut FileMeta) {
    use std::os::unix::fs::MetadataExt;

    let nanos = meta.ctime_nsec().clamp(0, 999_999_999) as u32;
    info.changed = DateTime::from_timestamp(meta.ctime(), nanos);
    info.mode = Some(meta.mode());
    info.owner = Some(user_name(meta.uid()));
    info.group = Some(group_name(meta.gid()));
}

#[cfg(not(unix))]
fn fill_platform_fields(meta: &fs::Metadata, info: &mut FileMeta) {
    info.changed = meta.created().ok().map(DateTime::<Utc>::from);
}

#[cfg(unix)]
fn user_name(uid: u32) -> String {
    use nix::unistd::{Uid, User};

    match User::from_uid(Uid::from_raw(uid)) {
        Ok(Some(user)) => user.name,
        Ok(None) => uid.to_string(),
        Err(e) => {
            log::debug!("Failed to resolve uid {}: {}", uid, e);
            uid.to_string()
        }
    }
}

#[cfg(unix)]
fn group_name(gid: u32) -> String {
    use nix::unistd::{Gid, Group};

    match Group::from_gid(Gid::from_raw(gid)) {
        Ok(Some(group)) => group.name,
        Ok(None) => gid.to_string(),
        Err(e) => {
            log::debug!("Failed to resolve gid {}: {}", gid, e);
            gid.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_permissions_octal() {
        let meta = FileMeta {
            mode: Some(0o100644),
            ..FileMeta::default()
        };
        assert_eq!(meta.permissions_octal().as_deref(), Some("644"));

        let meta = FileMeta {
            mode: Some(0o7),
            ..FileMeta::default()
        };
        assert_eq!(meta.permissions_octal().as_deref(), Some("007"));

        assert_eq!(FileMeta::default().permissions_octal(), None);
    }

    #[test]
    fn test_read_metadata_reports_size_and_times() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meta.txt");
        fs::write(&path, b"12345").unwrap();

        let meta = FsMetadata.metadata(&path).unwrap();
        assert_eq!(meta.size, 5);
        assert!(meta.modified.is_some());
        assert_eq!(file_size(&path).unwrap(), 5);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_metadata_unix_fields() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mode.txt");
        fs::write(&path, b"x").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let meta = read_metadata(&path).unwrap();
        assert_eq!(meta.permissions_octal().as_deref(), Some("640"));
        assert!(meta.changed.is_some());
        assert!(meta.owner.is_some());
        assert!(meta.group.is_some());
    }

    #[test]
    fn test_missing_file() {
        let err = read_metadata(Path::new("/no/such/file/here")).unwrap_err();
        assert!(matches!(err, MetadataError::NotFound(_)));
    }
}
