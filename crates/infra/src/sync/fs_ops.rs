//! Blocking filesystem primitives used by the sync engine and previews

use std::fs::{self, File, Metadata};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

use arkive_core::FileSnapshot;
use arkive_domain::constants::{COPY_BUFFER_SIZE, KEEP_BOTH_TIMESTAMP_FORMAT};
use chrono::{DateTime, Utc};
use filetime::FileTime;
use sha2::{Digest, Sha256};

/// `/`-separated path of `path` below `root`.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Key used to match destination files against the source set when looking
/// for orphans. Folded to lowercase where the usual filesystems ignore case,
/// so a case-only rename in the source never deletes the file it just synced.
#[cfg(any(windows, target_os = "macos"))]
pub fn orphan_key(relative_key: &str) -> String {
    relative_key.to_lowercase()
}

#[cfg(not(any(windows, target_os = "macos")))]
pub fn orphan_key(relative_key: &str) -> String {
    relative_key.to_owned()
}

/// Dot-prefixed in any component, or carrying the hidden/system attribute
/// where the platform has one.
pub fn is_hidden_or_system(relative_key: &str, metadata: &Metadata) -> bool {
    relative_key.split('/').any(|part| part.starts_with('.')) || has_hidden_attribute(metadata)
}

#[cfg(windows)]
fn has_hidden_attribute(metadata: &Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;

    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;
    metadata.file_attributes() & (FILE_ATTRIBUTE_HIDDEN | FILE_ATTRIBUTE_SYSTEM) != 0
}

#[cfg(not(windows))]
fn has_hidden_attribute(_metadata: &Metadata) -> bool {
    false
}

pub fn snapshot(path: &Path, metadata: &Metadata) -> io::Result<FileSnapshot> {
    let modified: DateTime<Utc> = metadata.modified()?.into();
    Ok(FileSnapshot::new(path.to_string_lossy(), metadata.len(), modified))
}

/// Snapshot of `path` when it exists as a regular file.
pub fn snapshot_if_file(path: &Path) -> io::Result<Option<FileSnapshot>> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => snapshot(path, &metadata).map(Some),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Sibling of `destination` with `_<timestamp>` inserted before the
/// extension.
pub fn keep_both_path(destination: &Path, now: DateTime<Utc>) -> PathBuf {
    let stamp = now.format(KEEP_BOTH_TIMESTAMP_FORMAT);
    let stem = destination.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match destination.extension() {
        Some(ext) => format!("{stem}_{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{stamp}"),
    };
    destination.with_file_name(name)
}

/// Stream `source` into `destination`, then carry over timestamps and
/// permissions. Returns the number of bytes written.
pub fn copy_with_metadata(source: &Path, destination: &Path) -> io::Result<u64> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    make_writable(destination)?;

    let source_meta = fs::metadata(source)?;
    let mut reader = BufReader::with_capacity(COPY_BUFFER_SIZE, File::open(source)?);
    let mut writer = BufWriter::with_capacity(COPY_BUFFER_SIZE, File::create(destination)?);
    let written = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    drop(writer);

    filetime::set_file_times(
        destination,
        FileTime::from_last_access_time(&source_meta),
        FileTime::from_last_modification_time(&source_meta),
    )?;
    copy_creation_time(&source_meta, destination)?;
    fs::set_permissions(destination, source_meta.permissions())?;
    Ok(written)
}

#[cfg(windows)]
fn copy_creation_time(source_meta: &Metadata, destination: &Path) -> io::Result<()> {
    use std::fs::FileTimes;
    use std::os::windows::fs::FileTimesExt;

    let created = source_meta.created()?;
    let file = fs::OpenOptions::new().write(true).open(destination)?;
    file.set_times(FileTimes::new().set_created(created))
}

// Creation time cannot be set through std elsewhere
#[cfg(not(windows))]
fn copy_creation_time(_source_meta: &Metadata, _destination: &Path) -> io::Result<()> {
    Ok(())
}

/// Delete a file, clearing a read-only flag first.
pub fn remove_file(path: &Path) -> io::Result<()> {
    make_writable(path)?;
    fs::remove_file(path)
}

/// True when both files hash to the same SHA-256 digest.
pub fn contents_match(left: &Path, right: &Path) -> io::Result<bool> {
    Ok(sha256_hex(left)? == sha256_hex(right)?)
}

pub fn sha256_hex(path: &Path) -> io::Result<String> {
    let mut reader = BufReader::with_capacity(COPY_BUFFER_SIZE, File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[allow(clippy::permissions_set_readonly_false)]
fn make_writable(path: &Path) -> io::Result<()> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.permissions().readonly() => {
            let mut permissions = metadata.permissions();
            permissions.set_readonly(false);
            fs::set_permissions(path, permissions)
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
