//! Zip-format archive enumeration.
//!
//! Entries are reported in the order of the archive's central directory,
//! which for archives written front-to-back is their physical order. Entry
//! data is never decompressed. Failures always propagate: an archive that
//! can't be opened or read is an error, never an empty listing.

use crate::error::{ErrorKind, Result};
use crate::models::ArchiveEntry;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::instrument;
use zip::ZipArchive;
use zip::result::ZipError;

/// Location of the running executable, for binaries shipped as a
/// zip-format package (self-extracting archives, bundled resources).
pub fn current_executable_archive() -> Result<PathBuf> {
    Ok(std::env::current_exe().map_err(ErrorKind::Io)?)
}

/// Names of every entry in the archive at `location`.
///
/// Listed in central-directory order. That is the physical order for any
/// archive written front-to-back; an archive whose directory was rewritten
/// out of order lists in directory order.
pub fn list_archive_entries(location: impl AsRef<Path>) -> Result<Vec<String>> {
    Ok(archive_entries(location)?.into_iter().map(|entry| entry.name).collect())
}

/// Names of the entries beneath `directory` in the archive at `location`.
pub fn list_archive_directory(location: impl AsRef<Path>, directory: &str) -> Result<Vec<String>> {
    Ok(archive_entries(location)?
        .into_iter()
        .filter(|entry| entry.is_within(directory))
        .map(|entry| entry.name)
        .collect())
}

/// Metadata of every entry in the archive at `location`.
#[instrument(skip_all, fields(archive = %location.as_ref().display()))]
pub fn archive_entries(location: impl AsRef<Path>) -> Result<Vec<ArchiveEntry>> {
    let location = location.as_ref();
    let file = File::open(location).map_err(|e| ErrorKind::io(e, location))?;
    let entries = archive_entries_from_reader(BufReader::new(file))?;
    tracing::debug!(entries = entries.len(), "Enumerated archive entries");
    Ok(entries)
}

/// Entry names of an archive held by any seekable reader.
pub fn list_archive_entries_from_reader<R: Read + Seek>(reader: R) -> Result<Vec<String>> {
    Ok(archive_entries_from_reader(reader)?.into_iter().map(|entry| entry.name).collect())
}

/// Entry metadata of an archive held by any seekable reader, in
/// central-directory order.
pub fn archive_entries_from_reader<R: Read + Seek>(reader: R) -> Result<Vec<ArchiveEntry>> {
    let mut archive = ZipArchive::new(reader).map_err(archive_error)?;
    let len = archive.len();
    (0..len)
        .map(|index| {
            // Raw access: no decompressor is needed just to read metadata.
            let file = archive.by_index_raw(index).map_err(archive_error)?;
            Ok(ArchiveEntry {
                name: file.name().to_string(),
                size: file.size(),
                compressed_size: file.compressed_size(),
                crc32: file.crc32(),
                is_dir: file.is_dir(),
            })
        })
        .collect()
}

fn archive_error(err: ZipError) -> ErrorKind {
    match err {
        ZipError::Io(err) => ErrorKind::Io(err),
        err => ErrorKind::Archive(err.to_string()),
    }
}
