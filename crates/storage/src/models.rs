//! Storage models.

/// Metadata of a single entry inside a zip-format archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Full entry name, with `/` separators (directories end in `/`)
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    /// Size as stored in the archive
    pub compressed_size: u64,
    /// CRC32 of the uncompressed data, as recorded in the archive
    pub crc32: u32,
    /// Whether the entry is a directory
    pub is_dir: bool,
}
impl ArchiveEntry {
    /// Whether this entry lives under `directory` (component-wise prefix).
    ///
    /// An empty `directory` matches everything.
    pub fn is_within(&self, directory: &str) -> bool {
        let directory = directory.trim_matches('/');
        if directory.is_empty() {
            return true;
        }
        self.name
            .strip_prefix(directory)
            .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
    }
}
