//! Cache persistence.
//!
//! Every save funnels into [`FileStore::write_bytes`]; the other operations
//! only decide *where* to write and *what* bytes to write. Policies differ per
//! operation:
//!
//! | Operation                          | Existing file at target            |
//! |------------------------------------|------------------------------------|
//! | [`save_resource`](FileStore::save_resource) | kept, write skipped (first write wins) |
//! | [`save_document`](FileStore::save_document) | overwritten                         |
//! | [`save_named`](FileStore::save_named)       | deleted, then created anew          |
//! | [`write_bytes`](FileStore::write_bytes)     | overwritten, or deleted first       |
//! | [`append_log`](FileStore::append_log)       | appended to                         |
//!
//! Log appends are best-effort and never fail; everything else propagates.

use crate::document::Document;
use crate::error::{ErrorKind, Result};
use crate::path::{PathResolver, extension_bucket, hash_of};
use crate::resource::FetchedResource;
use scent_config::clock;
use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Written in place of a resource body that was never received.
pub const EMPTY_PLACEHOLDER: &[u8] = b"(empty)";

const CACHE_DIR: &str = "cache";
const FILES_DIR: &str = "files";
const HTML_DIR: &str = "html";
const DOCUMENT_SUFFIX: &str = ".htm";

/// Writes fetched resources, documents, named content and log lines beneath
/// the cache root.
///
/// # Examples
///
/// ```no_run
/// use scent_config::Config;
/// use scent_storage::{FileStore, PathResolver};
/// use scent_storage::resource::FetchedPage;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::load()?;
/// let store = FileStore::new(PathResolver::new(&config));
/// let page = FetchedPage::new("https://example.com/report.pdf").with_content(b"%PDF-1.7".to_vec());
/// let saved = store.save_resource(&page, config.task_ident())?;
/// store.append_log(&format!("saved {}", saved.display()), store.paths().join(["crawl.log"]));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    paths: PathResolver,
}
impl FileStore {
    pub fn new(paths: PathResolver) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    /// Save a fetched resource to `cache/files/{ident}/{bucket}/{filename}`.
    ///
    /// The filename is the server-suggested one when present, otherwise the
    /// hash of the source URI. A resource that is already cached is left
    /// untouched; the returned path is the same either way.
    #[instrument(skip_all, fields(uri = resource.source_uri()))]
    pub fn save_resource<R: FetchedResource + ?Sized>(&self, resource: &R, ident: &str) -> Result<PathBuf> {
        let filename = resource.disposition_filename().unwrap_or_else(|| hash_of(resource.source_uri(), ""));
        let bucket = extension_bucket(&filename);
        let path = self.paths.join([CACHE_DIR, FILES_DIR, ident, bucket.as_str(), filename.as_str()]);
        self.save_resource_to(resource, path)
    }

    /// Save a fetched resource to an exact path, unless a file is already
    /// there. Missing bodies are written as [`EMPTY_PLACEHOLDER`].
    pub fn save_resource_to<R: FetchedResource + ?Sized>(
        &self,
        resource: &R,
        path: impl Into<PathBuf>,
    ) -> Result<PathBuf> {
        let path = path.into();
        if path.try_exists().map_err(|e| ErrorKind::io(e, &path))? {
            tracing::trace!(path = %path.display(), "Resource already cached; skipping write");
            return Ok(path);
        }
        self.write_bytes(resource.content().unwrap_or(EMPTY_PLACEHOLDER), path, false)
    }

    /// Snapshot a document's full markup to `cache/html/{ident}/{md5(base uri)}.htm`,
    /// replacing any earlier snapshot.
    #[instrument(skip_all, fields(uri = doc.base_uri()))]
    pub fn save_document<D: Document + ?Sized>(&self, doc: &D, ident: &str) -> Result<PathBuf> {
        let filename = hash_of(doc.base_uri(), DOCUMENT_SUFFIX);
        let path = self.paths.join([CACHE_DIR, HTML_DIR, ident, filename.as_str()]);
        self.write_bytes(doc.outer_html(), path, false)
    }

    /// Write `content` as a brand-new file at `{ident}/{filename}`.
    ///
    /// Any existing file is deleted first. If another writer recreates the
    /// file in between, this fails with
    /// [`AlreadyExists`](ErrorKind::AlreadyExists) rather than clobbering it.
    pub fn save_named(&self, content: &str, ident: &str, filename: &str) -> Result<PathBuf> {
        let path = self.paths.join([ident, filename]);
        remove_if_exists(&path)?;
        create_parent(&path)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| ErrorKind::io(e, &path))?;
        file.write_all(content.as_bytes()).map_err(|e| ErrorKind::io(e, &path))?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "Saved named content");
        Ok(path)
    }

    /// Write `content` to `path`, creating parent directories as needed and
    /// replacing any existing content. With `delete_if_exists`, the old file
    /// is removed first (a missing file is not an error).
    pub fn write_bytes(
        &self,
        content: impl AsRef<[u8]>,
        path: impl Into<PathBuf>,
        delete_if_exists: bool,
    ) -> Result<PathBuf> {
        let path = path.into();
        let content = content.as_ref();
        if delete_if_exists {
            remove_if_exists(&path)?;
        }
        create_parent(&path)?;
        fs::write(&path, content).map_err(|e| ErrorKind::io(e, &path))?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote cache file");
        Ok(path)
    }

    /// [`write_bytes`](Self::write_bytes) to a path relative to the cache root.
    pub fn write_relative(
        &self,
        content: impl AsRef<[u8]>,
        relative: &str,
        delete_if_exists: bool,
    ) -> Result<PathBuf> {
        self.write_bytes(content, self.paths.join([relative]), delete_if_exists)
    }

    /// [`write_bytes`](Self::write_bytes) the [`Display`] form of `value`.
    pub fn write_display(
        &self,
        value: &impl Display,
        path: impl Into<PathBuf>,
        delete_if_exists: bool,
    ) -> Result<PathBuf> {
        self.write_bytes(value.to_string(), path, delete_if_exists)
    }

    /// Append `"{timestamp} {message}"` as a line to `target`.
    ///
    /// Never fails: an I/O error is reported as a `WARN` event and dropped, so
    /// logging can't take down the caller. Use
    /// [`try_append_log`](Self::try_append_log) to observe failures.
    pub fn append_log(&self, message: &str, target: impl AsRef<Path>) {
        let target = target.as_ref();
        if let Err(err) = self.try_append_log(message, target) {
            tracing::warn!(path = %target.display(), error = %err, "Failed to append log line");
        }
    }

    /// Append `"{timestamp} {message}"` as a line to `target`, creating the
    /// file (but not its directory) if absent.
    pub fn try_append_log(&self, message: &str, target: impl AsRef<Path>) -> Result<()> {
        let target = target.as_ref();
        let line = format!("{} {message}\n", clock::timestamp(clock::now()));
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(target)
            .map_err(|e| ErrorKind::io(e, target))?;
        file.write_all(line.as_bytes()).map_err(|e| ErrorKind::io(e, target))?;
        Ok(())
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ErrorKind::io(e, parent))?;
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(ErrorKind::io(e, path).into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HtmlDocument;
    use crate::resource::FetchedPage;
    use scent_config::Config;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStore) {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(PathResolver::new(&Config::new(temp_dir.path(), "031514")));
        (temp_dir, store)
    }

    #[test]
    fn test_save_resource_layout_from_uri_hash() {
        let (temp_dir, store) = store();
        let page = FetchedPage::new("https://example.com/a").with_content(b"body".to_vec());
        let path = store.save_resource(&page, "run").unwrap();
        let hash = hash_of("https://example.com/a", "");
        // A 32 character hash is never an extension
        assert_eq!(path, temp_dir.path().join("cache/files/run/other").join(&hash));
        assert_eq!(fs::read(&path).unwrap(), b"body");
    }

    #[test]
    fn test_save_resource_layout_from_disposition() {
        let (temp_dir, store) = store();
        let page = FetchedPage::new("https://example.com/download?id=7")
            .with_content(b"<html></html>".to_vec())
            .with_content_disposition(r#"attachment; filename="Report.HTML""#);
        let path = store.save_resource(&page, "run").unwrap();
        assert_eq!(path, temp_dir.path().join("cache/files/run/html/Report.HTML"));
    }

    #[test]
    fn test_save_resource_without_ident() {
        let (temp_dir, store) = store();
        let page = FetchedPage::new("https://example.com/a.pdf")
            .with_content_disposition("attachment; filename=a.pdf")
            .with_content(b"%PDF".to_vec());
        let path = store.save_resource(&page, "").unwrap();
        assert_eq!(path, temp_dir.path().join("cache/files/pdf/a.pdf"));
    }

    #[test]
    fn test_save_resource_is_idempotent() {
        let (_temp_dir, store) = store();
        let first = FetchedPage::new("https://example.com/a").with_content(b"first".to_vec());
        let second = FetchedPage::new("https://example.com/a").with_content(b"second".to_vec());
        let a = store.save_resource(&first, "run").unwrap();
        let b = store.save_resource(&second, "run").unwrap();
        assert_eq!(a, b);
        assert_eq!(fs::read(&b).unwrap(), b"first");
    }

    #[test]
    fn test_save_resource_empty_placeholder() {
        let (_temp_dir, store) = store();
        let path = store.save_resource(&FetchedPage::new("https://example.com/empty"), "run").unwrap();
        assert_eq!(fs::read(path).unwrap(), EMPTY_PLACEHOLDER);
    }

    #[test]
    fn test_save_resource_to_exact_path() {
        let (temp_dir, store) = store();
        let target = temp_dir.path().join("elsewhere/page.bin");
        let page = FetchedPage::new("https://example.com/").with_content(b"x".to_vec());
        assert_eq!(store.save_resource_to(&page, &target).unwrap(), target);
        assert_eq!(fs::read(&target).unwrap(), b"x");
    }

    #[test]
    fn test_save_document_layout() {
        let (temp_dir, store) = store();
        let doc = HtmlDocument::parse("https://example.com/", "<p>one</p>");
        let path = store.save_document(&doc, "run").unwrap();
        let expected = temp_dir.path().join("cache/html/run").join(hash_of("https://example.com/", ".htm"));
        assert_eq!(path, expected);
        assert!(fs::read_to_string(&path).unwrap().contains("<p>one</p>"));
    }

    #[test]
    fn test_save_document_overwrites() {
        let (_temp_dir, store) = store();
        let first = HtmlDocument::parse("https://example.com/", "<p>first render</p>");
        let second = HtmlDocument::parse("https://example.com/", "<p>second</p>");
        let a = store.save_document(&first, "run").unwrap();
        let b = store.save_document(&second, "run").unwrap();
        assert_eq!(a, b);
        let saved = fs::read_to_string(&b).unwrap();
        assert!(saved.contains("<p>second</p>"));
        assert!(!saved.contains("first"));
    }

    #[test]
    fn test_save_named_replaces() {
        let (temp_dir, store) = store();
        let a = store.save_named("a much longer first version", "run", "notes.txt").unwrap();
        let b = store.save_named("second", "run", "notes.txt").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, temp_dir.path().join("run/notes.txt"));
        assert_eq!(fs::read_to_string(&b).unwrap(), "second");
    }

    #[test]
    fn test_save_named_absolute_filename_stays_under_root() {
        let (temp_dir, store) = store();
        let outside = tempfile::tempdir().unwrap();
        let filename = outside.path().join("evil.txt");
        let path = store.save_named("y", "run", filename.to_str().unwrap()).unwrap();
        assert!(path.starts_with(temp_dir.path().join("run")));
        assert!(!filename.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "y");
    }

    #[test]
    fn test_write_bytes_overwrites() {
        let (temp_dir, store) = store();
        let path = temp_dir.path().join("a/b/c.txt");
        store.write_bytes(b"a much longer first version", &path, false).unwrap();
        store.write_bytes(b"last", &path, false).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"last");
    }

    #[test]
    fn test_write_bytes_delete_first() {
        let (temp_dir, store) = store();
        let path = temp_dir.path().join("c.txt");
        // Deleting a missing file is not an error
        store.write_bytes("one", &path, true).unwrap();
        store.write_bytes("two", &path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
    }

    #[test]
    fn test_write_bytes_into_file_parent_fails() {
        let (temp_dir, store) = store();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        assert!(store.write_bytes(b"data", blocker.join("child.txt"), false).is_err());
    }

    #[test]
    fn test_write_relative_round_trips_relative_paths() {
        let (temp_dir, store) = store();
        let original = temp_dir.path().join("cache/a.txt");
        let relative = store.paths().relative(original.to_str().unwrap());
        let written = store.write_relative(b"x", relative, false).unwrap();
        assert!(written.starts_with(temp_dir.path()));
        assert_eq!(written, original);
        assert_eq!(fs::read(&original).unwrap(), b"x");
    }

    #[test]
    fn test_write_relative_and_display() {
        let (temp_dir, store) = store();
        let path = store.write_relative(b"rel", "exports/a.txt", false).unwrap();
        assert_eq!(path, temp_dir.path().join("exports/a.txt"));
        let path = store.write_display(&42, temp_dir.path().join("answer.txt"), false).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "42");
    }

    #[test]
    fn test_append_log() {
        let (temp_dir, store) = store();
        let log = temp_dir.path().join("crawl.log");
        store.append_log("first", &log);
        store.append_log("second", &log);
        let content = fs::read_to_string(&log).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        // "YYYY-MM-DD HH:MM:SS message"
        assert_eq!(&lines[0][19..], " first");
        assert_eq!(&lines[1][19..], " second");
        assert_eq!(lines[0].as_bytes()[4], b'-');
    }

    #[test]
    fn test_append_log_never_fails() {
        let (temp_dir, store) = store();
        let log = temp_dir.path().join("missing/dir/crawl.log");
        store.append_log("dropped", &log);
        assert!(!log.exists());
        let err = store.try_append_log("dropped", &log).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }
}
