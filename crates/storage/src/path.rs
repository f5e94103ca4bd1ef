//! Cache path derivation.
//!
//! Everything in this module is pure: paths are computed from the configured
//! root, the task identifier and hashes of their inputs, and never touch the
//! filesystem.

use scent_config::Config;
use std::path::{Component, Path, PathBuf};

/// Longest token accepted as an extension bucket before falling back to
/// [`OTHER_BUCKET`].
pub const MAX_BUCKET_LEN: usize = 5;
/// Bucket for filenames whose "extension" is too long to be one.
pub const OTHER_BUCKET: &str = "other";

/// Computes canonical on-disk locations beneath the cache root.
///
/// # Examples
///
/// ```
/// use scent_config::Config;
/// use scent_storage::PathResolver;
/// use std::path::Path;
///
/// let paths = PathResolver::new(&Config::new("/tmp/scent-zan", "031514"));
/// assert_eq!(
///     paths.join(["cache", "html", "", "index.htm"]),
///     Path::new("/tmp/scent-zan/cache/html/index.htm"),
/// );
/// assert_eq!(paths.relative("/tmp/scent-zan/cache/a.htm"), "/cache/a.htm");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: PathBuf,
    task_ident: String,
}
impl PathResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            root: config.root().to_path_buf(),
            task_ident: config.task_ident().to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The process-wide task identifier, for callers that want to namespace
    /// their saves by the current run.
    pub fn task_ident(&self) -> &str {
        &self.task_ident
    }

    /// Join the root with each segment using native separators.
    ///
    /// Empty segments are skipped, so an empty task identifier adds no
    /// directory level. Leading `/` (and Windows drive prefixes) are dropped
    /// so every segment stays relative to the root, which means the output of
    /// [`relative`](Self::relative) joins back to where it came from. `..` is
    /// kept as-is; segments are not otherwise normalized.
    pub fn join<I, S>(&self, segments: I) -> PathBuf
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let mut path = self.root.clone();
        for segment in segments {
            for component in segment.as_ref().components() {
                match component {
                    Component::Normal(part) => path.push(part),
                    Component::ParentDir => path.push(Component::ParentDir),
                    Component::RootDir | Component::Prefix(_) | Component::CurDir => {},
                }
            }
        }
        path
    }

    /// The part of `absolute` after the cache root.
    ///
    /// Returns `absolute` unchanged when it doesn't contain the root.
    pub fn relative<'a>(&self, absolute: &'a str) -> &'a str {
        let root = self.root.to_string_lossy();
        match absolute.find(&*root) {
            Some(start) => &absolute[start + root.len()..],
            None => absolute,
        }
    }
}

/// Lowercase hex MD5 digest of `input`, followed by `suffix`.
///
/// Used for naming and deduplication only; MD5 offers no security here.
///
/// ```
/// use scent_storage::hash_of;
/// assert_eq!(hash_of("", ""), "d41d8cd98f00b204e9800998ecf8427e");
/// assert_eq!(hash_of("", ".htm"), "d41d8cd98f00b204e9800998ecf8427e.htm");
/// ```
pub fn hash_of(input: &str, suffix: &str) -> String {
    format!("{:x}{suffix}", md5::compute(input))
}

/// Directory bucket for a filename: everything after the first `.`,
/// lower-cased, or [`OTHER_BUCKET`] when that is longer than
/// [`MAX_BUCKET_LEN`] characters.
///
/// A filename without a `.` is its own bucket (subject to the same limit).
pub fn extension_bucket(filename: &str) -> String {
    let token = filename.split_once('.').map_or(filename, |(_, after)| after).to_lowercase();
    match token.chars().count() > MAX_BUCKET_LEN {
        true => OTHER_BUCKET.to_string(),
        false => token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn resolver() -> PathResolver {
        PathResolver::new(&Config::new("/var/tmp/scent-zan", "031514"))
    }

    #[test]
    fn test_join_segments() {
        let paths = resolver();
        assert_eq!(
            paths.join(["cache", "files", "031514", "pdf", "a.pdf"]),
            Path::new("/var/tmp/scent-zan/cache/files/031514/pdf/a.pdf")
        );
        assert_eq!(paths.join(Vec::<&str>::new()), Path::new("/var/tmp/scent-zan"));
    }

    #[test]
    fn test_join_skips_empty_segments() {
        let paths = resolver();
        assert_eq!(paths.join(["cache", "", "html", ""]), Path::new("/var/tmp/scent-zan/cache/html"));
    }

    #[test]
    fn test_join_does_not_normalize() {
        let paths = resolver();
        assert_eq!(paths.join(["a", "..", "b"]), Path::new("/var/tmp/scent-zan/a/../b"));
    }

    #[test]
    fn test_join_keeps_absolute_segments_under_root() {
        let paths = resolver();
        assert_eq!(paths.join(["/etc/passwd"]), Path::new("/var/tmp/scent-zan/etc/passwd"));
        assert_eq!(paths.join(["run", "/tmp/evil.txt"]), Path::new("/var/tmp/scent-zan/run/tmp/evil.txt"));
        assert_eq!(paths.join(["./cache", "a.txt"]), Path::new("/var/tmp/scent-zan/cache/a.txt"));
    }

    #[test]
    fn test_relative_joins_back_to_source() {
        let paths = resolver();
        let absolute = "/var/tmp/scent-zan/cache/html/a.htm";
        assert_eq!(paths.join([paths.relative(absolute)]), Path::new(absolute));
    }

    #[test]
    fn test_task_ident_from_config() {
        assert_eq!(resolver().task_ident(), "031514");
        assert_eq!(resolver().root(), Path::new("/var/tmp/scent-zan"));
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = hash_of("https://example.com/page", "");
        assert_eq!(a, hash_of("https://example.com/page", ""));
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, hash_of("https://example.com/page2", ""));
    }

    #[test]
    fn test_hash_known_digest() {
        assert_eq!(hash_of("abc", ""), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(hash_of("abc", ".htm"), "900150983cd24fb0d6963f7d28e17f72.htm");
    }

    #[test]
    fn test_relative() {
        let paths = resolver();
        assert_eq!(paths.relative("/var/tmp/scent-zan/cache/html/a.htm"), "/cache/html/a.htm");
        assert_eq!(paths.relative("/var/tmp/scent-zan"), "");
        // Not under the root
        assert_eq!(paths.relative("/home/zan/a.htm"), "/home/zan/a.htm");
    }

    #[rstest]
    #[case("report.html", "html")]
    #[case("REPORT.PDF", "pdf")]
    #[case("archive.tar.gz", "other")]
    #[case("photo.jpeg", "jpeg")]
    #[case("a.verylongextension", "other")]
    #[case("Makefile", "other")]
    #[case("NOTES", "notes")]
    #[case("trailing.", "")]
    #[case("900150983cd24fb0d6963f7d28e17f72", "other")]
    fn test_extension_bucket(#[case] filename: &str, #[case] expected: &str) {
        assert_eq!(extension_bucket(filename), expected);
    }
}
