//! Javadoc archive extraction.
//!
//! Javadoc archives are zip containers. The downloaded stream is spooled to
//! an anonymous temporary file so that entries written with trailing data
//! descriptors (common in jars) can be read through the central directory.
//! Entries are then written in archive order, recreating their relative
//! paths under the destination with path traversal protection.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Component, Path};

/// Trait for extracting documentation archives, enabling test doubles.
///
/// # Examples
///
/// ```
/// use javadoc_publisher::extraction::ZipExtractor;
///
/// let extractor = ZipExtractor;
/// // Use extractor.extract(&mut stream, dest_dir) in production
/// ```
pub trait ArchiveExtractor {
    /// Extract every file entry of `archive` into `dest_dir`.
    ///
    /// Returns the number of files written. An archive without entries
    /// yields zero and is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::CreateDirectory`] when a parent directory
    /// cannot be created, [`ExtractionError::PathTraversal`] when an entry
    /// would escape `dest_dir`, [`ExtractionError::Archive`] when the
    /// archive is malformed, and [`ExtractionError::Io`] on other I/O
    /// failures. Files written before the failure are left in place.
    fn extract(&self, archive: &mut dyn Read, dest_dir: &Utf8Path)
    -> Result<usize, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive could not be parsed as a zip container.
    #[error("malformed archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A directory needed for an entry could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        /// The directory that could not be created.
        path: Utf8PathBuf,
        /// The underlying filesystem error.
        #[source]
        source: io::Error,
    },

    /// An entry name attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending entry name.
        path: String,
    },
}

/// Default extractor using the `zip` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(
        &self,
        archive: &mut dyn Read,
        dest_dir: &Utf8Path,
    ) -> Result<usize, ExtractionError> {
        let mut spool = tempfile::tempfile()?;
        let length = io::copy(archive, &mut spool)?;
        if length == 0 {
            debug!("empty archive stream for {dest_dir}");
            return Ok(0);
        }
        spool.seek(SeekFrom::Start(0))?;

        let mut zip = zip::ZipArchive::new(spool)?;
        let mut written = 0;

        for index in 0..zip.len() {
            let mut entry = zip.by_index(index)?;
            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_owned();
            validate_entry_path(Path::new(&name))?;

            let dest_path = dest_dir.as_std_path().join(&name);
            if let Some(parent) = dest_path.parent() {
                create_parent(parent)?;
            }

            let mut file = fs::File::create(&dest_path)?;
            io::copy(&mut entry, &mut file)?;
            written += 1;
        }

        debug!("extracted {written} file(s) into {dest_dir}");
        Ok(written)
    }
}

/// Create `dir` and its ancestors, reporting which directory failed.
fn create_parent(dir: &Path) -> Result<(), ExtractionError> {
    fs::create_dir_all(dir).map_err(|source| ExtractionError::CreateDirectory {
        path: Utf8PathBuf::from(dir.to_string_lossy().into_owned()),
        source,
    })
}

/// Validate that an entry name does not escape the destination directory
/// via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ZipEntry, zip_archive};
    use rstest::rstest;
    use std::io::Cursor;

    fn dest() -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::try_from(temp.path().join("out")).expect("UTF-8 path");
        (temp, path)
    }

    #[test]
    fn extracts_nested_files_with_identical_content() {
        let (_temp, dest_dir) = dest();
        let bytes = zip_archive(&[
            ZipEntry::dir("com/"),
            ZipEntry::dir("com/example/"),
            ZipEntry::file("index.html", b"<html>root</html>"),
            ZipEntry::file("com/example/Widget.html", b"<html>widget</html>"),
        ]);

        let written = ZipExtractor
            .extract(&mut Cursor::new(bytes), &dest_dir)
            .expect("extract");

        assert_eq!(written, 2);
        assert_eq!(
            fs::read(dest_dir.join("index.html")).expect("index"),
            b"<html>root</html>".to_vec()
        );
        assert_eq!(
            fs::read(dest_dir.join("com/example/Widget.html")).expect("widget"),
            b"<html>widget</html>".to_vec()
        );
    }

    #[test]
    fn directory_entries_produce_no_files() {
        let (_temp, dest_dir) = dest();
        let bytes = zip_archive(&[ZipEntry::dir("META-INF/")]);

        let written = ZipExtractor
            .extract(&mut Cursor::new(bytes), &dest_dir)
            .expect("extract");

        assert_eq!(written, 0);
        assert!(!dest_dir.join("META-INF").is_file());
    }

    #[rstest]
    #[case::no_entries(zip_archive(&[]))]
    #[case::zero_bytes(Vec::new())]
    fn empty_archives_are_not_errors(#[case] bytes: Vec<u8>) {
        let (_temp, dest_dir) = dest();
        let written = ZipExtractor
            .extract(&mut Cursor::new(bytes), &dest_dir)
            .expect("extract");
        assert_eq!(written, 0);
    }

    #[test]
    fn file_in_place_of_directory_fails() {
        let (_temp, dest_dir) = dest();
        fs::create_dir_all(&dest_dir).expect("dest");
        fs::write(dest_dir.join("com"), b"not a directory").expect("blocker");
        let bytes = zip_archive(&[ZipEntry::file("com/example/Widget.html", b"x")]);

        let result = ZipExtractor.extract(&mut Cursor::new(bytes), &dest_dir);

        assert!(
            matches!(result, Err(ExtractionError::CreateDirectory { .. })),
            "expected CreateDirectory, got {result:?}"
        );
    }

    #[test]
    fn garbage_is_a_malformed_archive() {
        let (_temp, dest_dir) = dest();
        let result = ZipExtractor.extract(&mut Cursor::new(b"not a zip".to_vec()), &dest_dir);
        assert!(matches!(result, Err(ExtractionError::Archive(_))));
    }

    #[rstest]
    #[case::parent_dir("../escape.txt")]
    #[case::nested_parent("foo/../../escape.txt")]
    #[case::absolute("/etc/passwd")]
    fn rejects_path_traversal(#[case] bad_path: &str) {
        let result = validate_entry_path(Path::new(bad_path));
        assert!(
            matches!(result, Err(ExtractionError::PathTraversal { .. })),
            "expected PathTraversal for {bad_path}"
        );
    }

    #[test]
    fn accepts_normal_paths() {
        assert!(validate_entry_path(Path::new("com/example/package-summary.html")).is_ok());
    }
}
