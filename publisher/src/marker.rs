//! Version markers recording what was last published for an artifact.
//!
//! The marker is a plain text file holding the exact version string. It is
//! the only record of "already published" state.

use crate::layout::PublishLayout;
use camino::Utf8Path;
use std::fs;
use std::io;

/// Reads the marker in `artifact_dir`.
///
/// Returns `Ok(None)` when no marker exists.
///
/// # Errors
///
/// Returns any I/O error other than `NotFound`.
pub fn read_marker(artifact_dir: &Utf8Path) -> io::Result<Option<String>> {
    match fs::read_to_string(PublishLayout::marker_path(artifact_dir)) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Writes `version` as the marker in `artifact_dir`, replacing any previous
/// marker. The directory must already exist.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be written.
pub fn write_marker(artifact_dir: &Utf8Path, version: &str) -> io::Result<()> {
    fs::write(PublishLayout::marker_path(artifact_dir), version)
}
