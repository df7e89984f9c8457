//! Shared test utilities for the publisher crate.

use crate::artifact::Artifact;
use crate::process::{CommandExecutor, Invocation, ProcessError};
use crate::registry::{FetchError, Registry};
use camino::Utf8PathBuf;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;

/// A recording implementation of `CommandExecutor` for testing.
///
/// Every invocation is recorded and succeeds with empty output unless its
/// first argument matches a subcommand registered with
/// [`StubExecutor::failing_on`]. A `git clone` creates its target directory
/// so that later steps see a working copy.
#[derive(Debug, Default)]
pub struct StubExecutor {
    calls: RefCell<Vec<Invocation>>,
    failures: HashMap<String, String>,
}

impl StubExecutor {
    /// Creates an executor on which every command succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes commands whose first argument is `subcommand` fail with
    /// `output`.
    #[must_use]
    pub fn failing_on(mut self, subcommand: &str, output: &str) -> Self {
        self.failures
            .insert(subcommand.to_owned(), output.to_owned());
        self
    }

    /// Every invocation received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// The first argument of every `git` invocation, in order.
    #[must_use]
    pub fn git_subcommands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.program() == "git")
            .filter_map(|call| call.arguments().first().cloned())
            .collect()
    }

    /// Invocations of `git <subcommand>`, in order.
    #[must_use]
    pub fn git_calls(&self, subcommand: &str) -> Vec<Invocation> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| {
                call.program() == "git"
                    && call.arguments().first().map(String::as_str) == Some(subcommand)
            })
            .cloned()
            .collect()
    }

    fn simulate_clone(invocation: &Invocation) -> Result<(), ProcessError> {
        let Some(target) = invocation.arguments().last() else {
            return Ok(());
        };
        let mut path = Utf8PathBuf::from(target);
        if path.is_relative() {
            if let Some(dir) = invocation.working_dir() {
                path = dir.join(path);
            }
        }
        fs::create_dir_all(&path).map_err(|source| ProcessError::Io {
            command: invocation.to_string(),
            source,
        })
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, invocation: &Invocation) -> Result<String, ProcessError> {
        self.calls.borrow_mut().push(invocation.clone());

        let subcommand = invocation.arguments().first().map(String::as_str);
        if let Some(output) = subcommand.and_then(|name| self.failures.get(name)) {
            return Err(ProcessError::Failed {
                command: invocation.to_string(),
                status: "exit status: 1".to_owned(),
                output: output.clone(),
            });
        }
        if invocation.program() == "git" && subcommand == Some("clone") {
            Self::simulate_clone(invocation)?;
        }
        Ok(String::new())
    }
}

/// A scripted in-memory `Registry` for testing.
///
/// Serves a fixed listing and the archives registered per coordinate.
/// Downloading an unregistered coordinate fails with a 404 status.
#[derive(Debug, Default)]
pub struct StubRegistry {
    listing: Vec<Artifact>,
    archives: HashMap<String, Vec<u8>>,
    downloads: RefCell<Vec<String>>,
}

impl StubRegistry {
    /// Creates a registry with an empty listing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the listing returned for every group.
    pub fn set_listing(&mut self, listing: Vec<Artifact>) {
        self.listing = listing;
    }

    /// Registers the archive served for `artifact`.
    pub fn set_archive(&mut self, artifact: &Artifact, archive: Vec<u8>) {
        self.archives.insert(artifact.to_string(), archive);
    }

    /// Coordinates downloaded so far, as `group:artifact:version`.
    #[must_use]
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.borrow().clone()
    }
}

impl Registry for StubRegistry {
    fn latest_artifacts(&self, _group_id: &str) -> Result<Vec<Artifact>, FetchError> {
        Ok(self.listing.clone())
    }

    fn download_doc_archive(&self, artifact: &Artifact) -> Result<Box<dyn Read>, FetchError> {
        let coordinate = artifact.to_string();
        self.downloads.borrow_mut().push(coordinate.clone());
        match self.archives.get(&coordinate) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(FetchError::Status {
                url: coordinate,
                status: 404,
                body: "Not Found".to_owned(),
            }),
        }
    }
}

/// One entry of an archive built by [`zip_archive`].
#[derive(Debug, Clone)]
pub struct ZipEntry {
    name: String,
    contents: Option<Vec<u8>>,
}

impl ZipEntry {
    /// A directory entry; `name` should end with `/`.
    #[must_use]
    pub fn dir(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            contents: None,
        }
    }

    /// A file entry holding `contents`.
    #[must_use]
    pub fn file(name: &str, contents: &[u8]) -> Self {
        Self {
            name: name.to_owned(),
            contents: Some(contents.to_vec()),
        }
    }
}

/// Builds a deflated zip archive in memory.
///
/// # Panics
///
/// Panics if the in-memory writer fails, which indicates a broken entry
/// name.
#[must_use]
pub fn zip_archive(entries: &[ZipEntry]) -> Vec<u8> {
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        match &entry.contents {
            None => writer
                .add_directory(entry.name.as_str(), options)
                .expect("add directory entry"),
            Some(contents) => {
                writer
                    .start_file(entry.name.as_str(), options)
                    .expect("start file entry");
                writer.write_all(contents).expect("write file entry");
            }
        }
    }
    writer.finish().expect("finish archive").into_inner()
}

/// A small Javadoc-style archive for `artifact`.
#[must_use]
pub fn javadoc_archive(artifact: &Artifact) -> Vec<u8> {
    zip_archive(&[
        ZipEntry::dir("META-INF/"),
        ZipEntry::file("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n"),
        ZipEntry::file(
            "index.html",
            format!("<html><title>{artifact}</title></html>").as_bytes(),
        ),
        ZipEntry::file("package-list", artifact.group_id().as_bytes()),
    ])
}
